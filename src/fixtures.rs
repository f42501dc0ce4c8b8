// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Test-only helpers: a throw-away PKI shaped like Apple's, and encoders for
//! attestation and assertion objects.

use crate::store::TrustAnchor;
use crate::token::authdata::encode;
use crate::token::base64::encode_key_id;
use crate::token::Environment;
use crate::verify::{AppAttest, APPLE_NONCE_EXTENSION_OID};
use ciborium::Value;
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::{BigNum, BigNumContext, MsbOption};
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::sha::{sha256, Sha256};
use openssl::sign::Signer;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509Extension, X509Name, X509NameBuilder, X509NameRef, X509};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// The uncompressed X9.63 encoding of the public half of `key`
pub(crate) fn public_point(key: &PKey<Private>) -> Vec<u8> {
    let ec = key.ec_key().unwrap();
    let mut ctx = BigNumContext::new().unwrap();
    ec.public_key()
        .to_bytes(ec.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
        .unwrap()
}

/// DER of `SEQUENCE { [1] EXPLICIT OCTET STRING nonce }`
pub(crate) fn nonce_extension_value(nonce: &[u8]) -> Vec<u8> {
    let n = nonce.len() as u8;
    let mut v = vec![0x30, n + 4, 0xa1, n + 2, 0x04, n];
    v.extend_from_slice(nonce);
    v
}

fn name(cn: &str) -> X509Name {
    let mut b = X509NameBuilder::new().unwrap();
    b.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    b.build()
}

fn certificate(
    subject: &str,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    ca: bool,
    extension_value: Option<&[u8]>,
) -> X509 {
    let mut b = X509Builder::new().unwrap();
    b.set_version(2).unwrap();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    b.set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();

    let subject_name = name(subject);
    b.set_subject_name(&subject_name).unwrap();
    let issuer_name: &X509NameRef = match issuer {
        Some((cert, _)) => cert.subject_name(),
        None => &subject_name,
    };
    b.set_issuer_name(issuer_name).unwrap();

    b.set_pubkey(key).unwrap();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    b.set_not_before(&Asn1Time::from_unix(now - 86400).unwrap())
        .unwrap();
    b.set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();

    if ca {
        b.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        b.append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()
                .unwrap(),
        )
        .unwrap();
    }

    if let Some(v) = extension_value {
        let oid = Asn1Object::from_str(APPLE_NONCE_EXTENSION_OID).unwrap();
        let contents = Asn1OctetString::new_from_bytes(v).unwrap();
        b.append_extension(X509Extension::new_from_der(&oid, false, &contents).unwrap())
            .unwrap();
    }

    let signing_key = issuer.map(|(_, k)| k).unwrap_or(key);
    b.sign(signing_key, MessageDigest::sha256()).unwrap();

    b.build()
}

/// Root, intermediate and their keys
pub(crate) struct Pki {
    pub root: X509,
    pub root_key: PKey<Private>,
    pub intermediate: X509,
    pub intermediate_key: PKey<Private>,
}

impl Pki {
    pub fn new() -> Self {
        let root_key = ec_key();
        let root = certificate("Test App Attestation Root CA", &root_key, None, true, None);

        let intermediate_key = ec_key();
        let intermediate = certificate(
            "Test App Attestation CA 1",
            &intermediate_key,
            Some((&root, &root_key)),
            true,
            None,
        );

        Self {
            root,
            root_key,
            intermediate,
            intermediate_key,
        }
    }

    pub fn trust_anchor(&self) -> TrustAnchor {
        TrustAnchor::new(self.root.clone())
    }

    /// A leaf for a fresh key, carrying `nonce` in the nonce extension
    pub fn leaf(&self, nonce: Option<&[u8]>) -> X509 {
        self.leaf_for(&ec_key(), nonce.map(nonce_extension_value).as_deref())
    }

    /// A leaf for `key`, with `extension_value` as the raw nonce extension
    pub fn leaf_for(&self, key: &PKey<Private>, extension_value: Option<&[u8]>) -> X509 {
        certificate(
            "leaf",
            key,
            Some((&self.intermediate, &self.intermediate_key)),
            false,
            extension_value,
        )
    }

    /// A leaf issued by the root itself, bypassing the intermediate
    pub fn leaf_from_root(&self, key: &PKey<Private>, extension_value: Option<&[u8]>) -> X509 {
        certificate(
            "leaf",
            key,
            Some((&self.root, &self.root_key)),
            false,
            extension_value,
        )
    }
}

pub(crate) fn attestation_cbor(format: &str, certs: &[Vec<u8>], auth_data: &[u8]) -> Vec<u8> {
    let statement = Value::Map(vec![
        (
            Value::Text("x5c".to_string()),
            Value::Array(certs.iter().cloned().map(Value::Bytes).collect()),
        ),
        (
            Value::Text("receipt".to_string()),
            Value::Bytes(b"receipt".to_vec()),
        ),
    ]);

    let v = Value::Map(vec![
        (
            Value::Text("fmt".to_string()),
            Value::Text(format.to_string()),
        ),
        (Value::Text("attStmt".to_string()), statement),
        (
            Value::Text("authData".to_string()),
            Value::Bytes(auth_data.to_vec()),
        ),
    ]);

    let mut buf = Vec::new();
    ciborium::ser::into_writer(&v, &mut buf).unwrap();
    buf
}

pub(crate) fn assertion_cbor(signature: &[u8], auth_data: &[u8]) -> Vec<u8> {
    let v = Value::Map(vec![
        (
            Value::Text("signature".to_string()),
            Value::Bytes(signature.to_vec()),
        ),
        (
            Value::Text("authenticatorData".to_string()),
            Value::Bytes(auth_data.to_vec()),
        ),
    ]);

    let mut buf = Vec::new();
    ciborium::ser::into_writer(&v, &mut buf).unwrap();
    buf
}

fn nonce(auth_data: &[u8], client_data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(auth_data);
    h.update(&sha256(client_data));
    h.finish()
}

/// What ends up in the leaf's nonce extension
pub(crate) enum NonceExtension {
    /// The correct nonce for the attestation being built
    Valid,
    Absent,
    Raw(Vec<u8>),
}

/// The knobs of an attestation, all set to valid values by
/// [`Scenario::parts`]
pub(crate) struct AttestationParts {
    pub format: String,
    pub rp_id_hash: [u8; 32],
    pub environment: Environment,
    pub sign_count: u32,
    pub credential_id: Vec<u8>,
    /// the challenge the nonce is computed from
    pub challenge: Vec<u8>,
    pub extension: NonceExtension,
    pub leaf_from_root: bool,
}

/// A registered app on a device, and the PKI that attests it
pub(crate) struct Scenario {
    pub pki: Pki,
    pub anchor: TrustAnchor,
    pub team_id: String,
    pub bundle_id: String,
    pub environment: Environment,
    pub challenge: Vec<u8>,
    pub key: PKey<Private>,
    pub credential_id: Vec<u8>,
    pub key_id: String,
}

impl Scenario {
    pub fn new() -> Self {
        let pki = Pki::new();
        let anchor = pki.trust_anchor();
        let key = ec_key();
        let credential_id = sha256(&public_point(&key)).to_vec();
        let key_id = encode_key_id(&credential_id);

        Self {
            pki,
            anchor,
            team_id: "0352187391".to_string(),
            bundle_id: "com.apple.example_app_attest".to_string(),
            environment: Environment::Development,
            challenge: b"test_server_challenge".to_vec(),
            key,
            credential_id,
            key_id,
        }
    }

    pub fn verifier(&self) -> AppAttest<'_> {
        AppAttest::with_trust_anchor(&self.team_id, &self.bundle_id, &self.anchor)
    }

    pub fn public_key(&self) -> Vec<u8> {
        public_point(&self.key)
    }

    pub fn rp_id_hash(&self) -> [u8; 32] {
        sha256(format!("{}.{}", self.team_id, self.bundle_id).as_bytes())
    }

    pub fn parts(&self) -> AttestationParts {
        AttestationParts {
            format: "apple-appattest".to_string(),
            rp_id_hash: self.rp_id_hash(),
            environment: self.environment,
            sign_count: 0,
            credential_id: self.credential_id.clone(),
            challenge: self.challenge.clone(),
            extension: NonceExtension::Valid,
            leaf_from_root: false,
        }
    }

    pub fn attestation(&self) -> Vec<u8> {
        self.attestation_with(|_| {})
    }

    /// An attestation built from [`Scenario::parts`] after `tweak` has
    /// mutated them
    pub fn attestation_with(&self, tweak: impl FnOnce(&mut AttestationParts)) -> Vec<u8> {
        let mut p = self.parts();
        tweak(&mut p);

        let auth_data = encode(
            &p.rp_id_hash,
            p.sign_count,
            Some((p.environment, p.credential_id.as_slice())),
        );

        let extension_value = match p.extension {
            NonceExtension::Valid => Some(nonce_extension_value(&nonce(&auth_data, &p.challenge))),
            NonceExtension::Absent => None,
            NonceExtension::Raw(v) => Some(v),
        };

        let leaf = if p.leaf_from_root {
            self.pki
                .leaf_from_root(&self.key, extension_value.as_deref())
        } else {
            self.pki.leaf_for(&self.key, extension_value.as_deref())
        };

        let certs = vec![
            leaf.to_der().unwrap(),
            self.pki.intermediate.to_der().unwrap(),
        ];

        attestation_cbor(&p.format, &certs, &auth_data)
    }

    /// A leaf certifying the scenario key, as a caller would have stored it
    pub fn certificate(&self) -> X509 {
        self.pki.leaf_for(&self.key, None)
    }

    pub fn assertion(&self, payload: &[u8], sign_count: u32) -> Vec<u8> {
        self.assertion_signed_by(&self.key, &self.rp_id_hash(), payload, sign_count)
    }

    pub fn assertion_signed_by(
        &self,
        key: &PKey<Private>,
        rp_id_hash: &[u8; 32],
        payload: &[u8],
        sign_count: u32,
    ) -> Vec<u8> {
        let auth_data = encode(rp_id_hash, sign_count, None);

        let mut signer = Signer::new(MessageDigest::sha256(), key).unwrap();
        signer.update(&nonce(&auth_data, payload)).unwrap();
        let signature = signer.sign_to_vec().unwrap();

        assertion_cbor(&signature, &auth_data)
    }
}
