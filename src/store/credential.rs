// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Error;
use crate::token::base64::{encode_key_id, Bytes};
use crate::token::{Attestation, Environment};
use crate::verify::p256_public_point;
use openssl::x509::X509;
use serde::{Deserialize, Serialize};

/// What a relying party keeps about an attested key once the attestation has
/// been verified, and which assertions are later checked against
#[serde_with::serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CredentialRecord {
    /// The credential id in URL-safe, unpadded base64.  Records are indexed
    /// by this value.
    pub key_id: String,

    /// SHA-256 of the public key
    pub credential_id: Bytes,

    /// The attested P-256 public key, as an uncompressed X9.63 point
    #[serde_as(as = "serde_with::hex::Hex")]
    pub public_key: Vec<u8>,

    /// The DER-encoded credential certificate
    pub certificate: Bytes,

    /// The receipt that came with the attestation
    pub receipt: Bytes,

    pub environment: Environment,

    /// The last counter value seen for this key.  Zero after attestation.
    pub sign_count: u32,
}

impl CredentialRecord {
    /// Build the record for an attestation that has already been verified
    pub fn from_attestation(a: &Attestation) -> Result<Self, Error> {
        let leaf = &a.statement.credential_certificate;

        let environment = a
            .environment()
            .ok_or_else(|| Error::MalformedAuthenticatorData("no attested credential".to_string()))?;

        Ok(Self {
            key_id: encode_key_id(a.credential_id()),
            credential_id: Bytes::from(a.credential_id()),
            public_key: p256_public_point(leaf)?,
            certificate: Bytes::from(
                leaf.to_der()
                    .map_err(|e| Error::Crypto(e.to_string()))?,
            ),
            receipt: Bytes::from(a.statement.receipt.as_slice()),
            environment,
            sign_count: a.auth_data.sign_count,
        })
    }

    /// The credential certificate, decoded
    pub fn certificate(&self) -> Result<X509, Error> {
        X509::from_der(self.certificate.as_slice())
            .map_err(|e| Error::InvalidCertificate(e.to_string()))
    }
}
