// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Verification of attestation and assertion objects for one app.
//!
//! An [`AppAttest`] verifier is bound to a team id, a bundle id and a trust
//! anchor.  Verification is synchronous and does not mutate the verifier, so
//! one instance can be shared between threads.

pub use self::chain::verify_chain;
pub use self::extension::APPLE_NONCE_EXTENSION_OID;

mod assertion;
mod attestation;
mod chain;
mod extension;

use crate::errors::Error;
use crate::store::TrustAnchor;
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, EcPoint, PointConversionForm};
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::pkey::Public;
use openssl::sha::{sha256, Sha256};
use openssl::x509::X509Ref;

/// Verifier for the attestations and assertions of a single app
#[derive(Debug, Clone)]
pub struct AppAttest<'a> {
    team_id: String,
    bundle_id: String,
    anchor: &'a TrustAnchor,
}

impl AppAttest<'static> {
    /// A verifier that trusts the bundled Apple App Attestation Root CA
    pub fn new(team_id: &str, bundle_id: &str) -> Result<Self, Error> {
        Ok(Self::with_trust_anchor(
            team_id,
            bundle_id,
            TrustAnchor::apple()?,
        ))
    }
}

impl<'a> AppAttest<'a> {
    pub fn with_trust_anchor(team_id: &str, bundle_id: &str, anchor: &'a TrustAnchor) -> Self {
        Self {
            team_id: team_id.to_string(),
            bundle_id: bundle_id.to_string(),
            anchor,
        }
    }

    /// `<team id>.<bundle id>`
    pub fn app_id(&self) -> String {
        format!("{}.{}", self.team_id, self.bundle_id)
    }

    /// The relying-party id hash every authenticator data must carry
    pub fn app_id_hash(&self) -> [u8; 32] {
        sha256(self.app_id().as_bytes())
    }

    pub fn trust_anchor(&self) -> &TrustAnchor {
        self.anchor
    }
}

/// SHA-256(authenticator data || SHA-256(client data)), where the client data
/// is the challenge for attestations and the request payload for assertions
pub fn nonce(auth_data: &[u8], client_data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(auth_data);
    h.update(&sha256(client_data));
    h.finish()
}

/// Constant-time comparison; only the lengths leak
pub(crate) fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && openssl::memcmp::eq(a, b)
}

pub(crate) fn crypto(e: ErrorStack) -> Error {
    Error::Crypto(e.to_string())
}

/// Log a verification failure and hand it back
pub(crate) fn rejected(what: &str, e: Error) -> Error {
    tracing::warn!(kind = ?e.kind(), "{what} rejected: {e}");
    e
}

fn p256_group() -> Result<EcGroup, Error> {
    EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).map_err(crypto)
}

/// The certified key, which must be on P-256
pub(crate) fn p256_key(cert: &X509Ref) -> Result<EcKey<Public>, Error> {
    let ec = cert
        .public_key()
        .map_err(|e| Error::InvalidPublicKey(e.to_string()))?
        .ec_key()
        .map_err(|_| Error::InvalidPublicKey("not an EC key".to_string()))?;

    if ec.group().curve_name() != Some(Nid::X9_62_PRIME256V1) {
        return Err(Error::InvalidPublicKey("not a P-256 key".to_string()));
    }

    Ok(ec)
}

/// A P-256 key from its uncompressed X9.63 encoding
pub(crate) fn p256_key_from_point(point: &[u8]) -> Result<EcKey<Public>, Error> {
    let group = p256_group()?;
    let mut ctx = BigNumContext::new().map_err(crypto)?;

    let p = EcPoint::from_bytes(&group, point, &mut ctx)
        .map_err(|e| Error::InvalidPublicKey(e.to_string()))?;

    EcKey::from_public_key(&group, &p).map_err(|e| Error::InvalidPublicKey(e.to_string()))
}

/// The uncompressed X9.63 encoding of the certified P-256 key.  Its SHA-256
/// is the credential id.
pub fn p256_public_point(cert: &X509Ref) -> Result<Vec<u8>, Error> {
    let ec = p256_key(cert)?;
    let mut ctx = BigNumContext::new().map_err(crypto)?;

    ec.public_key()
        .to_bytes(ec.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
        .map_err(crypto)
}
