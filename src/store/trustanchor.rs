// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Error;
use openssl::x509::X509;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

const APPLE_APP_ATTESTATION_ROOT_CA: &str =
    include_str!("../../certs/Apple_App_Attestation_Root_CA.pem");

static APPLE_ROOT: OnceLock<TrustAnchor> = OnceLock::new();

/// The root certificate that App Attest certificate chains must lead to
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    certificate: X509,
}

impl TrustAnchor {
    pub fn new(certificate: X509) -> Self {
        Self { certificate }
    }

    /// Build a trust anchor from a PEM-encoded certificate
    pub fn from_pem(pem: &[u8]) -> Result<Self, Error> {
        X509::from_pem(pem)
            .map(Self::new)
            .map_err(|e| Error::TrustAnchor(format!("parsing PEM: {e}")))
    }

    /// Build a trust anchor from a DER-encoded certificate
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        X509::from_der(der)
            .map(Self::new)
            .map_err(|e| Error::TrustAnchor(format!("parsing DER: {e}")))
    }

    /// Load a trust anchor from a file containing either a PEM or a DER
    /// certificate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        let buf = fs::read(path)
            .map_err(|e| Error::TrustAnchor(format!("reading {}: {e}", path.display())))?;

        Self::from_pem(&buf).or_else(|_| Self::from_der(&buf))
    }

    /// The Apple App Attestation Root CA bundled with the crate.  It is parsed
    /// on first use and shared for the lifetime of the process.
    pub fn apple() -> Result<&'static TrustAnchor, Error> {
        if let Some(ta) = APPLE_ROOT.get() {
            return Ok(ta);
        }

        let ta = Self::from_pem(APPLE_APP_ATTESTATION_ROOT_CA.as_bytes())?;

        Ok(APPLE_ROOT.get_or_init(|| ta))
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }
}
