// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::extension::nonce_from_certificate;
use super::{crypto, ct_eq, nonce, p256_public_point, rejected, verify_chain, AppAttest};
use crate::errors::Error;
use crate::token::base64::decode_key_id;
use crate::token::{Attestation, Environment, APPLE_APPATTEST_FORMAT};
use openssl::sha::sha256;

impl AppAttest<'_> {
    /// Verify an attestation object for the key identified by `key_id`,
    /// generated in `environment` in response to `challenge`.
    ///
    /// See "Verify the attestation" in Apple's "Validating apps that connect
    /// to your server".  Checks are run in that order, and the first failing
    /// one determines the error.  On success the decoded attestation is
    /// returned; the caller is expected to persist the credential public key
    /// (or certificate) along with a counter of 0, e.g. via
    /// [`crate::store::CredentialRecord::from_attestation`].
    pub fn verify_attestation(
        &self,
        challenge: &[u8],
        key_id: &str,
        attestation: &[u8],
        environment: Environment,
    ) -> Result<Attestation, Error> {
        self.check_attestation(challenge, key_id, attestation, environment)
            .map_err(|e| rejected("attestation", e))
    }

    fn check_attestation(
        &self,
        challenge: &[u8],
        key_id: &str,
        attestation: &[u8],
        environment: Environment,
    ) -> Result<Attestation, Error> {
        let a = Attestation::decode(attestation)?;

        if a.format != APPLE_APPATTEST_FORMAT {
            return Err(Error::InvalidFormat(a.format));
        }

        let got = a.environment().ok_or_else(|| {
            Error::MalformedAuthenticatorData("no attested credential data".to_string())
        })?;

        if got != environment {
            return Err(Error::InvalidAaguid {
                expected: environment.to_string(),
                got: got.to_string(),
            });
        }

        if a.auth_data.sign_count != 0 {
            return Err(Error::InvalidCounter(format!(
                "expecting 0 in an attestation, got {}",
                a.auth_data.sign_count
            )));
        }

        let leaf = &a.statement.credential_certificate;

        verify_chain(self.anchor, leaf, &a.statement.intermediate_certificate)?;

        let key_hash = sha256(&p256_public_point(leaf)?);
        let key_id = decode_key_id(key_id)?;

        if !ct_eq(&key_hash, &key_id) {
            return Err(Error::InvalidKeyId);
        }

        if !ct_eq(&a.auth_data.rp_id_hash, &self.app_id_hash()) {
            return Err(Error::InvalidRelyingPartyId);
        }

        if !ct_eq(&key_id, a.credential_id()) {
            return Err(Error::InvalidKeyId);
        }

        let expected = nonce(&a.auth_data.raw, challenge);
        let attested = nonce_from_certificate(&leaf.to_der().map_err(crypto)?)?;

        if !ct_eq(&expected, &attested) {
            return Err(Error::InvalidNonce);
        }

        tracing::debug!(
            app_id = %self.app_id(),
            environment = %environment,
            "attestation verified"
        );

        Ok(a)
    }
}
