// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::{crypto, ct_eq, nonce, p256_key, p256_key_from_point, rejected, AppAttest};
use crate::errors::Error;
use crate::store::ICredentialStore;
use crate::token::base64::{decode_key_id, encode_key_id};
use crate::token::Assertion;
use openssl::ec::EcKey;
use openssl::ecdsa::EcdsaSig;
use openssl::pkey::Public;
use openssl::sha::sha256;
use openssl::x509::X509Ref;

impl AppAttest<'_> {
    /// Verify an assertion over `payload`, signed by the key certified by
    /// `certificate`, whose last known counter is `stored_counter`.
    ///
    /// On success returns the assertion's counter, which the caller must
    /// persist in place of `stored_counter`.
    pub fn verify_assertion(
        &self,
        assertion: &[u8],
        payload: &[u8],
        certificate: &X509Ref,
        stored_counter: u32,
    ) -> Result<u32, Error> {
        self.check_assertion(assertion, payload, stored_counter, || p256_key(certificate))
            .map_err(|e| rejected("assertion", e))
    }

    /// Same as [`AppAttest::verify_assertion`], with the key given as its
    /// uncompressed X9.63 encoding instead of a certificate
    pub fn verify_assertion_with_public_key(
        &self,
        assertion: &[u8],
        payload: &[u8],
        public_key: &[u8],
        stored_counter: u32,
    ) -> Result<u32, Error> {
        self.check_assertion(assertion, payload, stored_counter, || {
            p256_key_from_point(public_key)
        })
        .map_err(|e| rejected("assertion", e))
    }

    /// Verify an assertion from the key `key_id` recorded in `store`, and
    /// advance the stored counter.  The update is a compare-and-swap: of two
    /// assertions racing with the same counter, at most one succeeds.
    pub fn verify_assertion_for(
        &self,
        store: &impl ICredentialStore,
        key_id: &str,
        assertion: &[u8],
        payload: &[u8],
    ) -> Result<u32, Error> {
        let key_id = encode_key_id(&decode_key_id(key_id).map_err(|e| rejected("assertion", e))?);

        let record = store
            .lookup(&key_id)
            .and_then(|r| r.ok_or_else(|| Error::UnknownCredential(key_id.clone())))
            .map_err(|e| rejected("assertion", e))?;

        let n = self.verify_assertion_with_public_key(
            assertion,
            payload,
            &record.public_key,
            record.sign_count,
        )?;

        let swapped = store
            .update_counter(&key_id, record.sign_count, n)
            .map_err(|e| rejected("assertion", e))?;

        if !swapped {
            return Err(rejected(
                "assertion",
                Error::InvalidCounter(format!(
                    "counter for {key_id} moved past {} concurrently",
                    record.sign_count
                )),
            ));
        }

        tracing::debug!(key_id = %key_id, sign_count = n, "counter advanced");

        Ok(n)
    }

    fn check_assertion<F>(
        &self,
        assertion: &[u8],
        payload: &[u8],
        stored_counter: u32,
        key: F,
    ) -> Result<u32, Error>
    where
        F: FnOnce() -> Result<EcKey<Public>, Error>,
    {
        let a = Assertion::decode(assertion)?;
        let sign_count = a.auth_data.sign_count;

        if sign_count <= stored_counter {
            return Err(Error::InvalidCounter(format!(
                "expecting more than {stored_counter}, got {sign_count}"
            )));
        }

        if !ct_eq(&a.auth_data.rp_id_hash, &self.app_id_hash()) {
            return Err(Error::InvalidRelyingPartyId);
        }

        let n = nonce(&a.auth_data.raw, payload);
        let key = key()?;

        let sig = EcdsaSig::from_der(&a.signature)
            .map_err(|e| Error::Syntax(format!("signature: {e}")))?;

        if !sig.verify(&sha256(&n), &key).map_err(crypto)? {
            return Err(Error::InvalidNonce);
        }

        tracing::debug!(app_id = %self.app_id(), sign_count, "assertion verified");

        Ok(sign_count)
    }
}
