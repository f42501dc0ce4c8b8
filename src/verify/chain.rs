// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::crypto;
use crate::errors::Error;
use crate::store::TrustAnchor;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509Ref, X509StoreContext};
use std::collections::BTreeSet;

/// Check that `leaf` chains to `anchor` through `intermediate`, at the
/// current time, using openssl's default RFC 5280 policy.  Revocation is not
/// checked.
///
/// Validation failures are reported as [`Error::CouldNotValidateCertificate`].
/// A chain that validates, but not through exactly the anchor, the
/// intermediate and the leaf, is reported as
/// [`Error::FailedValidateCertificate`].
pub fn verify_chain(
    anchor: &TrustAnchor,
    leaf: &X509Ref,
    intermediate: &X509Ref,
) -> Result<(), Error> {
    let mut builder = X509StoreBuilder::new().map_err(crypto)?;
    builder
        .add_cert(anchor.certificate().clone())
        .map_err(crypto)?;
    let store = builder.build();

    let mut untrusted = Stack::new().map_err(crypto)?;
    untrusted.push(intermediate.to_owned()).map_err(crypto)?;

    let mut ctx = X509StoreContext::new().map_err(crypto)?;

    let outcome = ctx
        .init(&store, leaf, &untrusted, |c| {
            if !c.verify_cert()? {
                return Ok(Err(c.error()));
            }

            let built = match c.chain() {
                Some(chain) => chain
                    .iter()
                    .map(|cert| cert.to_der())
                    .collect::<Result<BTreeSet<_>, _>>()?,
                None => BTreeSet::new(),
            };

            Ok(Ok(built))
        })
        .map_err(crypto)?;

    let built = outcome
        .map_err(|e| Error::CouldNotValidateCertificate(e.error_string().to_string()))?;

    let root: &X509Ref = anchor.certificate();
    let expected = [root, leaf, intermediate]
        .iter()
        .map(|cert| cert.to_der())
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(crypto)?;

    if built != expected {
        return Err(Error::FailedValidateCertificate(format!(
            "built a chain of {} certificates, not through the intermediate",
            built.len()
        )));
    }

    tracing::debug!("certificate chain verified");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ec_key, Pki};
    use crate::token::Attestation;

    #[test]
    fn good_chain() {
        let pki = Pki::new();
        let leaf = pki.leaf(None);

        verify_chain(&pki.trust_anchor(), &leaf, &pki.intermediate).unwrap();
    }

    #[test]
    fn foreign_root() {
        let pki = Pki::new();
        let other = Pki::new();
        let leaf = pki.leaf(None);

        assert!(matches!(
            verify_chain(&other.trust_anchor(), &leaf, &pki.intermediate),
            Err(Error::CouldNotValidateCertificate(_))
        ));
    }

    #[test]
    fn wrong_intermediate() {
        let pki = Pki::new();
        let other = Pki::new();
        let leaf = pki.leaf(None);

        assert!(matches!(
            verify_chain(&pki.trust_anchor(), &leaf, &other.intermediate),
            Err(Error::CouldNotValidateCertificate(_))
        ));
    }

    #[test]
    fn leaf_issued_by_root() {
        let pki = Pki::new();
        let leaf = pki.leaf_from_root(&ec_key(), None);

        assert!(matches!(
            verify_chain(&pki.trust_anchor(), &leaf, &pki.intermediate),
            Err(Error::FailedValidateCertificate(_))
        ));
    }

    #[test]
    fn apple_chain_has_expired() {
        let a = Attestation::decode(include_bytes!("../../testdata/apple-attestation.cbor"))
            .unwrap();

        assert!(matches!(
            verify_chain(
                TrustAnchor::apple().unwrap(),
                &a.statement.credential_certificate,
                &a.statement.intermediate_certificate
            ),
            Err(Error::CouldNotValidateCertificate(_))
        ));
    }
}
