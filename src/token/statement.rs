// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::common::*;
use crate::errors::Error;
use ciborium::Value;
use openssl::x509::X509;

const X5C_LABEL: &str = "x5c";
const RECEIPT_LABEL: &str = "receipt";

/// The `attStmt` of an App Attest attestation object
#[derive(Debug, Clone)]
pub struct Statement {
    /// credCert: the leaf, certifying the attested key
    pub credential_certificate: X509,
    /// caCert: the App Attest intermediate CA
    pub intermediate_certificate: X509,
    /// Opaque receipt, usable later with Apple's fraud-metric service
    pub receipt: Vec<u8>,
}

impl Statement {
    pub(crate) fn parse(contents: &[(Value, Value)]) -> Result<Statement, Error> {
        let mut x5c: Option<Vec<Vec<u8>>> = None;
        let mut receipt: Option<Vec<u8>> = None;

        for (k, v) in contents.iter() {
            match to_key(k, "attStmt")? {
                X5C_LABEL => {
                    if x5c.is_some() {
                        return Err(Error::DuplicatedField(X5C_LABEL.to_string()));
                    }

                    let certs = to_array(v, X5C_LABEL)?
                        .iter()
                        .enumerate()
                        .map(|(i, c)| to_bstr(c, &format!("x5c[{i}]")))
                        .collect::<Result<Vec<_>, _>>()?;

                    x5c = Some(certs);
                }
                RECEIPT_LABEL => {
                    if receipt.is_some() {
                        return Err(Error::DuplicatedField(RECEIPT_LABEL.to_string()));
                    }

                    receipt = Some(to_bstr(v, RECEIPT_LABEL)?);
                }
                unknown => {
                    tracing::debug!("ignoring unknown key {unknown} in attStmt");
                }
            }
        }

        let x5c = x5c.ok_or(Error::MissingCredentialCertificate)?;
        let receipt = receipt.ok_or_else(|| Error::MissingField(RECEIPT_LABEL.to_string()))?;

        let (leaf, intermediate) = match x5c.as_slice() {
            [] => return Err(Error::MissingCredentialCertificate),
            [_] => return Err(Error::MissingIntermediateCertificate),
            [leaf, intermediate] => (leaf, intermediate),
            more => return Err(Error::UnexpectedCertificate(more.len())),
        };

        Ok(Statement {
            credential_certificate: X509::from_der(leaf)
                .map_err(|e| Error::InvalidCertificate(format!("credCert: {e}")))?,
            intermediate_certificate: X509::from_der(intermediate)
                .map_err(|e| Error::InvalidCertificate(format!("caCert: {e}")))?,
            receipt,
        })
    }
}
