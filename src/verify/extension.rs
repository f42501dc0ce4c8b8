// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Error;
use x509_parser::der_parser::der::*;
use x509_parser::der_parser::error::BerError;
use x509_parser::nom;

/// The credential certificate extension carrying the attestation nonce
pub const APPLE_NONCE_EXTENSION_OID: &str = "1.2.840.113635.100.8.2";

/// Extract the nonce from the DER-encoded credential certificate
pub(crate) fn nonce_from_certificate(der: &[u8]) -> Result<Vec<u8>, Error> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| Error::InvalidCertificate(e.to_string()))?;

    let ext = cert
        .extensions()
        .iter()
        .find(|ext| ext.oid.to_id_string() == APPLE_NONCE_EXTENSION_OID)
        .ok_or(Error::MissingExtension)?;

    parse_nonce(ext.value)
}

/// The extension value is `SEQUENCE { [n] EXPLICIT OCTET STRING }`, for any
/// context-specific `n` (Apple uses `[1]`)
fn parse_nonce(value: &[u8]) -> Result<Vec<u8>, Error> {
    let (_, nonce) = parse_der_container(|i: &[u8], hdr: Header| {
        if hdr.tag() != Tag::Sequence {
            return Err(nom::Err::Error(BerError::BerTypeError));
        }

        let (i, tagged) = der_read_element_header(i)?;
        if tagged.class() != Class::ContextSpecific || !tagged.is_constructed() {
            return Err(nom::Err::Error(BerError::BerTypeError));
        }

        let len = tagged.length().definite().map_err(nom::Err::Error)?;
        if i.len() < len {
            return Err(nom::Err::Error(BerError::InvalidLength));
        }

        let (rest, octets) = parse_der_octetstring(&i[..len])?;
        if !rest.is_empty() {
            return Err(nom::Err::Error(BerError::InvalidLength));
        }

        Ok((&i[len..], octets.as_slice()?.to_vec()))
    })(value)
    .map_err(|e| Error::MalformedExtension(e.to_string()))?;

    Ok(nonce)
}
