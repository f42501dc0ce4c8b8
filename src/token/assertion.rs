// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::authdata::{AuthenticatorData, Variant};
use super::common::*;
use crate::errors::Error;
use bitmask::*;
use ciborium::Value;

const SIGNATURE_LABEL: &str = "signature";
const AUTH_DATA_LABEL: &str = "authenticatorData";

bitmask! {
    #[derive(Debug)]
    mask FieldsSet: u8 where flags Fields {
        Signature = 0x01,
        AuthData  = 0x02,
    }
}

/// A decoded (but not yet verified) App Attest assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// DER-encoded ECDSA P-256 signature over the nonce
    pub signature: Vec<u8>,
    /// `authenticatorData`: rp-id hash, flags and counter only
    pub auth_data: AuthenticatorData,
}

impl Assertion {
    /// Decode a CBOR-encoded assertion object
    pub fn decode(buf: &[u8]) -> Result<Assertion, Error> {
        let contents = decode_map(buf, "assertion object")?;

        let mut signature: Vec<u8> = Default::default();
        let mut raw_auth_data: Vec<u8> = Default::default();
        let mut fields_set = FieldsSet::none();

        for (k, v) in contents.iter() {
            match to_key(k, "assertion object")? {
                SIGNATURE_LABEL => {
                    if fields_set.contains(Fields::Signature) {
                        return Err(Error::DuplicatedField(SIGNATURE_LABEL.to_string()));
                    }
                    signature = to_bstr(v, SIGNATURE_LABEL)?;
                    fields_set.set(Fields::Signature);
                }
                AUTH_DATA_LABEL => {
                    if fields_set.contains(Fields::AuthData) {
                        return Err(Error::DuplicatedField(AUTH_DATA_LABEL.to_string()));
                    }
                    raw_auth_data = to_bstr(v, AUTH_DATA_LABEL)?;
                    fields_set.set(Fields::AuthData);
                }
                unknown => {
                    tracing::debug!("ignoring unknown key {unknown} in assertion object");
                }
            }
        }

        for (f, n) in [
            (Fields::Signature, SIGNATURE_LABEL),
            (Fields::AuthData, AUTH_DATA_LABEL),
        ] {
            if !fields_set.contains(f) {
                return Err(Error::MissingField(n.to_string()));
            }
        }

        Ok(Assertion {
            signature,
            auth_data: AuthenticatorData::decode(&raw_auth_data, Variant::Assertion)?,
        })
    }
}
