// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::authdata::{AuthenticatorData, Variant};
use super::common::*;
use super::environment::Environment;
use super::statement::Statement;
use crate::errors::Error;
use bitmask::*;
use ciborium::Value;

/// The only attestation statement format App Attest produces
pub const APPLE_APPATTEST_FORMAT: &str = "apple-appattest";

const FMT_LABEL: &str = "fmt";
const ATT_STMT_LABEL: &str = "attStmt";
const AUTH_DATA_LABEL: &str = "authData";

bitmask! {
    #[derive(Debug)]
    mask FieldsSet: u8 where flags Fields {
        Format    = 0x01,
        Statement = 0x02,
        AuthData  = 0x04,
    }
}

/// The undecoded members of the attestation object
struct RawAttestation {
    format: String,
    statement: Vec<(Value, Value)>,
    auth_data: Vec<u8>,

    fields_set: FieldsSet,
}

impl RawAttestation {
    fn new() -> Self {
        Self {
            format: String::new(),
            statement: Default::default(),
            auth_data: Default::default(),
            fields_set: FieldsSet::none(),
        }
    }

    fn decode(buf: &[u8]) -> Result<RawAttestation, Error> {
        let contents = decode_map(buf, "attestation object")?;

        let mut raw = RawAttestation::new();

        raw.parse(&contents)?;
        raw.validate()?;

        Ok(raw)
    }

    fn parse(&mut self, contents: &[(Value, Value)]) -> Result<(), Error> {
        for (k, v) in contents.iter() {
            match to_key(k, "attestation object")? {
                FMT_LABEL => self.set_format(v)?,
                ATT_STMT_LABEL => self.set_statement(v)?,
                AUTH_DATA_LABEL => self.set_auth_data(v)?,
                unknown => {
                    tracing::debug!("ignoring unknown key {unknown} in attestation object");
                }
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        let mandatory_fields = [
            (Fields::Format, FMT_LABEL),
            (Fields::Statement, ATT_STMT_LABEL),
            (Fields::AuthData, AUTH_DATA_LABEL),
        ];

        for (f, n) in mandatory_fields.iter() {
            if !self.fields_set.contains(*f) {
                return Err(Error::MissingField(n.to_string()));
            }
        }

        Ok(())
    }

    fn set_format(&mut self, v: &Value) -> Result<(), Error> {
        if self.fields_set.contains(Fields::Format) {
            return Err(Error::DuplicatedField(FMT_LABEL.to_string()));
        }

        self.format = to_tstr(v, FMT_LABEL)?;

        self.fields_set.set(Fields::Format);

        Ok(())
    }

    fn set_statement(&mut self, v: &Value) -> Result<(), Error> {
        if self.fields_set.contains(Fields::Statement) {
            return Err(Error::DuplicatedField(ATT_STMT_LABEL.to_string()));
        }

        self.statement = to_map(v, ATT_STMT_LABEL)?.clone();

        self.fields_set.set(Fields::Statement);

        Ok(())
    }

    fn set_auth_data(&mut self, v: &Value) -> Result<(), Error> {
        if self.fields_set.contains(Fields::AuthData) {
            return Err(Error::DuplicatedField(AUTH_DATA_LABEL.to_string()));
        }

        self.auth_data = to_bstr(v, AUTH_DATA_LABEL)?;

        self.fields_set.set(Fields::AuthData);

        Ok(())
    }
}

/// A decoded (but not yet verified) App Attest attestation object
#[derive(Debug, Clone)]
pub struct Attestation {
    /// `fmt`, expected to be [`APPLE_APPATTEST_FORMAT`]
    pub format: String,
    /// `attStmt`
    pub statement: Statement,
    /// `authData`, decoded with the attested credential data
    pub auth_data: AuthenticatorData,
}

impl Attestation {
    /// Decode a CBOR-encoded attestation object.  Only the structure is
    /// checked here; see [`crate::verify::AppAttest::verify_attestation`].
    pub fn decode(buf: &[u8]) -> Result<Attestation, Error> {
        let raw = RawAttestation::decode(buf)?;

        let auth_data = AuthenticatorData::decode(&raw.auth_data, Variant::Attestation)?;
        let statement = Statement::parse(&raw.statement)?;

        Ok(Attestation {
            format: raw.format,
            statement,
            auth_data,
        })
    }

    pub fn environment(&self) -> Option<Environment> {
        self.auth_data.environment()
    }

    pub fn credential_id(&self) -> &[u8] {
        self.auth_data.credential_id().unwrap_or_default()
    }
}
