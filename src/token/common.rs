// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Error;
use ciborium::de::from_reader;
use ciborium::Value;

/// Decode a CBOR buffer that must contain a single map and return its entries
pub(crate) fn decode_map(buf: &[u8], what: &str) -> Result<Vec<(Value, Value)>, Error> {
    let v: Value = from_reader(buf).map_err(|e| Error::Syntax(format!("{what}: {e}")))?;

    match v {
        Value::Map(contents) => Ok(contents),
        _ => Err(Error::Syntax(format!("{what}: expecting map type"))),
    }
}

/// Return the text of a map key, or a syntax error naming the container
pub(crate) fn to_key<'a>(k: &'a Value, what: &str) -> Result<&'a str, Error> {
    k.as_text()
        .ok_or_else(|| Error::Syntax(format!("non-text key in {what}")))
}

pub(crate) fn to_bstr(v: &Value, name: &str) -> Result<Vec<u8>, Error> {
    match v {
        Value::Bytes(b) => Ok(b.clone()),
        _ => Err(Error::Syntax(format!("{name} MUST be bytes"))),
    }
}

pub(crate) fn to_tstr(v: &Value, name: &str) -> Result<String, Error> {
    match v {
        Value::Text(t) => Ok(t.clone()),
        _ => Err(Error::Syntax(format!("{name} MUST be text"))),
    }
}

pub(crate) fn to_array<'a>(v: &'a Value, name: &str) -> Result<&'a Vec<Value>, Error> {
    v.as_array()
        .ok_or_else(|| Error::Syntax(format!("{name} MUST be array")))
}

pub(crate) fn to_map<'a>(v: &'a Value, name: &str) -> Result<&'a Vec<(Value, Value)>, Error> {
    v.as_map()
        .ok_or_else(|| Error::Syntax(format!("{name} MUST be map")))
}
