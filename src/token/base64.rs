// SPDX-License-Identifier: Apache-2.0

use base64::{self, engine::general_purpose, Engine as _};
use serde::{
    de::{self, Deserialize, Visitor},
    ser::{Serialize, Serializer},
};

use crate::errors::Error;

/// Decodes a key identifier as handed out by the device.  Both the URL-safe
/// and the standard alphabet are accepted, and missing padding is restored
/// before decoding.
pub fn decode_key_id(v: &str) -> Result<Vec<u8>, Error> {
    let mut s: String = v
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    while s.len() % 4 != 0 {
        s.push('=');
    }

    general_purpose::STANDARD
        .decode(s)
        .map_err(|_| Error::InvalidKeyId)
}

/// Encodes a credential identifier into its URL-safe, unpadded key id form
pub fn encode_key_id(v: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(v)
}

/// decodes bytes from a base64-encoded string, in either alphabet
pub fn decode_str(v: &str) -> Result<Vec<u8>, Error> {
    let t = v.trim();

    general_purpose::STANDARD
        .decode(t)
        .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(t.trim_end_matches('=')))
        .map_err(|e| Error::Syntax(e.to_string()))
}

/// a `Vec<u8>` encoded as base64 in human readable serialization
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Bytes(Vec::new())
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_owned())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl TryFrom<&str> for Bytes {
    type Error = Error;

    fn try_from(v: &str) -> Result<Self, Error> {
        general_purpose::URL_SAFE_NO_PAD
            .decode(v)
            .map(Bytes)
            .map_err(|e| Error::Syntax(e.to_string()))
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(&base64::display::Base64Display::new(
                &self.0,
                &general_purpose::URL_SAFE_NO_PAD,
            ))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(BytesVisitor {})
    }
}

struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Bytes;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a text string or a byte string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Bytes::try_from(v).map_err(de::Error::custom)
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Bytes::from(v))
    }
}
