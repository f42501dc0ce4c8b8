// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the AAGUID slot in attested authenticator data
pub const AAGUID_LEN: usize = 16;

const PRODUCTION_AAGUID: &[u8; AAGUID_LEN] = b"appattest\0\0\0\0\0\0\0";
const DEVELOPMENT_AAGUID: &[u8; AAGUID_LEN] = b"appattestdevelop";

/// The App Attest environment a key was generated in.  Keys minted by the
/// development environment are not trustworthy in production and vice-versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    /// The 16-byte AAGUID tag that identifies this environment on the wire
    pub fn aaguid(&self) -> &'static [u8; AAGUID_LEN] {
        match self {
            Environment::Production => PRODUCTION_AAGUID,
            Environment::Development => DEVELOPMENT_AAGUID,
        }
    }

    /// Map an AAGUID tag back to its environment
    pub fn from_aaguid(tag: &[u8]) -> Result<Self, Error> {
        match tag {
            t if t == PRODUCTION_AAGUID => Ok(Environment::Production),
            t if t == DEVELOPMENT_AAGUID => Ok(Environment::Development),
            t => Err(Error::InvalidEnvironmentTag(
                String::from_utf8_lossy(t).escape_debug().to_string(),
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Development => f.write_str("development"),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "production" => Ok(Environment::Production),
            "development" => Ok(Environment::Development),
            x => Err(Error::Config(format!("unknown environment {x}"))),
        }
    }
}
