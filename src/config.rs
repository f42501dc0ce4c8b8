// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Relying-party configuration: which app is expected to attest, in which
//! environment, and (optionally) which root to trust instead of Apple's.
//!
//! ```json
//! {
//!   "team-id": "0352187391",
//!   "bundle-id": "com.apple.example_app_attest",
//!   "environment": "development"
//! }
//! ```

use crate::errors::Error;
use crate::store::TrustAnchor;
use crate::token::Environment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// The developer team identifier
    pub team_id: String,

    /// The app's bundle identifier
    pub bundle_id: String,

    /// The environment attestations are expected to come from
    #[serde(default)]
    pub environment: Environment,

    /// A PEM or DER root certificate to use in place of the bundled Apple
    /// App Attestation Root CA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_ca: Option<PathBuf>,
}

impl Config {
    /// Parse and validate a JSON configuration
    pub fn parse(j: &str) -> Result<Self, Error> {
        let c: Config = serde_json::from_str(j).map_err(|e| Error::Config(e.to_string()))?;

        c.validate()?;

        Ok(c)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        let j = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;

        Self::parse(&j)
    }

    fn validate(&self) -> Result<(), Error> {
        for (v, n) in [(&self.team_id, "team-id"), (&self.bundle_id, "bundle-id")] {
            if v.trim().is_empty() {
                return Err(Error::Config(format!("{n} must not be empty")));
            }
        }

        Ok(())
    }

    /// The trust anchor named by `root-ca`, or the bundled Apple root
    pub fn trust_anchor(&self) -> Result<TrustAnchor, Error> {
        match &self.root_ca {
            Some(path) => TrustAnchor::load(path),
            None => TrustAnchor::apple().cloned(),
        }
    }
}
