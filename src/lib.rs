// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Apple App Attest attestation and assertion verification.
//!
//! This crate provides an API for a server to decide whether a request comes
//! from a genuine instance of its app, running on a genuine Apple device,
//! holding a specific attested P-256 key.  For detailed information about
//! the protocol, see Apple's [DeviceCheck] documentation.
//!
//! The API allows:
//! * Decoding the CBOR-encoded attestation and assertion objects
//! * Validating an attestation's certificate chain against the App Attest
//!   root, and its binding to the app, the key and the server's challenge
//! * Verifying assertion signatures and enforcing counter monotonicity
//! * Keeping track of attested keys and their counters
//!
//! # Example
//!
//! ```no_run
//! use appattest::store::{CredentialRecord, ICredentialStore, MemoCredentialStore};
//! use appattest::token::Environment;
//! use appattest::verify::AppAttest;
//!
//! # fn main() -> Result<(), appattest::Error> {
//! # let (challenge, key_id, attestation) = (b"", "", b"");
//! # let (assertion, request_body) = (b"", b"");
//! let v = AppAttest::new("0352187391", "com.apple.example_app_attest")?;
//! let store = MemoCredentialStore::new();
//!
//! // once per key
//! let a = v.verify_attestation(challenge, key_id, attestation, Environment::Production)?;
//! store.insert(CredentialRecord::from_attestation(&a)?)?;
//!
//! // on each request
//! let counter = v.verify_assertion_for(&store, key_id, assertion, request_body)?;
//! # Ok(())
//! # }
//! ```
//!
//! [DeviceCheck]: https://developer.apple.com/documentation/devicecheck/validating-apps-that-connect-to-your-server

pub mod config;
pub mod errors;
pub mod store;
pub mod token;
pub mod verify;

#[cfg(test)]
mod fixtures;

pub use self::errors::{Error, ErrorKind};
