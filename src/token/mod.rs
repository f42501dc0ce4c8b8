// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The token module decodes the two objects an App Attest client sends: the
//! one-off [`Attestation`] produced when a key is attested, and the
//! [`Assertion`] that accompanies each later request.
//!
//! Decoding only checks structure.  Use [`crate::verify::AppAttest`] to
//! verify them.
//!
//! # Example
//!
//! ```
//! use appattest::token::{Attestation, Environment};
//!
//! const ATT: &[u8] = include_bytes!("../../testdata/apple-attestation.cbor");
//!
//! let a = Attestation::decode(ATT).expect("decoding attestation");
//!
//! assert_eq!(a.environment(), Some(Environment::Production));
//! assert_eq!(a.auth_data.sign_count, 0);
//! ```

pub use self::assertion::Assertion;
pub use self::attestation::{Attestation, APPLE_APPATTEST_FORMAT};
pub use self::authdata::{AttestedCredential, AuthenticatorData, Variant, RP_ID_HASH_LEN};
pub use self::environment::{Environment, AAGUID_LEN};
pub use self::statement::Statement;

mod assertion;
mod attestation;
pub(crate) mod authdata;
pub mod base64;
mod common;
mod environment;
mod statement;
