// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::credential::CredentialRecord;
use crate::errors::Error;

/// Interface to the store where the attested keys are stashed.  Records are
/// indexed by their URL-safe, unpadded key id.
pub trait ICredentialStore {
    /// Lookup a credential record given its key id
    fn lookup(&self, key_id: &str) -> Result<Option<CredentialRecord>, Error>;

    /// Add a freshly attested credential, replacing any previous record with
    /// the same key id
    fn insert(&self, record: CredentialRecord) -> Result<(), Error>;

    /// Set the counter of `key_id` to `new`, provided it still holds
    /// `expected`.  Returns `false` if the stored counter had moved.
    fn update_counter(&self, key_id: &str, expected: u32, new: u32) -> Result<bool, Error>;
}
