// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::credential::CredentialRecord;
use super::ICredentialStore;
use crate::errors::Error;
use std::collections::HashMap;
use std::sync::RwLock;

/// An in-memory credential store
#[derive(Debug)]
pub struct MemoCredentialStore {
    p: RwLock<HashMap<String, CredentialRecord>>,
}

impl Default for MemoCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Store("lock poisoned".to_string())
}

impl MemoCredentialStore {
    /// Returns a new empty MemoCredentialStore
    pub fn new() -> Self {
        Self {
            p: Default::default(),
        }
    }

    /// Add to an existing (and possibly empty) store the records found in
    /// the given JSON array
    pub fn load_json(&self, j: &str) -> Result<(), Error> {
        let records: Vec<CredentialRecord> =
            serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        for r in records {
            self.insert(r)?;
        }

        Ok(())
    }

    /// Serialise all records as a JSON array, ordered by key id
    pub fn to_json(&self) -> Result<String, Error> {
        let p = self.p.read().map_err(poisoned)?;

        let mut records: Vec<&CredentialRecord> = p.values().collect();
        records.sort_by(|a, b| a.key_id.cmp(&b.key_id));

        serde_json::to_string_pretty(&records).map_err(|e| Error::Syntax(e.to_string()))
    }
}

impl ICredentialStore for MemoCredentialStore {
    fn lookup(&self, key_id: &str) -> Result<Option<CredentialRecord>, Error> {
        Ok(self.p.read().map_err(poisoned)?.get(key_id).cloned())
    }

    fn insert(&self, record: CredentialRecord) -> Result<(), Error> {
        self.p
            .write()
            .map_err(poisoned)?
            .insert(record.key_id.clone(), record);

        Ok(())
    }

    fn update_counter(&self, key_id: &str, expected: u32, new: u32) -> Result<bool, Error> {
        let mut p = self.p.write().map_err(poisoned)?;

        let r = p
            .get_mut(key_id)
            .ok_or_else(|| Error::UnknownCredential(key_id.to_string()))?;

        if r.sign_count != expected {
            return Ok(false);
        }

        r.sign_count = new;

        Ok(true)
    }
}
