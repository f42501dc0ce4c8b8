// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Trust anchors, and the records kept about attested keys.

pub use self::credential::CredentialRecord;
pub use self::icredentialstore::ICredentialStore;
pub use self::memo_credentialstore::MemoCredentialStore;
pub use self::trustanchor::TrustAnchor;

mod credential;
mod icredentialstore;
mod memo_credentialstore;
mod trustanchor;
