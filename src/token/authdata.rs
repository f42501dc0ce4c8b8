// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::environment::{Environment, AAGUID_LEN};
use crate::errors::Error;

pub const RP_ID_HASH_LEN: usize = 32;

const RP_ID_HASH_OFFSET: usize = 0;
const FLAGS_OFFSET: usize = 32;
const SIGN_COUNT_OFFSET: usize = 33;
const SIGN_COUNT_LEN: usize = 4;
const AAGUID_OFFSET: usize = 37;
const CRED_ID_LEN_OFFSET: usize = 53;
const CRED_ID_LEN_LEN: usize = 2;
const CRED_ID_OFFSET: usize = 55;

/// Which envelope the authenticator data was found in.  Only attestations
/// carry the attested credential data (AAGUID and credential id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Attestation,
    Assertion,
}

/// The attested credential data that follows the counter in an attestation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredential {
    /// Decoded from the 16-byte AAGUID slot
    pub environment: Environment,
    /// SHA-256 of the credential public key; the key id, before base64
    pub credential_id: Vec<u8>,
}

/// For the layout, see "Verify the attestation" (step 7 onwards) in Apple's
/// "Validating apps that connect to your server" and §6.1 of WebAuthn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    /// The buffer exactly as received; nonces are computed over it
    pub raw: Vec<u8>,
    pub rp_id_hash: [u8; RP_ID_HASH_LEN], // [0, 32)
    pub flags: u8,                        // 32
    pub sign_count: u32,                  // [33, 37), big-endian
    pub attested: Option<AttestedCredential>,
}

/// Bounds-checked window into `buf`
fn window<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    field: &'static str,
) -> Result<&'a [u8], Error> {
    let end = offset.checked_add(len).ok_or(Error::TruncatedInput {
        field,
        needed: usize::MAX,
        len: buf.len(),
    })?;

    buf.get(offset..end).ok_or(Error::TruncatedInput {
        field,
        needed: end,
        len: buf.len(),
    })
}

impl AuthenticatorData {
    /// Decode the authenticator data found in an attestation or an assertion
    pub fn decode(buf: &[u8], variant: Variant) -> Result<AuthenticatorData, Error> {
        let mut rp_id_hash = [0u8; RP_ID_HASH_LEN];
        rp_id_hash.copy_from_slice(window(
            buf,
            RP_ID_HASH_OFFSET,
            RP_ID_HASH_LEN,
            "rp-id-hash",
        )?);

        let flags = window(buf, FLAGS_OFFSET, 1, "flags")?[0];

        let sign_count = window(buf, SIGN_COUNT_OFFSET, SIGN_COUNT_LEN, "sign-count")?
            .iter()
            .fold(0u32, |acc, b| acc << 8 | u32::from(*b));

        let attested = match variant {
            Variant::Assertion => None,
            Variant::Attestation => Some(Self::decode_attested(buf)?),
        };

        Ok(AuthenticatorData {
            raw: buf.to_vec(),
            rp_id_hash,
            flags,
            sign_count,
            attested,
        })
    }

    fn decode_attested(buf: &[u8]) -> Result<AttestedCredential, Error> {
        let environment =
            Environment::from_aaguid(window(buf, AAGUID_OFFSET, AAGUID_LEN, "aaguid")?)?;

        let l = window(buf, CRED_ID_LEN_OFFSET, CRED_ID_LEN_LEN, "credential-id-length")?;
        let cred_id_len = usize::from(u16::from_be_bytes([l[0], l[1]]));

        if cred_id_len == 0 {
            return Err(Error::MalformedAuthenticatorData(
                "zero-length credential id".to_string(),
            ));
        }

        // the declared length is only trusted once it fits in the buffer
        let credential_id = window(buf, CRED_ID_OFFSET, cred_id_len, "credential-id")?.to_vec();

        Ok(AttestedCredential {
            environment,
            credential_id,
        })
    }

    /// The environment, if this is attestation authenticator data
    pub fn environment(&self) -> Option<Environment> {
        self.attested.as_ref().map(|a| a.environment)
    }

    /// The credential id, if this is attestation authenticator data
    pub fn credential_id(&self) -> Option<&[u8]> {
        self.attested.as_ref().map(|a| a.credential_id.as_slice())
    }
}

#[cfg(test)]
pub(crate) fn encode(
    rp_id_hash: &[u8; RP_ID_HASH_LEN],
    sign_count: u32,
    attested: Option<(Environment, &[u8])>,
) -> Vec<u8> {
    let mut v = Vec::new();

    v.extend_from_slice(rp_id_hash);
    // UP | UV | AT, as set by the device on attestation
    v.push(if attested.is_some() { 0x45 } else { 0x05 });
    v.extend_from_slice(&sign_count.to_be_bytes());

    if let Some((env, cred_id)) = attested {
        v.extend_from_slice(env.aaguid());
        v.extend_from_slice(&(cred_id.len() as u16).to_be_bytes());
        v.extend_from_slice(cred_id);
    }

    v
}
