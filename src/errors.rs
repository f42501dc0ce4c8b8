// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

/// Coarse classification of an [`Error`], for callers that need to map
/// failures onto a transport (e.g., HTTP status codes) or decide what to
/// report to security logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client sent bytes that do not decode: treat as a client error.
    Malformed,
    /// The certificate chain does not lead to the pinned root.
    Trust,
    /// Well-formed input that is bound to the wrong key, app, challenge or
    /// counter: a potential forgery or replay.
    Binding,
    /// Verifier misconfiguration or a failure unrelated to the input.
    Internal,
}

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Duplicated field: {0}")]
    DuplicatedField(String),
    #[error("Truncated input: {field} needs {needed} bytes, got {len}")]
    TruncatedInput {
        field: &'static str,
        needed: usize,
        len: usize,
    },
    #[error("Malformed authenticator data: {0}")]
    MalformedAuthenticatorData(String),
    #[error("Invalid environment tag: {0}")]
    InvalidEnvironmentTag(String),
    #[error("Missing credential certificate")]
    MissingCredentialCertificate,
    #[error("Missing intermediate certificate")]
    MissingIntermediateCertificate,
    #[error("Unexpected certificate: expecting 2 in x5c, got {0}")]
    UnexpectedCertificate(usize),
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error("Malformed nonce extension: {0}")]
    MalformedExtension(String),

    #[error("Could not validate certificate chain: {0}")]
    CouldNotValidateCertificate(String),
    #[error("Certificate chain validated through an unexpected path: {0}")]
    FailedValidateCertificate(String),

    #[error("Invalid attestation format: {0}")]
    InvalidFormat(String),
    #[error("Invalid AAGUID: expecting {expected}, got {got}")]
    InvalidAaguid { expected: String, got: String },
    #[error("Invalid counter: {0}")]
    InvalidCounter(String),
    #[error("Invalid key identifier")]
    InvalidKeyId,
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid relying party identifier")]
    InvalidRelyingPartyId,
    #[error("Invalid nonce")]
    InvalidNonce,
    #[error("Missing nonce extension")]
    MissingExtension,

    #[error("Trust anchor error: {0}")]
    TrustAnchor(String),
    #[error("Crypto error: {0}")]
    Crypto(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Credential store error: {0}")]
    Store(String),
    #[error("Unknown credential: {0}")]
    UnknownCredential(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax(_)
            | Error::MissingField(_)
            | Error::DuplicatedField(_)
            | Error::TruncatedInput { .. }
            | Error::MalformedAuthenticatorData(_)
            | Error::InvalidEnvironmentTag(_)
            | Error::MissingCredentialCertificate
            | Error::MissingIntermediateCertificate
            | Error::UnexpectedCertificate(_)
            | Error::InvalidCertificate(_)
            | Error::MalformedExtension(_) => ErrorKind::Malformed,

            Error::CouldNotValidateCertificate(_) | Error::FailedValidateCertificate(_) => {
                ErrorKind::Trust
            }

            Error::InvalidFormat(_)
            | Error::InvalidAaguid { .. }
            | Error::InvalidCounter(_)
            | Error::InvalidKeyId
            | Error::InvalidPublicKey(_)
            | Error::InvalidRelyingPartyId
            | Error::InvalidNonce
            | Error::MissingExtension => ErrorKind::Binding,

            Error::TrustAnchor(_)
            | Error::Crypto(_)
            | Error::Config(_)
            | Error::Store(_)
            | Error::UnknownCredential(_) => ErrorKind::Internal,
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            Error::TruncatedInput {
                field: "counter",
                needed: 37,
                len: 12
            }
            .kind(),
            ErrorKind::Malformed
        );
        assert_eq!(
            Error::FailedValidateCertificate("x".to_string()).kind(),
            ErrorKind::Trust
        );
        assert_eq!(Error::InvalidNonce.kind(), ErrorKind::Binding);
        assert_eq!(Error::MissingExtension.kind(), ErrorKind::Binding);
        assert_eq!(
            Error::MalformedExtension("x".to_string()).kind(),
            ErrorKind::Malformed
        );
        assert_eq!(
            Error::TrustAnchor("x".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn debug_is_display() {
        let e = Error::TruncatedInput {
            field: "rp-id-hash",
            needed: 32,
            len: 3,
        };

        assert_eq!(
            format!("{e:?}"),
            "Truncated input: rp-id-hash needs 32 bytes, got 3"
        );
    }
}
