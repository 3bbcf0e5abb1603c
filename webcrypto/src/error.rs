use thiserror::Error;

use crate::types::{AlgorithmName, KeyFormat, KeyType, KeyUsage};

/**
    Broad classification of a [`CryptoError`].

    Parameter and usage errors are specific so callers can fix their input.
    Failures of verification or decryption on untrusted input are never
    reported with more detail than [`CryptoError::DecryptionFailed`].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parameter,
    Usage,
    Data,
    Operation,
    NotSupported,
}

/**
    Errors returned by providers, the registry and the async context.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    // ── Algorithm parameters ─────────────────────────────────────────
    #[error("{0}: missing required property")]
    MissingProperty(&'static str),
    #[error("{property}: {reason}")]
    InvalidParameter {
        property: &'static str,
        reason: String,
    },
    #[error("usages cannot be empty when creating a key")]
    EmptyUsages,
    #[error("key usage '{0}' is not supported by {1}")]
    InvalidUsage(KeyUsage, AlgorithmName),
    #[error("data too long: {len} bytes, max {max}")]
    DataTooLong { len: usize, max: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Key checks ───────────────────────────────────────────────────
    #[error("key does not allow the '{0}' usage")]
    UsageNotPermitted(KeyUsage),
    #[error("key algorithm is {actual}, expected {expected}")]
    AlgorithmMismatch {
        expected: AlgorithmName,
        actual: AlgorithmName,
    },
    #[error("key type is {actual}, expected {expected}")]
    KeyTypeMismatch { expected: KeyType, actual: KeyType },
    #[error("key is not extractable")]
    NotExtractable,

    // ── Key data / encodings ─────────────────────────────────────────
    #[error("invalid key data: {0}")]
    InvalidKeyData(String),
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    // ── Cryptographic operations ─────────────────────────────────────
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("{0} failed: {1}")]
    Operation(&'static str, String),
    #[error("worker task failed: {0}")]
    Worker(String),

    // ── Support ──────────────────────────────────────────────────────
    #[error("unrecognized algorithm name '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("{algorithm} does not support the '{format}' key format")]
    UnsupportedFormat {
        algorithm: AlgorithmName,
        format: KeyFormat,
    },
    #[error("{algorithm} does not support {operation}")]
    NotSupported {
        algorithm: AlgorithmName,
        operation: &'static str,
    },
}

impl CryptoError {
    pub(crate) fn invalid_parameter(property: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            property,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_key_data(reason: impl ToString) -> Self {
        Self::InvalidKeyData(reason.to_string())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingProperty(_)
            | Self::InvalidParameter { .. }
            | Self::EmptyUsages
            | Self::InvalidUsage(..)
            | Self::DataTooLong { .. }
            | Self::InvalidConfig(_) => ErrorKind::Parameter,
            Self::UsageNotPermitted(_)
            | Self::AlgorithmMismatch { .. }
            | Self::KeyTypeMismatch { .. }
            | Self::NotExtractable => ErrorKind::Usage,
            Self::InvalidKeyData(_) | Self::InvalidSignature(_) => ErrorKind::Data,
            Self::DecryptionFailed | Self::Operation(..) | Self::Worker(_) => ErrorKind::Operation,
            Self::UnsupportedAlgorithm(_)
            | Self::UnsupportedFormat { .. }
            | Self::NotSupported { .. } => ErrorKind::NotSupported,
        }
    }
}

/**
    Type alias for results that may return a [`CryptoError`].
*/
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}
