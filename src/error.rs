//! Error types for paper vault.

use thiserror::Error;

/// Result type alias for paper vault operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating or recovering records.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input: bad share counts, empty secret, oversized label.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A secret does not fit in what remains of the record.
    #[error("Secret {secret} does not fit: need {needed} units, have {available} units")]
    CapacityExceeded {
        secret: usize,
        needed: usize,
        available: usize,
    },

    /// No layer of the record opens with this passphrase, under either scheme.
    #[error("Decryption failed: wrong passphrase or corrupted record")]
    CipherMismatch,

    /// Accumulated shares do not reconstruct a valid secret.
    #[error("Shares did not combine to a valid secret: {0}")]
    ReconstructionFailed(String),

    /// Scanned text is not a record.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Key derivation error.
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shares were insufficient or inconsistent; keep scanning with the same passphrase.
    pub fn is_reconstruction(&self) -> bool {
        matches!(self, Error::ReconstructionFailed(_))
    }

    /// The passphrase did not open the record; ask for it again.
    pub fn is_cipher_mismatch(&self) -> bool {
        matches!(self, Error::CipherMismatch)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
