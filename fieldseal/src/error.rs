//! Error types for fieldseal operations.

/// Main error type for fieldseal operations.
///
/// Each variant maps to a different operator response: a configuration
/// failure means the secret list must be fixed before the process can run,
/// an unknown key version means a retired key must be restored (or the
/// record written off), and an integrity failure means the stored bytes can
/// no longer be trusted. Nothing here is retriable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad or missing secrets at key ring construction
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Envelope references a key version that is not in the ring
    #[error("unknown key version {0}: the referenced key is not in the ring")]
    UnknownKeyVersion(u32),

    /// Envelope format version is newer than this build understands
    #[error("unsupported envelope format {version} (supported: {supported})")]
    UnsupportedFormat {
        /// The format version found in the envelope
        version: u8,
        /// Format versions this build can read
        supported: String,
    },

    /// Authentication tag verification failed (data may be corrupted or tampered)
    #[error("integrity check failed: envelope may be corrupted or tampered with")]
    Integrity,

    /// Canonical byte decoding failed
    #[error("decode error: {0}")]
    Decode(String),

    /// Persisted envelope bytes are malformed (truncated or inconsistent)
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Encryption operation failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Blind index generation failed
    #[error("blind index generation failed: {0}")]
    Index(String),
}
