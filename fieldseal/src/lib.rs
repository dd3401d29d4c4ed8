//! # Fieldseal
//!
//! Field-level encryption for record stores: versioned
//! authenticated-encryption envelopes, transparent key rotation, and blind
//! indexes for equality queries over ciphertext.
//!
//! ## Features
//!
//! - AEAD encryption (ChaCha20-Poly1305) with self-describing envelopes
//! - Key ring with versioned keys: old ciphertext keeps decrypting while
//!   new writes use the newest key
//! - Blind index tokens (truncated HMAC-SHA256) for exact-match lookups
//!   without revealing plaintext
//! - Canonical typed-value codec (text, integer, float, boolean, datetime,
//!   bytes)
//! - Secrets derived with HKDF-SHA256 (high-entropy) or Argon2id
//!   (passphrases)
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldseal::prelude::*;
//!
//! let ring = fieldseal_keyenv::ring_from_default_env()?;
//! let email = FieldEncryptor::new(ValueKind::Text).searchable();
//!
//! let sealed = email.seal(&Value::Text("alice@example.com".into()), &ring)?;
//! // persist sealed.envelope().to_bytes()? and sealed.token()
//! let value = email.open(&sealed, &ring)?;
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod blind_index;
pub mod cipher;
pub mod envelope;
pub mod error;
pub mod field;
pub mod keyring;
pub mod value;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::blind_index::BlindIndexToken;
    pub use crate::envelope::Envelope;
    pub use crate::error::Error;
    pub use crate::field::{FieldEncryptor, SealedField};
    pub use crate::keyring::{KeyRing, Secret};
    pub use crate::value::{Value, ValueKind};
}
