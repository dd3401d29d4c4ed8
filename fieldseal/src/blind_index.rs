//! Blind index tokens for equality queries over ciphertext.
//!
//! A token is the truncated HMAC-SHA256 of a value's canonical bytes under
//! one key version's index key. Equal values under the same version always
//! produce byte-identical tokens, so a record store can answer
//! `field = ?` by comparing stored tokens. Equality is all it answers:
//! the digest carries no order information, so range queries cannot be
//! built on it.
//!
//! Across a rotation, tokens for old versions stay valid until records are
//! reindexed; [`digest_all`] produces the full per-version token set.

use crate::error::Error;
use crate::keyring::{DerivedKey, KeyRing};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Token digest length in bytes.
///
/// 16 bytes keeps index columns compact while holding the birthday-bound
/// collision probability under 2^-64 for a billion indexed values.
pub const TOKEN_SIZE: usize = 16;

/// Equality-searchable surrogate for one plaintext under one key epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlindIndexToken {
    key_version: u32,
    digest: [u8; TOKEN_SIZE],
}

impl BlindIndexToken {
    /// Returns the key version this token was derived under.
    #[must_use]
    pub const fn key_version(&self) -> u32 {
        self.key_version
    }

    /// Returns the digest bytes.
    #[must_use]
    pub const fn digest(&self) -> &[u8; TOKEN_SIZE] {
        &self.digest
    }
}

impl fmt::Display for BlindIndexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}:", self.key_version)?;
        for byte in &self.digest {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Computes the blind index token for canonical plaintext bytes under one
/// derived key.
///
/// Deterministic: the same bytes under the same key version always yield
/// the same token.
///
/// # Errors
///
/// Returns [`Error::Index`] if the MAC cannot be initialized.
pub fn digest(plaintext: &[u8], key: &DerivedKey) -> Result<BlindIndexToken, Error> {
    let mut mac = HmacSha256::new_from_slice(key.index_key().expose_secret())
        .map_err(|e| Error::Index(format!("invalid index key: {e}")))?;
    mac.update(plaintext);

    let full = mac.finalize().into_bytes();
    let mut digest = [0u8; TOKEN_SIZE];
    digest.copy_from_slice(&full[..TOKEN_SIZE]);

    Ok(BlindIndexToken { key_version: key.version(), digest })
}

/// Computes tokens for every key version in the ring, newest first.
///
/// Store (or query with) all of them while a rotation is in flight:
/// records not yet reindexed only carry tokens for older versions, and a
/// lookup must still find them. Retiring a version's tokens once
/// reindexing is confirmed complete is an operational procedure, not an
/// engine concern.
///
/// # Errors
///
/// Returns [`Error::Index`] if any digest fails.
pub fn digest_all(plaintext: &[u8], ring: &KeyRing) -> Result<Vec<BlindIndexToken>, Error> {
    let mut tokens = Vec::with_capacity(ring.len());
    for key in ring.keys() {
        tokens.push(digest(plaintext, key)?);
    }
    tokens.reverse();
    Ok(tokens)
}
