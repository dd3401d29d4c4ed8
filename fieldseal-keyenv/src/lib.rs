//! Environment-based secret source for fieldseal.
//!
//! Reads an ordered secret list from an environment variable and derives a
//! [`KeyRing`] from it. Suitable for deployments where secrets arrive via
//! the process environment (container orchestrators, systemd credentials,
//! dotenv in development).
//!
//! The variable holds comma-separated entries, oldest first, newest
//! (current) last. Each entry is either `base64:<data>` for high-entropy
//! key material or a bare string treated as a passphrase:
//!
//! ```text
//! FIELDSEAL_KEYS="base64:8kM...,base64:Qx1..."
//! ```
//!
//! Rotation is an environment change plus a process restart: append the
//! new entry at the end and redeploy.

#![warn(clippy::pedantic, clippy::nursery)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use fieldseal::error::Error;
use fieldseal::keyring::{KeyRing, Secret};

/// Default environment variable holding the ordered secret list.
pub const DEFAULT_KEYS_VAR: &str = "FIELDSEAL_KEYS";

/// Entry prefix marking base64-encoded high-entropy key material.
const BASE64_PREFIX: &str = "base64:";

/// Derives a key ring from the secret list in the given variable.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the variable is unset or empty, an
/// entry is malformed, or ring derivation fails.
pub fn ring_from_env(var: &str) -> Result<KeyRing, Error> {
    let raw = std::env::var(var)
        .map_err(|_| Error::Configuration(format!("environment variable {var} is not set")))?;
    KeyRing::derive(&parse_secrets(&raw)?)
}

/// Derives a key ring from [`DEFAULT_KEYS_VAR`].
///
/// # Errors
///
/// Same as [`ring_from_env`].
pub fn ring_from_default_env() -> Result<KeyRing, Error> {
    ring_from_env(DEFAULT_KEYS_VAR)
}

/// Parses a comma-separated secret list, oldest first.
///
/// # Errors
///
/// Returns [`Error::Configuration`] on empty entries or invalid base64.
pub fn parse_secrets(raw: &str) -> Result<Vec<Secret>, Error> {
    let mut secrets = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(Error::Configuration(
                "secret list contains an empty entry".to_string(),
            ));
        }
        if let Some(encoded) = entry.strip_prefix(BASE64_PREFIX) {
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| Error::Configuration(format!("invalid base64 secret entry: {e}")))?;
            secrets.push(Secret::high_entropy(bytes));
        } else {
            secrets.push(Secret::passphrase(entry));
        }
    }
    Ok(secrets)
}

/// Generates a fresh 32-byte high-entropy secret, formatted as a
/// `base64:` entry ready to append to the secret list.
#[must_use]
pub fn generate_secret_entry() -> String {
    use rand::rngs::OsRng;
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("{BASE64_PREFIX}{}", STANDARD.encode(bytes))
}
