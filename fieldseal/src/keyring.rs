//! Secrets, derived keys, and the versioned key ring.
//!
//! A [`KeyRing`] is built once at configuration-load time from an ordered
//! list of secrets (oldest first, newest last) and is immutable afterwards.
//! Rotation means deriving a new ring with an extra secret appended and
//! swapping the handle the application holds; rings in use are never
//! mutated.

use crate::error::Error;
use argon2::Argon2;
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString, SecretVec};
use sha2::Sha256;

/// Length of derived key material in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Derivation labels. One per purpose, so a blind-index key leak does not
/// expose the cipher key and vice versa.
const ENCRYPTION_LABEL: &[u8] = b"fieldseal.encryption";
const INDEX_LABEL: &[u8] = b"fieldseal.blind-index";

/// HKDF info parameter, fixed per format generation.
const HKDF_INFO: &[u8] = b"fieldseal.v1";

/// Argon2id parameters for passphrase-derived secrets.
///
/// 64 MiB and 3 passes make brute-forcing a low-entropy secret expensive;
/// derivation happens once per process start, not per operation.
const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;

/// Input secret material for key derivation. Never persisted.
pub enum Secret {
    /// Already-uniform key material, at least [`KEY_SIZE`] bytes.
    /// Derived with HKDF-SHA256 (fast).
    HighEntropy(SecretVec<u8>),

    /// Human-chosen passphrase. Derived with Argon2id (deliberately slow).
    Passphrase(SecretString),
}

impl Secret {
    /// Wraps raw high-entropy bytes as a secret.
    #[must_use]
    pub fn high_entropy(bytes: Vec<u8>) -> Self {
        Self::HighEntropy(SecretVec::new(bytes))
    }

    /// Wraps a passphrase as a secret.
    #[must_use]
    pub fn passphrase(passphrase: impl Into<String>) -> Self {
        Self::Passphrase(SecretString::new(passphrase.into()))
    }
}

/// One version's worth of derived key material.
///
/// Identified by `version`, the secret's position in the configured list.
/// Key bytes are zeroized on drop and redacted from `Debug` output.
pub struct DerivedKey {
    version: u32,
    cipher_key: SecretVec<u8>,
    index_key: SecretVec<u8>,
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("version", &self.version)
            .field("cipher_key", &"[REDACTED]")
            .field("index_key", &"[REDACTED]")
            .finish()
    }
}

impl DerivedKey {
    /// Returns this key's version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the encryption key material.
    #[must_use]
    pub fn cipher_key(&self) -> &SecretVec<u8> {
        &self.cipher_key
    }

    /// Returns the blind-index key material.
    #[must_use]
    pub fn index_key(&self) -> &SecretVec<u8> {
        &self.index_key
    }
}

/// Ordered set of derived keys.
///
/// The last entry is the current (encryption) key; every entry is a
/// decryption candidate, resolved by the version recorded in each
/// envelope. Versions are strictly increasing configuration indexes.
///
/// Safe for unrestricted concurrent use once constructed: all reads, no
/// locks.
///
/// # Example
///
/// ```
/// use fieldseal::keyring::{KeyRing, Secret};
///
/// let ring = KeyRing::derive(&[Secret::high_entropy(vec![7u8; 32])])?;
/// assert_eq!(ring.current().version(), 0);
/// # Ok::<(), fieldseal::error::Error>(())
/// ```
pub struct KeyRing {
    keys: Vec<DerivedKey>,
}

impl KeyRing {
    /// Derives a key ring from an ordered secret list, oldest first.
    ///
    /// Each secret yields one [`DerivedKey`] via two independent
    /// derivations (encryption and blind-index labels). The secret's list
    /// position becomes its version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the list is empty, a
    /// high-entropy secret is shorter than [`KEY_SIZE`], a passphrase is
    /// empty, or any derivation fails.
    pub fn derive(secrets: &[Secret]) -> Result<Self, Error> {
        if secrets.is_empty() {
            return Err(Error::Configuration(
                "at least one secret is required".to_string(),
            ));
        }

        let mut keys = Vec::with_capacity(secrets.len());
        for (position, secret) in secrets.iter().enumerate() {
            let version = u32::try_from(position).map_err(|_| {
                Error::Configuration(format!("too many secrets configured: {}", secrets.len()))
            })?;
            keys.push(DerivedKey {
                version,
                cipher_key: derive_material(secret, ENCRYPTION_LABEL)?,
                index_key: derive_material(secret, INDEX_LABEL)?,
            });
        }

        tracing::debug!(
            key_count = keys.len(),
            current_version = keys.len() - 1,
            "key ring derived"
        );

        Ok(Self { keys })
    }

    /// Returns the current (encryption) key: the last-configured entry.
    #[must_use]
    pub fn current(&self) -> &DerivedKey {
        // derive() guarantees a non-empty ring
        &self.keys[self.keys.len() - 1]
    }

    /// Returns the oldest key, used to resolve legacy envelopes that
    /// predate version tagging.
    #[must_use]
    pub fn first(&self) -> &DerivedKey {
        &self.keys[0]
    }

    /// Resolves a key by the version recorded in an envelope.
    ///
    /// Versions are configuration indexes, so resolution is a positional
    /// lookup, never a trial-decryption search.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKeyVersion`] if the version is not in the
    /// ring. This is the designed failure mode after a key has been
    /// irrevocably destroyed: the plaintext is unrecoverable.
    pub fn resolve(&self, version: u32) -> Result<&DerivedKey, Error> {
        self.keys
            .get(version as usize)
            .ok_or(Error::UnknownKeyVersion(version))
    }

    /// Iterates over every key, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &DerivedKey> {
        self.keys.iter()
    }

    /// Number of keys in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: rings hold at least one key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn derive_material(secret: &Secret, label: &[u8]) -> Result<SecretVec<u8>, Error> {
    let mut okm = vec![0u8; KEY_SIZE];

    match secret {
        Secret::HighEntropy(ikm) => {
            if ikm.expose_secret().len() < KEY_SIZE {
                return Err(Error::Configuration(format!(
                    "high-entropy secret must be at least {KEY_SIZE} bytes, got {}",
                    ikm.expose_secret().len()
                )));
            }
            // Label as salt, fixed info: purpose separation lives in the salt
            let hkdf = Hkdf::<Sha256>::new(Some(label), ikm.expose_secret());
            hkdf.expand(HKDF_INFO, &mut okm)
                .map_err(|_| Error::Configuration("HKDF expansion failed".to_string()))?;
        }
        Secret::Passphrase(passphrase) => {
            if passphrase.expose_secret().is_empty() {
                return Err(Error::Configuration("passphrase must not be empty".to_string()));
            }
            let params = argon2::Params::new(
                ARGON2_MEMORY_KIB,
                ARGON2_ITERATIONS,
                ARGON2_PARALLELISM,
                Some(KEY_SIZE),
            )
            .map_err(|e| Error::Configuration(format!("invalid Argon2 parameters: {e}")))?;
            let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

            // Label doubles as the salt: derivation must be reproducible
            // across restarts from the secret alone
            argon2
                .hash_password_into(passphrase.expose_secret().as_bytes(), label, &mut okm)
                .map_err(|e| Error::Configuration(format!("passphrase derivation failed: {e}")))?;
        }
    }

    Ok(SecretVec::new(okm))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret(byte: u8) -> Secret {
        Secret::high_entropy(vec![byte; KEY_SIZE])
    }

    #[test]
    fn test_empty_secret_list_fails() {
        let result = KeyRing::derive(&[]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_short_high_entropy_secret_fails() {
        let result = KeyRing::derive(&[Secret::high_entropy(vec![1u8; 16])]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_empty_passphrase_fails() {
        let result = KeyRing::derive(&[Secret::passphrase("")]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_versions_follow_configuration_order() {
        let ring = KeyRing::derive(&[test_secret(1), test_secret(2), test_secret(3)]).unwrap();

        let versions: Vec<u32> = ring.keys().map(DerivedKey::version).collect();
        assert_eq!(versions, vec![0, 1, 2]);
        assert_eq!(ring.current().version(), 2);
        assert_eq!(ring.first().version(), 0);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_resolve_known_and_unknown_versions() {
        let ring = KeyRing::derive(&[test_secret(1), test_secret(2)]).unwrap();

        assert_eq!(ring.resolve(0).unwrap().version(), 0);
        assert_eq!(ring.resolve(1).unwrap().version(), 1);
        assert!(matches!(ring.resolve(2), Err(Error::UnknownKeyVersion(2))));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let ring1 = KeyRing::derive(&[test_secret(7)]).unwrap();
        let ring2 = KeyRing::derive(&[test_secret(7)]).unwrap();

        assert_eq!(
            ring1.current().cipher_key().expose_secret(),
            ring2.current().cipher_key().expose_secret()
        );
        assert_eq!(
            ring1.current().index_key().expose_secret(),
            ring2.current().index_key().expose_secret()
        );
    }

    #[test]
    fn test_cipher_and_index_keys_are_independent() {
        let ring = KeyRing::derive(&[test_secret(7)]).unwrap();
        let key = ring.current();

        assert_ne!(
            key.cipher_key().expose_secret(),
            key.index_key().expose_secret()
        );
    }

    #[test]
    fn test_different_secrets_different_keys() {
        let ring1 = KeyRing::derive(&[test_secret(1)]).unwrap();
        let ring2 = KeyRing::derive(&[test_secret(2)]).unwrap();

        assert_ne!(
            ring1.current().cipher_key().expose_secret(),
            ring2.current().cipher_key().expose_secret()
        );
    }

    #[test]
    fn test_passphrase_derivation_deterministic() {
        let ring1 = KeyRing::derive(&[Secret::passphrase("correct horse battery staple")]).unwrap();
        let ring2 = KeyRing::derive(&[Secret::passphrase("correct horse battery staple")]).unwrap();

        assert_eq!(
            ring1.current().cipher_key().expose_secret(),
            ring2.current().cipher_key().expose_secret()
        );
    }

    #[test]
    fn test_key_material_length() {
        let ring = KeyRing::derive(&[test_secret(9)]).unwrap();
        assert_eq!(ring.current().cipher_key().expose_secret().len(), KEY_SIZE);
        assert_eq!(ring.current().index_key().expose_secret().len(), KEY_SIZE);
    }

    #[test]
    fn test_rotation_preserves_old_key_material() {
        let ring1 = KeyRing::derive(&[test_secret(1)]).unwrap();
        let ring2 = KeyRing::derive(&[test_secret(1), test_secret(2)]).unwrap();

        // Appending a secret must not change the keys derived for earlier
        // versions, or old envelopes would become unreadable
        assert_eq!(
            ring1.resolve(0).unwrap().cipher_key().expose_secret(),
            ring2.resolve(0).unwrap().cipher_key().expose_secret()
        );
        assert_eq!(ring2.current().version(), 1);
    }

    #[test]
    fn test_debug_output_redacts_key_material() {
        let ring = KeyRing::derive(&[test_secret(0x5A)]).unwrap();
        let debug = format!("{:?}", ring.current());
        assert!(debug.contains("REDACTED"));
    }
}
