//! AEAD encryption and decryption of canonical bytes.
//!
//! Encryption always uses the ring's current key and a fresh random nonce
//! from the operating system's CSPRNG. Decryption resolves the key by the
//! version recorded in the envelope (never by trying every ring entry)
//! and verifies the authentication tag before any plaintext is released.

use crate::envelope::{self, Envelope, EnvelopeFlags, FORMAT_VERSION, NONCE_SIZE, TAG_SIZE};
use crate::error::Error;
use crate::keyring::{DerivedKey, KeyRing};
use chacha20poly1305::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    ChaCha20Poly1305, Nonce,
};
use secrecy::ExposeSecret;

/// Encrypts canonical plaintext bytes under the ring's current key.
///
/// A fresh 96-bit nonce is drawn from `OsRng` on every call; nonces are
/// never reused under a key and never derived deterministically. The
/// envelope header (format version, flags, key version) is bound as
/// associated data.
///
/// # Errors
///
/// Returns [`Error::Encryption`] if the underlying AEAD operation fails.
pub fn encrypt(plaintext: &[u8], ring: &KeyRing) -> Result<Envelope, Error> {
    let key = ring.current();

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);

    let aad = envelope::build_aad(
        FORMAT_VERSION,
        EnvelopeFlags::empty(),
        Some(key.version()),
        None,
    );

    let sealed = cipher_for(key)?
        .encrypt(
            &Nonce::from(nonce_bytes),
            Payload { msg: plaintext, aad: &aad },
        )
        .map_err(|_| Error::Encryption("AEAD encryption failed".to_string()))?;

    // The AEAD output is ciphertext with the tag appended
    let split = sealed.len() - TAG_SIZE;
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&sealed[split..]);
    let ciphertext = sealed[..split].to_vec();

    Ok(Envelope::new(key.version(), nonce_bytes, ciphertext, tag))
}

/// Decrypts an envelope, returning the canonical plaintext bytes.
///
/// Resolution order:
/// 1. reject format versions newer than this build,
/// 2. resolve the envelope's key version against the ring (legacy
///    envelopes resolve to the first configured key),
/// 3. verify the authentication tag, then decrypt.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`], [`Error::UnknownKeyVersion`], or
/// [`Error::Integrity`]. An integrity failure never exposes partial
/// plaintext.
pub fn decrypt(envelope: &Envelope, ring: &KeyRing) -> Result<Vec<u8>, Error> {
    if envelope.format_version() > FORMAT_VERSION {
        return Err(Error::UnsupportedFormat {
            version: envelope.format_version(),
            supported: format!("0-{FORMAT_VERSION}"),
        });
    }

    let key = match envelope.key_version() {
        Some(version) => ring.resolve(version)?,
        // Legacy envelopes predate version tagging: first configured key
        None => ring.first(),
    };

    let mut sealed = Vec::with_capacity(envelope.ciphertext().len() + TAG_SIZE);
    sealed.extend_from_slice(envelope.ciphertext());
    sealed.extend_from_slice(envelope.tag());

    cipher_for(key)?
        .decrypt(
            &Nonce::from(*envelope.nonce()),
            Payload { msg: &sealed, aad: &envelope.aad() },
        )
        .map_err(|_| Error::Integrity)
}

fn cipher_for(key: &DerivedKey) -> Result<ChaCha20Poly1305, Error> {
    ChaCha20Poly1305::new_from_slice(key.cipher_key().expose_secret())
        .map_err(|e| Error::Encryption(format!("invalid cipher key: {e}")))
}
