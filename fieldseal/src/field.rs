//! Field encryption facade.
//!
//! [`FieldEncryptor`] composes the codec, the cipher engine, and (for
//! searchable fields) the blind indexer. It is the only surface a record
//! store talks to: it hands back an [`Envelope`] to persist as an opaque
//! blob and, for searchable fields, a [`BlindIndexToken`] to persist in an
//! indexable column next to it.

use crate::blind_index::{self, BlindIndexToken};
use crate::cipher;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::keyring::KeyRing;
use crate::value::{Value, ValueKind};
use zeroize::Zeroizing;

/// Everything persisted for one sealed field value.
#[derive(Debug, Clone)]
pub struct SealedField {
    envelope: Envelope,
    token: Option<BlindIndexToken>,
}

impl SealedField {
    /// Reassembles a sealed field from parts read out of the record store.
    #[must_use]
    pub const fn from_parts(envelope: Envelope, token: Option<BlindIndexToken>) -> Self {
        Self { envelope, token }
    }

    /// Returns the envelope to persist as an opaque blob.
    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Returns the blind index token, present iff the field is searchable.
    #[must_use]
    pub const fn token(&self) -> Option<&BlindIndexToken> {
        self.token.as_ref()
    }

    /// Consumes the sealed field, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (Envelope, Option<BlindIndexToken>) {
        (self.envelope, self.token)
    }
}

/// Seals and opens one logical field.
///
/// Construct one per field, typed with the field's [`ValueKind`]; mark it
/// [`searchable`](Self::searchable) to get an equality token alongside the
/// envelope.
///
/// # Example
///
/// ```
/// use fieldseal::field::FieldEncryptor;
/// use fieldseal::keyring::{KeyRing, Secret};
/// use fieldseal::value::{Value, ValueKind};
///
/// let ring = KeyRing::derive(&[Secret::high_entropy(vec![7u8; 32])])?;
/// let email = FieldEncryptor::new(ValueKind::Text).searchable();
///
/// let sealed = email.seal(&Value::Text("alice@example.com".into()), &ring)?;
/// assert!(sealed.token().is_some());
///
/// let opened = email.open(&sealed, &ring)?;
/// assert_eq!(opened, Value::Text("alice@example.com".into()));
/// # Ok::<(), fieldseal::error::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FieldEncryptor {
    kind: ValueKind,
    searchable: bool,
}

impl FieldEncryptor {
    /// Creates an encryptor for a field holding values of `kind`.
    #[must_use]
    pub const fn new(kind: ValueKind) -> Self {
        Self { kind, searchable: false }
    }

    /// Enables equality search: sealing also emits a blind index token.
    #[must_use]
    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Returns the value kind this field holds.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether this field emits blind index tokens.
    #[must_use]
    pub const fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Seals a value: encode, encrypt under the ring's current key, and
    /// (for searchable fields) digest a token under the same key version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the value's kind does not match this
    /// field, or any error from the cipher engine or indexer.
    pub fn seal(&self, value: &Value, ring: &KeyRing) -> Result<SealedField, Error> {
        self.check_kind(value)?;
        // Canonical bytes are plaintext: wipe the buffer once sealed
        let plaintext = Zeroizing::new(value.encode());

        let envelope = cipher::encrypt(&plaintext, ring)?;
        let token = if self.searchable {
            Some(blind_index::digest(&plaintext, ring.current())?)
        } else {
            None
        };

        Ok(SealedField { envelope, token })
    }

    /// Opens a sealed field back into its value.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::UnsupportedFormat`], [`Error::UnknownKeyVersion`],
    /// [`Error::Integrity`], and [`Error::Decode`] unchanged. Every kind
    /// calls for a different operator response, so none is swallowed or
    /// remapped.
    pub fn open(&self, sealed: &SealedField, ring: &KeyRing) -> Result<Value, Error> {
        let plaintext = Zeroizing::new(cipher::decrypt(sealed.envelope(), ring).map_err(|err| {
            if matches!(err, Error::Integrity) {
                // Tampering signal for the operator's logs
                tracing::warn!("integrity failure while opening a sealed field");
            }
            err
        })?);
        Value::decode(&plaintext, self.kind)
    }

    /// Computes the equality-lookup tokens for a queried value, one per
    /// ring version, newest first.
    ///
    /// During a rotation, records not yet reindexed only carry tokens for
    /// older versions; querying with the full set keeps those records
    /// findable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] on a kind mismatch or [`Error::Index`] if
    /// digesting fails.
    pub fn lookup_tokens(&self, value: &Value, ring: &KeyRing) -> Result<Vec<BlindIndexToken>, Error> {
        self.check_kind(value)?;
        let plaintext = Zeroizing::new(value.encode());
        blind_index::digest_all(&plaintext, ring)
    }

    fn check_kind(&self, value: &Value) -> Result<(), Error> {
        if value.kind() == self.kind {
            Ok(())
        } else {
            Err(Error::Decode(format!(
                "field holds {} values, got {}",
                self.kind.name(),
                value.kind().name()
            )))
        }
    }
}
