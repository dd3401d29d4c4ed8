//! Persisted envelope format.
//!
//! An envelope is self-describing: given only its bytes and a key ring,
//! decryption can pick the right key without external hints. Format version
//! and key version are the first decodable fields so future layouts stay
//! backward-compatible.
//!
//! Layout (format version 1):
//! ```text
//! [format_version:1][key_version:4 BE][flags:1]
//! [timestamp:8 BE, present iff flagged][nonce:12]
//! [ciphertext_len:4 BE][ciphertext:N][tag:16]
//! ```
//!
//! A format-version byte of 0 marks a legacy envelope that predates key
//! version tagging; it carries no `key_version` field and resolves to the
//! ring's first configured key.

use crate::error::Error;

/// Current envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Legacy format: no key version field, first configured key implied.
pub const LEGACY_FORMAT_VERSION: u8 = 0;

/// Nonce size for ChaCha20-Poly1305 (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Envelope option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeFlags(u8);

impl EnvelopeFlags {
    /// Creates empty flags.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Checks whether a timestamp field is present.
    #[must_use]
    pub const fn has_timestamp(self) -> bool {
        (self.0 & 0x01) != 0
    }

    /// Sets the timestamp-present flag.
    #[must_use]
    pub const fn with_timestamp(mut self) -> Self {
        self.0 |= 0x01;
        self
    }

    /// Returns the raw flags value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Creates flags from a raw value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        Self(value)
    }
}

/// The persisted ciphertext representation of one sealed value.
///
/// The header fields (format version, flags, key version, timestamp) are
/// bound into the AEAD associated data, so swapping any of them in storage
/// is detected at decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    format_version: u8,
    flags: EnvelopeFlags,
    key_version: Option<u32>,
    timestamp: Option<u64>,
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
    tag: [u8; TAG_SIZE],
}

impl Envelope {
    /// Creates a format-version-1 envelope.
    #[must_use]
    pub fn new(
        key_version: u32,
        nonce: [u8; NONCE_SIZE],
        ciphertext: Vec<u8>,
        tag: [u8; TAG_SIZE],
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            flags: EnvelopeFlags::empty(),
            key_version: Some(key_version),
            timestamp: None,
            nonce,
            ciphertext,
            tag,
        }
    }

    /// Attaches a seal timestamp (unix seconds) to the envelope header.
    ///
    /// The timestamp becomes part of the authenticated data.
    #[must_use]
    pub fn with_timestamp(mut self, unix_seconds: u64) -> Self {
        self.flags = self.flags.with_timestamp();
        self.timestamp = Some(unix_seconds);
        self
    }

    /// Returns the format version.
    #[must_use]
    pub const fn format_version(&self) -> u8 {
        self.format_version
    }

    /// Returns the flags.
    #[must_use]
    pub const fn flags(&self) -> EnvelopeFlags {
        self.flags
    }

    /// Returns the key version, or `None` for legacy envelopes.
    #[must_use]
    pub const fn key_version(&self) -> Option<u32> {
        self.key_version
    }

    /// Returns the seal timestamp, if one was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Returns the nonce.
    #[must_use]
    pub const fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Returns the ciphertext body (tag excluded).
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Returns the authentication tag.
    #[must_use]
    pub const fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }

    /// Associated data for this envelope: the header fields that must not
    /// be swappable without detection.
    #[must_use]
    pub fn aad(&self) -> Vec<u8> {
        build_aad(self.format_version, self.flags, self.key_version, self.timestamp)
    }

    /// Serializes the envelope to its persisted byte form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnvelope`] if the ciphertext exceeds the
    /// 4-byte length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let ciphertext_len = u32::try_from(self.ciphertext.len()).map_err(|_| {
            Error::InvalidEnvelope(format!("ciphertext too long: {} bytes", self.ciphertext.len()))
        })?;

        let mut bytes = Vec::with_capacity(18 + NONCE_SIZE + self.ciphertext.len() + TAG_SIZE);

        bytes.push(self.format_version);
        if let Some(version) = self.key_version {
            bytes.extend_from_slice(&version.to_be_bytes());
        }
        bytes.push(self.flags.as_u8());
        if let Some(timestamp) = self.timestamp {
            bytes.extend_from_slice(&timestamp.to_be_bytes());
        }
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&ciphertext_len.to_be_bytes());
        bytes.extend_from_slice(&self.ciphertext);
        bytes.extend_from_slice(&self.tag);

        Ok(bytes)
    }

    /// Deserializes an envelope from its persisted byte form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for format versions newer than
    /// this build, and [`Error::InvalidEnvelope`] for truncated or
    /// inconsistent data.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(data);

        let format_version = reader.u8("format version")?;
        if format_version > FORMAT_VERSION {
            return Err(Error::UnsupportedFormat {
                version: format_version,
                supported: format!("0-{FORMAT_VERSION}"),
            });
        }

        let key_version = if format_version == LEGACY_FORMAT_VERSION {
            None
        } else {
            Some(u32::from_be_bytes(reader.array("key version")?))
        };

        let flags = EnvelopeFlags::from_u8(reader.u8("flags")?);

        let timestamp = if flags.has_timestamp() {
            Some(u64::from_be_bytes(reader.array("timestamp")?))
        } else {
            None
        };

        let nonce: [u8; NONCE_SIZE] = reader.array("nonce")?;

        let ciphertext_len = u32::from_be_bytes(reader.array("ciphertext length")?) as usize;
        let ciphertext = reader.slice(ciphertext_len, "ciphertext")?.to_vec();

        let tag: [u8; TAG_SIZE] = reader.array("authentication tag")?;

        reader.finish()?;

        Ok(Self { format_version, flags, key_version, timestamp, nonce, ciphertext, tag })
    }
}

/// Builds the associated data for the given header fields.
pub(crate) fn build_aad(
    format_version: u8,
    flags: EnvelopeFlags,
    key_version: Option<u32>,
    timestamp: Option<u64>,
) -> Vec<u8> {
    let mut aad = Vec::with_capacity(14);
    aad.push(format_version);
    if let Some(version) = key_version {
        aad.extend_from_slice(&version.to_be_bytes());
    }
    aad.push(flags.as_u8());
    if let Some(timestamp) = timestamp {
        aad.extend_from_slice(&timestamp.to_be_bytes());
    }
    aad
}

/// Positional reader over persisted envelope bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn u8(&mut self, field: &str) -> Result<u8, Error> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::InvalidEnvelope(format!("missing {field}")))?;
        self.pos += 1;
        Ok(byte)
    }

    fn slice(&mut self, len: usize, field: &str) -> Result<&'a [u8], Error> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| Error::InvalidEnvelope(format!("{field} truncated")))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(N, field)?);
        Ok(out)
    }

    fn finish(&self) -> Result<(), Error> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(Error::InvalidEnvelope(format!(
                "{} trailing bytes after envelope",
                self.data.len() - self.pos
            )))
        }
    }
}
