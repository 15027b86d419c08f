use alloc::vec::Vec;

use crate::error::HamtError;

/// Minimum length of a [`BytesKey`]: enough bytes for a 64-bit hash.
pub const MIN_KEY_LEN: usize = 8;

/// A key the trie can index.
///
/// The trie consumes [`hash_code`](HashableKey::hash_code) a few bits per level,
/// so it must be well distributed: keys that agree on every hash bit can never
/// be separated and are rejected on insert. Equality is only ever checked
/// between keys of the same concrete type.
pub trait HashableKey {
    /// The 64-bit hash this key is filed under.
    fn hash_code(&self) -> u64;

    /// Returns `true` if `self` and `other` are the same key.
    fn key_eq(&self, other: &Self) -> bool;
}

/// A byte-sequence key hashed by its leading eight bytes.
///
/// The hash is the little-endian value of the first [`MIN_KEY_LEN`] bytes.
/// Bytes past the eighth take part in equality but not in hashing, so keys
/// sharing a prefix of eight bytes cannot coexist in a trie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BytesKey {
    bytes: Vec<u8>,
    hash: u64,
}

impl BytesKey {
    /// Wraps `bytes` as a key.
    ///
    /// # Errors
    ///
    /// [`HamtError::NilKey`] for an empty sequence and [`HamtError::ShortKey`]
    /// for one shorter than [`MIN_KEY_LEN`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_trie::BytesKey;
    /// use hamt_trie::HamtError;
    /// use hamt_trie::HashableKey;
    ///
    /// let key = BytesKey::new([1, 0, 0, 0, 0, 0, 0, 0, 0xff]).unwrap();
    /// assert_eq!(key.hash_code(), 1);
    ///
    /// assert_eq!(
    ///     BytesKey::new([1, 2, 3]).unwrap_err(),
    ///     HamtError::ShortKey { len: 3, min: 8 }
    /// );
    /// ```
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, HamtError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(HamtError::NilKey);
        }
        if bytes.len() < MIN_KEY_LEN {
            return Err(HamtError::ShortKey {
                len: bytes.len(),
                min: MIN_KEY_LEN,
            });
        }

        let mut head = [0u8; MIN_KEY_LEN];
        head.copy_from_slice(&bytes[..MIN_KEY_LEN]);
        Ok(Self {
            hash: u64::from_le_bytes(head),
            bytes,
        })
    }

    /// The key's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the key, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl HashableKey for BytesKey {
    #[inline]
    fn hash_code(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl AsRef<[u8]> for BytesKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for BytesKey {
    type Error = HamtError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<Vec<u8>> for BytesKey {
    type Error = HamtError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl core::fmt::Debug for BytesKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BytesKey")
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("len", &self.bytes.len())
            .finish()
    }
}
