use core::mem;

use crate::error::HamtError;
use crate::key::HashableKey;

/// A key/value pair: the terminal node of the trie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf<K, V> {
    key: K,
    value: V,
}

impl<K, V> Leaf<K, V> {
    /// Pairs `key` with `value`.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// Builds a leaf from parts that may be missing.
    ///
    /// # Errors
    ///
    /// [`HamtError::NilKey`] when `key` is `None`, otherwise
    /// [`HamtError::NilValue`] when `value` is `None`.
    pub fn from_parts(key: Option<K>, value: Option<V>) -> Result<Self, HamtError> {
        match (key, value) {
            (None, _) => Err(HamtError::NilKey),
            (Some(_), None) => Err(HamtError::NilValue),
            (Some(key), Some(value)) => Ok(Self { key, value }),
        }
    }

    /// The leaf's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The leaf's value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Mutable access to the leaf's value.
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Stores `value`, returning the one it replaced.
    pub fn replace_value(&mut self, value: V) -> V {
        mem::replace(&mut self.value, value)
    }

    /// Splits the leaf back into its key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    pub(crate) fn into_value(self) -> V {
        self.value
    }
}

impl<K: HashableKey, V> Leaf<K, V> {
    /// Hash of the leaf's key.
    #[inline]
    pub fn hash_code(&self) -> u64 {
        self.key.hash_code()
    }
}
