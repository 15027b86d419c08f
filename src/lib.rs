#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bits;

/// The error type shared by every trie operation.
pub mod error;

/// A `HashMap`-style adapter over the trie.
///
/// This module provides a `HamtMap` that hashes arbitrary `Hash + Eq` keys
/// with a configurable hasher builder and stores them in a [`Trie`](crate::Trie).
pub mod hash_map;

/// Keys the trie can index, and a byte-string key hashed by its prefix.
pub mod key;

/// Key/value pairs stored at the edges of the trie.
pub mod leaf;

mod root;
mod table;

pub mod trie;

pub use error::HamtError;
#[cfg(any(feature = "foldhash", feature = "std"))]
pub use hash_map::DefaultHashBuilder;
pub use hash_map::HamtMap;
pub use key::BytesKey;
pub use key::HashableKey;
pub use key::MIN_KEY_LEN;
pub use leaf::Leaf;
pub use trie::Iter;
pub use trie::Shape;
pub use trie::Trie;
#[cfg(feature = "stats")]
pub use trie::TrieStats;
