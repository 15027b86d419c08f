use thiserror::Error;

/// Errors returned by trie construction, lookup and mutation.
///
/// Misses (`NotFound`) are ordinary, recoverable results. `DeleteFromEmptyTable`
/// signals a broken bitmap/slot invariant and should never be observed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HamtError {
    /// No key was supplied.
    #[error("nil key parameter")]
    NilKey,

    /// No value was supplied.
    #[error("nil value parameter")]
    NilValue,

    /// A byte key is too short to supply a full 64-bit hash.
    #[error("key is too short: {len} bytes, need at least {min}")]
    ShortKey {
        /// Length of the rejected key.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// Both fan-out widths were zero, or the interior width was zero.
    #[error("cannot create: zero length tables")]
    ZeroLengthTables,

    /// The interior fan-out does not fit in a 64-bit bitmap.
    #[error("max table size exceeded: w = {w}, limit is {}", crate::trie::MAX_TABLE_BITS)]
    MaxTableSizeExceeded {
        /// Requested interior fan-out.
        w: usize,
    },

    /// The root fan-out is larger than the crate supports.
    #[error("max root table size exceeded: t = {t}, limit is {}", crate::trie::MAX_ROOT_BITS)]
    MaxRootTableSizeExceeded {
        /// Requested root fan-out.
        t: usize,
    },

    /// The key is not present.
    #[error("entry not found")]
    NotFound,

    /// Two distinct keys still collide after every hash bit was consumed.
    #[error("max table depth exceeded: depth {depth}, max {max}")]
    MaxTableDepthExceeded {
        /// Depth of the table that would have been created.
        depth: usize,
        /// Deepest table the trie's shape allows.
        max: usize,
    },

    /// A slot was removed from a table holding no slots.
    #[error("internal error: delete from empty table")]
    DeleteFromEmptyTable,
}
