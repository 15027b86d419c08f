//! The trie facade and its shape configuration.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;

use crate::bits::level_mask;
use crate::error::HamtError;
use crate::key::HashableKey;
use crate::leaf::Leaf;
use crate::root::Root;
use crate::table::Node;

/// Width of the hash consumed by the trie.
pub const HASH_BITS: usize = 64;

/// Largest interior fan-out: a `u64` bitmap addresses at most `2^6` slots.
pub const MAX_TABLE_BITS: usize = 6;

/// Largest root fan-out. The root is a flat array of `2^t` slots.
pub const MAX_ROOT_BITS: usize = 16;

/// Validated fan-out widths of a trie.
///
/// `w` hash bits select a slot in each interior table; the root consumes the
/// first `t` bits. Tables exist at depths `1..=max_depth()`, where
/// `max_depth = ceil((64 - t) / w)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    w: usize,
    t: usize,
    max_depth: usize,
}

impl Shape {
    /// Validates `w` and `t`. A `t` of zero means "same as `w`".
    ///
    /// # Errors
    ///
    /// - [`HamtError::ZeroLengthTables`] if `w` is zero.
    /// - [`HamtError::MaxTableSizeExceeded`] if `w` exceeds [`MAX_TABLE_BITS`].
    /// - [`HamtError::MaxRootTableSizeExceeded`] if `t` exceeds
    ///   [`MAX_ROOT_BITS`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hamt_trie::HamtError;
    /// use hamt_trie::Shape;
    ///
    /// let shape = Shape::new(5, 0).unwrap();
    /// assert_eq!(shape.t(), 5);
    /// assert_eq!(shape.max_depth(), 12);
    ///
    /// assert_eq!(Shape::new(0, 0), Err(HamtError::ZeroLengthTables));
    /// ```
    pub fn new(w: usize, t: usize) -> Result<Self, HamtError> {
        if w == 0 {
            return Err(HamtError::ZeroLengthTables);
        }
        if w > MAX_TABLE_BITS {
            return Err(HamtError::MaxTableSizeExceeded { w });
        }
        let t = if t == 0 { w } else { t };
        if t > MAX_ROOT_BITS {
            return Err(HamtError::MaxRootTableSizeExceeded { t });
        }

        Ok(Self {
            w,
            t,
            max_depth: (HASH_BITS - t).div_ceil(w),
        })
    }

    /// Hash bits consumed by each interior table.
    pub fn w(&self) -> usize {
        self.w
    }

    /// Hash bits consumed by the root.
    pub fn t(&self) -> usize {
        self.t
    }

    /// Depth of the deepest table the hash width allows.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn root_slot_count(&self) -> usize {
        1 << self.t
    }

    pub(crate) fn root_mask(&self) -> u64 {
        level_mask(self.t)
    }

    pub(crate) fn table_mask(&self) -> u64 {
        level_mask(self.w)
    }

    /// Bits consumed by the table at `depth` itself.
    pub(crate) fn width_at(&self, depth: usize) -> usize {
        if depth == 0 { self.t } else { self.w }
    }

    /// Bits consumed above the table at `depth`.
    pub(crate) fn shift(&self, depth: usize) -> usize {
        debug_assert!(depth <= self.max_depth);
        if depth == 0 {
            0
        } else {
            self.t + (depth - 1) * self.w
        }
    }
}

impl Default for Shape {
    /// `w = t = 5`.
    fn default() -> Self {
        Self {
            w: 5,
            t: 5,
            max_depth: (HASH_BITS - 5).div_ceil(5),
        }
    }
}

/// A hash array mapped trie keyed by [`HashableKey`].
///
/// The root table has `2^t` slots; every interior table has up to `2^w`,
/// stored compacted behind a 64-bit bitmap. Each level consumes the next
/// chunk of the key's hash, low bits first. Two distinct keys land in separate
/// leaves as soon as their hashes differ in some chunk; keys whose hashes are
/// identical cannot both be stored.
///
/// Emptied interior tables are not pruned on delete.
///
/// # Examples
///
/// ```rust
/// use hamt_trie::BytesKey;
/// use hamt_trie::HamtError;
/// use hamt_trie::Trie;
///
/// let mut trie = Trie::new(5, 0).unwrap();
/// let key = BytesKey::new(*b"key-0001").unwrap();
///
/// assert_eq!(trie.insert(key.clone(), "a"), Ok(None));
/// assert_eq!(trie.insert(key.clone(), "b"), Ok(Some("a")));
/// assert_eq!(trie.find(&key), Ok(&"b"));
/// assert_eq!(trie.leaf_count(), 1);
///
/// assert_eq!(trie.delete(&key), Ok("b"));
/// assert_eq!(trie.find(&key), Err(HamtError::NotFound));
/// ```
#[derive(Clone)]
pub struct Trie<K, V> {
    shape: Shape,
    root: Root<K, V>,
    len: usize,
}

impl<K, V> Debug for Trie<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trie")
            .field("shape", &self.shape)
            .field("len", &self.len)
            .field("root", &self.root)
            .finish()
    }
}

impl<K, V> Default for Trie<K, V> {
    fn default() -> Self {
        Self::with_shape(Shape::default())
    }
}

impl<K, V> Trie<K, V> {
    /// Creates an empty trie with interior fan-out `w` and root fan-out `t`.
    ///
    /// See [`Shape::new`] for validation.
    pub fn new(w: usize, t: usize) -> Result<Self, HamtError> {
        Ok(Self::with_shape(Shape::new(w, t)?))
    }

    /// Creates an empty trie with an already validated shape.
    pub fn with_shape(shape: Shape) -> Self {
        Self {
            root: Root::new(&shape),
            shape,
            len: 0,
        }
    }

    /// The trie's shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Interior fan-out.
    pub fn w(&self) -> usize {
        self.shape.w()
    }

    /// Root fan-out.
    pub fn t(&self) -> usize {
        self.shape.t()
    }

    /// Deepest table depth the shape allows.
    pub fn max_depth(&self) -> usize {
        self.shape.max_depth()
    }

    /// Number of stored keys, tracked on every insert and delete.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the trie stores no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts leaves by walking the whole trie.
    ///
    /// Always equals [`len`](Self::len); meant for diagnostics and tests.
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Counts tables, the root included, by walking the whole trie.
    pub fn table_count(&self) -> usize {
        self.root.table_count()
    }

    /// Removes every entry, keeping the root's allocation.
    pub fn clear(&mut self) {
        self.root.clear();
        self.len = 0;
    }

    /// Iterates over all entries in hash order, low bits first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            root: self.root.slots().iter(),
            stack: Vec::new(),
            remaining: self.len,
        }
    }
}

impl<K: HashableKey, V> Trie<K, V> {
    /// Inserts `value` under `key`.
    ///
    /// Returns the previous value if `key` was already present; it is replaced
    /// and the leaf count does not change.
    ///
    /// # Errors
    ///
    /// [`HamtError::MaxTableDepthExceeded`] if a different key with an
    /// identical hash is already stored. The trie is left unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, HamtError> {
        let hc = key.hash_code();
        self.insert_hashed(hc, Leaf::new(key, value))
    }

    /// Like [`insert`](Self::insert), for callers holding possibly missing
    /// parts.
    ///
    /// # Errors
    ///
    /// [`HamtError::NilKey`] or [`HamtError::NilValue`] for a missing part, or
    /// any error from [`insert`](Self::insert).
    pub fn insert_parts(&mut self, key: Option<K>, value: Option<V>) -> Result<Option<V>, HamtError> {
        let leaf = Leaf::from_parts(key, value)?;
        self.insert_hashed(leaf.hash_code(), leaf)
    }

    /// Looks up the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`HamtError::NotFound`] if `key` is absent.
    pub fn find(&self, key: &K) -> Result<&V, HamtError> {
        self.find_hashed(key.hash_code(), &|k: &K| k.key_eq(key))
    }

    /// Mutable lookup of the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`HamtError::NotFound`] if `key` is absent.
    pub fn find_mut(&mut self, key: &K) -> Result<&mut V, HamtError> {
        self.find_mut_hashed(key.hash_code(), &|k: &K| k.key_eq(key))
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_ok()
    }

    /// Removes `key`, returning its value.
    ///
    /// # Errors
    ///
    /// [`HamtError::NotFound`] if `key` is absent; the trie is unchanged.
    pub fn delete(&mut self, key: &K) -> Result<V, HamtError> {
        self.delete_hashed(key.hash_code(), &|k: &K| k.key_eq(key))
    }

    pub(crate) fn insert_hashed(&mut self, hc: u64, leaf: Leaf<K, V>) -> Result<Option<V>, HamtError> {
        let previous = self.root.insert(hc, leaf, &self.shape)?;
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    pub(crate) fn find_hashed(&self, hc: u64, eq: &impl Fn(&K) -> bool) -> Result<&V, HamtError> {
        self.root.find(hc, eq, &self.shape)
    }

    pub(crate) fn find_mut_hashed(
        &mut self,
        hc: u64,
        eq: &impl Fn(&K) -> bool,
    ) -> Result<&mut V, HamtError> {
        self.root.find_mut(hc, eq, &self.shape)
    }

    pub(crate) fn delete_hashed(&mut self, hc: u64, eq: &impl Fn(&K) -> bool) -> Result<V, HamtError> {
        let value = self.root.delete(hc, eq, &self.shape)?;
        self.len -= 1;
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.root.check_invariants(&self.shape);
        assert_eq!(self.leaf_count(), self.len);
    }
}

impl<'a, K, V> IntoIterator for &'a Trie<K, V> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`Trie`].
pub struct Iter<'a, K, V> {
    root: core::slice::Iter<'a, Option<Node<K, V>>>,
    stack: Vec<core::slice::Iter<'a, Node<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = match self.stack.last_mut() {
                Some(level) => match level.next() {
                    Some(node) => node,
                    None => {
                        self.stack.pop();
                        continue;
                    }
                },
                None => match self.root.next()? {
                    Some(node) => node,
                    None => continue,
                },
            };

            match node {
                Node::Leaf(leaf) => {
                    self.remaining -= 1;
                    return Some((leaf.key(), leaf.value()));
                }
                Node::Table(table) => self.stack.push(table.slots().iter()),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Shape statistics for a trie.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieStats {
    /// Number of leaves.
    pub leaves: usize,
    /// Number of tables, the root included.
    pub tables: usize,
    /// Interior tables left without any slot by deletes.
    pub empty_tables: usize,
    /// Root slots in use.
    pub root_occupied: usize,
    /// Root slots allocated.
    pub root_slots: usize,
    /// Deepest table present.
    pub deepest_table: usize,
    /// Leaves found at each depth, indexed by depth.
    pub leaves_per_depth: Vec<usize>,
}

#[cfg(feature = "stats")]
impl TrieStats {
    fn record<K, V>(&mut self, node: &Node<K, V>, depth: usize) {
        match node {
            Node::Leaf(_) => {
                if self.leaves_per_depth.len() <= depth {
                    self.leaves_per_depth.resize(depth + 1, 0);
                }
                self.leaves_per_depth[depth] += 1;
                self.leaves += 1;
            }
            Node::Table(table) => {
                self.tables += 1;
                self.deepest_table = self.deepest_table.max(table.depth());
                if table.is_empty() {
                    self.empty_tables += 1;
                }
                for child in table.slots() {
                    self.record(child, depth + 1);
                }
            }
        }
    }

    /// Average depth of a leaf, the root being depth 0.
    pub fn mean_leaf_depth(&self) -> f64 {
        if self.leaves == 0 {
            return 0.0;
        }
        let total: usize = self
            .leaves_per_depth
            .iter()
            .enumerate()
            .map(|(depth, count)| depth * count)
            .sum();
        total as f64 / self.leaves as f64
    }

    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Trie Statistics ===");
        println!("Leaves: {}", self.leaves);
        println!(
            "Tables: {} ({} empty, deepest at depth {})",
            self.tables, self.empty_tables, self.deepest_table
        );
        println!(
            "Root: {}/{} slots ({:.2}% occupied)",
            self.root_occupied,
            self.root_slots,
            if self.root_slots == 0 {
                0.0
            } else {
                self.root_occupied as f64 / self.root_slots as f64 * 100.0
            }
        );
        println!("Mean leaf depth: {:.3}", self.mean_leaf_depth());

        let max = self.leaves_per_depth.iter().copied().max().unwrap_or(0);
        for (depth, &count) in self.leaves_per_depth.iter().enumerate() {
            let width = if max == 0 { 0 } else { count * 50 / max };
            println!("{depth:>3} | {:<50} {count}", "#".repeat(width));
        }
    }
}

#[cfg(feature = "stats")]
impl<K, V> Trie<K, V> {
    /// Walks the trie and gathers [`TrieStats`].
    pub fn stats(&self) -> TrieStats {
        let mut stats = TrieStats {
            tables: 1,
            root_slots: self.root.slots().len(),
            ..TrieStats::default()
        };
        for node in self.root.slots().iter().flatten() {
            stats.root_occupied += 1;
            stats.record(node, 0);
        }
        stats
    }
}
