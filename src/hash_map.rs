use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use cfg_if::cfg_if;

use crate::error::HamtError;
use crate::key::HashableKey;
use crate::trie::Shape;
use crate::trie::Trie;

cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder used by [`HamtMap::new`] when no other is named.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used by [`HamtMap::new`] when no other is named.
        pub type DefaultHashBuilder = std::hash::RandomState;
    }
}

/// A key stored together with the hash its map computed for it.
#[derive(Clone, Debug)]
struct Hashed<K> {
    hash: u64,
    key: K,
}

impl<K: Eq> HashableKey for Hashed<K> {
    #[inline]
    fn hash_code(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.key == other.key
    }
}

/// A hash map implemented using the [`Trie`] as the underlying storage.
///
/// `HamtMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Each key's 64-bit
/// hash is computed once and kept next to it, so the trie never rehashes.
///
/// Two distinct keys whose hashes agree on all 64 bits cannot be stored
/// together; the second insert fails with
/// [`HamtError::MaxTableDepthExceeded`].
#[derive(Clone)]
pub struct HamtMap<K, V, S> {
    trie: Trie<Hashed<K>, V>,
    hash_builder: S,
}

impl<K, V, S> Debug for HamtMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HamtMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new map with the given hasher builder and the default shape.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use hamt_trie::HamtMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HamtMap<i32, String, _> = HamtMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_shape_and_hasher(Shape::default(), hash_builder)
    }

    /// Creates a new map with the given trie shape and hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use hamt_trie::HamtMap;
    /// # use hamt_trie::Shape;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let shape = Shape::new(6, 10).unwrap();
    /// let map: HamtMap<i32, String, _> = HamtMap::with_shape_and_hasher(shape, SimpleHasher);
    /// assert_eq!(map.shape().t(), 10);
    /// ```
    pub fn with_shape_and_hasher(shape: Shape, hash_builder: S) -> Self {
        Self {
            trie: Trie::with_shape(shape),
            hash_builder,
        }
    }

    /// The shape of the underlying trie.
    pub fn shape(&self) -> Shape {
        self.trie.shape()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Removes all elements from the map.
    pub fn clear(&mut self) {
        self.trie.clear();
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `Ok(None)` is returned.
    /// If the map did have this key present, the value is updated, and the old
    /// value is returned.
    ///
    /// # Errors
    ///
    /// [`HamtError::MaxTableDepthExceeded`] if a different key with the same
    /// 64-bit hash is already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use hamt_trie::HamtMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HamtMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.insert(37, "a"), Ok(None));
    /// assert_eq!(map.insert(37, "b"), Ok(Some("a")));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, HamtError> {
        let hash = self.hash_builder.hash_one(&key);
        self.trie.insert(Hashed { hash, key }, value)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_builder.hash_one(key);
        self.trie
            .find_hashed(hash, &|k: &Hashed<K>| k.hash == hash && k.key == *key)
            .ok()
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use hamt_trie::HamtMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HamtMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a").unwrap();
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.trie
            .find_mut_hashed(hash, &|k: &Hashed<K>| k.hash == hash && k.key == *key)
            .ok()
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use hamt_trie::HamtMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HamtMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = self.hash_builder.hash_one(key);
        self.trie
            .delete_hashed(hash, &|k: &Hashed<K>| k.hash == hash && k.key == *key)
            .ok()
    }

    /// An iterator visiting all key-value pairs in hash order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.trie.iter(),
        }
    }

    /// An iterator visiting all keys in hash order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in hash order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> HamtMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use hamt_trie::HamtMap;
    /// use hamt_trie::hash_map::DefaultHashBuilder;
    ///
    /// let mut map: HamtMap<&str, u32, DefaultHashBuilder> = HamtMap::new();
    /// map.insert("one", 1).unwrap();
    /// assert_eq!(map.get(&"one"), Some(&1));
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Default for HamtMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the key-value pairs of a `HamtMap`.
pub struct Iter<'a, K, V> {
    inner: crate::trie::Iter<'a, Hashed<K>, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&k.key, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `HamtMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a `HamtMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Hashes every key to the same value.
    #[derive(Clone, Default)]
    struct ConstantHasher;

    impl Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            0x5151_5151
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    impl BuildHasher for ConstantHasher {
        type Hasher = ConstantHasher;

        fn build_hasher(&self) -> Self::Hasher {
            ConstantHasher
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HamtMap<i32, String, SipHashBuilder> = HamtMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.shape(), Shape::default());

        let map2 = HamtMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = HamtMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, "hello".to_string()), Ok(None));
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()),
            Ok(Some("hello".to_string()))
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn test_get_mut() {
        let mut map = HamtMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string()).unwrap();

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_remove() {
        let mut map = HamtMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string()).unwrap();
        map.insert(2, "world".to_string()).unwrap();

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));
        assert_eq!(map.remove(&1), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_many_keys_every_shape() {
        for w in 1..=6 {
            let shape = Shape::new(w, 0).unwrap();
            let mut map = HamtMap::with_shape_and_hasher(shape, SipHashBuilder::default());
            for k in 0..2000u64 {
                assert_eq!(map.insert(k, k * 3), Ok(None));
            }
            assert_eq!(map.len(), 2000);
            for k in 0..2000u64 {
                assert_eq!(map.get(&k), Some(&(k * 3)), "w {w}");
            }
            for k in (0..2000u64).filter(|k| k % 3 == 0) {
                assert_eq!(map.remove(&k), Some(k * 3));
            }
            for k in 0..2000u64 {
                assert_eq!(map.contains_key(&k), k % 3 != 0);
            }
            map.trie.check_invariants();
        }
    }

    #[test]
    fn test_iterators() {
        let mut map = HamtMap::with_hasher(SipHashBuilder::default());
        for k in 0..50 {
            map.insert(k, k.to_string()).unwrap();
        }

        assert_eq!(map.iter().len(), 50);
        let mut keys: Vec<i32> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..50).collect::<Vec<_>>());

        let mut values: Vec<&String> = map.values().collect();
        values.sort();
        assert_eq!(values.len(), 50);
        assert!(values.contains(&&"49".to_string()));

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn test_full_hash_collision() {
        let mut map: HamtMap<&str, i32, ConstantHasher> = HamtMap::new();
        assert_eq!(map.insert("a", 1), Ok(None));
        assert_eq!(map.insert("a", 2), Ok(Some(1)));
        assert!(matches!(
            map.insert("b", 3),
            Err(HamtError::MaxTableDepthExceeded { .. })
        ));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&"a"), Some(&2));
        assert_eq!(map.get(&"b"), None);
        assert_eq!(map.remove(&"b"), None);
    }

    #[test]
    fn test_debug_and_clone() {
        let mut map = HamtMap::with_hasher(SipHashBuilder::default());
        map.insert(7, 'x').unwrap();
        let cloned = map.clone();
        assert_eq!(alloc::format!("{:?}", cloned), "{7: 'x'}");
        map.insert(8, 'y').unwrap();
        assert_eq!(cloned.len(), 1);
        assert_eq!(map.len(), 2);
    }
}
