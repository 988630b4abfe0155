//! An open-addressing hash table keyed by fixed-width binary encodings.
//!
//! [`FixedKeyTable`] stores every key as an `N`-byte array produced by a caller-supplied
//! encoder, so any key type with a stable, fixed-width binary form can be used without
//! implementing [`Hash`](std::hash::Hash) or [`Eq`]. Collisions are resolved by linear probing
//! over a power-of-two number of slots, and removals compact the probe chain in place so no
//! tombstones are ever left behind.

use std::mem;

/// Writes the binary form of a key into an `N`-byte buffer.
pub type KeyEncoder<K, const N: usize> = fn(&K, &mut [u8; N]);

/// Hashes an encoded key.
pub type KeyHasher<const N: usize> = fn(&[u8; N]) -> usize;

/// Capacity used by [`FixedKeyTable::new`].
pub const DEFAULT_INITIAL_CAPACITY: usize = 8;

/// Load factor used by [`FixedKeyTable::new`].
pub const DEFAULT_LOAD_FACTOR: f32 = 0.65;

#[derive(Debug, Clone)]
enum Slot<V, const N: usize> {
    Empty,
    Occupied { key: [u8; N], value: V },
}

impl<V, const N: usize> Slot<V, N> {
    #[inline]
    fn key(&self) -> Option<&[u8; N]> {
        match self {
            Slot::Empty => None,
            Slot::Occupied { key, .. } => Some(key),
        }
    }
}

/// Folds an encoded key into a hash, 4 big-endian bytes at a time.
///
/// A trailing partial word is zero-padded.
pub fn fold_hash<const N: usize>(key: &[u8; N]) -> usize {
    let mut hash = 0u32;
    for chunk in key.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        let part = u32::from_be_bytes(word);
        hash ^= part ^ (part >> 16);
    }
    hash as usize
}

/// Open-addressing map from `N`-byte encoded keys to values.
///
/// # Examples
///
/// ```
/// # use netbuf_monitor::table::FixedKeyTable;
/// fn encode(key: &u64, buf: &mut [u8; 8]) {
///     *buf = key.to_be_bytes();
/// }
///
/// let mut table = FixedKeyTable::<u64, &str, 8>::new(encode);
/// table.put(&7, "seven");
/// assert_eq!(table.get(&7), Some(&"seven"));
/// assert_eq!(table.remove(&7), Some("seven"));
/// assert!(table.is_empty());
/// ```
#[derive(Clone)]
pub struct FixedKeyTable<K, V, const N: usize> {
    slots: Vec<Slot<V, N>>,
    encoder: KeyEncoder<K, N>,
    hasher: KeyHasher<N>,
    load_factor: f32,
    resize_threshold: usize,
    len: usize,
}

impl<K, V, const N: usize> FixedKeyTable<K, V, N> {
    /// Creates an empty table with the default capacity and load factor.
    pub fn new(encoder: KeyEncoder<K, N>) -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, encoder)
    }

    /// Creates an empty table using [`fold_hash`].
    ///
    /// # Arguments
    ///
    /// * `initial_capacity` - Rounded up to the next power of two (at least 2).
    /// * `load_factor` - Fraction of occupied slots at which the table doubles.
    /// * `encoder` - Writes the binary form of a key.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not within `(0, 1]`.
    pub fn with_capacity(
        initial_capacity: usize,
        load_factor: f32,
        encoder: KeyEncoder<K, N>,
    ) -> Self {
        Self::with_hasher(initial_capacity, load_factor, encoder, fold_hash::<N>)
    }

    /// Creates an empty table with a custom hash function over encoded keys.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not within `(0, 1]`.
    pub fn with_hasher(
        initial_capacity: usize,
        load_factor: f32,
        encoder: KeyEncoder<K, N>,
        hasher: KeyHasher<N>,
    ) -> Self {
        assert!(
            load_factor > 0.0 && load_factor <= 1.0,
            "load factor must be within (0, 1], got {load_factor}"
        );
        let capacity = initial_capacity.max(2).next_power_of_two();
        let mut table = Self {
            slots: Vec::new(),
            encoder,
            hasher,
            load_factor,
            resize_threshold: 0,
            len: 0,
        };
        table.allocate(capacity);
        table
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Encodes `key` with the table's encoder.
    #[inline]
    pub fn encode(&self, key: &K) -> [u8; N] {
        let mut encoded = [0u8; N];
        (self.encoder)(key, &mut encoded);
        encoded
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn put(&mut self, key: &K, value: V) -> Option<V> {
        let encoded = self.encode(key);
        self.put_encoded(encoded, value)
    }

    /// Inserts `value` under an already encoded key, returning the value it replaced.
    pub fn put_encoded(&mut self, key: [u8; N], value: V) -> Option<V> {
        match self.probe(&key) {
            Ok(index) => match &mut self.slots[index] {
                Slot::Occupied { value: existing, .. } => Some(mem::replace(existing, value)),
                Slot::Empty => None,
            },
            Err(index) => {
                self.slots[index] = Slot::Occupied { key, value };
                self.len += 1;
                while self.len >= self.resize_threshold {
                    self.grow();
                }
                None
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_encoded(&self.encode(key))
    }

    pub fn get_encoded(&self, key: &[u8; N]) -> Option<&V> {
        let index = self.probe(key).ok()?;
        match &self.slots[index] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let encoded = self.encode(key);
        self.get_encoded_mut(&encoded)
    }

    pub fn get_encoded_mut(&mut self, key: &[u8; N]) -> Option<&mut V> {
        let index = self.probe(key).ok()?;
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.probe(&self.encode(key)).is_ok()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let encoded = self.encode(key);
        self.remove_encoded(&encoded)
    }

    /// Removes an already encoded key, returning its value.
    ///
    /// The freed slot is refilled from later members of its probe chain so that every
    /// remaining key is still reachable from its home slot.
    pub fn remove_encoded(&mut self, key: &[u8; N]) -> Option<V> {
        let index = self.probe(key).ok()?;
        match mem::replace(&mut self.slots[index], Slot::Empty) {
            Slot::Occupied { value, .. } => {
                self.len -= 1;
                self.compact_chain(index);
                Some(value)
            }
            Slot::Empty => None,
        }
    }

    /// Removes every entry while keeping the allocated capacity.
    pub fn clear(&mut self) {
        if self.len == 0 {
            return;
        }
        self.slots.fill_with(|| Slot::Empty);
        self.len = 0;
    }

    /// Iterates over encoded keys and values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8; N], &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((key, value)),
            Slot::Empty => None,
        })
    }

    /// Iterates over encoded keys and mutable values in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&[u8; N], &mut V)> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((&*key, value)),
            Slot::Empty => None,
        })
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    fn home(&self, key: &[u8; N]) -> usize {
        (self.hasher)(key) & self.mask()
    }

    /// Walks the probe chain of `key`.
    ///
    /// Returns `Ok(index)` of the slot holding the key, or `Err(index)` of the first empty slot
    /// where it would be inserted.
    fn probe(&self, key: &[u8; N]) -> Result<usize, usize> {
        let mask = self.mask();
        let mut index = self.home(key);
        loop {
            match self.slots[index].key() {
                None => return Err(index),
                Some(candidate) if candidate == key => return Ok(index),
                Some(_) => index = (index + 1) & mask,
            }
        }
    }

    fn allocate(&mut self, capacity: usize) {
        self.slots = std::iter::repeat_with(|| Slot::Empty)
            .take(capacity)
            .collect();
        self.resize_threshold = ((capacity as f64 * f64::from(self.load_factor)) as usize).max(1);
    }

    fn grow(&mut self) {
        let new_capacity = self.slots.len() * 2;
        let old = mem::take(&mut self.slots);
        self.allocate(new_capacity);

        let mask = self.mask();
        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                let mut index = self.home(&key);
                while self.slots[index].key().is_some() {
                    index = (index + 1) & mask;
                }
                self.slots[index] = Slot::Occupied { key, value };
            }
        }
    }

    /// Backward-shift compaction starting at the freshly emptied slot `deleted`.
    fn compact_chain(&mut self, mut deleted: usize) {
        let mask = self.mask();
        let mut index = deleted;

        for _ in 0..self.slots.len() {
            index = (index + 1) & mask;
            let Some(key) = self.slots[index].key() else {
                return;
            };
            let hash = self.home(key);

            // Move the entry into the hole unless its home lies cyclically in (deleted, index].
            if (index < hash && (hash <= deleted || deleted <= index))
                || (hash <= deleted && deleted <= index)
            {
                self.slots.swap(deleted, index);
                deleted = index;
            }
        }
    }
}

impl<K, V: std::fmt::Debug, const N: usize> std::fmt::Debug for FixedKeyTable<K, V, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedKeyTable")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("load_factor", &self.load_factor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    fn encode_u64(key: &u64, buf: &mut [u8; 8]) {
        *buf = key.to_be_bytes();
    }

    fn encode_pair(key: &(u64, u64), buf: &mut [u8; 16]) {
        buf[..8].copy_from_slice(&key.0.to_be_bytes());
        buf[8..].copy_from_slice(&key.1.to_be_bytes());
    }

    fn constant_hash(_: &[u8; 8]) -> usize {
        3
    }

    fn assert_matches_reference(
        table: &FixedKeyTable<u64, u64, 8>,
        reference: &HashMap<u64, u64>,
        key_space: u64,
    ) {
        assert_eq!(table.len(), reference.len());
        for key in 0..key_space {
            assert_eq!(table.get(&key), reference.get(&key), "key {key}");
            assert_eq!(table.contains_key(&key), reference.contains_key(&key));
        }
    }

    fn fuzz(initial_capacity: usize, load_factor: f32, seed: u64, hasher: KeyHasher<8>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut table = FixedKeyTable::with_hasher(initial_capacity, load_factor, encode_u64, hasher);
        let mut reference = HashMap::new();
        let key_space = 64 + rng.gen_range(0..64);
        let starting_capacity = table.capacity();

        for round in 0..1500u64 {
            let key = rng.gen_range(0..key_space);
            if rng.gen_bool(0.6) {
                assert_eq!(table.put(&key, round), reference.insert(key, round));
            } else {
                assert_eq!(table.remove(&key), reference.remove(&key));
            }
            assert_matches_reference(&table, &reference, key_space);
        }

        assert!(table.capacity() > starting_capacity, "table never resized");

        let keys: Vec<u64> = reference.keys().copied().collect();
        for key in keys {
            assert_eq!(table.remove(&key), reference.remove(&key));
            assert_matches_reference(&table, &reference, key_space);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_fuzz_against_reference_map() {
        for (capacity, load_factor, seed) in [
            (2, 0.5, 37),
            (4, 0.6, 2347),
            (16, 0.1, 16),
            (64, 0.2222, 883),
            (2, 1.0, 16555),
        ] {
            fuzz(capacity, load_factor, seed, fold_hash::<8>);
        }
    }

    #[test]
    fn test_fuzz_single_probe_chain() {
        // Every key shares one home slot, so each removal exercises compaction across wraparound.
        fuzz(4, 0.9, 99, constant_hash);
    }

    #[test]
    fn test_remove_compacts_chain() {
        let mut table = FixedKeyTable::with_hasher(8, 0.9, encode_u64, constant_hash);
        for key in 0..5 {
            table.put(&key, key * 10);
        }
        assert_eq!(table.remove(&1), Some(10));
        assert_eq!(table.remove(&1), None);
        for key in [0, 2, 3, 4] {
            assert_eq!(table.get(&key), Some(&(key * 10)));
        }
    }

    #[test]
    fn test_put_replaces_existing_value() {
        let mut table = FixedKeyTable::new(encode_u64);
        assert_eq!(table.put(&1, "a"), None);
        assert_eq!(table.put(&1, "b"), Some("a"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&1), Some(&"b"));
    }

    #[test]
    fn test_get_mut() {
        let mut table = FixedKeyTable::new(encode_u64);
        table.put(&5, 1u32);
        *table.get_mut(&5).unwrap() += 41;
        assert_eq!(table.get(&5), Some(&42));
        assert!(table.get_mut(&6).is_none());
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut table = FixedKeyTable::with_capacity(2, 0.5, encode_u64);
        for key in 0..100 {
            table.put(&key, key);
        }
        let capacity = table.capacity();
        assert!(capacity >= 256);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!(!table.contains_key(&3));
        table.put(&3, 3);
        assert_eq!(table.get(&3), Some(&3));
    }

    #[test]
    fn test_wide_keys() {
        let mut table = FixedKeyTable::<(u64, u64), &str, 16>::new(encode_pair);
        table.put(&(1, 70_000), "a");
        table.put(&(1, 4_464), "b");
        assert_eq!(table.get(&(1, 70_000)), Some(&"a"));
        assert_eq!(table.get(&(1, 4_464)), Some(&"b"));
        assert_eq!(table.len(), 2);

        let encoded = table.encode(&(1, 4_464));
        assert_eq!(table.remove_encoded(&encoded), Some("b"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let mut table = FixedKeyTable::new(encode_u64);
        for key in 0..20 {
            table.put(&key, key);
        }
        let mut seen: Vec<u64> = table.iter().map(|(_, v)| *v).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());

        for (_, value) in table.iter_mut() {
            *value += 1;
        }
        assert_eq!(table.get(&0), Some(&1));
    }

    #[test]
    fn test_fold_hash() {
        assert_eq!(fold_hash(&[0u8; 8]), 0);
        assert_eq!(fold_hash(&[0, 0, 0, 1]), 1);
        assert_eq!(fold_hash(&[0, 1, 0, 0]), 0x0001_0001);
        // partial trailing word is zero padded
        assert_eq!(fold_hash(&[0, 0, 0, 0, 0xFF]), 0xFF00_0000 ^ 0xFF00);
    }

    #[test]
    #[should_panic(expected = "load factor")]
    fn test_rejects_invalid_load_factor() {
        let _ = FixedKeyTable::<u64, (), 8>::with_capacity(8, 1.5, encode_u64);
    }
}
