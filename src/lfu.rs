use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;

use tracing::{debug, trace};

use crate::error::{Error, Result};

use self::arena::Handle;
use self::freq_list::FrequencyList;

mod arena;
mod freq_list;
mod node;

/// Upper bound on the number of slots reserved up front. Larger stores grow
/// on demand instead of allocating their full capacity at construction.
const MAX_PREALLOCATION: usize = 4096;

/// A bounded store that, when full, evicts the least frequently used entry.
/// Ties between equally used entries are broken by evicting the one touched
/// least recently.
///
/// Reads ([`Self::get`], [`Self::get_mut`]) and updates through
/// [`Self::put`] each count as one access. Every one of these operations, as
/// well as eviction, runs in amortized constant time.
// Note that Default is _not_ implemented. A store without a capacity is a
// store that accepts nothing.
// This is re-exported at the crate root, so this lint can be safely ignored.
#[allow(clippy::module_name_repetitions)]
pub struct LfuStore<Key, Value> {
    lookup: HashMap<Key, Handle>,
    freq_list: FrequencyList<Key, Value>,
    capacity: usize,
}

impl<Key: Hash + Eq + Clone, Value> LfuStore<Key, Value> {
    /// Creates a store holding at most `capacity` entries.
    ///
    /// A capacity of zero produces a store that ignores every insertion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NegativeCapacity`] if `capacity` is negative.
    ///
    /// ```
    /// # use lfu_store::{Error, LfuStore};
    /// assert!(LfuStore::<&str, u32>::new(8).is_ok());
    /// assert_eq!(
    ///     LfuStore::<&str, u32>::new(-1).unwrap_err(),
    ///     Error::NegativeCapacity(-1),
    /// );
    /// ```
    pub fn new(capacity: i64) -> Result<Self> {
        if capacity < 0 {
            return Err(Error::NegativeCapacity(capacity));
        }

        // Capacities beyond the address space can never be reached anyway.
        let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
        Ok(Self::with_capacity(capacity))
    }

    /// Creates a store holding at most `capacity` entries. When the capacity
    /// is reached, the least frequently used entry is evicted to make room.
    ///
    /// ```
    /// # use lfu_store::LfuStore;
    /// let mut store = LfuStore::with_capacity(2);
    ///
    /// store.put("foo", 3);
    /// store.put("bar", 4);
    ///
    /// // "foo" is now used more often than "bar".
    /// store.get(&"foo");
    ///
    /// // Inserting reports the entry evicted to make room.
    /// assert_eq!(store.insert("baz", 5), Some(("bar", 4)));
    /// assert!(store.get(&"bar").is_none());
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        debug!(capacity, "created lfu store");
        let reserved = capacity.min(MAX_PREALLOCATION);
        Self {
            lookup: HashMap::with_capacity(reserved),
            freq_list: FrequencyList::with_capacity(reserved),
            capacity,
        }
    }

    /// Gets a value, counting this as one access of that value, if it exists.
    /// A miss leaves the store untouched.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&Value>
    where
        Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.lookup.get(key)?;
        self.freq_list.touch(handle);
        self.freq_list.get(handle).map(|node| &node.value)
    }

    /// Gets a mutable value, counting this as one access of that value, if it
    /// exists.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut Value>
    where
        Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.lookup.get(key)?;
        self.freq_list.touch(handle);
        self.freq_list.get_mut(handle).map(|node| &mut node.value)
    }

    /// Gets a value without counting an access.
    #[must_use]
    pub fn peek<Q>(&self, key: &Q) -> Option<&Value>
    where
        Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.lookup.get(key)?;
        self.freq_list.get(handle).map(|node| &node.value)
    }

    /// Returns if the key is resident. This does not count as an access.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.contains_key(key)
    }

    /// Returns how many times the key has been accessed since it was
    /// inserted, counting the insertion itself.
    #[must_use]
    pub fn frequency<Q>(&self, key: &Q) -> Option<usize>
    where
        Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.lookup.get(key)?;
        self.freq_list.get(handle).map(|node| node.frequency)
    }

    /// Stores a value under the provided key.
    ///
    /// If the key is already resident, its value is replaced and this counts
    /// as one access. Otherwise, if the store is full, the least frequently
    /// used entry is evicted first. Does nothing on a zero capacity store.
    #[inline]
    pub fn put(&mut self, key: Key, value: Value) {
        self.insert(key, value);
    }

    /// Behaves as [`Self::put`], returning the key and value that were
    /// evicted to make room, if any. Replacing the value of a resident key
    /// never evicts.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<(Key, Value)> {
        if self.capacity == 0 {
            trace!("ignored insertion into zero capacity store");
            return None;
        }

        if let Some(&handle) = self.lookup.get(&key) {
            if let Some(node) = self.freq_list.get_mut(handle) {
                node.value = value;
            }
            self.freq_list.touch(handle);
            return None;
        }

        let evicted = if self.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let handle = self.freq_list.insert(key.clone(), value);
        self.lookup.insert(key, handle);
        evicted
    }

    /// Makes room for exactly one insertion. The frequency floor is left
    /// stale, since the insertion that follows resets it.
    fn evict(&mut self) -> Option<(Key, Value)> {
        let node = self.freq_list.evict()?;
        self.lookup.remove(&node.key);
        trace!(
            frequency = node.frequency,
            len = self.len(),
            "evicted least frequently used entry"
        );
        Some((node.key, node.value))
    }

    /// Removes a value from the store by key, if it exists.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Value>
    where
        Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.lookup.remove(key)?;
        let node = self.freq_list.remove(handle)?;
        trace!(frequency = node.frequency, "removed entry");
        Some(node.value)
    }

    /// Evicts the least frequently used value and returns it. If there are
    /// multiple values with an equal access count, the least recently
    /// touched one is evicted.
    #[inline]
    pub fn pop_lfu(&mut self) -> Option<Value> {
        self.pop_lfu_key_value_frequency().map(|(_, v, _)| v)
    }

    /// Evicts the least frequently used key-value pair and returns it.
    #[inline]
    pub fn pop_lfu_key_value(&mut self) -> Option<(Key, Value)> {
        self.pop_lfu_key_value_frequency().map(|(k, v, _)| (k, v))
    }

    /// Evicts the least frequently used entry and returns its key, value and
    /// the frequency it had.
    pub fn pop_lfu_key_value_frequency(&mut self) -> Option<(Key, Value, usize)> {
        let node = self.freq_list.pop_lfu()?;
        self.lookup.remove(&node.key);
        trace!(
            frequency = node.frequency,
            len = self.len(),
            "popped least frequently used entry"
        );
        Some((node.key, node.value, node.frequency))
    }

    /// Peeks at the next value to be evicted, if there is one. This will not
    /// increment the access counter for that value.
    #[inline]
    #[must_use]
    pub fn peek_lfu(&self) -> Option<&Value> {
        self.freq_list.peek_lfu().map(|node| &node.value)
    }

    /// Peeks at the next key-value pair to be evicted, if there is one.
    #[inline]
    #[must_use]
    pub fn peek_lfu_key_value(&self) -> Option<(&Key, &Value)> {
        self.freq_list
            .peek_lfu()
            .map(|node| (&node.key, &node.value))
    }

    /// Removes every entry. The capacity is kept.
    pub fn clear(&mut self) {
        debug!(len = self.len(), "cleared lfu store");
        self.lookup.clear();
        self.freq_list.clear();
    }

    /// Verifies that the key index, the frequency buckets and the frequency
    /// floor all agree. This is a linear time operation meant for tests and
    /// debugging.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] describing the first disagreement found.
    pub fn check_invariants(&self) -> Result<()> {
        if self.len() > self.capacity {
            return Err(Error::invariant(format!(
                "{} entries exceed capacity {}",
                self.len(),
                self.capacity
            )));
        }

        if self.lookup.len() != self.freq_list.len() {
            return Err(Error::invariant(format!(
                "{} keys indexed but {} entries stored",
                self.lookup.len(),
                self.freq_list.len()
            )));
        }

        for (key, &handle) in &self.lookup {
            match self.freq_list.get(handle) {
                Some(node) if node.key == *key => {}
                Some(_) => {
                    return Err(Error::invariant(format!(
                        "slot {} holds a different key than indexed",
                        handle.index()
                    )))
                }
                None => {
                    return Err(Error::invariant(format!(
                        "key indexed at empty slot {}",
                        handle.index()
                    )))
                }
            }
        }

        let reached = self.freq_list.check_invariants()?;
        if reached.len() != self.lookup.len() {
            return Err(Error::invariant(format!(
                "{} keys indexed but {} reachable from buckets",
                self.lookup.len(),
                reached.len()
            )));
        }

        Ok(())
    }
}

impl<Key, Value> LfuStore<Key, Value> {
    /// Returns the maximum number of entries this store holds.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current number of entries. This is a constant time
    /// operation.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Returns if the store contains no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Returns if inserting a new key would evict an entry, or, for a zero
    /// capacity store, be ignored.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Returns the lowest access count among resident entries, or `None` if
    /// the store is empty.
    #[inline]
    #[must_use]
    pub const fn min_frequency(&self) -> Option<usize> {
        self.freq_list.min_frequency()
    }

    /// Returns the access counts currently held by at least one entry, in
    /// ascending order. This is a linear time operation in the number of
    /// distinct counts.
    #[inline]
    #[must_use]
    pub fn frequencies(&self) -> Vec<usize> {
        self.freq_list.frequencies()
    }
}

impl<Key: Hash + Eq + Clone, Value> Extend<(Key, Value)> for LfuStore<Key, Value> {
    /// Puts the items from the iterator into the store. This may evict
    /// entries, including ones inserted earlier by the same iterator.
    fn extend<T: IntoIterator<Item = (Key, Value)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<Key: Debug, Value> Debug for LfuStore<Key, Value> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let frequencies: Vec<(&Key, usize)> = self
            .lookup
            .iter()
            .filter_map(|(key, &handle)| {
                self.freq_list
                    .get(handle)
                    .map(|node| (key, node.frequency))
            })
            .collect();

        f.debug_struct("LfuStore")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("min_frequency", &self.min_frequency())
            .field("frequencies", &frequencies)
            .finish()
    }
}
