use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::arena::{Handle, SlotArena};
use super::node::{Bucket, Node};
use crate::error::{Error, Result};

/// The frequency index: every resident node, grouped into one bucket per
/// frequency level, plus the lowest level currently populated.
///
/// Within a bucket, the head is the most recently touched node and the tail
/// is the next eviction candidate for that level.
#[derive(Debug)]
pub(super) struct FrequencyList<Key, Value> {
    arena: SlotArena<Node<Key, Value>>,
    buckets: HashMap<usize, Bucket>,
    // Zero iff there are no nodes.
    min_frequency: usize,
}

impl<Key, Value> FrequencyList<Key, Value> {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            buckets: HashMap::new(),
            min_frequency: 0,
        }
    }

    pub(super) const fn len(&self) -> usize {
        self.arena.len()
    }

    pub(super) const fn min_frequency(&self) -> Option<usize> {
        if self.min_frequency == 0 {
            None
        } else {
            Some(self.min_frequency)
        }
    }

    pub(super) fn get(&self, handle: Handle) -> Option<&Node<Key, Value>> {
        self.arena.get(handle)
    }

    pub(super) fn get_mut(&mut self, handle: Handle) -> Option<&mut Node<Key, Value>> {
        self.arena.get_mut(handle)
    }

    /// Stores a new node at frequency one, in front of every other node at
    /// that level. A fresh node always lowers the floor to one.
    pub(super) fn insert(&mut self, key: Key, value: Value) -> Handle {
        let handle = self.arena.insert(Node::new(key, value));
        self.attach_front(1, handle);
        self.min_frequency = 1;
        handle
    }

    /// Records one access of the node: moves it from its bucket to the front
    /// of the next frequency level.
    pub(super) fn touch(&mut self, handle: Handle) {
        let Some(frequency) = self.arena.get(handle).map(|node| node.frequency) else {
            debug_assert!(false, "touched a handle with no node");
            return;
        };

        // The node lands in `frequency + 1`, so that level is never empty
        // when it becomes the new floor.
        if self.detach(handle) && self.min_frequency == frequency {
            self.min_frequency = frequency + 1;
        }

        if let Some(node) = self.arena.get_mut(handle) {
            node.frequency = frequency + 1;
        }
        self.attach_front(frequency + 1, handle);
    }

    /// The node that would be evicted next: the tail of the lowest bucket.
    pub(super) fn lfu(&self) -> Option<Handle> {
        self.buckets.get(&self.min_frequency).map(|bucket| bucket.tail)
    }

    pub(super) fn peek_lfu(&self) -> Option<&Node<Key, Value>> {
        self.lfu().and_then(|handle| self.arena.get(handle))
    }

    /// Removes the eviction candidate without repairing the floor. Only for
    /// use immediately before [`Self::insert`], which resets the floor.
    pub(super) fn evict(&mut self) -> Option<Node<Key, Value>> {
        let handle = self.lfu()?;
        self.detach(handle);
        self.arena.remove(handle)
    }

    /// Removes the eviction candidate.
    pub(super) fn pop_lfu(&mut self) -> Option<Node<Key, Value>> {
        let handle = self.lfu()?;
        self.remove(handle)
    }

    /// Removes an arbitrary node. If this empties the lowest bucket, the
    /// floor is recomputed in time linear to the number of frequency levels.
    pub(super) fn remove(&mut self, handle: Handle) -> Option<Node<Key, Value>> {
        let frequency = self.arena.get(handle)?.frequency;
        let emptied = self.detach(handle);
        let node = self.arena.remove(handle)?;

        if emptied && frequency == self.min_frequency {
            self.min_frequency = self.buckets.keys().copied().min().unwrap_or(0);
        }

        Some(node)
    }

    /// Returns the populated frequency levels in ascending order.
    pub(super) fn frequencies(&self) -> Vec<usize> {
        let mut frequencies: Vec<_> = self.buckets.keys().copied().collect();
        frequencies.sort_unstable();
        frequencies
    }

    pub(super) fn clear(&mut self) {
        self.arena.clear();
        self.buckets.clear();
        self.min_frequency = 0;
    }

    /// Unlinks a node from its bucket, dropping the bucket if it empties.
    /// Returns whether the bucket was dropped.
    fn detach(&mut self, handle: Handle) -> bool {
        let Some((frequency, prev, next)) = self
            .arena
            .get(handle)
            .map(|node| (node.frequency, node.prev, node.next))
        else {
            return false;
        };

        if let Some(prev_node) = prev.and_then(|prev| self.arena.get_mut(prev)) {
            prev_node.next = next;
        }
        if let Some(next_node) = next.and_then(|next| self.arena.get_mut(next)) {
            next_node.prev = prev;
        }
        if let Some(node) = self.arena.get_mut(handle) {
            node.prev = None;
            node.next = None;
        }

        match self.buckets.entry(frequency) {
            Entry::Occupied(mut occupied) => {
                let bucket = occupied.get_mut();
                bucket.len -= 1;
                if bucket.len == 0 {
                    occupied.remove();
                    return true;
                }
                if let (None, Some(next)) = (prev, next) {
                    bucket.head = next;
                }
                if let (Some(prev), None) = (prev, next) {
                    bucket.tail = prev;
                }
                false
            }
            Entry::Vacant(_) => {
                debug_assert!(false, "node at frequency {frequency} has no bucket");
                false
            }
        }
    }

    fn attach_front(&mut self, frequency: usize, handle: Handle) {
        let old_head = match self.buckets.entry(frequency) {
            Entry::Occupied(mut occupied) => {
                let bucket = occupied.get_mut();
                let old_head = bucket.head;
                bucket.head = handle;
                bucket.len += 1;
                Some(old_head)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Bucket::singleton(handle));
                None
            }
        };

        if let Some(head_node) = old_head.and_then(|old_head| self.arena.get_mut(old_head)) {
            head_node.prev = Some(handle);
        }
        if let Some(node) = self.arena.get_mut(handle) {
            node.prev = None;
            node.next = old_head;
        }
    }

    /// Walks every bucket, verifying links, lengths, frequencies and the
    /// floor. Returns the handles of all nodes reached.
    pub(super) fn check_invariants(&self) -> Result<Vec<Handle>> {
        let mut reached = Vec::with_capacity(self.len());

        for (&frequency, bucket) in &self.buckets {
            if bucket.len == 0 {
                return Err(Error::invariant(format!(
                    "empty bucket retained at frequency {frequency}"
                )));
            }

            let mut prev = None;
            let mut current = Some(bucket.head);
            let mut count = 0;
            while let Some(handle) = current {
                let node = self.arena.get(handle).ok_or_else(|| {
                    Error::invariant(format!(
                        "bucket {frequency} links to empty slot {}",
                        handle.index()
                    ))
                })?;
                if node.frequency != frequency {
                    return Err(Error::invariant(format!(
                        "node at frequency {} found in bucket {frequency}",
                        node.frequency
                    )));
                }
                if node.prev != prev {
                    return Err(Error::invariant(format!(
                        "broken back link in bucket {frequency}"
                    )));
                }
                count += 1;
                if count > bucket.len {
                    return Err(Error::invariant(format!(
                        "bucket {frequency} holds more nodes than its length {}",
                        bucket.len
                    )));
                }
                reached.push(handle);
                prev = Some(handle);
                current = node.next;
            }

            if count != bucket.len {
                return Err(Error::invariant(format!(
                    "bucket {frequency} has length {} but links {count} nodes",
                    bucket.len
                )));
            }
            if prev != Some(bucket.tail) {
                return Err(Error::invariant(format!(
                    "bucket {frequency} tail does not end its chain"
                )));
            }
        }

        if reached.len() != self.arena.len() {
            return Err(Error::invariant(format!(
                "{} nodes stored but {} reachable from buckets",
                self.arena.len(),
                reached.len()
            )));
        }

        let lowest = self.buckets.keys().copied().min().unwrap_or(0);
        if lowest != self.min_frequency {
            return Err(Error::invariant(format!(
                "minimum frequency is {} but lowest bucket is {lowest}",
                self.min_frequency
            )));
        }

        Ok(reached)
    }
}
