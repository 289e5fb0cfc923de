use super::arena::Handle;

/// An entry resident in the store. Nodes sharing a frequency are linked
/// into one bucket through `prev` and `next`; `prev` points toward the
/// front (most recently touched) of the bucket.
#[derive(Debug)]
pub(super) struct Node<Key, Value> {
    pub(super) key: Key,
    pub(super) value: Value,
    pub(super) frequency: usize,
    pub(super) prev: Option<Handle>,
    pub(super) next: Option<Handle>,
}

impl<Key, Value> Node<Key, Value> {
    pub(super) fn new(key: Key, value: Value) -> Self {
        Self {
            key,
            value,
            frequency: 1,
            prev: None,
            next: None,
        }
    }
}

/// Ends of one frequency bucket. A bucket with no members is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Bucket {
    pub(super) head: Handle,
    pub(super) tail: Handle,
    pub(super) len: usize,
}

impl Bucket {
    pub(super) const fn singleton(handle: Handle) -> Self {
        Self {
            head: handle,
            tail: handle,
            len: 1,
        }
    }
}
