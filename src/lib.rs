#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(missing_docs)]

//! This crate provides an LFU store with constant time insertion, fetching,
//! and eviction.
//!
//! When the store is full, inserting a new key evicts the entry with the
//! fewest accesses. Among entries sharing the fewest accesses, the one
//! touched least recently is evicted. Reads and value updates both count as
//! accesses; lookups that miss never change the store.
//!
//! ```
//! # use lfu_store::LfuStore;
//! let mut store = LfuStore::new(2)?;
//! store.put(1, "a");
//! store.put(2, "b");
//!
//! assert_eq!(store.get(&1), Some(&"a"));
//!
//! // Key 2 is the only entry that was accessed once, so it goes.
//! store.put(3, "c");
//! assert_eq!(store.get(&2), None);
//! assert_eq!(store.get(&3), Some(&"c"));
//! # Ok::<(), lfu_store::Error>(())
//! ```
//!
//! Entries live in a slot arena and are linked into one bucket per access
//! count through integer handles, so no operation scans the store.
//!
//! The store does no internal synchronization. Callers that share one across
//! threads must serialize access themselves, for example by wrapping it in a
//! [`Mutex`](std::sync::Mutex).

pub use error::{Error, Result};
pub use lfu::LfuStore;

mod error;
mod lfu;
