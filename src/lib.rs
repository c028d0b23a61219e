//! # stable-slots
//!
//! Index-stable containers for subsystems that hand out integer handles
//! instead of pointers: entity stores, scene graphs, event queues.
//!
//! A value added to one of the slot arrays keeps its index until it is
//! removed. Removal leaves a tombstone behind and the index is recycled by a
//! later add. The arrays differ only in which hole they hand out next:
//!
//! - [`StableIndexSlotArray`] always reuses the lowest hole.
//! - [`TrinaryStableIndexSlotArray`] buckets holes into three zones.
//! - [`IntrusiveHoleStackArray`] threads a LIFO stack through the holes.
//!
//! On top of them sit two trees stored in flat arrays and linked by
//! [`NodeId`]: [`AncestrallyOrderedBinaryTree`], whose nodes always follow
//! their parent, and the n-ary [`SiblingChainTree`].
//!
//! ## Example
//!
//! ```rust
//! use stable_slots::StableIndexSlotArray;
//!
//! let mut arr: StableIndexSlotArray<Option<&str>> = StableIndexSlotArray::new(2);
//! let a = arr.add(Some("a"));
//! let b = arr.add(Some("b"));
//! arr.add(Some("c"));
//! assert_eq!(arr.capacity(), 4);
//!
//! arr.remove_at(b);
//! assert_eq!(arr.len(), 2);
//! assert_eq!(arr.add(Some("d")), b);
//! assert_eq!(arr[a], Some("a"));
//! ```
//!
//! Element types with their own notion of "empty" can supply it with
//! closures instead of implementing [`Tombstone`]:
//!
//! ```rust
//! use stable_slots::{Callbacks, StableIndexSlotArray};
//!
//! #[derive(Default)]
//! struct Particle {
//!     id: i32,
//! }
//!
//! let policy = Callbacks::builder()
//!     .tombstone_test(|p: &Particle| p.id < 0)
//!     .tombstone_setter(|p: &mut Particle| p.id = -1)
//!     .build()
//!     .unwrap();
//! let mut arr = StableIndexSlotArray::with_policy(8, policy);
//! let idx = arr.add(Particle { id: 7 });
//! arr.remove_at(idx);
//! assert!(arr.get(idx).is_none());
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod slots;
pub mod tombstone;
pub mod tree;

pub use buffer::{ObjectPool, RefGrowBuffer, RefQueue, ValuePool};
pub use config::{SlotArrayConfig, TreeConfig, TrinaryConfig};
pub use error::{ConfigError, Result};
pub use slots::{
    IntrusiveHoleStackArray, MonitoredSlotArray, StableIndexSlotArray,
    TrinaryStableIndexSlotArray,
};
pub use tombstone::{Callbacks, CallbacksBuilder, Intrinsic, SlotPolicy, Tombstone};
pub use tree::{AncestrallyOrderedBinaryTree, Hand, NodeId, SiblingChainTree};

#[cfg(test)]
mod proptests;
