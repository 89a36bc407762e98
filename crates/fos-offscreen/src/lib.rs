//! fOS Offscreen - reference-counted element tree
//!
//! Mutable element tree shared between a host and the tree itself:
//!
//! - [`Element`]: strong handle to a tree node; parents own their children
//!   strongly and children link back weakly
//! - mutation: append, insert_before, replace_with, remove_child, remove
//! - bounded serialization into caller buffers
//! - [`HostBridge`]: the same API over opaque handles for a host runtime
//!
//! Child lists are stored in a [`GrowableArray`] by default, or a
//! [`DoublyLinkedList`] with the `linked-children` feature.

mod attributes;
mod bridge;
mod config;
pub mod containers;
mod element;
mod error;
mod interner;
mod mutation;
pub mod refcount;
mod serializer;

pub use attributes::{Attributes, StyleDeclarations};
pub use bridge::{ElementHandle, HostBridge};
pub use config::{BridgeConfig, SerializerConfig};
pub use containers::{DoublyLinkedList, GrowableArray, Identity, NodeKey, Sequence};
pub use element::{Element, WeakElement};
pub use error::{DomError, DomResult};
pub use interner::Name;
pub use refcount::{Strong, WeakRef};
pub use serializer::Serialized;
