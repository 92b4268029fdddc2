//! Specialized collection types

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Stable handle to a node stored in a [`SceneGraph`](crate::scene::SceneGraph).
    ///
    /// A handle outlives the node it names: once the node is removed every
    /// lookup through the handle resolves to "no node".
    pub struct NodeId;
}

/// Arena holding scene nodes
pub type NodeArena<T> = SlotMap<NodeId, T>;
