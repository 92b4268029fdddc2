//! Scene nodes
//!
//! A [`Node`] is one element of the scene tree. All kinds share this one
//! struct; what differs per kind is the [`ClassType`] tag, the
//! [`NodeData`] resolved from the node's properties, and the capabilities
//! the tag grants. Structural links (parent and children) are handles into
//! the owning [`SceneGraph`](super::SceneGraph) and can only be changed
//! through it.

use std::fmt;
use std::sync::Arc;

use super::class_type::{Capabilities, ClassType};
use super::node_data::NodeData;
use super::properties::PropertyList;
use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::resources::{Material, Mesh};

/// Lifecycle of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Built, resources not resolved yet
    Created,
    /// Resources resolved
    Initialized,
    /// Last initialization attempt failed
    Failed,
    /// Resources released
    ShutDown,
}

/// One element of the scene tree
#[derive(Debug, Clone)]
pub struct Node {
    id: u32,
    name: Option<String>,
    class_type: Option<ClassType>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: Mat4,
    properties: PropertyList,
    data: NodeData,
    mesh: Option<Arc<Mesh>>,
    material: Option<Arc<Material>>,
    entity_offset: Option<u32>,
    state: NodeState,
}

impl Node {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            name: None,
            class_type: None,
            parent: None,
            children: Vec::new(),
            transform: Mat4::identity(),
            properties: PropertyList::new(),
            data: NodeData::None,
            mesh: None,
            material: None,
            entity_offset: None,
            state: NodeState::Created,
        }
    }

    /// Unique id, assigned in document order
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Optional name (the document `id` attribute)
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the node name
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Class type, `None` until resolved
    #[must_use]
    pub const fn class_type(&self) -> Option<ClassType> {
        self.class_type
    }

    /// Assign the class type
    pub fn set_class_type(&mut self, class_type: ClassType) {
        self.class_type = Some(class_type);
    }

    /// Whether the node's class type grants all of `caps`
    #[must_use]
    pub fn has(&self, caps: Capabilities) -> bool {
        self.class_type.is_some_and(|class| class.has(caps))
    }

    /// Parent handle as stored; prefer [`SceneGraph::parent`](super::SceneGraph::parent),
    /// which also checks the parent is still alive
    #[must_use]
    pub const fn parent_handle(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent_handle(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Children in traversal order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }

    /// Local-to-parent transform
    #[must_use]
    pub const fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Replace the local-to-parent transform
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Properties the node was configured with
    #[must_use]
    pub const fn properties(&self) -> &PropertyList {
        &self.properties
    }

    /// Mutable properties; changes take effect on the next initialization
    pub fn properties_mut(&mut self) -> &mut PropertyList {
        &mut self.properties
    }

    pub(crate) fn set_properties(&mut self, properties: PropertyList) {
        self.properties = properties;
    }

    /// Kind-specific data
    #[must_use]
    pub const fn data(&self) -> &NodeData {
        &self.data
    }

    /// Replace the kind-specific data
    pub fn set_data(&mut self, data: NodeData) {
        self.data = data;
    }

    /// Resolved mesh
    #[must_use]
    pub const fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Resolved material
    #[must_use]
    pub const fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    /// Slot in the per-frame entity table
    #[must_use]
    pub const fn entity_offset(&self) -> Option<u32> {
        self.entity_offset
    }

    /// Lifecycle state
    #[must_use]
    pub const fn state(&self) -> NodeState {
        self.state
    }

    /// Whether resources are resolved
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state == NodeState::Initialized
    }

    pub(crate) fn set_material(&mut self, material: Option<Arc<Material>>) {
        self.material = material;
    }

    pub(crate) fn mark_initialized(&mut self, mesh: Option<Arc<Mesh>>, material: Option<Arc<Material>>) {
        if mesh.is_some() {
            self.mesh = mesh;
        }
        if material.is_some() {
            self.material = material;
        }
        self.state = NodeState::Initialized;
    }

    pub(crate) fn mark_failed(&mut self) {
        self.mesh = None;
        self.state = NodeState::Failed;
    }

    pub(crate) fn assign_entity_offset(&mut self, offset: u32) {
        self.entity_offset = Some(offset);
    }

    /// Release resources; returns `false` if the node was already shut down
    pub(crate) fn release(&mut self) -> bool {
        if self.state == NodeState::ShutDown {
            return false;
        }
        self.mesh = None;
        self.material = None;
        self.entity_offset = None;
        self.state = NodeState::ShutDown;
        true
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.class_type.map_or("unresolved", ClassType::name);
        write!(f, "{class}#{}", self.id)?;
        if let Some(name) = &self.name {
            write!(f, " '{name}'")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_unresolved() {
        let node = Node::new(3);
        assert_eq!(node.id(), 3);
        assert_eq!(node.class_type(), None);
        assert!(!node.has(Capabilities::empty().union(Capabilities::DRAWABLE)));
        assert_eq!(node.state(), NodeState::Created);
        assert_eq!(*node.transform(), Mat4::identity());
        assert_eq!(node.to_string(), "unresolved#3");
    }

    #[test]
    fn test_display_with_name() {
        let mut node = Node::new(1);
        node.set_class_type(ClassType::Bsdf);
        node.set_name(Some("gold".into()));
        assert_eq!(node.to_string(), "bsdf#1 'gold'");
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut node = Node::new(0);
        node.assign_entity_offset(4);
        assert!(node.release());
        assert_eq!(node.entity_offset(), None);
        assert!(!node.release());
        assert_eq!(node.state(), NodeState::ShutDown);
    }
}
