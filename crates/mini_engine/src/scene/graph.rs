//! Scene graph
//!
//! Nodes are stored in an arena and addressed by [`NodeId`]. Children are
//! owned through the arena; the parent link is a plain handle, so removing a
//! node turns every handle to it into "no node" instead of a dangling
//! reference.
//!
//! The graph borrows the [`Runtime`] it was built against. Resources are
//! only touched by [`SceneGraph::initialize`] and [`SceneGraph::shutdown`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::class_type::{Capabilities, ClassType};
use super::error::{GraphError, InitializeError, ResourceResolutionFailure};
use super::node::Node;
use crate::foundation::collections::{NodeArena, NodeId};
use crate::foundation::math::Mat4;
use crate::render::{CommandBuffer, DrawCall, Frame};
use crate::resources::{Material, MaterialParams, Mesh, ResourceError, Runtime};

/// Mesh property naming the BSDF to use when the mesh has no BSDF child
const MATERIAL_PROPERTY: &str = "material";

/// Materials of the BSDF nodes that carry a name, by name
type NamedMaterials = HashMap<String, Arc<Material>>;

/// Tree of scene nodes
#[derive(Debug)]
pub struct SceneGraph<'rt> {
    runtime: &'rt Runtime,
    nodes: NodeArena<Node>,
    root: Option<NodeId>,
    next_id: u32,
    next_entity_offset: u32,
}

impl<'rt> SceneGraph<'rt> {
    /// Empty graph bound to `runtime`
    #[must_use]
    pub fn new(runtime: &'rt Runtime) -> Self {
        Self {
            runtime,
            nodes: NodeArena::with_key(),
            root: None,
            next_id: 0,
            next_entity_offset: 0,
        }
    }

    /// Runtime this graph resolves resources through
    #[must_use]
    pub const fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }

    /// Create a detached node with an unresolved class type
    pub fn create_node(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(Node::new(id))
    }

    /// Create a detached node of class `class_type`
    pub fn create_node_of(&mut self, class_type: ClassType) -> NodeId {
        let handle = self.create_node();
        self.nodes[handle].set_class_type(class_type);
        handle
    }

    /// Make `node` the root of the graph
    ///
    /// # Errors
    /// [`GraphError::StaleNode`] if `node` does not exist,
    /// [`GraphError::AlreadyParented`] if it is some node's child.
    pub fn set_root(&mut self, node: NodeId) -> Result<(), GraphError> {
        if let Some(parent) = self.parent(node) {
            return Err(GraphError::AlreadyParented { child: node, parent });
        }
        self.node(node).ok_or(GraphError::StaleNode(node))?;
        self.root = Some(node);
        Ok(())
    }

    /// Root node, if one was set
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Node behind `handle`
    #[must_use]
    pub fn node(&self, handle: NodeId) -> Option<&Node> {
        self.nodes.get(handle)
    }

    /// Mutable node behind `handle`
    pub fn node_mut(&mut self, handle: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Whether `handle` names a live node
    #[must_use]
    pub fn contains(&self, handle: NodeId) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Number of live nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent of `handle`; `None` for the root, detached nodes and stale handles
    #[must_use]
    pub fn parent(&self, handle: NodeId) -> Option<NodeId> {
        self.nodes
            .get(handle)?
            .parent_handle()
            .filter(|&parent| self.nodes.contains_key(parent))
    }

    /// Children of `handle` in traversal order; empty for stale handles
    #[must_use]
    pub fn children(&self, handle: NodeId) -> &[NodeId] {
        self.nodes.get(handle).map_or(&[][..], Node::children)
    }

    /// `start` and everything below it, in pre-order (document order)
    #[must_use]
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            order.push(handle);
            stack.extend(node.children().iter().rev());
        }
        order
    }

    /// Every live node, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// First node in document order whose name is `name`
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let root = self.root?;
        self.descendants(root)
            .into_iter()
            .find(|&handle| self.nodes[handle].name() == Some(name))
    }

    /// First camera in document order
    #[must_use]
    pub fn active_camera(&self) -> Option<NodeId> {
        let root = self.root?;
        self.descendants(root)
            .into_iter()
            .find(|&handle| self.nodes[handle].class_type() == Some(ClassType::Camera))
    }

    /// Local-to-world matrix of `handle`
    #[must_use]
    pub fn world_transform(&self, handle: NodeId) -> Option<Mat4> {
        let mut world = *self.nodes.get(handle)?.transform();
        let mut current = self.parent(handle);
        while let Some(parent) = current {
            world = self.nodes[parent].transform() * world;
            current = self.parent(parent);
        }
        Some(world)
    }

    /// Attach `child` as the last child of `parent`
    ///
    /// Both links are written or neither is. A child whose back-reference
    /// already points at `parent` through [`set_parent`](Self::set_parent)
    /// is appended once.
    ///
    /// # Errors
    /// [`GraphError`] for stale handles, a child that already has a parent,
    /// or a link that would make a node its own ancestor.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.check_link(parent, child)?;
        if self.parent(child) == Some(parent) && self.nodes[parent].children().contains(&child) {
            return Err(GraphError::AlreadyParented { child, parent });
        }

        self.nodes[parent].push_child(child);
        self.nodes[child].set_parent_handle(Some(parent));
        Ok(())
    }

    /// Record `parent` as the parent of `child` without touching any child list
    ///
    /// # Errors
    /// [`GraphError::StaleNode`] if either handle does not name a live node,
    /// [`GraphError::AlreadyParented`] if `child` has another parent,
    /// [`GraphError::CycleDetected`] if `child` is `parent` or one of its ancestors.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
        self.check_link(parent, child)?;
        self.nodes[child].set_parent_handle(Some(parent));
        Ok(())
    }

    /// Whether `child` may be linked under `parent`; re-linking to the same parent is allowed
    fn check_link(&self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        if !self.contains(parent) {
            return Err(GraphError::StaleNode(parent));
        }
        if !self.contains(child) {
            return Err(GraphError::StaleNode(child));
        }
        match self.parent(child) {
            Some(existing) if existing != parent => {
                return Err(GraphError::AlreadyParented { child, parent: existing });
            }
            _ => {}
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(GraphError::CycleDetected { parent, child });
        }
        Ok(())
    }

    /// Remove `handle` and all of its descendants
    ///
    /// Returns the number of nodes removed.
    ///
    /// # Errors
    /// [`GraphError::StaleNode`] if `handle` does not exist.
    pub fn remove_subtree(&mut self, handle: NodeId) -> Result<usize, GraphError> {
        if !self.contains(handle) {
            return Err(GraphError::StaleNode(handle));
        }
        if let Some(parent) = self.parent(handle) {
            self.nodes[parent].remove_child(handle);
        }
        if self.root == Some(handle) {
            self.root = None;
        }

        let doomed = self.descendants(handle);
        for &node in &doomed {
            self.nodes.remove(node);
        }
        log::debug!("Removed {} node(s)", doomed.len());
        Ok(doomed.len())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut handle: NodeId) -> bool {
        loop {
            if handle == ancestor {
                return true;
            }
            match self.parent(handle) {
                Some(parent) => handle = parent,
                None => return false,
            }
        }
    }

    /// Initialize the whole tree
    ///
    /// # Errors
    /// [`InitializeError`] listing every node that failed; all other nodes
    /// are initialized.
    pub fn initialize(&mut self) -> Result<(), InitializeError> {
        match self.root {
            Some(root) => self.initialize_node(root),
            None => Ok(()),
        }
    }

    /// Initialize `handle` and its subtree
    ///
    /// Meshes are resolved through the runtime. Each mesh takes its material
    /// from its first BSDF child, else from the BSDF named by its `material`
    /// property, else the runtime's default material. Every node that
    /// occupies an entity table slot gets a fresh offset. Nodes that are
    /// already initialized are left alone, and one node failing does not stop
    /// its siblings.
    ///
    /// # Errors
    /// [`InitializeError`] listing every node that failed.
    pub fn initialize_node(&mut self, handle: NodeId) -> Result<(), InitializeError> {
        let order = self.descendants(handle);
        let materials = self.prepare_materials(&order);

        let mut failures = Vec::new();
        let mut initialized = 0_usize;
        for &node in &order {
            if self.nodes[node].is_initialized() {
                continue;
            }
            match self.resolve_resources(node, &materials) {
                Ok((mesh, material)) => {
                    let occupies_slot = self.nodes[node].has(Capabilities::OCCUPIES_SLOT);
                    let offset = occupies_slot.then(|| self.take_entity_offset());

                    let entry = &mut self.nodes[node];
                    entry.mark_initialized(mesh, material);
                    if let Some(offset) = offset {
                        entry.assign_entity_offset(offset);
                    }
                    initialized += 1;
                }
                Err(source) => {
                    let entry = &mut self.nodes[node];
                    log::warn!("Failed to initialize {entry}: {source}");
                    entry.mark_failed();
                    failures.push(ResourceResolutionFailure {
                        node,
                        id: entry.id(),
                        class_type: entry.class_type(),
                        source,
                    });
                }
            }
        }

        log::info!("Initialized {initialized} node(s), {} failure(s)", failures.len());
        if failures.is_empty() {
            Ok(())
        } else {
            Err(InitializeError { failures })
        }
    }

    /// Give every BSDF in the graph and in `order` a material and collect the named ones
    fn prepare_materials(&mut self, order: &[NodeId]) -> NamedMaterials {
        let mut bsdfs: Vec<NodeId> = self.root.map(|root| self.descendants(root)).unwrap_or_default();
        let seen: HashSet<NodeId> = bsdfs.iter().copied().collect();
        bsdfs.extend(order.iter().copied().filter(|node| !seen.contains(node)));
        bsdfs.retain(|&node| self.nodes[node].has(Capabilities::PROVIDES_MATERIAL));

        let mut named = NamedMaterials::new();
        for node in bsdfs {
            let entry = &mut self.nodes[node];
            let existing = entry.material().cloned();
            let material = match existing {
                Some(material) => material,
                None => {
                    let params = entry
                        .data()
                        .material_params()
                        .cloned()
                        .unwrap_or_else(|| MaterialParams::from_properties(entry.properties()));
                    let name = entry.name().map_or_else(|| format!("bsdf#{}", entry.id()), str::to_owned);
                    let material = Arc::new(Material::new(name, params));
                    entry.set_material(Some(Arc::clone(&material)));
                    material
                }
            };

            if let Some(name) = entry.name() {
                if named.contains_key(name) {
                    log::warn!("Duplicate BSDF name '{name}'; keeping the first definition");
                } else {
                    named.insert(name.to_owned(), material);
                }
            }
        }
        named
    }

    fn resolve_resources(
        &self,
        handle: NodeId,
        materials: &NamedMaterials,
    ) -> Result<(Option<Arc<Mesh>>, Option<Arc<Material>>), ResourceError> {
        let node = &self.nodes[handle];
        let class = node.class_type().ok_or(ResourceError::UnresolvedClassType)?;
        if !class.has(Capabilities::RESOLVES_MESH) {
            return Ok((None, None));
        }

        let source = node.data().mesh_source().ok_or(ResourceError::MissingMeshSource)?;
        let mesh = self.runtime.resolve_mesh(&source.path)?;
        let material = self.material_for(node, materials)?;
        Ok((Some(mesh), Some(material)))
    }

    fn material_for(&self, node: &Node, materials: &NamedMaterials) -> Result<Arc<Material>, ResourceError> {
        let from_child = node
            .children()
            .iter()
            .filter_map(|&child| self.nodes.get(child))
            .filter(|child| child.has(Capabilities::PROVIDES_MATERIAL))
            .find_map(Node::material);
        if let Some(material) = from_child {
            return Ok(Arc::clone(material));
        }

        if !node.properties().has_property(MATERIAL_PROPERTY) {
            return Ok(self.runtime.default_material());
        }
        let name = node
            .properties()
            .get_str(MATERIAL_PROPERTY)
            .map_err(|_| ResourceError::InvalidMaterialReference)?;
        materials
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::UnknownMaterial(name.to_owned()))
    }

    fn take_entity_offset(&mut self) -> u32 {
        let offset = self.next_entity_offset;
        self.next_entity_offset += 1;
        offset
    }

    /// Number of nodes currently holding an entity table slot
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.nodes.values().filter(|node| node.entity_offset().is_some()).count()
    }

    /// Release the resources of the whole tree
    ///
    /// Returns the number of nodes that were released; nodes already shut
    /// down are skipped.
    pub fn shutdown(&mut self) -> usize {
        self.root.map_or(0, |root| self.shutdown_node(root))
    }

    /// Release the resources of `handle` and its subtree, children first
    pub fn shutdown_node(&mut self, handle: NodeId) -> usize {
        let mut released = 0;
        for node in self.descendants(handle).into_iter().rev() {
            if self.nodes[node].release() {
                released += 1;
            }
        }

        if self.entity_count() == 0 {
            self.next_entity_offset = 0;
        }
        if released > 0 {
            log::debug!("Shut down {released} node(s)");
        }
        released
    }

    /// Issue draw calls for the tree, parents before children
    pub fn draw(&self, commands: &mut dyn CommandBuffer, frame: &Frame) {
        let Some(root) = self.root else {
            return;
        };

        let mut stack = vec![(root, Mat4::identity())];
        while let Some((handle, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            let world = parent_world * node.transform();

            if node.is_initialized() && node.has(Capabilities::DRAWABLE) {
                if let (Some(mesh), Some(material), Some(entity_offset)) =
                    (node.mesh(), node.material(), node.entity_offset())
                {
                    let call = DrawCall {
                        node: handle,
                        mesh: Arc::clone(mesh),
                        material: Arc::clone(material),
                        world,
                        entity_offset,
                    };
                    commands.draw_mesh(&call, frame);
                }
            }

            stack.extend(node.children().iter().rev().map(|&child| (child, world)));
        }
    }
}
