//! Scene construction
//!
//! Builds an in-memory scene description from a declarative document and
//! exposes it for per-frame traversal.
//!
//! ## Architecture
//!
//! ```text
//! scene file (XML / RON)
//!      ↓
//! Document          (parsed elements, attributes, positions)
//!      ↓
//! SceneLoader       (class lookup, property binding, linking)
//!      ↓
//! SceneGraph        (node arena; initialize / draw / shutdown)
//! ```
//!
//! Every node carries a [`ClassType`] tag, a [`PropertyList`] with its
//! configuration and the [`NodeData`] resolved from it. Meshes and
//! materials are resolved through the [`Runtime`](crate::resources::Runtime)
//! when the graph is initialized.

mod class_type;
mod document;
mod error;
mod graph;
mod loader;
mod node;
mod node_data;
mod properties;

#[cfg(test)]
mod tests;

pub use crate::foundation::collections::NodeId;
pub use class_type::{class_type_name, Capabilities, ClassType, ClassTypeError};
pub use document::{Document, DocumentNode, TextPosition};
pub use error::{ElementInfo, GraphError, InitializeError, ResourceResolutionFailure, SceneLoadError};
pub use graph::SceneGraph;
pub use loader::{SceneLoader, TO_WORLD};
pub use node::{Node, NodeState};
pub use node_data::{
    CameraDesc, EmitterDesc, FilterDesc, IntegratorDesc, MediumDesc, MeshSource, NodeData, NodeDataError,
    PhaseFunctionDesc, SamplerDesc,
};
pub use properties::{PropertyError, PropertyKind, PropertyList, PropertyValue};
