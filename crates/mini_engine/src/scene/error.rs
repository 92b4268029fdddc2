//! Scene errors

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::class_type::ClassType;
use super::document::{DocumentNode, TextPosition};
use super::properties::{PropertyError, PropertyKind};
use crate::foundation::collections::NodeId;
use crate::resources::ResourceError;

/// Identity of a document element, attached to every build error
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementInfo {
    /// Element tag
    pub tag: String,
    /// Raw `type` attribute, if any
    pub type_name: Option<String>,
    /// Document id of the node the element created or belongs to
    pub node_id: Option<u32>,
    /// Document id of the enclosing node, for elements rejected before they became a node
    pub parent_id: Option<u32>,
    /// Location in the source text, when parsed from XML
    pub position: Option<TextPosition>,
}

impl ElementInfo {
    /// Describe `element`
    #[must_use]
    pub fn of(element: &DocumentNode, node_id: Option<u32>) -> Self {
        Self {
            tag: element.tag.clone(),
            type_name: element.attribute("type").map(str::to_owned),
            node_id,
            parent_id: None,
            position: element.position,
        }
    }

    /// Same element, nested in the node with document id `parent_id`
    #[must_use]
    pub const fn inside(mut self, parent_id: Option<u32>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

impl fmt::Display for ElementInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        if let Some(type_name) = &self.type_name {
            write!(f, " type=\"{type_name}\"")?;
        }
        f.write_str(">")?;
        match (self.node_id, self.parent_id) {
            (Some(id), _) => write!(f, " (node {id})")?,
            (None, Some(parent)) => write!(f, " (inside node {parent})")?,
            (None, None) => {}
        }
        if let Some(position) = self.position {
            write!(f, " at {position}")?;
        }
        Ok(())
    }
}

fn at(element: &Option<ElementInfo>) -> String {
    element.as_ref().map(|e| format!(" ({e})")).unwrap_or_default()
}

/// Structural edit of a [`SceneGraph`](super::SceneGraph) rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Handle does not name a live node
    #[error("Node {0:?} does not exist")]
    StaleNode(NodeId),

    /// The child is already owned by another node
    #[error("Node {child:?} already has parent {parent:?}")]
    AlreadyParented {
        /// Child being attached
        child: NodeId,
        /// Its current parent
        parent: NodeId,
    },

    /// Linking would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Intended parent
        parent: NodeId,
        /// Intended child
        child: NodeId,
    },
}

/// One node failed to resolve its resources during initialization
#[derive(Error, Debug)]
#[error("{} node {id} failed to initialize: {source}", class_label(.class_type))]
pub struct ResourceResolutionFailure {
    /// Handle of the failing node
    pub node: NodeId,
    /// Document id of the failing node
    pub id: u32,
    /// Class type of the failing node
    pub class_type: Option<ClassType>,
    /// What went wrong
    pub source: ResourceError,
}

fn class_label(class_type: &Option<ClassType>) -> &'static str {
    class_type.map_or("unresolved", ClassType::name)
}

/// Initialization finished with failures
///
/// Nodes that did not fail are fully initialized.
#[derive(Error, Debug)]
#[error("{} node(s) failed to initialize; first: {}", .failures.len(), first_failure(.failures))]
pub struct InitializeError {
    /// Every per-node failure, in traversal order
    pub failures: Vec<ResourceResolutionFailure>,
}

fn first_failure(failures: &[ResourceResolutionFailure]) -> String {
    failures.first().map(ToString::to_string).unwrap_or_default()
}

/// Loading a scene document failed; no scene is produced
#[derive(Error, Debug)]
pub enum SceneLoadError {
    /// Scene file could not be read
    #[error("Failed to read scene '{}': {source}", path.display())]
    Io {
        /// Scene file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Scene text is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Scene text is not a valid RON document
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// File extension names no supported document format
    #[error("Unsupported scene format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// An element declares a type absent from the class registry
    #[error("Unknown class type '{name}' in {element}")]
    UnknownClassTypeName {
        /// Offending element
        element: ElementInfo,
        /// Declared type name
        name: String,
    },

    /// A property literal cannot be parsed as its declared kind
    #[error("Cannot parse '{value}' as {kind} for property '{name}' in {element}")]
    MalformedPropertyValue {
        /// Offending property entry
        element: ElementInfo,
        /// Property name
        name: String,
        /// Declared kind
        kind: PropertyKind,
        /// Literal text
        value: String,
    },

    /// A required attribute is absent
    #[error("Missing attribute '{attribute}' in {element}")]
    MissingAttribute {
        /// Offending element
        element: ElementInfo,
        /// Attribute name
        attribute: &'static str,
    },

    /// Zero or several scene roots, or a root of the wrong type
    #[error("Missing required element: {reason}{}", at(.element))]
    MissingRequiredElement {
        /// Offending element, if there is one to point at
        element: Option<ElementInfo>,
        /// What is missing
        reason: String,
    },

    /// Elements nested in a way the scene model does not allow
    #[error("Malformed structure in {element}: {reason}")]
    MalformedStructure {
        /// Offending element
        element: ElementInfo,
        /// What is wrong
        reason: String,
    },

    /// A required property is missing or has the wrong kind
    #[error("{source} in {element}")]
    Property {
        /// Offending element
        element: ElementInfo,
        /// Property failure
        source: PropertyError,
    },

    /// A property has the right kind but an unusable value
    #[error("Invalid property '{name}' in {element}: {reason}")]
    InvalidValue {
        /// Offending element
        element: ElementInfo,
        /// Property name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// A structural link was rejected
    #[error("{source} while building {element}")]
    Graph {
        /// Offending element
        element: ElementInfo,
        /// Graph failure
        source: GraphError,
    },

    /// The scene was built but resource initialization failed
    #[error(transparent)]
    Initialize(#[from] InitializeError),
}
