//! Scene builder
//!
//! Turns a [`Document`] into a fully linked [`SceneGraph`]. Each node
//! element names its class through the `type` attribute; typed property
//! entries (`<float name=".." value=".."/>` and friends) configure the node
//! they are nested in; every other nested element is a child node.
//!
//! The build either produces the whole tree or an error naming the
//! offending element. A partially built graph never reaches the caller.
//!
//! ```xml
//! <scene type="scene">
//!     <camera type="camera">
//!         <float name="fov" value="45"/>
//!         <transform name="toWorld">
//!             <lookat origin="0, 1, 5" target="0, 0, 0"/>
//!         </transform>
//!     </camera>
//!     <mesh type="mesh" filename="bunny.obj">
//!         <bsdf type="bsdf" id="gold">
//!             <color name="albedo" value="1.0 0.8 0.3"/>
//!         </bsdf>
//!     </mesh>
//! </scene>
//! ```

use std::path::{Path, PathBuf};

use super::class_type::ClassType;
use super::document::{Document, DocumentNode};
use super::error::{ElementInfo, SceneLoadError};
use super::graph::SceneGraph;
use super::node::Node;
use super::node_data::{NodeData, NodeDataError};
use super::properties::{parse_floats, PropertyKind, PropertyList, PropertyValue};
use crate::config::LoaderConfig;
use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::resources::Runtime;

/// Property holding a node's local-to-parent transform
pub const TO_WORLD: &str = "toWorld";

/// Property entry tag to the kind it binds
fn property_kind(tag: &str) -> Option<PropertyKind> {
    match tag {
        "string" => Some(PropertyKind::String),
        "float" => Some(PropertyKind::Float),
        "integer" => Some(PropertyKind::Integer),
        "boolean" => Some(PropertyKind::Boolean),
        "vector" | "color" | "point" => Some(PropertyKind::Vector),
        "transform" => Some(PropertyKind::Transform),
        _ => None,
    }
}

/// Builds scene graphs from scene documents
#[derive(Debug, Clone, Default)]
pub struct SceneLoader {
    config: LoaderConfig,
}

impl SceneLoader {
    /// Loader with the given settings
    #[must_use]
    pub const fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Current settings
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a scene file, picking the format from the extension (`.xml` or `.ron`)
    ///
    /// # Errors
    /// [`SceneLoadError::UnsupportedFormat`] for other extensions, otherwise
    /// as [`load_from_xml`](Self::load_from_xml).
    pub fn load_from_file<'rt>(
        &self,
        runtime: &'rt Runtime,
        path: impl AsRef<Path>,
    ) -> Result<SceneGraph<'rt>, SceneLoadError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("xml") => self.load_from_xml(runtime, path),
            Some("ron") => {
                let text = read_scene(path)?;
                let document = Document::from_ron_str(&text)?;
                self.build_with_root(runtime, &document, &self.asset_root_for(Some(path)))
            }
            _ => Err(SceneLoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Load an XML scene file
    ///
    /// Relative mesh filenames are resolved against the configured asset
    /// root, or else against the directory holding the scene file.
    ///
    /// # Errors
    /// [`SceneLoadError`] describing the first problem found.
    pub fn load_from_xml<'rt>(
        &self,
        runtime: &'rt Runtime,
        path: impl AsRef<Path>,
    ) -> Result<SceneGraph<'rt>, SceneLoadError> {
        let path = path.as_ref();
        log::info!("Loading scene {}", path.display());
        let text = read_scene(path)?;
        let document = Document::from_xml_str(&text)?;
        self.build_with_root(runtime, &document, &self.asset_root_for(Some(path)))
    }

    /// Build a scene from XML text
    ///
    /// # Errors
    /// [`SceneLoadError`] describing the first problem found.
    pub fn load_from_xml_str<'rt>(&self, runtime: &'rt Runtime, text: &str) -> Result<SceneGraph<'rt>, SceneLoadError> {
        let document = Document::from_xml_str(text)?;
        self.build(runtime, &document)
    }

    /// Build a scene from RON text
    ///
    /// # Errors
    /// [`SceneLoadError`] describing the first problem found.
    pub fn load_from_ron_str<'rt>(&self, runtime: &'rt Runtime, text: &str) -> Result<SceneGraph<'rt>, SceneLoadError> {
        let document = Document::from_ron_str(text)?;
        self.build(runtime, &document)
    }

    /// Build a scene from an already parsed document
    ///
    /// # Errors
    /// [`SceneLoadError`] describing the first problem found.
    pub fn build<'rt>(&self, runtime: &'rt Runtime, document: &Document) -> Result<SceneGraph<'rt>, SceneLoadError> {
        self.build_with_root(runtime, document, &self.asset_root_for(None))
    }

    fn asset_root_for(&self, scene_file: Option<&Path>) -> PathBuf {
        if let Some(root) = &self.config.asset_root {
            return root.clone();
        }
        scene_file
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn build_with_root<'rt>(
        &self,
        runtime: &'rt Runtime,
        document: &Document,
        asset_root: &Path,
    ) -> Result<SceneGraph<'rt>, SceneLoadError> {
        let root_element = Self::scene_element(document)?;

        let mut graph = SceneGraph::new(runtime);
        let build = Build {
            config: &self.config,
            asset_root,
        };
        let root = build.element(&mut graph, root_element, None, 0)?;
        graph.set_root(root).map_err(|source| SceneLoadError::Graph {
            element: ElementInfo::of(root_element, Some(0)),
            source,
        })?;
        log::info!("Built scene with {} node(s)", graph.len());

        if self.config.initialize_on_load {
            graph.initialize()?;
        }
        Ok(graph)
    }

    /// The single top-level element, which must be a scene
    fn scene_element(document: &Document) -> Result<&DocumentNode, SceneLoadError> {
        let root = match document.elements.as_slice() {
            [root] => root,
            [] => {
                return Err(SceneLoadError::MissingRequiredElement {
                    element: None,
                    reason: "the document contains no scene element".to_string(),
                })
            }
            [_, second, ..] => {
                return Err(SceneLoadError::MissingRequiredElement {
                    element: Some(ElementInfo::of(second, None)),
                    reason: format!(
                        "expected exactly one top-level scene element, found {}",
                        document.elements.len()
                    ),
                })
            }
        };

        let class = resolve_class(root, None)?;
        if class != ClassType::Scene {
            return Err(SceneLoadError::MissingRequiredElement {
                element: Some(ElementInfo::of(root, None)),
                reason: format!("the top-level element must be a scene, not a {class}"),
            });
        }
        Ok(root)
    }
}

fn read_scene(path: &Path) -> Result<String, SceneLoadError> {
    std::fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_class(element: &DocumentNode, parent_id: Option<u32>) -> Result<ClassType, SceneLoadError> {
    let name = element
        .attribute("type")
        .ok_or_else(|| SceneLoadError::MissingAttribute {
            element: ElementInfo::of(element, None).inside(parent_id),
            attribute: "type",
        })?;
    ClassType::from_name(name).map_err(|_| SceneLoadError::UnknownClassTypeName {
        element: ElementInfo::of(element, None).inside(parent_id),
        name: name.to_owned(),
    })
}

/// State of one build
struct Build<'a> {
    config: &'a LoaderConfig,
    asset_root: &'a Path,
}

impl Build<'_> {
    /// Build `element` and its subtree, returning the new node
    ///
    /// `parent` is the class and document id of the enclosing node.
    fn element(
        &self,
        graph: &mut SceneGraph<'_>,
        element: &DocumentNode,
        parent: Option<(ClassType, u32)>,
        depth: usize,
    ) -> Result<NodeId, SceneLoadError> {
        let parent_id = parent.map(|(_, id)| id);
        if depth > self.config.max_depth {
            return Err(SceneLoadError::MalformedStructure {
                element: ElementInfo::of(element, None).inside(parent_id),
                reason: format!("nesting exceeds the maximum depth of {}", self.config.max_depth),
            });
        }

        let class = resolve_class(element, parent_id)?;
        if let Some((parent_class, _)) = parent {
            if !parent_class.accepts_child(class) {
                return Err(SceneLoadError::MalformedStructure {
                    element: ElementInfo::of(element, None).inside(parent_id),
                    reason: format!("a {parent_class} node cannot contain a {class} node"),
                });
            }
        }

        let handle = graph.create_node_of(class);
        let id = graph.node(handle).map_or(0, Node::id);
        let info = ElementInfo::of(element, Some(id)).inside(parent_id);
        log::debug!("Building {info}");

        let mut props = PropertyList::new();
        for (key, value) in &element.attributes {
            if key != "type" && key != "id" {
                props.set_string(key.as_str(), value.as_str());
            }
        }

        for child in &element.children {
            if let Some(kind) = property_kind(&child.tag) {
                self.bind_property(&mut props, child, kind, &info)?;
            } else {
                let child_handle = self.element(graph, child, Some((class, id)), depth + 1)?;
                graph
                    .add_child(handle, child_handle)
                    .map_err(|source| SceneLoadError::Graph {
                        element: info.clone(),
                        source,
                    })?;
            }
        }

        let transform = if props.has_property(TO_WORLD) {
            props.get_transform(TO_WORLD).map_err(|source| SceneLoadError::Property {
                element: info.clone(),
                source,
            })?
        } else {
            Mat4::identity()
        };
        let data = NodeData::resolve(class, &props, self.asset_root).map_err(|err| match err {
            NodeDataError::Property(source) => SceneLoadError::Property {
                element: info.clone(),
                source,
            },
            NodeDataError::InvalidValue { name, reason } => SceneLoadError::InvalidValue {
                element: info.clone(),
                name,
                reason,
            },
        })?;

        if let Some(node) = graph.node_mut(handle) {
            node.set_name(element.attribute("id").map(str::to_owned));
            node.set_transform(transform);
            node.set_data(data);
            node.set_properties(props);
        }
        Ok(handle)
    }

    /// Bind one typed property entry into `props`
    fn bind_property(
        &self,
        props: &mut PropertyList,
        entry: &DocumentNode,
        kind: PropertyKind,
        owner: &ElementInfo,
    ) -> Result<(), SceneLoadError> {
        let info = ElementInfo::of(entry, owner.node_id);
        if self.config.strict_attributes {
            if let Some(extra) = entry.attributes.keys().find(|key| !matches!(key.as_str(), "name" | "value")) {
                return Err(SceneLoadError::MalformedStructure {
                    element: info,
                    reason: format!("unexpected attribute '{extra}'"),
                });
            }
        }

        let name = entry.attribute("name").ok_or_else(|| SceneLoadError::MissingAttribute {
            element: info.clone(),
            attribute: "name",
        })?;

        let value = if kind == PropertyKind::Transform {
            PropertyValue::Transform(transform_entry(entry, name, &info)?)
        } else {
            let text = entry.attribute("value").ok_or_else(|| SceneLoadError::MissingAttribute {
                element: info.clone(),
                attribute: "value",
            })?;
            PropertyValue::parse(kind, text).ok_or_else(|| SceneLoadError::MalformedPropertyValue {
                element: info.clone(),
                name: name.to_owned(),
                kind,
                value: text.to_owned(),
            })?
        };

        if props.set(name, value).is_some() {
            log::warn!("Property '{name}' set twice in {owner}; the last value wins");
        }
        Ok(())
    }
}

/// Compose the operations nested in a `transform` entry, in document order
///
/// Each operation is applied after the ones before it. An optional `value`
/// attribute holding a full matrix is the starting point.
fn transform_entry(entry: &DocumentNode, name: &str, info: &ElementInfo) -> Result<Mat4, SceneLoadError> {
    let mut transform = match entry.attribute("value") {
        Some(text) => matrix(text, name, info)?,
        None => Mat4::identity(),
    };

    for op in &entry.children {
        let op_info = ElementInfo::of(op, info.node_id);
        let step = match op.tag.as_str() {
            "translate" => Mat4::translation_by(vector_operand(op, name, &op_info, 0.0)?),
            "scale" => {
                let uniform = op.attribute("value").and_then(|text| text.trim().parse::<f32>().ok());
                let factors = match uniform {
                    Some(s) => Vec3::new(s, s, s),
                    None => vector_operand(op, name, &op_info, 1.0)?,
                };
                Mat4::scaling_by(factors)
            }
            "rotate" => {
                let axis = required(vector_attr(op, "axis", name, &op_info)?, "axis", &op_info)?;
                let angle = required(float_attr(op, "angle", name, &op_info)?, "angle", &op_info)?;
                Mat4::rotation_degrees(axis, angle).ok_or_else(|| SceneLoadError::InvalidValue {
                    element: op_info.clone(),
                    name: name.to_owned(),
                    reason: "rotation axis must not be zero".to_string(),
                })?
            }
            "matrix" => {
                let text = required(op.attribute("value"), "value", &op_info)?;
                matrix(text, name, &op_info)?
            }
            "lookat" => {
                let origin = required(vector_attr(op, "origin", name, &op_info)?, "origin", &op_info)?;
                let target = required(vector_attr(op, "target", name, &op_info)?, "target", &op_info)?;
                let up = vector_attr(op, "up", name, &op_info)?.unwrap_or_else(|| Vec3::new(0.0, 1.0, 0.0));
                Mat4::look_at_to_world(origin, target, up).ok_or_else(|| SceneLoadError::InvalidValue {
                    element: op_info.clone(),
                    name: name.to_owned(),
                    reason: "origin, target and up do not define a view".to_string(),
                })?
            }
            other => {
                return Err(SceneLoadError::MalformedStructure {
                    element: op_info,
                    reason: format!("unknown transform operation '{other}'"),
                })
            }
        };
        transform = step * transform;
    }
    Ok(transform)
}

fn required<T>(value: Option<T>, attribute: &'static str, info: &ElementInfo) -> Result<T, SceneLoadError> {
    value.ok_or_else(|| SceneLoadError::MissingAttribute {
        element: info.clone(),
        attribute,
    })
}

fn matrix(text: &str, name: &str, info: &ElementInfo) -> Result<Mat4, SceneLoadError> {
    parse_floats::<16>(text)
        .map(|values| Mat4::from_row_slice(&values))
        .ok_or_else(|| malformed(info, name, PropertyKind::Transform, text))
}

/// `value` as a vector, or the `x`/`y`/`z` attributes with `default` for each missing one
fn vector_operand(op: &DocumentNode, name: &str, info: &ElementInfo, default: f32) -> Result<Vec3, SceneLoadError> {
    if let Some(vector) = vector_attr(op, "value", name, info)? {
        return Ok(vector);
    }
    Ok(Vec3::new(
        float_attr(op, "x", name, info)?.unwrap_or(default),
        float_attr(op, "y", name, info)?.unwrap_or(default),
        float_attr(op, "z", name, info)?.unwrap_or(default),
    ))
}

fn vector_attr(op: &DocumentNode, attribute: &str, name: &str, info: &ElementInfo) -> Result<Option<Vec3>, SceneLoadError> {
    op.attribute(attribute)
        .map(|text| {
            parse_floats::<3>(text)
                .map(Vec3::from)
                .ok_or_else(|| malformed(info, name, PropertyKind::Vector, text))
        })
        .transpose()
}

fn float_attr(op: &DocumentNode, attribute: &str, name: &str, info: &ElementInfo) -> Result<Option<f32>, SceneLoadError> {
    op.attribute(attribute)
        .map(|text| {
            text.trim()
                .parse::<f32>()
                .map_err(|_| malformed(info, name, PropertyKind::Float, text))
        })
        .transpose()
}

fn malformed(info: &ElementInfo, name: &str, kind: PropertyKind, text: &str) -> SceneLoadError {
    SceneLoadError::MalformedPropertyValue {
        element: info.clone(),
        name: name.to_owned(),
        kind,
        value: text.to_owned(),
    }
}
