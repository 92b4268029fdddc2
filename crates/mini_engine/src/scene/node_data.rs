//! Kind-specific node data
//!
//! After a node's subtree is built, its property list is read once into a
//! typed description that matches its class type. Only the node's own
//! properties are consulted.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::class_type::ClassType;
use super::properties::{PropertyError, PropertyList};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::resources::MaterialParams;

/// Kind-specific data resolved from a node's properties
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeData {
    /// Nothing beyond the shared node fields
    #[default]
    None,
    /// Mesh file reference
    Mesh(MeshSource),
    /// Material parameters
    Bsdf(MaterialParams),
    /// Camera projection settings
    Camera(CameraDesc),
    /// Light source settings
    Emitter(EmitterDesc),
    /// Participating medium coefficients
    Medium(MediumDesc),
    /// Henyey-Greenstein phase function
    PhaseFunction(PhaseFunctionDesc),
    /// Integrator settings
    Integrator(IntegratorDesc),
    /// Sampler settings
    Sampler(SamplerDesc),
    /// Reconstruction filter settings
    ReconstructionFilter(FilterDesc),
}

/// Where a mesh node's geometry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshSource {
    /// `filename` exactly as written in the document
    pub filename: String,
    /// `filename` resolved against the asset root
    pub path: PathBuf,
}

/// Perspective camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDesc {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip distance
    pub near_clip: f32,
    /// Far clip distance
    pub far_clip: f32,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl CameraDesc {
    /// Width over height
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Projection matrix for this camera
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(
            utils::deg_to_rad(self.fov_degrees),
            self.aspect(),
            self.near_clip,
            self.far_clip,
        )
    }
}

/// Light source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterDesc {
    /// Emitted radiance
    pub radiance: Vec3,
}

/// Homogeneous medium
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediumDesc {
    /// Absorption coefficient
    pub sigma_a: Vec3,
    /// Scattering coefficient
    pub sigma_s: Vec3,
}

/// Phase function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseFunctionDesc {
    /// Mean cosine, `0` is isotropic
    pub g: f32,
}

/// Integrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegratorDesc {
    /// Maximum path depth
    pub max_depth: u32,
}

/// Sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    /// Samples per pixel
    pub sample_count: u32,
}

/// Reconstruction filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDesc {
    /// Filter radius in pixels
    pub radius: f32,
}

/// Node data could not be resolved from the properties
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeDataError {
    /// A required property is missing or has the wrong kind
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// A property has the right kind but an unusable value
    #[error("Property '{name}' {reason}")]
    InvalidValue {
        /// Property name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

impl NodeData {
    /// Resolve the data for a node of class `class` from its properties.
    ///
    /// Relative mesh filenames are resolved against `asset_root`.
    ///
    /// # Errors
    /// [`NodeDataError`] for missing required properties or unusable values.
    pub fn resolve(class: ClassType, props: &PropertyList, asset_root: &Path) -> Result<Self, NodeDataError> {
        let data = match class {
            ClassType::Scene | ClassType::Test => Self::None,
            ClassType::Mesh => {
                let filename = props.get_string("filename")?;
                if filename.is_empty() {
                    return Err(invalid("filename", "must not be empty"));
                }
                let path = asset_root.join(&filename);
                Self::Mesh(MeshSource { filename, path })
            }
            ClassType::Bsdf => Self::Bsdf(MaterialParams::from_properties(props)),
            ClassType::Camera => {
                let camera = CameraDesc {
                    fov_degrees: props.get_float_or("fov", 30.0),
                    near_clip: props.get_float_or("nearClip", 1e-4),
                    far_clip: props.get_float_or("farClip", 1e4),
                    width: positive(props, "width", 1280)?,
                    height: positive(props, "height", 720)?,
                };
                if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
                    return Err(invalid("fov", "must lie in (0, 180) degrees"));
                }
                if !(camera.near_clip > 0.0 && camera.near_clip < camera.far_clip) {
                    return Err(invalid("nearClip", "must be positive and below farClip"));
                }
                Self::Camera(camera)
            }
            ClassType::Emitter => Self::Emitter(EmitterDesc {
                radiance: props.get_color_or("radiance", Vec3::new(1.0, 1.0, 1.0)),
            }),
            ClassType::Medium => Self::Medium(MediumDesc {
                sigma_a: props.get_color_or("sigmaA", Vec3::zeros()),
                sigma_s: props.get_color_or("sigmaS", Vec3::zeros()),
            }),
            ClassType::PhaseFunction => {
                let g = props.get_float_or("g", 0.0);
                if !(-1.0 < g && g < 1.0) {
                    return Err(invalid("g", "must lie in (-1, 1)"));
                }
                Self::PhaseFunction(PhaseFunctionDesc { g })
            }
            ClassType::Integrator => Self::Integrator(IntegratorDesc {
                max_depth: positive(props, "maxDepth", 8)?,
            }),
            ClassType::Sampler => Self::Sampler(SamplerDesc {
                sample_count: positive(props, "sampleCount", 1)?,
            }),
            ClassType::ReconstructionFilter => {
                let radius = props.get_float_or("radius", 2.0);
                if radius <= 0.0 {
                    return Err(invalid("radius", "must be positive"));
                }
                Self::ReconstructionFilter(FilterDesc { radius })
            }
        };
        Ok(data)
    }

    /// Mesh source, for mesh nodes
    #[must_use]
    pub const fn mesh_source(&self) -> Option<&MeshSource> {
        match self {
            Self::Mesh(source) => Some(source),
            _ => None,
        }
    }

    /// Camera settings, for camera nodes
    #[must_use]
    pub const fn camera(&self) -> Option<&CameraDesc> {
        match self {
            Self::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Material parameters, for BSDF nodes
    #[must_use]
    pub const fn material_params(&self) -> Option<&MaterialParams> {
        match self {
            Self::Bsdf(params) => Some(params),
            _ => None,
        }
    }
}

fn invalid(name: &str, reason: &str) -> NodeDataError {
    NodeDataError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(props: &PropertyList, name: &str, default: u32) -> Result<u32, NodeDataError> {
    let value = props.get_integer_or(name, i32::try_from(default).unwrap_or(i32::MAX));
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| invalid(name, "must be a positive integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::properties::PropertyKind;

    #[test]
    fn test_mesh_requires_filename() {
        let err = NodeData::resolve(ClassType::Mesh, &PropertyList::new(), Path::new("")).unwrap_err();
        assert_eq!(
            err,
            NodeDataError::Property(PropertyError::NotFoundOrWrongKind {
                name: "filename".into(),
                expected: PropertyKind::String,
            })
        );
    }

    #[test]
    fn test_mesh_path_is_resolved_against_root() {
        let mut props = PropertyList::new();
        props.set_string("filename", "meshes/bunny.obj");

        let data = NodeData::resolve(ClassType::Mesh, &props, Path::new("/scenes")).unwrap();
        let source = data.mesh_source().unwrap();
        assert_eq!(source.filename, "meshes/bunny.obj");
        assert_eq!(source.path, Path::new("/scenes/meshes/bunny.obj"));
    }

    #[test]
    fn test_camera_defaults_and_validation() {
        let mut props = PropertyList::new();
        props.set_integer("width", 800);
        props.set_integer("height", 400);

        let data = NodeData::resolve(ClassType::Camera, &props, Path::new("")).unwrap();
        let camera = data.camera().unwrap();
        assert_eq!(camera.fov_degrees, 30.0);
        assert_eq!(camera.aspect(), 2.0);

        props.set_integer("height", 0);
        assert!(matches!(
            NodeData::resolve(ClassType::Camera, &props, Path::new("")),
            Err(NodeDataError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_mistyped_optional_setting_uses_default() {
        let mut props = PropertyList::new();
        props.set_float("sampleCount", 16.0);

        // Optional settings fall back to their default when mistyped.
        let data = NodeData::resolve(ClassType::Sampler, &props, Path::new("")).unwrap();
        assert_eq!(data, NodeData::Sampler(SamplerDesc { sample_count: 1 }));
    }

    #[test]
    fn test_phase_function_range() {
        let mut props = PropertyList::new();
        props.set_float("g", 1.5);
        assert!(NodeData::resolve(ClassType::PhaseFunction, &props, Path::new("")).is_err());
    }

    #[test]
    fn test_container_kinds_have_no_data() {
        assert_eq!(NodeData::resolve(ClassType::Scene, &PropertyList::new(), Path::new("")), Ok(NodeData::None));
        assert_eq!(NodeData::resolve(ClassType::Test, &PropertyList::new(), Path::new("")), Ok(NodeData::None));
    }
}
