//! Surface materials built from BSDF nodes

use crate::foundation::math::Vec3;
use crate::scene::PropertyList;

/// Scattering parameters read from a BSDF node's properties
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParams {
    /// Scattering model, e.g. `diffuse` or `microfacet`
    pub model: String,
    /// Diffuse reflectance
    pub albedo: Vec3,
    /// Surface roughness in `[0, 1]`
    pub roughness: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            model: "diffuse".to_string(),
            albedo: Vec3::new(0.5, 0.5, 0.5),
            roughness: 1.0,
        }
    }
}

impl MaterialParams {
    /// Read `model`, `albedo` and `roughness`, defaulting whatever is absent
    #[must_use]
    pub fn from_properties(props: &PropertyList) -> Self {
        let defaults = Self::default();
        Self {
            model: props.get_string_or("model", &defaults.model),
            albedo: props.get_color_or("albedo", defaults.albedo),
            roughness: props.get_float_or("roughness", defaults.roughness).clamp(0.0, 1.0),
        }
    }
}

/// A material shared by every mesh that references it
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    params: MaterialParams,
}

impl Material {
    /// Create a named material
    #[must_use]
    pub fn new(name: impl Into<String>, params: MaterialParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Material name (the BSDF's document id, or a generated one)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scattering parameters
    #[must_use]
    pub fn params(&self) -> &MaterialParams {
        &self.params
    }
}
