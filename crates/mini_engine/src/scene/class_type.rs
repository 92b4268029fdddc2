//! Class-type registry
//!
//! Every scene node carries one [`ClassType`] tag. The tag maps both ways to
//! the canonical lower-case name used by the `type` attribute of scene
//! documents, and to a [`Capabilities`] set that drives kind-specific
//! behavior (drawing, resource resolution, which children are accepted).

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use thiserror::Error;

/// Node class types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassType {
    /// Scene root
    Scene,
    /// Triangle mesh
    Mesh,
    /// Surface scattering model
    Bsdf,
    /// Volume phase function
    PhaseFunction,
    /// Light source
    Emitter,
    /// Participating medium
    Medium,
    /// Camera
    Camera,
    /// Light transport integrator
    Integrator,
    /// Sample generator
    Sampler,
    /// Test harness node
    Test,
    /// Image reconstruction filter
    ReconstructionFilter,
}

bitflags! {
    /// What a node of a given class type can do
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Issues a draw call when traversed
        const DRAWABLE = 1 << 0;
        /// Resolves a mesh resource during initialization
        const RESOLVES_MESH = 1 << 1;
        /// Produces a material for its parent or for named references
        const PROVIDES_MATERIAL = 1 << 2;
        /// Occupies a slot in the per-frame entity table
        const OCCUPIES_SLOT = 1 << 3;
        /// May hold arbitrary child nodes
        const CONTAINER = 1 << 4;
    }
}

/// Class registry lookup failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassTypeError {
    /// No class type is registered under this name
    #[error("Unknown class type name '{0}'")]
    UnknownName(String),

    /// Index past the end of the class type table
    #[error("Class type index {0} is out of range (0..{count})", count = ClassType::COUNT)]
    OutOfRange(usize),
}

impl ClassType {
    /// Every class type, in index order
    pub const ALL: [Self; 11] = [
        Self::Scene,
        Self::Mesh,
        Self::Bsdf,
        Self::PhaseFunction,
        Self::Emitter,
        Self::Medium,
        Self::Camera,
        Self::Integrator,
        Self::Sampler,
        Self::Test,
        Self::ReconstructionFilter,
    ];

    /// Number of class types
    pub const COUNT: usize = Self::ALL.len();

    /// Canonical document name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Mesh => "mesh",
            Self::Bsdf => "bsdf",
            Self::PhaseFunction => "phase",
            Self::Emitter => "emitter",
            Self::Medium => "medium",
            Self::Camera => "camera",
            Self::Integrator => "integrator",
            Self::Sampler => "sampler",
            Self::Test => "test",
            Self::ReconstructionFilter => "rfilter",
        }
    }

    /// Look a class type up by its canonical name (case-sensitive)
    ///
    /// # Errors
    /// [`ClassTypeError::UnknownName`] when no tag has that name.
    pub fn from_name(name: &str) -> Result<Self, ClassTypeError> {
        Self::ALL
            .into_iter()
            .find(|class| class.name() == name)
            .ok_or_else(|| ClassTypeError::UnknownName(name.to_owned()))
    }

    /// Stable index of this tag
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Tag at `index`
    ///
    /// # Errors
    /// [`ClassTypeError::OutOfRange`] for `index >= ClassType::COUNT`.
    pub fn from_index(index: usize) -> Result<Self, ClassTypeError> {
        Self::ALL.get(index).copied().ok_or(ClassTypeError::OutOfRange(index))
    }

    /// Capability set of this tag
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Scene | Self::Test => Capabilities::CONTAINER,
            Self::Mesh => Capabilities::DRAWABLE
                .union(Capabilities::RESOLVES_MESH)
                .union(Capabilities::OCCUPIES_SLOT),
            Self::Bsdf => Capabilities::PROVIDES_MATERIAL,
            Self::PhaseFunction
            | Self::Emitter
            | Self::Medium
            | Self::Camera
            | Self::Integrator
            | Self::Sampler
            | Self::ReconstructionFilter => Capabilities::empty(),
        }
    }

    /// Whether `self` has every capability in `caps`
    #[must_use]
    pub const fn has(self, caps: Capabilities) -> bool {
        self.capabilities().contains(caps)
    }

    /// Whether a node of this class may directly own a child of class `child`.
    ///
    /// A scene can never be nested.
    #[must_use]
    pub fn accepts_child(self, child: Self) -> bool {
        if child == Self::Scene {
            return false;
        }
        if self.has(Capabilities::CONTAINER) {
            return true;
        }
        match self {
            Self::Mesh => matches!(child, Self::Bsdf | Self::Emitter | Self::Medium),
            Self::Camera => matches!(child, Self::ReconstructionFilter | Self::Medium),
            Self::Medium => child == Self::PhaseFunction,
            _ => false,
        }
    }
}

/// Canonical name of the tag at `index`
///
/// # Errors
/// [`ClassTypeError::OutOfRange`] instead of reading past the tag set.
pub fn class_type_name(index: usize) -> Result<&'static str, ClassTypeError> {
    ClassType::from_index(index).map(ClassType::name)
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassType {
    type Err = ClassTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_is_bijective() {
        for class in ClassType::ALL {
            assert_eq!(ClassType::from_name(class.name()), Ok(class));
            assert_eq!(ClassType::from_index(class.index()), Ok(class));
        }

        let mut names: Vec<_> = ClassType::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ClassType::COUNT);
    }

    #[test]
    fn test_index_order() {
        assert_eq!(ClassType::Scene.index(), 0);
        assert_eq!(ClassType::Test.index(), 9);
        assert_eq!(ClassType::ReconstructionFilter.index(), 10);
    }

    #[test]
    fn test_out_of_range_index_fails() {
        assert_eq!(class_type_name(ClassType::COUNT), Err(ClassTypeError::OutOfRange(11)));
        assert_eq!(class_type_name(usize::MAX), Err(ClassTypeError::OutOfRange(usize::MAX)));
        assert_eq!(class_type_name(6), Ok("camera"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(ClassType::from_name("Scene").is_err());
        assert_eq!(
            "Unobtainium".parse::<ClassType>(),
            Err(ClassTypeError::UnknownName("Unobtainium".into()))
        );
    }

    #[test]
    fn test_capabilities() {
        assert!(ClassType::Mesh.has(Capabilities::DRAWABLE | Capabilities::OCCUPIES_SLOT));
        assert!(ClassType::Bsdf.has(Capabilities::PROVIDES_MATERIAL));
        assert!(!ClassType::Camera.has(Capabilities::DRAWABLE));
        assert!(ClassType::Scene.has(Capabilities::CONTAINER));
    }

    #[test]
    fn test_nesting_rules() {
        assert!(ClassType::Scene.accepts_child(ClassType::Mesh));
        assert!(!ClassType::Scene.accepts_child(ClassType::Scene));
        assert!(ClassType::Mesh.accepts_child(ClassType::Bsdf));
        assert!(!ClassType::Mesh.accepts_child(ClassType::Camera));
        assert!(ClassType::Medium.accepts_child(ClassType::PhaseFunction));
        assert!(!ClassType::Bsdf.accepts_child(ClassType::Bsdf));
        assert!(ClassType::Test.accepts_child(ClassType::Integrator));
    }
}
