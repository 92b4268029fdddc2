//! Typed property storage
//!
//! A [`PropertyList`] is the bag of loosely typed configuration a scene
//! document attaches to each node. Every entry holds exactly one
//! [`PropertyValue`]; strict getters fail on a missing key *or* a key stored
//! under another kind, defaulted getters (`*_or`) fall back instead. Values are
//! never coerced between kinds.
//!
//! Colors and points are not separate kinds: `set_color`/`set_point` and their
//! getters all go through the vector storage.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::foundation::math::{Mat4, Vec3};

/// The six storage kinds a property can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// UTF-8 string
    String,
    /// 32-bit float
    Float,
    /// 32-bit signed integer
    Integer,
    /// `true` / `false`
    Boolean,
    /// Three-component vector (also used for colors and points)
    Vector,
    /// 4x4 transformation matrix
    Transform,
}

impl PropertyKind {
    /// Lower-case name used in diagnostics and scene documents
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Vector => "vector",
            Self::Transform => "transform",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single tagged property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// String value
    String(String),
    /// Float value
    Float(f32),
    /// Integer value
    Integer(i32),
    /// Boolean value
    Boolean(bool),
    /// Vector, color or point value
    Vector(Vec3),
    /// Transformation matrix
    Transform(Mat4),
}

impl PropertyValue {
    /// Storage kind of this value
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            Self::String(_) => PropertyKind::String,
            Self::Float(_) => PropertyKind::Float,
            Self::Integer(_) => PropertyKind::Integer,
            Self::Boolean(_) => PropertyKind::Boolean,
            Self::Vector(_) => PropertyKind::Vector,
            Self::Transform(_) => PropertyKind::Transform,
        }
    }

    /// Parse the textual literal of `kind`.
    ///
    /// Vectors accept three numbers separated by commas and/or whitespace,
    /// transforms sixteen numbers in row-major order. Returns `None` when the
    /// text is not a valid literal of that kind.
    #[must_use]
    pub fn parse(kind: PropertyKind, text: &str) -> Option<Self> {
        let text = text.trim();
        match kind {
            PropertyKind::String => Some(Self::String(text.to_owned())),
            PropertyKind::Float => text.parse().ok().map(Self::Float),
            PropertyKind::Integer => text.parse().ok().map(Self::Integer),
            PropertyKind::Boolean => match text {
                "true" => Some(Self::Boolean(true)),
                "false" => Some(Self::Boolean(false)),
                _ => None,
            },
            PropertyKind::Vector => {
                let [x, y, z] = parse_floats::<3>(text)?;
                Some(Self::Vector(Vec3::new(x, y, z)))
            }
            PropertyKind::Transform => {
                let values = parse_floats::<16>(text)?;
                Some(Self::Transform(Mat4::from_row_slice(&values)))
            }
        }
    }
}

/// Parse exactly `N` floats separated by commas and/or whitespace
pub(crate) fn parse_floats<const N: usize>(text: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut count = 0;
    for token in text.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        if count == N {
            return None;
        }
        out[count] = token.parse().ok()?;
        count += 1;
    }
    (count == N).then_some(out)
}

/// Strict property access failed
///
/// A missing key and a key of the wrong kind are reported the same way;
/// callers recover identically in both cases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The property is absent or stored under another kind
    #[error("Property '{name}' not found or not a {expected}")]
    NotFoundOrWrongKind {
        /// Requested property name
        name: String,
        /// Kind the caller asked for
        expected: PropertyKind,
    },
}

/// Typed key-value bag used to configure scene nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyList {
    properties: BTreeMap<String, PropertyValue>,
}

macro_rules! typed_accessors {
    ($(
        $kind:ident: $ty:ty => $set:ident, $get:ident, $get_or:ident;
    )*) => {
        $(
            #[doc = concat!("Store a ", stringify!($kind), " property, replacing any previous entry")]
            pub fn $set(&mut self, name: impl Into<String>, value: $ty) {
                self.properties.insert(name.into(), PropertyValue::$kind(value));
            }

            #[doc = concat!("Get a ", stringify!($kind), " property")]
            ///
            /// # Errors
            /// [`PropertyError::NotFoundOrWrongKind`] if absent or of another kind.
            pub fn $get(&self, name: &str) -> Result<$ty, PropertyError> {
                match self.properties.get(name) {
                    Some(PropertyValue::$kind(value)) => Ok(*value),
                    _ => Err(PropertyError::NotFoundOrWrongKind {
                        name: name.to_owned(),
                        expected: PropertyKind::$kind,
                    }),
                }
            }

            #[doc = concat!("Get a ", stringify!($kind), " property or `default`")]
            #[must_use]
            pub fn $get_or(&self, name: &str, default: $ty) -> $ty {
                match self.properties.get(name) {
                    Some(PropertyValue::$kind(value)) => *value,
                    _ => default,
                }
            }
        )*
    };
}

impl PropertyList {
    /// Create an empty property list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a string property, replacing any previous entry
    pub fn set_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), PropertyValue::String(value.into()));
    }

    /// Get a string property
    ///
    /// # Errors
    /// [`PropertyError::NotFoundOrWrongKind`] if absent or of another kind.
    pub fn get_string(&self, name: &str) -> Result<String, PropertyError> {
        self.get_str(name).map(str::to_owned)
    }

    /// Borrow a string property
    ///
    /// # Errors
    /// [`PropertyError::NotFoundOrWrongKind`] if absent or of another kind.
    pub fn get_str(&self, name: &str) -> Result<&str, PropertyError> {
        match self.properties.get(name) {
            Some(PropertyValue::String(value)) => Ok(value),
            _ => Err(PropertyError::NotFoundOrWrongKind {
                name: name.to_owned(),
                expected: PropertyKind::String,
            }),
        }
    }

    /// Get a string property or `default`
    #[must_use]
    pub fn get_string_or(&self, name: &str, default: &str) -> String {
        self.get_str(name).unwrap_or(default).to_owned()
    }

    typed_accessors! {
        Float: f32 => set_float, get_float, get_float_or;
        Integer: i32 => set_integer, get_integer, get_integer_or;
        Boolean: bool => set_boolean, get_boolean, get_boolean_or;
        Vector: Vec3 => set_vector, get_vector, get_vector_or;
        Transform: Mat4 => set_transform, get_transform, get_transform_or;
    }

    /// Store a color (vector kind)
    pub fn set_color(&mut self, name: impl Into<String>, value: Vec3) {
        self.set_vector(name, value);
    }

    /// Get a color (vector kind)
    ///
    /// # Errors
    /// [`PropertyError::NotFoundOrWrongKind`] if absent or not a vector.
    pub fn get_color(&self, name: &str) -> Result<Vec3, PropertyError> {
        self.get_vector(name)
    }

    /// Get a color (vector kind) or `default`
    #[must_use]
    pub fn get_color_or(&self, name: &str, default: Vec3) -> Vec3 {
        self.get_vector_or(name, default)
    }

    /// Store a point (vector kind)
    pub fn set_point(&mut self, name: impl Into<String>, value: Vec3) {
        self.set_vector(name, value);
    }

    /// Get a point (vector kind)
    ///
    /// # Errors
    /// [`PropertyError::NotFoundOrWrongKind`] if absent or not a vector.
    pub fn get_point(&self, name: &str) -> Result<Vec3, PropertyError> {
        self.get_vector(name)
    }

    /// Get a point (vector kind) or `default`
    #[must_use]
    pub fn get_point_or(&self, name: &str, default: Vec3) -> Vec3 {
        self.get_vector_or(name, default)
    }

    /// Store an already tagged value, returning the entry it replaced
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.properties.insert(name.into(), value)
    }

    /// Raw tagged value, whatever its kind
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Kind currently stored under `name`
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<PropertyKind> {
        self.properties.get(name).map(PropertyValue::kind)
    }

    /// Whether a property of any kind exists under `name`
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Remove a property
    pub fn remove_property(&mut self, name: &str) {
        self.properties.remove(name);
    }

    /// Clear all properties
    pub fn clear(&mut self) {
        self.properties.clear();
    }

    /// Number of stored properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the list holds no properties
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Property names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_every_kind() {
        let mut props = PropertyList::new();
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));

        props.set_string("filename", "bunny.obj");
        props.set_float("fov", 45.5);
        props.set_integer("sampleCount", -7);
        props.set_boolean("visible", true);
        props.set_vector("offset", Vec3::new(0.25, -1.0, 8.0));
        props.set_transform("toWorld", m);

        assert_eq!(props.get_string("filename").unwrap(), "bunny.obj");
        assert_eq!(props.get_float("fov").unwrap(), 45.5);
        assert_eq!(props.get_integer("sampleCount").unwrap(), -7);
        assert!(props.get_boolean("visible").unwrap());
        assert_eq!(props.get_vector("offset").unwrap(), Vec3::new(0.25, -1.0, 8.0));
        assert_eq!(props.get_transform("toWorld").unwrap(), m);
        assert_eq!(props.len(), 6);
    }

    #[test]
    fn test_missing_and_mismatched_fail_identically() {
        let mut props = PropertyList::new();
        props.set_integer("count", 3);

        let missing = props.get_float("absent").unwrap_err();
        let mismatched = props.get_float("count").unwrap_err();

        assert_eq!(
            missing,
            PropertyError::NotFoundOrWrongKind { name: "absent".into(), expected: PropertyKind::Float }
        );
        assert_eq!(
            mismatched,
            PropertyError::NotFoundOrWrongKind { name: "count".into(), expected: PropertyKind::Float }
        );
    }

    #[test]
    fn test_defaulted_getters_cover_both_failure_cases() {
        let mut props = PropertyList::new();
        props.set_string("radius", "2.0");

        assert_eq!(props.get_float_or("radius", 1.5), 1.5);
        assert_eq!(props.get_float_or("absent", 1.5), 1.5);
        assert_eq!(props.get_string_or("absent", "fallback"), "fallback");
        assert_eq!(props.get_string_or("radius", "fallback"), "2.0");
    }

    #[test]
    fn test_no_coercion_between_kinds() {
        let mut props = PropertyList::new();
        props.set_integer("depth", 4);

        assert!(props.get_float("depth").is_err());
        assert!(props.get_boolean("depth").is_err());
        assert!(props.get_string("depth").is_err());
    }

    #[test]
    fn test_reset_replaces_kind() {
        let mut props = PropertyList::new();
        props.set_float("value", 1.0);
        props.set_string("value", "one");

        assert_eq!(props.kind_of("value"), Some(PropertyKind::String));
        assert!(props.get_float("value").is_err());
        assert_eq!(props.get_string("value").unwrap(), "one");
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_color_point_vector_are_interchangeable() {
        let mut props = PropertyList::new();
        let c = Vec3::new(0.9, 0.1, 0.1);
        let p = Vec3::new(1.0, 2.0, 3.0);

        props.set_color("albedo", c);
        props.set_point("origin", p);

        assert_eq!(props.get_vector("albedo").unwrap(), c);
        assert_eq!(props.get_point("albedo").unwrap(), c);
        assert_eq!(props.get_color("origin").unwrap(), p);
        assert_eq!(props.kind_of("albedo"), Some(PropertyKind::Vector));

        props.set_vector("up", Vec3::y());
        assert_eq!(props.get_color_or("up", Vec3::zeros()), Vec3::y());
        assert_eq!(props.get_point_or("missing", Vec3::x()), Vec3::x());
    }

    #[test]
    fn test_has_remove_clear() {
        let mut props = PropertyList::new();
        props.set_boolean("shadow", false);
        props.set_float("scale", 2.0);

        assert!(props.has_property("shadow"));
        assert!(!props.has_property("Shadow"));

        props.remove_property("shadow");
        props.remove_property("never-set");
        assert!(!props.has_property("shadow"));

        props.clear();
        assert!(props.is_empty());
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut props = PropertyList::new();
        props.set_float("b", 1.0);
        props.set_float("a", 2.0);
        props.set_float("c", 3.0);

        assert_eq!(props.names().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(PropertyValue::parse(PropertyKind::Float, " 0.5 "), Some(PropertyValue::Float(0.5)));
        assert_eq!(PropertyValue::parse(PropertyKind::Integer, "12"), Some(PropertyValue::Integer(12)));
        assert_eq!(PropertyValue::parse(PropertyKind::Integer, "1.5"), None);
        assert_eq!(PropertyValue::parse(PropertyKind::Boolean, "true"), Some(PropertyValue::Boolean(true)));
        assert_eq!(PropertyValue::parse(PropertyKind::Boolean, "yes"), None);
        assert_eq!(
            PropertyValue::parse(PropertyKind::Vector, "1, 2,3"),
            Some(PropertyValue::Vector(Vec3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(PropertyValue::parse(PropertyKind::Vector, "1 2"), None);
        assert_eq!(PropertyValue::parse(PropertyKind::Vector, "1 2 3 4"), None);
        assert_eq!(PropertyValue::parse(PropertyKind::Float, "abc"), None);
    }

    #[test]
    fn test_parse_transform_is_row_major() {
        let text = "1 0 0 5  0 1 0 6  0 0 1 7  0 0 0 1";
        let Some(PropertyValue::Transform(m)) = PropertyValue::parse(PropertyKind::Transform, text) else {
            panic!("expected a transform");
        };
        assert_eq!(m, Mat4::new_translation(&Vec3::new(5.0, 6.0, 7.0)));
    }
}
