//! CPU-side mesh data
//!
//! GPU upload happens elsewhere; the scene only needs to know that a mesh
//! resource exists and to share it between nodes.

use std::path::{Path, PathBuf};

use crate::foundation::math::Point3;

/// Vertex with position, normal, and texture coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

/// Indexed triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    source: PathBuf,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Create a mesh loaded from `source`
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            source: source.into(),
            vertices,
            indices,
        }
    }

    /// File the mesh was loaded from
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Vertex data
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle list indices
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for an empty mesh
    #[must_use]
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = Point3::from(self.vertices.first()?.position);
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            let p = Point3::from(v.position);
            (min.inf(&p), max.sup(&p))
        }))
    }
}
