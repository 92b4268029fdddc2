//! Scene resources
//!
//! Meshes and materials referenced by scene nodes. Resources are resolved
//! during [`SceneGraph::initialize`](crate::scene::SceneGraph::initialize)
//! through the [`Runtime`] and shared between nodes as `Arc`s.

mod material;
mod mesh;
mod obj_loader;
mod runtime;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use material::{Material, MaterialParams};
pub use mesh::{Mesh, Vertex};
pub use obj_loader::{ObjError, ObjLoader, ObjMeshLoader};
pub use runtime::{Runtime, DEFAULT_MATERIAL_NAME};

/// Source of mesh data
///
/// The default implementation reads OBJ files; tests and tools plug in their
/// own.
pub trait MeshLoader: Send + Sync {
    /// Load the mesh stored at `path`
    ///
    /// # Errors
    /// [`ResourceError`] when the mesh cannot be produced.
    fn load_mesh(&self, path: &Path) -> Result<Mesh, ResourceError>;
}

/// Resource resolution failed
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Mesh file could not be loaded
    #[error("Failed to load mesh '{}': {source}", path.display())]
    Mesh {
        /// Resolved mesh path
        path: PathBuf,
        /// Underlying loader error
        source: ObjError,
    },

    /// Mesh loader refused the request for another reason
    #[error("Mesh '{}' unavailable: {reason}", path.display())]
    MeshUnavailable {
        /// Resolved mesh path
        path: PathBuf,
        /// Why the loader refused
        reason: String,
    },

    /// A `material` reference names no BSDF in the scene
    #[error("No BSDF named '{0}' in the scene")]
    UnknownMaterial(String),

    /// A `material` property that is not a string
    #[error("The material property must name a BSDF as a string")]
    InvalidMaterialReference,

    /// A mesh node has no mesh source to resolve
    #[error("Mesh node has no mesh source")]
    MissingMeshSource,

    /// The node was never assigned a class type
    #[error("Node class type was never resolved")]
    UnresolvedClassType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingLoader(Arc<AtomicUsize>);

    impl MeshLoader for CountingLoader {
        fn load_mesh(&self, path: &Path) -> Result<Mesh, ResourceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            if path.ends_with("broken.obj") {
                return Err(ResourceError::MeshUnavailable {
                    path: path.to_path_buf(),
                    reason: "broken".into(),
                });
            }
            Ok(Mesh::new(path, vec![Vertex { position: [0.0; 3], normal: [0.0, 1.0, 0.0], tex_coord: [0.0; 2] }], vec![]))
        }
    }

    #[test]
    fn test_meshes_are_shared_by_path() {
        let loads = Arc::new(AtomicUsize::new(0));
        let runtime = Runtime::with_mesh_loader(CountingLoader(Arc::clone(&loads)));

        let a = runtime.resolve_mesh(Path::new("bunny.obj")).unwrap();
        let b = runtime.resolve_mesh(Path::new("bunny.obj")).unwrap();
        let c = runtime.resolve_mesh(Path::new("teapot.obj")).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.cached_mesh_count(), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let loads = Arc::new(AtomicUsize::new(0));
        let runtime = Runtime::with_mesh_loader(CountingLoader(Arc::clone(&loads)));

        assert!(runtime.resolve_mesh(Path::new("broken.obj")).is_err());
        assert!(runtime.resolve_mesh(Path::new("broken.obj")).is_err());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.cached_mesh_count(), 0);
    }

    #[test]
    fn test_release_unused() {
        let runtime = Runtime::with_mesh_loader(CountingLoader(Arc::new(AtomicUsize::new(0))));
        let kept = runtime.resolve_mesh(Path::new("kept.obj")).unwrap();
        drop(runtime.resolve_mesh(Path::new("dropped.obj")).unwrap());

        assert_eq!(runtime.release_unused(), 1);
        assert_eq!(runtime.cached_mesh_count(), 1);
        drop(kept);
    }

    #[test]
    fn test_default_material_is_shared() {
        let runtime = Runtime::new();
        assert!(Arc::ptr_eq(&runtime.default_material(), &runtime.default_material()));
        assert_eq!(runtime.default_material().name(), DEFAULT_MATERIAL_NAME);
    }
}
