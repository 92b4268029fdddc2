//! Runtime context scene graphs are built against
//!
//! The runtime owns the resource caches: a mesh loaded for one node is shared
//! with every other node naming the same file, and all meshes without a BSDF
//! share one default material.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::material::{Material, MaterialParams};
use super::mesh::Mesh;
use super::obj_loader::ObjMeshLoader;
use super::{MeshLoader, ResourceError};

/// Name of the material used by meshes without a BSDF
pub const DEFAULT_MATERIAL_NAME: &str = "default";

/// Read-only context shared by scene graphs during initialization
pub struct Runtime {
    mesh_loader: Box<dyn MeshLoader>,
    meshes: Mutex<HashMap<PathBuf, Arc<Mesh>>>,
    default_material: Arc<Material>,
}

impl Runtime {
    /// Runtime loading meshes from OBJ files
    #[must_use]
    pub fn new() -> Self {
        Self::with_mesh_loader(ObjMeshLoader)
    }

    /// Runtime using a custom mesh loader
    #[must_use]
    pub fn with_mesh_loader(loader: impl MeshLoader + 'static) -> Self {
        Self {
            mesh_loader: Box::new(loader),
            meshes: Mutex::new(HashMap::new()),
            default_material: Arc::new(Material::new(DEFAULT_MATERIAL_NAME, MaterialParams::default())),
        }
    }

    /// Load the mesh at `path`, or return the already loaded instance
    ///
    /// # Errors
    /// Whatever the mesh loader reports; failures are not cached.
    pub fn resolve_mesh(&self, path: &Path) -> Result<Arc<Mesh>, ResourceError> {
        if let Some(mesh) = self.lock_meshes().get(path) {
            return Ok(Arc::clone(mesh));
        }

        let mesh = Arc::new(self.mesh_loader.load_mesh(path)?);
        log::debug!("Loaded mesh {} ({} triangles)", path.display(), mesh.triangle_count());

        let mut meshes = self.lock_meshes();
        Ok(Arc::clone(meshes.entry(path.to_path_buf()).or_insert(mesh)))
    }

    /// Material shared by meshes without a BSDF
    #[must_use]
    pub fn default_material(&self) -> Arc<Material> {
        Arc::clone(&self.default_material)
    }

    /// Number of cached meshes
    #[must_use]
    pub fn cached_mesh_count(&self) -> usize {
        self.lock_meshes().len()
    }

    /// Drop cached meshes no scene node references any more
    ///
    /// Returns how many entries were evicted.
    pub fn release_unused(&self) -> usize {
        let mut meshes = self.lock_meshes();
        let before = meshes.len();
        meshes.retain(|_, mesh| Arc::strong_count(mesh) > 1);
        before - meshes.len()
    }

    fn lock_meshes(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Mesh>>> {
        self.meshes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("cached_meshes", &self.cached_mesh_count())
            .finish_non_exhaustive()
    }
}
