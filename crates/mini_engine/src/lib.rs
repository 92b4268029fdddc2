//! # Mini Engine
//!
//! Scene construction for a physically based renderer: a typed node tree
//! built from declarative scene files, with shared mesh and material
//! resources and per-frame draw traversal.
//!
//! ## Features
//!
//! - **Scene Documents**: XML and RON scene files with typed property entries
//! - **Class Registry**: Fixed set of node kinds with canonical names and capabilities
//! - **Scene Graph**: Arena-backed node tree with checked parent/child links
//! - **Resource Sharing**: Meshes and materials resolved once and shared between nodes
//! - **Render Seam**: Draw calls submitted through a backend-agnostic command buffer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mini_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     mini_engine::foundation::logging::init();
//!
//!     let runtime = Runtime::new();
//!     let loader = SceneLoader::new(LoaderConfig::load_from_file("loader.toml").unwrap_or_default());
//!     let mut scene = loader.load_from_xml(&runtime, "scenes/bunny.xml")?;
//!     scene.initialize()?;
//!
//!     let mut commands = RecordingCommandBuffer::new();
//!     scene.draw(&mut commands, &Frame::new(0, Mat4::identity(), Mat4::identity()));
//!     println!("{} draw call(s)", commands.len());
//!
//!     scene.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod resources;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, LoaderConfig},
        foundation::math::{Mat4, Vec3},
        render::{CommandBuffer, DrawCall, Frame, RecordingCommandBuffer},
        resources::{Material, Mesh, MeshLoader, Runtime},
        scene::{ClassType, NodeId, PropertyList, SceneGraph, SceneLoadError, SceneLoader},
    };
}
