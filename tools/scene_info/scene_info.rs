//! Scene Inspector
//!
//! Loads a scene file, initializes it and prints the node tree together with
//! the resources each node resolved.
//!
//! Usage: cargo run --bin scene_info scene.xml [loader.toml]
//!
//! Set `RUST_LOG=debug` to see every element as it is built.

use std::env;
use std::process::ExitCode;

use mini_engine::config::{Config, LoaderConfig};
use mini_engine::foundation::logging;
use mini_engine::foundation::math::Mat4;
use mini_engine::render::{Frame, RecordingCommandBuffer};
use mini_engine::resources::Runtime;
use mini_engine::scene::{NodeId, SceneGraph, SceneLoader};

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} scene.xml|scene.ron [loader.toml|loader.ron]", args[0]);
        return ExitCode::FAILURE;
    }

    let config = match args.get(2) {
        Some(path) => match LoaderConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Cannot read loader settings {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => LoaderConfig::default(),
    };

    let runtime = Runtime::new();
    let mut scene = match SceneLoader::new(config).load_from_file(&runtime, &args[1]) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args[1]);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = scene.initialize() {
        for failure in &e.failures {
            log::error!("{failure}");
        }
    }

    if let Some(root) = scene.root() {
        print_tree(&scene, root, 0);
    }

    let mut commands = RecordingCommandBuffer::new();
    let frame = scene
        .active_camera()
        .and_then(|camera| {
            let desc = *scene.node(camera)?.data().camera()?;
            Frame::for_camera(0, &desc, &scene.world_transform(camera)?)
        })
        .unwrap_or_else(|| Frame::new(0, Mat4::identity(), Mat4::identity()));
    scene.draw(&mut commands, &frame);
    println!("{} node(s), {} draw call(s)", scene.len(), commands.len());

    scene.shutdown();
    ExitCode::SUCCESS
}

fn print_tree(scene: &SceneGraph<'_>, handle: NodeId, depth: usize) {
    let Some(node) = scene.node(handle) else {
        return;
    };

    let mut line = format!("{:indent$}{node}", "", indent = depth * 2);
    if let Some(mesh) = node.mesh() {
        line.push_str(&format!(" mesh={} ({} tris)", mesh.source().display(), mesh.triangle_count()));
    }
    if let Some(material) = node.material() {
        line.push_str(&format!(" material={}", material.name()));
    }
    if let Some(offset) = node.entity_offset() {
        line.push_str(&format!(" slot={offset}"));
    }
    println!("{line}");

    for &child in scene.children(handle) {
        print_tree(scene, child, depth + 1);
    }
}
