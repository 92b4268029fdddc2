//! # Render seam
//!
//! The scene graph does not render anything itself. A draw traversal turns
//! every initialized drawable node into a [`DrawCall`] and submits it to a
//! [`CommandBuffer`] together with the [`Frame`] being produced.
//!
//! ## Design
//!
//! The renderer behind the trait is a passive consumer:
//! - it receives pre-computed world matrices (no transform logic)
//! - it receives shared resource handles (no resource management)
//! - it only draws (no lifecycle, input or timing)

mod commands;
mod frame;

pub use commands::{CommandBuffer, DrawCall, RecordingCommandBuffer};
pub use frame::Frame;
