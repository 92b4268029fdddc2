//! Draw commands issued during scene traversal
//!
//! The scene graph does not talk to a graphics API. It hands every drawable
//! node to a [`CommandBuffer`] as a [`DrawCall`] carrying pre-computed world
//! transform, shared resources and the node's entity table slot. The backend
//! behind the trait decides what a draw means.

use std::sync::Arc;

use super::frame::Frame;
use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::resources::{Material, Mesh};

/// One mesh to draw
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// Node that issued the call
    pub node: NodeId,

    /// Geometry
    pub mesh: Arc<Mesh>,

    /// Surface material
    pub material: Arc<Material>,

    /// Model-to-world matrix, parent transforms already applied
    pub world: Mat4,

    /// Slot of the node in the per-frame entity table
    pub entity_offset: u32,
}

/// Sink for draw calls
pub trait CommandBuffer {
    /// Record a draw of `call` for `frame`
    fn draw_mesh(&mut self, call: &DrawCall, frame: &Frame);
}

/// Command buffer that keeps every call it receives
///
/// Useful for headless tools and for inspecting what a traversal emits.
///
/// # Example
///
/// ```rust,ignore
/// let mut commands = RecordingCommandBuffer::new();
/// graph.draw(&mut commands, &frame);
/// for call in commands.calls() {
///     println!("{:?} -> slot {}", call.node, call.entity_offset);
/// }
/// ```
#[derive(Debug, Default)]
pub struct RecordingCommandBuffer {
    calls: Vec<DrawCall>,
    frame_index: Option<u64>,
}

impl RecordingCommandBuffer {
    /// Create a new empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with pre-allocated capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            calls: Vec::with_capacity(capacity),
            frame_index: None,
        }
    }

    /// Recorded calls in submission order
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Index of the frame the last call was recorded for
    #[must_use]
    pub const fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }

    /// Number of recorded calls
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Forget every recorded call
    pub fn clear(&mut self) {
        self.calls.clear();
        self.frame_index = None;
    }
}

impl CommandBuffer for RecordingCommandBuffer {
    fn draw_mesh(&mut self, call: &DrawCall, frame: &Frame) {
        self.frame_index = Some(frame.index);
        self.calls.push(call.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::Key;
    use crate::resources::MaterialParams;

    #[test]
    fn test_recording_buffer_keeps_calls() {
        let call = DrawCall {
            node: NodeId::null(),
            mesh: Arc::new(Mesh::new("quad.obj", Vec::new(), Vec::new())),
            material: Arc::new(Material::new("default", MaterialParams::default())),
            world: Mat4::identity(),
            entity_offset: 0,
        };

        let mut buffer = RecordingCommandBuffer::with_capacity(2);
        assert!(buffer.is_empty());

        let frame = Frame::new(7, Mat4::identity(), Mat4::identity());
        buffer.draw_mesh(&call, &frame);
        buffer.draw_mesh(&call, &frame);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.frame_index(), Some(7));

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.frame_index(), None);
    }
}
