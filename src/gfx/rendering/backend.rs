//! # Render Backend Seam
//!
//! The scene graph and frame driver talk to the GPU only through
//! [`RenderBackend`]. The wgpu implementation is
//! [`RenderEngine`](super::render_engine::RenderEngine); tests use a
//! recording implementation so traversal and pass ordering can be checked
//! without a device.

use crate::error::RenderError;
use crate::gfx::geometry::MeshBuffer;
use crate::gfx::resources::render_target::TargetId;
use crate::gfx::scene::connector::Connector;
use crate::gfx::scene::node::NodeId;

use super::draw_state::{DisplayDrawState, NodeDrawState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Depth-only render from the light
    Shadow,
    /// Lit, textured render from the camera
    Color,
    /// Screen quad sampling the color target
    Display,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    Offscreen(TargetId),
    Surface,
}

pub trait RenderBackend {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    /// One-time upload of a node mesh.
    fn upload_mesh(&mut self, node: NodeId, mesh: &MeshBuffer) -> Result<(), RenderError>;

    /// Allocates the dynamic two-vertex buffer of a node's wire.
    fn upload_connector(&mut self, node: NodeId, connector: &Connector) -> Result<(), RenderError>;

    /// Overwrites the wire endpoints; called every frame before drawing.
    fn update_connector(&mut self, node: NodeId, connector: &Connector) -> Result<(), RenderError>;

    fn begin_pass(&mut self, kind: PassKind, target: PassTarget) -> Result<(), RenderError>;

    fn draw_node(&mut self, state: &NodeDrawState) -> Result<(), RenderError>;

    fn draw_connector(&mut self, node: NodeId) -> Result<(), RenderError>;

    fn draw_display(&mut self, state: &DisplayDrawState) -> Result<(), RenderError>;

    fn end_pass(&mut self) -> Result<(), RenderError>;

    /// Whether selected nodes can be drawn as wireframe.
    fn supports_wireframe(&self) -> bool {
        true
    }
}
