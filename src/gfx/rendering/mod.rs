//! Core rendering functionality
//!
//! The frame driver and draw-state resolution are backend independent;
//! [`RenderEngine`] is the wgpu backend.

pub mod backend;
pub mod draw_state;
pub mod frame;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use backend::{PassKind, PassTarget, RenderBackend};
pub use draw_state::{resolve_node, DisplayDrawState, DrawProgram, NodeDrawState, PostEffect};
pub use frame::{FrameDriver, FramePipeline, FrameStats};
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;
