//! # Pivot Prelude
//!
//! Commonly used types for building scenes and demos.
//!
//! ```rust
//! use pivot::prelude::*;
//!
//! let mut graph = SceneGraph::new();
//! let hub = graph.add_node(
//!     MobileNode::new("hub")
//!         .with_shape(Shape::new().with_height(0.1).with_radius(0.1).build_cylinder())
//!         .unwrap()
//!         .with_program(ShadingProgram::VertexColor),
//! );
//! graph.node_mut(hub).unwrap().set_rotation_speed(1.0);
//! ```

// Re-export core application types
pub use crate::app::{Demo, PivotApp};
pub use crate::config::{DisplayResolution, RenderConfig};
pub use crate::error::{RenderError, ResourceError, SceneError, ShapeError};
pub use crate::init_logging;

// Re-export graphics and scene types
pub use crate::gfx::camera::{Camera, CameraController, CameraManager, CameraUniform, FlyCamera, LookAtCamera};
pub use crate::gfx::geometry::{primitives, MeshBuffer, Shape};
pub use crate::gfx::rendering::{
    FrameDriver, FramePipeline, FrameStats, PassKind, PostEffect, RenderBackend, RenderEngine,
};
pub use crate::gfx::resources::{ImageData, TargetBinding, TargetId, TextureUnit};
pub use crate::gfx::scene::{
    Light, LightKind, LightSet, MobileNode, NodeId, SceneGraph, Selection, SelectionStyle, ShadingProgram,
};
pub use crate::loaders::load_obj;

// Re-export common external dependencies
pub use cgmath::{Deg, Matrix4, Point3, Vector2, Vector3};
