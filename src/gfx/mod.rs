//! # Graphics Module
//!
//! Everything between the scene graph and the GPU.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - static look-at camera and first-person fly camera
//! - **Geometry** ([`geometry`]) - mesh accumulator, procedural solids and fixed meshes
//! - **Scene Graph** ([`scene`]) - node arena, transform propagation, wires and lights
//! - **Rendering Pipeline** ([`rendering`]) - backend seam, frame driver and the wgpu engine
//! - **Resource Management** ([`resources`]) - texture units, render targets and procedural images
//!
//! ## Usage
//!
//! The scene graph never touches wgpu directly. A frame is driven through
//! [`rendering::FrameDriver`] against any [`rendering::RenderBackend`]:
//!
//! ```no_run
//! use pivot::gfx::rendering::{FrameDriver, FramePipeline, PostEffect};
//! use pivot::gfx::resources::TargetBinding;
//! # fn run(engine: &mut pivot::gfx::RenderEngine, graph: &mut pivot::gfx::scene::SceneGraph) -> anyhow::Result<()> {
//! let mut targets = TargetBinding::new();
//! let color = engine.create_render_target(&mut targets, "Draw", 600, 500, true)?;
//! let mut driver = FrameDriver::new(FramePipeline::Single { color, effect: PostEffect::Blur }, targets);
//!
//! graph.create_all(engine)?;
//! driver.render_frame(graph, engine)?;
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{FlyCamera, LookAtCamera};
pub use rendering::render_engine::RenderEngine;
