//! GPU resource management
//!
//! Texture units, offscreen targets, procedural images and the global
//! uniform bindings.

pub mod global_bindings;
pub mod procedural;
pub mod render_target;
pub mod texture_resource;
pub mod unit_allocator;

// Re-export main types
pub use global_bindings::{light_view_projection, GlobalBindings, GlobalUBO, GlobalUBOContent};
pub use procedural::ImageData;
pub use render_target::{RenderTargetDesc, TargetBinding, TargetId};
pub use texture_resource::TextureResource;
pub use unit_allocator::{TextureUnit, UnitAllocator};
