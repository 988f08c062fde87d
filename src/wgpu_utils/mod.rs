//! Small wgpu helpers
//!
//! Bind group builders and a typed uniform buffer shared by the engine and
//! the global bindings.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;
