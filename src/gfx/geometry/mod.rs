//! # Procedural Geometry
//!
//! Mesh data built on the CPU before it is uploaded once to the GPU.
//!
//! - [`MeshBuffer`] - index-aligned triangle soup that shapes are merged into
//! - [`Shape`] - immutable builder for pyramids, prisms, cones and cylinders
//! - [`primitives`] - fixed meshes (display quad, land, skybox, wall)
//!
//! ## Usage
//!
//! ```rust
//! use pivot::gfx::geometry::{MeshBuffer, Shape};
//! use cgmath::{Matrix4, Vector3};
//!
//! let shape = Shape::new().with_height(0.1).with_radius(0.07);
//! let built = shape
//!     .with_placement(Matrix4::from_translation(Vector3::new(0.0, 0.05, 0.0)))
//!     .build_cylinder()
//!     .unwrap();
//!
//! let mut mesh = MeshBuffer::new();
//! mesh.append_transformed(&built.mesh, built.placement).unwrap();
//! assert_eq!(mesh.triangle_count(), 120);
//! ```

pub mod mesh_buffer;
pub mod primitives;
pub mod shape;

pub use mesh_buffer::{face_normal, normal_matrix, polar_uv, MeshBuffer};
pub use shape::{BuiltShape, Shape, SMOOTH_LEVEL};
