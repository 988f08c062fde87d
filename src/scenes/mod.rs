//! # Demo Scenes
//!
//! Ready-made scene graphs and their per-frame animation, shared by the
//! `mobile` and `shadow_scene` demos.
//!
//! - [`mobile`] - seven spinning nodes hung from wires in front of a lit wall
//! - [`courtyard`] - shadow-mapped props on a land plane under a sky box
//!
//! Both scenes only talk to the GPU through
//! [`RenderBackend`](crate::gfx::rendering::RenderBackend), so they can be
//! driven by the wgpu engine or recorded in tests.

pub mod courtyard;
pub mod mobile;

pub use courtyard::{CourtyardMeshes, CourtyardScene, CourtyardTextures, OrbitingLight};
pub use mobile::{build_mobile, MobileLights, MobileRig, MobileScene};
