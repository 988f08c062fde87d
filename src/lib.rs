// src/lib.rs
//! Pivot
//!
//! A hierarchical scene-graph renderer built on wgpu and winit: procedural
//! solids of revolution, parent/child transform propagation, connector
//! wires and a shadow, color and display pass pipeline.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod loaders;
pub mod prelude;
pub mod scenes;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{Demo, PivotApp};
pub use config::RenderConfig;

/// Default log filter, overridable with `RUST_LOG`
pub const DEFAULT_LOG_FILTER: &str = "pivot=info,wgpu_core=warn,wgpu_hal=warn";

/// Installs the `env_logger` backend. Later calls are no-ops.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    let _ = env_logger::Builder::from_env(env).try_init();
}
