//! Renderer configuration
//!
//! Plain structs with `Default` values and chained `with_*` builders. A
//! handful of environment variables can override the window and pass
//! settings at startup.

use log::warn;

/// Lowest pixelation resolution accepted by the display pass
pub const MIN_DISPLAY_RESOLUTION: u32 = 10;
/// Highest pixelation resolution accepted by the display pass
pub const MAX_DISPLAY_RESOLUTION: u32 = 1210;

/// Resolution of the pixelation post effect, clamped to `[10, 1210]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayResolution(u32);

impl DisplayResolution {
    pub fn new(resolution: i64) -> Self {
        let clamped = resolution.clamp(
            MIN_DISPLAY_RESOLUTION as i64,
            MAX_DISPLAY_RESOLUTION as i64,
        );
        Self(clamped as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Moves the resolution by `delta` and clamps the result.
    pub fn step(self, delta: i32) -> Self {
        Self::new(self.0 as i64 + delta as i64)
    }
}

impl Default for DisplayResolution {
    fn default() -> Self {
        Self(160)
    }
}

/// Top-level settings for the window, surface and render passes
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Edge length of the square shadow map in texels
    pub shadow_map_size: u32,
    /// Number of texture units the allocator can hand out
    pub texture_units: u32,
    /// Clear color of the offscreen color pass
    pub color_clear: [f64; 4],
    /// Clear color of the surface behind the display quad
    pub display_clear: [f64; 4],
    /// Draw selected nodes as wireframe when the adapter supports it
    pub wireframe_selection: bool,
    pub display_resolution: DisplayResolution,
    /// Log pass boundaries at info level
    pub pass_debug: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "pivot".to_string(),
            width: 800,
            height: 600,
            vsync: true,
            shadow_map_size: 2048,
            texture_units: 32,
            color_clear: [0.2, 0.2, 0.2, 1.0],
            display_clear: [0.0, 0.0, 0.0, 1.0],
            wireframe_selection: true,
            display_resolution: DisplayResolution::default(),
            pass_debug: false,
        }
    }
}

impl RenderConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }

    pub fn with_texture_units(mut self, units: u32) -> Self {
        self.texture_units = units;
        self
    }

    pub fn with_color_clear(mut self, color: [f64; 4]) -> Self {
        self.color_clear = color;
        self
    }

    pub fn with_display_clear(mut self, color: [f64; 4]) -> Self {
        self.display_clear = color;
        self
    }

    pub fn with_wireframe_selection(mut self, enabled: bool) -> Self {
        self.wireframe_selection = enabled;
        self
    }

    pub fn with_display_resolution(mut self, resolution: DisplayResolution) -> Self {
        self.display_resolution = resolution;
        self
    }

    pub fn with_pass_debug(mut self, enabled: bool) -> Self {
        self.pass_debug = enabled;
        self
    }

    /// Applies `PIVOT_*` environment variables on top of this configuration.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Malformed values are logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(width) = parse_var::<u32>(&lookup, "PIVOT_WIDTH") {
            self.width = width;
        }
        if let Some(height) = parse_var::<u32>(&lookup, "PIVOT_HEIGHT") {
            self.height = height;
        }
        if let Some(vsync) = parse_flag(&lookup, "PIVOT_VSYNC") {
            self.vsync = vsync;
        }
        if let Some(size) = parse_var::<u32>(&lookup, "PIVOT_SHADOW_SIZE") {
            self.shadow_map_size = size;
        }
        if let Some(debug) = parse_flag(&lookup, "PIVOT_PASS_DEBUG") {
            self.pass_debug = debug;
        }
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let raw = lookup(key)?;
    match raw.trim() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        other => {
            warn!("Ignoring {}={:?}: expected 0 or 1", key, other);
            None
        }
    }
}
