//! # Shadow Scene Example
//!
//! A statue, two cats and a helicopter on a land plane inside a sky box.
//! A yellow point light orbits the scene and casts shadows through a depth
//! pass; the final image is shown pixelated.
//!
//! ## Usage:
//! ```bash
//! cargo run --example shadow_scene -- [MODEL_DIR]
//! ```
//!
//! `MODEL_DIR` may contain `Jesus.obj`, `Cat.obj` and `Chopper.obj`. Models
//! that are missing are replaced by built-in stand-ins.
//!
//! ## Controls:
//! - `W` `A` `S` `D` move the camera, `Q` `E` `O` `P` turn it
//! - `R` highlights the next model
//! - `U` / `I` (held) raise or lower the display resolution

use std::path::PathBuf;

use anyhow::Context;
use pivot::prelude::*;
use pivot::scenes::{CourtyardMeshes, CourtyardScene, CourtyardTextures};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

struct ShadowDemo {
    model_dir: Option<PathBuf>,
    scene: Option<CourtyardScene>,
}

impl ShadowDemo {
    fn scene_mut(&mut self) -> anyhow::Result<&mut CourtyardScene> {
        self.scene.as_mut().context("Scene not initialized")
    }
}

impl Demo for ShadowDemo {
    fn keymap(&self) -> &str {
        pivot::scenes::courtyard::KEYMAP
    }

    fn initialize(&mut self, engine: &mut RenderEngine, config: &RenderConfig) -> anyhow::Result<()> {
        let (width, height) = engine.get_surface_size();
        let mut targets = TargetBinding::new();
        let shadow = engine.create_render_target(
            &mut targets,
            "Shadow",
            config.shadow_map_size,
            config.shadow_map_size,
            false,
        )?;
        let color = engine.create_render_target(&mut targets, "Draw", width, height, true)?;
        let shadow_map = targets.desc(shadow)?.depth;

        let textures = CourtyardTextures::create(&mut rand::rng(), shadow_map, |image, label| {
            engine.create_texture(image, label, wgpu::FilterMode::Linear)
        })?;
        let meshes = CourtyardMeshes::load(self.model_dir.as_deref())?;

        let driver = FrameDriver::new(
            FramePipeline::Multi {
                shadow,
                color,
                effect: PostEffect::None,
            },
            targets,
        )
        .with_pass_debug(config.pass_debug);

        let aspect = width as f32 / height as f32;
        let mut scene = CourtyardScene::new(driver, &meshes, &textures, aspect, config.display_resolution)?;
        scene.create(engine)?;
        self.scene = Some(scene);
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) -> anyhow::Result<bool> {
        Ok(self.scene_mut()?.handle_key(key, state)?)
    }

    fn resize(&mut self, engine: &mut RenderEngine, width: u32, height: u32) -> anyhow::Result<()> {
        let scene = self.scene_mut()?;
        scene.resize(width, height);
        let color = scene.driver().pipeline().color_target();
        engine.resize_render_target(scene.driver_mut().targets_mut(), color, width, height)?;
        Ok(())
    }

    fn render(&mut self, engine: &mut RenderEngine) -> Result<FrameStats, RenderError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(FrameStats::default());
        };
        scene.animate()?;
        engine.update_globals(scene.camera_uniform(), scene.light_view_proj());
        scene.draw(engine)
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = RenderConfig::default()
        .with_title("shadow scene")
        .with_size(600, 500)
        .with_env_overrides();
    let demo = ShadowDemo {
        model_dir: std::env::args().nth(1).map(PathBuf::from),
        scene: None,
    };

    PivotApp::new(config, demo)?.run()
}
