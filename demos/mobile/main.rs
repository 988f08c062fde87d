//! # Mobile Example
//!
//! Seven solids of revolution hanging from each other on wires, every level
//! spinning about its own vertical axis, lit by an ambient directional light,
//! a bobbing green point light and a circling blue spot light.
//!
//! ## Usage:
//! ```bash
//! cargo run --example mobile
//! ```
//!
//! ## Controls:
//! - `O` selects the next node (drawn as wireframe)
//! - `M` / `N` speed the selected node up or down
//! - `R` stops the selected node
//! - `B` / `P` toggle the blur and pixelate display effects

use anyhow::Context;
use pivot::prelude::*;
use pivot::scenes::MobileScene;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

#[derive(Default)]
struct MobileDemo {
    scene: Option<MobileScene>,
}

impl MobileDemo {
    fn scene_mut(&mut self) -> anyhow::Result<&mut MobileScene> {
        self.scene.as_mut().context("Scene not initialized")
    }
}

impl Demo for MobileDemo {
    fn keymap(&self) -> &str {
        pivot::scenes::mobile::KEYMAP
    }

    fn initialize(&mut self, engine: &mut RenderEngine, config: &RenderConfig) -> anyhow::Result<()> {
        let (width, height) = engine.get_surface_size();
        let mut targets = TargetBinding::new();
        let color = engine.create_render_target(&mut targets, "Draw", width, height, true)?;

        let driver = FrameDriver::new(
            FramePipeline::Single {
                color,
                effect: PostEffect::None,
            },
            targets,
        )
        .with_pass_debug(config.pass_debug);

        let aspect = width as f32 / height as f32;
        let mut scene = MobileScene::new(driver, aspect, config.display_resolution)?;
        scene.create(engine)?;
        self.scene = Some(scene);
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) -> anyhow::Result<bool> {
        if state != ElementState::Pressed {
            return Ok(false);
        }
        Ok(self.scene_mut()?.handle_key(key)?)
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
        engine.update_globals(scene.camera_uniform(), Matrix4::from_scale(1.0));
        scene.render(engine)
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = RenderConfig::default()
        .with_title("mobile")
        .with_size(600, 500)
        .with_env_overrides();

    PivotApp::new(config, MobileDemo::default())?.run()
}
