//! Window and event loop shell
//!
//! [`PivotApp`] opens the window, creates the [`RenderEngine`] once the
//! event loop resumes and forwards keys, resizes and redraws to a [`Demo`].
//! `Escape` or a close request ends the loop; `H` prints the demo keymap.

use std::sync::Arc;

use anyhow::Context;
use log::{error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::gfx::rendering::{FrameStats, RenderEngine};

/// A scene plugged into [`PivotApp`].
pub trait Demo {
    /// Help text printed when `H` is pressed.
    fn keymap(&self) -> &str;

    /// Builds the scene and its GPU resources. Called once, after the
    /// engine exists.
    fn initialize(&mut self, engine: &mut RenderEngine, config: &RenderConfig) -> anyhow::Result<()>;

    /// Handles a key press or release. Returns `false` for ignored keys.
    fn handle_key(&mut self, key: KeyCode, state: ElementState) -> anyhow::Result<bool>;

    /// Called after the surface was resized to a non-zero size.
    fn resize(&mut self, engine: &mut RenderEngine, width: u32, height: u32) -> anyhow::Result<()>;

    /// Advances one tick and renders it.
    fn render(&mut self, engine: &mut RenderEngine) -> Result<FrameStats, RenderError>;
}

pub struct PivotApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: RenderConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    demo: Box<dyn Demo>,
    /// First fatal error; ends the loop
    failure: Option<anyhow::Error>,
}

impl PivotApp {
    pub fn new(config: RenderConfig, demo: impl Demo + 'static) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                demo: Box::new(demo),
                failure: None,
            },
        })
    }

    /// Runs the event loop until the window closes or a fatal error occurs.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self.event_loop.take().context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("Failed to run event loop")?;

        match self.app_state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{:#}", e);
        if self.failure.is_none() {
            self.failure = Some(e);
        }
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(self.config.width, self.config.height));
        let window_handle = Arc::new(event_loop.create_window(attributes).context("Failed to create window")?);
        self.window = Some(window_handle.clone());

        let config = self.config.clone();
        let mut renderer = pollster::block_on(async move { RenderEngine::new(window_handle, &config).await })?;
        self.demo
            .initialize(&mut renderer, &self.config)
            .context("Failed to build the scene")?;

        info!("Press H for help");
        self.render_engine = Some(renderer);
        Ok(())
    }

    fn key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) -> anyhow::Result<()> {
        let PhysicalKey::Code(key_code) = event.physical_key else {
            return Ok(());
        };
        let pressed = event.state == ElementState::Pressed;

        match key_code {
            KeyCode::Escape if pressed => event_loop.exit(),
            KeyCode::KeyH if pressed => println!("{}", self.demo.keymap()),
            _ if !event.repeat => {
                self.demo.handle_key(key_code, event.state)?;
            }
            _ => {}
        }
        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.render_engine.is_none() {
            return;
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let Err(e) = self.key(event_loop, event) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width == 0 || height == 0 {
                    return;
                }
                let Some(render_engine) = self.render_engine.as_mut() else {
                    return;
                };
                render_engine.resize(width, height);
                if let Err(e) = self.demo.resize(render_engine, width, height) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let Some(render_engine) = self.render_engine.as_mut() else {
                    return;
                };
                match self.demo.render(render_engine) {
                    Ok(stats) => trace!("{:?}", stats),
                    Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                        render_engine.reconfigure();
                    }
                    Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                        warn!("Surface timed out; skipping frame");
                    }
                    Err(e) => self.fail(event_loop, e.into()),
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
