//! # Frame Driver
//!
//! Runs one frame of either pipeline against a [`RenderBackend`]:
//!
//! - **Single**: tick-and-draw every tree into the color target, then the
//!   display pass.
//! - **Multi**: tick every tree, refresh every wire, then the shadow pass,
//!   the color pass and the display pass in that order.
//!
//! The driver owns the [`TargetBinding`], so a target is always unbound
//! before any later pass samples it.

use log::{info, trace, warn};

use super::backend::{PassKind, PassTarget, RenderBackend};
use super::draw_state::{resolve_node, DisplayDrawState, PostEffect};
use crate::error::RenderError;
use crate::gfx::resources::render_target::{TargetBinding, TargetId};
use crate::gfx::scene::graph::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePipeline {
    Single {
        color: TargetId,
        effect: PostEffect,
    },
    Multi {
        shadow: TargetId,
        color: TargetId,
        effect: PostEffect,
    },
}

impl FramePipeline {
    pub fn effect(&self) -> PostEffect {
        match self {
            Self::Single { effect, .. } | Self::Multi { effect, .. } => *effect,
        }
    }

    pub fn set_effect(&mut self, new_effect: PostEffect) {
        match self {
            Self::Single { effect, .. } | Self::Multi { effect, .. } => *effect = new_effect,
        }
    }

    pub fn color_target(&self) -> TargetId {
        match self {
            Self::Single { color, .. } | Self::Multi { color, .. } => *color,
        }
    }
}

/// Draw counts of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub ticked: usize,
    pub shadow_draws: usize,
    pub color_draws: usize,
    pub connector_draws: usize,
    pub connector_updates: usize,
    pub display_draws: usize,
}

#[derive(Debug)]
pub struct FrameDriver {
    pipeline: FramePipeline,
    targets: TargetBinding,
    pass_debug: bool,
    frame: u64,
}

impl FrameDriver {
    pub fn new(pipeline: FramePipeline, targets: TargetBinding) -> Self {
        Self {
            pipeline,
            targets,
            pass_debug: false,
            frame: 0,
        }
    }

    /// Logs pass boundaries at `info` instead of `trace`.
    pub fn with_pass_debug(mut self, enabled: bool) -> Self {
        self.pass_debug = enabled;
        self
    }

    pub fn pipeline(&self) -> &FramePipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut FramePipeline {
        &mut self.pipeline
    }

    pub fn targets(&self) -> &TargetBinding {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetBinding {
        &mut self.targets
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn render_frame<B: RenderBackend + ?Sized>(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut B,
    ) -> Result<FrameStats, RenderError> {
        let mut stats = FrameStats::default();
        backend.begin_frame()?;

        match self.pipeline {
            FramePipeline::Single { color, effect } => {
                self.offscreen_pass(backend, PassKind::Color, color, |backend, targets| {
                    for root in graph.roots().to_vec() {
                        graph.draw(root, backend, targets, &mut stats)?;
                    }
                    Ok(())
                })?;

                self.display(backend, color, effect, &mut stats)?;
            }
            FramePipeline::Multi {
                shadow,
                color,
                effect,
            } => {
                let order = graph.tick_all()?;
                stats.ticked = order.len();

                for &id in &order {
                    let node = graph.node(id)?;
                    if node.parent().is_some() {
                        backend.update_connector(id, node.connector())?;
                        stats.connector_updates += 1;
                    }
                }

                self.offscreen_pass(backend, PassKind::Shadow, shadow, |backend, targets| {
                    for &id in &order {
                        let node = graph.node(id)?;
                        if !node.casts_shadow {
                            continue;
                        }
                        let state = resolve_node(id, node, PassKind::Shadow, targets)?;
                        backend.draw_node(&state)?;
                        stats.shadow_draws += 1;
                    }
                    Ok(())
                })?;

                self.offscreen_pass(backend, PassKind::Color, color, |backend, targets| {
                    for &id in &order {
                        let node = graph.node(id)?;
                        if !node.visible {
                            continue;
                        }
                        let state = resolve_node(id, node, PassKind::Color, targets)?;
                        backend.draw_node(&state)?;
                        stats.color_draws += 1;

                        if node.parent().is_some() {
                            backend.draw_connector(id)?;
                            stats.connector_draws += 1;
                        }
                    }
                    Ok(())
                })?;

                self.display(backend, color, effect, &mut stats)?;
            }
        }

        backend.end_frame()?;
        self.frame += 1;
        trace!("Frame {}: {:?}", self.frame, stats);
        Ok(stats)
    }

    /// Runs `body` inside an offscreen pass on `target`.
    ///
    /// The pass is ended and the target unbound even when `body` fails, so
    /// a failed frame does not leave the driver or the backend wedged.
    fn offscreen_pass<B, F>(
        &mut self,
        backend: &mut B,
        kind: PassKind,
        target: TargetId,
        body: F,
    ) -> Result<(), RenderError>
    where
        B: RenderBackend + ?Sized,
        F: FnOnce(&mut B, &TargetBinding) -> Result<(), RenderError>,
    {
        self.targets.bind(target)?;
        self.log_pass("begin", kind);
        if let Err(e) = backend.begin_pass(kind, PassTarget::Offscreen(target)) {
            self.targets.unbind()?;
            return Err(e);
        }

        let drawn = body(backend, &self.targets);
        let ended = backend.end_pass();
        self.targets.unbind()?;
        if drawn.is_err() {
            warn!("Frame {}: {:?} pass aborted", self.frame, kind);
        }
        self.log_pass("end", kind);
        drawn.and(ended)
    }

    fn display<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        color: TargetId,
        effect: PostEffect,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        let desc = self.targets.desc(color)?;
        let state = DisplayDrawState {
            source: desc.color_unit()?,
            depth: Some(desc.depth),
            effect,
        };
        self.targets.check_sample(state.source)?;

        self.log_pass("begin", PassKind::Display);
        backend.begin_pass(PassKind::Display, PassTarget::Surface)?;
        let drawn = backend.draw_display(&state);
        let ended = backend.end_pass();
        drawn.and(ended)?;
        stats.display_draws += 1;
        self.log_pass("end", PassKind::Display);
        Ok(())
    }

    fn log_pass(&self, phase: &str, kind: PassKind) {
        if self.pass_debug {
            info!("Frame {}: {} {:?} pass", self.frame, phase, kind);
        } else {
            trace!("Frame {}: {} {:?} pass", self.frame, phase, kind);
        }
    }
}
