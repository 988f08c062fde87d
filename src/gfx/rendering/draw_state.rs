//! Per-draw state resolved from a node's capabilities
//!
//! Resolution is where missing resources are caught: a node whose program
//! needs a texture, shadow map, lights or brush that was never assigned
//! fails on its first draw instead of rendering garbage.

use cgmath::Matrix4;
use log::error;

use super::backend::PassKind;
use crate::config::DisplayResolution;
use crate::error::RenderError;
use crate::gfx::resources::render_target::TargetBinding;
use crate::gfx::resources::unit_allocator::TextureUnit;
use crate::gfx::scene::light::LightSet;
use crate::gfx::scene::node::{FillMode, MobileNode, NodeId, ShadingProgram};

/// Pipeline selected for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawProgram {
    Depth,
    VertexColor,
    Lit,
    Textured,
    ShadowedTextured,
}

impl From<ShadingProgram> for DrawProgram {
    fn from(program: ShadingProgram) -> Self {
        match program {
            ShadingProgram::VertexColor => Self::VertexColor,
            ShadingProgram::Lit => Self::Lit,
            ShadingProgram::Textured => Self::Textured,
            ShadingProgram::ShadowedTextured => Self::ShadowedTextured,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDrawState {
    pub node: NodeId,
    pub world: Matrix4<f32>,
    pub program: DrawProgram,
    pub fill: FillMode,
    pub texture: Option<TextureUnit>,
    pub brush: Option<TextureUnit>,
    pub shadow_map: Option<TextureUnit>,
    pub lights: Option<LightSet>,
    pub selected: bool,
}

/// Screen-space effect of the display pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostEffect {
    #[default]
    None,
    Blur,
    Pixelate(DisplayResolution),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayDrawState {
    pub source: TextureUnit,
    pub depth: Option<TextureUnit>,
    pub effect: PostEffect,
}

/// Builds the draw state of `node` for `pass`.
///
/// The shadow pass always uses the depth program. The color pass checks
/// capabilities in a fixed order: program, texture, shadow map, lights,
/// then brush.
pub fn resolve_node(
    id: NodeId,
    node: &MobileNode,
    pass: PassKind,
    targets: &TargetBinding,
) -> Result<NodeDrawState, RenderError> {
    if pass == PassKind::Shadow {
        return Ok(NodeDrawState {
            node: id,
            world: node.world_matrix(),
            program: DrawProgram::Depth,
            fill: FillMode::Fill,
            texture: None,
            brush: None,
            shadow_map: None,
            lights: None,
            selected: false,
        });
    }

    resolve_color(id, node, targets).inspect_err(|e| {
        error!("Cannot draw '{}' ({}): {}", node.label(), id, e);
    })
}

fn resolve_color(id: NodeId, node: &MobileNode, targets: &TargetBinding) -> Result<NodeDrawState, RenderError> {
    let program = node.program.ok_or(RenderError::MissingProgram(id))?;
    let caps = &node.capabilities;

    let (texture, brush) = match caps.texture {
        Some(binding) => (Some(binding.texture), binding.brush),
        None if program.needs_texture() => return Err(RenderError::MissingTexture(id)),
        None => (None, None),
    };

    let shadow_map = match caps.shadow {
        Some(binding) => Some(binding.shadow_map),
        None if program.needs_shadow() => return Err(RenderError::MissingShadowMap(id)),
        None => None,
    };

    let lights = match caps.lights {
        Some(binding) => Some(binding.lights),
        None if program.needs_lights() => return Err(RenderError::MissingLights(id)),
        None => None,
    };

    if program.needs_brush() && brush.is_none() {
        return Err(RenderError::MissingBrush(id));
    }

    for unit in [texture, brush, shadow_map].into_iter().flatten() {
        targets.check_sample(unit)?;
    }

    Ok(NodeDrawState {
        node: id,
        world: node.world_matrix(),
        program: program.into(),
        fill: node.fill,
        texture,
        brush,
        shadow_map,
        lights,
        selected: node.selected,
    })
}
