//! # Scene Graph Nodes
//!
//! A [`MobileNode`] is one rigid body of the hierarchy. It owns its merged
//! mesh, its motion state and the wire to its parent. Parent and child
//! links are [`NodeId`] indices into the owning
//! [`SceneGraph`](super::graph::SceneGraph) arena.
//!
//! Optional rendering capabilities (texture, shadow map, lights) are plain
//! structs held in [`Capabilities`]; the draw step checks them in a fixed
//! order against what the node's [`ShadingProgram`] requires.

use std::fmt;

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};
use log::debug;

use super::connector::Connector;
use super::light::LightSet;
use crate::error::{SceneError, ShapeError};
use crate::gfx::geometry::{BuiltShape, MeshBuffer};
use crate::gfx::resources::unit_allocator::TextureUnit;

/// Stable handle of a node inside a scene graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// `Uninitialized` until the one-time create step uploads the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Uninitialized,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    Fill,
    Wireframe,
}

/// Shading path used for a node in the color pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingProgram {
    /// Unlit vertex colors
    VertexColor,
    /// Vertex colors lit by the node's lights
    Lit,
    /// Texture modulated by the node's lights
    Textured,
    /// Textured and lit, with shadow-map occlusion and the brush selection effect
    ShadowedTextured,
}

impl ShadingProgram {
    pub fn needs_texture(self) -> bool {
        matches!(self, Self::Textured | Self::ShadowedTextured)
    }

    pub fn needs_shadow(self) -> bool {
        matches!(self, Self::ShadowedTextured)
    }

    pub fn needs_lights(self) -> bool {
        !matches!(self, Self::VertexColor)
    }

    pub fn needs_brush(self) -> bool {
        matches!(self, Self::ShadowedTextured)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub texture: TextureUnit,
    pub brush: Option<TextureUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowBinding {
    pub shadow_map: TextureUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightBinding {
    pub lights: LightSet,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    pub texture: Option<TextureBinding>,
    pub shadow: Option<ShadowBinding>,
    pub lights: Option<LightBinding>,
}

#[derive(Debug, Clone)]
pub struct MobileNode {
    label: String,
    mesh: MeshBuffer,

    translation: Vector3<f32>,
    /// Degrees, kept in `[0, 360)`
    rotation_angle: f32,
    /// Degrees per tick
    rotation_speed: f32,
    top_position: Vector3<f32>,
    bottom_position: Vector3<f32>,
    local_matrix: Matrix4<f32>,
    world_matrix: Matrix4<f32>,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) connector: Connector,
    pub(crate) state: NodeState,

    pub program: Option<ShadingProgram>,
    pub capabilities: Capabilities,
    pub fill: FillMode,
    pub visible: bool,
    pub casts_shadow: bool,
    pub selected: bool,
}

impl MobileNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            mesh: MeshBuffer::new(),
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation_angle: 0.0,
            rotation_speed: 0.0,
            top_position: Vector3::new(0.0, 0.0, 0.0),
            bottom_position: Vector3::new(0.0, 0.0, 0.0),
            local_matrix: Matrix4::identity(),
            world_matrix: Matrix4::identity(),
            parent: None,
            children: Vec::new(),
            connector: Connector::new(),
            state: NodeState::Uninitialized,
            program: None,
            capabilities: Capabilities::default(),
            fill: FillMode::Fill,
            visible: true,
            casts_shadow: true,
            selected: false,
        }
    }

    /// Merges a built shape into the node mesh, placing positions and
    /// normals with the shape's placement matrix.
    pub fn add_shape(&mut self, shape: BuiltShape) -> Result<(), SceneError> {
        if self.state == NodeState::Active {
            return Err(SceneError::MeshFrozen {
                label: self.label.clone(),
            });
        }
        self.mesh.append_transformed(&shape.mesh, shape.placement)?;
        debug!(
            "Node '{}' now has {} triangles",
            self.label,
            self.mesh.triangle_count()
        );
        Ok(())
    }

    /// Merges a mesh that is already in node space.
    pub fn add_mesh(&mut self, mesh: &MeshBuffer) -> Result<(), SceneError> {
        self.add_shape(BuiltShape {
            mesh: mesh.clone(),
            placement: Matrix4::identity(),
        })
    }

    pub fn with_shape(mut self, shape: Result<BuiltShape, ShapeError>) -> Result<Self, SceneError> {
        self.add_shape(shape?)?;
        Ok(self)
    }

    pub fn with_translation(mut self, translation: Vector3<f32>) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_anchors(mut self, top: Vector3<f32>, bottom: Vector3<f32>) -> Self {
        self.top_position = top;
        self.bottom_position = bottom;
        self
    }

    pub fn with_program(mut self, program: ShadingProgram) -> Self {
        self.program = Some(program);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mesh(&self) -> &MeshBuffer {
        &self.mesh
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    pub fn translation(&self) -> Vector3<f32> {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.translation = translation;
    }

    pub fn top_position(&self) -> Vector3<f32> {
        self.top_position
    }

    pub fn set_top_position(&mut self, position: Vector3<f32>) {
        self.top_position = position;
    }

    pub fn bottom_position(&self) -> Vector3<f32> {
        self.bottom_position
    }

    pub fn set_bottom_position(&mut self, position: Vector3<f32>) {
        self.bottom_position = position;
    }

    /// Static matrix applied after translation and spin, identity by default.
    pub fn set_local_matrix(&mut self, matrix: Matrix4<f32>) {
        self.local_matrix = matrix;
    }

    pub fn local_matrix(&self) -> Matrix4<f32> {
        self.local_matrix
    }

    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }

    pub fn set_rotation_angle(&mut self, degrees: f32) {
        self.rotation_angle = wrap_degrees(degrees);
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn set_rotation_speed(&mut self, degrees_per_tick: f32) {
        self.rotation_speed = degrees_per_tick;
    }

    pub fn add_rotation_speed(&mut self, delta: f32) {
        self.rotation_speed += delta;
    }

    pub fn reset_rotation_speed(&mut self) {
        self.rotation_speed = 0.0;
    }

    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.world_matrix
    }

    pub(crate) fn set_world_matrix(&mut self, world: Matrix4<f32>) {
        self.world_matrix = world;
    }

    pub fn advance_rotation(&mut self) {
        self.rotation_angle = wrap_degrees(self.rotation_angle + self.rotation_speed);
    }

    /// `translate(translation) * rotate_y(angle) * local_matrix`
    pub fn local_transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from_angle_y(Deg(self.rotation_angle))
            * self.local_matrix
    }

    pub fn set_texture(&mut self, texture: TextureUnit) {
        let brush = self.capabilities.texture.and_then(|binding| binding.brush);
        self.capabilities.texture = Some(TextureBinding { texture, brush });
    }

    /// Only meaningful once a texture is bound.
    pub fn set_brush(&mut self, brush: TextureUnit) {
        if let Some(binding) = self.capabilities.texture.as_mut() {
            binding.brush = Some(brush);
        }
    }

    pub fn set_shadow_map(&mut self, shadow_map: TextureUnit) {
        self.capabilities.shadow = Some(ShadowBinding { shadow_map });
    }

    pub fn set_lights(&mut self, lights: LightSet) {
        self.capabilities.lights = Some(LightBinding { lights });
    }

    pub fn lights_mut(&mut self) -> Option<&mut LightSet> {
        self.capabilities.lights.as_mut().map(|binding| &mut binding.lights)
    }
}

/// Wraps into `[0, 360)`.
///
/// `rem_euclid` rounds tiny negative angles up to exactly `360.0`.
fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::Shape;

    #[test]
    fn test_rotation_wraps() {
        let mut node = MobileNode::new("spinner");
        node.set_rotation_angle(359.0);
        node.set_rotation_speed(2.0);
        node.advance_rotation();
        assert!((node.rotation_angle() - 1.0).abs() < 1e-4);

        node.set_rotation_speed(-3.0);
        node.advance_rotation();
        assert!((node.rotation_angle() - 358.0).abs() < 1e-4);

        node.set_rotation_angle(0.0);
        node.set_rotation_speed(-1e-6);
        node.advance_rotation();
        assert!(node.rotation_angle() >= 0.0 && node.rotation_angle() < 360.0);

        node.set_rotation_angle(-1e-6);
        assert!(node.rotation_angle() < 360.0);
    }

    #[test]
    fn test_speed_edits() {
        let mut node = MobileNode::new("spinner");
        node.add_rotation_speed(0.5);
        node.add_rotation_speed(0.25);
        assert_eq!(node.rotation_speed(), 0.75);
        node.reset_rotation_speed();
        assert_eq!(node.rotation_speed(), 0.0);
    }

    #[test]
    fn test_add_shape_merges_and_freezes() {
        let shape = Shape::new().with_height(0.1).with_radius(0.1).with_level(4);
        let mut node = MobileNode::new("hub")
            .with_shape(shape.build_prism())
            .unwrap();
        node.add_shape(shape.build_pyramid().unwrap()).unwrap();
        assert_eq!(node.mesh().triangle_count(), 16 + 8);

        node.state = NodeState::Active;
        assert_eq!(
            node.add_shape(shape.build_pyramid().unwrap()),
            Err(SceneError::MeshFrozen {
                label: "hub".to_string()
            })
        );
        assert_eq!(node.mesh().triangle_count(), 24);
    }

    #[test]
    fn test_invalid_shape_propagates() {
        let result = MobileNode::new("bad").with_shape(Shape::new().with_level(1).build_pyramid());
        assert!(matches!(result, Err(SceneError::Shape(ShapeError::InvalidLevel { .. }))));
    }

    #[test]
    fn test_brush_keeps_texture() {
        let mut units = crate::gfx::resources::unit_allocator::UnitAllocator::new(4);
        let texture = units.allocate().unwrap();
        let brush = units.allocate().unwrap();
        let other = units.allocate().unwrap();

        let mut node = MobileNode::new("prop");
        node.set_brush(brush);
        assert!(node.capabilities.texture.is_none());

        node.set_texture(texture);
        node.set_brush(brush);
        node.set_texture(other);
        assert_eq!(
            node.capabilities.texture,
            Some(TextureBinding {
                texture: other,
                brush: Some(brush)
            })
        );
    }

    #[test]
    fn test_program_requirements() {
        assert!(!ShadingProgram::VertexColor.needs_lights());
        assert!(ShadingProgram::Lit.needs_lights());
        assert!(!ShadingProgram::Lit.needs_texture());
        assert!(ShadingProgram::ShadowedTextured.needs_shadow());
        assert!(ShadingProgram::ShadowedTextured.needs_brush());
        assert!(!ShadingProgram::Textured.needs_brush());
    }
}
