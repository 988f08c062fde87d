//! The hanging mobile
//!
//! A root hub with two arms: the first carries three ornaments, the second
//! a single pendant. Every node spins about its own Y axis and is joined to
//! its parent by a wire. A wall corner behind the mobile catches the three
//! lights: a directional fill, a point light bobbing on a sine and a spot
//! light sweeping a circle on the floor.

use std::f32::consts::TAU;

use cgmath::{Matrix4, Vector3};
use log::info;
use winit::keyboard::KeyCode;

use crate::config::DisplayResolution;
use crate::error::{RenderError, SceneError, ShapeError};
use crate::gfx::camera::{Camera, CameraUniform, LookAtCamera};
use crate::gfx::geometry::{primitives, BuiltShape, Shape};
use crate::gfx::rendering::{FrameDriver, FrameStats, PostEffect, RenderBackend};
use crate::gfx::scene::{Light, LightSet, MobileNode, NodeId, SceneGraph, Selection, SelectionStyle, ShadingProgram};

/// Rotation speed change per key press: one milliradian per tick, in degrees
pub const SPEED_STEP: f32 = 0.057_295_78;

pub const DIRECTIONAL_SLOT: usize = 0;
pub const POINT_SLOT: usize = 1;
pub const SPOT_SLOT: usize = 2;

const POINT_LIGHT_STEP: f32 = 0.007;
const SPOT_LIGHT_STEP: f32 = 0.005;
const SPOT_CIRCLE_RADIUS: f32 = 0.3;

pub const KEYMAP: &str = "\
- H: Show this help.
- O: Select the next node.
- M / N: Speed up / slow down the selected node.
- R: Stop the selected node.
- B: Toggle blur.
- P: Toggle pixelation.
- Escape: Quit.";

/// Ids of the mobile nodes (root first) and of the wall.
#[derive(Debug, Clone, PartialEq)]
pub struct MobileRig {
    pub nodes: Vec<NodeId>,
    pub wall: NodeId,
}

impl MobileRig {
    pub fn root(&self) -> NodeId {
        self.nodes[0]
    }
}

struct NodePart {
    label: &'static str,
    shapes: Vec<Result<BuiltShape, ShapeError>>,
    translation: Vector3<f32>,
    top: Vector3<f32>,
    bottom: Vector3<f32>,
    /// Index into the node list
    parent: Option<usize>,
}

fn mobile_parts() -> Vec<NodePart> {
    let small = Shape::new().with_height(0.1).with_radius(0.1);
    let teal = small.with_color(Vector3::new(0.0, 0.3, 0.3));
    let rust = small.with_level(5).with_color(Vector3::new(0.5, 0.2, 0.2));
    let short_anchor = (Vector3::new(0.0, 0.05, 0.0), Vector3::new(0.0, -0.05, 0.0));

    vec![
        NodePart {
            label: "hub",
            shapes: vec![small.with_color(Vector3::new(0.5, 0.5, 0.5)).build_cylinder()],
            translation: Vector3::new(0.0, 0.6, 0.0),
            top: short_anchor.0,
            bottom: short_anchor.1,
            parent: None,
        },
        NodePart {
            label: "spool",
            shapes: vec![
                teal.with_radius(0.07)
                    .with_placement(Matrix4::from_translation(Vector3::new(0.0, 0.05, 0.0)))
                    .build_cylinder(),
                teal.build_cylinder(),
                teal.with_radius(0.07)
                    .with_placement(Matrix4::from_translation(Vector3::new(0.0, -0.05, 0.0)))
                    .build_cylinder(),
            ],
            translation: Vector3::new(0.4, -0.3, 0.0),
            top: Vector3::new(0.0, 0.1, 0.0),
            bottom: Vector3::new(0.0, -0.1, 0.0),
            parent: Some(0),
        },
        NodePart {
            label: "cube",
            shapes: vec![small.with_level(4).build_prism()],
            translation: Vector3::new(0.3, -0.3, 0.0),
            top: short_anchor.0,
            bottom: short_anchor.1,
            parent: Some(1),
        },
        NodePart {
            label: "tetra",
            shapes: vec![small.with_color(Vector3::new(0.2, 0.7, 0.2)).build_pyramid()],
            translation: Vector3::new(-0.15, -0.3, 0.26),
            top: short_anchor.0,
            bottom: short_anchor.1,
            parent: Some(1),
        },
        NodePart {
            label: "penta",
            shapes: vec![small.with_level(5).with_color(Vector3::new(0.7, 0.7, 0.2)).build_pyramid()],
            translation: Vector3::new(-0.15, -0.3, -0.26),
            top: short_anchor.0,
            bottom: short_anchor.1,
            parent: Some(1),
        },
        NodePart {
            label: "arm",
            shapes: vec![rust.build_pyramid()],
            translation: Vector3::new(-0.4, -0.3, 0.0),
            top: short_anchor.0,
            bottom: short_anchor.1,
            parent: Some(0),
        },
        NodePart {
            label: "pendant",
            shapes: vec![
                rust.build_pyramid(),
                rust.with_placement(Matrix4::from_translation(Vector3::new(0.0, -0.1, 0.0)))
                    .build_prism(),
            ],
            translation: Vector3::new(0.0, -0.3, 0.0),
            top: short_anchor.0,
            bottom: short_anchor.1,
            parent: Some(5),
        },
    ]
}

/// Adds the seven mobile nodes and the wall to `graph`.
///
/// Every node is lit with `lights`; the wall is a separate root.
pub fn build_mobile(graph: &mut SceneGraph, lights: &LightSet) -> Result<MobileRig, SceneError> {
    let mut nodes = Vec::new();
    for part in mobile_parts() {
        let mut node = MobileNode::new(part.label)
            .with_translation(part.translation)
            .with_anchors(part.top, part.bottom)
            .with_program(ShadingProgram::Lit);
        for shape in part.shapes {
            node.add_shape(shape?)?;
        }
        node.set_lights(*lights);

        let id = graph.add_node(node);
        if let Some(parent) = part.parent {
            graph.add_child(nodes[parent], id)?;
        }
        nodes.push(id);
    }

    let mut wall = MobileNode::new("wall").with_program(ShadingProgram::Lit);
    wall.add_mesh(&primitives::wall(2.0, Vector3::new(-1.0, -1.0, -1.0)))?;
    wall.set_lights(*lights);
    wall.casts_shadow = false;
    let wall = graph.add_node(wall);

    Ok(MobileRig { nodes, wall })
}

/// The three animated lights of the mobile scene.
#[derive(Debug, Clone)]
pub struct MobileLights {
    set: LightSet,
    /// Phase of the point light bob, radians
    bob: f32,
    /// Angle of the spot light target on its circle, radians
    sweep: f32,
}

impl Default for MobileLights {
    fn default() -> Self {
        Self::new()
    }
}

impl MobileLights {
    pub fn new() -> Self {
        let fill = Vector3::new(0.3, 0.2, 0.2);
        let zero = Vector3::new(0.0, 0.0, 0.0);
        let down = Vector3::new(0.0, -1.0, 0.0);

        let mut set = LightSet::new();
        let lights = [
            (
                DIRECTIONAL_SLOT,
                Light::directional(Vector3::new(0.0, 1.0, 0.0), down, fill).with_ambient(fill),
            ),
            (
                POINT_SLOT,
                Light::point(Vector3::new(0.2, 1.0, 0.0), Vector3::new(0.0, 1.0, 0.0), 1.0).with_ambient(zero),
            ),
            (
                SPOT_SLOT,
                Light::spot(Vector3::new(0.0, 1.0, 0.0), down, Vector3::new(0.0, 0.0, 1.0), 20.0, 0.1)
                    .with_ambient(zero),
            ),
        ];
        for (slot, light) in lights {
            if let Some(target) = set.get_mut(slot) {
                *target = light;
            }
        }

        Self {
            set,
            bob: 0.0,
            sweep: 0.0,
        }
    }

    pub fn set(&self) -> &LightSet {
        &self.set
    }

    /// Moves both animated lights one tick forward.
    pub fn advance(&mut self) -> &LightSet {
        self.bob = (self.bob + POINT_LIGHT_STEP).rem_euclid(TAU);
        if let Some(point) = self.set.get_mut(POINT_SLOT) {
            point.position.y = 0.3 + self.bob.sin();
        }

        self.sweep = (self.sweep + SPOT_LIGHT_STEP).rem_euclid(TAU);
        let target = Vector3::new(
            SPOT_CIRCLE_RADIUS * self.sweep.cos(),
            0.0,
            SPOT_CIRCLE_RADIUS * self.sweep.sin(),
        );
        if let Some(spot) = self.set.get_mut(SPOT_SLOT) {
            spot.aim_at(target);
        }

        &self.set
    }
}

/// The mobile with its lights, camera, selection and frame driver.
pub struct MobileScene {
    pub graph: SceneGraph,
    pub rig: MobileRig,
    pub lights: MobileLights,
    pub selection: Selection,
    pub camera: LookAtCamera,
    driver: FrameDriver,
    resolution: DisplayResolution,
}

impl MobileScene {
    /// Builds the scene. `driver` must run a single-pass pipeline.
    pub fn new(driver: FrameDriver, aspect: f32, resolution: DisplayResolution) -> Result<Self, SceneError> {
        let lights = MobileLights::new();
        let mut graph = SceneGraph::new();
        let rig = build_mobile(&mut graph, lights.set())?;

        let mut selection = Selection::new(rig.nodes.clone(), SelectionStyle::Wireframe);
        selection.apply_initial(&mut graph)?;

        let camera = LookAtCamera::new(
            cgmath::Point3::new(1.0, 1.2, 1.5),
            cgmath::Point3::new(0.0, 0.0, 0.0),
            aspect,
        );

        Ok(Self {
            graph,
            rig,
            lights,
            selection,
            camera,
            driver,
            resolution,
        })
    }

    /// Uploads every node once.
    pub fn create<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), RenderError> {
        self.graph.create_all(backend)
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut FrameDriver {
        &mut self.driver
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.camera.uniform()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize_projection(width, height);
    }

    /// Applies a key press. Returns `false` for keys the scene ignores.
    pub fn handle_key(&mut self, key: KeyCode) -> Result<bool, SceneError> {
        match key {
            KeyCode::KeyO => {
                self.selection.next(&mut self.graph)?;
            }
            KeyCode::KeyM => self.edit_speed(SPEED_STEP)?,
            KeyCode::KeyN => self.edit_speed(-SPEED_STEP)?,
            KeyCode::KeyR => {
                if let Some(id) = self.selection.current() {
                    let node = self.graph.node_mut(id)?;
                    node.reset_rotation_speed();
                    info!("Stopped '{}'", node.label());
                }
            }
            KeyCode::KeyB => self.toggle_effect(PostEffect::Blur),
            KeyCode::KeyP => self.toggle_effect(PostEffect::Pixelate(self.resolution)),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn edit_speed(&mut self, delta: f32) -> Result<(), SceneError> {
        if let Some(id) = self.selection.current() {
            let node = self.graph.node_mut(id)?;
            node.add_rotation_speed(delta);
            info!("'{}' spins at {:.4} deg/tick", node.label(), node.rotation_speed());
        }
        Ok(())
    }

    fn toggle_effect(&mut self, effect: PostEffect) {
        let pipeline = self.driver.pipeline_mut();
        let next = if pipeline.effect() == effect {
            PostEffect::None
        } else {
            effect
        };
        pipeline.set_effect(next);
        info!("Post effect: {:?}", next);
    }

    /// Animates the lights and renders one frame.
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<FrameStats, RenderError> {
        let lights = *self.lights.advance();
        self.graph.broadcast_lights(&lights);
        self.driver.render_frame(&mut self.graph, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::backend::testing::RecordingBackend;
    use crate::gfx::rendering::{FramePipeline, PassKind};
    use crate::gfx::resources::{TargetBinding, UnitAllocator};
    use crate::gfx::scene::{FillMode, LightKind};
    use cgmath::{InnerSpace, Vector4};

    const EPS: f32 = 1e-4;

    fn scene() -> MobileScene {
        let mut units = UnitAllocator::new(4);
        let color_unit = units.allocate().unwrap();
        let depth = units.allocate().unwrap();
        let mut targets = TargetBinding::new();
        let color = targets.register("draw", 600, 500, Some(color_unit), depth).unwrap();
        let driver = FrameDriver::new(
            FramePipeline::Single {
                color,
                effect: PostEffect::None,
            },
            targets,
        );
        MobileScene::new(driver, 1.2, DisplayResolution::default()).unwrap()
    }

    #[test]
    fn test_structure() {
        let mut graph = SceneGraph::new();
        let rig = build_mobile(&mut graph, &LightSet::new()).unwrap();

        assert_eq!(rig.nodes.len(), 7);
        assert_eq!(graph.roots(), &[rig.root(), rig.wall]);
        assert_eq!(
            graph.preorder(rig.root()).unwrap(),
            vec![rig.nodes[0], rig.nodes[1], rig.nodes[2], rig.nodes[3], rig.nodes[4], rig.nodes[5], rig.nodes[6]]
        );
        assert_eq!(graph.node(rig.nodes[6]).unwrap().parent(), Some(rig.nodes[5]));

        // three stacked cylinders of 30 slices
        assert_eq!(graph.node(rig.nodes[1]).unwrap().mesh().triangle_count(), 3 * 120);
        assert_eq!(graph.node(rig.nodes[2]).unwrap().mesh().triangle_count(), 16);
        assert_eq!(graph.node(rig.nodes[3]).unwrap().mesh().triangle_count(), 6);
        assert_eq!(graph.node(rig.nodes[6]).unwrap().mesh().triangle_count(), 10 + 20);
        assert_eq!(graph.node(rig.wall).unwrap().mesh().triangle_count(), 6);
    }

    #[test]
    fn test_rest_positions() {
        let mut scene = scene();
        let mut backend = RecordingBackend::new();
        scene.create(&mut backend).unwrap();
        scene.render(&mut backend).unwrap();

        let origin = Vector4::new(0.0, 0.0, 0.0, 1.0);
        let world = |id: NodeId| scene.graph.node(id).unwrap().world_matrix() * origin;

        let pendant = world(scene.rig.nodes[6]);
        assert!((pendant.truncate() - Vector3::new(-0.4, 0.0, 0.0)).magnitude() < EPS);
        let penta = world(scene.rig.nodes[4]);
        assert!((penta.truncate() - Vector3::new(0.25, 0.0, -0.26)).magnitude() < EPS);

        let (start, end) = scene.graph.node(scene.rig.nodes[1]).unwrap().connector().endpoints();
        assert!((start - Vector3::new(0.0, 0.55, 0.0)).magnitude() < EPS);
        assert!((end - Vector3::new(0.4, 0.4, 0.0)).magnitude() < EPS);
    }

    #[test]
    fn test_frame_draws_mobile_and_wall() {
        let mut scene = scene();
        let mut backend = RecordingBackend::new();
        scene.create(&mut backend).unwrap();

        let stats = scene.render(&mut backend).unwrap();
        assert_eq!(stats.ticked, 8);
        assert_eq!(stats.color_draws, 8);
        assert_eq!(stats.connector_draws, 6);
        assert_eq!(backend.passes(), vec![PassKind::Color, PassKind::Display]);
        assert_eq!(backend.node_draws(PassKind::Color).last(), Some(&scene.rig.wall));
    }

    #[test]
    fn test_speed_keys_edit_selected_node() {
        let mut scene = scene();
        let root = scene.rig.root();
        assert_eq!(scene.graph.node(root).unwrap().fill, FillMode::Wireframe);

        assert!(scene.handle_key(KeyCode::KeyM).unwrap());
        assert!(scene.handle_key(KeyCode::KeyM).unwrap());
        assert!((scene.graph.node(root).unwrap().rotation_speed() - 2.0 * SPEED_STEP).abs() < 1e-6);

        assert!(scene.handle_key(KeyCode::KeyO).unwrap());
        let spool = scene.rig.nodes[1];
        assert_eq!(scene.selection.current(), Some(spool));
        scene.handle_key(KeyCode::KeyN).unwrap();
        assert!((scene.graph.node(spool).unwrap().rotation_speed() + SPEED_STEP).abs() < 1e-6);

        scene.handle_key(KeyCode::KeyR).unwrap();
        assert_eq!(scene.graph.node(spool).unwrap().rotation_speed(), 0.0);
        assert!(scene.graph.node(root).unwrap().rotation_speed() > 0.0);
        assert!(!scene.handle_key(KeyCode::KeyZ).unwrap());
    }

    #[test]
    fn test_effect_toggles() {
        let mut scene = scene();
        scene.handle_key(KeyCode::KeyB).unwrap();
        assert_eq!(scene.driver().pipeline().effect(), PostEffect::Blur);
        scene.handle_key(KeyCode::KeyP).unwrap();
        assert_eq!(
            scene.driver().pipeline().effect(),
            PostEffect::Pixelate(DisplayResolution::default())
        );
        scene.handle_key(KeyCode::KeyP).unwrap();
        assert_eq!(scene.driver().pipeline().effect(), PostEffect::None);
    }

    #[test]
    fn test_lights_animate() {
        let mut lights = MobileLights::new();
        assert_eq!(lights.set().active_count(), 3);
        assert_eq!(lights.set().get(SPOT_SLOT).unwrap().kind, LightKind::Spot);

        let set = *lights.advance();
        let point = set.get(POINT_SLOT).unwrap();
        assert!((point.position.y - (0.3 + POINT_LIGHT_STEP.sin())).abs() < 1e-6);

        let spot = set.get(SPOT_SLOT).unwrap();
        let target = Vector3::new(0.3 * SPOT_LIGHT_STEP.cos(), 0.0, 0.3 * SPOT_LIGHT_STEP.sin());
        let expected = (target - spot.position).normalize();
        assert!((spot.direction - expected).magnitude() < 1e-5);
    }

    #[test]
    fn test_lights_reach_every_node() {
        let mut scene = scene();
        let mut backend = RecordingBackend::new();
        scene.create(&mut backend).unwrap();
        scene.render(&mut backend).unwrap();

        let expected = *scene.lights.set();
        for (_, node) in scene.graph.iter() {
            assert_eq!(node.capabilities.lights.map(|b| b.lights), Some(expected));
        }
    }
}
