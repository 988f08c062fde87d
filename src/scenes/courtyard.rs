//! The shadowed courtyard
//!
//! A statue, two cats and a helicopter stand on a land plane under a sky
//! box. A yellow point light circles overhead and casts the shadows; a
//! small yellow cat marks where it is. The viewer walks around as a cat
//! that follows the fly camera.
//!
//! Models come from OBJ files when a model directory is given. Any model
//! that fails to load is replaced by a procedural stand-in so the scene
//! always builds.

use std::path::Path;

use cgmath::{Deg, Matrix3, Matrix4, Rad, Vector2, Vector3};
use log::{debug, info, warn};
use rand::Rng;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::config::DisplayResolution;
use crate::error::{RenderError, ResourceError, SceneError, ShapeError};
use crate::gfx::camera::{Camera, CameraController, CameraManager, CameraUniform, FlyCamera};
use crate::gfx::geometry::{primitives, BuiltShape, MeshBuffer, Shape};
use crate::gfx::rendering::{FrameDriver, FrameStats, PostEffect, RenderBackend};
use crate::gfx::resources::procedural::BRUSH_STROKES;
use crate::gfx::resources::{light_view_projection, ImageData, TextureUnit};
use crate::gfx::scene::{Light, LightSet, MobileNode, NodeId, SceneGraph, Selection, SelectionStyle, ShadingProgram};
use crate::loaders::load_obj;

pub const BACKGROUND_SLOT: usize = 0;
pub const MAIN_SLOT: usize = 1;

/// Orbit step of the main light, radians per tick
pub const ORBIT_STEP: f32 = 0.002;

/// Pixelation resolution change per tick while `U` or `I` is held
pub const RESOLUTION_STEP: i32 = 2;

/// Half extent and depth of the light's orthographic box
const LIGHT_BOX: (f32, f32) = (10.0, 20.0);

const BRUSH_SIZE: u32 = 512;

pub const KEYMAP: &str = "\
- H: Show this help.
- R: Select the next model.
- W / S: Move forward / backward.
- A / D: Move left / right.
- Q / E: Look left / right.
- O / P: Look up / down.
- U / I: Increase / decrease the resolution.
- Escape: Quit.";

/// Texture units of every courtyard surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourtyardTextures {
    pub sky: TextureUnit,
    pub land: TextureUnit,
    pub statue: TextureUnit,
    pub cat_dark: TextureUnit,
    pub cat_light: TextureUnit,
    pub chopper: TextureUnit,
    pub marker: TextureUnit,
    pub brush: TextureUnit,
    /// Depth attachment of the shadow target
    pub shadow_map: TextureUnit,
}

impl CourtyardTextures {
    /// Generates the stand-in images and hands each one to `upload`.
    pub fn create<R, F>(rng: &mut R, shadow_map: TextureUnit, mut upload: F) -> Result<Self, ResourceError>
    where
        R: Rng,
        F: FnMut(&ImageData, &str) -> Result<TextureUnit, ResourceError>,
    {
        Ok(Self {
            sky: upload(&ImageData::checker(64, 8, [12, 16, 40, 255], [20, 26, 58, 255]), "Sky")?,
            land: upload(&ImageData::checker(256, 32, [70, 110, 50, 255], [60, 96, 44, 255]), "Land")?,
            statue: upload(&ImageData::solid([205, 200, 185, 255]), "Statue")?,
            cat_dark: upload(&ImageData::solid([70, 60, 60, 255]), "Cat Dark")?,
            cat_light: upload(&ImageData::solid([225, 215, 200, 255]), "Cat Light")?,
            chopper: upload(&ImageData::checker(64, 16, [90, 96, 70, 255], [60, 64, 48, 255]), "Chopper")?,
            marker: upload(&ImageData::solid([255, 255, 0, 255]), "Marker")?,
            brush: upload(&ImageData::brush(rng, BRUSH_SIZE, BRUSH_STROKES), "Brush")?,
            shadow_map,
        })
    }
}

/// Model meshes of the courtyard
#[derive(Debug, Clone)]
pub struct CourtyardMeshes {
    pub statue: MeshBuffer,
    pub cat: MeshBuffer,
    pub chopper: MeshBuffer,
}

impl CourtyardMeshes {
    /// Loads `Jesus.obj`, `Cat.obj` and `Chopper.obj` from `dir`.
    ///
    /// Without a directory, or for a file that fails to load, the
    /// procedural stand-in is used instead.
    pub fn load(dir: Option<&Path>) -> Result<Self, ShapeError> {
        Ok(Self {
            statue: load_or(dir, "Jesus.obj", stand_in_statue)?,
            cat: load_or(dir, "Cat.obj", stand_in_cat)?,
            chopper: load_or(dir, "Chopper.obj", stand_in_chopper)?,
        })
    }

    pub fn stand_ins() -> Result<Self, ShapeError> {
        Self::load(None)
    }
}

fn load_or(
    dir: Option<&Path>,
    file: &str,
    stand_in: fn() -> Result<MeshBuffer, ShapeError>,
) -> Result<MeshBuffer, ShapeError> {
    let Some(dir) = dir else {
        debug!("Using stand-in for {}", file);
        return stand_in();
    };
    match load_obj(dir.join(file)) {
        Ok(mesh) => {
            info!("Loaded {} ({} triangles)", file, mesh.triangle_count());
            Ok(mesh)
        }
        Err(e) => {
            warn!("{}; using stand-in", e);
            stand_in()
        }
    }
}

fn merge(parts: Vec<Result<BuiltShape, ShapeError>>) -> Result<MeshBuffer, ShapeError> {
    let mut mesh = MeshBuffer::new();
    for part in parts {
        let part = part?;
        mesh.append_transformed(&part.mesh, part.placement)?;
    }
    Ok(mesh)
}

fn lift(y: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(0.0, y, 0.0))
}

/// Robed figure with outstretched arms standing on the origin.
fn stand_in_statue() -> Result<MeshBuffer, ShapeError> {
    merge(vec![
        Shape::new().with_height(2.4).with_radius(0.6).with_placement(lift(1.2)).build_cone(),
        Shape::new().with_height(0.5).with_radius(0.3).with_placement(lift(2.6)).build_cylinder(),
        Shape::new()
            .with_height(0.25)
            .with_radius(1.2)
            .with_level(4)
            .with_placement(lift(2.0))
            .build_prism(),
    ])
}

/// Small seated cat facing +Z.
fn stand_in_cat() -> Result<MeshBuffer, ShapeError> {
    let ear = |x: f32| {
        Shape::new()
            .with_height(0.1)
            .with_radius(0.05)
            .with_placement(Matrix4::from_translation(Vector3::new(x, 0.5, 0.05)))
            .build_pyramid()
    };
    merge(vec![
        Shape::new().with_height(0.3).with_radius(0.15).with_level(6).with_placement(lift(0.15)).build_prism(),
        Shape::new().with_height(0.16).with_radius(0.12).with_level(6).with_placement(lift(0.38)).build_prism(),
        ear(-0.07),
        ear(0.07),
    ])
}

/// Helicopter in a Z-up frame at ten times its scene size, nose along -X.
fn stand_in_chopper() -> Result<MeshBuffer, ShapeError> {
    let along_x = Matrix4::from_angle_z(Deg(90.0));
    let along_z = Matrix4::from_angle_x(Deg(90.0));
    merge(vec![
        Shape::new()
            .with_height(16.0)
            .with_radius(4.0)
            .with_placement(Matrix4::from_translation(Vector3::new(0.0, 0.0, 5.0)) * along_x)
            .build_cylinder(),
        Shape::new()
            .with_height(18.0)
            .with_radius(1.0)
            .with_level(4)
            .with_placement(Matrix4::from_translation(Vector3::new(16.0, 0.0, 6.0)) * along_x)
            .build_prism(),
        Shape::new()
            .with_height(0.6)
            .with_radius(14.0)
            .with_level(4)
            .with_placement(Matrix4::from_translation(Vector3::new(0.0, 0.0, 10.0)) * along_z)
            .build_prism(),
    ])
}

/// Ids of the courtyard nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourtyardRig {
    pub avatar: NodeId,
    pub marker: NodeId,
    pub sky: NodeId,
    pub land: NodeId,
    pub statue: NodeId,
    pub cat_dark: NodeId,
    pub cat_light: NodeId,
    pub chopper: NodeId,
}

impl CourtyardRig {
    /// Models the selection cycles through, in order.
    pub fn selectable(&self) -> Vec<NodeId> {
        vec![self.statue, self.cat_dark, self.cat_light, self.chopper, self.land]
    }
}

/// Dim blue directional fill and the yellow shadow-casting point light.
pub fn courtyard_lights() -> LightSet {
    let blue = Vector3::new(0.0, 0.2, 0.4);
    let yellow = Vector3::new(1.0, 1.0, 0.0);

    let mut lights = LightSet::new();
    if let Some(slot) = lights.get_mut(BACKGROUND_SLOT) {
        *slot = Light::directional(Vector3::new(0.0, 4.0, 0.0), Vector3::new(0.0, -1.0, 0.0), blue).with_ambient(blue);
    }
    if let Some(slot) = lights.get_mut(MAIN_SLOT) {
        *slot = Light::point(Vector3::new(3.0, 6.0, 3.0), yellow, 0.03).with_ambient(Vector3::new(0.0, 0.0, 0.0));
    }
    lights
}

/// Adds every courtyard node as its own root.
///
/// Sky and land stay out of the shadow pass.
pub fn build_courtyard(
    graph: &mut SceneGraph,
    meshes: &CourtyardMeshes,
    textures: &CourtyardTextures,
    lights: &LightSet,
) -> Result<CourtyardRig, SceneError> {
    let mut add = |label: &str, mesh: &MeshBuffer, texture: TextureUnit, local: Matrix4<f32>, casts_shadow: bool| {
        let mut node = MobileNode::new(label).with_program(ShadingProgram::ShadowedTextured);
        node.add_mesh(mesh)?;
        node.set_local_matrix(local);
        node.set_texture(texture);
        node.set_brush(textures.brush);
        node.set_shadow_map(textures.shadow_map);
        node.set_lights(*lights);
        node.casts_shadow = casts_shadow;
        Ok::<_, SceneError>(graph.add_node(node))
    };

    let identity = Matrix4::from_scale(1.0);
    let sky = primitives::skybox(Vector3::new(30.0, 30.0, 30.0), Vector3::new(0.0, 0.0, 0.0));
    let land = primitives::land(Vector2::new(30.0, 30.0), 0.0);

    let rig = CourtyardRig {
        avatar: add("avatar", &meshes.cat, textures.cat_light, identity, true)?,
        marker: add("light marker", &meshes.cat, textures.marker, identity, true)?,
        sky: add("sky", &sky, textures.sky, identity, false)?,
        land: add("land", &land, textures.land, identity, false)?,
        statue: add("statue", &meshes.statue, textures.statue, Matrix4::from_scale(0.7), true)?,
        cat_dark: add(
            "dark cat",
            &meshes.cat,
            textures.cat_dark,
            Matrix4::from_translation(Vector3::new(3.0, 0.0, 0.0)) * Matrix4::from_scale(2.0),
            true,
        )?,
        cat_light: add(
            "light cat",
            &meshes.cat,
            textures.cat_light,
            Matrix4::from_translation(Vector3::new(0.0, 0.0, 3.0)) * Matrix4::from_scale(2.0),
            true,
        )?,
        chopper: add(
            "chopper",
            &meshes.chopper,
            textures.chopper,
            Matrix4::from_translation(Vector3::new(-3.0, 1.0, 0.0))
                * Matrix4::from_angle_y(Deg(180.0))
                * Matrix4::from_angle_x(Deg(-90.0))
                * Matrix4::from_scale(0.1),
            true,
        )?,
    };
    Ok(rig)
}

/// Light position circling the Y axis at a fixed height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitingLight {
    pub position: Vector3<f32>,
    /// Radians per tick
    pub step: f32,
}

impl OrbitingLight {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            step: ORBIT_STEP,
        }
    }

    pub fn advance(&mut self) -> Vector3<f32> {
        self.position = Matrix3::from_angle_y(Rad(self.step)) * self.position;
        self.position
    }
}

/// The courtyard with its camera, lights, selection and frame driver.
pub struct CourtyardScene {
    pub graph: SceneGraph,
    pub rig: CourtyardRig,
    pub lights: LightSet,
    pub orbit: OrbitingLight,
    pub selection: Selection,
    pub camera: CameraManager,
    driver: FrameDriver,
    resolution: DisplayResolution,
    resolution_speed: i32,
    light_view_proj: Matrix4<f32>,
}

impl CourtyardScene {
    /// Builds the scene. `driver` must run the multi-pass pipeline whose
    /// shadow target owns `textures.shadow_map`.
    pub fn new(
        driver: FrameDriver,
        meshes: &CourtyardMeshes,
        textures: &CourtyardTextures,
        aspect: f32,
        resolution: DisplayResolution,
    ) -> Result<Self, SceneError> {
        let lights = courtyard_lights();
        let mut graph = SceneGraph::new();
        let rig = build_courtyard(&mut graph, meshes, textures, &lights)?;

        let mut selection = Selection::new(rig.selectable(), SelectionStyle::Highlight);
        selection.apply_initial(&mut graph)?;

        let main = lights.get(MAIN_SLOT).map(|light| light.position).unwrap_or(Vector3::new(3.0, 6.0, 3.0));
        let camera = FlyCamera::new(Vector2::new(-2.0, 2.0), 150f32.to_radians(), 0.3, aspect);

        let mut scene = Self {
            graph,
            rig,
            lights,
            orbit: OrbitingLight::new(main),
            selection,
            camera: CameraManager::new(camera, CameraController::default()),
            driver,
            resolution,
            resolution_speed: 0,
            light_view_proj: light_view_projection(main, LIGHT_BOX.0, LIGHT_BOX.1),
        };
        scene.driver.pipeline_mut().set_effect(PostEffect::Pixelate(resolution));
        Ok(scene)
    }

    pub fn create<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), RenderError> {
        self.graph.create_all(backend)
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut FrameDriver {
        &mut self.driver
    }

    pub fn resolution(&self) -> DisplayResolution {
        self.resolution
    }

    pub fn light_view_proj(&self) -> Matrix4<f32> {
        self.light_view_proj
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.camera.camera.uniform()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.camera.resize_projection(width, height);
    }

    /// Applies a key press or release. Returns `false` for keys the scene ignores.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> Result<bool, SceneError> {
        if self.camera.controller.process_key(key, state, &mut self.camera.camera) {
            return Ok(true);
        }

        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyR => {
                if pressed {
                    self.selection.next(&mut self.graph)?;
                }
            }
            KeyCode::KeyU => self.resolution_speed = if pressed { RESOLUTION_STEP } else { 0 },
            KeyCode::KeyI => self.resolution_speed = if pressed { -RESOLUTION_STEP } else { 0 },
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Advances the light, camera, avatar and pixelation by one tick.
    pub fn animate(&mut self) -> Result<(), SceneError> {
        if self.resolution_speed != 0 {
            self.resolution = self.resolution.step(self.resolution_speed);
            self.driver.pipeline_mut().set_effect(PostEffect::Pixelate(self.resolution));
        }

        let position = self.orbit.advance();
        if let Some(main) = self.lights.get_mut(MAIN_SLOT) {
            main.position = position;
        }
        self.graph.broadcast_lights(&self.lights);
        self.light_view_proj = light_view_projection(position, LIGHT_BOX.0, LIGHT_BOX.1);

        self.graph
            .node_mut(self.rig.marker)?
            .set_local_matrix(Matrix4::from_scale(0.5) * Matrix4::from_translation(position));

        self.camera.camera.update();
        self.graph
            .node_mut(self.rig.avatar)?
            .set_local_matrix(self.camera.camera.avatar_matrix());
        Ok(())
    }

    /// Renders the shadow, color and display passes without animating.
    ///
    /// The frame globals must already hold [`camera_uniform`](Self::camera_uniform)
    /// and [`light_view_proj`](Self::light_view_proj) of this tick.
    pub fn draw<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<FrameStats, RenderError> {
        self.driver.render_frame(&mut self.graph, backend)
    }

    /// Animates one tick, then draws.
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<FrameStats, RenderError> {
        self.animate()?;
        self.draw(backend)
    }
}
