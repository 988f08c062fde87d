//! WGPU-based rendering engine for pivot
//!
//! Implements [`RenderBackend`] on top of wgpu: surface and device
//! management, texture units and offscreen targets, one-time mesh uploads,
//! per-node uniforms and the draw, wireframe, connector, depth and display
//! pipelines.
//!
//! Draws are recorded per pass and encoded when the pass ends. Uniform
//! writes reach the GPU before the frame's command buffer runs, so every
//! node holds exactly one transform per frame.

use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context};
use cgmath::{Matrix4, SquareMatrix};
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use wgpu::Device;

use super::backend::{PassKind, PassTarget, RenderBackend};
use super::draw_state::{DisplayDrawState, DrawProgram, NodeDrawState, PostEffect};
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use crate::{
    config::RenderConfig,
    error::{RenderError, ResourceError},
    gfx::{
        camera::camera_utils::{convert_matrix4_to_array, CameraUniform},
        geometry::{normal_matrix, primitives::display_quad, MeshBuffer},
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO, GlobalUBOContent},
            procedural::ImageData,
            render_target::{RenderTargetDesc, TargetBinding, TargetId},
            texture_resource::TextureResource,
            unit_allocator::{TextureUnit, UnitAllocator},
        },
        scene::{
            connector::Connector,
            light::{GpuLight, LightSet, MAX_LIGHTS},
            node::{FillMode, NodeId},
        },
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Edge of the display quad in clip units; the rest shows the clear color
pub const DISPLAY_QUAD_SIZE: f32 = 1.8;

/// Tint of selected nodes that cannot be drawn as wireframe
const HIGHLIGHT_TINT: [f32; 4] = [1.0, 0.55, 0.55, 1.0];
const NO_TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

const DRAW: &str = "draw";
const WIREFRAME: &str = "wireframe";
const CONNECTOR: &str = "connector";
const DEPTH: &str = "depth";
const DISPLAY: &str = "display";

/// Per-node uniform. MUST match `Node` in draw.wgsl and depth.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    tint: [f32; 4],
    program: u32,
    selected: u32,
    _padding: [u32; 2],
    lights: [GpuLight; MAX_LIGHTS],
}

impl NodeUniform {
    fn new(world: Matrix4<f32>, tint: [f32; 4], program: DrawProgram, selected: bool, lights: Option<&LightSet>) -> Self {
        let normal = normal_matrix(world).map(Matrix4::from).unwrap_or_else(Matrix4::identity);
        Self {
            model: convert_matrix4_to_array(world),
            normal: convert_matrix4_to_array(normal),
            tint,
            program: program_code(program),
            selected: selected as u32,
            _padding: [0; 2],
            lights: lights.map(LightSet::to_gpu).unwrap_or_else(|| LightSet::new().to_gpu()),
        }
    }
}

/// Shader-side program switch
fn program_code(program: DrawProgram) -> u32 {
    match program {
        DrawProgram::Depth | DrawProgram::VertexColor => 0,
        DrawProgram::Lit => 1,
        DrawProgram::Textured => 2,
        DrawProgram::ShadowedTextured => 3,
    }
}

/// MUST match `Display` in display.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DisplayUniform {
    mode: u32,
    resolution: f32,
    has_depth: u32,
    _padding0: u32,
    texel: [f32; 2],
    _padding1: [f32; 2],
}

impl DisplayUniform {
    fn new(effect: PostEffect, has_depth: bool, width: u32, height: u32) -> Self {
        let (mode, resolution) = match effect {
            PostEffect::None => (0, 0.0),
            PostEffect::Blur => (1, 0.0),
            PostEffect::Pixelate(resolution) => (2, resolution.get() as f32),
        };
        Self {
            mode,
            resolution,
            has_depth: has_depth as u32,
            _padding0: 0,
            texel: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            _padding1: [0.0; 2],
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    uniform: UniformBuffer<NodeUniform>,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MaterialKey {
    texture: TextureUnit,
    brush: TextureUnit,
    shadow: TextureUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DisplayKey {
    source: TextureUnit,
    depth: TextureUnit,
}

enum DrawCommand {
    Node {
        node: NodeId,
        pipeline: &'static str,
        material: Option<MaterialKey>,
    },
    Connector(NodeId),
    Display(DisplayKey),
}

struct PassRecording {
    kind: PassKind,
    target: PassTarget,
    commands: Vec<DrawCommand>,
}

struct FrameInFlight {
    encoder: wgpu::CommandEncoder,
    surface_texture: wgpu::SurfaceTexture,
    surface_view: wgpu::TextureView,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    node_layout: BindGroupLayoutWithDesc,
    material_layout: BindGroupLayoutWithDesc,
    display_layout: BindGroupLayoutWithDesc,

    units: UnitAllocator,
    textures: HashMap<TextureUnit, TextureResource>,
    targets: HashMap<TargetId, RenderTargetDesc>,
    fallback_color: TextureUnit,
    fallback_depth: TextureUnit,

    meshes: HashMap<NodeId, GpuMesh>,
    wires: HashMap<NodeId, wgpu::Buffer>,
    material_groups: HashMap<MaterialKey, wgpu::BindGroup>,
    display_groups: HashMap<DisplayKey, wgpu::BindGroup>,
    display_uniform: UniformBuffer<DisplayUniform>,
    display_quad: wgpu::Buffer,
    display_quad_vertices: u32,

    color_clear: wgpu::Color,
    display_clear: wgpu::Color,
    wireframe_supported: bool,

    frame: Option<FrameInFlight>,
    pass: Option<PassRecording>,
}

fn to_color(c: [f64; 4]) -> wgpu::Color {
    wgpu::Color {
        r: c[0],
        g: c[1],
        b: c[2],
        a: c[3],
    }
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Requests `POLYGON_MODE_LINE` when the adapter has it; without it
    /// selected nodes are tinted instead of drawn as wireframe.
    pub async fn new(window: impl Into<wgpu::SurfaceTarget<'static>>, render_config: &RenderConfig) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let line_mode = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if line_mode {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("pivot Device"),
                required_features,
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        info!("Using adapter {:?}", adapter.get_info().name);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: render_config.width.max(1),
            height: render_config.height.max(1),
            present_mode: if render_config.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::Immediate
            },
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let global_ubo = GlobalUBO::new_with_data(&device, &GlobalUBOContent::default());
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let node_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(&device, "Node Bind Group Layout");

        let material_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::comparison_sampler())
            .create(&device, "Material Bind Group Layout");

        let display_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::uniform())
            .create(&device, "Display Bind Group Layout");

        let display_uniform = UniformBuffer::new(&device);
        let quad = display_quad(DISPLAY_QUAD_SIZE).to_vertices();
        let display_quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Display Quad"),
            contents: bytemuck::cast_slice(&quad),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Wrap device and queue in Arc for pipeline manager
        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("draw", include_str!("shaders/draw.wgsl"));
        pipeline_manager.load_shader("depth", include_str!("shaders/depth.wgsl"));
        pipeline_manager.load_shader("display", include_str!("shaders/display.wgsl"));

        pipeline_manager.register_bind_group_layout("globals", global_bindings.bind_group_layout().clone());
        pipeline_manager.register_bind_group_layout("node", node_layout.layout.clone());
        pipeline_manager.register_bind_group_layout("material", material_layout.layout.clone());
        pipeline_manager.register_bind_group_layout("display", display_layout.layout.clone());

        let offscreen_target = vec![Some(wgpu::ColorTargetState {
            format: TextureResource::COLOR_FORMAT,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let draw = PipelineConfig::default_with_shader("draw")
            .with_label("DRAW")
            .with_bind_group_layouts(&["globals", "node", "material"])
            .with_cull_mode(None)
            .with_depth_stencil(TextureResource::DEPTH_FORMAT)
            .with_color_targets(offscreen_target.clone());

        let wireframe_supported = line_mode && render_config.wireframe_selection;
        if wireframe_supported {
            pipeline_manager.register_pipeline(
                WIREFRAME,
                draw.clone()
                    .with_label("WIREFRAME")
                    .with_polygon_mode(wgpu::PolygonMode::Line),
            );
        } else {
            info!("Wireframe unavailable; selected nodes are tinted instead");
        }
        pipeline_manager.register_pipeline(DRAW, draw);

        pipeline_manager.register_pipeline(
            CONNECTOR,
            PipelineConfig::default_with_shader("draw")
                .with_label("CONNECTOR")
                .with_entry_points("vs_connector", "fs_connector")
                .with_bind_group_layouts(&["globals"])
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_color_targets(offscreen_target),
        );

        // No culling so thin props still occlude the light
        pipeline_manager.register_pipeline(
            DEPTH,
            PipelineConfig::default_with_shader("depth")
                .with_label("DEPTH")
                .with_bind_group_layouts(&["globals", "node"])
                .with_cull_mode(None)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_depth_bias(2, 2.0)
                .with_vertex_only()
                .with_color_targets(vec![]),
        );

        pipeline_manager.register_pipeline(
            DISPLAY,
            PipelineConfig::default_with_shader("display")
                .with_label("DISPLAY")
                .with_bind_group_layouts(&["display"])
                .with_cull_mode(None)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );

        pipeline_manager
            .create_all_pipelines()
            .map_err(|errors| anyhow!("Pipeline creation failed: {}", errors.join("; ")))?;
        debug!("{:?}", pipeline_manager.get_stats());

        let mut units = UnitAllocator::new(render_config.texture_units);
        let mut textures = HashMap::new();

        let fallback_color = units.allocate()?;
        textures.insert(
            fallback_color,
            TextureResource::from_image(
                &device_handle,
                &queue_handle,
                &ImageData::solid([255, 255, 255, 255]),
                "Fallback Color",
                wgpu::FilterMode::Nearest,
            ),
        );
        let fallback_depth = units.allocate()?;
        textures.insert(
            fallback_depth,
            TextureResource::create_depth_target(&device_handle, 1, 1, "Fallback Depth"),
        );

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            pipeline_manager,
            global_ubo,
            global_bindings,
            node_layout,
            material_layout,
            display_layout,
            units,
            textures,
            targets: HashMap::new(),
            fallback_color,
            fallback_depth,
            meshes: HashMap::new(),
            wires: HashMap::new(),
            material_groups: HashMap::new(),
            display_groups: HashMap::new(),
            display_uniform,
            display_quad,
            display_quad_vertices: quad.len() as u32,
            color_clear: to_color(render_config.color_clear),
            display_clear: to_color(render_config.display_clear),
            wireframe_supported,
            frame: None,
            pass: None,
        })
    }

    /// Uploads an image and returns the unit it is bound to.
    pub fn create_texture(
        &mut self,
        image: &ImageData,
        label: &str,
        filter_mode: wgpu::FilterMode,
    ) -> Result<TextureUnit, ResourceError> {
        let unit = self.units.allocate()?;
        let texture = TextureResource::from_image(&self.device, &self.queue, image, label, filter_mode);
        self.textures.insert(unit, texture);
        debug!("Texture '{}' on {}", label, unit);
        Ok(unit)
    }

    /// Creates an offscreen target and registers it with `targets`.
    ///
    /// Depth-only targets (`with_color == false`) are shadow maps.
    pub fn create_render_target(
        &mut self,
        targets: &mut TargetBinding,
        label: &str,
        width: u32,
        height: u32,
        with_color: bool,
    ) -> Result<TargetId, ResourceError> {
        if width == 0 || height == 0 {
            return Err(ResourceError::ZeroSizedTarget {
                label: label.to_string(),
                width,
                height,
            });
        }

        let color = if with_color {
            let unit = self.units.allocate()?;
            self.textures.insert(
                unit,
                TextureResource::create_color_target(&self.device, width, height, &format!("{} Color", label)),
            );
            Some(unit)
        } else {
            None
        };
        let depth = self.units.allocate()?;
        self.textures.insert(
            depth,
            TextureResource::create_depth_target(&self.device, width, height, &format!("{} Depth", label)),
        );

        let id = targets.register(label, width, height, color, depth)?;
        self.targets.insert(id, targets.desc(id)?.clone());
        info!("Render target '{}' ({}x{}) as {}", label, width, height, id);
        Ok(id)
    }

    /// Recreates the attachments of `id` at a new size, keeping their units.
    pub fn resize_render_target(
        &mut self,
        targets: &mut TargetBinding,
        id: TargetId,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError> {
        targets.resize(id, width, height)?;
        let desc = targets.desc(id)?.clone();

        if let Some(color) = desc.color {
            self.textures.insert(
                color,
                TextureResource::create_color_target(&self.device, width, height, &format!("{} Color", desc.label)),
            );
        }
        self.textures.insert(
            desc.depth,
            TextureResource::create_depth_target(&self.device, width, height, &format!("{} Depth", desc.label)),
        );
        self.targets.insert(id, desc);

        // cached groups still point at the old views
        self.material_groups.clear();
        self.display_groups.clear();
        Ok(())
    }

    /// Writes the per-frame camera and light matrices.
    pub fn update_globals(&mut self, camera: CameraUniform, light_view_proj: Matrix4<f32>) {
        self.global_ubo
            .update_content(&self.queue, GlobalUBOContent::new(camera, light_view_proj));
    }

    /// Resizes the render engine surface
    ///
    /// Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Reconfigures the surface after it was lost or went out of date.
    pub fn reconfigure(&mut self) {
        warn!("Reconfiguring surface ({}x{})", self.config.width, self.config.height);
        self.surface.configure(&self.device, &self.config);
    }

    /// Returns current surface dimensions
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn texture(&self, unit: TextureUnit) -> Result<&TextureResource, ResourceError> {
        self.textures.get(&unit).ok_or(ResourceError::UnknownUnit(unit))
    }

    fn pipeline(&self, name: &'static str) -> Result<&wgpu::RenderPipeline, RenderError> {
        self.pipeline_manager
            .pipeline(name)
            .ok_or(RenderError::MissingPipeline(name))
    }

    fn ensure_pass(&self) -> Result<(), RenderError> {
        if self.pass.is_none() {
            return Err(RenderError::PassNotBegun);
        }
        Ok(())
    }

    fn push_command(&mut self, command: DrawCommand) -> Result<(), RenderError> {
        let pass = self.pass.as_mut().ok_or(RenderError::PassNotBegun)?;
        pass.commands.push(command);
        Ok(())
    }

    fn material_group(&mut self, key: MaterialKey) -> Result<(), RenderError> {
        if self.material_groups.contains_key(&key) {
            return Ok(());
        }
        let texture = self.texture(key.texture)?;
        let brush = self.texture(key.brush)?;
        let shadow = self.texture(key.shadow)?;
        let group = BindGroupBuilder::new(&self.material_layout)
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .texture(&brush.view)
            .sampler(&brush.sampler)
            .texture(&shadow.view)
            .sampler(&shadow.sampler)
            .create(&self.device, "Material Bind Group");
        self.material_groups.insert(key, group);
        Ok(())
    }

    fn display_group(&mut self, key: DisplayKey) -> Result<(), RenderError> {
        if self.display_groups.contains_key(&key) {
            return Ok(());
        }
        let source = self.texture(key.source)?;
        let depth = self.texture(key.depth)?;
        let group = BindGroupBuilder::new(&self.display_layout)
            .texture(&source.view)
            .sampler(&source.sampler)
            .texture(&depth.view)
            .resource(self.display_uniform.binding_resource())
            .create(&self.device, "Display Bind Group");
        self.display_groups.insert(key, group);
        Ok(())
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        pass: &PassRecording,
    ) -> Result<(), RenderError> {
        let (color_view, depth_view, clear) = match pass.target {
            PassTarget::Surface => (Some(surface_view), None, self.display_clear),
            PassTarget::Offscreen(id) => {
                let desc = self.targets.get(&id).ok_or(ResourceError::UnknownTarget(id))?;
                let color = match desc.color {
                    Some(unit) => Some(&self.texture(unit)?.view),
                    None => None,
                };
                (color, Some(&self.texture(desc.depth)?.view), self.color_clear)
            }
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_view
            .map(|view| wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })
            .into_iter()
            .map(Some)
            .collect();

        let label = format!("{:?} Pass", pass.kind);
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&label),
            color_attachments: &color_attachments,
            depth_stencil_attachment: depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        for command in &pass.commands {
            match command {
                DrawCommand::Node {
                    node,
                    pipeline,
                    material,
                } => {
                    let mesh = self.meshes.get(node).ok_or(RenderError::NotUploaded(*node))?;
                    if mesh.vertex_count == 0 {
                        continue;
                    }
                    render_pass.set_pipeline(self.pipeline(*pipeline)?);
                    render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                    render_pass.set_bind_group(1, &mesh.bind_group, &[]);
                    if let Some(key) = material {
                        if let Some(group) = self.material_groups.get(key) {
                            render_pass.set_bind_group(2, group, &[]);
                        }
                    }
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.draw(0..mesh.vertex_count, 0..1);
                }
                DrawCommand::Connector(node) => {
                    let wire = self.wires.get(node).ok_or(RenderError::NotUploaded(*node))?;
                    render_pass.set_pipeline(self.pipeline(CONNECTOR)?);
                    render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                    render_pass.set_vertex_buffer(0, wire.slice(..));
                    render_pass.draw(0..2, 0..1);
                }
                DrawCommand::Display(key) => {
                    if let Some(group) = self.display_groups.get(key) {
                        render_pass.set_pipeline(self.pipeline(DISPLAY)?);
                        render_pass.set_bind_group(0, group, &[]);
                        render_pass.set_vertex_buffer(0, self.display_quad.slice(..));
                        render_pass.draw(0..self.display_quad_vertices, 0..1);
                    }
                }
            }
        }
        Ok(())
    }
}

impl RenderBackend for RenderEngine {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.frame = Some(FrameInFlight {
            encoder,
            surface_texture,
            surface_view,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if let Some(pass) = self.pass.take() {
            warn!("Dropping unfinished {:?} pass", pass.kind);
        }
        let frame = self.frame.take().ok_or(RenderError::FrameNotBegun)?;
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }

    fn upload_mesh(&mut self, node: NodeId, mesh: &MeshBuffer) -> Result<(), RenderError> {
        let vertices = mesh.to_vertices();
        let label = format!("Mesh {}", node);
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform = UniformBuffer::new_with_data(
            &self.device,
            &NodeUniform::new(Matrix4::identity(), NO_TINT, DrawProgram::VertexColor, false, None),
        );
        let bind_group = BindGroupBuilder::new(&self.node_layout)
            .resource(uniform.binding_resource())
            .create(&self.device, &format!("Node Bind Group {}", node));

        self.meshes.insert(
            node,
            GpuMesh {
                vertex_buffer,
                vertex_count: vertices.len() as u32,
                uniform,
                bind_group,
            },
        );
        debug!("Uploaded {} vertices for {}", vertices.len(), node);
        Ok(())
    }

    fn upload_connector(&mut self, node: NodeId, connector: &Connector) -> Result<(), RenderError> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Connector {}", node)),
            contents: bytemuck::cast_slice(&connector.to_vertices()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        self.wires.insert(node, buffer);
        Ok(())
    }

    fn update_connector(&mut self, node: NodeId, connector: &Connector) -> Result<(), RenderError> {
        let buffer = self.wires.get(&node).ok_or(RenderError::NotUploaded(node))?;
        self.queue
            .write_buffer(buffer, 0, bytemuck::cast_slice(&connector.to_vertices()));
        Ok(())
    }

    fn begin_pass(&mut self, kind: PassKind, target: PassTarget) -> Result<(), RenderError> {
        if self.pass.is_some() {
            return Err(RenderError::PassAlreadyActive(kind));
        }
        if self.frame.is_none() {
            return Err(RenderError::FrameNotBegun);
        }
        if let PassTarget::Offscreen(id) = target {
            if !self.targets.contains_key(&id) {
                return Err(ResourceError::UnknownTarget(id).into());
            }
        }
        self.pass = Some(PassRecording {
            kind,
            target,
            commands: Vec::new(),
        });
        Ok(())
    }

    fn draw_node(&mut self, state: &NodeDrawState) -> Result<(), RenderError> {
        self.ensure_pass()?;

        let (pipeline, material, tint) = if state.program == DrawProgram::Depth {
            (DEPTH, None, NO_TINT)
        } else {
            let wireframe = state.fill == FillMode::Wireframe && self.wireframe_supported;
            let tint = if state.selected && !wireframe && state.program != DrawProgram::ShadowedTextured {
                HIGHLIGHT_TINT
            } else {
                NO_TINT
            };
            let key = MaterialKey {
                texture: state.texture.unwrap_or(self.fallback_color),
                brush: state.brush.unwrap_or(self.fallback_color),
                shadow: state.shadow_map.unwrap_or(self.fallback_depth),
            };
            self.material_group(key)?;
            (if wireframe { WIREFRAME } else { DRAW }, Some(key), tint)
        };

        let queue = self.queue.clone();
        let mesh = self
            .meshes
            .get_mut(&state.node)
            .ok_or(RenderError::NotUploaded(state.node))?;
        mesh.uniform.update_content(
            &queue,
            NodeUniform::new(state.world, tint, state.program, state.selected, state.lights.as_ref()),
        );

        self.push_command(DrawCommand::Node {
            node: state.node,
            pipeline,
            material,
        })
    }

    fn draw_connector(&mut self, node: NodeId) -> Result<(), RenderError> {
        self.ensure_pass()?;
        if !self.wires.contains_key(&node) {
            return Err(RenderError::NotUploaded(node));
        }
        self.push_command(DrawCommand::Connector(node))
    }

    fn draw_display(&mut self, state: &DisplayDrawState) -> Result<(), RenderError> {
        self.ensure_pass()?;
        let key = DisplayKey {
            source: state.source,
            depth: state.depth.unwrap_or(self.fallback_depth),
        };
        self.display_group(key)?;

        let size = self.texture(state.source)?.texture.size();
        let uniform = DisplayUniform::new(state.effect, state.depth.is_some(), size.width, size.height);
        self.display_uniform.update_content(&self.queue, uniform);

        self.push_command(DrawCommand::Display(key))
    }

    fn end_pass(&mut self) -> Result<(), RenderError> {
        let pass = self.pass.take().ok_or(RenderError::PassNotBegun)?;
        let mut frame = self.frame.take().ok_or(RenderError::FrameNotBegun)?;
        let result = self.encode_pass(&mut frame.encoder, &frame.surface_view, &pass);
        self.frame = Some(frame);
        result
    }

    fn supports_wireframe(&self) -> bool {
        self.wireframe_supported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayResolution;
    use cgmath::Vector3;

    #[test]
    fn test_uniform_layouts() {
        assert_eq!(std::mem::size_of::<NodeUniform>(), 560);
        assert_eq!(std::mem::size_of::<DisplayUniform>(), 32);
    }

    #[test]
    fn test_node_uniform_normal_matrix() {
        let world = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)) * Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let uniform = NodeUniform::new(world, NO_TINT, DrawProgram::Lit, true, None);

        assert_eq!(uniform.program, 1);
        assert_eq!(uniform.selected, 1);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.normal[0][0], 0.5);
        assert_eq!(uniform.normal[3], [0.0, 0.0, 0.0, 1.0]);
        assert!(uniform.lights.iter().all(|light| light.kind == 0));
    }

    #[test]
    fn test_singular_world_falls_back_to_identity_normals() {
        let uniform = NodeUniform::new(Matrix4::from_scale(0.0), NO_TINT, DrawProgram::VertexColor, false, None);
        assert_eq!(uniform.normal, convert_matrix4_to_array(Matrix4::identity()));
    }

    #[test]
    fn test_display_uniform_modes() {
        let none = DisplayUniform::new(PostEffect::None, false, 800, 600);
        assert_eq!((none.mode, none.has_depth), (0, 0));
        assert_eq!(none.texel, [1.0 / 800.0, 1.0 / 600.0]);

        assert_eq!(DisplayUniform::new(PostEffect::Blur, true, 1, 1).mode, 1);

        let pixelate = DisplayUniform::new(PostEffect::Pixelate(DisplayResolution::new(160)), true, 0, 0);
        assert_eq!(pixelate.mode, 2);
        assert_eq!(pixelate.resolution, 160.0);
        assert_eq!(pixelate.texel, [1.0, 1.0]);
    }

    #[test]
    fn test_program_codes() {
        assert_eq!(program_code(DrawProgram::Depth), 0);
        assert_eq!(program_code(DrawProgram::VertexColor), 0);
        assert_eq!(program_code(DrawProgram::Textured), 2);
        assert_eq!(program_code(DrawProgram::ShadowedTextured), 3);
    }
}
