//! # Errors
//!
//! Error types for shape building, scene graph mutation, GPU resource
//! management and frame rendering.

use thiserror::Error;

use crate::gfx::{
    rendering::backend::PassKind,
    resources::{render_target::TargetId, unit_allocator::TextureUnit},
    scene::node::NodeId,
};

/// Errors raised while configuring or building a procedural shape.
#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    /// Subdivision level below three or not a whole number
    #[error("Invalid level: {value} (must be an integer >= 3)")]
    InvalidLevel { value: f32 },

    /// Height or radius that is zero, negative or not finite
    #[error("Invalid {name}: {value} (must be finite and > 0)")]
    InvalidDimension { name: &'static str, value: f32 },

    /// Attribute key not understood by `Shape::with_attribute`
    #[error("Unknown shape attribute: {0}")]
    UnknownAttribute(String),

    /// Placement matrix whose upper 3x3 cannot be inverted
    #[error("Placement matrix is singular; normals cannot be transformed")]
    SingularPlacement,
}

impl ShapeError {
    /// Creates an invalid dimension error.
    pub fn dimension(name: &'static str, value: f32) -> Self {
        Self::InvalidDimension { name, value }
    }
}

/// Errors raised by scene graph construction and traversal.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("{child} already has parent {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },

    #[error("Adding {child} under {parent} would form a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("{0} cannot be its own child")]
    SelfParent(NodeId),

    /// Mesh edits after the one-time upload
    #[error("Node '{label}' is active; its mesh can no longer change")]
    MeshFrozen { label: String },

    #[error("{0} was already created")]
    AlreadyCreated(NodeId),

    /// Edges touching a created node; its subtree was uploaded as a whole
    #[error("Cannot add {child} under {parent}: an active node's edges are frozen")]
    TopologyFrozen { parent: NodeId, child: NodeId },

    /// Traversal reached a node that never went through `create`
    #[error("{0} was drawn before create")]
    NotCreated(NodeId),

    #[error("Light slot {index} out of range (max {max})")]
    LightSlotOutOfRange { index: usize, max: usize },

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),
}

/// Errors raised while allocating or loading GPU-facing resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Texture units exhausted (capacity: {capacity})")]
    UnitsExhausted { capacity: u32 },

    #[error("Unknown texture unit: {0}")]
    UnknownUnit(TextureUnit),

    #[error("Unknown render target: {0}")]
    UnknownTarget(TargetId),

    #[error("Render target '{label}' has zero size ({width}x{height})")]
    ZeroSizedTarget {
        label: String,
        width: u32,
        height: u32,
    },

    #[error("Image data has {actual} bytes, expected {expected}")]
    InvalidImageData { expected: usize, actual: usize },

    #[error("Failed to load OBJ '{path}': {source}")]
    ObjLoad {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ '{0}' contains no triangles")]
    EmptyModel(String),
}

impl ResourceError {
    /// Creates an OBJ load error.
    pub fn obj_load(path: impl Into<String>, source: tobj::LoadError) -> Self {
        Self::ObjLoad {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while recording or submitting a frame.
///
/// Missing-resource variants are configuration bugs: they surface on the
/// first draw that needs the resource and are never retried.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0} has no shading program")]
    MissingProgram(NodeId),

    #[error("{0} has no texture")]
    MissingTexture(NodeId),

    #[error("{0} uses brush shading but has no brush texture")]
    MissingBrush(NodeId),

    #[error("{0} has no shadow map")]
    MissingShadowMap(NodeId),

    #[error("{0} has no light binding")]
    MissingLights(NodeId),

    #[error("Cannot bind {requested}: {bound} is still bound")]
    TargetAlreadyBound { bound: TargetId, requested: TargetId },

    #[error("No render target is bound")]
    NoTargetBound,

    #[error("Texture unit {unit} belongs to {target}, which is still bound")]
    SampledWhileBound { unit: TextureUnit, target: TargetId },

    #[error("{0} has no color attachment")]
    TargetWithoutColor(TargetId),

    #[error("{0:?} pass begun while another pass is active")]
    PassAlreadyActive(PassKind),

    #[error("No pass is active")]
    PassNotBegun,

    #[error("No frame is active")]
    FrameNotBegun,

    #[error("{0} has no uploaded geometry")]
    NotUploaded(NodeId),

    #[error("Pipeline '{0}' was not created")]
    MissingPipeline(&'static str),

    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}
