//! # Scene Graph
//!
//! Hierarchy of rigid bodies ("mobile" nodes) stored in an arena, the wires
//! joining them and the lights they are shaded with.
//!
//! - [`SceneGraph`] - node arena, parent/child edges and pre-order traversal
//! - [`MobileNode`] - merged mesh, motion state and rendering capabilities
//! - [`Connector`] - per-frame line between a node and its parent
//! - [`LightSet`] - five light slots per node
//! - [`Selection`] - highlight cycling used by interactive demos
//!
//! ## Usage
//!
//! ```rust
//! use pivot::gfx::geometry::Shape;
//! use pivot::gfx::scene::{MobileNode, SceneGraph};
//! use cgmath::Vector3;
//!
//! let mut graph = SceneGraph::new();
//! let hub = graph.add_node(
//!     MobileNode::new("hub")
//!         .with_shape(Shape::new().with_height(0.1).with_radius(0.1).build_cylinder())
//!         .unwrap(),
//! );
//! let arm = graph.add_node(
//!     MobileNode::new("arm").with_translation(Vector3::new(0.4, -0.3, 0.0)),
//! );
//! graph.add_child(hub, arm).unwrap();
//! assert_eq!(graph.roots(), &[hub]);
//! ```

pub mod connector;
pub mod graph;
pub mod light;
pub mod node;
pub mod selection;
pub mod vertex;

pub use connector::Connector;
pub use graph::SceneGraph;
pub use light::{Light, LightKind, LightSet, MAX_LIGHTS};
pub use node::{FillMode, MobileNode, NodeId, NodeState, ShadingProgram};
pub use selection::{Selection, SelectionStyle};
pub use vertex::Vertex3D;
