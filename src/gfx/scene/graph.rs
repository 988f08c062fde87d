//! # Scene Graph
//!
//! Arena of [`MobileNode`]s addressed by [`NodeId`]. Each node has at most
//! one parent and the graph never contains a cycle; both rules are checked
//! when an edge is added.
//!
//! Traversal is a strict pre-order walk: a node's world matrix is always
//! computed from its parent's matrix of the same frame, and children are
//! visited in insertion order.

use log::{debug, info};

use super::light::LightSet;
use super::node::{MobileNode, NodeId, NodeState};
use crate::error::{RenderError, SceneError};
use crate::gfx::rendering::backend::{PassKind, RenderBackend};
use crate::gfx::rendering::draw_state::resolve_node;
use crate::gfx::rendering::frame::FrameStats;
use crate::gfx::resources::render_target::TargetBinding;

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<MobileNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parentless node. It stays a root until [`add_child`](Self::add_child).
    pub fn add_node(&mut self, node: MobileNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        debug!(
            "Added '{}' as {} ({} triangles)",
            node.label(),
            id,
            node.mesh().triangle_count()
        );
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&MobileNode, SceneError> {
        self.nodes.get(id.0).ok_or(SceneError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut MobileNode, SceneError> {
        self.nodes.get_mut(id.0).ok_or(SceneError::UnknownNode(id))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MobileNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Makes `child` a child of `parent`.
    ///
    /// Rejects self-parenting, a child that already has a parent, any
    /// edge that would close a cycle and edges touching an active node.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let parent_state = self.node(parent)?.state;
        let child_state = self.node(child)?.state;
        if parent_state == NodeState::Active || child_state == NodeState::Active {
            return Err(SceneError::TopologyFrozen { parent, child });
        }
        if let Some(existing) = self.node(child)?.parent {
            return Err(SceneError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        if parent == child {
            return Err(SceneError::SelfParent(child));
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(SceneError::Cycle { parent, child });
            }
            ancestor = self.nodes[current.0].parent;
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.roots.retain(|&root| root != child);
        Ok(())
    }

    /// Pre-order ids of the subtree under `root`.
    pub fn preorder(&self, root: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.node(root)?;
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        Ok(order)
    }

    /// Uploads the subtree under `root` and makes every node active.
    ///
    /// Fails without uploading anything if any node was already created.
    pub fn create<B: RenderBackend + ?Sized>(&mut self, root: NodeId, backend: &mut B) -> Result<(), RenderError> {
        let order = self.preorder(root)?;
        if let Some(&id) = order.iter().find(|id| self.nodes[id.0].state == NodeState::Active) {
            return Err(SceneError::AlreadyCreated(id).into());
        }

        for &id in &order {
            let node = &mut self.nodes[id.0];
            backend.upload_mesh(id, node.mesh())?;
            if node.parent.is_some() {
                backend.upload_connector(id, &node.connector)?;
            }
            node.state = NodeState::Active;
        }
        info!("Created {} nodes under {}", order.len(), root);
        Ok(())
    }

    pub fn create_all<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), RenderError> {
        for root in self.roots.clone() {
            self.create(root, backend)?;
        }
        Ok(())
    }

    /// Advances rotation and recomputes the world matrix of one node whose
    /// parent was already updated this frame.
    fn update_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        if self.nodes[id.0].state != NodeState::Active {
            return Err(SceneError::NotCreated(id));
        }

        let parent = self.nodes[id.0].parent.map(|p| {
            let parent = &self.nodes[p.0];
            (parent.world_matrix(), parent.bottom_position())
        });

        let node = &mut self.nodes[id.0];
        node.advance_rotation();
        let local = node.local_transform();
        match parent {
            Some((parent_world, parent_bottom)) => {
                let world = parent_world * local;
                node.set_world_matrix(world);
                let top = node.top_position();
                node.connector.compute(parent_world, parent_bottom, world, top);
            }
            None => node.set_world_matrix(local),
        }
        Ok(())
    }

    /// Updates every node under `root` in pre-order and returns that order.
    pub fn tick(&mut self, root: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let order = self.preorder(root)?;
        for &id in &order {
            self.update_node(id)?;
        }
        Ok(order)
    }

    pub fn tick_all(&mut self) -> Result<Vec<NodeId>, SceneError> {
        let mut order = Vec::with_capacity(self.nodes.len());
        for root in self.roots.clone() {
            order.extend(self.tick(root)?);
        }
        Ok(order)
    }

    /// Single-pass tick-and-draw of the subtree under `root`.
    ///
    /// Each node is updated, drawn, and then its wire to the parent is
    /// refreshed and drawn before the walk moves on to its children.
    pub fn draw<B: RenderBackend + ?Sized>(
        &mut self,
        root: NodeId,
        backend: &mut B,
        targets: &TargetBinding,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        for id in self.preorder(root)? {
            self.update_node(id)?;
            stats.ticked += 1;

            let node = &self.nodes[id.0];
            if !node.visible {
                continue;
            }
            let state = resolve_node(id, node, PassKind::Color, targets)?;
            backend.draw_node(&state)?;
            stats.color_draws += 1;

            if node.parent.is_some() {
                backend.update_connector(id, &node.connector)?;
                backend.draw_connector(id)?;
                stats.connector_updates += 1;
                stats.connector_draws += 1;
            }
        }
        Ok(())
    }

    /// Replaces the light set of every node that already has one.
    pub fn broadcast_lights(&mut self, lights: &LightSet) -> usize {
        let mut updated = 0;
        for node in &mut self.nodes {
            if node.capabilities.lights.is_some() {
                node.set_lights(*lights);
                updated += 1;
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::Shape;
    use crate::gfx::rendering::backend::testing::{Recorded, RecordingBackend};
    use crate::gfx::rendering::backend::PassTarget;
    use crate::gfx::scene::node::ShadingProgram;
    use cgmath::{Deg, InnerSpace, Matrix4, Vector3, Vector4};

    const EPS: f32 = 1e-4;

    fn assert_matrix_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < EPS, "{:?} != {:?}", a, b);
        }
    }

    fn node(label: &str, translation: Vector3<f32>) -> MobileNode {
        MobileNode::new(label)
            .with_shape(Shape::new().with_height(0.1).with_radius(0.1).build_pyramid())
            .unwrap()
            .with_translation(translation)
            .with_anchors(Vector3::new(0.0, 0.05, 0.0), Vector3::new(0.0, -0.05, 0.0))
            .with_program(ShadingProgram::VertexColor)
    }

    /// root -> a -> b
    fn chain() -> (SceneGraph, NodeId, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.add_node(node("root", Vector3::new(0.0, 0.6, 0.0)));
        let a = graph.add_node(node("a", Vector3::new(0.4, -0.3, 0.0)));
        let b = graph.add_node(node("b", Vector3::new(0.3, -0.3, 0.0)));
        graph.add_child(root, a).unwrap();
        graph.add_child(a, b).unwrap();
        (graph, root, a, b)
    }

    #[test]
    fn test_edges_are_validated() {
        let (mut graph, root, a, b) = chain();
        assert_eq!(graph.roots(), &[root]);

        assert_eq!(graph.add_child(b, b), Err(SceneError::AlreadyParented { child: b, parent: a }));
        assert_eq!(graph.add_child(root, root), Err(SceneError::SelfParent(root)));
        assert_eq!(graph.add_child(b, root), Err(SceneError::Cycle { parent: b, child: root }));
        assert_eq!(
            graph.add_child(root, NodeId(9)),
            Err(SceneError::UnknownNode(NodeId(9)))
        );

        let c = graph.add_node(node("c", Vector3::new(0.0, 0.0, 0.0)));
        assert_eq!(graph.roots(), &[root, c]);
        graph.add_child(root, c).unwrap();
        assert_eq!(graph.roots(), &[root]);
        assert_eq!(graph.preorder(root).unwrap(), vec![root, a, b, c]);
    }

    #[test]
    fn test_world_matrix_composes_parent() {
        let (mut graph, root, a, b) = chain();
        let mut backend = RecordingBackend::new();
        graph.create(root, &mut backend).unwrap();

        graph.node_mut(root).unwrap().set_rotation_speed(10.0);
        graph.node_mut(a).unwrap().set_rotation_speed(5.0);
        graph.tick(root).unwrap();

        let root_node = graph.node(root).unwrap();
        assert_matrix_eq(
            root_node.world_matrix(),
            Matrix4::from_translation(Vector3::new(0.0, 0.6, 0.0)) * Matrix4::from_angle_y(Deg(10.0)),
        );

        for (parent, child) in [(root, a), (a, b)] {
            let p = graph.node(parent).unwrap();
            let c = graph.node(child).unwrap();
            assert_matrix_eq(
                c.world_matrix(),
                p.world_matrix()
                    * Matrix4::from_translation(c.translation())
                    * Matrix4::from_angle_y(Deg(c.rotation_angle())),
            );
        }
    }

    #[test]
    fn test_connector_follows_anchors() {
        let (mut graph, root, a, _) = chain();
        let mut backend = RecordingBackend::new();
        graph.create(root, &mut backend).unwrap();
        graph.node_mut(root).unwrap().set_rotation_speed(30.0);
        graph.tick(root).unwrap();

        let parent = graph.node(root).unwrap();
        let child = graph.node(a).unwrap();
        let (start, end) = child.connector().endpoints();
        let expected_start = parent.world_matrix() * Vector4::new(0.0, -0.05, 0.0, 1.0);
        let expected_end = child.world_matrix() * Vector4::new(0.0, 0.05, 0.0, 1.0);
        assert!((start - expected_start.truncate()).magnitude() < EPS);
        assert!((end - expected_end.truncate()).magnitude() < EPS);
    }

    #[test]
    fn test_create_uploads_once() {
        let (mut graph, root, a, b) = chain();
        let mut backend = RecordingBackend::new();
        graph.create(root, &mut backend).unwrap();

        // the root has no wire
        assert_eq!(
            backend.events,
            vec![
                Recorded::UploadMesh { node: root, vertices: 18 },
                Recorded::UploadMesh { node: a, vertices: 18 },
                Recorded::UploadConnector(a),
                Recorded::UploadMesh { node: b, vertices: 18 },
                Recorded::UploadConnector(b),
            ]
        );
        assert!(graph.iter().all(|(_, n)| n.state() == NodeState::Active));

        assert!(matches!(
            graph.create(root, &mut backend),
            Err(RenderError::Scene(SceneError::AlreadyCreated(id))) if id == root
        ));
        assert_eq!(backend.events.len(), 5);
    }

    #[test]
    fn test_tick_before_create_fails() {
        let (mut graph, root, _, _) = chain();
        assert_eq!(graph.tick(root), Err(SceneError::NotCreated(root)));
    }

    #[test]
    fn test_draw_is_parent_first() {
        let (mut graph, root, a, b) = chain();
        let c = graph.add_node(node("c", Vector3::new(-0.4, -0.3, 0.0)));
        graph.add_child(root, c).unwrap();

        let mut backend = RecordingBackend::new();
        graph.create(root, &mut backend).unwrap();
        backend.clear();

        let targets = TargetBinding::new();
        let mut stats = FrameStats::default();
        backend.begin_pass(PassKind::Color, PassTarget::Surface).unwrap();
        graph.draw(root, &mut backend, &targets, &mut stats).unwrap();
        backend.end_pass().unwrap();

        assert_eq!(backend.node_draws(PassKind::Color), vec![root, a, b, c]);
        assert_eq!(stats.ticked, 4);
        assert_eq!(stats.connector_draws, 3);

        // each wire is refreshed right after its node is drawn
        let position = |event: &Recorded| backend.events.iter().position(|e| e == event).unwrap();
        let drawn_a = backend
            .events
            .iter()
            .position(|e| matches!(e, Recorded::DrawNode(s) if s.node == a))
            .unwrap();
        assert_eq!(position(&Recorded::UpdateConnector(a)), drawn_a + 1);
        assert_eq!(position(&Recorded::DrawConnector(a)), drawn_a + 2);
    }

    #[test]
    fn test_missing_program_fails_fast() {
        let (mut graph, root, a, _) = chain();
        graph.node_mut(a).unwrap().program = None;

        let mut backend = RecordingBackend::new();
        graph.create(root, &mut backend).unwrap();
        backend.begin_pass(PassKind::Color, PassTarget::Surface).unwrap();

        let result = graph.draw(root, &mut backend, &TargetBinding::new(), &mut FrameStats::default());
        assert!(matches!(result, Err(RenderError::MissingProgram(id)) if id == a));
        assert_eq!(backend.node_draws(PassKind::Color), vec![root]);
    }

    #[test]
    fn test_chain_after_ninety_ticks() {
        let (mut graph, root, a, b) = chain();
        let mut backend = RecordingBackend::new();
        graph.create(root, &mut backend).unwrap();

        graph.tick(root).unwrap();
        let b_at_zero = graph.node(b).unwrap().world_matrix();

        graph.node_mut(root).unwrap().set_rotation_speed(1.0);
        graph.node_mut(a).unwrap().set_rotation_speed(0.0);
        for _ in 0..90 {
            graph.tick(root).unwrap();
        }

        assert!((graph.node(root).unwrap().rotation_angle() - 90.0).abs() < EPS);
        assert_eq!(graph.node(a).unwrap().rotation_angle(), 0.0);

        // only the root spin differs, carried through the static offsets
        let to_root = Matrix4::from_translation(Vector3::new(0.0, 0.6, 0.0));
        let from_root = Matrix4::from_translation(Vector3::new(0.0, -0.6, 0.0));
        assert_matrix_eq(
            graph.node(b).unwrap().world_matrix(),
            to_root * Matrix4::from_angle_y(Deg(90.0)) * from_root * b_at_zero,
        );
    }

    #[test]
    fn test_broadcast_only_reaches_lit_nodes() {
        let (mut graph, root, a, _) = chain();
        graph.node_mut(a).unwrap().set_lights(LightSet::new());
        let mut lights = LightSet::new();
        lights
            .set(1, crate::gfx::scene::light::Light::point(Vector3::new(0.2, 1.0, 0.0), Vector3::new(0.0, 1.0, 0.0), 1.0))
            .unwrap();

        assert_eq!(graph.broadcast_lights(&lights), 1);
        assert!(graph.node(root).unwrap().capabilities.lights.is_none());
        assert_eq!(graph.node(a).unwrap().capabilities.lights.unwrap().lights.active_count(), 1);
    }

    #[test]
    fn test_edges_are_frozen_after_create() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(MobileNode::new("a").with_program(ShadingProgram::VertexColor));
        let mut backend = RecordingBackend::new();
        graph.create_all(&mut backend).unwrap();

        let b = graph.add_node(MobileNode::new("b").with_program(ShadingProgram::VertexColor));
        assert_eq!(
            graph.add_child(a, b),
            Err(SceneError::TopologyFrozen { parent: a, child: b })
        );
        assert_eq!(
            graph.add_child(b, a),
            Err(SceneError::TopologyFrozen { parent: b, child: a })
        );
        assert_eq!(graph.roots(), &[a, b]);

        // the rejected node stays a root of its own and can still be created
        graph.create(b, &mut backend).unwrap();
        assert_eq!(graph.tick_all().unwrap(), vec![a, b]);
    }
}
