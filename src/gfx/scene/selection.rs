//! Cycling selection over a fixed list of nodes
//!
//! Exactly one node of the list is highlighted at a time. Selecting the
//! next one clears the highlight of the previous.

use log::info;

use super::graph::SceneGraph;
use super::node::{FillMode, NodeId};
use crate::error::SceneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionStyle {
    /// Selected node is drawn as wireframe
    #[default]
    Wireframe,
    /// Selected node keeps its fill and is marked for the shader highlight
    Highlight,
}

#[derive(Debug, Clone)]
pub struct Selection {
    ids: Vec<NodeId>,
    current: usize,
    style: SelectionStyle,
}

impl Selection {
    pub fn new(ids: Vec<NodeId>, style: SelectionStyle) -> Self {
        Self {
            ids,
            current: 0,
            style,
        }
    }

    pub fn current(&self) -> Option<NodeId> {
        self.ids.get(self.current).copied()
    }

    pub fn style(&self) -> SelectionStyle {
        self.style
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Highlights the first node of the list.
    pub fn apply_initial(&mut self, graph: &mut SceneGraph) -> Result<(), SceneError> {
        self.current = 0;
        if let Some(id) = self.current() {
            self.mark(graph, id, true)?;
        }
        Ok(())
    }

    /// Moves the highlight to the next node, wrapping at the end.
    pub fn next(&mut self, graph: &mut SceneGraph) -> Result<Option<NodeId>, SceneError> {
        let Some(previous) = self.current() else {
            return Ok(None);
        };
        self.mark(graph, previous, false)?;

        self.current = (self.current + 1) % self.ids.len();
        let id = self.ids[self.current];
        self.mark(graph, id, true)?;
        info!("Selected '{}' ({})", graph.node(id)?.label(), id);
        Ok(Some(id))
    }

    fn mark(&self, graph: &mut SceneGraph, id: NodeId, selected: bool) -> Result<(), SceneError> {
        let node = graph.node_mut(id)?;
        node.selected = selected;
        if self.style == SelectionStyle::Wireframe {
            node.fill = if selected { FillMode::Wireframe } else { FillMode::Fill };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::node::MobileNode;

    fn graph_of(n: usize) -> (SceneGraph, Vec<NodeId>) {
        let mut graph = SceneGraph::new();
        let ids = (0..n).map(|i| graph.add_node(MobileNode::new(format!("n{}", i)))).collect();
        (graph, ids)
    }

    #[test]
    fn test_cycling_clears_previous() {
        let (mut graph, ids) = graph_of(3);
        let mut selection = Selection::new(ids.clone(), SelectionStyle::Wireframe);
        selection.apply_initial(&mut graph).unwrap();
        assert_eq!(graph.node(ids[0]).unwrap().fill, FillMode::Wireframe);

        assert_eq!(selection.next(&mut graph).unwrap(), Some(ids[1]));
        assert_eq!(graph.node(ids[0]).unwrap().fill, FillMode::Fill);
        assert!(!graph.node(ids[0]).unwrap().selected);
        assert!(graph.node(ids[1]).unwrap().selected);

        selection.next(&mut graph).unwrap();
        assert_eq!(selection.next(&mut graph).unwrap(), Some(ids[0]));
        assert_eq!(graph.iter().filter(|(_, n)| n.selected).count(), 1);
    }

    #[test]
    fn test_highlight_keeps_fill() {
        let (mut graph, ids) = graph_of(2);
        let mut selection = Selection::new(ids.clone(), SelectionStyle::Highlight);
        selection.apply_initial(&mut graph).unwrap();
        assert!(graph.node(ids[0]).unwrap().selected);
        assert_eq!(graph.node(ids[0]).unwrap().fill, FillMode::Fill);
    }

    #[test]
    fn test_empty_selection() {
        let (mut graph, _) = graph_of(1);
        let mut selection = Selection::new(Vec::new(), SelectionStyle::Wireframe);
        selection.apply_initial(&mut graph).unwrap();
        assert_eq!(selection.next(&mut graph).unwrap(), None);
    }
}
