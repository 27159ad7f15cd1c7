//! Ordered selection of diagram elements.

use crate::diagram::Diagram;
use crate::edge::EdgeId;
use crate::node::NodeId;

/// A selectable element, node or edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Node(NodeId),
    Edge(EdgeId),
}

/// Insertion-ordered set of selected elements. Re-adding is idempotent,
/// removing an absent element is a no-op.
#[derive(Debug, Clone, Default)]
pub struct SelectionList {
    elements: Vec<ElementRef>,
}

impl SelectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: ElementRef) {
        if !self.elements.contains(&element) {
            self.elements.push(element);
        }
    }

    pub fn remove(&mut self, element: ElementRef) {
        self.elements.retain(|e| *e != element);
    }

    pub fn contains(&self, element: ElementRef) -> bool {
        self.elements.contains(&element)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Elements in the order they were selected
    pub fn iter(&self) -> impl Iterator<Item = ElementRef> + '_ {
        self.elements.iter().copied()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                ElementRef::Node(id) => Some(*id),
                ElementRef::Edge(_) => None,
            })
            .collect()
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                ElementRef::Edge(id) => Some(*id),
                ElementRef::Node(_) => None,
            })
            .collect()
    }

    /// Select every element: nodes in depth-first draw order, then edges
    /// in draw order
    pub fn select_all(&mut self, diagram: &Diagram) {
        self.clear();
        for id in diagram.node_ids_depth_first() {
            self.elements.push(ElementRef::Node(id));
        }
        for id in diagram.edge_ids() {
            self.elements.push(ElementRef::Edge(*id));
        }
    }

    /// Drop references to elements no longer in the diagram
    pub fn prune(&mut self, diagram: &Diagram) {
        self.elements.retain(|e| match e {
            ElementRef::Node(id) => diagram.node(*id).is_some(),
            ElementRef::Edge(id) => diagram.edge(*id).is_some(),
        });
    }
}
