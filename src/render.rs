//! Rendering seam. The model knows draw order and geometry; what a node or
//! edge looks like on screen belongs to whoever implements `Surface`.

use crate::edge::Edge;
use crate::geometry::{Point, Rect};
use crate::node::Node;

/// Backend a diagram paints itself onto
pub trait Surface {
    /// One node, with its grown bounds (children included)
    fn draw_node(&mut self, node: &Node, bounds: Rect);

    /// One edge, with the centers of its endpoint bounds
    fn draw_edge(&mut self, edge: &Edge, from: Point, to: Point);
}

/// What a surface was asked to paint, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    Node(crate::node::NodeId, Rect),
    Edge(crate::edge::EdgeId, Point, Point),
}

/// Surface that records every call; lets tests assert on draw order
/// without a real backend
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for RecordingSurface {
    fn draw_node(&mut self, node: &Node, bounds: Rect) {
        self.ops.push(DrawOp::Node(node.id, bounds));
    }

    fn draw_edge(&mut self, edge: &Edge, from: Point, to: Point) {
        self.ops.push(DrawOp::Edge(edge.id, from, to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Diagram, DiagramType};
    use crate::edge::EdgeKind;
    use crate::node::NodeKind;

    #[test]
    fn containers_paint_before_children_and_edges_last() {
        let mut diagram = Diagram::new(DiagramType::Class);
        let (package, _) = diagram
            .add_node(
                Node::new(NodeKind::Package {
                    name: "app".to_string(),
                    contents: String::new(),
                }),
                Point::new(0, 0),
            )
            .unwrap();
        let (class, _) = diagram
            .add_node(
                Node::new(NodeKind::Class {
                    name: "App".to_string(),
                    attributes: String::new(),
                    methods: String::new(),
                }),
                Point::new(10, 10),
            )
            .unwrap();
        let (other, _) = diagram
            .add_node(
                Node::new(NodeKind::Class {
                    name: "Helper".to_string(),
                    attributes: String::new(),
                    methods: String::new(),
                }),
                Point::new(300, 0),
            )
            .unwrap();
        diagram
            .add_edge(
                Edge::new(EdgeKind::Dependency),
                Point::new(15, 15),
                Point::new(310, 10),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        diagram.draw(&mut surface);

        let order: Vec<_> = surface
            .ops
            .iter()
            .map(|op| match op {
                DrawOp::Node(id, _) => ("node", Some(*id)),
                DrawOp::Edge(..) => ("edge", None),
            })
            .collect();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], ("node", Some(package)));
        assert_eq!(order[1], ("node", Some(class)));
        assert_eq!(order[2], ("node", Some(other)));
        assert_eq!(order[3].0, "edge");
    }
}
