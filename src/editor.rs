//! Editing session facade: one diagram plus its selection, clipboard, and
//! undo history, with every mutation recorded.
//!
//! Callers that want fine-grained control can drive `Diagram` directly and
//! feed the returned commands to a `History` themselves; this type wires
//! the common path.

use tracing::info;

use crate::clipboard::Clipboard;
use crate::diagram::{Diagram, DiagramType};
use crate::edge::{Edge, EdgeId};
use crate::geometry::Point;
use crate::history::History;
use crate::node::{Node, NodeId};
use crate::property::{PropertyError, PropertyValue};
use crate::selection::{ElementRef, SelectionList};

pub struct Editor {
    diagram: Diagram,
    selection: SelectionList,
    clipboard: Clipboard,
    history: History,
}

impl Editor {
    pub fn new(diagram_type: DiagramType) -> Self {
        info!(?diagram_type, "new editing session");
        Self {
            diagram: Diagram::new(diagram_type),
            selection: SelectionList::new(),
            clipboard: Clipboard::new(),
            history: History::new(),
        }
    }

    pub fn open(diagram: Diagram) -> Self {
        Self {
            diagram,
            selection: SelectionList::new(),
            clipboard: Clipboard::new(),
            history: History::new(),
        }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn selection(&self) -> &SelectionList {
        &self.selection
    }

    // --- Element creation ---

    /// Drop a node at a point; the new node becomes the selection
    pub fn add_node(&mut self, node: Node, point: Point) -> Option<NodeId> {
        let (id, command) = self.diagram.add_node(node, point)?;
        self.history.record(command);
        self.selection.clear();
        self.selection.add(ElementRef::Node(id));
        Some(id)
    }

    pub fn add_edge(&mut self, edge: Edge, start: Point, end: Point) -> Option<EdgeId> {
        let (id, command) = self.diagram.add_edge(edge, start, end)?;
        self.history.record(command);
        self.selection.clear();
        self.selection.add(ElementRef::Edge(id));
        Some(id)
    }

    // --- Selection ---

    pub fn select(&mut self, element: ElementRef) {
        self.selection.clear();
        self.selection.add(element);
    }

    pub fn toggle_select(&mut self, element: ElementRef) {
        if self.selection.contains(element) {
            self.selection.remove(element);
        } else {
            self.selection.add(element);
        }
    }

    pub fn select_at(&mut self, point: Point) -> Option<ElementRef> {
        let element = self.diagram.find_element_at(point)?;
        self.select(element);
        Some(element)
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.diagram);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // --- Edits on the selection ---

    pub fn move_selected(&mut self, dx: i32, dy: i32) {
        let ids = self.selection.node_ids();
        if let Some(command) = self.diagram.translate_nodes(&ids, dx, dy) {
            self.history.record(command);
        }
    }

    pub fn remove_selected(&mut self) {
        let nodes = self.selection.node_ids();
        let edges = self.selection.edge_ids();
        if let Some(command) = self.diagram.remove_elements(&nodes, &edges) {
            self.history.record(command);
        }
        self.selection.clear();
    }

    pub fn set_node_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        let command = self.diagram.set_node_property(id, name, value)?;
        self.history.record(command);
        Ok(())
    }

    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        let command = self.diagram.set_edge_property(id, name, value)?;
        self.history.record(command);
        Ok(())
    }

    // --- Clipboard ---

    pub fn copy(&mut self) {
        self.clipboard.copy(&self.diagram, &self.selection);
    }

    pub fn cut(&mut self) {
        self.clipboard.copy(&self.diagram, &self.selection);
        self.remove_selected();
    }

    /// Paste the clipboard; the pasted elements become the selection
    pub fn paste(&mut self) -> bool {
        match self.clipboard.paste(&mut self.diagram) {
            Some((refs, command)) => {
                self.history.record(command);
                self.selection.clear();
                for element in refs {
                    self.selection.add(element);
                }
                true
            }
            None => false,
        }
    }

    // --- History ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) {
        self.history.undo(&mut self.diagram);
        self.selection.prune(&self.diagram);
    }

    pub fn redo(&mut self) {
        self.history.redo(&mut self.diagram);
        self.selection.prune(&self.diagram);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;
    use crate::node::NodeKind;

    fn class_node(name: &str) -> Node {
        Node::new(NodeKind::Class {
            name: name.to_string(),
            attributes: String::new(),
            methods: String::new(),
        })
    }

    #[test]
    fn cut_then_undo_restores_selection_targets() {
        let mut editor = Editor::new(DiagramType::Class);
        let a = editor.add_node(class_node("A"), Point::new(0, 0)).unwrap();
        let b = editor
            .add_node(class_node("B"), Point::new(200, 0))
            .unwrap();
        editor
            .add_edge(
                Edge::new(EdgeKind::Association),
                Point::new(5, 5),
                Point::new(205, 5),
            )
            .unwrap();

        editor.select(ElementRef::Node(a));
        editor.cut();
        // The connected edge goes with the node
        assert!(editor.diagram().node(a).is_none());
        assert_eq!(editor.diagram().edge_count(), 0);
        assert!(editor.diagram().node(b).is_some());

        editor.undo();
        assert!(editor.diagram().node(a).is_some());
        assert_eq!(editor.diagram().edge_count(), 1);
        editor.diagram().assert_consistent();
    }

    #[test]
    fn move_set_property_undo_chain() {
        let mut editor = Editor::new(DiagramType::Class);
        let id = editor.add_node(class_node("A"), Point::new(10, 10)).unwrap();
        editor.select(ElementRef::Node(id));
        editor.move_selected(30, 0);
        editor
            .set_node_property(id, "name", PropertyValue::text("Renamed"))
            .unwrap();

        assert_eq!(editor.diagram().node(id).unwrap().position, Point::new(40, 10));
        editor.undo();
        assert_eq!(
            editor.diagram().node(id).unwrap().property("name"),
            Some(PropertyValue::text("A"))
        );
        editor.undo();
        assert_eq!(editor.diagram().node(id).unwrap().position, Point::new(10, 10));
        editor.redo();
        assert_eq!(editor.diagram().node(id).unwrap().position, Point::new(40, 10));
    }

    #[test]
    fn paste_selects_the_new_elements() {
        let mut editor = Editor::new(DiagramType::Class);
        let id = editor.add_node(class_node("A"), Point::new(0, 0)).unwrap();
        editor.select(ElementRef::Node(id));
        editor.copy();
        assert!(editor.paste());
        assert_eq!(editor.selection().len(), 1);
        assert!(!editor.selection().contains(ElementRef::Node(id)));
    }
}
