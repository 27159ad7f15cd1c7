//! Undoable edit commands and the undo/redo stacks.
//!
//! Every mutating diagram operation returns a `Command` describing exactly
//! what it did, with enough captured state to invert it. `History` never
//! re-derives anything from the diagram: undo is a literal replay of the
//! inverse, so undo-then-redo always lands on the same structure.

use tracing::debug;

use crate::diagram::{Diagram, Slot};
use crate::edge::{Edge, EdgeId};
use crate::node::{Node, NodeId};
use crate::property::PropertyValue;

/// Most remembered edits before the oldest falls off
pub const HISTORY_CAPACITY: usize = 100;

/// One applied edit, carrying the state needed to reverse it
#[derive(Debug, Clone)]
pub enum Command {
    /// A node inserted at a specific slot
    AddNode { node: Node, slot: Slot },
    /// An edge appended at a specific draw-order index
    AddEdge { edge: Edge, index: usize },
    /// A cascading removal. Nodes carry their slot only when they were
    /// top-level in the removed set; descendants ride along inside their
    /// parent's child list. Listed parents-before-children.
    Remove {
        nodes: Vec<(Node, Option<Slot>)>,
        edges: Vec<(Edge, usize)>,
    },
    /// A rigid translation of whole subtrees
    MoveNodes {
        ids: Vec<NodeId>,
        dx: i32,
        dy: i32,
    },
    SetNodeProperty {
        id: NodeId,
        name: String,
        old: PropertyValue,
        new: PropertyValue,
    },
    SetEdgeProperty {
        id: EdgeId,
        name: String,
        old: PropertyValue,
        new: PropertyValue,
    },
    /// Several edits applied as one undo step, in order
    Composite(Vec<Command>),
}

impl Command {
    /// Replay this edit on a diagram it has been reverted from
    pub fn apply(&self, diagram: &mut Diagram) {
        match self {
            Command::AddNode { node, slot } => {
                diagram.insert_node_raw(node.clone(), *slot);
            }
            Command::AddEdge { edge, index } => {
                diagram.insert_edge_raw(edge.clone(), *index);
            }
            Command::Remove { nodes, edges } => {
                for (edge, _) in edges {
                    diagram.remove_edge_raw(edge.id);
                }
                // Dropping the top-level subtrees takes the recorded
                // descendants with them
                for (node, slot) in nodes {
                    if slot.is_some() {
                        diagram.remove_subtree_raw(node.id);
                    }
                }
            }
            Command::MoveNodes { ids, dx, dy } => {
                diagram.translate_raw(ids, *dx, *dy);
            }
            Command::SetNodeProperty { id, name, new, .. } => {
                if let Some(node) = diagram.node_mut(*id) {
                    let _ = node.set_property(name, new.clone());
                }
            }
            Command::SetEdgeProperty { id, name, new, .. } => {
                if let Some(edge) = diagram.edge_mut(*id) {
                    let _ = edge.set_property(name, new.clone());
                }
            }
            Command::Composite(commands) => {
                for command in commands {
                    command.apply(diagram);
                }
            }
        }
        diagram.debug_check();
    }

    /// Exact inverse of `apply`
    pub fn revert(&self, diagram: &mut Diagram) {
        match self {
            Command::AddNode { node, .. } => {
                // Any later edit touching this node was reverted first, so
                // the subtree is exactly the single node again
                diagram.remove_subtree_raw(node.id);
            }
            Command::AddEdge { edge, .. } => {
                diagram.remove_edge_raw(edge.id);
            }
            Command::Remove { nodes, edges } => {
                // Top-level subtrees go back into their recorded slots in
                // ascending index order so each index is meaningful again
                let mut top: Vec<(&Node, Slot)> = nodes
                    .iter()
                    .filter_map(|(node, slot)| slot.map(|s| (node, s)))
                    .collect();
                top.sort_by_key(|(_, slot)| match slot {
                    Slot::Root(index) => *index,
                    Slot::Child(_, index) => *index,
                });
                for (node, slot) in top {
                    diagram.insert_node_raw(node.clone(), slot);
                }
                // Descendants ride along: their ids are already in their
                // restored parent's child list
                for (node, slot) in nodes {
                    if slot.is_none() {
                        diagram.restore_node_entry(node.clone());
                    }
                }
                let mut edges = edges.clone();
                edges.sort_by_key(|(_, index)| *index);
                for (edge, index) in edges {
                    diagram.insert_edge_raw(edge, index);
                }
            }
            Command::MoveNodes { ids, dx, dy } => {
                diagram.translate_raw(ids, -dx, -dy);
            }
            Command::SetNodeProperty { id, name, old, .. } => {
                if let Some(node) = diagram.node_mut(*id) {
                    let _ = node.set_property(name, old.clone());
                }
            }
            Command::SetEdgeProperty { id, name, old, .. } => {
                if let Some(edge) = diagram.edge_mut(*id) {
                    let _ = edge.set_property(name, old.clone());
                }
            }
            Command::Composite(commands) => {
                for command in commands.iter().rev() {
                    command.revert(diagram);
                }
            }
        }
        diagram.debug_check();
    }
}

/// Undo/redo stacks over recorded commands
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an already-applied edit. Clears the redo stack: a fresh edit
    /// forks away from whatever was undone.
    pub fn record(&mut self, command: Command) {
        self.redo_stack.clear();
        if self.undo_stack.len() == HISTORY_CAPACITY {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(command);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Revert the most recent edit; does nothing on an empty stack
    pub fn undo(&mut self, diagram: &mut Diagram) {
        if let Some(command) = self.undo_stack.pop() {
            debug!("undo");
            command.revert(diagram);
            self.redo_stack.push(command);
        }
    }

    /// Reapply the most recently undone edit; does nothing when nothing
    /// was undone
    pub fn redo(&mut self, diagram: &mut Diagram) {
        if let Some(command) = self.redo_stack.pop() {
            debug!("redo");
            command.apply(diagram);
            self.undo_stack.push(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::DiagramType;
    use crate::geometry::Point;
    use crate::node::NodeKind;

    fn class_node() -> Node {
        Node::new(NodeKind::Class {
            name: "Order".to_string(),
            attributes: String::new(),
            methods: String::new(),
        })
    }

    #[test]
    fn undo_redo_round_trips_an_insertion() {
        let mut diagram = Diagram::new(DiagramType::Class);
        let mut history = History::new();
        let (id, command) = diagram.add_node(class_node(), Point::new(20, 20)).unwrap();
        history.record(command);

        history.undo(&mut diagram);
        assert!(diagram.node(id).is_none());
        assert!(history.can_redo());

        history.redo(&mut diagram);
        assert_eq!(diagram.node(id).unwrap().position, Point::new(20, 20));
        diagram.assert_consistent();
    }

    #[test]
    fn new_edit_discards_the_redo_stack() {
        let mut diagram = Diagram::new(DiagramType::Class);
        let mut history = History::new();
        let (_, first) = diagram.add_node(class_node(), Point::new(0, 0)).unwrap();
        history.record(first);
        history.undo(&mut diagram);

        let (_, second) = diagram.add_node(class_node(), Point::new(50, 50)).unwrap();
        history.record(second);
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_drops_the_oldest_edit() {
        let mut diagram = Diagram::new(DiagramType::Class);
        let mut history = History::new();
        let mut ids = Vec::new();
        for i in 0..HISTORY_CAPACITY + 1 {
            let (id, command) = diagram
                .add_node(class_node(), Point::new(0, i as i32 * 70))
                .unwrap();
            ids.push(id);
            history.record(command);
        }
        for _ in 0..HISTORY_CAPACITY + 1 {
            history.undo(&mut diagram);
        }
        // The first insertion fell off the stack and survives every undo
        assert!(diagram.node(ids[0]).is_some());
        assert_eq!(diagram.node_count(), 1);
    }

    #[test]
    fn undo_on_empty_history_is_a_no_op() {
        let mut diagram = Diagram::new(DiagramType::Class);
        let mut history = History::new();
        history.undo(&mut diagram);
        history.redo(&mut diagram);
        assert_eq!(diagram.node_count(), 0);
    }
}
