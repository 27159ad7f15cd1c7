//! Copy/paste buffer.
//!
//! The clipboard stores detached clones of the copied subtrees, normalized
//! to the origin. Pasting mints fresh ids every time, so pasting twice
//! yields two independent copies, and a paste never collides with whatever
//! happened to the source elements since the copy.

use std::collections::HashMap;

use tracing::debug;

use crate::diagram::{Diagram, Slot};
use crate::edge::Edge;
use crate::geometry::{Point, Rect};
use crate::history::Command;
use crate::node::{Node, NodeId};
use crate::rules;
use crate::selection::{ElementRef, SelectionList};

/// Shift applied to pasted content so it does not land exactly on the
/// source elements; grows with every paste of the same buffer
pub const PASTE_OFFSET: i32 = 10;

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    /// Cloned subtree roots, each carrying its cloned descendants
    roots: Vec<Node>,
    /// Descendants keyed by id; relations still use the source ids
    descendants: HashMap<NodeId, Node>,
    edges: Vec<Edge>,
    /// Bounds origin of the copied content in its source diagram
    origin: Point,
    /// Pastes since the last copy; staggers repeated pastes
    pastes: i32,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Replace the buffer with the selected elements. Only subtree tops are
    /// kept (selecting a package and a class inside it copies the class
    /// once), and only edges with both endpoints among the copied nodes.
    pub fn copy(&mut self, diagram: &Diagram, selection: &SelectionList) {
        self.roots.clear();
        self.descendants.clear();
        self.edges.clear();
        self.origin = Point::default();
        self.pastes = 0;

        let selected = selection.node_ids();
        let tops: Vec<NodeId> = selected
            .iter()
            .copied()
            .filter(|id| diagram.node(*id).is_some())
            .filter(|id| !has_selected_ancestor(diagram, *id, &selected))
            .filter(|id| {
                // A node that only lives inside a container cannot stand
                // alone after a paste
                let node = diagram.node(*id).expect("filtered above");
                !rules::requires_parent(node.node_type())
            })
            .collect();

        let mut copied: Vec<NodeId> = Vec::new();
        for &top in &tops {
            let mut root = diagram.node(top).expect("copy source present").clone();
            root.parent = None;
            for sub in diagram.subtree_ids(top) {
                copied.push(sub);
                if sub != top {
                    let node = diagram.node(sub).expect("subtree member present");
                    self.descendants.insert(sub, node.clone());
                }
            }
            self.roots.push(root);
        }

        for id in selection.edge_ids() {
            if let Some(edge) = diagram.edge(id) {
                if copied.contains(&edge.start) && copied.contains(&edge.end) {
                    self.edges.push(edge.clone());
                }
            }
        }

        // Normalize to the origin; the recorded origin anchors pastes back
        // near the source
        if let Some(first) = self.roots.first() {
            let mut bounds = subtree_bounds(first, &self.descendants);
            for root in &self.roots[1..] {
                bounds = bounds.union(subtree_bounds(root, &self.descendants));
            }
            self.origin = bounds.origin();
            for root in &mut self.roots {
                root.translate(-bounds.x, -bounds.y);
            }
            for node in self.descendants.values_mut() {
                node.translate(-bounds.x, -bounds.y);
            }
        }
        debug!(roots = self.roots.len(), edges = self.edges.len(), "copied");
    }

    /// Insert a copy of the buffer into a diagram as new root subtrees,
    /// near the copied source: at its origin plus `PASTE_OFFSET`, one more
    /// offset step per repeated paste so copies never land exactly on the
    /// originals or on each other. Rejected wholesale when any buffered
    /// element is not legal in the target diagram type. Returns the refs
    /// of the pasted elements for reselection.
    pub fn paste(&mut self, diagram: &mut Diagram) -> Option<(Vec<ElementRef>, Command)> {
        if self.is_empty() {
            return None;
        }
        for node in self.roots.iter().chain(self.descendants.values()) {
            if !rules::allowed_node(diagram.diagram_type(), node.node_type()) {
                debug!("paste rejected, node kind not allowed here");
                return None;
            }
        }

        // Fresh id per buffered node
        let mut fresh: HashMap<NodeId, NodeId> = HashMap::new();
        for node in self.roots.iter().chain(self.descendants.values()) {
            fresh.insert(node.id, NodeId::new());
        }

        let step = PASTE_OFFSET * (self.pastes + 1);
        let shift = self.origin.translated(step, step);
        let mut commands = Vec::new();
        let mut refs = Vec::new();
        let mut root_index = diagram.roots().len();
        for root in &self.roots {
            self.plan_subtree(
                root,
                Slot::Root(root_index),
                shift,
                &fresh,
                &mut commands,
                &mut refs,
            );
            root_index += 1;
        }
        let mut edge_index = diagram.edge_count();
        for edge in &self.edges {
            let mut pasted = edge.clone();
            pasted.id = crate::edge::EdgeId::new();
            pasted.start = fresh[&edge.start];
            pasted.end = fresh[&edge.end];
            refs.push(ElementRef::Edge(pasted.id));
            commands.push(Command::AddEdge {
                edge: pasted,
                index: edge_index,
            });
            edge_index += 1;
        }

        let command = Command::Composite(commands);
        command.apply(diagram);
        self.pastes += 1;
        debug!(elements = refs.len(), "pasted");
        Some((refs, command))
    }

    fn plan_subtree(
        &self,
        node: &Node,
        slot: Slot,
        shift: Point,
        fresh: &HashMap<NodeId, NodeId>,
        commands: &mut Vec<Command>,
        refs: &mut Vec<ElementRef>,
    ) {
        let mut clone = node.clone();
        clone.id = fresh[&node.id];
        clone.translate(shift.x, shift.y);
        let children = std::mem::take(&mut clone.children);
        refs.push(ElementRef::Node(clone.id));
        commands.push(Command::AddNode { node: clone, slot });
        let parent = fresh[&node.id];
        for (index, child) in children.iter().enumerate() {
            let child_node = &self.descendants[child];
            self.plan_subtree(
                child_node,
                Slot::Child(parent, index),
                shift,
                fresh,
                commands,
                refs,
            );
        }
    }
}

fn has_selected_ancestor(diagram: &Diagram, id: NodeId, selected: &[NodeId]) -> bool {
    let mut current = diagram.node(id).and_then(|n| n.parent);
    while let Some(parent) = current {
        if selected.contains(&parent) {
            return true;
        }
        current = diagram.node(parent).and_then(|n| n.parent);
    }
    false
}

fn subtree_bounds(root: &Node, descendants: &HashMap<NodeId, Node>) -> Rect {
    let mut bounds = root.local_bounds();
    for child in &root.children {
        bounds = bounds.union(subtree_bounds(&descendants[child], descendants));
    }
    bounds
}
