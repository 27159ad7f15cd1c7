//! The diagram aggregate root - THE source of truth for one open document.
//!
//! Nodes and edges live in id-keyed arenas; roots and edges keep ordered id
//! lists so iteration, drawing, and serialization are deterministic. All
//! structural mutation funnels through the operations here, each of which
//! either rejects (a silent no-op, normal for pointer-driven input) or
//! returns a [`Command`] record the history can replay and invert.
//!
//! [`Command`]: crate::history::Command

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::edge::{ArrowHead, Edge, EdgeId, EdgeKind, LineStyle};
use crate::geometry::{Point, Rect};
use crate::history::Command;
use crate::node::{Node, NodeId, NodeKind, NodeType};
use crate::property::{PropertyError, PropertyValue};
use crate::render::Surface;
use crate::rules;
use crate::selection::ElementRef;
use crate::sequence;

/// Distance from a point to the segment between two points
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (px, py) = (f64::from(p.x - a.x), f64::from(p.y - a.y));
    let (vx, vy) = (f64::from(b.x - a.x), f64::from(b.y - a.y));
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        ((px * vx + py * vy) / len_sq).clamp(0.0, 1.0)
    };
    let (dx, dy) = (px - t * vx, py - t * vy);
    (dx * dx + dy * dy).sqrt()
}

/// The closed set of diagram types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramType {
    Class,
    Object,
    UseCase,
    State,
    Sequence,
}

impl DiagramType {
    pub const ALL: [DiagramType; 5] = [
        DiagramType::Class,
        DiagramType::Object,
        DiagramType::UseCase,
        DiagramType::State,
        DiagramType::Sequence,
    ];

    /// Template nodes for palette population; adding clones one of these
    pub fn node_prototypes(self) -> Vec<Node> {
        let kinds: Vec<NodeKind> = match self {
            DiagramType::Class => vec![
                NodeKind::Class {
                    name: String::new(),
                    attributes: String::new(),
                    methods: String::new(),
                },
                NodeKind::Interface {
                    name: String::new(),
                    methods: String::new(),
                },
                NodeKind::Package {
                    name: String::new(),
                    contents: String::new(),
                },
                NodeKind::Note { text: String::new() },
            ],
            DiagramType::Object => vec![
                NodeKind::Object { name: String::new() },
                NodeKind::Field {
                    name: String::new(),
                    value: String::new(),
                },
                NodeKind::Note { text: String::new() },
            ],
            DiagramType::UseCase => vec![
                NodeKind::Actor { name: String::new() },
                NodeKind::UseCase { name: String::new() },
                NodeKind::Note { text: String::new() },
            ],
            DiagramType::State => vec![
                NodeKind::State { name: String::new() },
                NodeKind::InitialState,
                NodeKind::FinalState,
                NodeKind::Note { text: String::new() },
            ],
            DiagramType::Sequence => vec![
                NodeKind::Lifeline { name: String::new() },
                NodeKind::Call { open_bottom: false },
                NodeKind::Note { text: String::new() },
            ],
        };
        kinds.into_iter().map(Node::new).collect()
    }

    /// Template edges for palette population, preconfigured with the styles
    /// and stereotype labels of their role
    pub fn edge_prototypes(self) -> Vec<Edge> {
        match self {
            DiagramType::Class => vec![
                Edge::new(EdgeKind::Association),
                Edge::new(EdgeKind::Generalization),
                Edge::new(EdgeKind::Realization),
                Edge::new(EdgeKind::Aggregation),
                Edge::new(EdgeKind::Composition),
                Edge::new(EdgeKind::Dependency),
                Edge::new(EdgeKind::Note),
            ],
            DiagramType::Object => vec![
                Edge::new(EdgeKind::ObjectReference),
                Edge::new(EdgeKind::ObjectCollaboration),
                Edge::new(EdgeKind::Note),
            ],
            DiagramType::UseCase => vec![
                Edge::new(EdgeKind::Association),
                Edge::new(EdgeKind::Dependency)
                    .with_line(LineStyle::Dotted)
                    .with_end_arrow(ArrowHead::V)
                    .with_middle_label("\u{ab}extend\u{bb}"),
                Edge::new(EdgeKind::Dependency)
                    .with_line(LineStyle::Dotted)
                    .with_end_arrow(ArrowHead::V)
                    .with_middle_label("\u{ab}include\u{bb}"),
                Edge::new(EdgeKind::Generalization),
                Edge::new(EdgeKind::Note),
            ],
            DiagramType::State => vec![
                Edge::new(EdgeKind::Transition),
                Edge::new(EdgeKind::Note),
            ],
            DiagramType::Sequence => vec![
                Edge::new(EdgeKind::Call),
                Edge::new(EdgeKind::Return),
                Edge::new(EdgeKind::Note),
            ],
        }
    }
}

/// Where a node attaches when (re)inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Root list position
    Root(usize),
    /// Position within a parent's child list
    Child(NodeId, usize),
}

/// One diagram document
#[derive(Debug, Clone)]
pub struct Diagram {
    diagram_type: DiagramType,
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeId, Edge>,
    roots: Vec<NodeId>,
    edge_order: Vec<EdgeId>,
}

impl Diagram {
    pub fn new(diagram_type: DiagramType) -> Self {
        Self {
            diagram_type,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            roots: Vec::new(),
            edge_order: Vec::new(),
        }
    }

    pub fn diagram_type(&self) -> DiagramType {
        self.diagram_type
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Edge ids in insertion order
    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edge_order
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().map(|id| &self.edges[id])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    /// All node ids, depth-first from the roots, parents before children
    pub fn node_ids_depth_first(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// The id and all descendant ids, parents before children
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // --- Geometry ---

    /// Bounds of a node including everything it contains
    pub fn node_bounds(&self, id: NodeId) -> Rect {
        let node = &self.nodes[&id];
        let mut bounds = node.local_bounds();
        for child in &node.children {
            bounds = bounds.union(self.node_bounds(*child));
        }
        bounds
    }

    /// Smallest rectangle enclosing every root subtree. Recomputed on
    /// demand; positions mutate too often to cache.
    pub fn bounds(&self) -> Rect {
        let mut iter = self.roots.iter();
        let Some(first) = iter.next() else {
            return Rect::default();
        };
        let mut bounds = self.node_bounds(*first);
        for id in iter {
            bounds = bounds.union(self.node_bounds(*id));
        }
        bounds
    }

    /// Deepest node whose bounds contain the point, later roots first so
    /// recently added elements win ties
    pub fn find_node_at(&self, point: Point) -> Option<NodeId> {
        for root in self.roots.iter().rev() {
            if let Some(hit) = self.find_in_subtree(*root, point) {
                return Some(hit);
            }
        }
        None
    }

    fn find_in_subtree(&self, id: NodeId, point: Point) -> Option<NodeId> {
        if !self.node_bounds(id).contains(point) {
            return None;
        }
        let node = &self.nodes[&id];
        for child in node.children.iter().rev() {
            if let Some(hit) = self.find_in_subtree(*child, point) {
                return Some(hit);
            }
        }
        // Containers also own the area their children grew them to cover;
        // a lifeline's line keeps receiving drops below its last call
        Some(id)
    }

    /// Hit test over everything: nodes win over edges, later edges win
    /// over earlier ones. An edge is hit within a few pixels of the
    /// segment between its endpoint centers.
    pub fn find_element_at(&self, point: Point) -> Option<ElementRef> {
        if let Some(id) = self.find_node_at(point) {
            return Some(ElementRef::Node(id));
        }
        const EDGE_HIT_TOLERANCE: f64 = 5.0;
        for id in self.edge_order.iter().rev() {
            let edge = &self.edges[id];
            let from = self.node_bounds(edge.start).center();
            let to = self.node_bounds(edge.end).center();
            if segment_distance(point, from, to) <= EDGE_HIT_TOLERANCE {
                return Some(ElementRef::Edge(*id));
            }
        }
        None
    }

    // --- Structural operations ---

    /// Add a node at a point. The diagram decides whether it becomes a new
    /// root or attaches to a container under the point; returns `None` when
    /// the diagram type or the target container rejects it.
    pub fn add_node(&mut self, mut node: Node, point: Point) -> Option<(NodeId, Command)> {
        let node_type = node.node_type();
        if !rules::allowed_node(self.diagram_type, node_type) {
            debug!(?node_type, diagram = ?self.diagram_type, "node kind rejected");
            return None;
        }
        node.position = point;
        node.parent = None;

        let slot = match self.find_container_for(node_type, point) {
            Some(slot) => slot,
            None => {
                if rules::requires_parent(node_type) {
                    debug!(?node_type, "free-standing drop rejected");
                    return None;
                }
                Slot::Root(self.roots.len())
            }
        };

        let id = node.id;
        let command = Command::AddNode {
            node: node.clone(),
            slot,
        };
        self.insert_node_raw(node, slot);
        debug!(%id, ?node_type, "node added");
        self.debug_check();
        Some((id, command))
    }

    /// The container slot a drop at `point` lands in, if any
    fn find_container_for(&self, node_type: NodeType, point: Point) -> Option<Slot> {
        let container = self.find_node_at(point).and_then(|hit| {
            // Walk up until something can hold the new node
            let mut current = Some(hit);
            while let Some(id) = current {
                let node = &self.nodes[&id];
                if rules::can_contain(node.node_type(), node_type) {
                    return Some(id);
                }
                current = node.parent;
            }
            None
        })?;
        if node_type == NodeType::Call {
            // A call dropped below an existing call nests inside it,
            // modeling call depth
            return Some(sequence::call_drop_slot(self, container, point.y));
        }
        Some(Slot::Child(
            container,
            self.nodes[&container].children.len(),
        ))
    }

    /// Add an edge between whatever lies under the two points. Silently
    /// rejects misses and rule violations; sequence diagrams may synthesize
    /// a call node as a side effect (captured in the returned command).
    pub fn add_edge(
        &mut self,
        edge: Edge,
        start_point: Point,
        end_point: Point,
    ) -> Option<(EdgeId, Command)> {
        let kind = edge.kind;
        if self.diagram_type == DiagramType::Sequence
            && matches!(kind, EdgeKind::Call | EdgeKind::Return)
        {
            return sequence::add_activation_edge(self, edge, start_point, end_point);
        }

        let start = self.find_node_at(start_point)?;
        let end = self.find_node_at(end_point)?;
        let start_type = self.nodes[&start].node_type();
        let end_type = self.nodes[&end].node_type();
        if !rules::allowed_connection(self.diagram_type, kind, start_type, end_type) {
            debug!(?kind, ?start_type, ?end_type, "connection rejected");
            return None;
        }
        Some(self.attach_edge(edge, start, end))
    }

    /// Finish an accepted edge: bind endpoints, append, record
    pub(crate) fn attach_edge(
        &mut self,
        mut edge: Edge,
        start: NodeId,
        end: NodeId,
    ) -> (EdgeId, Command) {
        edge.start = start;
        edge.end = end;
        let id = edge.id;
        let command = Command::AddEdge {
            edge: edge.clone(),
            index: self.edge_order.len(),
        };
        self.insert_edge_raw(edge, self.edge_order.len());
        debug!(%id, "edge added");
        self.debug_check();
        (id, command)
    }

    /// Cascading removal: the requested nodes with their whole subtrees,
    /// the requested edges, and every edge left with a dangling endpoint.
    /// Computed in a single pass; the diagram is never observable with an
    /// edge referencing a removed node. Returns `None` when nothing listed
    /// is present (already-removed elements are tolerated).
    pub fn remove_elements(
        &mut self,
        node_ids: &[NodeId],
        edge_ids: &[EdgeId],
    ) -> Option<Command> {
        // Expand to full subtrees, deduplicated, parents before children
        let mut doomed_nodes: Vec<NodeId> = Vec::new();
        let mut doomed_set: HashSet<NodeId> = HashSet::new();
        for &id in node_ids {
            if !self.nodes.contains_key(&id) {
                continue;
            }
            for sub in self.subtree_ids(id) {
                if doomed_set.insert(sub) {
                    doomed_nodes.push(sub);
                }
            }
        }

        let explicit_edges: HashSet<EdgeId> = edge_ids
            .iter()
            .copied()
            .filter(|id| self.edges.contains_key(id))
            .collect();

        // One pass over the ordered edge list keeps removal order stable
        let mut removed_edges: Vec<(Edge, usize)> = Vec::new();
        for (index, id) in self.edge_order.iter().enumerate() {
            let edge = &self.edges[id];
            if explicit_edges.contains(id)
                || doomed_set.contains(&edge.start)
                || doomed_set.contains(&edge.end)
            {
                removed_edges.push((edge.clone(), index));
            }
        }

        if doomed_nodes.is_empty() && removed_edges.is_empty() {
            return None;
        }

        for (edge, _) in &removed_edges {
            self.remove_edge_raw(edge.id);
        }

        // Record each removed node with the slot it occupied; descendants
        // of removed nodes restore through their parent's child list
        let mut removed_nodes: Vec<(Node, Option<Slot>)> = Vec::new();
        for id in &doomed_nodes {
            let node = self.nodes[id].clone();
            let top_level = node
                .parent
                .map(|p| !doomed_set.contains(&p))
                .unwrap_or(true);
            let slot = if top_level {
                Some(self.slot_of(&node))
            } else {
                None
            };
            removed_nodes.push((node, slot));
        }
        for (node, slot) in &removed_nodes {
            if slot.is_some() {
                self.detach_node(node.id);
            }
            self.nodes.remove(&node.id);
        }

        debug!(
            nodes = removed_nodes.len(),
            edges = removed_edges.len(),
            "elements removed"
        );
        self.debug_check();
        Some(Command::Remove {
            nodes: removed_nodes,
            edges: removed_edges,
        })
    }

    /// Translate a set of nodes, skipping any whose ancestor is also in the
    /// set (children follow their container implicitly)
    pub fn translate_nodes(&mut self, ids: &[NodeId], dx: i32, dy: i32) -> Option<Command> {
        if dx == 0 && dy == 0 {
            return None;
        }
        let set: HashSet<NodeId> = ids.iter().copied().collect();
        let mut moved = Vec::new();
        for &id in ids {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let mut ancestor = node.parent;
            let mut shadowed = false;
            while let Some(a) = ancestor {
                if set.contains(&a) {
                    shadowed = true;
                    break;
                }
                ancestor = self.nodes[&a].parent;
            }
            if !shadowed {
                moved.push(id);
            }
        }
        if moved.is_empty() {
            return None;
        }
        self.translate_raw(&moved, dx, dy);
        Some(Command::MoveNodes {
            ids: moved,
            dx,
            dy,
        })
    }

    pub fn set_node_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<Command, PropertyError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))?;
        let old = node
            .property(name)
            .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))?;
        node.set_property(name, value.clone())?;
        Ok(Command::SetNodeProperty {
            id,
            name: name.to_string(),
            old,
            new: value,
        })
    }

    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<Command, PropertyError> {
        let edge = self
            .edges
            .get_mut(&id)
            .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))?;
        let old = edge
            .property(name)
            .ok_or_else(|| PropertyError::UnknownProperty(name.to_string()))?;
        edge.set_property(name, value.clone())?;
        Ok(Command::SetEdgeProperty {
            id,
            name: name.to_string(),
            old,
            new: value,
        })
    }

    // --- Raw structural plumbing used by history replay and clipboard ---

    pub(crate) fn insert_node_raw(&mut self, mut node: Node, slot: Slot) {
        match slot {
            Slot::Root(index) => {
                node.parent = None;
                let index = index.min(self.roots.len());
                self.roots.insert(index, node.id);
            }
            Slot::Child(parent, index) => {
                node.parent = Some(parent);
                let children = &mut self
                    .nodes
                    .get_mut(&parent)
                    .expect("insert under missing parent")
                    .children;
                let index = index.min(children.len());
                children.insert(index, node.id);
            }
        }
        self.nodes.insert(node.id, node);
    }

    /// Reinsert a node entry without touching any attachment list; used
    /// when restoring descendants whose parent's child list already holds
    /// their id
    pub(crate) fn restore_node_entry(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Append to the root list without other bookkeeping; the entry must
    /// already be parentless
    pub(crate) fn adopt_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    /// Unlink from roots or parent, then drop the arena entry and the
    /// entire subtree under it. Caller must have removed dangling edges.
    pub(crate) fn remove_subtree_raw(&mut self, id: NodeId) {
        self.detach_node(id);
        for sub in self.subtree_ids(id) {
            self.nodes.remove(&sub);
        }
    }

    fn detach_node(&mut self, id: NodeId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        match parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
    }

    pub(crate) fn insert_edge_raw(&mut self, edge: Edge, index: usize) {
        let index = index.min(self.edge_order.len());
        self.edge_order.insert(index, edge.id);
        self.edges.insert(edge.id, edge);
    }

    pub(crate) fn remove_edge_raw(&mut self, id: EdgeId) {
        self.edges.remove(&id);
        self.edge_order.retain(|e| *e != id);
    }

    pub(crate) fn translate_raw(&mut self, ids: &[NodeId], dx: i32, dy: i32) {
        for &id in ids {
            for sub in self.subtree_ids(id) {
                if let Some(node) = self.nodes.get_mut(&sub) {
                    node.translate(dx, dy);
                }
            }
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    /// Slot currently occupied by a node
    fn slot_of(&self, node: &Node) -> Slot {
        match node.parent {
            Some(parent) => {
                let index = self.nodes[&parent]
                    .children
                    .iter()
                    .position(|c| *c == node.id)
                    .expect("child missing from parent list");
                Slot::Child(parent, index)
            }
            None => {
                let index = self
                    .roots
                    .iter()
                    .position(|r| *r == node.id)
                    .expect("root missing from root list");
                Slot::Root(index)
            }
        }
    }

    // --- Invariants ---

    /// Structural invariants that hold after every public mutation.
    /// A violation is a programming error, not a recoverable condition.
    pub fn assert_consistent(&self) {
        for edge in self.edges.values() {
            assert!(
                self.nodes.contains_key(&edge.start) && self.nodes.contains_key(&edge.end),
                "edge {} references a removed node",
                edge.id
            );
        }
        for id in &self.roots {
            assert!(self.nodes[id].parent.is_none(), "root {id} has a parent");
        }
        let reachable = self.node_ids_depth_first();
        assert_eq!(
            reachable.len(),
            self.nodes.len(),
            "arena holds nodes unreachable from the roots"
        );
        for id in &reachable {
            let node = &self.nodes[id];
            for child in &node.children {
                assert_eq!(
                    self.nodes[child].parent,
                    Some(*id),
                    "child {child} does not point back to {id}"
                );
            }
            // No containment cycles
            let mut seen = HashSet::new();
            let mut current = node.parent;
            while let Some(p) = current {
                assert!(seen.insert(p) && p != *id, "containment cycle through {id}");
                current = self.nodes[&p].parent;
            }
        }
    }

    pub(crate) fn debug_check(&self) {
        #[cfg(debug_assertions)]
        self.assert_consistent();
    }

    // --- Drawing ---

    /// Paint every element: container nodes before their children, edges
    /// after all the nodes they connect
    pub fn draw(&self, surface: &mut dyn Surface) {
        for root in &self.roots {
            self.draw_subtree(*root, surface);
        }
        for edge in self.edges() {
            let from = self.node_bounds(edge.start).center();
            let to = self.node_bounds(edge.end).center();
            surface.draw_edge(edge, from, to);
        }
    }

    fn draw_subtree(&self, id: NodeId, surface: &mut dyn Surface) {
        let node = &self.nodes[&id];
        surface.draw_node(node, self.node_bounds(id));
        for child in &node.children {
            self.draw_subtree(*child, surface);
        }
    }
}
