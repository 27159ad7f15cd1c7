//! Sequence-diagram structural rules: call nesting, «create» edges,
//! self-calls, and return-edge validation.
//!
//! These are the point-sensitive rules layered on top of the plain legality
//! tables in `rules`. Everything here plans first and mutates only once the
//! whole operation is known to be accepted, so a rejection is always a
//! clean no-op.

use tracing::debug;

use crate::diagram::{Diagram, Slot};
use crate::edge::{Edge, EdgeId, EdgeKind};
use crate::geometry::Point;
use crate::history::Command;
use crate::node::{Node, NodeId, NodeKind, NodeType, CALL_WIDTH, LIFELINE_WIDTH};

/// Middle label applied to a call edge that targets a lifeline's top box
pub const CREATE_LABEL: &str = "\u{ab}create\u{bb}";

/// Vertical gap between a lifeline's top box and a constructor activation
const CREATE_CALL_GAP: i32 = 10;

/// Insertion index keeping a container's call children ordered by y
pub(crate) fn call_insert_index(diagram: &Diagram, parent: NodeId, y: i32) -> usize {
    let children = &diagram.node(parent).expect("missing parent").children;
    children
        .iter()
        .position(|c| {
            let child = diagram.node(*c).expect("missing child");
            child.node_type() == NodeType::Call && child.position.y > y
        })
        .unwrap_or(children.len())
}

/// The slot a call dropped at height `y` lands in, starting from a lifeline
/// or call container: descend into the last call that starts above the drop
/// point, so a call below an existing call becomes its child (call depth),
/// not a sibling.
pub(crate) fn call_drop_slot(diagram: &Diagram, base: NodeId, y: i32) -> Slot {
    let mut container = base;
    loop {
        let next = diagram
            .node(container)
            .expect("missing container")
            .children
            .iter()
            .copied()
            .filter(|c| {
                let child = diagram.node(*c).expect("missing child");
                child.node_type() == NodeType::Call && child.position.y <= y
            })
            .last();
        match next {
            Some(call) => container = call,
            None => break,
        }
    }
    Slot::Child(container, call_insert_index(diagram, container, y))
}

/// The lifeline a call (possibly nested) ultimately sits on
pub(crate) fn lifeline_of(diagram: &Diagram, id: NodeId) -> Option<NodeId> {
    let mut current = Some(id);
    while let Some(cid) = current {
        let node = diagram.node(cid)?;
        if node.node_type() == NodeType::Lifeline {
            return Some(cid);
        }
        current = node.parent;
    }
    None
}

/// Whether control can return from `from` to `target` by walking the call
/// stack upward: through containment into outer calls and through call
/// edges into callers on other lifelines.
pub(crate) fn reaches_via_callers(diagram: &Diagram, from: NodeId, target: NodeId) -> bool {
    let mut visited = vec![from];
    let mut frontier = vec![from];
    while let Some(current) = frontier.pop() {
        let mut predecessors: Vec<NodeId> = Vec::new();
        if let Some(parent) = diagram.node(current).and_then(|n| n.parent) {
            if diagram.node(parent).map(|n| n.node_type()) == Some(NodeType::Call) {
                predecessors.push(parent);
            }
        }
        for edge in diagram.edges() {
            if edge.kind == EdgeKind::Call && edge.end == current {
                predecessors.push(edge.start);
            }
        }
        for pred in predecessors {
            if pred == target || lifeline_of(diagram, pred) == Some(target) {
                return true;
            }
            if !visited.contains(&pred) {
                visited.push(pred);
                frontier.push(pred);
            }
        }
    }
    false
}

/// What `add_activation_edge` decided to do with one endpoint
enum Endpoint {
    /// Connect to this existing node
    Existing(NodeId),
    /// Synthesize a call node first, then connect to it
    Synthesized { node: Node, slot: Slot },
    /// Connect to this node while also synthesizing a call elsewhere
    /// («create» spawns an activation but the edge points at the lifeline)
    ExistingWithSpawn {
        target: NodeId,
        node: Node,
        slot: Slot,
    },
}

fn new_call(diagram: &Diagram, lifeline: NodeId, y: i32) -> Node {
    let line_x = diagram
        .node(lifeline)
        .expect("missing lifeline")
        .position
        .x;
    let mut call = Node::new(NodeKind::Call { open_bottom: false });
    call.position = Point::new(line_x + (LIFELINE_WIDTH - CALL_WIDTH) / 2, y);
    call
}

/// Call and return edges in a sequence diagram. Returns `None` on any
/// rejection, without having mutated anything.
pub(crate) fn add_activation_edge(
    diagram: &mut Diagram,
    mut edge: Edge,
    start_point: Point,
    end_point: Point,
) -> Option<(EdgeId, Command)> {
    let start_hit = diagram.find_node_at(start_point)?;
    let end_hit = diagram.find_node_at(end_point)?;

    match edge.kind {
        EdgeKind::Call => {
            // Resolve the caller first: an existing activation, or a fresh
            // one synthesized on a lifeline's line (never on the top box)
            let caller = match diagram.node(start_hit)?.node_type() {
                NodeType::Call => Endpoint::Existing(start_hit),
                NodeType::Lifeline => {
                    let top = diagram.node(start_hit)?.lifeline_top_box()?;
                    if top.contains(start_point) {
                        debug!("call edge from a lifeline top box rejected");
                        return None;
                    }
                    Endpoint::Synthesized {
                        node: new_call(diagram, start_hit, start_point.y),
                        slot: call_drop_slot(diagram, start_hit, start_point.y),
                    }
                }
                other => {
                    debug!(?other, "call edge start rejected");
                    return None;
                }
            };

            let callee = match diagram.node(end_hit)?.node_type() {
                // Self-call: both points inside the same activation nests
                // a new call one level deeper
                NodeType::Call if end_hit == start_hit => {
                    let mut call = Node::new(NodeKind::Call { open_bottom: false });
                    let caller_pos = diagram.node(start_hit)?.position;
                    call.position = Point::new(caller_pos.x + CALL_WIDTH / 2, end_point.y);
                    let index = diagram.node(start_hit)?.children.len();
                    Endpoint::Synthesized {
                        node: call,
                        slot: Slot::Child(start_hit, index),
                    }
                }
                NodeType::Call => Endpoint::Existing(end_hit),
                NodeType::Lifeline => {
                    let top = diagram.node(end_hit)?.lifeline_top_box()?;
                    if top.contains(end_point) {
                        // Instantiation: tag the edge and spawn the
                        // constructor activation under the top box
                        edge.middle_label = CREATE_LABEL.to_string();
                        let y = top.max_y() + CREATE_CALL_GAP;
                        Endpoint::ExistingWithSpawn {
                            target: end_hit,
                            node: new_call(diagram, end_hit, y),
                            slot: call_drop_slot(diagram, end_hit, y),
                        }
                    } else {
                        Endpoint::Synthesized {
                            node: new_call(diagram, end_hit, end_point.y),
                            slot: call_drop_slot(diagram, end_hit, end_point.y),
                        }
                    }
                }
                other => {
                    debug!(?other, "call edge end rejected");
                    return None;
                }
            };

            // Plan accepted; perform the synthesis and the attachment
            let mut commands = Vec::new();
            let start = resolve_endpoint(diagram, caller, &mut commands);
            let end = resolve_endpoint(diagram, callee, &mut commands);
            let (id, attach) = diagram.attach_edge(edge, start, end);
            commands.push(attach);
            let command = if commands.len() == 1 {
                commands.pop().expect("one command")
            } else {
                Command::Composite(commands)
            };
            Some((id, command))
        }
        EdgeKind::Return => {
            if diagram.node(start_hit)?.node_type() != NodeType::Call {
                debug!("return edge must start on an activation");
                return None;
            }
            let end_type = diagram.node(end_hit)?.node_type();
            if !matches!(end_type, NodeType::Call | NodeType::Lifeline) || end_hit == start_hit
            {
                debug!(?end_type, "return edge end rejected");
                return None;
            }
            if !reaches_via_callers(diagram, start_hit, end_hit) {
                debug!("return edge does not follow the call stack");
                return None;
            }
            let (id, command) = diagram.attach_edge(edge, start_hit, end_hit);
            Some((id, command))
        }
        _ => unreachable!("only activation edges are routed here"),
    }
}

fn resolve_endpoint(
    diagram: &mut Diagram,
    endpoint: Endpoint,
    commands: &mut Vec<Command>,
) -> NodeId {
    match endpoint {
        Endpoint::Existing(id) => id,
        Endpoint::Synthesized { node, slot } => {
            let id = node.id;
            commands.push(Command::AddNode {
                node: node.clone(),
                slot,
            });
            diagram.insert_node_raw(node, slot);
            id
        }
        Endpoint::ExistingWithSpawn { target, node, slot } => {
            commands.push(Command::AddNode {
                node: node.clone(),
                slot,
            });
            diagram.insert_node_raw(node, slot);
            target
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::DiagramType;

    fn sequence_diagram_with_two_lifelines() -> (Diagram, NodeId, NodeId) {
        let mut diagram = Diagram::new(DiagramType::Sequence);
        let (left, _) = diagram
            .add_node(
                Node::new(NodeKind::Lifeline {
                    name: "client".to_string(),
                }),
                Point::new(10, 0),
            )
            .unwrap();
        let (right, _) = diagram
            .add_node(
                Node::new(NodeKind::Lifeline {
                    name: "server".to_string(),
                }),
                Point::new(110, 0),
            )
            .unwrap();
        (diagram, left, right)
    }

    #[test]
    fn call_below_an_existing_call_nests() {
        let (mut diagram, left, _) = sequence_diagram_with_two_lifelines();
        let (outer, _) = diagram
            .add_node(
                Node::new(NodeKind::Call { open_bottom: false }),
                Point::new(15, 75),
            )
            .unwrap();
        let (inner, _) = diagram
            .add_node(
                Node::new(NodeKind::Call { open_bottom: false }),
                Point::new(15, 110),
            )
            .unwrap();
        assert_eq!(diagram.node(outer).unwrap().parent, Some(left));
        assert_eq!(diagram.node(inner).unwrap().parent, Some(outer));
    }

    #[test]
    fn call_above_every_call_stays_a_sibling_in_order() {
        let (mut diagram, left, _) = sequence_diagram_with_two_lifelines();
        let (lower, _) = diagram
            .add_node(
                Node::new(NodeKind::Call { open_bottom: false }),
                Point::new(15, 100),
            )
            .unwrap();
        let (upper, _) = diagram
            .add_node(
                Node::new(NodeKind::Call { open_bottom: false }),
                Point::new(15, 70),
            )
            .unwrap();
        assert_eq!(diagram.node(left).unwrap().children, vec![upper, lower]);
    }

    #[test]
    fn return_edge_follows_the_call_stack() {
        let (mut diagram, _, right) = sequence_diagram_with_two_lifelines();
        diagram
            .add_node(
                Node::new(NodeKind::Call { open_bottom: false }),
                Point::new(15, 75),
            )
            .unwrap();
        // client's call invokes the server lifeline, spawning an activation
        diagram
            .add_edge(
                Edge::new(EdgeKind::Call),
                Point::new(18, 80),
                Point::new(115, 80),
            )
            .unwrap();
        let callee = diagram.node(right).unwrap().children[0];
        let callee_pos = diagram.node(callee).unwrap().position;

        // Return from the callee back toward the caller's lifeline
        assert!(diagram
            .add_edge(
                Edge::new(EdgeKind::Return),
                Point::new(callee_pos.x + 2, callee_pos.y + 2),
                Point::new(18, 80),
            )
            .is_some());

        // A return with no caller chain toward the target is rejected
        assert!(diagram
            .add_edge(
                Edge::new(EdgeKind::Return),
                Point::new(18, 80),
                Point::new(115, 110),
            )
            .is_none());
    }
}
