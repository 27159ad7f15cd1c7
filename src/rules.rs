//! Structural rule tables, one closed set per diagram type.
//!
//! The original editor decided legality with runtime type checks spread over
//! a class hierarchy; here every decision is an explicit match over variant
//! tags. Sequence diagrams have additional point-sensitive rules layered on
//! top of these tables in the `sequence` module.

use crate::diagram::DiagramType;
use crate::edge::EdgeKind;
use crate::node::NodeType;

/// Whether a node variant may appear in a diagram of the given type at all
pub fn allowed_node(diagram: DiagramType, node: NodeType) -> bool {
    use NodeType::*;
    if node == Note {
        return true;
    }
    match diagram {
        DiagramType::Class => matches!(node, Class | Interface | Package),
        DiagramType::Object => matches!(node, Object | Field),
        DiagramType::UseCase => matches!(node, Actor | UseCase),
        DiagramType::State => matches!(node, State | InitialState | FinalState),
        DiagramType::Sequence => matches!(node, Lifeline | Call),
    }
}

/// Whether `parent` may own `child` in the containment forest
pub fn can_contain(parent: NodeType, child: NodeType) -> bool {
    use NodeType::*;
    matches!(
        (parent, child),
        (Package, Class | Interface | Package)
            | (Object, Field)
            | (Lifeline, Call)
            | (Call, Call)
    )
}

/// Node variants that only exist inside a container and are rejected as
/// free-standing roots
pub fn requires_parent(node: NodeType) -> bool {
    matches!(node, NodeType::Field | NodeType::Call)
}

/// The `(edge variant, start kind, end kind)` legality table.
///
/// Note edges are deliberately permissive: any element may annotate or be
/// annotated by a note, in every diagram type.
pub fn allowed_connection(
    diagram: DiagramType,
    edge: EdgeKind,
    start: NodeType,
    end: NodeType,
) -> bool {
    use NodeType::*;
    if edge == EdgeKind::Note {
        return (end == Note || start == Note)
            && allowed_node(diagram, start)
            && allowed_node(diagram, end);
    }
    // Notes connect through note edges only
    if start == Note || end == Note {
        return false;
    }
    match diagram {
        DiagramType::Class => {
            let classifier = |n: NodeType| matches!(n, Class | Interface | Package);
            matches!(
                edge,
                EdgeKind::Generalization
                    | EdgeKind::Realization
                    | EdgeKind::Association
                    | EdgeKind::Aggregation
                    | EdgeKind::Composition
                    | EdgeKind::Dependency
            ) && classifier(start)
                && classifier(end)
        }
        DiagramType::Object => match edge {
            EdgeKind::ObjectReference => start == Field && end == Object,
            EdgeKind::ObjectCollaboration => start == Object && end == Object,
            _ => false,
        },
        DiagramType::UseCase => {
            let participant = |n: NodeType| matches!(n, Actor | UseCase);
            matches!(
                edge,
                EdgeKind::Association | EdgeKind::Generalization | EdgeKind::Dependency
            ) && participant(start)
                && participant(end)
        }
        DiagramType::State => {
            edge == EdgeKind::Transition
                && matches!(start, State | InitialState)
                && matches!(end, State | FinalState)
        }
        DiagramType::Sequence => {
            let activation = |n: NodeType| matches!(n, Lifeline | Call);
            matches!(edge, EdgeKind::Call | EdgeKind::Return)
                && activation(start)
                && activation(end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_welcome_everywhere() {
        for diagram in DiagramType::ALL {
            assert!(allowed_node(diagram, NodeType::Note));
        }
        assert!(allowed_connection(
            DiagramType::Sequence,
            EdgeKind::Note,
            NodeType::Call,
            NodeType::Note
        ));
        assert!(!allowed_connection(
            DiagramType::Sequence,
            EdgeKind::Call,
            NodeType::Note,
            NodeType::Lifeline
        ));
    }

    #[test]
    fn class_edges_stay_in_class_diagrams() {
        assert!(allowed_connection(
            DiagramType::Class,
            EdgeKind::Generalization,
            NodeType::Class,
            NodeType::Interface
        ));
        assert!(!allowed_connection(
            DiagramType::UseCase,
            EdgeKind::Composition,
            NodeType::Actor,
            NodeType::UseCase
        ));
    }

    #[test]
    fn transitions_respect_initial_and_final_markers() {
        assert!(allowed_connection(
            DiagramType::State,
            EdgeKind::Transition,
            NodeType::InitialState,
            NodeType::State
        ));
        assert!(!allowed_connection(
            DiagramType::State,
            EdgeKind::Transition,
            NodeType::FinalState,
            NodeType::State
        ));
        assert!(!allowed_connection(
            DiagramType::State,
            EdgeKind::Transition,
            NodeType::State,
            NodeType::InitialState
        ));
    }

    #[test]
    fn containment_forest_shape() {
        assert!(can_contain(NodeType::Lifeline, NodeType::Call));
        assert!(can_contain(NodeType::Call, NodeType::Call));
        assert!(can_contain(NodeType::Object, NodeType::Field));
        assert!(!can_contain(NodeType::Lifeline, NodeType::Lifeline));
        assert!(requires_parent(NodeType::Call));
        assert!(!requires_parent(NodeType::Class));
    }
}
