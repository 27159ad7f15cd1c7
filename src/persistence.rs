//! Saving and loading diagrams as JSON.
//!
//! The on-disk shape is a flat document: the diagram type, the nodes in
//! depth-first order (parents before children), and the edges in draw
//! order. Relations are stored as ids, exactly as the model holds them.
//! Loading validates everything before a `Diagram` is returned; a bad
//! document never yields a partially loaded diagram.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::diagram::{Diagram, DiagramType};
use crate::edge::Edge;
use crate::node::Node;
use crate::rules;

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The document does not parse as a diagram at all
    #[error("malformed diagram document: {0}")]
    Malformed(String),
    /// An element kind that is not legal in the stored diagram type
    #[error("element kind not allowed in a {0:?} diagram")]
    UnknownKind(DiagramType),
    /// An id that points at nothing in the document
    #[error("broken reference: {0}")]
    BrokenReference(String),
}

#[derive(Serialize, Deserialize)]
struct DiagramFile {
    diagram: DiagramType,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// Serialize a diagram into a JSON value
pub fn diagram_to_value(diagram: &Diagram) -> Value {
    let nodes = diagram
        .node_ids_depth_first()
        .into_iter()
        .filter_map(|id| diagram.node(id).cloned())
        .collect();
    let edges = diagram.edges().cloned().collect();
    let file = DiagramFile {
        diagram: diagram.diagram_type(),
        nodes,
        edges,
    };
    serde_json::to_value(file).unwrap_or(Value::Null)
}

/// Rebuild a diagram from a JSON value, validating structure as it goes
pub fn diagram_from_value(value: Value) -> Result<Diagram, PersistenceError> {
    let file: DiagramFile =
        serde_json::from_value(value).map_err(|e| PersistenceError::Malformed(e.to_string()))?;
    let mut diagram = Diagram::new(file.diagram);

    // Parents precede children on disk, so every parent reference must
    // resolve against what has been adopted so far
    for node in file.nodes {
        if !rules::allowed_node(file.diagram, node.node_type()) {
            return Err(PersistenceError::UnknownKind(file.diagram));
        }
        match node.parent {
            None => {
                let id = node.id;
                diagram.restore_node_entry(node);
                diagram.adopt_root(id);
            }
            Some(parent) => {
                let listed = diagram
                    .node(parent)
                    .ok_or_else(|| {
                        PersistenceError::BrokenReference(format!(
                            "node {} has missing parent {parent}",
                            node.id
                        ))
                    })?
                    .children
                    .contains(&node.id);
                if !listed {
                    return Err(PersistenceError::BrokenReference(format!(
                        "node {} absent from child list of {parent}",
                        node.id
                    )));
                }
                diagram.restore_node_entry(node);
            }
        }
    }

    // Every listed child must have arrived
    for id in diagram.node_ids_depth_first() {
        let node = diagram
            .node(id)
            .ok_or_else(|| PersistenceError::BrokenReference(format!("dangling child {id}")))?;
        for child in &node.children {
            if diagram.node(*child).is_none() {
                return Err(PersistenceError::BrokenReference(format!(
                    "node {id} lists missing child {child}"
                )));
            }
        }
    }
    if diagram.node_ids_depth_first().len() != diagram.node_count() {
        return Err(PersistenceError::BrokenReference(
            "unreachable or duplicated nodes".to_string(),
        ));
    }

    let mut index = 0;
    for edge in file.edges {
        if diagram.node(edge.start).is_none() || diagram.node(edge.end).is_none() {
            return Err(PersistenceError::BrokenReference(format!(
                "edge {} references a missing node",
                edge.id
            )));
        }
        diagram.insert_edge_raw(edge, index);
        index += 1;
    }

    diagram.debug_check();
    debug!(
        nodes = diagram.node_count(),
        edges = diagram.edge_count(),
        "diagram loaded"
    );
    Ok(diagram)
}

/// Serialize to a pretty-printed JSON string, the form written to disk
pub fn diagram_to_json(diagram: &Diagram) -> String {
    serde_json::to_string_pretty(&diagram_to_value(diagram)).unwrap_or_default()
}

/// Parse a JSON string produced by `diagram_to_json`
pub fn diagram_from_json(text: &str) -> Result<Diagram, PersistenceError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| PersistenceError::Malformed(e.to_string()))?;
    diagram_from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;
    use crate::geometry::Point;
    use crate::node::NodeKind;

    fn sample_diagram() -> Diagram {
        let mut diagram = Diagram::new(DiagramType::Class);
        diagram
            .add_node(
                Node::new(NodeKind::Package {
                    name: "pkg".to_string(),
                    contents: String::new(),
                }),
                Point::new(0, 0),
            )
            .unwrap();
        diagram
            .add_node(
                Node::new(NodeKind::Class {
                    name: "C".to_string(),
                    attributes: String::new(),
                    methods: String::new(),
                }),
                Point::new(10, 10),
            )
            .unwrap();
        diagram
            .add_node(
                Node::new(NodeKind::Class {
                    name: "D".to_string(),
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
        diagram
    }

    #[test]
    fn save_load_round_trip() {
        let diagram = sample_diagram();
        let loaded = diagram_from_value(diagram_to_value(&diagram)).unwrap();
        assert_eq!(loaded.diagram_type(), diagram.diagram_type());
        assert_eq!(loaded.node_count(), diagram.node_count());
        assert_eq!(loaded.edge_count(), diagram.edge_count());
        assert_eq!(loaded.roots(), diagram.roots());
        assert_eq!(loaded.edge_ids(), diagram.edge_ids());
        for id in diagram.node_ids_depth_first() {
            assert_eq!(loaded.node(id), diagram.node(id));
        }
        loaded.assert_consistent();
    }

    #[test]
    fn edge_to_missing_node_is_rejected() {
        let diagram = sample_diagram();
        let mut value = diagram_to_value(&diagram);
        value["edges"][0]["start"] = serde_json::json!(crate::node::NodeId::new().0);
        assert!(matches!(
            diagram_from_value(value),
            Err(PersistenceError::BrokenReference(_))
        ));
    }

    #[test]
    fn node_kind_foreign_to_the_diagram_type_is_rejected() {
        let diagram = sample_diagram();
        let mut value = diagram_to_value(&diagram);
        value["diagram"] = serde_json::json!("State");
        assert!(matches!(
            diagram_from_value(value),
            Err(PersistenceError::UnknownKind(DiagramType::State))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            diagram_from_json("{\"diagram\": 7}"),
            Err(PersistenceError::Malformed(_))
        ));
        assert!(matches!(
            diagram_from_json("not json"),
            Err(PersistenceError::Malformed(_))
        ));
    }
}
