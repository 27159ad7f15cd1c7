//! Node entities: the vertices of a diagram and its containment forest.
//!
//! Nodes never hold references to each other; all parent/child/endpoint
//! relations go through ids resolved against the owning [`Diagram`]'s arena.
//!
//! [`Diagram`]: crate::diagram::Diagram

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Rect};
use crate::property::{Property, PropertyError, PropertyValue};

/// Node identifier - UUID for stable identity across clipboard and undo
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default extents, in pixels. Policy constants; exact values are not
/// load-bearing for connection or containment correctness.
pub const CLASS_WIDTH: i32 = 100;
pub const CLASS_HEIGHT: i32 = 60;
pub const PACKAGE_WIDTH: i32 = 100;
pub const PACKAGE_HEIGHT: i32 = 80;
pub const ACTOR_WIDTH: i32 = 48;
pub const ACTOR_HEIGHT: i32 = 64;
pub const USE_CASE_WIDTH: i32 = 110;
pub const USE_CASE_HEIGHT: i32 = 40;
pub const STATE_WIDTH: i32 = 80;
pub const STATE_HEIGHT: i32 = 60;
pub const STATE_MARKER_SIZE: i32 = 20;
pub const NOTE_WIDTH: i32 = 60;
pub const NOTE_HEIGHT: i32 = 40;
pub const OBJECT_WIDTH: i32 = 80;
pub const OBJECT_HEIGHT: i32 = 60;
pub const FIELD_WIDTH: i32 = 60;
pub const FIELD_HEIGHT: i32 = 20;
/// A lifeline is a fixed-width column; the labeled top box occupies the
/// first `LIFELINE_TOP_HEIGHT` pixels and targets inside it mean «create».
pub const LIFELINE_WIDTH: i32 = 80;
pub const LIFELINE_TOP_HEIGHT: i32 = 60;
pub const LIFELINE_HEIGHT: i32 = 120;
pub const CALL_WIDTH: i32 = 16;
pub const CALL_HEIGHT: i32 = 30;

/// The closed set of node variants, each with its own payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Class with attribute and method compartments
    Class {
        name: String,
        attributes: String,
        methods: String,
    },
    /// Interface with a method compartment
    Interface { name: String, methods: String },
    /// Package; `contents` is the text shown in the body
    Package { name: String, contents: String },
    /// Object diagram instance box; fields are child nodes
    Object { name: String },
    /// Named slot inside an object node
    Field { name: String, value: String },
    /// Use-case diagram stick figure
    Actor { name: String },
    /// Use-case ellipse
    UseCase { name: String },
    /// Named state
    State { name: String },
    /// Solid-dot initial state marker
    InitialState,
    /// Bulls-eye final state marker
    FinalState,
    /// Free-floating annotation
    Note { text: String },
    /// Sequence diagram participant; children are the calls on its line,
    /// stacked top to bottom
    Lifeline { name: String },
    /// Activation on a lifeline; may own nested calls
    Call { open_bottom: bool },
}

/// Lightweight discriminant for rule tables and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Class,
    Interface,
    Package,
    Object,
    Field,
    Actor,
    UseCase,
    State,
    InitialState,
    FinalState,
    Note,
    Lifeline,
    Call,
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Class { .. } => NodeType::Class,
            NodeKind::Interface { .. } => NodeType::Interface,
            NodeKind::Package { .. } => NodeType::Package,
            NodeKind::Object { .. } => NodeType::Object,
            NodeKind::Field { .. } => NodeType::Field,
            NodeKind::Actor { .. } => NodeType::Actor,
            NodeKind::UseCase { .. } => NodeType::UseCase,
            NodeKind::State { .. } => NodeType::State,
            NodeKind::InitialState => NodeType::InitialState,
            NodeKind::FinalState => NodeType::FinalState,
            NodeKind::Note { .. } => NodeType::Note,
            NodeKind::Lifeline { .. } => NodeType::Lifeline,
            NodeKind::Call { .. } => NodeType::Call,
        }
    }

    /// Default extent of this node variant, ignoring children
    pub fn default_size(&self) -> (i32, i32) {
        match self.node_type() {
            NodeType::Class | NodeType::Interface => (CLASS_WIDTH, CLASS_HEIGHT),
            NodeType::Package => (PACKAGE_WIDTH, PACKAGE_HEIGHT),
            NodeType::Object => (OBJECT_WIDTH, OBJECT_HEIGHT),
            NodeType::Field => (FIELD_WIDTH, FIELD_HEIGHT),
            NodeType::Actor => (ACTOR_WIDTH, ACTOR_HEIGHT),
            NodeType::UseCase => (USE_CASE_WIDTH, USE_CASE_HEIGHT),
            NodeType::State => (STATE_WIDTH, STATE_HEIGHT),
            NodeType::InitialState | NodeType::FinalState => {
                (STATE_MARKER_SIZE, STATE_MARKER_SIZE)
            }
            NodeType::Note => (NOTE_WIDTH, NOTE_HEIGHT),
            NodeType::Lifeline => (LIFELINE_WIDTH, LIFELINE_HEIGHT),
            NodeType::Call => (CALL_WIDTH, CALL_HEIGHT),
        }
    }
}

/// A node in the arena. Parent/child links are ids, never references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    pub parent: Option<NodeId>,
    /// Ordered; insertion order is significant (call order on a lifeline)
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            position: Point::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Bounds derived from this node's own state only. Container variants
    /// are grown to enclose children by the diagram, which owns the arena.
    pub fn local_bounds(&self) -> Rect {
        let (w, h) = self.kind.default_size();
        Rect::new(self.position.x, self.position.y, w, h)
    }

    /// The top box of a lifeline; targets inside it denote instantiation
    pub fn lifeline_top_box(&self) -> Option<Rect> {
        match self.kind {
            NodeKind::Lifeline { .. } => Some(Rect::new(
                self.position.x,
                self.position.y,
                LIFELINE_WIDTH,
                LIFELINE_TOP_HEIGHT,
            )),
            _ => None,
        }
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.position = self.position.translated(dx, dy);
    }

    /// Ordered property descriptors for this variant
    pub fn properties(&self) -> &'static [Property] {
        const NAME_ONLY: &[Property] = &[Property::text("name")];
        const CLASS: &[Property] = &[
            Property::text("name"),
            Property::multi_line("attributes"),
            Property::multi_line("methods"),
        ];
        const INTERFACE: &[Property] =
            &[Property::text("name"), Property::multi_line("methods")];
        const PACKAGE: &[Property] =
            &[Property::text("name"), Property::multi_line("contents")];
        const FIELD: &[Property] = &[Property::text("name"), Property::text("value")];
        const NOTE: &[Property] = &[Property::multi_line("text")];
        const CALL: &[Property] = &[Property::flag("open_bottom").hidden()];
        match self.kind {
            NodeKind::Class { .. } => CLASS,
            NodeKind::Interface { .. } => INTERFACE,
            NodeKind::Package { .. } => PACKAGE,
            NodeKind::Field { .. } => FIELD,
            NodeKind::Object { .. }
            | NodeKind::Actor { .. }
            | NodeKind::UseCase { .. }
            | NodeKind::State { .. }
            | NodeKind::Lifeline { .. } => NAME_ONLY,
            NodeKind::Note { .. } => NOTE,
            NodeKind::Call { .. } => CALL,
            NodeKind::InitialState | NodeKind::FinalState => &[],
        }
    }

    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        let value = match (&self.kind, name) {
            (NodeKind::Class { name: n, .. }, "name")
            | (NodeKind::Interface { name: n, .. }, "name")
            | (NodeKind::Package { name: n, .. }, "name")
            | (NodeKind::Object { name: n }, "name")
            | (NodeKind::Field { name: n, .. }, "name")
            | (NodeKind::Actor { name: n }, "name")
            | (NodeKind::UseCase { name: n }, "name")
            | (NodeKind::State { name: n }, "name")
            | (NodeKind::Lifeline { name: n }, "name") => PropertyValue::text(n.clone()),
            (NodeKind::Class { attributes, .. }, "attributes") => {
                PropertyValue::text(attributes.clone())
            }
            (NodeKind::Class { methods, .. }, "methods")
            | (NodeKind::Interface { methods, .. }, "methods") => {
                PropertyValue::text(methods.clone())
            }
            (NodeKind::Package { contents, .. }, "contents") => {
                PropertyValue::text(contents.clone())
            }
            (NodeKind::Field { value, .. }, "value") => PropertyValue::text(value.clone()),
            (NodeKind::Note { text }, "text") => PropertyValue::text(text.clone()),
            (NodeKind::Call { open_bottom }, "open_bottom") => {
                PropertyValue::Flag(*open_bottom)
            }
            _ => return None,
        };
        Some(value)
    }

    pub fn set_property(
        &mut self,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        if self.property(name).is_none() {
            return Err(PropertyError::UnknownProperty(name.to_string()));
        }
        let invalid = || PropertyError::InvalidValue {
            name: name.to_string(),
            value: format!("{value:?}"),
        };
        match (&mut self.kind, name) {
            (NodeKind::Class { name: n, .. }, "name")
            | (NodeKind::Interface { name: n, .. }, "name")
            | (NodeKind::Package { name: n, .. }, "name")
            | (NodeKind::Object { name: n }, "name")
            | (NodeKind::Field { name: n, .. }, "name")
            | (NodeKind::Actor { name: n }, "name")
            | (NodeKind::UseCase { name: n }, "name")
            | (NodeKind::State { name: n }, "name")
            | (NodeKind::Lifeline { name: n }, "name") => {
                *n = value.as_text().ok_or_else(invalid)?.to_string();
            }
            (NodeKind::Class { attributes, .. }, "attributes") => {
                *attributes = value.as_text().ok_or_else(invalid)?.to_string();
            }
            (NodeKind::Class { methods, .. }, "methods")
            | (NodeKind::Interface { methods, .. }, "methods") => {
                *methods = value.as_text().ok_or_else(invalid)?.to_string();
            }
            (NodeKind::Package { contents, .. }, "contents") => {
                *contents = value.as_text().ok_or_else(invalid)?.to_string();
            }
            (NodeKind::Field { value: v, .. }, "value") => {
                *v = value.as_text().ok_or_else(invalid)?.to_string();
            }
            (NodeKind::Note { text }, "text") => {
                *text = value.as_text().ok_or_else(invalid)?.to_string();
            }
            (NodeKind::Call { open_bottom }, "open_bottom") => {
                *open_bottom = value.as_flag().ok_or_else(invalid)?;
            }
            _ => unreachable!("descriptor/accessor mismatch for {name}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_round_trip_per_variant() {
        let mut class = Node::new(NodeKind::Class {
            name: String::new(),
            attributes: String::new(),
            methods: String::new(),
        });
        class
            .set_property("name", PropertyValue::text("Account"))
            .unwrap();
        assert_eq!(
            class.property("name"),
            Some(PropertyValue::text("Account"))
        );

        let mut call = Node::new(NodeKind::Call { open_bottom: false });
        call.set_property("open_bottom", PropertyValue::Flag(true))
            .unwrap();
        assert_eq!(call.property("open_bottom"), Some(PropertyValue::Flag(true)));
    }

    #[test]
    fn unknown_property_is_rejected() {
        let mut note = Node::new(NodeKind::Note {
            text: String::new(),
        });
        let err = note
            .set_property("name", PropertyValue::text("x"))
            .unwrap_err();
        assert_eq!(err, PropertyError::UnknownProperty("name".to_string()));
    }

    #[test]
    fn wrong_value_shape_is_rejected() {
        let mut call = Node::new(NodeKind::Call { open_bottom: false });
        assert!(call
            .set_property("open_bottom", PropertyValue::text("yes"))
            .is_err());
    }

    #[test]
    fn lifeline_top_box_matches_constants() {
        let mut lifeline = Node::new(NodeKind::Lifeline {
            name: String::new(),
        });
        lifeline.position = Point::new(10, 0);
        assert_eq!(
            lifeline.lifeline_top_box(),
            Some(Rect::new(10, 0, LIFELINE_WIDTH, LIFELINE_TOP_HEIGHT))
        );
        let call = Node::new(NodeKind::Call { open_bottom: false });
        assert_eq!(call.lifeline_top_box(), None);
    }
}
