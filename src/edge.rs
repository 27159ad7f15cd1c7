//! Edge entities: directed connections between two nodes.
//!
//! An edge stores only endpoint ids plus presentation attributes; whether a
//! given `(kind, start, end)` combination is legal is the diagram's business
//! (see [`rules`]).
//!
//! [`rules`]: crate::rules

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::node::NodeId;
use crate::property::{Property, PropertyError, PropertyValue};

/// Edge identifier - UUID for stable identity across clipboard and undo
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of edge variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Method invocation in a sequence diagram
    Call,
    /// Control returning up the call stack
    Return,
    /// Dashed link from any element to a note
    Note,
    /// Solid line, hollow triangle head
    Generalization,
    /// Dashed line, hollow triangle head
    Realization,
    Association,
    Aggregation,
    Composition,
    Dependency,
    /// State transition
    Transition,
    /// Object diagram: field slot to object
    ObjectReference,
    /// Object diagram: object to object
    ObjectCollaboration,
}

/// How the connector routes between its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BentStyle {
    #[default]
    Straight,
    /// Horizontal then vertical
    HV,
    /// Vertical then horizontal
    VH,
    /// Horizontal, vertical, horizontal
    HVH,
    /// Vertical, horizontal, vertical
    VHV,
}

/// Stroke presentation, independent of connection validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArrowHead {
    #[default]
    None,
    V,
    Triangle,
    Diamond,
    BlackDiamond,
    /// Half arrowhead used by return edges
    Half,
}

const LINE_STYLE_CHOICES: &[&str] = &["solid", "dashed", "dotted"];
const BENT_STYLE_CHOICES: &[&str] = &["straight", "hv", "vh", "hvh", "vhv"];
const ARROW_CHOICES: &[&str] = &["none", "v", "triangle", "diamond", "black_diamond", "half"];

impl LineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "solid" => Some(LineStyle::Solid),
            "dashed" => Some(LineStyle::Dashed),
            "dotted" => Some(LineStyle::Dotted),
            _ => None,
        }
    }
}

impl BentStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            BentStyle::Straight => "straight",
            BentStyle::HV => "hv",
            BentStyle::VH => "vh",
            BentStyle::HVH => "hvh",
            BentStyle::VHV => "vhv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "straight" => Some(BentStyle::Straight),
            "hv" => Some(BentStyle::HV),
            "vh" => Some(BentStyle::VH),
            "hvh" => Some(BentStyle::HVH),
            "vhv" => Some(BentStyle::VHV),
            _ => None,
        }
    }
}

impl ArrowHead {
    pub fn as_str(self) -> &'static str {
        match self {
            ArrowHead::None => "none",
            ArrowHead::V => "v",
            ArrowHead::Triangle => "triangle",
            ArrowHead::Diamond => "diamond",
            ArrowHead::BlackDiamond => "black_diamond",
            ArrowHead::Half => "half",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(ArrowHead::None),
            "v" => Some(ArrowHead::V),
            "triangle" => Some(ArrowHead::Triangle),
            "diamond" => Some(ArrowHead::Diamond),
            "black_diamond" => Some(ArrowHead::BlackDiamond),
            "half" => Some(ArrowHead::Half),
            _ => None,
        }
    }
}

/// A directed edge in the arena. Endpoints are node ids, never references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub start: NodeId,
    pub end: NodeId,
    pub bent: BentStyle,
    pub line: LineStyle,
    pub start_arrow: ArrowHead,
    pub end_arrow: ArrowHead,
    pub start_label: String,
    pub middle_label: String,
    pub end_label: String,
}

impl Edge {
    /// A detached edge; endpoints are placeholders until the diagram
    /// resolves them in `add_edge`
    pub fn new(kind: EdgeKind) -> Self {
        let (line, end_arrow, middle_label) = match kind {
            EdgeKind::Call => (LineStyle::Solid, ArrowHead::V, ""),
            EdgeKind::Return => (LineStyle::Dashed, ArrowHead::V, ""),
            EdgeKind::Note => (LineStyle::Dotted, ArrowHead::None, ""),
            EdgeKind::Generalization => (LineStyle::Solid, ArrowHead::Triangle, ""),
            EdgeKind::Realization => (LineStyle::Dashed, ArrowHead::Triangle, ""),
            EdgeKind::Association => (LineStyle::Solid, ArrowHead::None, ""),
            EdgeKind::Aggregation => (LineStyle::Solid, ArrowHead::Diamond, ""),
            EdgeKind::Composition => (LineStyle::Solid, ArrowHead::BlackDiamond, ""),
            EdgeKind::Dependency => (LineStyle::Dashed, ArrowHead::V, ""),
            EdgeKind::Transition => (LineStyle::Solid, ArrowHead::V, ""),
            EdgeKind::ObjectReference => (LineStyle::Solid, ArrowHead::V, ""),
            EdgeKind::ObjectCollaboration => (LineStyle::Solid, ArrowHead::None, ""),
        };
        Self {
            id: EdgeId::new(),
            kind,
            start: NodeId(Uuid::nil()),
            end: NodeId(Uuid::nil()),
            bent: BentStyle::Straight,
            line,
            start_arrow: ArrowHead::None,
            end_arrow,
            start_label: String::new(),
            middle_label: middle_label.to_string(),
            end_label: String::new(),
        }
    }

    pub fn with_middle_label(mut self, label: impl Into<String>) -> Self {
        self.middle_label = label.into();
        self
    }

    pub fn with_line(mut self, line: LineStyle) -> Self {
        self.line = line;
        self
    }

    pub fn with_end_arrow(mut self, arrow: ArrowHead) -> Self {
        self.end_arrow = arrow;
        self
    }

    pub fn properties(&self) -> &'static [Property] {
        const EDGE_PROPS: &[Property] = &[
            Property::text("start_label"),
            Property::text("middle_label"),
            Property::text("end_label"),
            Property::enumeration("bent_style", BENT_STYLE_CHOICES).hidden(),
            Property::enumeration("line_style", LINE_STYLE_CHOICES),
            Property::enumeration("start_arrow", ARROW_CHOICES),
            Property::enumeration("end_arrow", ARROW_CHOICES),
        ];
        EDGE_PROPS
    }

    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        let value = match name {
            "start_label" => PropertyValue::text(self.start_label.clone()),
            "middle_label" => PropertyValue::text(self.middle_label.clone()),
            "end_label" => PropertyValue::text(self.end_label.clone()),
            "bent_style" => PropertyValue::text(self.bent.as_str()),
            "line_style" => PropertyValue::text(self.line.as_str()),
            "start_arrow" => PropertyValue::text(self.start_arrow.as_str()),
            "end_arrow" => PropertyValue::text(self.end_arrow.as_str()),
            _ => return None,
        };
        Some(value)
    }

    pub fn set_property(
        &mut self,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        let invalid = |value: &PropertyValue| PropertyError::InvalidValue {
            name: name.to_string(),
            value: format!("{value:?}"),
        };
        let text = value.as_text().ok_or_else(|| invalid(&value))?;
        match name {
            "start_label" => self.start_label = text.to_string(),
            "middle_label" => self.middle_label = text.to_string(),
            "end_label" => self.end_label = text.to_string(),
            "bent_style" => self.bent = BentStyle::parse(text).ok_or_else(|| invalid(&value))?,
            "line_style" => self.line = LineStyle::parse(text).ok_or_else(|| invalid(&value))?,
            "start_arrow" => {
                self.start_arrow = ArrowHead::parse(text).ok_or_else(|| invalid(&value))?
            }
            "end_arrow" => {
                self.end_arrow = ArrowHead::parse(text).ok_or_else(|| invalid(&value))?
            }
            _ => return Err(PropertyError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_kind() {
        let general = Edge::new(EdgeKind::Generalization);
        assert_eq!(general.line, LineStyle::Solid);
        assert_eq!(general.end_arrow, ArrowHead::Triangle);

        let ret = Edge::new(EdgeKind::Return);
        assert_eq!(ret.line, LineStyle::Dashed);
    }

    #[test]
    fn style_properties_round_trip() {
        let mut edge = Edge::new(EdgeKind::Association);
        edge.set_property("line_style", PropertyValue::text("dashed"))
            .unwrap();
        assert_eq!(
            edge.property("line_style"),
            Some(PropertyValue::text("dashed"))
        );
        assert!(edge
            .set_property("line_style", PropertyValue::text("wavy"))
            .is_err());
        assert!(edge
            .set_property("nope", PropertyValue::text("x"))
            .is_err());
    }
}
