//! Named, typed properties exposed by every graph element.
//!
//! The (external) property editor never reaches into element internals; it
//! enumerates the ordered descriptor list and goes through get/set by name.
//! Descriptors are fixed per element variant at construction time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic type of a property, used by editors to pick a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Single-line text
    Text,
    /// Multi-line text (attribute/method compartments, note bodies)
    MultiLine,
    /// One of a fixed set of choices
    Enumeration(&'static [&'static str]),
    /// Boolean toggle
    Flag,
}

/// A property value crossing the get/set interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Flag(bool),
}

impl PropertyValue {
    pub fn text(s: impl Into<String>) -> Self {
        PropertyValue::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PropertyValue::Flag(b) => Some(*b),
            PropertyValue::Text(_) => None,
        }
    }
}

/// Descriptor for one named property of an element
#[derive(Debug, Clone, Copy)]
pub struct Property {
    pub name: &'static str,
    pub kind: PropertyKind,
    /// Hidden properties still serialize but are not shown to the user
    pub visible: bool,
}

impl Property {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Text,
            visible: true,
        }
    }

    pub const fn multi_line(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::MultiLine,
            visible: true,
        }
    }

    pub const fn enumeration(name: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: PropertyKind::Enumeration(choices),
            visible: true,
        }
    }

    pub const fn flag(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Flag,
            visible: true,
        }
    }

    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Failure modes of `set_property`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertyError {
    #[error("element has no property named {0:?}")]
    UnknownProperty(String),
    #[error("property {name:?} does not accept {value:?}")]
    InvalidValue { name: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_builder_clears_visibility() {
        let p = Property::text("id").hidden();
        assert!(!p.visible);
        assert_eq!(p.name, "id");
    }

    #[test]
    fn value_accessors_reject_wrong_shape() {
        assert_eq!(PropertyValue::text("a").as_flag(), None);
        assert_eq!(PropertyValue::Flag(true).as_text(), None);
        assert_eq!(PropertyValue::Flag(true).as_flag(), Some(true));
    }
}
