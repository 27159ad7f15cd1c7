//! Diagram model and edit engine for UML-style diagrams.
//!
//! The crate covers five diagram types (class, object, use case, state,
//! sequence) as typed graphs: nodes in a containment hierarchy, edges
//! referencing nodes by id, and per-type legality rules deciding what may
//! be added where. Every mutation goes through [`Diagram`] and returns a
//! [`history::Command`] carrying its exact inverse, which is what undo and
//! redo replay. [`Editor`] bundles a diagram with a selection, a clipboard,
//! and a history for the common interactive path.
//!
//! Rendering is a seam, not a feature: a diagram paints itself onto
//! anything implementing [`render::Surface`], in a fixed order (containers,
//! then their contents, then edges).

pub mod clipboard;
pub mod diagram;
pub mod edge;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod node;
pub mod persistence;
pub mod property;
pub mod render;
pub mod rules;
pub mod selection;
mod sequence;

pub use clipboard::Clipboard;
pub use diagram::{Diagram, DiagramType, Slot};
pub use edge::{ArrowHead, BentStyle, Edge, EdgeId, EdgeKind, LineStyle};
pub use editor::Editor;
pub use geometry::{Point, Rect};
pub use history::{Command, History};
pub use node::{Node, NodeId, NodeKind, NodeType};
pub use property::{Property, PropertyError, PropertyKind, PropertyValue};
pub use selection::{ElementRef, SelectionList};
pub use sequence::CREATE_LABEL;
