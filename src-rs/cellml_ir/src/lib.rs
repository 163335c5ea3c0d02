//! Intermediate Representation (IR) for CellML models
//!
//! The IR holds a model as a tree: units definitions keyed by name, and a
//! forest of components where children express encapsulation. Components and
//! units may be import placeholders that stand for a definition in another
//! document; placeholders point at a shared [`ImportSource`] through an
//! [`ImportSourceId`], so resolving the source once is seen by all of them.
//!
//! Variable equivalences are stored on both variables as
//! [`VariableRef`]s, addressed by component and variable name.

mod component;
mod import;
mod model;
mod reference;
mod units;
mod variable;

pub use crate::component::{Component, Components};
pub use crate::import::{ImportKind, ImportLink, ImportRecord, ImportSource, ImportSourceId};
pub use crate::model::Model;
pub use crate::reference::DocumentKey;
pub use crate::units::{Unit, Units, is_standard_units};
pub use crate::variable::{InterfaceType, Variable, VariableRef};
