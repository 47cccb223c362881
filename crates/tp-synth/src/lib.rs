//! Type-directed synthesis: find a path of single-step transformations
//! between two types, then realize it as a statement tree.

#[macro_use]
extern crate tp_core;

pub mod compose;
pub mod finder;
pub mod names;
pub mod options;
pub mod path;
pub mod realize;
pub mod scope;

pub use compose::{compose_records, Composition, RecordComposer};
pub use finder::{find_path, PathFinder, MAX_DEPTH};
pub use options::{AuxiliaryCapture, EmissionOptions, ErrorPolicy};
pub use path::{Edge, FieldRef, FunctionRef, Path, Payload, Step};
pub use realize::{realize, PathRealizer, Realized};
pub use scope::{Mode, ScopeBound, ScopeKind, ScopeManager, Variable};

pub use tp_core::{Error, Result};
