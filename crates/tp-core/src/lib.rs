#[macro_use]
pub mod macros;

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pretty;
pub mod stmt;
pub mod ty;

// Re-export commonly used items for convenience
pub use tracing;

pub use stmt::{Block, Expr, Stmt, StatementTree};
pub use ty::{Field, FunctionType, Type, TypeRegistry, TypeResolver};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
