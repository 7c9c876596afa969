//! Expression trees handled by the resolver.
//!
//! This module provides:
//! - Expression node representation
//! - The bottom-up walker with slot rebinding
//! - Light pre-order rewrites

pub mod expr;
pub mod rewrite;
pub mod walker;

pub use expr::{CollectionKind, ColumnRef, Expr, ExprKind};
pub use rewrite::simplify;
pub use walker::{replace_with, walk, Rewrite, Visitor};
