//! Type lattice for expression resolution.
//!
//! This module provides:
//! - Concrete type tags and generic type classes
//! - Type descriptors (precision, scale, codeset, collation, elements)
//! - The promotion table (`common_type`) and its per-operator exceptions
//! - Result precision rules for computed values

pub mod collation;
pub mod descriptor;
pub mod generic;
pub mod lattice;
pub mod precision;
pub mod tag;

pub use collation::{CoercibilityLevel, Codeset, Collation, CollationId};
pub use descriptor::{DataTypeDescriptor, Domain, MAX_NUMERIC_PRECISION, MAX_VARCHAR_LENGTH};
pub use generic::{is_equivalent, ArgSpec, GenericClass};
pub use lattice::{common_type, common_type_for_op, is_comparable, same_family};
pub use tag::{TypeTag, UnknownTypeName};
