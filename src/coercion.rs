//! Implicit conversions between an argument and the slot it fills.
//!
//! This module provides:
//! - Common-type inference over an operator's symmetric slots
//! - The castability table for implicit conversions
//! - Insertion of CAST nodes and deferred domains for late-bound arguments
//! - Element-wise coercion of collection constructors

use log::trace;

use crate::catalog::OperatorId;
use crate::config::CompatMode;
use crate::error::{SemanticError, SemanticResult};
use crate::expression::{replace_with, CollectionKind, Expr, ExprKind};
use crate::types::{common_type_for_op, DataTypeDescriptor, Domain, TypeTag};

/// What coercing one argument did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// The argument already fits its slot.
    Unchanged,
    /// A late-bound argument recorded the target for bind time.
    Deferred,
    /// The argument was wrapped in a CAST.
    Cast,
    /// This many collection elements were wrapped in CASTs.
    Elements(usize),
}

/// Join of two argument types under `op`, honoring the compatibility mode.
pub fn join_types(t1: TypeTag, op: OperatorId, t2: TypeTag, mode: CompatMode) -> TypeTag {
    if mode == CompatMode::MySql {
        // LOGICAL reads as INTEGER next to a number.
        let (a, b) = match (t1, t2) {
            (TypeTag::Logical, other) if other.is_numeric() => (TypeTag::Integer, other),
            (other, TypeTag::Logical) if other.is_numeric() => (other, TypeTag::Integer),
            pair => pair,
        };
        if op == OperatorId::Divide && a.is_discrete_number() && b.is_discrete_number() {
            return TypeTag::Numeric;
        }
        return common_type_for_op(a, op, b);
    }
    common_type_for_op(t1, op, t2)
}

/// The type every symmetric argument of `op` must be converted to.
///
/// Absent slots (NONE) are skipped. Returns NONE when two present
/// arguments have no promotion path. A MAYBE result adopts `expected`, the
/// domain the enclosing expression asked this node for.
pub fn infer_common_type(
    op: OperatorId,
    arg_types: &[TypeTag],
    expected: Option<TypeTag>,
    mode: CompatMode,
) -> TypeTag {
    let mut joint: Option<TypeTag> = None;
    for &slot in op.symmetric_slots() {
        let Some(&tag) = arg_types.get(slot) else {
            continue;
        };
        if tag == TypeTag::None {
            continue;
        }
        // Each argument is first joined with itself under `op`.
        let own = join_types(tag, op, tag, mode);
        let next = match joint {
            None => own,
            Some(acc) => join_types(acc, op, own, mode),
        };
        if next == TypeTag::None {
            return TypeTag::None;
        }
        joint = Some(next);
    }

    match (joint, expected) {
        (Some(TypeTag::Maybe), Some(expected)) if !expected.is_sentinel() => expected,
        (Some(joint), _) => joint,
        (None, _) => TypeTag::None,
    }
}

/// Whether a value of type `from` may be implicitly converted to `to`.
pub fn can_cast(from: TypeTag, to: TypeTag) -> bool {
    if from == to {
        return from != TypeTag::None;
    }
    match (from, to) {
        (TypeTag::None, _) | (_, TypeTag::None | TypeTag::Null | TypeTag::Maybe) => false,
        (TypeTag::Null | TypeTag::Maybe, _) => true,
        (TypeTag::Object, _) | (_, TypeTag::Object) => false,
        (TypeTag::Logical, _) => to.is_numeric() || to.is_string(),
        (_, TypeTag::Logical) => from.is_numeric() || from.is_string(),
        (TypeTag::Clob, _) => to.is_string(),
        (_, TypeTag::Clob) => from.is_string(),
        _ if from.is_string() => !to.is_collection(),
        _ if to.is_string() => !from.is_collection() && from != TypeTag::Blob,
        _ if from.is_numeric() => {
            to.is_numeric()
                || to == TypeTag::Enumeration
                || (from.is_discrete_number() && (to.is_bit() || to == TypeTag::Blob))
        }
        (TypeTag::Enumeration, _) => to.is_numeric(),
        _ if from.is_bit() || from == TypeTag::Blob => to.is_bit() || to == TypeTag::Blob,
        (TypeTag::Date, _) => to.has_date_part(),
        (TypeTag::Time, _) => false,
        (TypeTag::Timestamp | TypeTag::DateTime, _) => to.is_temporal(),
        _ if from.is_collection() => to.is_collection(),
        _ => false,
    }
}

/// Convert the argument in `slot` to `target` on behalf of `op`.
///
/// NULL arguments and arguments already of the target type are left alone.
/// A late-bound argument records `target` as its expected domain, unless
/// `op` must know its return type before binding, in which case it is cast.
pub fn coerce_argument(slot: &mut Expr, target: &Domain, op: OperatorId) -> SemanticResult<Coercion> {
    let from = slot.resolved_type;
    if from == target.tag || from == TypeTag::Null || target.tag.is_sentinel() {
        return Ok(Coercion::Unchanged);
    }

    if from == TypeTag::Maybe && !op.is_late_bind_sensitive() {
        if slot.expected_domain.as_ref() == Some(target) {
            return Ok(Coercion::Unchanged);
        }
        trace!("{}: {} deferred to {}", slot.position, slot, target);
        slot.expected_domain = Some(target.clone());
        return Ok(Coercion::Deferred);
    }

    if target.tag == TypeTag::Logical {
        return Err(SemanticError::internal(format!(
            "implicit conversion of {slot} to LOGICAL under {op}"
        )));
    }

    if from.is_collection() && target.tag.is_collection() {
        if let ExprKind::Collection { .. } = slot.kind {
            return coerce_collection(slot, target, op);
        }
    }

    if !can_cast(from, target.tag) {
        return Err(SemanticError::CannotCoerce {
            node: slot.to_string(),
            target: target.clone(),
        });
    }

    trace!("{}: cast {} to {}", slot.position, slot, target);
    replace_with(slot, |old| Expr::cast(old, target.clone()));
    Ok(Coercion::Cast)
}

/// Convert a collection constructor to another collection type.
///
/// Only elements whose type differs from the target's element domain are
/// cast; the constructor itself changes kind in place.
fn coerce_collection(slot: &mut Expr, target: &Domain, op: OperatorId) -> SemanticResult<Coercion> {
    let cast = match target.elements() {
        [element] => coerce_elements(slot, element, op)?,
        _ => 0,
    };
    if let ExprKind::Collection { kind, items } = &mut slot.kind {
        if let Some(target_kind) = CollectionKind::from_tag(target.tag) {
            *kind = target_kind;
        }
        slot.resolved_type = kind.tag();
        slot.descriptor = Some(collection_descriptor(items));
    }
    Ok(Coercion::Elements(cast))
}

/// Cast every element of a collection constructor not already of type
/// `element`. Returns the number of casts inserted.
pub fn coerce_elements(slot: &mut Expr, element: &Domain, op: OperatorId) -> SemanticResult<usize> {
    let ExprKind::Collection { items, .. } = &mut slot.kind else {
        return Ok(0);
    };

    let mut cast = 0;
    for item in items.iter_mut() {
        if coerce_argument(item, element, op)? == Coercion::Cast {
            cast += 1;
        }
    }
    slot.descriptor = Some(collection_descriptor(items));
    Ok(cast)
}

/// Descriptor of a collection listing the distinct element domains of
/// `items`, first occurrence of each type kept.
pub fn collection_descriptor(items: &[Expr]) -> DataTypeDescriptor {
    let mut elements: Vec<Domain> = Vec::new();
    for item in items {
        let tag = item.resolved_type;
        if tag.is_sentinel() || elements.iter().any(|e| e.tag == tag) {
            continue;
        }
        elements.push(item.domain());
    }
    DataTypeDescriptor::collection(elements)
}
