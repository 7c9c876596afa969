//! Overload selection by match score.

use log::trace;

use crate::catalog::{Catalog, OperatorId, Signature, MAX_ARGS};
use crate::error::{SemanticError, SemanticResult};
use crate::types::TypeTag;

/// Score of an overload that matches every slot.
const FULL_MATCH: i32 = MAX_ARGS as i32;

/// Pad argument types to the fixed slot count.
pub fn slots(arg_types: &[TypeTag]) -> Option<[TypeTag; MAX_ARGS]> {
    if arg_types.len() > MAX_ARGS {
        return None;
    }
    let mut slots = [TypeTag::None; MAX_ARGS];
    slots[..arg_types.len()].copy_from_slice(arg_types);
    Some(slots)
}

/// Pick the overload of `op` that best fits `arg_types`.
///
/// A full match is taken as soon as it is seen. Otherwise the highest
/// non-negative score wins, the earliest overload breaking ties. Returns the
/// signature and its index in the operator's overload list.
pub fn resolve(op: OperatorId, arg_types: &[TypeTag]) -> SemanticResult<(Signature, usize)> {
    let def = Catalog::global()?
        .lookup(op)
        .ok_or(SemanticError::UntypedOperator { op })?;
    let actual = slots(arg_types).ok_or_else(|| not_defined(op, arg_types))?;

    let mut best: Option<(i32, usize)> = None;
    for (index, signature) in def.overloads.iter().enumerate() {
        let score = signature.match_count(&actual);
        trace!("{op}: overload {index} {signature} scores {score}");
        if score == FULL_MATCH {
            return Ok((*signature, index));
        }
        if score >= 0 && best.map_or(true, |(top, _)| score > top) {
            best = Some((score, index));
        }
    }

    best.map(|(_, index)| (def.overloads[index], index))
        .ok_or_else(|| not_defined(op, arg_types))
}

/// Whether `signature` accepts `arg_types` without any coercion.
pub fn is_full_match(signature: &Signature, arg_types: &[TypeTag; MAX_ARGS]) -> bool {
    signature.match_count(arg_types) == FULL_MATCH
}

pub(crate) fn not_defined(op: OperatorId, arg_types: &[TypeTag]) -> SemanticError {
    SemanticError::OperatorNotDefined {
        op,
        arg_types: arg_types
            .iter()
            .copied()
            .filter(|t| *t != TypeTag::None)
            .collect(),
    }
}
