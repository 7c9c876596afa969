//! Comparison-specific argument preparation.
//!
//! Before a comparison goes through the symmetric path, literals compared
//! with an enumeration are rewritten to enumeration values, and literals
//! compared with a column are converted to the column's type when that loses
//! nothing. The column then keeps its own type instead of being widened.

use std::cmp::Ordering;

use log::debug;

use crate::catalog::{OperatorId, Signature};
use crate::coercion::{coerce_argument, coerce_elements, collection_descriptor};
use crate::driver::ResolutionStats;
use crate::error::SemanticResult;
use crate::expression::{Expr, ExprKind};
use crate::resolver::overload::{self, resolve};
use crate::resolver::{arg_types, ResolveContext};
use crate::types::{common_type, Domain, TypeTag};
use crate::value::{Value, ValueEngine};

/// Rewrite the literals of a two- or three-way comparison in place.
pub fn prepare(node: &mut Expr, ctx: &ResolveContext<'_>, stats: &mut ResolutionStats) -> SemanticResult<()> {
    let Some(args) = node.args_mut() else {
        return Ok(());
    };
    let rewritten = rewrite_enum_literals(args.iter_mut());
    if rewritten > 0 {
        stats.enum_rewrites += rewritten;
        return Ok(());
    }
    stats.folds += keep_column_type(args.iter_mut(), ctx.engine);
    Ok(())
}

/// Resolve `x IN (...)` and `x NOT IN (...)`.
///
/// A collection constructor on the right is unified with the probe value
/// element by element; anything else goes through plain overload selection.
pub fn resolve_membership(
    node: &mut Expr,
    op: OperatorId,
    ctx: &ResolveContext<'_>,
    stats: &mut ResolutionStats,
) -> SemanticResult<Signature> {
    let types = arg_types(node)?;
    let Some([probe, list]) = node.args_mut().map(Vec::as_mut_slice) else {
        return plain(node, op);
    };
    let ExprKind::Collection { items, .. } = &mut list.kind else {
        return plain(node, op);
    };

    let probe_tag = probe.resolved_type;
    let enum_rewrites = if probe_tag == TypeTag::Enumeration {
        rewrite_enum_literals(std::iter::once(&mut *probe).chain(items.iter_mut()))
    } else {
        0
    };

    let kept = if enum_rewrites == 0 && probe.is_column() {
        keep_column_type(std::iter::once(&mut *probe).chain(items.iter_mut()), ctx.engine)
    } else {
        0
    };

    if enum_rewrites > 0 {
        stats.enum_rewrites += enum_rewrites;
    } else if kept > 0 {
        stats.folds += kept;
    } else {
        let mut common = probe_tag;
        for item in items.iter() {
            common = common_type(common, item.resolved_type);
            if common == TypeTag::None {
                return Err(overload::not_defined(op, &types));
            }
        }
        if !common.is_sentinel() {
            let target = Domain::of(common);
            stats.record(coerce_argument(probe, &target, op)?);
            stats.casts_inserted += coerce_elements(list, &target, op)?;
        }
    }

    if let ExprKind::Collection { items, .. } = &list.kind {
        list.descriptor = Some(collection_descriptor(items));
    }
    plain(node, op)
}

fn plain(node: &mut Expr, op: OperatorId) -> SemanticResult<Signature> {
    let types = arg_types(node)?;
    let (signature, index) = resolve(op, &types)?;
    debug!("{}: {op} overload {index} {signature}", node.position);
    Ok(signature)
}

/// Replace string and integer literals compared with an enumeration by the
/// enumeration value they name. Rewrites nothing unless every literal names
/// a value. Returns the number of literals rewritten.
fn rewrite_enum_literals<'e>(operands: impl Iterator<Item = &'e mut Expr>) -> usize {
    let mut operands: Vec<&mut Expr> = operands.collect();
    let Some(domain) = operands
        .iter()
        .find(|o| o.resolved_type == TypeTag::Enumeration && !o.is_literal())
        .map(|o| o.domain())
    else {
        return 0;
    };
    let labels: &[String] = domain
        .descriptor
        .as_ref()
        .map(|d| d.enum_values.as_slice())
        .unwrap_or(&[]);

    let mut rewrites = Vec::new();
    for (i, operand) in operands.iter().enumerate() {
        if matches!(operand.resolved_type, TypeTag::Enumeration | TypeTag::Null) {
            continue;
        }
        let Some(value) = operand.literal_value() else {
            return 0;
        };
        let position = match value {
            Value::String(label) => labels.iter().position(|l| l == label),
            other => other
                .as_i64()
                .and_then(|n| usize::try_from(n).ok())
                .filter(|n| (1..=labels.len()).contains(n))
                .map(|n| n - 1),
        };
        let Some(position) = position else {
            return 0;
        };
        rewrites.push((i, position));
    }

    for &(i, position) in &rewrites {
        let operand = &mut operands[i];
        let value = Value::Enum {
            index: u16::try_from(position + 1).unwrap_or(u16::MAX),
            label: labels[position].clone(),
        };
        let mut literal = Expr::typed_literal(value, domain.clone());
        literal.position = operand.position;
        literal.alias = operand.alias.take();
        **operand = literal;
    }
    rewrites.len()
}

/// Convert literals compared with a column to the column's type, when every
/// such literal converts without loss. Returns the number converted.
fn keep_column_type<'e>(operands: impl Iterator<Item = &'e mut Expr>, engine: &dyn ValueEngine) -> usize {
    let mut operands: Vec<&mut Expr> = operands.collect();
    let Some(domain) = operands
        .iter()
        .find(|o| o.is_column() && !o.resolved_type.is_sentinel())
        .map(|o| o.domain())
    else {
        return 0;
    };

    let mut converted = Vec::new();
    for (i, operand) in operands.iter().enumerate() {
        if operand.resolved_type == domain.tag || operand.resolved_type.is_sentinel() {
            continue;
        }
        let Some(value) = operand.literal_value() else {
            return 0;
        };
        match lossless(engine, value, &operand.domain(), &domain) {
            Some(value) => converted.push((i, value)),
            None => return 0,
        }
    }

    let count = converted.len();
    for (i, value) in converted {
        let operand = &mut operands[i];
        let mut literal = Expr::typed_literal(value, domain.clone());
        literal.position = operand.position;
        literal.alias = operand.alias.take();
        **operand = literal;
    }
    count
}

/// `value` converted to `to`, if converting it back to `from` yields an
/// equal value. Strings only need to fit the target length.
fn lossless(engine: &dyn ValueEngine, value: &Value, from: &Domain, to: &Domain) -> Option<Value> {
    let converted = engine.cast(value, to).ok()?;
    if to.tag.is_string() {
        let length = value.as_str()?.chars().count();
        let limit = to.descriptor.as_ref().map_or(0, |d| d.precision) as usize;
        return (limit == 0 || length <= limit).then_some(converted);
    }
    let back = engine.cast(&converted, from).ok()?;
    match engine.compare(value, &back, None) {
        Ok(Some(Ordering::Equal)) => Some(converted),
        _ => None,
    }
}
