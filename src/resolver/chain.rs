//! Common-type unification over nested GREATEST, LEAST and COALESCE.
//!
//! `GREATEST(a, b, c)` arrives as `GREATEST(GREATEST(a, b), c)`. Typing each
//! binary node on its own would widen in steps and cast intermediate
//! results; instead the leaves of the whole chain are collected first, their
//! joint type computed once, and every leaf and inner node set to it.

use log::debug;

use crate::catalog::OperatorId;
use crate::coercion::{coerce_argument, join_types};
use crate::driver::ResolutionStats;
use crate::error::SemanticResult;
use crate::expression::Expr;
use crate::resolver::overload::not_defined;
use crate::resolver::ResolveContext;
use crate::types::{DataTypeDescriptor, Domain, TypeTag};

/// Whether `node` is the root of a chain with at least one nested link.
pub fn is_chain_root(node: &Expr, parent: Option<OperatorId>) -> bool {
    match node.op() {
        Some(op) if op.is_chain() && parent != Some(op) => {
            node.args().iter().any(|arg| arg.op() == Some(op))
        }
        _ => false,
    }
}

/// Leaves of the chain of `op` rooted at `root`, left to right.
pub fn leaves(root: &Expr, op: OperatorId) -> Vec<&Expr> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.op() == Some(op) {
            stack.extend(node.args().iter().rev());
        } else {
            out.push(node);
        }
    }
    out
}

/// Mutable leaves of the chain of `op` rooted at `root`, left to right.
pub fn leaves_mut(root: &mut Expr, op: OperatorId) -> Vec<&mut Expr> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.op() == Some(op) {
            if let Some(args) = node.args_mut() {
                stack.extend(args.iter_mut().rev());
            }
        } else {
            out.push(node);
        }
    }
    out
}

/// Whether any leaf of the chain failed to resolve.
pub fn is_poisoned(root: &Expr, op: OperatorId) -> bool {
    leaves(root, op)
        .iter()
        .any(|leaf| leaf.resolved_type == TypeTag::None)
}

/// Convert every leaf of the chain to the joint type and type the inner
/// nodes with it. The root itself is left to ordinary resolution.
pub fn unify(
    root: &mut Expr,
    op: OperatorId,
    ctx: &ResolveContext<'_>,
    stats: &mut ResolutionStats,
) -> SemanticResult<TypeTag> {
    let types: Vec<TypeTag> = leaves(root, op).iter().map(|l| l.resolved_type).collect();
    let mut joint = TypeTag::Null;
    for &tag in &types {
        joint = join_types(joint, op, tag, ctx.config.compat_mode);
        if joint == TypeTag::None {
            return Err(not_defined(op, &types));
        }
    }
    debug!("{}: {op} chain of {} over {joint}", root.position, types.len());

    let descriptor = leaves(root, op)
        .into_iter()
        .find(|l| l.resolved_type == joint)
        .and_then(|l| l.descriptor.clone());

    if !joint.is_sentinel() {
        let target = Domain {
            tag: joint,
            descriptor: descriptor.clone(),
        };
        for leaf in leaves_mut(root, op) {
            stats.record(coerce_argument(leaf, &target, op)?);
        }
    }
    retype_links(root, op, joint, descriptor);
    Ok(joint)
}

/// Set the type of every inner link below `root`.
fn retype_links(root: &mut Expr, op: OperatorId, tag: TypeTag, descriptor: Option<DataTypeDescriptor>) {
    let mut stack: Vec<&mut Expr> = root
        .args_mut()
        .map(|args| args.iter_mut().collect())
        .unwrap_or_default();
    while let Some(node) = stack.pop() {
        if node.op() != Some(op) {
            continue;
        }
        node.resolved_type = tag;
        node.descriptor = descriptor.clone();
        if let Some(args) = node.args_mut() {
            stack.extend(args.iter_mut());
        }
    }
}
