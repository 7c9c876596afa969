//! Constant folding of literal-only expressions.
//!
//! A node whose operands are all literals is evaluated by the value engine
//! and replaced with a literal of the node's resolved type. Runtime-only
//! operators and results that would be disproportionately large are left
//! for run time. Overflow and division by zero over literals are certain on
//! every run and are reported as errors.

use log::{debug, warn};

use crate::catalog::{Catalog, OperatorId};
use crate::config::{ResolverConfig, SessionContext};
use crate::error::{SemanticError, SemanticResult};
use crate::expression::{Expr, ExprKind};
use crate::resolver::chain;
use crate::resolver::ResolveContext;
use crate::types::{Domain, TypeTag};
use crate::value::{EvalContext, Value, ValueEngine, ValueError};

/// Largest result, in characters, that SPACE, REPEAT and the padding
/// functions may produce at compile time.
pub const MAX_FOLDED_SIZE: u64 = 1 << 20;

/// Why a node was left as it is.
#[derive(Debug, Clone, PartialEq)]
pub enum NotFolded {
    /// Some operand is not a literal
    NotConstant,
    /// The operator's value depends on run time state
    RuntimeOnly,
    /// The node has no resolved type
    Untyped,
    /// The result would exceed [`MAX_FOLDED_SIZE`]
    TooLarge { size: u64 },
    /// The value engine does not compute this operator
    Unsupported,
    /// Evaluation failed and is left to run time
    Failed { message: String },
}

/// Result of [`Folder::try_fold`].
#[derive(Debug, Clone, PartialEq)]
pub enum FoldOutcome {
    Folded(Expr),
    NotFolded(NotFolded),
}

impl FoldOutcome {
    pub fn is_folded(&self) -> bool {
        matches!(self, FoldOutcome::Folded(_))
    }
}

/// Evaluates literal-only nodes through a [`ValueEngine`].
pub struct Folder<'a> {
    engine: &'a dyn ValueEngine,
    config: &'a ResolverConfig,
    session: &'a SessionContext,
}

impl<'a> Folder<'a> {
    pub fn new(
        engine: &'a dyn ValueEngine,
        config: &'a ResolverConfig,
        session: &'a SessionContext,
    ) -> Self {
        Self {
            engine,
            config,
            session,
        }
    }

    pub fn from_context(ctx: &ResolveContext<'a>) -> Self {
        Self::new(ctx.engine, ctx.config, ctx.session)
    }

    /// Evaluate `node` if every operand is a literal.
    ///
    /// The node itself is not touched; a folded literal is returned for the
    /// caller to substitute.
    pub fn try_fold(&self, node: &Expr) -> SemanticResult<FoldOutcome> {
        match &node.kind {
            ExprKind::Literal(_) => Ok(FoldOutcome::Folded(node.clone())),
            ExprKind::Cast { operand } => match operand.literal_value() {
                Some(value) => self.fold_cast(node, operand, value),
                None => Ok(FoldOutcome::NotFolded(NotFolded::NotConstant)),
            },
            ExprKind::Operation { op, args } => self.fold_operation(node, *op, args),
            _ => Ok(FoldOutcome::NotFolded(NotFolded::NotConstant)),
        }
    }

    fn fold_cast(&self, node: &Expr, operand: &Expr, value: &Value) -> SemanticResult<FoldOutcome> {
        let target = node.domain();
        match self.engine.cast(value, &target) {
            Ok(value) => Ok(FoldOutcome::Folded(folded(node, value))),
            Err(ValueError::Overflow) => Err(SemanticError::NumericOverflow { op: OperatorId::Cast }),
            Err(ValueError::OutOfMemory) => Err(SemanticError::OutOfMemory),
            Err(ValueError::Unsupported { .. }) => Ok(FoldOutcome::NotFolded(NotFolded::Unsupported)),
            Err(_) if self.config.return_null_on_function_errors => {
                Ok(FoldOutcome::Folded(folded(node, Value::Null)))
            }
            Err(_) => Err(SemanticError::CannotCoerce {
                node: operand.to_string(),
                target,
            }),
        }
    }

    fn fold_operation(&self, node: &Expr, op: OperatorId, args: &[Expr]) -> SemanticResult<FoldOutcome> {
        if node.resolved_type == TypeTag::None || Catalog::global()?.lookup(op).is_none() {
            return Ok(FoldOutcome::NotFolded(NotFolded::Untyped));
        }
        if op.is_runtime_only() {
            return Ok(FoldOutcome::NotFolded(NotFolded::RuntimeOnly));
        }
        if let Some(value) = short_circuit(op, args) {
            debug!("{}: {op} decided by a literal operand", node.position);
            return Ok(FoldOutcome::Folded(folded(node, value)));
        }
        if chain::is_chain_root(node, None) {
            return self.fold_chain(node, op);
        }

        let Some(values) = args.iter().map(constant_value).collect::<Option<Vec<Value>>>() else {
            return Ok(FoldOutcome::NotFolded(NotFolded::NotConstant));
        };
        if let Some(size) = result_size(op, &values) {
            if size > MAX_FOLDED_SIZE {
                warn!(
                    "{}: {op} left for run time, result of {size} characters exceeds {MAX_FOLDED_SIZE}",
                    node.position
                );
                return Ok(FoldOutcome::NotFolded(NotFolded::TooLarge { size }));
            }
        }

        let ctx = EvalContext::new(self.session).with_collation(operand_collation(args));
        match self.engine.apply(op, &values, &node.domain(), &ctx) {
            Ok(value) => {
                debug!("{}: folded {node} to {value}", node.position);
                Ok(FoldOutcome::Folded(folded(node, value)))
            }
            Err(err) => self.failure(node, op, err),
        }
    }

    /// Reduce the leaves of a GREATEST/LEAST/COALESCE chain pairwise.
    fn fold_chain(&self, node: &Expr, op: OperatorId) -> SemanticResult<FoldOutcome> {
        let leaves = chain::leaves(node, op);
        let Some(values) = leaves
            .iter()
            .map(|leaf| leaf.literal_value().cloned())
            .collect::<Option<Vec<Value>>>()
        else {
            return Ok(FoldOutcome::NotFolded(NotFolded::NotConstant));
        };

        let target = node.domain();
        let ctx = EvalContext::new(self.session)
            .with_collation(leaves.iter().find_map(|l| l.domain().collation()));
        let mut values = values.into_iter();
        let Some(mut acc) = values.next() else {
            return Ok(FoldOutcome::NotFolded(NotFolded::NotConstant));
        };
        for next in values {
            acc = match self.engine.apply(op, &[acc, next], &target, &ctx) {
                Ok(value) => value,
                Err(err) => return self.failure(node, op, err),
            };
        }
        debug!("{}: folded {op} chain of {} to {acc}", node.position, leaves.len());
        Ok(FoldOutcome::Folded(folded(node, acc)))
    }

    fn failure(&self, node: &Expr, op: OperatorId, err: ValueError) -> SemanticResult<FoldOutcome> {
        match err {
            ValueError::Overflow => Err(SemanticError::NumericOverflow { op }),
            ValueError::ZeroDivide => Err(SemanticError::ZeroDivide { op }),
            ValueError::OutOfMemory => Err(SemanticError::OutOfMemory),
            ValueError::Unsupported { .. } => Ok(FoldOutcome::NotFolded(NotFolded::Unsupported)),
            ValueError::Incompatible { .. } | ValueError::InvalidArgument { .. } => {
                if self.config.return_null_on_function_errors {
                    debug!("{}: {op} failed, folded to NULL: {err}", node.position);
                    Ok(FoldOutcome::Folded(folded(node, Value::Null)))
                } else {
                    Ok(FoldOutcome::NotFolded(NotFolded::Failed {
                        message: err.to_string(),
                    }))
                }
            }
        }
    }

    /// Fold CASTs over literals among the operands of `node`, including the
    /// items of collection operands and the leaves of a chain. Returns the
    /// number of operands replaced.
    pub fn fold_arguments(&self, node: &mut Expr) -> SemanticResult<usize> {
        let mut folds = 0;
        for slot in operand_slots(node) {
            if !matches!(&slot.kind, ExprKind::Cast { operand } if operand.is_literal()) {
                continue;
            }
            if let FoldOutcome::Folded(literal) = self.try_fold(slot)? {
                *slot = literal;
                folds += 1;
            }
        }
        Ok(folds)
    }
}

/// The literal value of an operand; a collection constructor over literals
/// counts as one collection value.
fn constant_value(expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::Literal(value) => Some(value.clone()),
        ExprKind::Collection { items, .. } => items
            .iter()
            .map(|item| item.literal_value().cloned())
            .collect::<Option<Vec<Value>>>()
            .map(Value::Collection),
        _ => None,
    }
}

/// A literal operand that decides AND or OR on its own.
fn short_circuit(op: OperatorId, args: &[Expr]) -> Option<Value> {
    let decisive = match op {
        OperatorId::And => false,
        OperatorId::Or => true,
        _ => return None,
    };
    args.iter()
        .filter_map(|arg| arg.literal_value().and_then(Value::as_bool))
        .find(|b| *b == decisive)
        .map(Value::Logical)
}

/// Size in characters of the result of a size-gated operator.
fn result_size(op: OperatorId, values: &[Value]) -> Option<u64> {
    let index = op.fold_size_argument()?;
    let count = u64::try_from(values.get(index)?.as_i64()?).unwrap_or(0);
    if op == OperatorId::Repeat {
        let unit = values.first().map_or(0, |v| match v.as_str() {
            Some(s) => s.chars().count(),
            None => v.to_text().chars().count(),
        });
        return Some(count.saturating_mul(unit as u64));
    }
    Some(count)
}

fn operand_collation(args: &[Expr]) -> Option<crate::types::CollationId> {
    args.iter().find_map(|arg| arg.domain().collation())
}

fn operand_slots(node: &mut Expr) -> Vec<&mut Expr> {
    let direct: Vec<&mut Expr> = match node.op() {
        Some(op) if op.is_chain() => chain::leaves_mut(node, op),
        _ => node
            .args_mut()
            .map(|args| args.iter_mut().collect())
            .unwrap_or_default(),
    };

    let mut slots = Vec::with_capacity(direct.len());
    for slot in direct {
        if matches!(slot.kind, ExprKind::Collection { .. }) {
            if let ExprKind::Collection { items, .. } = &mut slot.kind {
                slots.extend(items.iter_mut());
            }
        } else {
            slots.push(slot);
        }
    }
    slots
}

/// A literal standing in for `node`, keeping its type and source metadata.
fn folded(node: &Expr, value: Value) -> Expr {
    let mut literal = Expr::typed_literal(
        value,
        Domain {
            tag: node.resolved_type,
            descriptor: node.descriptor.clone(),
        },
    );
    literal.position = node.position;
    literal.alias = node.alias.clone();
    literal.collate_modifier = node.collate_modifier;
    literal
}
