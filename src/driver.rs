//! One bottom-up resolution pass over an expression tree.
//!
//! The walker owns traversal; the pass owns the per-node work. Each
//! operation is typed, its arguments converted, its collations unified and,
//! when every operand is a literal, folded. A node that fails is reported to
//! the diagnostic sink and typed NONE; enclosing nodes then stay NONE
//! without further reports while sibling subtrees are still resolved.

use log::{debug, trace};

use crate::catalog::OperatorId;
use crate::coercion::{can_cast, collection_descriptor, Coercion};
use crate::collation;
use crate::config::{ResolverConfig, SessionContext};
use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::error::{SemanticError, SemanticResult};
use crate::expression::{simplify, walk, Expr, ExprKind, Rewrite, Visitor};
use crate::fold::{FoldOutcome, Folder};
use crate::resolver::{chain, resolve_operation, ResolveContext};
use crate::types::TypeTag;
use crate::value::{StandardValueEngine, ValueEngine};

/// Counts of the changes one pass made to a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// CAST nodes synthesized around arguments
    pub casts_inserted: usize,
    /// Late-bound arguments given an expected domain instead of a CAST
    pub domains_deferred: usize,
    /// Nodes replaced by literals
    pub folds: usize,
    /// Literals rewritten to enumeration values
    pub enum_rewrites: usize,
}

impl ResolutionStats {
    pub fn record(&mut self, coercion: Coercion) {
        match coercion {
            Coercion::Unchanged => {}
            Coercion::Deferred => self.domains_deferred += 1,
            Coercion::Cast => self.casts_inserted += 1,
            Coercion::Elements(count) => self.casts_inserted += count,
        }
    }

    /// Nodes replaced in the tree. A second pass over a resolved tree
    /// reports zero.
    pub fn replacements(&self) -> usize {
        self.casts_inserted + self.folds + self.enum_rewrites
    }
}

/// Resolves expression trees under one configuration and session.
pub struct Resolver<'a> {
    config: ResolverConfig,
    session: SessionContext,
    engine: Box<dyn ValueEngine + 'a>,
}

impl Resolver<'static> {
    /// Create a resolver folding with the standard value engine
    pub fn new(config: ResolverConfig, session: SessionContext) -> Self {
        let engine = StandardValueEngine::new(&config);
        Self {
            config,
            session,
            engine: Box::new(engine),
        }
    }
}

impl<'a> Resolver<'a> {
    /// Create a resolver folding with a custom value engine
    pub fn with_engine(config: ResolverConfig, session: SessionContext, engine: impl ValueEngine + 'a) -> Self {
        Self {
            config,
            session,
            engine: Box::new(engine),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn context(&self) -> ResolveContext<'_> {
        ResolveContext::new(&self.config, &self.session, self.engine.as_ref())
    }

    /// Resolve `root` in place, reporting errors to `sink`.
    ///
    /// After the pass every node carries a concrete type, MAYBE for
    /// late-bound nodes, or NONE where resolution failed.
    pub fn resolve(&self, root: &mut Expr, sink: &mut dyn DiagnosticSink) -> ResolutionStats {
        let ctx = self.context();
        let mut pass = Pass {
            ctx,
            folder: Folder::from_context(&ctx),
            sink,
            stats: ResolutionStats::default(),
        };
        walk(root, &mut pass);
        debug!("resolved {root}: {:?}", pass.stats);
        pass.stats
    }

    /// Resolve `root` in place, collecting diagnostics.
    pub fn resolve_collecting(&self, root: &mut Expr) -> (ResolutionStats, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let stats = self.resolve(root, &mut diagnostics);
        (stats, diagnostics)
    }

    /// Fold a single node without resolving it.
    pub fn try_fold(&self, node: &Expr) -> SemanticResult<FoldOutcome> {
        Folder::from_context(&self.context()).try_fold(node)
    }
}

struct Pass<'a, 's> {
    ctx: ResolveContext<'a>,
    folder: Folder<'a>,
    sink: &'s mut dyn DiagnosticSink,
    stats: ResolutionStats,
}

impl Visitor for Pass<'_, '_> {
    fn pre(&mut self, node: &mut Expr, _parent: Option<OperatorId>) -> Rewrite {
        simplify(node)
    }

    fn post(&mut self, node: &mut Expr, parent: Option<OperatorId>) -> Rewrite {
        let result = match node.kind {
            ExprKind::Operation { .. } => self.operation(node, parent),
            ExprKind::Cast { .. } => self.cast(node),
            ExprKind::Collection { .. } => {
                self.collection(node);
                Ok(Rewrite::Unchanged)
            }
            _ => Ok(Rewrite::Unchanged),
        };
        result.unwrap_or_else(|err| {
            self.fail(node, &err);
            Rewrite::Unchanged
        })
    }
}

impl Pass<'_, '_> {
    fn operation(&mut self, node: &mut Expr, parent: Option<OperatorId>) -> SemanticResult<Rewrite> {
        let Some(op) = node.op() else {
            return Ok(Rewrite::Unchanged);
        };
        // Inner links of a chain are typed together with its root.
        if op.is_chain() && parent == Some(op) {
            return Ok(Rewrite::Unchanged);
        }

        let chain_root = chain::is_chain_root(node, parent);
        if chain_root {
            if chain::is_poisoned(node, op) {
                poison(node);
                return Ok(Rewrite::Unchanged);
            }
            chain::unify(node, op, &self.ctx, &mut self.stats)?;
        } else if node.args().iter().any(|arg| arg.resolved_type == TypeTag::None) {
            poison(node);
            return Ok(Rewrite::Unchanged);
        }

        resolve_operation(node, &self.ctx, &mut self.stats)?;
        let op = node.op().unwrap_or(op);

        if op.is_collation_sensitive() {
            if chain_root {
                let leaves = chain::leaves_mut(node, op);
                if let Some(unified) = collation::apply(op, leaves, self.ctx.session, &mut self.stats)? {
                    collation::stamp_result(node, op, unified);
                }
            } else {
                collation::resolve_node(node, self.ctx.session, &mut self.stats)?;
            }
        }

        self.stats.folds += self.folder.fold_arguments(node)?;
        self.fold(node)
    }

    fn cast(&mut self, node: &mut Expr) -> SemanticResult<Rewrite> {
        let ExprKind::Cast { operand } = &node.kind else {
            return Ok(Rewrite::Unchanged);
        };
        let from = operand.resolved_type;
        if from == TypeTag::None {
            poison(node);
            return Ok(Rewrite::Unchanged);
        }

        let target = node.domain();
        if !target.tag.is_castable_target() || !can_cast(from, target.tag) {
            return Err(SemanticError::CannotCoerce {
                node: operand.to_string(),
                target,
            });
        }
        if operand.is_literal() {
            return self.fold(node);
        }
        Ok(Rewrite::Unchanged)
    }

    fn collection(&mut self, node: &mut Expr) {
        let ExprKind::Collection { items, .. } = &node.kind else {
            return;
        };
        if items.iter().any(|item| item.resolved_type == TypeTag::None) {
            poison(node);
            return;
        }
        node.descriptor = Some(collection_descriptor(items));
    }

    fn fold(&mut self, node: &Expr) -> SemanticResult<Rewrite> {
        match self.folder.try_fold(node)? {
            FoldOutcome::Folded(literal) if !node.is_literal() => {
                self.stats.folds += 1;
                Ok(Rewrite::Replaced(literal))
            }
            FoldOutcome::Folded(_) => Ok(Rewrite::Unchanged),
            FoldOutcome::NotFolded(reason) => {
                trace!("{}: {node} not folded: {reason:?}", node.position);
                Ok(Rewrite::Unchanged)
            }
        }
    }

    fn fail(&mut self, node: &mut Expr, err: &SemanticError) {
        debug!("{}: {node}: {err}", node.position);
        self.sink.report_error(node.position, err);
        poison(node);
    }
}

/// Mark `node` as failed without reporting it again.
fn poison(node: &mut Expr) {
    node.resolved_type = TypeTag::None;
    node.descriptor = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Position;
    use crate::types::Domain;
    use crate::value::Value;

    fn int(v: i32) -> Expr {
        Expr::literal(Value::Integer(v))
    }

    fn resolver() -> Resolver<'static> {
        Resolver::new(ResolverConfig::new(), SessionContext::default())
    }

    #[test]
    fn test_record() {
        let mut stats = ResolutionStats::default();
        stats.record(Coercion::Cast);
        stats.record(Coercion::Deferred);
        stats.record(Coercion::Elements(3));
        stats.record(Coercion::Unchanged);
        stats.folds = 2;
        assert_eq!(stats.casts_inserted, 4);
        assert_eq!(stats.domains_deferred, 1);
        assert_eq!(stats.replacements(), 6);
    }

    #[test]
    fn test_nested_folding() {
        // (1 + 2) * 3
        let mut expr = Expr::binary(
            OperatorId::Times,
            Expr::binary(OperatorId::Plus, int(1), int(2)),
            int(3),
        );
        let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);
        assert!(diagnostics.is_empty());
        assert_eq!(expr.literal_value(), Some(&Value::Integer(9)));
        assert_eq!(expr.resolved_type, TypeTag::Integer);
        assert_eq!(stats.folds, 2);
    }

    #[test]
    fn test_errors_poison_the_parent_only_once() {
        // (1 / 0) + a
        let mut expr = Expr::binary(
            OperatorId::Plus,
            Expr::binary(OperatorId::Divide, int(1), int(0)).with_position(Position::new(1, 8)),
            Expr::column("a", Domain::of(TypeTag::Integer)),
        );
        let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
        assert_eq!(diagnostics.error_count(), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.position, Position::new(1, 8));
        assert_eq!(diagnostic.code, "E0202");
        assert_eq!(expr.resolved_type, TypeTag::None);
        assert_eq!(expr.args()[0].op(), Some(OperatorId::Divide));
    }

    #[test]
    fn test_siblings_report_independently() {
        let date = Expr::column("d", Domain::of(TypeTag::Date));
        let time = Expr::column("t", Domain::of(TypeTag::Time));
        let mut expr = Expr::binary(
            OperatorId::And,
            Expr::binary(OperatorId::Eq, date.clone(), time.clone()),
            Expr::binary(OperatorId::Lt, time, date),
        );
        let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
        assert_eq!(diagnostics.error_count(), 2);
        assert!(diagnostics.iter().all(|d| d.code == "E0101"));
        assert_eq!(expr.resolved_type, TypeTag::None);
    }

    #[test]
    fn test_user_cast() {
        let mut expr = Expr::cast(int(7), Domain::of(TypeTag::VarChar));
        let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);
        assert!(diagnostics.is_empty());
        assert_eq!(expr.literal_value(), Some(&Value::String("7".into())));
        assert_eq!(stats.folds, 1);

        let mut expr = Expr::cast(
            Expr::column("d", Domain::of(TypeTag::Date)),
            Domain::of(TypeTag::Time),
        );
        let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
        assert_eq!(diagnostics.iter().next().map(|d| d.code), Some("E0102"));
    }

    #[test]
    fn test_chain_resolution() {
        let mut expr = Expr::chain(
            OperatorId::Coalesce,
            vec![
                Expr::column("a", Domain::of(TypeTag::SmallInt)),
                Expr::column("b", Domain::of(TypeTag::BigInt)),
                int(0),
            ],
        )
        .unwrap();
        let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);
        assert!(diagnostics.is_empty());
        assert_eq!(expr.resolved_type, TypeTag::BigInt);
        assert_eq!(expr.args()[0].resolved_type, TypeTag::BigInt);
        // a is cast; the literal 0 is cast and folded
        assert_eq!(stats.casts_inserted, 2);
        assert_eq!(stats.folds, 1);
        assert_eq!(expr.args()[1].literal_value(), Some(&Value::BigInt(0)));

        let again = resolver().resolve_collecting(&mut expr).0;
        assert_eq!(again.replacements(), 0);
    }
}
