//! Light rewrites applied before a node's children are resolved.

use crate::catalog::OperatorId;
use crate::expression::walker::Rewrite;
use crate::expression::{Expr, ExprKind};

/// Apply the first matching pre-order rewrite to `node`.
pub fn simplify(node: &mut Expr) -> Rewrite {
    match node.op() {
        Some(OperatorId::UnaryPlus) => elide_unary_plus(node),
        Some(OperatorId::Not) => push_down_not(node),
        _ => Rewrite::Unchanged,
    }
}

/// `+x` is `x` when `x` is already numeric.
fn elide_unary_plus(node: &mut Expr) -> Rewrite {
    let Some(args) = node.args_mut() else {
        return Rewrite::Unchanged;
    };
    if args.len() != 1 || !args[0].resolved_type.is_numeric() {
        return Rewrite::Unchanged;
    }

    let mut operand = std::mem::take(&mut args[0]);
    if operand.alias.is_none() {
        operand.alias = node.alias.take();
    }
    Rewrite::Replaced(operand)
}

/// `NOT a = b` becomes `a <> b`, and likewise for every predicate with a
/// negated form.
fn push_down_not(node: &mut Expr) -> Rewrite {
    let position = node.position;
    let alias = node.alias.take();
    let Some(args) = node.args_mut() else {
        return Rewrite::Unchanged;
    };
    let negated = match args.as_slice() {
        [inner] => inner.op().and_then(OperatorId::negated),
        _ => None,
    };
    let Some(negated) = negated else {
        node.alias = alias;
        return Rewrite::Unchanged;
    };

    let mut inner = std::mem::take(&mut args[0]);
    if let ExprKind::Operation { op, .. } = &mut inner.kind {
        *op = negated;
    }
    inner.position = position;
    inner.alias = alias.or(inner.alias);
    Rewrite::Replaced(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Position;
    use crate::types::{Domain, TypeTag};
    use crate::value::Value;

    fn column(name: &str) -> Expr {
        Expr::column(name, Domain::of(TypeTag::Integer))
    }

    #[test]
    fn test_not_equal() {
        let mut expr = Expr::unary(
            OperatorId::Not,
            Expr::binary(OperatorId::Eq, column("a"), column("b")),
        )
        .with_position(Position::new(1, 1));
        let Rewrite::Replaced(rewritten) = simplify(&mut expr) else {
            panic!("expected a rewrite");
        };
        assert_eq!(rewritten.op(), Some(OperatorId::Ne));
        assert_eq!(rewritten.position, Position::new(1, 1));
        assert_eq!(rewritten.args().len(), 2);
    }

    #[test]
    fn test_not_is_null() {
        let mut expr = Expr::unary(
            OperatorId::Not,
            Expr::unary(OperatorId::IsNull, column("a")),
        );
        let Rewrite::Replaced(rewritten) = simplify(&mut expr) else {
            panic!("expected a rewrite");
        };
        assert_eq!(rewritten.op(), Some(OperatorId::IsNotNull));
    }

    #[test]
    fn test_not_over_non_predicate_is_kept() {
        let mut expr = Expr::unary(OperatorId::Not, column("flag")).with_alias("x");
        assert_eq!(simplify(&mut expr), Rewrite::Unchanged);
        assert_eq!(expr.alias.as_deref(), Some("x"));
        assert_eq!(expr.args().len(), 1);
    }

    #[test]
    fn test_unary_plus() {
        let mut numeric = Expr::unary(OperatorId::UnaryPlus, Expr::literal(Value::Integer(4)))
            .with_alias("four");
        let Rewrite::Replaced(rewritten) = simplify(&mut numeric) else {
            panic!("expected a rewrite");
        };
        assert_eq!(rewritten.literal_value(), Some(&Value::Integer(4)));
        assert_eq!(rewritten.alias.as_deref(), Some("four"));

        let mut text = Expr::unary(
            OperatorId::UnaryPlus,
            Expr::literal(Value::String("4".into())),
        );
        assert_eq!(simplify(&mut text), Rewrite::Unchanged);
    }
}
