//! Bottom-up tree walk with slot rebinding.

use crate::catalog::OperatorId;
use crate::expression::Expr;

/// Outcome of a visitor hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    Unchanged,
    /// Substitute this node for the visited one. The old node is dropped
    /// once the slot is rebound.
    Replaced(Expr),
}

/// Per-node hooks driven by [`walk`].
///
/// `parent` is the operator of the enclosing operation, if any.
pub trait Visitor {
    /// Called before the node's children are visited.
    fn pre(&mut self, _node: &mut Expr, _parent: Option<OperatorId>) -> Rewrite {
        Rewrite::Unchanged
    }

    /// Called after every child has been visited and rebound.
    fn post(&mut self, node: &mut Expr, parent: Option<OperatorId>) -> Rewrite;
}

/// Walk `root` depth first, children before parents.
pub fn walk<V: Visitor + ?Sized>(root: &mut Expr, visitor: &mut V) {
    visit(root, None, visitor);
}

fn visit<V: Visitor + ?Sized>(node: &mut Expr, parent: Option<OperatorId>, visitor: &mut V) {
    if let Rewrite::Replaced(replacement) = visitor.pre(node, parent) {
        *node = replacement;
    }

    let op = node.op();
    for child in node.children_mut() {
        visit(child, op, visitor);
    }

    if let Rewrite::Replaced(replacement) = visitor.post(node, parent) {
        *node = replacement;
    }
}

/// Move the node out of `slot`, transform it, and put the result back.
pub fn replace_with(slot: &mut Expr, transform: impl FnOnce(Expr) -> Expr) {
    let old = std::mem::take(slot);
    *slot = transform(old);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Domain, TypeTag};
    use crate::value::Value;

    /// Records visit order and doubles integer literals.
    struct Doubler {
        order: Vec<String>,
    }

    impl Visitor for Doubler {
        fn post(&mut self, node: &mut Expr, _parent: Option<OperatorId>) -> Rewrite {
            self.order.push(node.to_string());
            match node.literal_value() {
                Some(Value::Integer(v)) => Rewrite::Replaced(Expr::literal(Value::Integer(v * 2))),
                _ => Rewrite::Unchanged,
            }
        }
    }

    #[test]
    fn test_children_before_parent() {
        let mut expr = Expr::binary(
            OperatorId::Plus,
            Expr::literal(Value::Integer(1)),
            Expr::column("a", Domain::of(TypeTag::Integer)),
        );
        let mut visitor = Doubler { order: Vec::new() };
        walk(&mut expr, &mut visitor);

        assert_eq!(visitor.order, vec!["1", "a", "(2 + a)"]);
        assert_eq!(expr.args()[0].literal_value(), Some(&Value::Integer(2)));
    }

    struct Parents(Vec<Option<OperatorId>>);

    impl Visitor for Parents {
        fn post(&mut self, _node: &mut Expr, parent: Option<OperatorId>) -> Rewrite {
            self.0.push(parent);
            Rewrite::Unchanged
        }
    }

    #[test]
    fn test_parent_operator_is_passed() {
        let mut expr = Expr::unary(
            OperatorId::Not,
            Expr::unary(OperatorId::IsNull, Expr::parameter(0)),
        );
        let mut visitor = Parents(Vec::new());
        walk(&mut expr, &mut visitor);
        assert_eq!(
            visitor.0,
            vec![Some(OperatorId::IsNull), Some(OperatorId::Not), None]
        );
    }

    #[test]
    fn test_replace_with_moves_the_node() {
        let mut slot = Expr::column("a", Domain::of(TypeTag::Integer));
        replace_with(&mut slot, |old| Expr::cast(old, Domain::of(TypeTag::BigInt)));
        assert_eq!(slot.resolved_type, TypeTag::BigInt);
        assert!(slot.is_column());
    }
}
