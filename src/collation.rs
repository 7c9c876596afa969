//! Collation resolution for collation-sensitive operators.
//!
//! Each string operand holds its collation at a coercibility level. The
//! operands at the lowest level decide the collation and must agree on it.
//! Two different multi-byte codesets never mix. Losers adopt the winning
//! collation, by a CAST when their codeset changes and in place otherwise.

use log::debug;

use crate::catalog::OperatorId;
use crate::config::SessionContext;
use crate::driver::ResolutionStats;
use crate::error::{SemanticError, SemanticResult};
use crate::expression::{replace_with, Expr, ExprKind};
use crate::types::{CoercibilityLevel, CollationId, Codeset, DataTypeDescriptor, Domain, TypeTag};

/// The collation an operand contributes and how firmly it holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandCollation {
    pub collation: CollationId,
    pub codeset: Codeset,
    pub level: CoercibilityLevel,
}

impl OperandCollation {
    pub fn new(collation: CollationId, level: CoercibilityLevel) -> Self {
        Self {
            collation,
            codeset: collation.codeset(),
            level,
        }
    }
}

/// Collation of `node`, or `None` if its type carries none.
///
/// Late-bound nodes and nodes without a declared collation use the session
/// default.
pub fn get_collation(node: &Expr, session: &SessionContext) -> Option<OperandCollation> {
    let tag = node.resolved_type;
    if !tag.has_collation() && tag != TypeTag::Maybe {
        return None;
    }

    let level = if node.collate_modifier.is_some() {
        CoercibilityLevel::ExplicitCollate
    } else if node.is_column() {
        CoercibilityLevel::ColumnReference
    } else {
        match node.kind {
            ExprKind::Literal(_) => CoercibilityLevel::LiteralValue,
            ExprKind::HostParameter { .. } => CoercibilityLevel::HostParameter,
            _ if tag == TypeTag::Maybe => CoercibilityLevel::HostParameter,
            _ => CoercibilityLevel::ExpressionResult,
        }
    };

    let collation = node
        .collate_modifier
        .or_else(|| node.descriptor.as_ref().and_then(|d| d.collation))
        .or_else(|| node.expected_domain.as_ref().and_then(Domain::collation))
        .unwrap_or(session.default_collation);
    Some(OperandCollation::new(collation, level))
}

/// The collation every operand must adopt.
///
/// The result does not depend on operand order.
pub fn common_collation(op: OperatorId, operands: &[OperandCollation]) -> SemanticResult<OperandCollation> {
    let conflict = || SemanticError::CollationConflict {
        op,
        collations: operands.iter().map(|o| o.collation).collect(),
    };

    let Some(level) = operands.iter().map(|o| o.level).min() else {
        return Err(SemanticError::internal(format!("{op}: no collation operands")));
    };

    let mut multibyte = operands.iter().map(|o| o.codeset).filter(|c| c.is_multibyte());
    if let Some(first) = multibyte.next() {
        if multibyte.any(|c| c != first) {
            return Err(conflict());
        }
    }

    let mut decisive = operands.iter().filter(|o| o.level == level);
    let Some(winner) = decisive.next().copied() else {
        return Err(SemanticError::internal(format!("{op}: no operand at {level:?}")));
    };
    if decisive.any(|o| o.collation != winner.collation) {
        return Err(conflict());
    }
    Ok(winner)
}

/// Unify the collations of `operands` under `op`.
///
/// Returns the winning collation, or `None` if no operand carries one.
pub fn apply(
    op: OperatorId,
    mut operands: Vec<&mut Expr>,
    session: &SessionContext,
    stats: &mut ResolutionStats,
) -> SemanticResult<Option<CollationId>> {
    let found: Vec<(usize, OperandCollation)> = operands
        .iter()
        .enumerate()
        .filter_map(|(i, node)| get_collation(node, session).map(|c| (i, c)))
        .collect();
    if found.is_empty() {
        return Ok(None);
    }

    let collations: Vec<OperandCollation> = found.iter().map(|(_, c)| *c).collect();
    let winner = common_collation(op, &collations)?;

    for (i, current) in found {
        if current.collation == winner.collation {
            continue;
        }
        let node = &mut operands[i];
        debug!(
            "{}: {} takes collation {} from {}",
            node.position, node, winner.collation, current.collation
        );
        adopt(node, current, winner, stats);
    }
    Ok(Some(winner.collation))
}

/// Give `node`, which currently holds `current`, the winning collation.
fn adopt(node: &mut Expr, current: OperandCollation, winner: OperandCollation, stats: &mut ResolutionStats) {
    let tag = node.resolved_type;
    if tag == TypeTag::Maybe {
        if let Some(expected) = node.expected_domain.as_mut() {
            if expected.tag.has_collation() {
                descriptor_for(&mut expected.descriptor, expected.tag).set_collation(winner.collation);
            }
        }
        return;
    }

    if node.collate_modifier.is_some() {
        node.collate_modifier = Some(winner.collation);
    }
    if current.codeset != winner.codeset {
        let mut descriptor = node
            .descriptor
            .clone()
            .or_else(|| DataTypeDescriptor::default_for(tag))
            .unwrap_or_default();
        descriptor.set_collation(winner.collation);
        replace_with(node, |old| Expr::cast(old, Domain::new(tag, descriptor)));
        stats.casts_inserted += 1;
    } else {
        descriptor_for(&mut node.descriptor, tag).set_collation(winner.collation);
    }
}

fn descriptor_for(slot: &mut Option<DataTypeDescriptor>, tag: TypeTag) -> &mut DataTypeDescriptor {
    slot.get_or_insert_with(|| DataTypeDescriptor::default_for(tag).unwrap_or_default())
}

/// Unify the collations of an operation's arguments and stamp the result.
pub fn resolve_node(
    node: &mut Expr,
    session: &SessionContext,
    stats: &mut ResolutionStats,
) -> SemanticResult<()> {
    let Some(op) = node.op() else {
        return Ok(());
    };
    if !op.is_collation_sensitive() {
        return Ok(());
    }

    let operands: Vec<&mut Expr> = match node.args_mut() {
        Some(args) => args.iter_mut().collect(),
        None => return Ok(()),
    };
    let Some(winner) = apply(op, operands, session, stats)? else {
        return Ok(());
    };
    stamp_result(node, op, winner);
    Ok(())
}

/// Give a collation-carrying result the unified collation.
pub fn stamp_result(node: &mut Expr, op: OperatorId, collation: CollationId) {
    if op.result_carries_collation() && node.resolved_type.has_collation() {
        let tag = node.resolved_type;
        descriptor_for(&mut node.descriptor, tag).set_collation(collation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn string_column(name: &str, collation: CollationId) -> Expr {
        Expr::column(
            name,
            Domain::new(TypeTag::VarChar, DataTypeDescriptor::string(20, collation)),
        )
    }

    fn literal(text: &str, collation: CollationId) -> Expr {
        Expr::literal(Value::String(text.into()))
            .with_descriptor(DataTypeDescriptor::string(text.len() as u32, collation))
    }

    #[test]
    fn test_levels() {
        let session = SessionContext::default();
        let column = string_column("a", CollationId::UTF8_EN_CI);
        assert_eq!(
            get_collation(&column, &session),
            Some(OperandCollation::new(
                CollationId::UTF8_EN_CI,
                CoercibilityLevel::ColumnReference
            ))
        );

        let bare = Expr::literal(Value::String("x".into()));
        let collation = get_collation(&bare, &session).unwrap();
        assert_eq!(collation.collation, session.default_collation);
        assert_eq!(collation.level, CoercibilityLevel::LiteralValue);

        let explicit = bare.clone().with_collate(CollationId::UTF8_BIN);
        assert_eq!(
            get_collation(&explicit, &session).unwrap().level,
            CoercibilityLevel::ExplicitCollate
        );

        assert_eq!(
            get_collation(&Expr::parameter(0), &session).unwrap().level,
            CoercibilityLevel::HostParameter
        );
        assert_eq!(get_collation(&Expr::literal(Value::Integer(1)), &session), None);
    }

    #[test]
    fn test_literal_yields_to_column() {
        let session = SessionContext::default();
        let mut stats = ResolutionStats::default();
        let mut column = string_column("a", CollationId::UTF8_EN_CI);
        let mut text = literal("abc", CollationId::UTF8_BIN);

        let winner = apply(OperatorId::Eq, vec![&mut text, &mut column], &session, &mut stats).unwrap();
        assert_eq!(winner, Some(CollationId::UTF8_EN_CI));
        assert_eq!(text.domain().collation(), Some(CollationId::UTF8_EN_CI));
        assert!(text.is_literal());
        assert_eq!(stats.casts_inserted, 0);
    }

    #[test]
    fn test_codeset_change_casts() {
        let session = SessionContext::default();
        let mut stats = ResolutionStats::default();
        let mut column = string_column("a", CollationId::ISO88591_EN_CI);
        let mut text = literal("abc", CollationId::UTF8_BIN);

        apply(OperatorId::Eq, vec![&mut column, &mut text], &session, &mut stats).unwrap();
        assert_eq!(stats.casts_inserted, 1);
        assert!(matches!(text.kind, ExprKind::Cast { .. }));
        assert_eq!(text.domain().collation(), Some(CollationId::ISO88591_EN_CI));
    }

    #[test]
    fn test_bare_literal_is_cast_to_column_codeset() {
        let session = SessionContext::default();
        let mut stats = ResolutionStats::default();
        let mut column = string_column("a", CollationId::ISO88591_EN_CI);
        let mut text = Expr::literal(Value::String("abc".into()));

        apply(OperatorId::Concat, vec![&mut column, &mut text], &session, &mut stats).unwrap();
        assert_eq!(stats.casts_inserted, 1);
        assert!(matches!(text.kind, ExprKind::Cast { .. }));
        assert_eq!(text.domain().collation(), Some(CollationId::ISO88591_EN_CI));
        assert_eq!(text.domain().descriptor.and_then(|d| d.codeset), Some(Codeset::Iso88591));
    }

    #[test]
    fn test_equal_levels_conflict() {
        let session = SessionContext::default();
        let mut stats = ResolutionStats::default();
        let mut a = string_column("a", CollationId::UTF8_EN_CI);
        let mut b = string_column("b", CollationId::UTF8_EN_CS);

        let err = apply(OperatorId::Lt, vec![&mut a, &mut b], &session, &mut stats).unwrap_err();
        assert_eq!(
            err,
            SemanticError::CollationConflict {
                op: OperatorId::Lt,
                collations: vec![CollationId::UTF8_EN_CI, CollationId::UTF8_EN_CS],
            }
        );
    }

    #[test]
    fn test_explicit_collate_wins() {
        let session = SessionContext::default();
        let mut stats = ResolutionStats::default();
        let mut a = string_column("a", CollationId::UTF8_EN_CI);
        let mut b = string_column("b", CollationId::UTF8_EN_CS).with_collate(CollationId::UTF8_BIN);

        let winner = apply(OperatorId::Eq, vec![&mut a, &mut b], &session, &mut stats).unwrap();
        assert_eq!(winner, Some(CollationId::UTF8_BIN));
        assert_eq!(a.domain().collation(), Some(CollationId::UTF8_BIN));
    }

    #[test]
    fn test_multibyte_codesets_never_mix() {
        let operands = [
            OperandCollation::new(CollationId::EUCKR_BIN, CoercibilityLevel::ColumnReference),
            OperandCollation::new(CollationId::UTF8_BIN, CoercibilityLevel::LiteralValue),
        ];
        assert!(matches!(
            common_collation(OperatorId::Concat, &operands),
            Err(SemanticError::CollationConflict { .. })
        ));
    }

    #[test]
    fn test_operand_order_does_not_matter() {
        let column = OperandCollation::new(CollationId::UTF8_EN_CI, CoercibilityLevel::ColumnReference);
        let a = OperandCollation::new(CollationId::UTF8_BIN, CoercibilityLevel::LiteralValue);
        let b = OperandCollation::new(CollationId::UTF8_EN_CS, CoercibilityLevel::LiteralValue);

        for operands in [[column, a, b], [a, b, column], [a, column, b]] {
            assert_eq!(common_collation(OperatorId::Concat, &operands), Ok(column));
        }

        let c = OperandCollation::new(CollationId::UTF8_EN_CS, CoercibilityLevel::ColumnReference);
        for operands in [[column, a, c], [a, c, column]] {
            assert!(matches!(
                common_collation(OperatorId::Concat, &operands),
                Err(SemanticError::CollationConflict { .. })
            ));
        }
    }

    #[test]
    fn test_result_carries_collation() {
        let session = SessionContext::default();
        let mut stats = ResolutionStats::default();
        let mut node = Expr::binary(
            OperatorId::Concat,
            string_column("a", CollationId::UTF8_EN_CI),
            Expr::literal(Value::String("x".into())),
        );
        node.resolved_type = TypeTag::VarChar;
        resolve_node(&mut node, &session, &mut stats).unwrap();
        assert_eq!(node.domain().collation(), Some(CollationId::UTF8_EN_CI));
        assert_eq!(node.args()[1].domain().collation(), Some(CollationId::UTF8_EN_CI));
    }
}
