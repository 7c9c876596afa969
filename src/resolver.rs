//! Type resolution of operator applications.
//!
//! This module provides:
//! - Overload selection by match score
//! - The symmetric-operator path through a common type
//! - Return type, descriptor and NULL propagation
//! - Comparison, enumeration and membership special cases
//! - Common-type unification over GREATEST/LEAST/COALESCE chains

pub mod chain;
pub mod comparison;
pub mod overload;

use log::debug;

use crate::catalog::{Catalog, OperatorId, Signature, MAX_ARGS};
use crate::coercion::{coerce_argument, infer_common_type, Coercion};
use crate::config::{ResolverConfig, SessionContext};
use crate::driver::ResolutionStats;
use crate::error::{SemanticError, SemanticResult};
use crate::expression::{Expr, ExprKind};
use crate::types::precision::{concat_length, numeric_result, numeric_shape, string_length};
use crate::types::{ArgSpec, CollationId, DataTypeDescriptor, Domain, TypeTag, MAX_VARCHAR_LENGTH};
use crate::value::{Value, ValueEngine};

pub use overload::{is_full_match, resolve};

/// Inputs shared by every resolution step of one walk.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub config: &'a ResolverConfig,
    pub session: &'a SessionContext,
    pub engine: &'a dyn ValueEngine,
}

impl<'a> ResolveContext<'a> {
    pub fn new(config: &'a ResolverConfig, session: &'a SessionContext, engine: &'a dyn ValueEngine) -> Self {
        Self {
            config,
            session,
            engine,
        }
    }

    /// Whether a NULL argument of `op` makes the whole result NULL.
    pub fn propagates_null(&self, op: OperatorId) -> bool {
        !(op.treats_null_specially()
            || (op.is_concat_family() && self.config.oracle_style_empty_string))
    }
}

/// Types of a node's arguments padded with NONE.
pub fn arg_types(node: &Expr) -> SemanticResult<[TypeTag; MAX_ARGS]> {
    let types: Vec<TypeTag> = node.args().iter().map(|a| a.resolved_type).collect();
    overload::slots(&types).ok_or_else(|| {
        node.op()
            .map(|op| overload::not_defined(op, &types))
            .unwrap_or_else(|| SemanticError::internal("argument types of a non-operation"))
    })
}

/// Type the operation `node` in place.
///
/// Picks an overload, converts the arguments to it and sets the node's
/// result type and descriptor. Arguments must already be resolved.
pub fn resolve_operation(
    node: &mut Expr,
    ctx: &ResolveContext<'_>,
    stats: &mut ResolutionStats,
) -> SemanticResult<()> {
    let Some(mut op) = node.op() else {
        return Err(SemanticError::internal(format!("{node} is not an operation")));
    };

    if op == OperatorId::Plus && ctx.config.plus_as_concat && is_string_pair(node.args()) {
        debug!("{}: + over strings read as concatenation", node.position);
        op = OperatorId::Concat;
        if let ExprKind::Operation { op: slot, .. } = &mut node.kind {
            *slot = op;
        }
    }

    if Catalog::global()?.lookup(op).is_none() {
        return Err(SemanticError::UntypedOperator { op });
    }

    let original = arg_types(node)?;
    let signature = match op {
        OperatorId::IsIn | OperatorId::IsNotIn => comparison::resolve_membership(node, op, ctx, stats)?,
        _ => {
            if op.is_comparison() {
                comparison::prepare(node, ctx, stats)?;
            }
            let types = arg_types(node)?;
            if op.is_symmetric() {
                resolve_symmetric(node, op, types, ctx, stats)?
            } else {
                let (signature, index) = resolve(op, &types)?;
                debug!("{}: {op} overload {index} {signature}", node.position);
                coerce_to_signature(node, op, &signature, &types, &[], stats)?;
                signature
            }
        }
    };

    let tag = if original.contains(&TypeTag::Null) && ctx.propagates_null(op) {
        TypeTag::Null
    } else {
        return_type(node, op, &signature, ctx)
    };
    node.resolved_type = tag;
    node.descriptor = result_descriptor(node, op, tag, ctx);
    Ok(())
}

fn is_string_pair(args: &[Expr]) -> bool {
    matches!(args, [l, r] if l.resolved_type.is_string() && r.resolved_type.is_string())
}

/// Resolve an operator whose symmetric slots share one type.
///
/// When the arguments have a concrete common type, the overload is chosen
/// as if every symmetric argument already had it; that overload is accepted
/// only if it then matches fully, in which case the arguments are converted
/// to the common type. Otherwise selection falls back to the actual types.
fn resolve_symmetric(
    node: &mut Expr,
    op: OperatorId,
    types: [TypeTag; MAX_ARGS],
    ctx: &ResolveContext<'_>,
    stats: &mut ResolutionStats,
) -> SemanticResult<Signature> {
    let expected = node.expected_domain.as_ref().map(|d| d.tag);
    let common = infer_common_type(op, &types, expected, ctx.config.compat_mode);

    if !common.is_sentinel() {
        let mut forced = types;
        for &slot in op.symmetric_slots() {
            if forced[slot] != TypeTag::None {
                forced[slot] = common;
            }
        }
        if let Ok((signature, index)) = resolve(op, &forced) {
            if is_full_match(&signature, &forced) {
                debug!(
                    "{}: {op} overload {index} {signature} over common type {common}",
                    node.position
                );
                let args = node.args_mut().into_iter().flatten();
                for (slot, arg) in args.enumerate() {
                    if op.symmetric_slots().contains(&slot) {
                        let target = common_domain(common, arg);
                        stats.record(convert(arg, &target, op, &types)?);
                    }
                }
                coerce_to_signature(node, op, &signature, &types, op.symmetric_slots(), stats)?;
                return Ok(signature);
            }
        }
    } else if common == TypeTag::None && types.iter().any(|t| *t != TypeTag::None) {
        if op.is_comparison() {
            return Err(overload::not_defined(op, &types));
        }
        let (signature, _) = resolve(op, &types)?;
        if is_homogeneous(&signature, op, &types) {
            return Err(overload::not_defined(op, &types));
        }
        coerce_to_signature(node, op, &signature, &types, &[], stats)?;
        return Ok(signature);
    }

    let (signature, index) = resolve(op, &types)?;
    debug!("{}: {op} overload {index} {signature}", node.position);
    coerce_to_signature(node, op, &signature, &types, &[], stats)?;
    Ok(signature)
}

/// Whether the signature declares one and the same spec for every present
/// symmetric slot. Such a signature cannot accept arguments without a
/// common type.
fn is_homogeneous(signature: &Signature, op: OperatorId, types: &[TypeTag; MAX_ARGS]) -> bool {
    let mut specs = op
        .symmetric_slots()
        .iter()
        .filter(|&&slot| types[slot] != TypeTag::None)
        .map(|&slot| signature.arg(slot));
    match specs.next() {
        Some(first) => specs.all(|spec| spec == first),
        None => false,
    }
}

/// Target domain for converting `arg` to `common`.
///
/// Numeric widening keeps the argument's digits and string widening keeps
/// its length and collation.
fn common_domain(common: TypeTag, arg: &Expr) -> Domain {
    let from = arg.domain();
    if common == TypeTag::Numeric && from.tag.is_discrete_number() {
        let (precision, scale) = numeric_shape(&from);
        return Domain::new(common, DataTypeDescriptor::numeric(precision, scale));
    }
    if common.is_string() && from.tag.is_string() {
        if let Some(collation) = from.collation() {
            return Domain::new(
                common,
                DataTypeDescriptor::string(string_length(&from), collation),
            );
        }
    }
    Domain::of(common)
}

/// Convert every argument not in `skip` to the slot spec of `signature`.
fn coerce_to_signature(
    node: &mut Expr,
    op: OperatorId,
    signature: &Signature,
    types: &[TypeTag; MAX_ARGS],
    skip: &[usize],
    stats: &mut ResolutionStats,
) -> SemanticResult<()> {
    let Some(args) = node.args_mut() else {
        return Ok(());
    };
    for (slot, arg) in args.iter_mut().enumerate() {
        if skip.contains(&slot) {
            continue;
        }
        let coercion = match signature.arg(slot) {
            ArgSpec::Concrete(tag) => coerce_to_concrete(arg, tag, op, types)?,
            ArgSpec::Generic(class) => {
                let actual = arg.resolved_type;
                if actual == TypeTag::Null || (actual != TypeTag::Maybe && class.admits(actual)) {
                    Coercion::Unchanged
                } else {
                    match class.default_type() {
                        Some(default) => convert(arg, &Domain::of(default), op, types)?,
                        None if actual == TypeTag::Maybe => Coercion::Unchanged,
                        None => {
                            return Err(SemanticError::CannotCoerce {
                                node: arg.to_string(),
                                target: Domain::of(TypeTag::None),
                            })
                        }
                    }
                }
            }
        };
        stats.record(coercion);
    }
    Ok(())
}

fn coerce_to_concrete(
    arg: &mut Expr,
    tag: TypeTag,
    op: OperatorId,
    types: &[TypeTag; MAX_ARGS],
) -> SemanticResult<Coercion> {
    let actual = arg.resolved_type;
    if actual == tag || actual == TypeTag::Null || tag == TypeTag::None {
        return Ok(Coercion::Unchanged);
    }
    // Truth values are never produced by implicit conversion.
    if tag == TypeTag::Logical && actual != TypeTag::Maybe {
        return Err(overload::not_defined(op, types));
    }
    convert(arg, &Domain::of(tag), op, types)
}

/// `coerce_argument`, reporting an impossible conversion as the operator
/// not being defined on the argument types.
fn convert(
    arg: &mut Expr,
    target: &Domain,
    op: OperatorId,
    types: &[TypeTag; MAX_ARGS],
) -> SemanticResult<Coercion> {
    coerce_argument(arg, target, op).map_err(|err| match err {
        SemanticError::CannotCoerce { .. } => overload::not_defined(op, types),
        other => other,
    })
}

/// Result type of `signature` over the node's converted arguments.
fn return_type(node: &Expr, op: OperatorId, signature: &Signature, ctx: &ResolveContext<'_>) -> TypeTag {
    let class = match signature.ret {
        ArgSpec::Concrete(tag) => return tag,
        ArgSpec::Generic(class) => class,
    };

    let types: Vec<TypeTag> = node.args().iter().map(|a| a.resolved_type).collect();
    if op.is_symmetric() {
        let expected = node.expected_domain.as_ref().map(|d| d.tag);
        let common = infer_common_type(op, &types, expected, ctx.config.compat_mode);
        if !common.is_sentinel() {
            return common;
        }
    }
    if let Some(tag) = types.iter().find(|t| !t.is_sentinel() && class.admits(**t)) {
        return *tag;
    }
    if types.contains(&TypeTag::Maybe) {
        return TypeTag::Maybe;
    }
    class.default_type().unwrap_or(TypeTag::Null)
}

/// Precision, scale, length and collation of the node's result.
fn result_descriptor(
    node: &Expr,
    op: OperatorId,
    tag: TypeTag,
    ctx: &ResolveContext<'_>,
) -> Option<DataTypeDescriptor> {
    let args = node.args();
    match (tag, args) {
        (TypeTag::Numeric, [left, right])
            if matches!(
                op,
                OperatorId::Plus | OperatorId::Minus | OperatorId::Times | OperatorId::Divide
            ) =>
        {
            Some(numeric_result(
                op,
                &left.domain(),
                &right.domain(),
                ctx.config.numeric_division_scale,
            ))
        }
        (tag, _) if tag.is_string() && op.is_concat_family() => {
            let lengths: Vec<u32> = args.iter().map(|a| string_length(&a.domain())).collect();
            Some(DataTypeDescriptor::string(
                concat_length(&lengths),
                first_collation(args).unwrap_or(ctx.session.default_collation),
            ))
        }
        (tag, [_, length, ..]) if tag.is_string() && matches!(op, OperatorId::LPad | OperatorId::RPad) => {
            let declared = match length.literal_value() {
                Some(Value::Null) | None => MAX_VARCHAR_LENGTH,
                Some(value) => value
                    .as_i64()
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0),
            };
            Some(DataTypeDescriptor::string(
                declared,
                first_collation(args).unwrap_or(ctx.session.default_collation),
            ))
        }
        _ => args
            .iter()
            .find(|a| a.resolved_type == tag)
            .and_then(|a| a.descriptor.clone()),
    }
}

fn first_collation(args: &[Expr]) -> Option<CollationId> {
    args.iter().find_map(|a| a.domain().collation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompatMode;
    use crate::value::StandardValueEngine;

    struct Fixture {
        config: ResolverConfig,
        session: SessionContext,
        engine: StandardValueEngine,
    }

    impl Fixture {
        fn new(config: ResolverConfig) -> Self {
            let engine = StandardValueEngine::new(&config);
            Self {
                config,
                session: SessionContext::default(),
                engine,
            }
        }

        fn resolve(&self, node: &mut Expr) -> SemanticResult<ResolutionStats> {
            let ctx = ResolveContext::new(&self.config, &self.session, &self.engine);
            let mut stats = ResolutionStats::default();
            resolve_operation(node, &ctx, &mut stats)?;
            Ok(stats)
        }
    }

    fn column(name: &str, tag: TypeTag) -> Expr {
        Expr::column(name, Domain::of(tag))
    }

    #[test]
    fn test_integer_plus_integer() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::binary(
            OperatorId::Plus,
            column("a", TypeTag::Integer),
            column("b", TypeTag::Integer),
        );
        let stats = fixture.resolve(&mut node).unwrap();
        assert_eq!(node.resolved_type, TypeTag::Integer);
        assert_eq!(stats.casts_inserted, 0);
    }

    #[test]
    fn test_symmetric_widening() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::binary(
            OperatorId::Times,
            column("a", TypeTag::SmallInt),
            column("b", TypeTag::Double),
        );
        let stats = fixture.resolve(&mut node).unwrap();
        assert_eq!(node.resolved_type, TypeTag::Double);
        assert_eq!(stats.casts_inserted, 1);
        assert_eq!(node.to_string(), "(CAST(a AS DOUBLE) * b)");
    }

    #[test]
    fn test_date_plus_integer() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::binary(
            OperatorId::Plus,
            column("d", TypeTag::Date),
            column("n", TypeTag::Integer),
        );
        fixture.resolve(&mut node).unwrap();
        assert_eq!(node.resolved_type, TypeTag::Date);
        assert_eq!(node.to_string(), "(d + n)");
    }

    #[test]
    fn test_date_minus_date() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::binary(
            OperatorId::Minus,
            column("a", TypeTag::Date),
            column("b", TypeTag::Date),
        );
        fixture.resolve(&mut node).unwrap();
        assert_eq!(node.resolved_type, TypeTag::BigInt);
    }

    #[test]
    fn test_no_common_type() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::binary(
            OperatorId::Eq,
            column("d", TypeTag::Date),
            column("n", TypeTag::Integer),
        );
        let err = fixture.resolve(&mut node).unwrap_err();
        assert_eq!(
            err,
            SemanticError::OperatorNotDefined {
                op: OperatorId::Eq,
                arg_types: vec![TypeTag::Date, TypeTag::Integer],
            }
        );

        let mut logical = Expr::binary(
            OperatorId::Plus,
            column("flag", TypeTag::Logical),
            column("n", TypeTag::Integer),
        );
        assert!(matches!(
            fixture.resolve(&mut logical),
            Err(SemanticError::OperatorNotDefined { .. })
        ));
    }

    #[test]
    fn test_mysql_logical_arithmetic() {
        let fixture = Fixture::new(ResolverConfig::new().with_compat_mode(CompatMode::MySql));
        let mut node = Expr::binary(
            OperatorId::Plus,
            column("flag", TypeTag::Logical),
            column("n", TypeTag::SmallInt),
        );
        fixture.resolve(&mut node).unwrap();
        assert_eq!(node.resolved_type, TypeTag::Integer);
    }

    #[test]
    fn test_logical_slot_rejects_numbers() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::binary(
            OperatorId::And,
            column("n", TypeTag::Integer),
            column("flag", TypeTag::Logical),
        );
        assert!(matches!(
            fixture.resolve(&mut node),
            Err(SemanticError::OperatorNotDefined { op: OperatorId::And, .. })
        ));
    }

    #[test]
    fn test_null_propagation() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut plus = Expr::binary(OperatorId::Plus, column("a", TypeTag::Integer), Expr::null());
        fixture.resolve(&mut plus).unwrap();
        assert_eq!(plus.resolved_type, TypeTag::Null);

        let mut nvl = Expr::binary(OperatorId::Nvl, Expr::null(), column("a", TypeTag::Integer));
        fixture.resolve(&mut nvl).unwrap();
        assert_eq!(nvl.resolved_type, TypeTag::Integer);

        let mut is_null = Expr::unary(OperatorId::IsNull, Expr::null());
        fixture.resolve(&mut is_null).unwrap();
        assert_eq!(is_null.resolved_type, TypeTag::Logical);
    }

    #[test]
    fn test_oracle_concat_keeps_type() {
        let concat = |fixture: &Fixture| {
            let mut node = Expr::binary(
                OperatorId::Concat,
                Expr::literal(Value::String("a".into())),
                Expr::null(),
            );
            fixture.resolve(&mut node).unwrap();
            node.resolved_type
        };
        assert_eq!(concat(&Fixture::new(ResolverConfig::new())), TypeTag::Null);
        assert_eq!(
            concat(&Fixture::new(ResolverConfig::new().with_oracle_style_empty_string(true))),
            TypeTag::VarChar
        );
    }

    #[test]
    fn test_plus_as_concat() {
        let build = || {
            Expr::binary(
                OperatorId::Plus,
                column("a", TypeTag::VarChar),
                column("b", TypeTag::Char),
            )
        };

        let mut numeric = build();
        Fixture::new(ResolverConfig::new()).resolve(&mut numeric).unwrap();
        assert_eq!(numeric.op(), Some(OperatorId::Plus));
        assert_eq!(numeric.resolved_type, TypeTag::Double);

        let mut concat = build();
        Fixture::new(ResolverConfig::new().with_plus_as_concat(true))
            .resolve(&mut concat)
            .unwrap();
        assert_eq!(concat.op(), Some(OperatorId::Concat));
        assert_eq!(concat.resolved_type, TypeTag::VarChar);
    }

    #[test]
    fn test_late_bound_arguments() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::binary(OperatorId::Plus, Expr::parameter(0), column("a", TypeTag::Integer));
        let stats = fixture.resolve(&mut node).unwrap();
        assert_eq!(node.resolved_type, TypeTag::Integer);
        assert_eq!(stats.domains_deferred, 1);
        assert_eq!(node.args()[0].expected_domain, Some(Domain::of(TypeTag::Integer)));

        let mut both = Expr::binary(OperatorId::Plus, Expr::parameter(0), Expr::parameter(1));
        fixture.resolve(&mut both).unwrap();
        assert_eq!(both.resolved_type, TypeTag::Maybe);

        let mut expected = Expr::binary(OperatorId::Plus, Expr::parameter(0), Expr::parameter(1));
        expected.expected_domain = Some(Domain::of(TypeTag::BigInt));
        fixture.resolve(&mut expected).unwrap();
        assert_eq!(expected.resolved_type, TypeTag::BigInt);
    }

    #[test]
    fn test_late_bind_sensitive_casts() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::unary(OperatorId::Round, Expr::parameter(0));
        let stats = fixture.resolve(&mut node).unwrap();
        assert_eq!(stats.casts_inserted, 1);
        assert_eq!(node.resolved_type, TypeTag::Double);
    }

    #[test]
    fn test_numeric_result_descriptor() {
        let fixture = Fixture::new(ResolverConfig::new());
        let numeric = |p, s| Domain::new(TypeTag::Numeric, DataTypeDescriptor::numeric(p, s));
        let mut node = Expr::binary(
            OperatorId::Times,
            Expr::column("a", numeric(5, 2)),
            Expr::column("b", numeric(4, 1)),
        );
        fixture.resolve(&mut node).unwrap();
        assert_eq!(node.descriptor, Some(DataTypeDescriptor::numeric(10, 3)));
    }

    #[test]
    fn test_generic_slot_default() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::unary(OperatorId::Upper, column("n", TypeTag::Integer));
        let stats = fixture.resolve(&mut node).unwrap();
        assert_eq!(stats.casts_inserted, 1);
        assert_eq!(node.resolved_type, TypeTag::VarChar);
    }

    #[test]
    fn test_untyped_operator() {
        let fixture = Fixture::new(ResolverConfig::new());
        let mut node = Expr::unary(OperatorId::Cast, column("n", TypeTag::Integer));
        assert_eq!(
            fixture.resolve(&mut node),
            Err(SemanticError::UntypedOperator { op: OperatorId::Cast })
        );
    }
}
