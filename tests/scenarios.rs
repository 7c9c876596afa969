use chrono::NaiveDate;
use sqlsem::catalog::{Catalog, OperatorId};
use sqlsem::coercion::infer_common_type;
use sqlsem::config::CompatMode;
use sqlsem::diagnostics::Position;
use sqlsem::expression::{CollectionKind, Expr, ExprKind};
use sqlsem::resolver::resolve;
use sqlsem::types::{ArgSpec, CollationId, DataTypeDescriptor, Domain, GenericClass, TypeTag};
use sqlsem::value::Value;
use sqlsem::{Resolver, ResolverConfig, SessionContext};

fn resolver() -> Resolver<'static> {
    Resolver::new(ResolverConfig::new(), SessionContext::default())
}

fn int(v: i32) -> Expr {
    Expr::literal(Value::Integer(v))
}

fn text(s: &str) -> Expr {
    Expr::literal(Value::String(s.into()))
}

fn column(name: &str, tag: TypeTag) -> Expr {
    Expr::column(name, Domain::of(tag))
}

#[test]
fn test_scenario_integer_addition() {
    let (signature, index) = resolve(OperatorId::Plus, &[TypeTag::Integer, TypeTag::Integer]).unwrap();
    assert_eq!(index, 0);
    assert_eq!(signature.arg1, ArgSpec::Generic(GenericClass::Number));
    assert_eq!(signature.arg2, ArgSpec::Generic(GenericClass::Number));
    assert_eq!(signature.ret, ArgSpec::Generic(GenericClass::Number));
    assert_eq!(
        infer_common_type(
            OperatorId::Plus,
            &[TypeTag::Integer, TypeTag::Integer],
            None,
            CompatMode::Standard
        ),
        TypeTag::Integer
    );

    let mut expr = Expr::binary(OperatorId::Plus, int(1), int(2));
    let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(stats.folds, 1);
    assert_eq!(expr.literal_value(), Some(&Value::Integer(3)));
    assert_eq!(expr.resolved_type, TypeTag::Integer);
}

#[test]
fn test_scenario_date_plus_integer() {
    let (signature, _) = resolve(OperatorId::Plus, &[TypeTag::Date, TypeTag::Integer]).unwrap();
    assert_eq!(signature.arg1, ArgSpec::Concrete(TypeTag::Date));
    assert_eq!(signature.ret, ArgSpec::Concrete(TypeTag::Date));

    let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut expr = Expr::binary(OperatorId::Plus, Expr::literal(Value::Date(day)), int(5));
    let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(expr.resolved_type, TypeTag::Date);
    assert_eq!(
        expr.literal_value(),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2020, 1, 6).unwrap()))
    );
}

#[test]
fn test_scenario_division_by_zero() {
    let position = Position::new(2, 15);
    let mut expr = Expr::binary(OperatorId::Divide, int(1), int(0)).with_position(position);
    let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);

    assert_eq!(stats.folds, 0);
    assert_eq!(diagnostics.error_count(), 1);
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.position, position);
    assert_eq!(diagnostic.code, "E0202");
    assert_eq!(expr.op(), Some(OperatorId::Divide));
    assert_eq!(expr.resolved_type, TypeTag::None);
}

#[test]
fn test_scenario_concat_with_null() {
    let mut expr = Expr::binary(OperatorId::Concat, text("a"), Expr::null());
    let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(expr.literal_value(), Some(&Value::Null));
    assert_eq!(expr.resolved_type, TypeTag::Null);

    let oracle = Resolver::new(
        ResolverConfig::new().with_oracle_style_empty_string(true),
        SessionContext::default(),
    );
    let mut expr = Expr::binary(OperatorId::Concat, text("a"), Expr::null());
    let (_, diagnostics) = oracle.resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(expr.literal_value(), Some(&Value::String("a".into())));
    assert_eq!(expr.resolved_type, TypeTag::VarChar);
}

#[test]
fn test_scenario_enumeration_comparison() {
    let color = Domain::new(
        TypeTag::Enumeration,
        DataTypeDescriptor::enumeration(
            vec!["red".into(), "green".into(), "blue".into()],
            CollationId::UTF8_BIN,
        ),
    );
    let mut expr = Expr::binary(OperatorId::Eq, Expr::column("c", color), text("green"));
    let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);

    assert!(diagnostics.is_empty());
    assert_eq!(stats.enum_rewrites, 1);
    assert_eq!(stats.casts_inserted, 0);
    assert_eq!(expr.resolved_type, TypeTag::Logical);
    assert!(matches!(expr.args()[0].kind, ExprKind::Column(_)));
    assert_eq!(expr.args()[0].resolved_type, TypeTag::Enumeration);
    assert_eq!(
        expr.args()[1].literal_value(),
        Some(&Value::Enum {
            index: 2,
            label: "green".into()
        })
    );
}

#[test]
fn test_second_pass_replaces_nothing() {
    let name = Expr::column(
        "name",
        Domain::new(TypeTag::VarChar, DataTypeDescriptor::string(20, CollationId::UTF8_EN_CI)),
    );
    // (s + 1.5 > i AND name = 'x') OR ? + 1 < CAST(2 AS BIGINT)
    let mut expr = Expr::binary(
        OperatorId::Or,
        Expr::binary(
            OperatorId::And,
            Expr::binary(
                OperatorId::Gt,
                Expr::binary(
                    OperatorId::Plus,
                    column("s", TypeTag::SmallInt),
                    Expr::literal(Value::Double(1.5)),
                ),
                column("i", TypeTag::Integer),
            ),
            Expr::binary(OperatorId::Eq, name, text("x")),
        ),
        Expr::binary(
            OperatorId::Lt,
            Expr::binary(OperatorId::Plus, Expr::parameter(0), int(1)),
            Expr::cast(int(2), Domain::of(TypeTag::BigInt)),
        ),
    );

    let resolver = resolver();
    let (first, diagnostics) = resolver.resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.into_vec());
    assert!(first.replacements() > 0);
    assert_eq!(expr.resolved_type, TypeTag::Logical);

    let snapshot = expr.clone();
    let (second, diagnostics) = resolver.resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(second.replacements(), 0);
    assert_eq!(expr, snapshot);
}

#[test]
fn test_null_argument_makes_result_null() {
    let cases = vec![
        Expr::binary(OperatorId::Plus, Expr::null(), column("a", TypeTag::Integer)),
        Expr::binary(OperatorId::Times, column("a", TypeTag::Double), Expr::null()),
        Expr::binary(OperatorId::Lt, column("a", TypeTag::Integer), Expr::null()),
        Expr::unary(OperatorId::Upper, Expr::null()),
        Expr::binary(OperatorId::Concat, column("v", TypeTag::VarChar), Expr::null()),
    ];
    for mut expr in cases {
        let shown = expr.to_string();
        let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
        assert!(diagnostics.is_empty(), "{shown}");
        assert_eq!(expr.resolved_type, TypeTag::Null, "{shown}");
    }
}

#[test]
fn test_null_aware_operators_keep_their_type() {
    let mut expr = Expr::unary(OperatorId::IsNull, Expr::null());
    resolver().resolve_collecting(&mut expr);
    assert_eq!(expr.literal_value(), Some(&Value::Logical(true)));

    let mut expr = Expr::binary(OperatorId::Coalesce, Expr::null(), column("a", TypeTag::Integer));
    resolver().resolve_collecting(&mut expr);
    assert_eq!(expr.resolved_type, TypeTag::Integer);
}

#[test]
fn test_column_collation_wins_over_literal() {
    let column = Expr::column(
        "c",
        Domain::new(TypeTag::Char, DataTypeDescriptor::string(10, CollationId::UTF8_EN_CI)),
    );
    let literal = Expr::typed_literal(
        Value::String("abc".into()),
        Domain::new(TypeTag::Char, DataTypeDescriptor::string(3, CollationId::UTF8_BIN)),
    );
    let mut expr = Expr::binary(OperatorId::Eq, literal, column);
    let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);

    assert!(diagnostics.is_empty());
    assert_eq!(stats.casts_inserted, 0);
    assert!(expr.args()[0].is_literal());
    assert_eq!(expr.args()[0].domain().collation(), Some(CollationId::UTF8_EN_CI));
}

#[test]
fn test_literal_is_recoded_for_single_byte_column() {
    let column = Expr::column(
        "c",
        Domain::new(TypeTag::VarChar, DataTypeDescriptor::string(10, CollationId::ISO88591_EN_CI)),
    );
    let mut expr = Expr::binary(OperatorId::Concat, column, text("abc"));
    let resolver = resolver();
    let (stats, diagnostics) = resolver.resolve_collecting(&mut expr);

    assert!(diagnostics.is_empty());
    assert_eq!(stats.casts_inserted, 1);
    assert_eq!(expr.args()[1].domain().collation(), Some(CollationId::ISO88591_EN_CI));
    assert_eq!(expr.domain().collation(), Some(CollationId::ISO88591_EN_CI));

    let (stats, _) = resolver.resolve_collecting(&mut expr);
    assert_eq!(stats.replacements(), 0);
}

#[test]
fn test_concrete_signatures_keep_declared_types() {
    let catalog = Catalog::global().unwrap();
    let resolver = resolver();
    let mut checked = 0;

    for def in catalog.operators() {
        for signature in &def.overloads {
            let declared: Vec<TypeTag> = signature
                .args()
                .into_iter()
                .filter(|spec| !spec.is_none())
                .filter_map(|spec| match spec {
                    ArgSpec::Concrete(tag) => Some(tag),
                    ArgSpec::Generic(_) => None,
                })
                .collect();
            let used = signature.args().into_iter().filter(|spec| !spec.is_none()).count();
            if declared.is_empty() || declared.len() != used {
                continue;
            }

            let operands = declared
                .iter()
                .enumerate()
                .map(|(i, tag)| Expr::column(format!("c{i}"), Domain::of(*tag).or_default_descriptor()))
                .collect();
            let mut expr = Expr::operation(def.op, operands);
            let (_, diagnostics) = resolver.resolve_collecting(&mut expr);

            assert!(diagnostics.is_empty(), "{} {signature}", def.op);
            let actual: Vec<TypeTag> = expr.args().iter().map(|a| a.resolved_type).collect();
            assert_eq!(actual, declared, "{} {signature}", def.op);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_collation_conflict_is_reported() {
    let a = Expr::column(
        "a",
        Domain::new(TypeTag::VarChar, DataTypeDescriptor::string(10, CollationId::UTF8_EN_CI)),
    );
    let b = Expr::column(
        "b",
        Domain::new(TypeTag::VarChar, DataTypeDescriptor::string(10, CollationId::UTF8_EN_CS)),
    );
    let mut expr = Expr::binary(OperatorId::Eq, a, b);
    let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
    assert_eq!(diagnostics.iter().next().map(|d| d.code), Some("E0103"));
    assert_eq!(expr.resolved_type, TypeTag::None);
}

#[test]
fn test_errors_in_siblings_are_all_reported() {
    // (d + t) * (1 / 0), where DATE + TIME has no overload
    let mut expr = Expr::binary(
        OperatorId::Times,
        Expr::binary(
            OperatorId::Plus,
            column("d", TypeTag::Date),
            column("t", TypeTag::Time),
        )
        .with_position(Position::new(1, 1)),
        Expr::binary(OperatorId::Divide, int(1), int(0)).with_position(Position::new(1, 12)),
    );
    let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
    let positions: Vec<Position> = diagnostics.iter().map(|d| d.position).collect();
    assert_eq!(positions, vec![Position::new(1, 1), Position::new(1, 12)]);
    assert_eq!(expr.resolved_type, TypeTag::None);
}

#[test]
fn test_in_list_is_folded() {
    let list = Expr::collection(
        CollectionKind::Sequence,
        vec![int(1), Expr::literal(Value::Double(2.0)), int(3)],
    );
    let mut expr = Expr::binary(OperatorId::IsIn, int(2), list);
    let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(expr.literal_value(), Some(&Value::Logical(true)));
}

#[test]
fn test_greatest_chain_folds() {
    let mut expr = Expr::chain(
        OperatorId::Greatest,
        vec![int(4), Expr::literal(Value::Double(9.5)), int(2)],
    )
    .unwrap();
    let (_, diagnostics) = resolver().resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(expr.resolved_type, TypeTag::Double);
    assert_eq!(expr.literal_value(), Some(&Value::Double(9.5)));
}

#[test]
fn test_late_bound_parameter_is_deferred() {
    let mut expr = Expr::binary(OperatorId::Plus, Expr::parameter(0), column("n", TypeTag::BigInt));
    let (stats, diagnostics) = resolver().resolve_collecting(&mut expr);
    assert!(diagnostics.is_empty());
    assert_eq!(stats.casts_inserted, 0);
    assert_eq!(stats.domains_deferred, 1);
    assert_eq!(
        expr.args()[0].expected_domain.as_ref().map(|d| d.tag),
        Some(TypeTag::BigInt)
    );
    assert_eq!(expr.resolved_type, TypeTag::BigInt);
}
