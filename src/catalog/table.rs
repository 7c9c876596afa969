//! The built-in overload table.
//!
//! Overload order within an operator is significant: a full match is accepted
//! as soon as it is seen, and ties between partial matches go to the earliest
//! overload. Specific overloads therefore precede generic ones.

use crate::catalog::{OperatorDef, OperatorId, Signature};
use crate::types::{ArgSpec, GenericClass, TypeTag};

const __: ArgSpec = ArgSpec::NONE;

const fn t(tag: TypeTag) -> ArgSpec {
    ArgSpec::Concrete(tag)
}

const fn g(class: GenericClass) -> ArgSpec {
    ArgSpec::Generic(class)
}

const INTEGER: ArgSpec = t(TypeTag::Integer);
const BIGINT: ArgSpec = t(TypeTag::BigInt);
const DOUBLE: ArgSpec = t(TypeTag::Double);
const NUMERIC: ArgSpec = t(TypeTag::Numeric);
const VARCHAR: ArgSpec = t(TypeTag::VarChar);
const VARBIT: ArgSpec = t(TypeTag::VarBit);
const DATE: ArgSpec = t(TypeTag::Date);
const TIME: ArgSpec = t(TypeTag::Time);
const TIMESTAMP: ArgSpec = t(TypeTag::Timestamp);
const DATETIME: ArgSpec = t(TypeTag::DateTime);
const LOGICAL: ArgSpec = t(TypeTag::Logical);
const MULTISET: ArgSpec = t(TypeTag::Multiset);
const BLOB: ArgSpec = t(TypeTag::Blob);
const CLOB: ArgSpec = t(TypeTag::Clob);

const NUMBER: ArgSpec = g(GenericClass::Number);
const DISCRETE: ArgSpec = g(GenericClass::DiscreteNumber);
const STRING: ArgSpec = g(GenericClass::String);
const ANY_BIT: ArgSpec = g(GenericClass::Bit);
const ANY_DATE: ArgSpec = g(GenericClass::Date);
const ANY_TEMPORAL: ArgSpec = g(GenericClass::DateTime);
const SEQUENCE: ArgSpec = g(GenericClass::Sequence);
const QUERY: ArgSpec = g(GenericClass::Query);
const PRIMITIVE: ArgSpec = g(GenericClass::Primitive);
const ANY: ArgSpec = g(GenericClass::Any);

const fn f0(ret: ArgSpec) -> Signature {
    Signature::new([__, __, __], ret)
}

const fn f1(a: ArgSpec, ret: ArgSpec) -> Signature {
    Signature::new([a, __, __], ret)
}

const fn f2(a: ArgSpec, b: ArgSpec, ret: ArgSpec) -> Signature {
    Signature::new([a, b, __], ret)
}

const fn f3(a: ArgSpec, b: ArgSpec, c: ArgSpec, ret: ArgSpec) -> Signature {
    Signature::new([a, b, c], ret)
}

/// Temporal value shifted by a number of days (or seconds for TIME).
fn temporal_shift(commutative: bool) -> Vec<Signature> {
    let mut sigs = Vec::new();
    for temporal in [DATE, TIME, TIMESTAMP, DATETIME] {
        sigs.push(f2(temporal, DISCRETE, temporal));
        if commutative {
            sigs.push(f2(DISCRETE, temporal, temporal));
        }
    }
    sigs
}

fn plus() -> Vec<Signature> {
    let mut sigs = vec![f2(NUMBER, NUMBER, NUMBER)];
    sigs.extend(temporal_shift(true));
    sigs.push(f2(SEQUENCE, SEQUENCE, SEQUENCE));
    sigs
}

fn minus() -> Vec<Signature> {
    let mut sigs = vec![f2(NUMBER, NUMBER, NUMBER)];
    sigs.extend(temporal_shift(false));
    for temporal in [DATE, TIME, TIMESTAMP, DATETIME] {
        sigs.push(f2(temporal, temporal, BIGINT));
    }
    sigs.push(f2(SEQUENCE, SEQUENCE, MULTISET));
    sigs
}

fn comparison(with_collections: bool) -> Vec<Signature> {
    let mut sigs = vec![
        f2(NUMBER, NUMBER, LOGICAL),
        f2(STRING, STRING, LOGICAL),
        f2(ANY_BIT, ANY_BIT, LOGICAL),
        f2(ANY_TEMPORAL, ANY_TEMPORAL, LOGICAL),
        f2(LOGICAL, LOGICAL, LOGICAL),
    ];
    if with_collections {
        sigs.push(f2(SEQUENCE, SEQUENCE, LOGICAL));
    }
    sigs.push(f2(PRIMITIVE, PRIMITIVE, LOGICAL));
    sigs
}

fn range() -> Vec<Signature> {
    vec![
        f3(NUMBER, NUMBER, NUMBER, LOGICAL),
        f3(STRING, STRING, STRING, LOGICAL),
        f3(ANY_BIT, ANY_BIT, ANY_BIT, LOGICAL),
        f3(ANY_TEMPORAL, ANY_TEMPORAL, ANY_TEMPORAL, LOGICAL),
        f3(PRIMITIVE, PRIMITIVE, PRIMITIVE, LOGICAL),
    ]
}

fn membership() -> Vec<Signature> {
    vec![
        f2(PRIMITIVE, SEQUENCE, LOGICAL),
        f2(PRIMITIVE, QUERY, LOGICAL),
        f2(PRIMITIVE, PRIMITIVE, LOGICAL),
    ]
}

fn string_to_string() -> Vec<Signature> {
    vec![f1(STRING, STRING)]
}

fn math_unary() -> Vec<Signature> {
    vec![f1(NUMBER, DOUBLE)]
}

fn rounding() -> Vec<Signature> {
    vec![
        f1(NUMBER, NUMBER),
        f2(NUMBER, DISCRETE, NUMBER),
        f2(ANY_DATE, STRING, ANY_DATE),
        f1(ANY_DATE, ANY_DATE),
    ]
}

fn date_part() -> Vec<Signature> {
    vec![f1(ANY_DATE, INTEGER)]
}

fn time_part() -> Vec<Signature> {
    vec![f1(ANY_TEMPORAL, INTEGER)]
}

fn to_temporal(ret: ArgSpec) -> Vec<Signature> {
    vec![f1(STRING, ret), f2(STRING, STRING, ret)]
}

fn bitwise() -> Vec<Signature> {
    vec![f2(DISCRETE, DISCRETE, BIGINT)]
}

fn logical() -> Vec<Signature> {
    vec![f2(LOGICAL, LOGICAL, LOGICAL)]
}

fn pattern() -> Vec<Signature> {
    vec![
        f2(STRING, STRING, LOGICAL),
        f3(STRING, STRING, STRING, LOGICAL),
    ]
}

fn selection() -> Vec<Signature> {
    vec![f2(ANY, ANY, ANY)]
}

fn extremum() -> Vec<Signature> {
    vec![f2(PRIMITIVE, PRIMITIVE, PRIMITIVE)]
}

/// Build the overload lists of every typed operator.
///
/// Operators absent from the returned list (CAST) are typed structurally by
/// the resolver rather than through signatures.
pub(crate) fn operator_defs() -> Vec<OperatorDef> {
    use OperatorId::*;

    let table: Vec<(OperatorId, Vec<Signature>)> = vec![
        // Arithmetic
        (Plus, plus()),
        (Minus, minus()),
        (
            Times,
            vec![f2(NUMBER, NUMBER, NUMBER), f2(SEQUENCE, SEQUENCE, SEQUENCE)],
        ),
        (Divide, vec![f2(NUMBER, NUMBER, NUMBER)]),
        (UnaryMinus, vec![f1(NUMBER, NUMBER)]),
        (UnaryPlus, vec![f1(NUMBER, NUMBER)]),
        (Div, vec![f2(DISCRETE, DISCRETE, DISCRETE)]),
        (
            Mod,
            vec![f2(DISCRETE, DISCRETE, DISCRETE), f2(NUMBER, NUMBER, NUMBER)],
        ),
        (Power, vec![f2(NUMBER, NUMBER, DOUBLE)]),
        (Sqrt, math_unary()),
        (Exp, math_unary()),
        (Ln, math_unary()),
        (Log, vec![f2(NUMBER, NUMBER, DOUBLE), f1(NUMBER, DOUBLE)]),
        (Log2, math_unary()),
        (Log10, math_unary()),
        (Abs, vec![f1(NUMBER, NUMBER)]),
        (Ceil, vec![f1(NUMBER, NUMBER)]),
        (Floor, vec![f1(NUMBER, NUMBER)]),
        (Round, rounding()),
        (Trunc, rounding()),
        (Sign, vec![f1(NUMBER, INTEGER)]),
        (Sin, math_unary()),
        (Cos, math_unary()),
        (Tan, math_unary()),
        (Cot, math_unary()),
        (Asin, math_unary()),
        (Acos, math_unary()),
        (Atan, vec![f1(NUMBER, DOUBLE), f2(NUMBER, NUMBER, DOUBLE)]),
        (Atan2, vec![f2(NUMBER, NUMBER, DOUBLE)]),
        (Degrees, math_unary()),
        (Radians, math_unary()),
        (Pi, vec![f0(DOUBLE)]),
        (Random, vec![f0(INTEGER), f1(DISCRETE, INTEGER)]),
        (DRandom, vec![f0(DOUBLE), f1(DISCRETE, DOUBLE)]),
        // Bitwise
        (BitAnd, bitwise()),
        (BitOr, bitwise()),
        (BitXor, bitwise()),
        (BitNot, vec![f1(DISCRETE, BIGINT)]),
        (BitShiftLeft, bitwise()),
        (BitShiftRight, bitwise()),
        (BitCount, vec![f1(DISCRETE, INTEGER), f1(ANY_BIT, INTEGER)]),
        // Comparison and predicates
        (Eq, comparison(true)),
        (Ne, comparison(true)),
        (Lt, comparison(false)),
        (Le, comparison(false)),
        (Gt, comparison(false)),
        (Ge, comparison(false)),
        (NullSafeEq, comparison(true)),
        (Between, range()),
        (NotBetween, range()),
        (IsIn, membership()),
        (IsNotIn, membership()),
        (Like, pattern()),
        (NotLike, pattern()),
        (RLike, vec![f2(STRING, STRING, LOGICAL)]),
        (NotRLike, vec![f2(STRING, STRING, LOGICAL)]),
        (IsNull, vec![f1(ANY, LOGICAL)]),
        (IsNotNull, vec![f1(ANY, LOGICAL)]),
        // Logical
        (And, logical()),
        (Or, logical()),
        (Xor, logical()),
        (Not, vec![f1(LOGICAL, LOGICAL)]),
        // Character strings
        (Concat, vec![f2(STRING, STRING, STRING)]),
        (
            ConcatWs,
            vec![f3(STRING, STRING, STRING, STRING), f2(STRING, STRING, STRING)],
        ),
        (Lower, string_to_string()),
        (Upper, string_to_string()),
        (CharLength, vec![f1(STRING, INTEGER)]),
        (OctetLength, vec![f1(STRING, INTEGER), f1(ANY_BIT, INTEGER)]),
        (BitLength, vec![f1(STRING, INTEGER), f1(ANY_BIT, INTEGER)]),
        (
            Substring,
            vec![
                f3(STRING, DISCRETE, DISCRETE, STRING),
                f2(STRING, DISCRETE, STRING),
            ],
        ),
        (Position, vec![f2(STRING, STRING, INTEGER)]),
        (
            Instr,
            vec![
                f2(STRING, STRING, INTEGER),
                f3(STRING, STRING, DISCRETE, INTEGER),
            ],
        ),
        (
            Locate,
            vec![
                f2(STRING, STRING, INTEGER),
                f3(STRING, STRING, DISCRETE, INTEGER),
            ],
        ),
        (Trim, vec![f1(STRING, STRING), f2(STRING, STRING, STRING)]),
        (LTrim, vec![f1(STRING, STRING), f2(STRING, STRING, STRING)]),
        (RTrim, vec![f1(STRING, STRING), f2(STRING, STRING, STRING)]),
        (
            LPad,
            vec![
                f3(STRING, DISCRETE, STRING, STRING),
                f2(STRING, DISCRETE, STRING),
            ],
        ),
        (
            RPad,
            vec![
                f3(STRING, DISCRETE, STRING, STRING),
                f2(STRING, DISCRETE, STRING),
            ],
        ),
        (
            Replace,
            vec![
                f3(STRING, STRING, STRING, STRING),
                f2(STRING, STRING, STRING),
            ],
        ),
        (Translate, vec![f3(STRING, STRING, STRING, STRING)]),
        (Repeat, vec![f2(STRING, DISCRETE, STRING)]),
        (Space, vec![f1(DISCRETE, VARCHAR)]),
        (Left, vec![f2(STRING, DISCRETE, STRING)]),
        (Right, vec![f2(STRING, DISCRETE, STRING)]),
        (Reverse, string_to_string()),
        (Ascii, vec![f1(STRING, INTEGER)]),
        (Chr, vec![f1(DISCRETE, VARCHAR)]),
        (Strcmp, vec![f2(STRING, STRING, INTEGER)]),
        (Md5, vec![f1(STRING, VARCHAR)]),
        (Sha1, vec![f1(STRING, VARCHAR)]),
        (
            Hex,
            vec![f1(STRING, VARCHAR), f1(NUMBER, VARCHAR), f1(ANY_BIT, VARCHAR)],
        ),
        (Bin, vec![f1(DISCRETE, VARCHAR)]),
        (ToBase64, vec![f1(STRING, VARCHAR)]),
        (FromBase64, vec![f1(STRING, VARCHAR)]),
        // Date and time
        (SysDate, vec![f0(DATE)]),
        (SysTime, vec![f0(TIME)]),
        (SysTimestamp, vec![f0(TIMESTAMP)]),
        (SysDateTime, vec![f0(DATETIME)]),
        (AddMonths, vec![f2(DATE, DISCRETE, DATE)]),
        (MonthsBetween, vec![f2(DATE, DATE, DOUBLE)]),
        (LastDay, vec![f1(DATE, DATE)]),
        (AddDate, vec![f2(ANY_DATE, DISCRETE, ANY_DATE)]),
        (SubDate, vec![f2(ANY_DATE, DISCRETE, ANY_DATE)]),
        (DateDiff, vec![f2(ANY_DATE, ANY_DATE, INTEGER)]),
        (TimeDiff, vec![f2(ANY_TEMPORAL, ANY_TEMPORAL, TIME)]),
        (Year, date_part()),
        (Month, date_part()),
        (Day, date_part()),
        (Hour, time_part()),
        (Minute, time_part()),
        (Second, time_part()),
        (DayOfWeek, date_part()),
        (DayOfYear, date_part()),
        (Quarter, date_part()),
        (DateFormat, vec![f2(ANY_DATE, STRING, VARCHAR)]),
        (TimeFormat, vec![f2(ANY_TEMPORAL, STRING, VARCHAR)]),
        (
            ToChar,
            vec![
                f2(ANY_TEMPORAL, STRING, VARCHAR),
                f2(NUMBER, STRING, VARCHAR),
                f1(ANY_TEMPORAL, VARCHAR),
                f1(NUMBER, VARCHAR),
            ],
        ),
        (ToDate, to_temporal(DATE)),
        (ToTime, to_temporal(TIME)),
        (ToTimestamp, to_temporal(TIMESTAMP)),
        (ToDateTime, to_temporal(DATETIME)),
        (ToNumber, to_temporal(NUMERIC)),
        (UnixTimestamp, vec![f0(BIGINT), f1(ANY_TEMPORAL, BIGINT)]),
        (FromUnixTime, vec![f1(DISCRETE, DATETIME)]),
        (MakeDate, vec![f2(DISCRETE, DISCRETE, DATE)]),
        (MakeTime, vec![f3(DISCRETE, DISCRETE, DISCRETE, TIME)]),
        // NULL handling and selection
        (Nvl, selection()),
        (Nvl2, vec![f3(ANY, ANY, ANY, ANY)]),
        (IfNull, selection()),
        (Coalesce, selection()),
        (NullIf, selection()),
        (If, vec![f3(LOGICAL, ANY, ANY, ANY)]),
        (Greatest, extremum()),
        (Least, extremum()),
        // Large objects
        (CharToClob, vec![f1(STRING, CLOB)]),
        (ClobToChar, vec![f1(CLOB, VARCHAR)]),
        (BitToBlob, vec![f1(ANY_BIT, BLOB)]),
        (BlobToBit, vec![f1(BLOB, VARBIT)]),
        // Session
        (CurrentUser, vec![f0(VARCHAR)]),
        // Run-time state
        (NextValue, vec![f1(STRING, NUMERIC)]),
        (CurrentValue, vec![f1(STRING, NUMERIC)]),
        (RowCount, vec![f0(INTEGER)]),
        (LastInsertId, vec![f0(NUMERIC)]),
        (
            IndexCardinality,
            vec![f3(STRING, STRING, DISCRETE, INTEGER)],
        ),
        (Exists, vec![f1(ANY, LOGICAL)]),
    ];

    table
        .into_iter()
        .map(|(op, overloads)| OperatorDef::new(op, overloads))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operator_except_cast_is_typed() {
        let defs = operator_defs();
        for op in OperatorId::ALL {
            let found = defs.iter().any(|d| d.op == *op);
            assert_eq!(found, *op != OperatorId::Cast, "{op:?}");
        }
    }

    #[test]
    fn test_no_operator_is_listed_twice() {
        let defs = operator_defs();
        for (i, a) in defs.iter().enumerate() {
            assert!(defs[i + 1..].iter().all(|b| b.op != a.op), "{:?}", a.op);
        }
    }

    #[test]
    fn test_plus_overload_order() {
        let sigs = plus();
        assert_eq!(sigs[0], f2(NUMBER, NUMBER, NUMBER));
        assert_eq!(sigs[1], f2(DATE, DISCRETE, DATE));
        assert_eq!(sigs[2], f2(DISCRETE, DATE, DATE));
        assert_eq!(sigs.last(), Some(&f2(SEQUENCE, SEQUENCE, SEQUENCE)));
    }

    #[test]
    fn test_no_signature_uses_more_slots_than_arguments() {
        for def in operator_defs() {
            for sig in &def.overloads {
                // Used slots are contiguous from the first.
                let args = sig.args();
                let arity = sig.arity();
                assert!(args[..arity].iter().all(|a| !a.is_none()), "{:?}", def.op);
                assert!(args[arity..].iter().all(|a| a.is_none()), "{:?}", def.op);
                assert!(!sig.ret.is_none(), "{:?}", def.op);
            }
        }
    }
}
