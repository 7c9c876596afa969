//! Promotion rules between concrete types.
//!
//! `common_type` is the join of the type lattice: the narrowest type both
//! operands can be converted to without an explicit cast. NONE is returned
//! when no promotion path exists.

use crate::catalog::OperatorId;
use crate::types::TypeTag;

/// Join of two concrete types.
///
/// NULL and MAYBE are weak: joined with any defined type they yield that type.
/// NONE is absorbing: an absent operand cannot be joined with a present one.
pub fn common_type(t1: TypeTag, t2: TypeTag) -> TypeTag {
    if t1 == t2 {
        return t1;
    }

    match (t1, t2) {
        (TypeTag::None, _) | (_, TypeTag::None) => return TypeTag::None,
        (TypeTag::Null, other) | (other, TypeTag::Null) => return other,
        (TypeTag::Maybe, other) | (other, TypeTag::Maybe) => return other,
        _ => {}
    }

    // An enumeration only equals itself; against anything else it decays to
    // its label type.
    if t1 == TypeTag::Enumeration || t2 == TypeTag::Enumeration {
        return TypeTag::VarChar;
    }

    if t1.is_numeric() && t2.is_numeric() {
        return numeric_join(t1, t2);
    }
    if t1.is_string() && t2.is_string() {
        return string_join(t1, t2);
    }
    if t1.is_bit() && t2.is_bit() {
        return TypeTag::VarBit;
    }
    if t1.is_temporal() && t2.is_temporal() {
        return temporal_join(t1, t2);
    }
    if t1.is_collection() && t2.is_collection() {
        return TypeTag::Multiset;
    }

    if let Some(other) = other_of(t1, t2, TypeTag::is_string) {
        if other.is_numeric() {
            // Strings meet numbers as DOUBLE, unless the number is wider.
            return numeric_join(TypeTag::Double, other);
        }
        if other.is_temporal() {
            return other;
        }
    }

    TypeTag::None
}

/// `common_type` with per-operator exceptions.
pub fn common_type_for_op(t1: TypeTag, op: OperatorId, t2: TypeTag) -> TypeTag {
    match op {
        // Set difference of any two collections is a multiset.
        OperatorId::Minus if t1.is_collection() && t2.is_collection() => TypeTag::Multiset,

        // Integer division stays integral.
        OperatorId::Divide | OperatorId::Div | OperatorId::Mod
            if t1.is_discrete_number() && t2.is_discrete_number() =>
        {
            numeric_join(t1, t2)
        }

        // Arithmetic on two strings is numeric arithmetic.
        OperatorId::Plus | OperatorId::Minus | OperatorId::Times | OperatorId::Divide
            if t1.is_string() && t2.is_string() =>
        {
            TypeTag::Double
        }

        OperatorId::Concat | OperatorId::ConcatWs => concat_type(t1, t2),

        _ => common_type(t1, t2),
    }
}

/// Whether values of the two types can be compared after implicit coercion.
pub fn is_comparable(t1: TypeTag, t2: TypeTag) -> bool {
    common_type(t1, t2) != TypeTag::None
}

/// Whether two types belong to the same family, so a value of one can be
/// represented in the other without crossing families.
pub fn same_family(t1: TypeTag, t2: TypeTag) -> bool {
    (t1.is_numeric() && t2.is_numeric())
        || (t1.is_string() && t2.is_string())
        || (t1.is_bit() && t2.is_bit())
        || (t1.is_temporal() && t2.is_temporal())
        || (t1.is_collection() && t2.is_collection())
        || t1 == t2
}

fn other_of(t1: TypeTag, t2: TypeTag, pred: fn(TypeTag) -> bool) -> Option<TypeTag> {
    if pred(t1) {
        Some(t2)
    } else if pred(t2) {
        Some(t1)
    } else {
        None
    }
}

fn numeric_rank(tag: TypeTag) -> u8 {
    match tag {
        TypeTag::SmallInt => 0,
        TypeTag::Integer => 1,
        TypeTag::BigInt => 2,
        TypeTag::Numeric => 3,
        TypeTag::Float => 4,
        TypeTag::Double => 5,
        TypeTag::Monetary => 6,
        _ => 0,
    }
}

fn numeric_join(t1: TypeTag, t2: TypeTag) -> TypeTag {
    if t1 == TypeTag::Monetary || t2 == TypeTag::Monetary {
        return TypeTag::Monetary;
    }
    // FLOAT cannot hold every NUMERIC digit.
    if (t1 == TypeTag::Numeric && t2.is_approximate_number())
        || (t2 == TypeTag::Numeric && t1.is_approximate_number())
    {
        return TypeTag::Double;
    }
    if numeric_rank(t1) >= numeric_rank(t2) {
        t1
    } else {
        t2
    }
}

fn string_join(t1: TypeTag, t2: TypeTag) -> TypeTag {
    let national = t1.is_national_string() || t2.is_national_string();
    let varying = t1.is_varying() || t2.is_varying() || t1 != t2;
    match (national, varying) {
        (true, true) => TypeTag::VarNChar,
        (true, false) => TypeTag::NChar,
        (false, true) => TypeTag::VarChar,
        (false, false) => TypeTag::Char,
    }
}

fn temporal_join(t1: TypeTag, t2: TypeTag) -> TypeTag {
    match (t1, t2) {
        (TypeTag::Date, TypeTag::Timestamp) | (TypeTag::Timestamp, TypeTag::Date) => {
            TypeTag::Timestamp
        }
        (TypeTag::Date | TypeTag::Timestamp, TypeTag::DateTime)
        | (TypeTag::DateTime, TypeTag::Date | TypeTag::Timestamp) => TypeTag::DateTime,
        _ => TypeTag::None,
    }
}

fn concat_type(t1: TypeTag, t2: TypeTag) -> TypeTag {
    match (t1, t2) {
        (TypeTag::None, _) | (_, TypeTag::None) => TypeTag::None,
        (a, b) if a.is_string() && b.is_string() => string_join(a, b),
        (a, b) if a.is_national_string() || b.is_national_string() => TypeTag::VarNChar,
        (a, b) if a.is_collection() || b.is_collection() => TypeTag::None,
        _ => TypeTag::VarChar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_promotion_chain() {
        assert_eq!(common_type(TypeTag::SmallInt, TypeTag::Integer), TypeTag::Integer);
        assert_eq!(common_type(TypeTag::Integer, TypeTag::BigInt), TypeTag::BigInt);
        assert_eq!(common_type(TypeTag::BigInt, TypeTag::Float), TypeTag::Float);
        assert_eq!(common_type(TypeTag::Float, TypeTag::Double), TypeTag::Double);
        assert_eq!(common_type(TypeTag::Numeric, TypeTag::Float), TypeTag::Double);
        assert_eq!(common_type(TypeTag::Integer, TypeTag::Numeric), TypeTag::Numeric);
        assert_eq!(common_type(TypeTag::Double, TypeTag::Monetary), TypeTag::Monetary);
    }

    #[test]
    fn test_join_is_symmetric() {
        for a in TypeTag::ALL {
            for b in TypeTag::ALL {
                assert_eq!(common_type(a, b), common_type(b, a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_weak_elements() {
        assert_eq!(common_type(TypeTag::Null, TypeTag::Date), TypeTag::Date);
        assert_eq!(common_type(TypeTag::Maybe, TypeTag::BigInt), TypeTag::BigInt);
        assert_eq!(common_type(TypeTag::None, TypeTag::Integer), TypeTag::None);
        assert_eq!(common_type(TypeTag::None, TypeTag::None), TypeTag::None);
    }

    #[test]
    fn test_strings() {
        assert_eq!(common_type(TypeTag::Char, TypeTag::VarChar), TypeTag::VarChar);
        assert_eq!(common_type(TypeTag::Char, TypeTag::NChar), TypeTag::VarNChar);
        assert_eq!(common_type(TypeTag::VarChar, TypeTag::Integer), TypeTag::Double);
        assert_eq!(common_type(TypeTag::Char, TypeTag::Monetary), TypeTag::Monetary);
        assert_eq!(common_type(TypeTag::VarChar, TypeTag::Date), TypeTag::Date);
    }

    #[test]
    fn test_enumeration_decays_to_varchar() {
        assert_eq!(
            common_type(TypeTag::Enumeration, TypeTag::Enumeration),
            TypeTag::Enumeration
        );
        assert_eq!(common_type(TypeTag::Enumeration, TypeTag::Char), TypeTag::VarChar);
        assert_eq!(common_type(TypeTag::Integer, TypeTag::Enumeration), TypeTag::VarChar);
    }

    #[test]
    fn test_no_path() {
        assert_eq!(common_type(TypeTag::Date, TypeTag::Integer), TypeTag::None);
        assert_eq!(common_type(TypeTag::Time, TypeTag::Date), TypeTag::None);
        assert_eq!(common_type(TypeTag::Blob, TypeTag::VarChar), TypeTag::None);
        assert!(!is_comparable(TypeTag::Logical, TypeTag::Set));
    }

    #[test]
    fn test_operator_exceptions() {
        assert_eq!(
            common_type_for_op(TypeTag::Set, OperatorId::Minus, TypeTag::Set),
            TypeTag::Multiset
        );
        assert_eq!(
            common_type_for_op(TypeTag::Set, OperatorId::Plus, TypeTag::Set),
            TypeTag::Set
        );
        assert_eq!(
            common_type_for_op(TypeTag::Integer, OperatorId::Divide, TypeTag::SmallInt),
            TypeTag::Integer
        );
        assert_eq!(
            common_type_for_op(TypeTag::VarChar, OperatorId::Plus, TypeTag::Char),
            TypeTag::Double
        );
        assert_eq!(
            common_type_for_op(TypeTag::Integer, OperatorId::Concat, TypeTag::Char),
            TypeTag::VarChar
        );
    }
}
