//! Concrete type tags.

use std::fmt;
use std::str::FromStr;

/// Concrete type carried by a resolved expression node.
///
/// Parameters such as precision, length, codeset and element lists live in
/// the node's [`DataTypeDescriptor`](crate::types::DataTypeDescriptor); the tag
/// only names the family member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// Absent or untyped. Also the poison value after a resolution error.
    None,
    /// Type of the NULL literal.
    Null,
    /// Not yet decidable (unbound host parameter, correlated subquery).
    Maybe,

    // Numeric
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Numeric,
    Monetary,

    // Character strings
    Char,
    VarChar,
    NChar,
    VarNChar,

    // Bit strings
    Bit,
    VarBit,

    // Temporal
    Date,
    Time,
    Timestamp,
    DateTime,

    Logical,
    Object,
    Enumeration,

    // Collections
    Set,
    Multiset,
    Sequence,

    // Large objects
    Blob,
    Clob,
}

impl TypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [TypeTag; 28] = [
        TypeTag::None,
        TypeTag::Null,
        TypeTag::Maybe,
        TypeTag::SmallInt,
        TypeTag::Integer,
        TypeTag::BigInt,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::Numeric,
        TypeTag::Monetary,
        TypeTag::Char,
        TypeTag::VarChar,
        TypeTag::NChar,
        TypeTag::VarNChar,
        TypeTag::Bit,
        TypeTag::VarBit,
        TypeTag::Date,
        TypeTag::Time,
        TypeTag::Timestamp,
        TypeTag::DateTime,
        TypeTag::Logical,
        TypeTag::Object,
        TypeTag::Enumeration,
        TypeTag::Set,
        TypeTag::Multiset,
        TypeTag::Sequence,
        TypeTag::Blob,
        TypeTag::Clob,
    ];

    pub fn is_sentinel(self) -> bool {
        matches!(self, TypeTag::None | TypeTag::Null | TypeTag::Maybe)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeTag::SmallInt
                | TypeTag::Integer
                | TypeTag::BigInt
                | TypeTag::Float
                | TypeTag::Double
                | TypeTag::Numeric
                | TypeTag::Monetary
        )
    }

    pub fn is_discrete_number(self) -> bool {
        matches!(self, TypeTag::SmallInt | TypeTag::Integer | TypeTag::BigInt)
    }

    pub fn is_approximate_number(self) -> bool {
        matches!(self, TypeTag::Float | TypeTag::Double)
    }

    /// CHAR, VARCHAR, NCHAR or VARNCHAR.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            TypeTag::Char | TypeTag::VarChar | TypeTag::NChar | TypeTag::VarNChar
        )
    }

    pub fn is_char_string(self) -> bool {
        matches!(self, TypeTag::Char | TypeTag::VarChar)
    }

    pub fn is_national_string(self) -> bool {
        matches!(self, TypeTag::NChar | TypeTag::VarNChar)
    }

    pub fn is_varying(self) -> bool {
        matches!(self, TypeTag::VarChar | TypeTag::VarNChar | TypeTag::VarBit)
    }

    pub fn is_bit(self) -> bool {
        matches!(self, TypeTag::Bit | TypeTag::VarBit)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            TypeTag::Date | TypeTag::Time | TypeTag::Timestamp | TypeTag::DateTime
        )
    }

    /// Temporal types that carry a calendar date component.
    pub fn has_date_part(self) -> bool {
        matches!(self, TypeTag::Date | TypeTag::Timestamp | TypeTag::DateTime)
    }

    pub fn is_collection(self) -> bool {
        matches!(self, TypeTag::Set | TypeTag::Multiset | TypeTag::Sequence)
    }

    pub fn is_lob(self) -> bool {
        matches!(self, TypeTag::Blob | TypeTag::Clob)
    }

    /// Types whose values carry a codeset and collation.
    pub fn has_collation(self) -> bool {
        self.is_string() || self == TypeTag::Enumeration || self == TypeTag::Clob
    }

    /// Scalar, non-object, non-collection value types.
    pub fn is_primitive(self) -> bool {
        !self.is_sentinel() && !self.is_collection() && self != TypeTag::Object
    }

    /// Declared types that a user may cast to.
    pub fn is_castable_target(self) -> bool {
        !self.is_sentinel() && self != TypeTag::Logical
    }

    /// Canonical SQL spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::None => "NONE",
            TypeTag::Null => "NULL",
            TypeTag::Maybe => "MAYBE",
            TypeTag::SmallInt => "SMALLINT",
            TypeTag::Integer => "INTEGER",
            TypeTag::BigInt => "BIGINT",
            TypeTag::Float => "FLOAT",
            TypeTag::Double => "DOUBLE",
            TypeTag::Numeric => "NUMERIC",
            TypeTag::Monetary => "MONETARY",
            TypeTag::Char => "CHAR",
            TypeTag::VarChar => "VARCHAR",
            TypeTag::NChar => "NCHAR",
            TypeTag::VarNChar => "VARNCHAR",
            TypeTag::Bit => "BIT",
            TypeTag::VarBit => "VARBIT",
            TypeTag::Date => "DATE",
            TypeTag::Time => "TIME",
            TypeTag::Timestamp => "TIMESTAMP",
            TypeTag::DateTime => "DATETIME",
            TypeTag::Logical => "LOGICAL",
            TypeTag::Object => "OBJECT",
            TypeTag::Enumeration => "ENUM",
            TypeTag::Set => "SET",
            TypeTag::Multiset => "MULTISET",
            TypeTag::Sequence => "SEQUENCE",
            TypeTag::Blob => "BLOB",
            TypeTag::Clob => "CLOB",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a type name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type name: {0}")]
pub struct UnknownTypeName(pub String);

impl FromStr for TypeTag {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let tag = match upper.as_str() {
            "NONE" => TypeTag::None,
            "NULL" => TypeTag::Null,
            "MAYBE" | "?" => TypeTag::Maybe,
            "SMALLINT" | "SHORT" => TypeTag::SmallInt,
            "INTEGER" | "INT" => TypeTag::Integer,
            "BIGINT" => TypeTag::BigInt,
            "FLOAT" | "REAL" => TypeTag::Float,
            "DOUBLE" | "DOUBLE PRECISION" => TypeTag::Double,
            "NUMERIC" | "DECIMAL" => TypeTag::Numeric,
            "MONETARY" => TypeTag::Monetary,
            "CHAR" | "CHARACTER" => TypeTag::Char,
            "VARCHAR" | "STRING" | "CHAR VARYING" => TypeTag::VarChar,
            "NCHAR" => TypeTag::NChar,
            "VARNCHAR" | "NCHAR VARYING" => TypeTag::VarNChar,
            "BIT" => TypeTag::Bit,
            "VARBIT" | "BIT VARYING" => TypeTag::VarBit,
            "DATE" => TypeTag::Date,
            "TIME" => TypeTag::Time,
            "TIMESTAMP" => TypeTag::Timestamp,
            "DATETIME" => TypeTag::DateTime,
            "LOGICAL" | "BOOLEAN" => TypeTag::Logical,
            "OBJECT" => TypeTag::Object,
            "ENUM" | "ENUMERATION" => TypeTag::Enumeration,
            "SET" => TypeTag::Set,
            "MULTISET" => TypeTag::Multiset,
            "SEQUENCE" | "LIST" => TypeTag::Sequence,
            "BLOB" => TypeTag::Blob,
            "CLOB" => TypeTag::Clob,
            _ => return Err(UnknownTypeName(s.to_string())),
        };
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families_are_disjoint() {
        for tag in TypeTag::ALL {
            let families = [
                tag.is_sentinel(),
                tag.is_numeric(),
                tag.is_string(),
                tag.is_bit(),
                tag.is_temporal(),
                tag.is_collection(),
                tag.is_lob(),
            ];
            assert!(
                families.iter().filter(|f| **f).count() <= 1,
                "{tag} belongs to more than one family"
            );
        }
    }

    #[test]
    fn test_parse_round_trips_display() {
        for tag in TypeTag::ALL {
            assert_eq!(tag.as_str().parse::<TypeTag>().unwrap(), tag);
        }
        assert_eq!("int".parse::<TypeTag>().unwrap(), TypeTag::Integer);
        assert_eq!("string".parse::<TypeTag>().unwrap(), TypeTag::VarChar);
        assert!("widget".parse::<TypeTag>().is_err());
    }

    #[test]
    fn test_logical_is_not_a_cast_target() {
        assert!(!TypeTag::Logical.is_castable_target());
        assert!(!TypeTag::Maybe.is_castable_target());
        assert!(TypeTag::VarChar.is_castable_target());
    }
}
