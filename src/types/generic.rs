//! Generic type classes and signature argument specs.

use std::fmt;

use crate::types::TypeTag;

/// A named family of concrete types, usable only inside signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericClass {
    /// Any character string.
    String,
    /// VARCHAR or VARNCHAR.
    StringVarying,
    /// CHAR or VARCHAR.
    Char,
    /// NCHAR or VARNCHAR.
    NChar,
    Bit,
    Number,
    /// SMALLINT, INTEGER or BIGINT.
    DiscreteNumber,
    /// Temporal types with a date component.
    Date,
    /// Any temporal type.
    DateTime,
    Sequence,
    Lob,
    /// Any scalar value type.
    Primitive,
    /// Result of a subquery (a collection of rows).
    Query,
    Any,
}

impl GenericClass {
    /// Whether `concrete` belongs to this class.
    ///
    /// NULL and MAYBE are admitted by every class: neither constrains the
    /// overload choice. NONE belongs to no class.
    pub fn admits(self, concrete: TypeTag) -> bool {
        match concrete {
            TypeTag::None => return false,
            TypeTag::Null | TypeTag::Maybe => return true,
            _ => {}
        }

        match self {
            GenericClass::String => concrete.is_string(),
            GenericClass::StringVarying => {
                matches!(concrete, TypeTag::VarChar | TypeTag::VarNChar)
            }
            GenericClass::Char => concrete.is_char_string(),
            GenericClass::NChar => concrete.is_national_string(),
            GenericClass::Bit => concrete.is_bit(),
            GenericClass::Number => concrete.is_numeric(),
            GenericClass::DiscreteNumber => concrete.is_discrete_number(),
            GenericClass::Date => concrete.has_date_part(),
            GenericClass::DateTime => concrete.is_temporal(),
            GenericClass::Sequence => concrete.is_collection(),
            GenericClass::Lob => concrete.is_lob(),
            GenericClass::Primitive => concrete.is_primitive(),
            GenericClass::Query => concrete.is_collection(),
            GenericClass::Any => true,
        }
    }

    /// Concrete type an unmatched or undecided argument is coerced to.
    ///
    /// `None` means the class has no single representative (ANY, PRIMITIVE):
    /// such slots keep whatever type the argument already has.
    pub fn default_type(self) -> Option<TypeTag> {
        match self {
            GenericClass::String | GenericClass::StringVarying | GenericClass::Char => {
                Some(TypeTag::VarChar)
            }
            GenericClass::NChar => Some(TypeTag::VarNChar),
            GenericClass::Bit => Some(TypeTag::VarBit),
            GenericClass::Number => Some(TypeTag::Double),
            GenericClass::DiscreteNumber => Some(TypeTag::BigInt),
            GenericClass::Date => Some(TypeTag::Date),
            GenericClass::DateTime => Some(TypeTag::DateTime),
            GenericClass::Sequence | GenericClass::Query => Some(TypeTag::Sequence),
            GenericClass::Lob => None,
            GenericClass::Primitive | GenericClass::Any => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenericClass::String => "STRING",
            GenericClass::StringVarying => "STRING_VARYING",
            GenericClass::Char => "CHAR*",
            GenericClass::NChar => "NCHAR*",
            GenericClass::Bit => "BIT*",
            GenericClass::Number => "NUMBER",
            GenericClass::DiscreteNumber => "DISCRETE_NUMBER",
            GenericClass::Date => "DATE*",
            GenericClass::DateTime => "DATETIME*",
            GenericClass::Sequence => "SEQUENCE*",
            GenericClass::Lob => "LOB",
            GenericClass::Primitive => "PRIMITIVE",
            GenericClass::Query => "QUERY",
            GenericClass::Any => "ANY",
        }
    }
}

impl fmt::Display for GenericClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One argument (or return) slot of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgSpec {
    Concrete(TypeTag),
    Generic(GenericClass),
}

impl ArgSpec {
    /// The unused-slot marker.
    pub const NONE: ArgSpec = ArgSpec::Concrete(TypeTag::None);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Whether an argument of type `actual` satisfies this slot exactly
    /// (concrete slot) or by class membership (generic slot).
    pub fn is_equivalent(self, actual: TypeTag) -> bool {
        match self {
            ArgSpec::Concrete(TypeTag::None) => actual == TypeTag::None,
            ArgSpec::Concrete(expected) => {
                expected == actual || matches!(actual, TypeTag::Null | TypeTag::Maybe)
            }
            ArgSpec::Generic(class) => class.admits(actual),
        }
    }

    /// An argument can never fill this slot: the slot is unused but an
    /// argument is present, or the slot is used and the argument is absent.
    pub fn is_unmatchable(self, actual: TypeTag) -> bool {
        self.is_none() != (actual == TypeTag::None)
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSpec::Concrete(tag) => write!(f, "{tag}"),
            ArgSpec::Generic(class) => write!(f, "{class}"),
        }
    }
}

/// Whether `concrete` is admitted by a generic class.
pub fn is_equivalent(generic: GenericClass, concrete: TypeTag) -> bool {
    generic.admits(concrete)
}
