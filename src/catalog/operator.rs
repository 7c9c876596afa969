//! Operator identifiers and their static properties.

use std::fmt;
use std::str::FromStr;

macro_rules! operators {
    ($($variant:ident => $name:literal, $sql:literal;)*) => {
        /// Every operator and function the resolver knows by identity.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OperatorId {
            $($variant,)*
        }

        impl OperatorId {
            /// All operators, in declaration order.
            pub const ALL: &'static [OperatorId] = &[$(OperatorId::$variant,)*];

            /// Identifier-style name (`PLUS`, `SUBSTRING`).
            pub fn name(self) -> &'static str {
                match self {
                    $(OperatorId::$variant => $name,)*
                }
            }

            /// SQL spelling (`+`, `SUBSTRING`).
            pub fn as_str(self) -> &'static str {
                match self {
                    $(OperatorId::$variant => $sql,)*
                }
            }
        }
    };
}

operators! {
    // Arithmetic
    Plus => "PLUS", "+";
    Minus => "MINUS", "-";
    Times => "TIMES", "*";
    Divide => "DIVIDE", "/";
    UnaryMinus => "UNARY_MINUS", "-";
    UnaryPlus => "UNARY_PLUS", "+";
    Div => "DIV", "DIV";
    Mod => "MOD", "MOD";
    Power => "POWER", "POWER";
    Sqrt => "SQRT", "SQRT";
    Exp => "EXP", "EXP";
    Ln => "LN", "LN";
    Log => "LOG", "LOG";
    Log2 => "LOG2", "LOG2";
    Log10 => "LOG10", "LOG10";
    Abs => "ABS", "ABS";
    Ceil => "CEIL", "CEIL";
    Floor => "FLOOR", "FLOOR";
    Round => "ROUND", "ROUND";
    Trunc => "TRUNC", "TRUNC";
    Sign => "SIGN", "SIGN";
    Sin => "SIN", "SIN";
    Cos => "COS", "COS";
    Tan => "TAN", "TAN";
    Cot => "COT", "COT";
    Asin => "ASIN", "ASIN";
    Acos => "ACOS", "ACOS";
    Atan => "ATAN", "ATAN";
    Atan2 => "ATAN2", "ATAN2";
    Degrees => "DEGREES", "DEGREES";
    Radians => "RADIANS", "RADIANS";
    Pi => "PI", "PI";
    Random => "RANDOM", "RANDOM";
    DRandom => "DRANDOM", "DRANDOM";

    // Bitwise
    BitAnd => "BIT_AND", "&";
    BitOr => "BIT_OR", "|";
    BitXor => "BIT_XOR", "^";
    BitNot => "BIT_NOT", "~";
    BitShiftLeft => "BITSHIFT_LEFT", "<<";
    BitShiftRight => "BITSHIFT_RIGHT", ">>";
    BitCount => "BIT_COUNT", "BIT_COUNT";

    // Comparison and predicates
    Eq => "EQ", "=";
    Ne => "NE", "<>";
    Lt => "LT", "<";
    Le => "LE", "<=";
    Gt => "GT", ">";
    Ge => "GE", ">=";
    NullSafeEq => "NULLSAFE_EQ", "<=>";
    Between => "BETWEEN", "BETWEEN";
    NotBetween => "NOT_BETWEEN", "NOT BETWEEN";
    IsIn => "IS_IN", "IN";
    IsNotIn => "IS_NOT_IN", "NOT IN";
    Like => "LIKE", "LIKE";
    NotLike => "NOT_LIKE", "NOT LIKE";
    RLike => "RLIKE", "RLIKE";
    NotRLike => "NOT_RLIKE", "NOT RLIKE";
    IsNull => "IS_NULL", "IS NULL";
    IsNotNull => "IS_NOT_NULL", "IS NOT NULL";

    // Logical
    And => "AND", "AND";
    Or => "OR", "OR";
    Xor => "XOR", "XOR";
    Not => "NOT", "NOT";

    // Character strings
    Concat => "CONCAT", "||";
    ConcatWs => "CONCAT_WS", "CONCAT_WS";
    Lower => "LOWER", "LOWER";
    Upper => "UPPER", "UPPER";
    CharLength => "CHAR_LENGTH", "CHAR_LENGTH";
    OctetLength => "OCTET_LENGTH", "OCTET_LENGTH";
    BitLength => "BIT_LENGTH", "BIT_LENGTH";
    Substring => "SUBSTRING", "SUBSTRING";
    Position => "POSITION", "POSITION";
    Instr => "INSTR", "INSTR";
    Locate => "LOCATE", "LOCATE";
    Trim => "TRIM", "TRIM";
    LTrim => "LTRIM", "LTRIM";
    RTrim => "RTRIM", "RTRIM";
    LPad => "LPAD", "LPAD";
    RPad => "RPAD", "RPAD";
    Replace => "REPLACE", "REPLACE";
    Translate => "TRANSLATE", "TRANSLATE";
    Repeat => "REPEAT", "REPEAT";
    Space => "SPACE", "SPACE";
    Left => "LEFT", "LEFT";
    Right => "RIGHT", "RIGHT";
    Reverse => "REVERSE", "REVERSE";
    Ascii => "ASCII", "ASCII";
    Chr => "CHR", "CHR";
    Strcmp => "STRCMP", "STRCMP";
    Md5 => "MD5", "MD5";
    Sha1 => "SHA1", "SHA1";
    Hex => "HEX", "HEX";
    Bin => "BIN", "BIN";
    ToBase64 => "TO_BASE64", "TO_BASE64";
    FromBase64 => "FROM_BASE64", "FROM_BASE64";

    // Date and time
    SysDate => "SYS_DATE", "SYS_DATE";
    SysTime => "SYS_TIME", "SYS_TIME";
    SysTimestamp => "SYS_TIMESTAMP", "SYS_TIMESTAMP";
    SysDateTime => "SYS_DATETIME", "SYS_DATETIME";
    AddMonths => "ADD_MONTHS", "ADD_MONTHS";
    MonthsBetween => "MONTHS_BETWEEN", "MONTHS_BETWEEN";
    LastDay => "LAST_DAY", "LAST_DAY";
    AddDate => "ADDDATE", "ADDDATE";
    SubDate => "SUBDATE", "SUBDATE";
    DateDiff => "DATEDIFF", "DATEDIFF";
    TimeDiff => "TIMEDIFF", "TIMEDIFF";
    Year => "YEAR", "YEAR";
    Month => "MONTH", "MONTH";
    Day => "DAY", "DAY";
    Hour => "HOUR", "HOUR";
    Minute => "MINUTE", "MINUTE";
    Second => "SECOND", "SECOND";
    DayOfWeek => "DAYOFWEEK", "DAYOFWEEK";
    DayOfYear => "DAYOFYEAR", "DAYOFYEAR";
    Quarter => "QUARTER", "QUARTER";
    DateFormat => "DATE_FORMAT", "DATE_FORMAT";
    TimeFormat => "TIME_FORMAT", "TIME_FORMAT";
    ToChar => "TO_CHAR", "TO_CHAR";
    ToDate => "TO_DATE", "TO_DATE";
    ToTime => "TO_TIME", "TO_TIME";
    ToTimestamp => "TO_TIMESTAMP", "TO_TIMESTAMP";
    ToDateTime => "TO_DATETIME", "TO_DATETIME";
    ToNumber => "TO_NUMBER", "TO_NUMBER";
    UnixTimestamp => "UNIX_TIMESTAMP", "UNIX_TIMESTAMP";
    FromUnixTime => "FROM_UNIXTIME", "FROM_UNIXTIME";
    MakeDate => "MAKEDATE", "MAKEDATE";
    MakeTime => "MAKETIME", "MAKETIME";

    // NULL handling and selection
    Nvl => "NVL", "NVL";
    Nvl2 => "NVL2", "NVL2";
    IfNull => "IFNULL", "IFNULL";
    Coalesce => "COALESCE", "COALESCE";
    NullIf => "NULLIF", "NULLIF";
    If => "IF", "IF";
    Greatest => "GREATEST", "GREATEST";
    Least => "LEAST", "LEAST";

    // Large objects
    CharToClob => "CHAR_TO_CLOB", "CHAR_TO_CLOB";
    ClobToChar => "CLOB_TO_CHAR", "CLOB_TO_CHAR";
    BitToBlob => "BIT_TO_BLOB", "BIT_TO_BLOB";
    BlobToBit => "BLOB_TO_BIT", "BLOB_TO_BIT";

    // Session
    CurrentUser => "CURRENT_USER", "CURRENT_USER";

    // Run-time state
    NextValue => "NEXT_VALUE", "NEXT_VALUE";
    CurrentValue => "CURRENT_VALUE", "CURRENT_VALUE";
    RowCount => "ROW_COUNT", "ROW_COUNT";
    LastInsertId => "LAST_INSERT_ID", "LAST_INSERT_ID";
    IndexCardinality => "INDEX_CARDINALITY", "INDEX_CARDINALITY";

    // Structural, typed outside the catalog
    Cast => "CAST", "CAST";
    Exists => "EXISTS", "EXISTS";
}

impl OperatorId {
    /// Argument positions that must share one common type.
    ///
    /// Empty for operators whose slots are resolved independently.
    pub fn symmetric_slots(self) -> &'static [usize] {
        match self {
            OperatorId::Plus
            | OperatorId::Minus
            | OperatorId::Times
            | OperatorId::Divide
            | OperatorId::Div
            | OperatorId::Mod
            | OperatorId::BitAnd
            | OperatorId::BitOr
            | OperatorId::BitXor
            | OperatorId::Eq
            | OperatorId::Ne
            | OperatorId::Lt
            | OperatorId::Le
            | OperatorId::Gt
            | OperatorId::Ge
            | OperatorId::NullSafeEq
            | OperatorId::Between
            | OperatorId::NotBetween
            | OperatorId::Concat
            | OperatorId::Nvl
            | OperatorId::IfNull
            | OperatorId::Coalesce
            | OperatorId::NullIf
            | OperatorId::Greatest
            | OperatorId::Least => &[0, 1, 2],
            OperatorId::If | OperatorId::Nvl2 => &[1, 2],
            _ => &[],
        }
    }

    pub fn is_symmetric(self) -> bool {
        !self.symmetric_slots().is_empty()
    }

    /// Predicates comparing their operands' values.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OperatorId::Eq
                | OperatorId::Ne
                | OperatorId::Lt
                | OperatorId::Le
                | OperatorId::Gt
                | OperatorId::Ge
                | OperatorId::NullSafeEq
                | OperatorId::Between
                | OperatorId::NotBetween
                | OperatorId::IsIn
                | OperatorId::IsNotIn
        )
    }

    /// Operators whose string operands must agree on one collation.
    pub fn is_collation_sensitive(self) -> bool {
        self.is_comparison()
            || self.result_carries_collation()
            || matches!(
                self,
                OperatorId::Like
                    | OperatorId::NotLike
                    | OperatorId::RLike
                    | OperatorId::NotRLike
                    | OperatorId::Instr
                    | OperatorId::Position
                    | OperatorId::Locate
                    | OperatorId::Strcmp
                    | OperatorId::ToDate
                    | OperatorId::ToTime
                    | OperatorId::ToTimestamp
                    | OperatorId::ToDateTime
            )
    }

    /// Collation-sensitive operators whose string result takes the unified
    /// collation.
    pub fn result_carries_collation(self) -> bool {
        matches!(
            self,
            OperatorId::Concat
                | OperatorId::ConcatWs
                | OperatorId::LPad
                | OperatorId::RPad
                | OperatorId::Trim
                | OperatorId::LTrim
                | OperatorId::RTrim
                | OperatorId::Replace
                | OperatorId::Translate
                | OperatorId::Greatest
                | OperatorId::Least
                | OperatorId::Coalesce
                | OperatorId::Nvl
                | OperatorId::IfNull
                | OperatorId::NullIf
                | OperatorId::DateFormat
                | OperatorId::TimeFormat
                | OperatorId::ToChar
        )
    }

    /// Operators whose return type must be fixed before a parameter value is
    /// known, so late-bound arguments are cast instead of deferred.
    pub fn is_late_bind_sensitive(self) -> bool {
        matches!(
            self,
            OperatorId::Round
                | OperatorId::Trunc
                | OperatorId::Floor
                | OperatorId::Ceil
                | OperatorId::Sin
                | OperatorId::Cos
                | OperatorId::Tan
                | OperatorId::Cot
                | OperatorId::Asin
                | OperatorId::Acos
                | OperatorId::Atan
                | OperatorId::Atan2
                | OperatorId::AddMonths
                | OperatorId::MonthsBetween
                | OperatorId::LastDay
                | OperatorId::AddDate
                | OperatorId::SubDate
                | OperatorId::DateDiff
                | OperatorId::TimeDiff
        )
    }

    /// Operators whose value depends on run-time state; never folded.
    pub fn is_runtime_only(self) -> bool {
        matches!(
            self,
            OperatorId::NextValue
                | OperatorId::CurrentValue
                | OperatorId::RowCount
                | OperatorId::LastInsertId
                | OperatorId::Random
                | OperatorId::DRandom
                | OperatorId::IndexCardinality
                | OperatorId::Exists
        )
    }

    /// Operators that give NULL operands a meaning other than "result is
    /// NULL". The concatenation family joins this list when NULL is read as
    /// the empty string.
    pub fn treats_null_specially(self) -> bool {
        matches!(
            self,
            OperatorId::IsNull
                | OperatorId::IsNotNull
                | OperatorId::NullSafeEq
                | OperatorId::Nvl
                | OperatorId::Nvl2
                | OperatorId::IfNull
                | OperatorId::Coalesce
                | OperatorId::NullIf
                | OperatorId::If
                | OperatorId::And
                | OperatorId::Or
                | OperatorId::ConcatWs
                | OperatorId::IsIn
                | OperatorId::IsNotIn
        )
    }

    pub fn is_concat_family(self) -> bool {
        matches!(self, OperatorId::Concat | OperatorId::ConcatWs)
    }

    /// Argument whose value bounds the size of the result, for operators
    /// that can produce results far larger than their input.
    pub fn fold_size_argument(self) -> Option<usize> {
        match self {
            OperatorId::Space => Some(0),
            OperatorId::Repeat | OperatorId::LPad | OperatorId::RPad => Some(1),
            _ => None,
        }
    }

    /// The predicate equivalent to `NOT self`.
    pub fn negated(self) -> Option<OperatorId> {
        let negated = match self {
            OperatorId::Eq => OperatorId::Ne,
            OperatorId::Ne => OperatorId::Eq,
            OperatorId::Lt => OperatorId::Ge,
            OperatorId::Ge => OperatorId::Lt,
            OperatorId::Le => OperatorId::Gt,
            OperatorId::Gt => OperatorId::Le,
            OperatorId::Like => OperatorId::NotLike,
            OperatorId::NotLike => OperatorId::Like,
            OperatorId::RLike => OperatorId::NotRLike,
            OperatorId::NotRLike => OperatorId::RLike,
            OperatorId::Between => OperatorId::NotBetween,
            OperatorId::NotBetween => OperatorId::Between,
            OperatorId::IsIn => OperatorId::IsNotIn,
            OperatorId::IsNotIn => OperatorId::IsIn,
            OperatorId::IsNull => OperatorId::IsNotNull,
            OperatorId::IsNotNull => OperatorId::IsNull,
            _ => return None,
        };
        Some(negated)
    }

    /// N-ary functions represented as nested binary nodes of the same
    /// operator.
    pub fn is_chain(self) -> bool {
        matches!(
            self,
            OperatorId::Greatest | OperatorId::Least | OperatorId::Coalesce
        )
    }

    /// Called with function syntax rather than as an operator symbol.
    pub fn is_function(self) -> bool {
        !matches!(
            self,
            OperatorId::Plus
                | OperatorId::Minus
                | OperatorId::Times
                | OperatorId::Divide
                | OperatorId::UnaryMinus
                | OperatorId::UnaryPlus
                | OperatorId::BitAnd
                | OperatorId::BitOr
                | OperatorId::BitXor
                | OperatorId::BitNot
                | OperatorId::BitShiftLeft
                | OperatorId::BitShiftRight
                | OperatorId::And
                | OperatorId::Or
                | OperatorId::Xor
                | OperatorId::Not
                | OperatorId::Concat
                | OperatorId::Cast
        ) && !self.is_comparison()
            && !matches!(
                self,
                OperatorId::Like
                    | OperatorId::NotLike
                    | OperatorId::RLike
                    | OperatorId::NotRLike
                    | OperatorId::IsNull
                    | OperatorId::IsNotNull
            )
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an operator name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for OperatorId {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let alias = match upper.as_str() {
            "ADD" => Some(OperatorId::Plus),
            "SUB" | "SUBTRACT" => Some(OperatorId::Minus),
            "MUL" | "MULTIPLY" => Some(OperatorId::Times),
            "!=" => Some(OperatorId::Ne),
            "==" => Some(OperatorId::Eq),
            "IN" => Some(OperatorId::IsIn),
            "NOT IN" => Some(OperatorId::IsNotIn),
            "SUBSTR" => Some(OperatorId::Substring),
            "CEILING" => Some(OperatorId::Ceil),
            "POW" => Some(OperatorId::Power),
            "TRUNCATE" => Some(OperatorId::Trunc),
            "LENGTH" | "CHARACTER_LENGTH" => Some(OperatorId::CharLength),
            "UCASE" => Some(OperatorId::Upper),
            "LCASE" => Some(OperatorId::Lower),
            "NOW" => Some(OperatorId::SysDateTime),
            "CURRENT_DATE" => Some(OperatorId::SysDate),
            "CURRENT_TIME" => Some(OperatorId::SysTime),
            "CURRENT_TIMESTAMP" => Some(OperatorId::SysTimestamp),
            "USER" => Some(OperatorId::CurrentUser),
            "RAND" => Some(OperatorId::Random),
            _ => None,
        };
        if let Some(op) = alias {
            return Ok(op);
        }

        // Identifier names are unique; symbols are ambiguous for unary and
        // binary forms, so the binary form wins.
        OperatorId::ALL
            .iter()
            .copied()
            .find(|op| op.name() == upper)
            .or_else(|| OperatorId::ALL.iter().copied().find(|op| op.as_str() == upper))
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}
