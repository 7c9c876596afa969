//! Codesets, collations and coercibility levels.

use std::fmt;

/// Character encoding of a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codeset {
    Iso88591,
    Utf8,
    EucKr,
    Binary,
}

impl Codeset {
    /// Multi-byte codesets cannot be re-encoded into each other.
    pub fn is_multibyte(self) -> bool {
        matches!(self, Codeset::Utf8 | Codeset::EucKr)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Codeset::Iso88591 => "iso88591",
            Codeset::Utf8 => "utf8",
            Codeset::EucKr => "euckr",
            Codeset::Binary => "binary",
        }
    }
}

impl fmt::Display for Codeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index into the built-in collation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollationId(pub u16);

/// A built-in collation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collation {
    pub id: CollationId,
    pub name: &'static str,
    pub codeset: Codeset,
}

impl CollationId {
    pub const ISO88591_BIN: CollationId = CollationId(0);
    pub const UTF8_BIN: CollationId = CollationId(1);
    pub const ISO88591_EN_CS: CollationId = CollationId(2);
    pub const ISO88591_EN_CI: CollationId = CollationId(3);
    pub const UTF8_EN_CS: CollationId = CollationId(4);
    pub const UTF8_EN_CI: CollationId = CollationId(5);
    pub const EUCKR_BIN: CollationId = CollationId(6);
    pub const BINARY: CollationId = CollationId(7);

    pub fn info(self) -> Option<&'static Collation> {
        COLLATIONS.get(self.0 as usize)
    }

    pub fn name(self) -> &'static str {
        self.info().map(|c| c.name).unwrap_or("unknown")
    }

    /// Codeset of this collation; unknown ids are treated as binary.
    pub fn codeset(self) -> Codeset {
        self.info().map(|c| c.codeset).unwrap_or(Codeset::Binary)
    }

    pub fn is_case_insensitive(self) -> bool {
        self.name().ends_with("_ci")
    }

    /// The binary collation of a codeset.
    pub fn binary_for(codeset: Codeset) -> CollationId {
        match codeset {
            Codeset::Iso88591 => CollationId::ISO88591_BIN,
            Codeset::Utf8 => CollationId::UTF8_BIN,
            Codeset::EucKr => CollationId::EUCKR_BIN,
            Codeset::Binary => CollationId::BINARY,
        }
    }

    pub fn by_name(name: &str) -> Option<CollationId> {
        COLLATIONS
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.id)
    }
}

impl fmt::Display for CollationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static COLLATIONS: [Collation; 8] = [
    Collation {
        id: CollationId::ISO88591_BIN,
        name: "iso88591_bin",
        codeset: Codeset::Iso88591,
    },
    Collation {
        id: CollationId::UTF8_BIN,
        name: "utf8_bin",
        codeset: Codeset::Utf8,
    },
    Collation {
        id: CollationId::ISO88591_EN_CS,
        name: "iso88591_en_cs",
        codeset: Codeset::Iso88591,
    },
    Collation {
        id: CollationId::ISO88591_EN_CI,
        name: "iso88591_en_ci",
        codeset: Codeset::Iso88591,
    },
    Collation {
        id: CollationId::UTF8_EN_CS,
        name: "utf8_en_cs",
        codeset: Codeset::Utf8,
    },
    Collation {
        id: CollationId::UTF8_EN_CI,
        name: "utf8_en_ci",
        codeset: Codeset::Utf8,
    },
    Collation {
        id: CollationId::EUCKR_BIN,
        name: "euckr_bin",
        codeset: Codeset::EucKr,
    },
    Collation {
        id: CollationId::BINARY,
        name: "binary",
        codeset: Codeset::Binary,
    },
];

/// How firmly an operand holds on to its collation.
///
/// Ordered from most fixed to most flexible. When two operands disagree,
/// the one with the greater level yields to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoercibilityLevel {
    ExplicitCollate = 0,
    ColumnReference = 1,
    ExpressionResult = 2,
    LiteralValue = 3,
    HostParameter = 4,
}
