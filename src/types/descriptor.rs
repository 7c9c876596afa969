//! Type descriptors and domains.

use std::fmt;

use crate::types::{CollationId, Codeset, TypeTag};

/// Largest precision a NUMERIC may carry.
pub const MAX_NUMERIC_PRECISION: u32 = 38;

/// Largest declared length of a varying string.
pub const MAX_VARCHAR_LENGTH: u32 = 1_073_741_823;

/// Parameters of a concrete type.
///
/// `precision` doubles as the length of string and bit types. A zero
/// precision means "unspecified". Owned by the node that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataTypeDescriptor {
    pub precision: u32,
    pub scale: u32,
    pub codeset: Option<Codeset>,
    pub collation: Option<CollationId>,
    /// Per-element domains of a collection, in declaration order.
    pub elements: Vec<Domain>,
    /// Labels of an enumeration, in declaration order.
    pub enum_values: Vec<String>,
}

impl DataTypeDescriptor {
    pub fn numeric(precision: u32, scale: u32) -> Self {
        Self {
            precision: precision.min(MAX_NUMERIC_PRECISION),
            scale,
            ..Default::default()
        }
    }

    pub fn string(length: u32, collation: CollationId) -> Self {
        Self {
            precision: length,
            codeset: Some(collation.codeset()),
            collation: Some(collation),
            ..Default::default()
        }
    }

    pub fn collection(elements: Vec<Domain>) -> Self {
        Self {
            elements,
            ..Default::default()
        }
    }

    pub fn enumeration(values: Vec<String>, collation: CollationId) -> Self {
        Self {
            codeset: Some(collation.codeset()),
            collation: Some(collation),
            enum_values: values,
            ..Default::default()
        }
    }

    /// Default parameters of a type when nothing more specific is known.
    pub fn default_for(tag: TypeTag) -> Option<Self> {
        let desc = match tag {
            TypeTag::SmallInt => Self::numeric(5, 0),
            TypeTag::Integer => Self::numeric(10, 0),
            TypeTag::BigInt => Self::numeric(19, 0),
            TypeTag::Float => Self::numeric(7, 0),
            TypeTag::Double => Self::numeric(15, 0),
            TypeTag::Numeric => Self::numeric(15, 0),
            TypeTag::Monetary => Self::numeric(15, 2),
            TypeTag::Char | TypeTag::NChar | TypeTag::Bit => Self {
                precision: 1,
                ..Default::default()
            },
            TypeTag::VarChar | TypeTag::VarNChar | TypeTag::VarBit => Self {
                precision: MAX_VARCHAR_LENGTH,
                ..Default::default()
            },
            _ => return None,
        };
        Some(desc)
    }

    /// Replace the collation, keeping codeset and collation consistent.
    pub fn set_collation(&mut self, collation: CollationId) {
        self.collation = Some(collation);
        self.codeset = Some(collation.codeset());
    }
}

/// A concrete target type together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub tag: TypeTag,
    pub descriptor: Option<DataTypeDescriptor>,
}

impl Domain {
    pub fn of(tag: TypeTag) -> Self {
        Self {
            tag,
            descriptor: None,
        }
    }

    pub fn new(tag: TypeTag, descriptor: DataTypeDescriptor) -> Self {
        Self {
            tag,
            descriptor: Some(descriptor),
        }
    }

    /// The domain with default parameters filled in when none were given.
    pub fn or_default_descriptor(mut self) -> Self {
        if self.descriptor.is_none() {
            self.descriptor = DataTypeDescriptor::default_for(self.tag);
        }
        self
    }

    pub fn collation(&self) -> Option<CollationId> {
        self.descriptor.as_ref().and_then(|d| d.collation)
    }

    pub fn elements(&self) -> &[Domain] {
        self.descriptor
            .as_ref()
            .map(|d| d.elements.as_slice())
            .unwrap_or(&[])
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        let Some(desc) = &self.descriptor else {
            return Ok(());
        };

        if self.tag == TypeTag::Numeric {
            write!(f, "({},{})", desc.precision, desc.scale)?;
        } else if (self.tag.is_string() || self.tag.is_bit()) && desc.precision > 0 {
            write!(f, "({})", desc.precision)?;
        } else if self.tag.is_collection() && !desc.elements.is_empty() {
            let parts: Vec<String> = desc.elements.iter().map(|e| e.to_string()).collect();
            write!(f, "({})", parts.join(", "))?;
        } else if self.tag == TypeTag::Enumeration && !desc.enum_values.is_empty() {
            let parts: Vec<String> = desc.enum_values.iter().map(|v| format!("'{v}'")).collect();
            write!(f, "({})", parts.join(", "))?;
        }

        if let Some(collation) = desc.collation {
            if self.tag.has_collation() {
                write!(f, " COLLATE {collation}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_precision_is_capped() {
        let desc = DataTypeDescriptor::numeric(60, 4);
        assert_eq!(desc.precision, MAX_NUMERIC_PRECISION);
        assert_eq!(desc.scale, 4);
    }

    #[test]
    fn test_set_collation_updates_codeset() {
        let mut desc = DataTypeDescriptor::string(10, CollationId::ISO88591_BIN);
        desc.set_collation(CollationId::UTF8_EN_CI);
        assert_eq!(desc.codeset, Some(Codeset::Utf8));
    }

    #[test]
    fn test_domain_display() {
        let d = Domain::new(TypeTag::Numeric, DataTypeDescriptor::numeric(10, 2));
        assert_eq!(d.to_string(), "NUMERIC(10,2)");

        let d = Domain::new(
            TypeTag::VarChar,
            DataTypeDescriptor::string(20, CollationId::UTF8_BIN),
        );
        assert_eq!(d.to_string(), "VARCHAR(20) COLLATE utf8_bin");

        let d = Domain::new(
            TypeTag::Set,
            DataTypeDescriptor::collection(vec![
                Domain::of(TypeTag::Integer),
                Domain::of(TypeTag::VarChar),
            ]),
        );
        assert_eq!(d.to_string(), "SET(INTEGER, VARCHAR)");
    }
}
