//! Precision, scale and length of computed results.

use crate::catalog::OperatorId;
use crate::config::DivisionScale;
use crate::types::{DataTypeDescriptor, Domain, TypeTag, MAX_NUMERIC_PRECISION, MAX_VARCHAR_LENGTH};

/// Extra fractional digits the modern division rule adds.
const DIVISION_EXTRA_SCALE: u32 = 9;

/// Effective (precision, scale) of a numeric domain.
pub fn numeric_shape(domain: &Domain) -> (u32, u32) {
    match domain.tag {
        TypeTag::SmallInt => (5, 0),
        TypeTag::Integer => (10, 0),
        TypeTag::BigInt => (19, 0),
        _ => domain
            .descriptor
            .as_ref()
            .filter(|d| d.precision > 0)
            .map(|d| (d.precision, d.scale))
            .or_else(|| {
                DataTypeDescriptor::default_for(domain.tag).map(|d| (d.precision, d.scale))
            })
            .unwrap_or((MAX_NUMERIC_PRECISION, 0)),
    }
}

/// Descriptor of a NUMERIC arithmetic result.
pub fn numeric_result(
    op: OperatorId,
    left: &Domain,
    right: &Domain,
    division: DivisionScale,
) -> DataTypeDescriptor {
    let (p1, s1) = numeric_shape(left);
    let (p2, s2) = numeric_shape(right);

    let (precision, scale) = match op {
        OperatorId::Plus | OperatorId::Minus => {
            let scale = s1.max(s2);
            let integral = (p1 - s1.min(p1)).max(p2 - s2.min(p2));
            (integral + scale + 1, scale)
        }
        OperatorId::Times => (p1 + p2 + 1, s1 + s2),
        OperatorId::Divide => {
            let scale = match division {
                DivisionScale::Legacy => s1.max(s2),
                DivisionScale::Modern => s1.max(s2) + DIVISION_EXTRA_SCALE,
            };
            let integral = (p1 - s1.min(p1)) + s2;
            (integral + scale, scale)
        }
        _ => (p1.max(p2), s1.max(s2)),
    };

    // Keep the integral digits and give up fraction when over the cap.
    if precision > MAX_NUMERIC_PRECISION {
        let overflow = precision - MAX_NUMERIC_PRECISION;
        DataTypeDescriptor::numeric(MAX_NUMERIC_PRECISION, scale.saturating_sub(overflow))
    } else {
        DataTypeDescriptor::numeric(precision, scale)
    }
}

/// Declared length of a concatenation result.
pub fn concat_length(lengths: &[u32]) -> u32 {
    lengths
        .iter()
        .fold(0u32, |acc, len| acc.saturating_add(*len))
        .min(MAX_VARCHAR_LENGTH)
}

/// Declared length of a string domain, or the varying maximum when unknown.
pub fn string_length(domain: &Domain) -> u32 {
    domain
        .descriptor
        .as_ref()
        .map(|d| d.precision)
        .filter(|p| *p > 0)
        .unwrap_or(match domain.tag {
            TypeTag::SmallInt => 6,
            TypeTag::Integer => 11,
            TypeTag::BigInt => 20,
            TypeTag::Date => 10,
            TypeTag::Time => 8,
            TypeTag::Timestamp | TypeTag::DateTime => 23,
            _ => MAX_VARCHAR_LENGTH,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(p: u32, s: u32) -> Domain {
        Domain::new(TypeTag::Numeric, DataTypeDescriptor::numeric(p, s))
    }

    #[test]
    fn test_addition_keeps_widest_scale() {
        let d = numeric_result(
            OperatorId::Plus,
            &numeric(5, 2),
            &numeric(10, 4),
            DivisionScale::Modern,
        );
        assert_eq!((d.precision, d.scale), (11, 4));
    }

    #[test]
    fn test_multiplication_adds_scales() {
        let d = numeric_result(
            OperatorId::Times,
            &numeric(5, 2),
            &Domain::of(TypeTag::Integer),
            DivisionScale::Modern,
        );
        assert_eq!((d.precision, d.scale), (16, 2));
    }

    #[test]
    fn test_division_scale_rules() {
        let legacy = numeric_result(
            OperatorId::Divide,
            &numeric(10, 2),
            &numeric(5, 1),
            DivisionScale::Legacy,
        );
        assert_eq!(legacy.scale, 2);

        let modern = numeric_result(
            OperatorId::Divide,
            &numeric(10, 2),
            &numeric(5, 1),
            DivisionScale::Modern,
        );
        assert_eq!(modern.scale, 11);
        assert_eq!(modern.precision, 20);
    }

    #[test]
    fn test_precision_cap_trades_fraction() {
        let d = numeric_result(
            OperatorId::Times,
            &numeric(30, 10),
            &numeric(20, 10),
            DivisionScale::Modern,
        );
        assert_eq!(d.precision, MAX_NUMERIC_PRECISION);
        assert_eq!(d.scale, 7);
    }

    #[test]
    fn test_concat_length_saturates() {
        assert_eq!(concat_length(&[3, 4]), 7);
        assert_eq!(concat_length(&[MAX_VARCHAR_LENGTH, 10]), MAX_VARCHAR_LENGTH);
    }
}
