//! Overload signatures.

use std::fmt;

use crate::catalog::OperatorId;
use crate::types::{ArgSpec, TypeTag};

/// Number of argument slots in every signature.
pub const MAX_ARGS: usize = 3;

/// One admissible combination of argument types and a return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub arg1: ArgSpec,
    pub arg2: ArgSpec,
    pub arg3: ArgSpec,
    pub ret: ArgSpec,
}

impl Signature {
    pub const fn new(args: [ArgSpec; MAX_ARGS], ret: ArgSpec) -> Self {
        Self {
            arg1: args[0],
            arg2: args[1],
            arg3: args[2],
            ret,
        }
    }

    pub fn args(&self) -> [ArgSpec; MAX_ARGS] {
        [self.arg1, self.arg2, self.arg3]
    }

    pub fn arg(&self, slot: usize) -> ArgSpec {
        match slot {
            0 => self.arg1,
            1 => self.arg2,
            2 => self.arg3,
            _ => ArgSpec::NONE,
        }
    }

    /// Number of used argument slots.
    pub fn arity(&self) -> usize {
        self.args().iter().filter(|a| !a.is_none()).count()
    }

    /// Score this overload against actual argument types.
    ///
    /// Returns `-1` if any slot is unmatchable, otherwise the number of slots
    /// whose spec is equivalent to the actual type.
    pub fn match_count(&self, actual: &[TypeTag; MAX_ARGS]) -> i32 {
        let mut count = 0;
        for (spec, tag) in self.args().iter().zip(actual.iter()) {
            if spec.is_unmatchable(*tag) {
                return -1;
            }
            if spec.is_equivalent(*tag) {
                count += 1;
            }
        }
        count
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for arg in self.args().iter().filter(|a| !a.is_none()) {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
            first = false;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// All overloads of one operator, in resolution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorDef {
    pub op: OperatorId,
    pub overloads: Vec<Signature>,
}

impl OperatorDef {
    pub fn new(op: OperatorId, overloads: Vec<Signature>) -> Self {
        Self { op, overloads }
    }
}
