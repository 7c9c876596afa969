//! Signature catalog: the overloads of every typed operator.
//!
//! The catalog is built once on first use and is read-only afterwards, so
//! any number of threads may consult it without locking.

pub mod operator;
pub mod signature;
mod table;

use std::collections::TryReserveError;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::error::{SemanticError, SemanticResult};

pub use operator::{OperatorId, UnknownOperator};
pub use signature::{OperatorDef, Signature, MAX_ARGS};

static CATALOG: LazyLock<Result<Catalog, TryReserveError>> = LazyLock::new(Catalog::build);

/// Operator-indexed overload table.
#[derive(Debug)]
pub struct Catalog {
    defs: FxHashMap<OperatorId, OperatorDef>,
}

impl Catalog {
    /// The process-wide catalog.
    pub fn global() -> SemanticResult<&'static Catalog> {
        CATALOG.as_ref().map_err(|_| SemanticError::OutOfMemory)
    }

    fn build() -> Result<Catalog, TryReserveError> {
        let defs = table::operator_defs();
        let mut map = FxHashMap::default();
        map.try_reserve(defs.len())?;
        for def in defs {
            map.insert(def.op, def);
        }
        log::debug!("signature catalog built with {} operators", map.len());
        Ok(Catalog { defs: map })
    }

    /// Overloads of `op`, or `None` for operators typed outside the catalog.
    pub fn lookup(&self, op: OperatorId) -> Option<&OperatorDef> {
        self.defs.get(&op)
    }

    /// Typed operators in declaration order.
    pub fn operators(&self) -> impl Iterator<Item = &OperatorDef> {
        OperatorId::ALL.iter().filter_map(|op| self.defs.get(op))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArgSpec, GenericClass, TypeTag};

    #[test]
    fn test_global_is_shared() {
        let a = Catalog::global().unwrap();
        let b = Catalog::global().unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.len(), OperatorId::ALL.len() - 1);
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::global().unwrap();
        assert!(catalog.lookup(OperatorId::Cast).is_none());

        let plus = catalog.lookup(OperatorId::Plus).unwrap();
        assert_eq!(plus.op, OperatorId::Plus);
        assert_eq!(
            plus.overloads[0].ret,
            ArgSpec::Generic(GenericClass::Number)
        );
        assert_eq!(plus.overloads[1].arg1, ArgSpec::Concrete(TypeTag::Date));
    }

    #[test]
    fn test_operators_follow_declaration_order() {
        let catalog = Catalog::global().unwrap();
        let ops: Vec<_> = catalog.operators().map(|d| d.op).collect();
        assert_eq!(ops.first(), Some(&OperatorId::Plus));
        assert!(!ops.contains(&OperatorId::Cast));
    }

    #[test]
    fn test_concurrent_readers() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    Catalog::global()
                        .unwrap()
                        .lookup(OperatorId::Concat)
                        .map(|d| d.overloads.len())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }
}
