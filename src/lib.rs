pub mod catalog;
pub mod coercion;
pub mod collation;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod expression;
pub mod fold;
pub mod resolver;
pub mod types;
pub mod value;

pub use config::{ResolverConfig, SessionContext};
pub use driver::{ResolutionStats, Resolver};
pub use error::{SemanticError, SemanticResult};
