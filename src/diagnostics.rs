//! Positioned diagnostics.

use std::fmt;

use crate::error::SemanticError;

/// Source location of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub position: Position,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.position, self.severity, self.code, self.message
        )
    }
}

/// Receiver of diagnostics produced during resolution.
pub trait DiagnosticSink {
    fn report(&mut self, position: Position, severity: Severity, code: &'static str, message: String);

    /// Report a resolution error at `position`.
    fn report_error(&mut self, position: Position, error: &SemanticError) {
        self.report(position, Severity::Error, error.code(), error.to_string());
    }
}

/// Diagnostics collected in report order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, position: Position, severity: Severity, code: &'static str, message: String) {
        self.entries.push(Diagnostic {
            position,
            severity,
            code,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OperatorId;

    #[test]
    fn test_report_error() {
        let mut sink = Diagnostics::new();
        sink.report_error(
            Position::new(3, 14),
            &SemanticError::ZeroDivide {
                op: OperatorId::Divide,
            },
        );
        sink.report(
            Position::new(4, 1),
            Severity::Warning,
            "W0001",
            "folding skipped".to_string(),
        );

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.error_count(), 1);
        assert!(sink.has_errors());

        let first = sink.iter().next().unwrap();
        assert_eq!(first.code, "E0202");
        assert_eq!(first.to_string(), "3:14: error[E0202]: division by zero in /");
    }

    #[test]
    fn test_empty_sink() {
        let sink = Diagnostics::new();
        assert!(sink.is_empty());
        assert!(!sink.has_errors());
    }
}
