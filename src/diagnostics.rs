use serde::Serialize;

/// Token-level problems found during a run. These are recoverable: the
/// offending lexeme still enters the token stream as UNKNOWN and scanning
/// continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LexDiagnostic {
    UnrecognizedToken(String),
    InvalidGlobalIdentifier(String),
    UnclosedStringLiteral,
    UnclosedComment,
}

impl std::fmt::Display for LexDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexDiagnostic::UnrecognizedToken(lexeme) => {
                write!(f, "unrecognized token '{}'", lexeme)
            }
            LexDiagnostic::InvalidGlobalIdentifier(lexeme) => {
                write!(f, "invalid global identifier '{}'", lexeme)
            }
            LexDiagnostic::UnclosedStringLiteral => {
                write!(f, "string literal is never closed")
            }
            LexDiagnostic::UnclosedComment => {
                write!(f, "block comment is never closed")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    kind: LexDiagnostic,
    line: usize,
}

impl Diagnostic {
    pub fn new(kind: LexDiagnostic, line: usize) -> Self {
        Diagnostic { kind, line }
    }

    pub fn get_kind(&self) -> &LexDiagnostic {
        &self.kind
    }

    pub fn get_line(&self) -> usize {
        self.line
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error at line {}: {}", self.line, self.kind)
    }
}

/// Append-only diagnostic list for one analysis run.
#[derive(Debug, Default)]
pub struct ErrorHandler {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorHandler {
    pub fn new() -> Self {
        ErrorHandler {
            diagnostics: Vec::new(),
        }
    }

    pub fn report(&mut self, kind: LexDiagnostic, line: usize) {
        self.diagnostics.push(Diagnostic::new(kind, line));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
