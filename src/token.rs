use serde::Serialize;

/// Classification assigned to a candidate lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Keyword,
    Identifier,
    GlobalIdentifier,
    Function,
    Symbol,
    Operator,
    Integer,
    Decimal,
    Char,
    StringLiteral,
    Boolean,
    Unknown,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::GlobalIdentifier => "GLOBAL_IDENTIFIER",
            TokenKind::Function => "FUNCTION",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Integer => "INTEGER",
            TokenKind::Decimal => "DECIMAL",
            TokenKind::Char => "CHAR",
            TokenKind::StringLiteral => "STRING",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified lexeme. Built once during the analysis pass and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    kind: TokenKind,
    lexeme: String,
    line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: &str, line: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.to_string(),
            line,
        }
    }

    pub fn get_kind(&self) -> TokenKind {
        self.kind
    }

    pub fn get_lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn get_line(&self) -> usize {
        self.line
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lexeme, self.kind)
    }
}
