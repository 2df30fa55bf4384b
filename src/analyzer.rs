use crate::dfa::{construct_dfa, DFA};
use crate::diagnostics::{Diagnostic, ErrorHandler, LexDiagnostic};
use crate::nfa::construct_nfa;
use crate::regex::build_syntax_tree;
use crate::symbols::{Symbol, SymbolTable, SymbolType};
use crate::token::{Token, TokenKind};
use crate::tokenizer::{tokenize, Candidate};
use color_eyre::eyre::Result;

pub const KEYWORDS: [&str; 12] = [
    "if", "elif", "else", "out", "in", "deci", "int", "char", "bool", "str", "return", "def",
];

pub const TYPE_KEYWORDS: [&str; 5] = ["deci", "int", "char", "bool", "str"];

const STRUCTURAL_SYMBOLS: [&str; 6] = ["{", "}", "(", ")", ";", ","];

/// The built-in lexeme patterns, compiled to DFAs once per analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Identifier,
    Integer,
    Decimal,
    Boolean,
    CharLiteral,
    StringLiteral,
    Operator,
}

impl PatternKind {
    pub const ALL: [PatternKind; 7] = [
        PatternKind::Identifier,
        PatternKind::Integer,
        PatternKind::Decimal,
        PatternKind::Boolean,
        PatternKind::CharLiteral,
        PatternKind::StringLiteral,
        PatternKind::Operator,
    ];

    pub fn pattern(&self) -> &'static str {
        match self {
            PatternKind::Identifier => "[a-z]+",
            PatternKind::Integer => "[0-9]+",
            PatternKind::Decimal => "[0-9]+\\.[0-9]+",
            PatternKind::Boolean => "true|false",
            PatternKind::CharLiteral => "'[a-zA-Z0-9]'",
            PatternKind::StringLiteral => "\"[^\"]*\"",
            PatternKind::Operator => "[+\\-*/%^=]",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Identifier => "identifier",
            PatternKind::Integer => "integer",
            PatternKind::Decimal => "decimal",
            PatternKind::Boolean => "boolean",
            PatternKind::CharLiteral => "char",
            PatternKind::StringLiteral => "string",
            PatternKind::Operator => "operator",
        }
    }

    pub fn from_name(name: &str) -> Option<PatternKind> {
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
    }
}

/// Scope and keyword history threaded through classification. Kept as its
/// own value so the context-sensitive rules can be tested without running
/// a full analysis.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifierState {
    inside_function: bool,
    current_function: String,
    last_keyword: String,
    second_last_keyword: String,
    last_type_keyword: String,
}

impl ClassifierState {
    pub fn new() -> Self {
        ClassifierState::default()
    }

    pub fn push_keyword(&mut self, keyword: &str) {
        self.second_last_keyword = std::mem::take(&mut self.last_keyword);
        self.last_keyword = keyword.to_string();
        if TYPE_KEYWORDS.contains(&keyword) {
            self.last_type_keyword = keyword.to_string();
        }
    }

    /// The symbol-table namespace new names land in.
    pub fn scope(&self) -> &str {
        if self.inside_function && !self.current_function.is_empty() {
            &self.current_function
        } else {
            "global"
        }
    }

    /// Type of a newly declared name, from the most recently seen type
    /// keyword.
    pub fn infer_type(&self) -> SymbolType {
        match self.last_type_keyword.as_str() {
            "deci" => SymbolType::Decimal,
            "int" => SymbolType::Integer,
            "char" => SymbolType::Character,
            "bool" => SymbolType::Boolean,
            "" => SymbolType::Unknown,
            _ => SymbolType::StringType,
        }
    }

    fn open_block(&mut self) {
        self.inside_function = true;
    }

    fn close_block(&mut self) {
        self.inside_function = false;
        self.current_function.clear();
    }

    fn enter_function(&mut self, name: &str) {
        self.current_function = name.to_string();
        self.inside_function = true;
        self.last_keyword.clear();
        self.second_last_keyword.clear();
    }

    pub fn is_inside_function(&self) -> bool {
        self.inside_function
    }
}

/// The lexical front-end: compiled built-in DFAs plus one run's token
/// stream, symbol table, and diagnostics.
pub struct LexicalAnalyzer {
    dfas: Vec<(PatternKind, DFA)>,
    tokens: Vec<Token>,
    symbol_table: SymbolTable,
    errors: ErrorHandler,
    state: ClassifierState,
}

impl LexicalAnalyzer {
    /// Compile every built-in pattern. A malformed built-in is a defect in
    /// the analyzer itself, so this is the one place compilation errors
    /// abort instead of being collected.
    pub fn new() -> Result<Self> {
        let mut dfas = Vec::new();
        for kind in PatternKind::ALL {
            let pattern = kind.pattern();
            let syntax_tree = build_syntax_tree(pattern)?;
            let nfa = construct_nfa(pattern, &syntax_tree);
            dfas.push((kind, construct_dfa(&nfa)));
        }
        Ok(LexicalAnalyzer {
            dfas,
            tokens: Vec::new(),
            symbol_table: SymbolTable::new(),
            errors: ErrorHandler::new(),
            state: ClassifierState::new(),
        })
    }

    pub fn get_dfa(&self, kind: PatternKind) -> &DFA {
        match self.dfas.iter().find(|(k, _)| *k == kind) {
            Some((_, dfa)) => dfa,
            // Every PatternKind is compiled in new()
            None => unreachable!("missing compiled pattern"),
        }
    }

    /// Transition table of a compiled built-in pattern, for inspection.
    pub fn transition_table(&self, kind: PatternKind) -> String {
        self.get_dfa(kind).transition_table()
    }

    fn matches(&self, kind: PatternKind, lexeme: &str) -> bool {
        self.get_dfa(kind).validate(lexeme)
    }

    /// Run the whole pipeline over a source text. Results accumulate on
    /// the analyzer; a fresh analyzer gives a fresh run.
    pub fn analyze(&mut self, source: &str) {
        let candidates = tokenize(source, &mut self.errors);
        for candidate in candidates {
            self.classify(candidate);
        }
    }

    pub fn get_tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get_symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn get_diagnostics(&self) -> &[Diagnostic] {
        self.errors.diagnostics()
    }

    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    fn emit(&mut self, kind: TokenKind, lexeme: &str, line: usize) {
        self.tokens.push(Token::new(kind, lexeme, line));
    }

    fn insert_symbol(&mut self, name: &str, symbol_type: SymbolType, scope: &str, value: &str) {
        if !self.symbol_table.contains(name, scope) {
            self.symbol_table
                .insert(Symbol::new(name, symbol_type, scope, value));
        }
    }

    fn classify(&mut self, candidate: Candidate) {
        let lexeme = candidate.lexeme;
        let line = candidate.line;

        // Already diagnosed by the tokenizer
        if candidate.unterminated {
            self.emit(TokenKind::Unknown, &lexeme, line);
            return;
        }

        if let Some(rest) = lexeme.strip_prefix('@') {
            if self.matches(PatternKind::Identifier, rest) {
                self.emit(TokenKind::GlobalIdentifier, &lexeme, line);
                let inferred = self.state.infer_type();
                let name = rest.to_string();
                self.insert_symbol(&name, inferred, "global", "");
            } else {
                self.emit(TokenKind::Unknown, &lexeme, line);
                self.errors
                    .report(LexDiagnostic::InvalidGlobalIdentifier(lexeme), line);
            }
            return;
        }

        if STRUCTURAL_SYMBOLS.contains(&lexeme.as_str()) {
            self.emit(TokenKind::Symbol, &lexeme, line);
            match lexeme.as_str() {
                "{" => self.state.open_block(),
                "}" => self.state.close_block(),
                _ => {}
            }
            return;
        }

        if self.matches(PatternKind::Boolean, &lexeme) {
            self.emit(TokenKind::Boolean, &lexeme, line);
            let scope = self.state.scope().to_string();
            self.insert_symbol(&lexeme, SymbolType::Boolean, &scope, &lexeme);
            return;
        }

        if self.matches(PatternKind::Identifier, &lexeme) {
            if KEYWORDS.contains(&lexeme.as_str()) {
                self.emit(TokenKind::Keyword, &lexeme, line);
                self.state.push_keyword(&lexeme);
                return;
            }
            if self.state.second_last_keyword == "def"
                && TYPE_KEYWORDS.contains(&self.state.last_keyword.as_str())
            {
                self.emit(TokenKind::Function, &lexeme, line);
                let return_type = self.state.last_keyword.clone();
                self.insert_symbol(&lexeme, SymbolType::Function, "global", &return_type);
                self.state.enter_function(&lexeme);
                return;
            }
            self.emit(TokenKind::Identifier, &lexeme, line);
            let inferred = self.state.infer_type();
            let scope = self.state.scope().to_string();
            self.insert_symbol(&lexeme, inferred, &scope, "");
            return;
        }

        if self.matches(PatternKind::Integer, &lexeme) {
            self.emit(TokenKind::Integer, &lexeme, line);
            let scope = self.state.scope().to_string();
            self.insert_symbol(&lexeme, SymbolType::Integer, &scope, &lexeme);
            return;
        }

        if self.matches(PatternKind::Decimal, &lexeme) {
            self.emit(TokenKind::Decimal, &lexeme, line);
            let scope = self.state.scope().to_string();
            self.insert_symbol(&lexeme, SymbolType::Decimal, &scope, &lexeme);
            return;
        }

        if self.matches(PatternKind::CharLiteral, &lexeme) {
            self.emit(TokenKind::Char, &lexeme, line);
            let scope = self.state.scope().to_string();
            self.insert_symbol(&lexeme, SymbolType::Character, &scope, &lexeme);
            return;
        }

        if self.matches(PatternKind::StringLiteral, &lexeme) {
            self.emit(TokenKind::StringLiteral, &lexeme, line);
            let scope = self.state.scope().to_string();
            self.insert_symbol(&lexeme, SymbolType::StringType, &scope, &lexeme);
            return;
        }

        if self.matches(PatternKind::Operator, &lexeme) {
            self.emit(TokenKind::Operator, &lexeme, line);
            return;
        }

        self.emit(TokenKind::Unknown, &lexeme, line);
        self.errors
            .report(LexDiagnostic::UnrecognizedToken(lexeme), line);
    }
}
