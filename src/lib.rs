//! # xcllex
//!
//! The lexical front-end of the experimental xcl language.
//!
//! This library provides functionality to:
//! - Parse regular expression patterns into syntax trees
//! - Convert patterns to NFAs using Thompson Construction
//! - Convert NFAs to DFAs using Subset Construction
//! - Split xcl source into candidate lexemes, comments stripped
//! - Classify lexemes context-sensitively into a token stream
//! - Maintain a scoped symbol table and a lexical diagnostic list

// Re-export the modules
pub mod analyzer;
pub mod dfa;
pub mod diagnostics;
pub mod fa;
pub mod nfa;
pub mod regex;
pub mod symbols;
pub mod token;
pub mod tokenizer;

// Re-export commonly used items for convenience
pub use analyzer::{LexicalAnalyzer, PatternKind};
pub use dfa::{construct_dfa, DFA};
pub use diagnostics::{Diagnostic, ErrorHandler, LexDiagnostic};
pub use fa::to_dot;
pub use nfa::construct_nfa;
pub use regex::build_syntax_tree;
pub use symbols::{Symbol, SymbolTable, SymbolType};
pub use token::{Token, TokenKind};
