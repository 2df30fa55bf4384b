use serde::Serialize;
use std::collections::HashMap;

/// Semantic type recorded for a name in the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolType {
    Integer,
    Decimal,
    Character,
    Boolean,
    StringType,
    Function,
    Unknown,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Integer => "INTEGER",
            SymbolType::Decimal => "DECIMAL",
            SymbolType::Character => "CHARACTER",
            SymbolType::Boolean => "BOOLEAN",
            SymbolType::StringType => "STRING",
            SymbolType::Function => "FUNCTION",
            SymbolType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One symbol table entry. The value holds a literal's own text, or for a
/// function the return-type keyword it was declared with; empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    name: String,
    symbol_type: SymbolType,
    scope: String,
    value: String,
}

impl Symbol {
    pub fn new(name: &str, symbol_type: SymbolType, scope: &str, value: &str) -> Self {
        Symbol {
            name: name.to_string(),
            symbol_type,
            scope: scope.to_string(),
            value: value.to_string(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_type(&self) -> SymbolType {
        self.symbol_type
    }

    pub fn get_scope(&self) -> &str {
        &self.scope
    }

    pub fn get_value(&self) -> &str {
        &self.value
    }
}

/// Scoped name store keyed by (name, scope). The first insertion for a key
/// wins; later insertions for the same key are no-ops.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<(String, String), Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: Symbol) {
        let key = (symbol.name.clone(), symbol.scope.clone());
        self.entries.entry(key).or_insert(symbol);
    }

    pub fn lookup(&self, name: &str, scope: &str) -> Option<&Symbol> {
        self.entries.get(&(name.to_string(), scope.to_string()))
    }

    pub fn contains(&self, name: &str, scope: &str) -> bool {
        self.entries
            .contains_key(&(name.to_string(), scope.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.values()
    }
}
