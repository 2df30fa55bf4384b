/* Good resource for parsing regex at
 * https://matt.might.net/articles/parsing-regex-with-recursive-descent/ */

use color_eyre::eyre::{Report, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Star,
    Question,
    Plus,
}

#[derive(Debug)]
pub enum Base {
    Character(char),
    EscapeCharacter(char),
    Exp(Box<RegEx>),
    CharSet(HashSet<char>),
}

#[derive(Debug)]
pub enum Factor {
    SimpleFactor(Base, Option<Quantifier>),
}

#[derive(Debug)]
pub enum Term {
    SimpleTerm(Factor),
    ConcatTerm(Factor, Box<Term>),
}

#[derive(Debug)]
pub enum RegEx {
    SimpleRegex(Term),
    AlterRegex(Term, Box<RegEx>),
}

#[derive(Debug)]
pub enum RegexError {
    InvalidPattern(String),
    UnclosedCharacterClass(String),
    UnclosedGroup(String),
    UnmatchedParen(String),
    InvalidCharacterRange(char, char),
}

impl std::fmt::Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegexError::InvalidPattern(pattern) => {
                write!(f, "Error: Invalid pattern provided: {}", pattern)
            }
            RegexError::UnclosedCharacterClass(pattern) => {
                write!(f, "Error: {} has an unclosed character class!", pattern)
            }
            RegexError::UnclosedGroup(pattern) => {
                write!(f, "Error: {} has an unclosed group!", pattern)
            }
            RegexError::UnmatchedParen(pattern) => {
                write!(f, "Error: {} has an unmatched ')'!", pattern)
            }
            RegexError::InvalidCharacterRange(start, end) => write!(
                f,
                "Error: Invalid character range provided: {} - {}",
                start, end
            ),
        }
    }
}

impl std::error::Error for RegexError {}

fn char_at(pattern: &str, index: usize) -> Option<char> {
    pattern.chars().nth(index)
}

// If these characters open a base term the pattern is malformed
fn nchar_is_valid(nchar: char) -> bool {
    !matches!(nchar, '*' | '+' | '|' | '?' | ')' | ']')
}

/// Expand the body of a bracket expression. `start` points at the first
/// character after the `[`; the returned offset points at the closing `]`.
/// A leading `^` complements the member set against printable ASCII 32-126.
fn expand_char_class(pattern: &str, start: usize) -> Result<(HashSet<char>, usize), RegexError> {
    let mut pos = start;
    let mut char_set: HashSet<char> = HashSet::new();
    let mut negation = false;

    if char_at(pattern, pos) == Some('^') {
        negation = true;
        pos += 1;
    }

    loop {
        let ch = match char_at(pattern, pos) {
            None => return Err(RegexError::UnclosedCharacterClass(pattern.to_string())),
            Some(ch) => ch,
        };
        if ch == ']' {
            break;
        }
        if ch == '\\' {
            // Escaped member, taken literally whatever it is
            match char_at(pattern, pos + 1) {
                None => return Err(RegexError::UnclosedCharacterClass(pattern.to_string())),
                Some(escaped) => {
                    char_set.insert(escaped);
                    pos += 2;
                }
            }
            continue;
        }
        match (char_at(pattern, pos + 1), char_at(pattern, pos + 2)) {
            // A `-` that is the last member before `]` is a literal, not a range
            (Some('-'), Some(range_end)) if range_end != ']' => {
                if range_end < ch {
                    return Err(RegexError::InvalidCharacterRange(ch, range_end));
                }
                for member in ch..=range_end {
                    char_set.insert(member);
                }
                pos += 3;
            }
            _ => {
                char_set.insert(ch);
                pos += 1;
            }
        }
    }

    let char_set = if negation {
        let mut printable: HashSet<char> = HashSet::new();
        for code in 32u8..=126 {
            printable.insert(code as char);
        }
        printable.difference(&char_set).cloned().collect()
    } else {
        char_set
    };

    if char_set.is_empty() {
        return Err(RegexError::InvalidPattern(pattern.to_string()));
    }

    Ok((char_set, pos))
}

fn parse_base(pattern: &str, start: usize) -> Result<(Base, usize)> {
    let nchar = match char_at(pattern, start) {
        None => {
            let err = Report::new(RegexError::InvalidPattern(pattern.to_string()));
            return Err(err);
        }
        Some(nchar) => nchar,
    };
    if nchar == '(' {
        let (inner_regex, new_start) = parse_regex(pattern, start + 1)?;
        if char_at(pattern, new_start) != Some(')') {
            let err = Report::new(RegexError::UnclosedGroup(pattern.to_string()));
            return Err(err);
        }
        let new_base = Base::Exp(Box::new(inner_regex));
        Ok((new_base, new_start + 1)) // Consume the rparen
    } else if nchar == '[' {
        let (char_set, new_start) = match expand_char_class(pattern, start + 1) {
            Ok((char_set, new_start)) => (char_set, new_start),
            Err(err) => {
                let err = Report::new(err);
                return Err(err);
            }
        };
        let new_base = Base::CharSet(char_set);
        Ok((new_base, new_start + 1)) // Consume the rbracket
    } else if nchar == '\\' {
        match char_at(pattern, start + 1) {
            // A trailing backslash escapes nothing
            None => {
                let err = Report::new(RegexError::InvalidPattern(pattern.to_string()));
                Err(err)
            }
            Some(escaped) => Ok((Base::EscapeCharacter(escaped), start + 2)),
        }
    } else if nchar_is_valid(nchar) {
        let new_base = Base::Character(nchar);
        Ok((new_base, start + 1))
    } else {
        let err = Report::new(RegexError::InvalidPattern(pattern.to_string()));
        Err(err)
    }
}

fn parse_factor(pattern: &str, start: usize) -> Result<(Factor, usize)> {
    let (base, new_start) = parse_base(pattern, start)?;

    let mut new_start = new_start;
    let quantifier = match char_at(pattern, new_start) {
        Some('*') => {
            new_start += 1;
            Some(Quantifier::Star)
        }
        Some('?') => {
            new_start += 1;
            Some(Quantifier::Question)
        }
        Some('+') => {
            new_start += 1;
            Some(Quantifier::Plus)
        }
        _ => None,
    };
    let factor = Factor::SimpleFactor(base, quantifier);
    Ok((factor, new_start))
}

fn parse_term(pattern: &str, start: usize) -> Result<(Term, usize)> {
    let (factor, mut new_start) = parse_factor(pattern, start)?;

    let mut prev_term = Term::SimpleTerm(factor);

    while new_start < pattern.chars().count() {
        let nchar = match char_at(pattern, new_start) {
            None => break,
            Some(nchar) => nchar,
        };
        if nchar == '|' || nchar == ')' {
            break;
        }
        let (next_factor, tmp_start) = parse_factor(pattern, new_start)?;
        prev_term = Term::ConcatTerm(next_factor, Box::new(prev_term));
        new_start = tmp_start;
    }
    Ok((prev_term, new_start))
}

fn parse_regex(pattern: &str, start: usize) -> Result<(RegEx, usize)> {
    let (term, new_start) = parse_term(pattern, start)?;
    if char_at(pattern, new_start) == Some('|') {
        let (next_regex, new_start) = parse_regex(pattern, new_start + 1)?;
        Ok((RegEx::AlterRegex(term, Box::new(next_regex)), new_start))
    } else {
        Ok((RegEx::SimpleRegex(term), new_start))
    }
}

/// Parse a pattern into its syntax tree. The whole pattern must be consumed;
/// a leftover `)` is an unmatched paren, anything else is an invalid pattern.
pub fn build_syntax_tree(pattern: &str) -> Result<RegEx> {
    if pattern.is_empty() {
        let err = Report::new(RegexError::InvalidPattern(pattern.to_string()));
        return Err(err);
    }

    let (syntax_tree, consumed) = parse_regex(pattern, 0)?;
    match char_at(pattern, consumed) {
        None => Ok(syntax_tree),
        Some(')') => {
            let err = Report::new(RegexError::UnmatchedParen(pattern.to_string()));
            Err(err)
        }
        Some(_) => {
            let err = Report::new(RegexError::InvalidPattern(pattern.to_string()));
            Err(err)
        }
    }
}

#[cfg(test)]
mod regex_tests {
    use super::*;

    fn assert_simple_char(regex: &RegEx, expected_char: char) {
        match regex {
            RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(
                Base::Character(c),
                None,
            ))) if *c == expected_char => {}
            _ => panic!("Expected simple char '{}', got {:?}", expected_char, regex),
        }
    }

    #[test]
    fn test_simple_base() {
        let result = build_syntax_tree("a");
        assert!(result.is_ok());
        assert_simple_char(&result.unwrap(), 'a');
    }

    #[test]
    fn test_concatenation() {
        let result = build_syntax_tree("ab");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::ConcatTerm(
                Factor::SimpleFactor(Base::Character('b'), None),
                lterm,
            )) => match *lterm {
                Term::SimpleTerm(Factor::SimpleFactor(Base::Character('a'), None)) => {}
                term => panic!("Expected 'a' on the left, got {:?}", term),
            },
            tree => panic!("Expected concatenation, got {:?}", tree),
        }
    }

    #[test]
    fn test_alternation() {
        let result = build_syntax_tree("a|b");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::AlterRegex(
                Term::SimpleTerm(Factor::SimpleFactor(Base::Character('a'), None)),
                rregex,
            ) => match *rregex {
                RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(
                    Base::Character('b'),
                    None,
                ))) => {}
                tree => panic!("Expected 'b' on the right, got {:?}", tree),
            },
            tree => panic!("Expected alternation, got {:?}", tree),
        }
    }

    #[test]
    fn test_three_way_alternation_is_right_associated() {
        let result = build_syntax_tree("a|b|c");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::AlterRegex(_, rregex) => match *rregex {
                RegEx::AlterRegex(_, innermost) => match *innermost {
                    RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(
                        Base::Character('c'),
                        None,
                    ))) => {}
                    tree => panic!("Expected 'c' innermost, got {:?}", tree),
                },
                tree => panic!("Expected nested alternation, got {:?}", tree),
            },
            tree => panic!("Expected alternation, got {:?}", tree),
        }
    }

    #[test]
    fn test_quantifiers() {
        for (pattern, expected) in [
            ("a*", Quantifier::Star),
            ("a+", Quantifier::Plus),
            ("a?", Quantifier::Question),
        ] {
            let result = build_syntax_tree(pattern);
            assert!(result.is_ok());
            match result.unwrap() {
                RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(
                    Base::Character('a'),
                    Some(quantifier),
                ))) => assert_eq!(quantifier, expected),
                tree => panic!("Expected quantified 'a', got {:?}", tree),
            }
        }
    }

    #[test]
    fn test_group() {
        let result = build_syntax_tree("(a)");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(Base::Exp(inner), None))) => {
                assert_simple_char(&inner, 'a')
            }
            tree => panic!("Expected group, got {:?}", tree),
        }
    }

    #[test]
    fn test_character_set() {
        let result = build_syntax_tree("[abc]");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(Base::CharSet(set), None))) => {
                assert_eq!(set.len(), 3);
                assert!(set.contains(&'a'));
                assert!(set.contains(&'b'));
                assert!(set.contains(&'c'));
            }
            tree => panic!("Expected character set, got {:?}", tree),
        }
    }

    #[test]
    fn test_character_range() {
        let result = build_syntax_tree("[a-c0-1]");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(Base::CharSet(set), None))) => {
                assert_eq!(set.len(), 5);
                assert!(set.contains(&'a'));
                assert!(set.contains(&'c'));
                assert!(set.contains(&'0'));
                assert!(set.contains(&'1'));
            }
            tree => panic!("Expected character set, got {:?}", tree),
        }
    }

    #[test]
    fn test_escaped_hyphen_in_set() {
        // The operator pattern relies on this: [+\-*/%^=]
        let result = build_syntax_tree("[+\\-*/%^=]");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(Base::CharSet(set), None))) => {
                for member in ['+', '-', '*', '/', '%', '^', '='] {
                    assert!(set.contains(&member), "missing member {}", member);
                }
                assert_eq!(set.len(), 7);
            }
            tree => panic!("Expected character set, got {:?}", tree),
        }
    }

    #[test]
    fn test_trailing_hyphen_is_literal() {
        let result = build_syntax_tree("[a-]");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(Base::CharSet(set), None))) => {
                assert_eq!(set.len(), 2);
                assert!(set.contains(&'a'));
                assert!(set.contains(&'-'));
            }
            tree => panic!("Expected character set, got {:?}", tree),
        }
    }

    #[test]
    fn test_negated_set() {
        let result = build_syntax_tree("[^\"]");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::SimpleTerm(Factor::SimpleFactor(Base::CharSet(set), None))) => {
                assert!(!set.contains(&'"'));
                assert!(set.contains(&'a'));
                assert!(set.contains(&' '));
                assert!(set.contains(&'~'));
                assert!(!set.contains(&'\n'));
                assert_eq!(set.len(), 94);
            }
            tree => panic!("Expected character set, got {:?}", tree),
        }
    }

    #[test]
    fn test_invalid_character_range() {
        let result = build_syntax_tree("[z-a]");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref::<RegexError>().unwrap() {
            RegexError::InvalidCharacterRange('z', 'a') => {}
            err => panic!("Expected InvalidCharacterRange, got {:?}", err),
        }
    }

    #[test]
    fn test_unclosed_character_class() {
        let result = build_syntax_tree("[a-z");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref::<RegexError>().unwrap() {
            RegexError::UnclosedCharacterClass(_) => {}
            err => panic!("Expected UnclosedCharacterClass, got {:?}", err),
        }
    }

    #[test]
    fn test_unclosed_group() {
        let result = build_syntax_tree("(ab");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref::<RegexError>().unwrap() {
            RegexError::UnclosedGroup(_) => {}
            err => panic!("Expected UnclosedGroup, got {:?}", err),
        }
    }

    #[test]
    fn test_unmatched_paren() {
        let result = build_syntax_tree("ab)");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref::<RegexError>().unwrap() {
            RegexError::UnmatchedParen(_) => {}
            err => panic!("Expected UnmatchedParen, got {:?}", err),
        }
    }

    #[test]
    fn test_trailing_backslash() {
        let result = build_syntax_tree("ab\\");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref::<RegexError>().unwrap() {
            RegexError::InvalidPattern(_) => {}
            err => panic!("Expected InvalidPattern, got {:?}", err),
        }
    }

    #[test]
    fn test_quantifier_without_operand() {
        let result = build_syntax_tree("*a");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref::<RegexError>().unwrap() {
            RegexError::InvalidPattern(_) => {}
            err => panic!("Expected InvalidPattern, got {:?}", err),
        }
    }

    #[test]
    fn test_empty_pattern() {
        let result = build_syntax_tree("");
        assert!(result.is_err());
    }

    #[test]
    fn test_escape_bypasses_operator_meaning() {
        let result = build_syntax_tree("a\\*");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::ConcatTerm(
                Factor::SimpleFactor(Base::EscapeCharacter('*'), None),
                _,
            )) => {}
            tree => panic!("Expected escaped '*', got {:?}", tree),
        }
    }

    #[test]
    fn test_nested_group_with_quantifier() {
        let result = build_syntax_tree("(a|b)*c");
        assert!(result.is_ok());
        match result.unwrap() {
            RegEx::SimpleRegex(Term::ConcatTerm(
                Factor::SimpleFactor(Base::Character('c'), None),
                lterm,
            )) => match *lterm {
                Term::SimpleTerm(Factor::SimpleFactor(Base::Exp(_), Some(Quantifier::Star))) => {}
                term => panic!("Expected starred group, got {:?}", term),
            },
            tree => panic!("Expected concatenation, got {:?}", tree),
        }
    }
}
