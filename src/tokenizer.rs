use crate::diagnostics::{ErrorHandler, LexDiagnostic};

/// A candidate lexeme awaiting classification. `unterminated` marks a
/// string literal whose closing quote never arrived; the tokenizer has
/// already reported it, the classifier only has to emit UNKNOWN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub lexeme: String,
    pub line: usize,
    pub unterminated: bool,
}

impl Candidate {
    fn new(lexeme: String, line: usize) -> Self {
        Candidate {
            lexeme,
            line,
            unterminated: false,
        }
    }
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(
            ch,
            '{' | '}' | '(' | ')' | ';' | ',' | '=' | '+' | '-' | '*' | '/' | '%' | '^' | '<'
                | '>' | '"'
        )
}

/// Split one comment-free line into pieces, retaining every delimiter as
/// its own piece. Whitespace pieces survive here so that string reassembly
/// can keep embedded spaces; the classification pass drops them.
fn split_line(line: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buffer = String::new();

    for ch in line.chars() {
        if is_delimiter(ch) {
            if !buffer.is_empty() {
                pieces.push(std::mem::take(&mut buffer));
            }
            pieces.push(ch.to_string());
        } else {
            buffer.push(ch);
        }
    }
    if !buffer.is_empty() {
        pieces.push(buffer);
    }
    pieces
}

/// Break source text into candidate lexemes with 1-based line numbers.
/// Handles `//` and `/* */` comments and reassembles quoted string
/// literals into single candidates. Unclosed strings and comments are
/// reported to the handler here, attached to the last line seen.
pub fn tokenize(source: &str, errors: &mut ErrorHandler) -> Vec<Candidate> {
    let mut pieces: Vec<(String, usize)> = Vec::new();
    let mut in_block_comment = false;
    let mut last_line = 1;

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        last_line = line_number;

        if in_block_comment {
            if raw_line.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }

        let trimmed = raw_line.trim_start();
        if trimmed.starts_with("/*") {
            if !trimmed.contains("*/") {
                in_block_comment = true;
            }
            continue;
        }

        let code = match raw_line.find("//") {
            Some(position) => &raw_line[..position],
            None => raw_line,
        };
        if code.trim().is_empty() {
            continue;
        }

        for piece in split_line(code) {
            pieces.push((piece, line_number));
        }
    }

    // Walk the pieces once more, folding everything between a pair of bare
    // quotes back into one string-literal candidate.
    let mut candidates = Vec::new();
    let mut inside_string = false;
    let mut string_buffer = String::new();
    let mut string_line = 0;

    for (piece, line_number) in pieces {
        if piece == "\"" {
            if inside_string {
                candidates.push(Candidate::new(
                    format!("\"{}\"", string_buffer),
                    string_line,
                ));
                string_buffer.clear();
                inside_string = false;
            } else {
                inside_string = true;
                string_line = line_number;
            }
        } else if inside_string {
            string_buffer.push_str(&piece);
        } else if !piece.trim().is_empty() {
            candidates.push(Candidate::new(piece, line_number));
        }
    }

    if inside_string {
        errors.report(LexDiagnostic::UnclosedStringLiteral, last_line);
        candidates.push(Candidate {
            lexeme: format!("\"{}", string_buffer),
            line: string_line,
            unterminated: true,
        });
    }
    if in_block_comment {
        errors.report(LexDiagnostic::UnclosedComment, last_line);
    }

    candidates
}

#[cfg(test)]
mod tokenizer_tests {
    use super::*;

    fn lexemes(source: &str) -> Vec<String> {
        let mut errors = ErrorHandler::new();
        tokenize(source, &mut errors)
            .into_iter()
            .map(|candidate| candidate.lexeme)
            .collect()
    }

    #[test]
    fn test_simple_declaration() {
        assert_eq!(lexemes("int x ;"), vec!["int", "x", ";"]);
    }

    #[test]
    fn test_delimiters_split_without_spaces() {
        assert_eq!(
            lexemes("def int add(){}"),
            vec!["def", "int", "add", "(", ")", "{", "}"]
        );
    }

    #[test]
    fn test_operators_are_their_own_pieces() {
        assert_eq!(lexemes("x=y+3;"), vec!["x", "=", "y", "+", "3", ";"]);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let mut errors = ErrorHandler::new();
        let candidates = tokenize("int x ;\nint y ;", &mut errors);
        assert_eq!(candidates[0].line, 1);
        assert_eq!(candidates[3].line, 2);
    }

    #[test]
    fn test_line_comment_is_stripped() {
        assert_eq!(lexemes("int x ; // trailing note"), vec!["int", "x", ";"]);
        assert!(lexemes("// whole line").is_empty());
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let source = "int a ;\n/* ignore\nall of\nthis */\nint b ;";
        assert_eq!(lexemes(source), vec!["int", "a", ";", "int", "b", ";"]);
    }

    #[test]
    fn test_block_comment_on_one_line_is_skipped() {
        assert_eq!(lexemes("/* note */\nint x ;"), vec!["int", "x", ";"]);
    }

    #[test]
    fn test_unclosed_block_comment_is_reported() {
        let mut errors = ErrorHandler::new();
        let candidates = tokenize("int x ;\n/* open", &mut errors);
        assert_eq!(candidates.len(), 3);
        assert!(errors.has_errors());
        assert!(matches!(
            errors.diagnostics()[0].get_kind(),
            LexDiagnostic::UnclosedComment
        ));
        assert_eq!(errors.diagnostics()[0].get_line(), 2);
    }

    #[test]
    fn test_string_is_reassembled_with_spaces() {
        assert_eq!(
            lexemes("out \"hello world\" ;"),
            vec!["out", "\"hello world\"", ";"]
        );
    }

    #[test]
    fn test_string_keeps_delimiters_verbatim() {
        assert_eq!(lexemes("\"a+b=c;\""), vec!["\"a+b=c;\""]);
    }

    #[test]
    fn test_unclosed_string_is_reported_once() {
        let mut errors = ErrorHandler::new();
        let candidates = tokenize("out \"hello", &mut errors);
        assert_eq!(candidates.len(), 2);
        assert!(candidates[1].unterminated);
        assert_eq!(candidates[1].lexeme, "\"hello");
        assert_eq!(errors.diagnostics().len(), 1);
        assert!(matches!(
            errors.diagnostics()[0].get_kind(),
            LexDiagnostic::UnclosedStringLiteral
        ));
    }

    #[test]
    fn test_unclosed_string_diagnosed_at_last_line() {
        let mut errors = ErrorHandler::new();
        tokenize("int x ;\nout \"hello\nint y ;", &mut errors);
        assert_eq!(errors.diagnostics()[0].get_line(), 3);
    }

    #[test]
    fn test_empty_source() {
        let mut errors = ErrorHandler::new();
        assert!(tokenize("", &mut errors).is_empty());
        assert!(!errors.has_errors());
    }
}
