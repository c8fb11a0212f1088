//! Integration tests for the lexer
//!
//! Tests tokenization of whole scripts through the public API.

use bitquest_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// =============================================================================
// Whole Scripts
// =============================================================================

#[test]
fn lex_script_balances_indentation() {
    let source = "\
for i in range(3):
    if i % 2 == 0:
        print('even', i)
    else:
        print('odd', i)
print('done')
";
    let tokens = kinds(source);
    let indents = tokens.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = tokens.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, 3);
    assert_eq!(indents, dedents);
    assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    assert!(!tokens.iter().any(|k| matches!(k, TokenKind::Error(_))));
}

#[test]
fn lex_keywords_and_names() {
    assert_eq!(
        kinds("while not done and tries"),
        vec![
            TokenKind::While,
            TokenKind::Not,
            TokenKind::Name("done".into()),
            TokenKind::And,
            TokenKind::Name("tries".into()),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_literals() {
    assert_eq!(
        kinds("1 2.5 'bone' True None"),
        vec![
            TokenKind::Int(1),
            TokenKind::Float(2.5),
            TokenKind::Str("bone".into()),
            TokenKind::True,
            TokenKind::None,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_comment_only_script() {
    assert_eq!(kinds("# just a note\n   # another\n"), vec![TokenKind::Eof]);
}

// =============================================================================
// Positions and Errors
// =============================================================================

#[test]
fn lex_error_token_has_position() {
    let tokens = Lexer::tokenize_all("x = 1\ny = 2 $ 3\n");
    let error = tokens
        .iter()
        .find(|t| matches!(t.kind, TokenKind::Error(_)))
        .expect("stray character should produce an error token");
    assert_eq!(error.span.line, 2);
    assert_eq!(error.span.column, 7);
}

#[test]
fn lex_spans_cover_source_text() {
    let source = "print('woof')";
    let tokens = Lexer::tokenize_all(source);
    assert_eq!(tokens[0].span.text(source), "print");
    assert_eq!(tokens[2].span.text(source), "'woof'");
}
