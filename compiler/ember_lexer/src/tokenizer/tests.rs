use super::*;
use pretty_assertions::assert_eq;

fn kinds_and_texts(source: &str) -> Vec<(TokenKind, &str)> {
    tokenize(source)
        .unwrap_or_else(|e| panic!("{e}"))
        .iter()
        .map(|token| (token.kind, token.text(source)))
        .collect()
}

#[test]
fn declaration() {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts("const int x = 42;"),
        vec![
            (Keyword, "const"),
            (Keyword, "int"),
            (Identifier, "x"),
            (Operator, "="),
            (Number, "42"),
            (Punctuation, ";"),
        ]
    );
}

#[test]
fn longest_operator_match() {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts("a <<= b->c >> 1 == !d"),
        vec![
            (Identifier, "a"),
            (Operator, "<<="),
            (Identifier, "b"),
            (Operator, "->"),
            (Identifier, "c"),
            (Operator, ">>"),
            (Number, "1"),
            (Operator, "=="),
            (Operator, "!"),
            (Identifier, "d"),
        ]
    );
}

#[test]
fn scope_resolution_is_punctuation() {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts("std::size_t"),
        vec![
            (Identifier, "std"),
            (Punctuation, "::"),
            (Identifier, "size_t")
        ]
    );
}

#[test]
fn numbers_with_suffixes_and_exponents() {
    let tokens = kinds_and_texts("1.5e-3f 0x1Eu 10ull .5 3.");
    let texts: Vec<&str> = tokens.iter().map(|(_, text)| *text).collect();
    assert_eq!(texts, vec!["1.5e-3f", "0x1Eu", "10ull", ".5", "3."]);
    assert!(tokens.iter().all(|(kind, _)| *kind == TokenKind::Number));
}

#[test]
fn hex_exponent_letter_is_not_a_sign() {
    let texts: Vec<&str> = kinds_and_texts("0x1e-1")
        .iter()
        .map(|(_, text)| *text)
        .collect();
    assert_eq!(texts, vec!["0x1e", "-", "1"]);
}

#[test]
fn string_and_character_literals() {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts(r#""a\"b" 'c' L"w" L'\n'"#),
        vec![
            (String, r#""a\"b""#),
            (Character, "'c'"),
            (WideString, "L\"w\""),
            (WideCharacter, r"L'\n'"),
        ]
    );
}

#[test]
fn lines_are_tracked() {
    let tokens = tokenize("a\n\nb\n  c").unwrap_or_default();
    let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, vec![1, 3, 4]);
}

#[test]
fn unterminated_string() {
    let error = tokenize("x = \"abc\ny;").err();
    assert_eq!(
        error,
        Some(CompileError::new(CompileErrorKind::UnterminatedLiteral, 1))
    );
}

#[test]
fn invalid_escape() {
    let error = tokenize("\n'\\q'").err();
    assert_eq!(
        error,
        Some(CompileError::new(
            CompileErrorKind::InvalidEscapeSequence {
                sequence: r"\q".to_string()
            },
            2
        ))
    );
}

#[test]
fn unexpected_symbol() {
    let error = tokenize("int a = @;").err();
    assert_eq!(
        error,
        Some(CompileError::new(
            CompileErrorKind::UnexpectedSymbol {
                symbol: "@".to_string()
            },
            1
        ))
    );
}

#[test]
fn identifier_starting_with_l_is_not_wide() {
    use TokenKind::*;
    assert_eq!(
        kinds_and_texts("Length"),
        vec![(Identifier, "Length")]
    );
}
