use super::*;
use pretty_assertions::assert_eq;

fn narrow(content: &str) -> Vec<u32> {
    unescape(content, false).unwrap_or_default()
}

#[test]
fn plain_text_passes_through() {
    assert_eq!(narrow("abc"), vec![97, 98, 99]);
}

#[test]
fn simple_escapes() {
    assert_eq!(narrow(r#"\n\t\\\"\'"#), vec![10, 9, 92, 34, 39]);
}

#[test]
fn octal_and_hex_escapes() {
    assert_eq!(narrow(r"\0"), vec![0]);
    assert_eq!(narrow(r"\101\x41"), vec![65, 65]);
    assert_eq!(narrow(r"\1234"), vec![83, 52]);
}

#[test]
fn narrow_non_ascii_becomes_utf8_bytes() {
    assert_eq!(narrow("é"), vec![0xC3, 0xA9]);
}

#[test]
fn wide_keeps_characters() {
    assert_eq!(unescape("é\\x100", true), Ok(vec![0xE9, 0x100]));
}

#[test]
fn invalid_escape_is_reported() {
    assert_eq!(
        unescape(r"ab\q", false),
        Err(CompileErrorKind::InvalidEscapeSequence {
            sequence: r"\q".to_string()
        })
    );
    assert!(unescape(r"\x", false).is_err());
    assert!(unescape("\\", false).is_err());
}
