use super::*;
use pretty_assertions::assert_eq;

#[test]
fn grammar_version_is_pinned() {
    assert_eq!(GRAMMAR_VERSION, 1);
}

#[test]
fn keywords_are_sorted_and_unique() {
    let mut sorted = KEYWORDS.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted, KEYWORDS.to_vec());
}

#[test]
fn every_keyword_is_recognized() {
    for keyword in KEYWORDS {
        assert!(is_keyword(keyword), "{keyword} should be a keyword");
    }
    for identifier in ["wchar_t", "int32_t", "main", "value", "Struct", "iff"] {
        assert!(!is_keyword(identifier), "{identifier} should not be a keyword");
    }
}

#[test]
fn operators_are_longest_first() {
    // A shorter spelling must never shadow a longer one that starts with it.
    for (i, long) in OPERATORS.iter().enumerate() {
        for short in &OPERATORS[..i] {
            assert!(
                !(long.starts_with(short) && long.len() > short.len()),
                "{short} listed before {long}"
            );
        }
    }
}

#[test]
fn precedence_table_matches_pinned_levels() {
    let expected: &[(&str, u8, Associativity)] = &[
        ("=", 1, Associativity::Right),
        ("+=", 1, Associativity::Right),
        ("-=", 1, Associativity::Right),
        ("*=", 1, Associativity::Right),
        ("/=", 1, Associativity::Right),
        ("%=", 1, Associativity::Right),
        ("<<=", 1, Associativity::Right),
        (">>=", 1, Associativity::Right),
        ("&=", 1, Associativity::Right),
        ("^=", 1, Associativity::Right),
        ("|=", 1, Associativity::Right),
        ("?", 2, Associativity::Right),
        ("||", 3, Associativity::Left),
        ("&&", 4, Associativity::Left),
        ("|", 5, Associativity::Left),
        ("^", 6, Associativity::Left),
        ("&", 7, Associativity::Left),
        ("==", 8, Associativity::Left),
        ("!=", 8, Associativity::Left),
        ("<", 9, Associativity::Left),
        ("<=", 9, Associativity::Left),
        (">", 9, Associativity::Left),
        (">=", 9, Associativity::Left),
        ("<<", 10, Associativity::Left),
        (">>", 10, Associativity::Left),
        ("+", 11, Associativity::Left),
        ("-", 11, Associativity::Left),
        ("*", 12, Associativity::Left),
        ("/", 12, Associativity::Left),
        ("%", 12, Associativity::Left),
    ];
    let actual: Vec<_> = BINARY_OPERATORS
        .iter()
        .map(|info| (info.symbol, info.level, info.associativity))
        .collect();
    assert_eq!(actual, expected.to_vec());
}

#[test]
fn every_binary_operator_is_a_token() {
    for info in BINARY_OPERATORS {
        assert!(OPERATORS.contains(&info.symbol), "{} missing", info.symbol);
        assert_eq!(binary_operator(info.symbol), Some(info));
    }
    assert!(binary_operator("->").is_none());
}

#[test]
fn unary_levels_bind_tighter_than_every_binary_level() {
    let loosest_unary = PREFIX_LEVEL.min(POSTFIX_LEVEL);
    assert!(BINARY_OPERATORS.iter().all(|info| info.level < loosest_unary));
    for symbol in PREFIX_OPERATORS.iter().chain(POSTFIX_OPERATORS) {
        assert!(OPERATORS.contains(symbol));
    }
}
