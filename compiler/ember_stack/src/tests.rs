use super::*;

fn nested_sum(depth: u32) -> u64 {
    ensure_sufficient_stack(|| {
        if depth == 0 {
            0
        } else {
            nested_sum(depth - 1) + u64::from(depth)
        }
    })
}

#[test]
fn shallow_nesting_returns_value() {
    assert_eq!(nested_sum(4), 10);
}

#[test]
fn deep_nesting_does_not_overflow() {
    // Roughly the depth of a 200k-term `a + a + ...` expression.
    assert_eq!(nested_sum(200_000), 20_000_100_000);
}

#[test]
fn propagates_results() {
    let result: Result<u8, String> = ensure_sufficient_stack(|| Err("stop".to_string()));
    assert_eq!(result, Err("stop".to_string()));
}
