//! Integration Test: Panic Shortcut Prohibition
//!
//! **Policy**: Production code propagates errors with `?` or handles them.
//! `.unwrap()` and `.expect(` are allowed only in test code.

use architectural_enforcement::{find_violations, report, PRODUCTION_DIRS};

#[test]
fn test_no_unwrap_or_expect_in_production_code() {
    let violations = find_violations(&PRODUCTION_DIRS, |code| {
        code.contains(".unwrap()") || code.contains(".expect(")
    });

    report("unwrap/expect found in production code", &violations);
}
