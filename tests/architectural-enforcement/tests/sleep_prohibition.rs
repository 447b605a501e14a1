//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Waiting happens on
//! I/O, channels or `tokio::time::interval`, never on a timer in a loop.
//! **Exceptions**: test code (`#[cfg(test)]` modules and `tests/`)

use architectural_enforcement::{find_violations, report, PRODUCTION_DIRS};

#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_violations(&PRODUCTION_DIRS, |code| {
        code.contains("::sleep(") || code.contains(".sleep(")
    });

    report(
        "Sleep calls found in production code (use async I/O or interval)",
        &violations,
    );
}
