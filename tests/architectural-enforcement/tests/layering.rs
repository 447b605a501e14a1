//! Integration Test: Core/UI Layering
//!
//! **Policy**: `partchat-core` is headless. It must not depend on, or name,
//! any terminal UI crate, so other front-ends and tests can drive it.

use std::fs;

use architectural_enforcement::{find_violations, report, workspace_root};

const UI_CRATES: [&str; 2] = ["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("chat/core/Cargo.toml")).unwrap();

    for krate in UI_CRATES {
        assert!(
            !manifest.lines().any(|line| line.trim_start().starts_with(krate)),
            "chat/core/Cargo.toml depends on {krate}"
        );
    }
}

#[test]
fn test_core_sources_do_not_use_ui_crates() {
    let violations = find_violations(&["chat/core/src"], |code| {
        UI_CRATES
            .iter()
            .any(|krate| code.contains(&format!("{krate}::")))
    });

    report("UI crate used inside partchat-core", &violations);
}

#[test]
fn test_tui_talks_to_backend_only_through_core() {
    let violations = find_violations(&["tui/src"], |code| code.contains("reqwest::"));

    report("HTTP client used directly in the TUI", &violations);
}
