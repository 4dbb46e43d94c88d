//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async code in `copilot-core` and `copilot-cli` MUST NOT block the
//! runtime thread.
//! **Required**: Use `tokio::fs`, `tokio::net`, `tokio::time::sleep` and async
//! `reqwest` inside `async fn`.
//!
//! Blocking calls remain acceptable in plain `fn`s that run before the runtime
//! work starts (configuration loading, the stdout prompt) and in test code.

use architectural_enforcement::{is_test_support, production_sources, FnContext, Violation};

/// Calls that block wherever they appear
const ALWAYS_BLOCKING: &[(&str, &str)] = &[
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::net::", "Blocking network I/O"),
    ("std::thread::sleep", "Thread sleep"),
];

/// Calls that block the runtime when made from async code
const BLOCKING_IN_ASYNC: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
    ("std::process::Command", "Blocking process I/O"),
    (".exists()", "Blocking file metadata"),
];

/// Non-blocking items under the prohibited paths
const ALLOWED: &[&str] = &["std::fs::Permissions"];

fn find_blocking_io_violations() -> Vec<Violation> {
    let mut violations = Vec::new();

    for file in production_sources() {
        if is_test_support(&file.path) {
            continue;
        }

        for (idx, code) in file.production_lines() {
            let code = ALLOWED
                .iter()
                .fold(code.to_string(), |code, allowed| code.replace(allowed, ""));

            for (pattern, kind) in ALWAYS_BLOCKING {
                if code.contains(*pattern) {
                    violations.push(file.violation(idx, *kind));
                }
            }

            if code.trim_start().starts_with("use std::fs") {
                violations.push(file.violation(idx, "Blocking file I/O import"));
            }

            if file.enclosing_fn(idx) == FnContext::Async {
                for (pattern, kind) in BLOCKING_IN_ASYNC {
                    if code.contains(*pattern) {
                        violations.push(file.violation(idx, *kind));
                    }
                }
            }
        }
    }

    violations
}

/// Test that async production code does not block
#[test]
fn test_no_blocking_io_in_async_code() {
    let violations = find_blocking_io_violations();

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nREQUIRED async I/O:");
        eprintln!("  - tokio::fs::read_to_string().await, tokio::fs::write().await");
        eprintln!("  - tokio::io::stdin() with AsyncBufReadExt::lines()");
        eprintln!("  - tokio::time::sleep().await");
        eprintln!("  - reqwest::Client (async)");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.",
            violations.len()
        );
    }
}

/// The scan covers the production trees at all
#[test]
fn test_scan_finds_sources() {
    let sources = production_sources();
    assert!(sources.iter().any(|f| f.path == "copilot/core/src/chat.rs"));
    assert!(sources.iter().any(|f| f.path == "copilot/cli/src/main.rs"));
}
