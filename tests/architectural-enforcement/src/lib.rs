//! Architectural Enforcement Integration Tests
//!
//! This package contains source-scanning tests that enforce workspace rules:
//! - No blocking I/O inside async code
//! - No ambient environment reads outside the configuration module
//!
//! The scanner is line-based: it knows which function a line sits in (async or
//! not) and treats everything after a top-level `#[cfg(test)]` as test code.
//! Comments are ignored.

use std::fs;
use std::path::{Path, PathBuf};

/// Source trees that ship in the binary
pub const PRODUCTION_DIRS: &[&str] = &["copilot/core/src", "copilot/cli/src"];

/// Workspace root, resolved from this crate's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// Kind of function a line belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FnContext {
    /// Inside an `async fn`
    Async,
    /// Inside a plain `fn`
    Sync,
    /// Outside any function (items, imports)
    Module,
}

/// A rule violation, printed as `path:line - kind: code`
#[derive(Clone, Debug)]
pub struct Violation {
    pub path: String,
    pub line_number: usize,
    pub kind: &'static str,
    pub code: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}: {}", self.path, self.line_number, self.kind, self.code)
    }
}

/// One Rust source file
pub struct SourceFile {
    /// Path relative to the workspace root, with `/` separators
    pub path: String,
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Build from in-memory text (used by the scanner's own tests)
    pub fn from_text(path: &str, text: &str) -> Self {
        Self {
            path: path.to_string(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Production lines: `(index, code)` pairs with comments stripped, stopping
    /// at the first top-level `#[cfg(test)]`
    pub fn production_lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .take_while(|(_, line)| !line.starts_with("#[cfg(test)]"))
            .map(|(idx, line)| (idx, code_part(line)))
            .filter(|(_, code)| !code.trim().is_empty())
    }

    /// Kind of the function enclosing line `idx`
    pub fn enclosing_fn(&self, idx: usize) -> FnContext {
        for line in self.lines[..=idx].iter().rev() {
            let trimmed = line.trim_start();
            if let Some(is_async) = fn_signature(trimmed) {
                return if is_async {
                    FnContext::Async
                } else {
                    FnContext::Sync
                };
            }
            // Items at column zero end the search
            if line.starts_with('}')
                || line.starts_with("impl")
                || line.starts_with("mod ")
                || line.starts_with("pub mod ")
            {
                return FnContext::Module;
            }
        }
        FnContext::Module
    }

    /// Violation record for line `idx`
    pub fn violation(&self, idx: usize, kind: &'static str) -> Violation {
        Violation {
            path: self.path.clone(),
            line_number: idx + 1,
            kind,
            code: self.lines[idx].trim().to_string(),
        }
    }
}

/// All Rust files under the production trees
///
/// # Panics
///
/// Panics if a production tree is missing, so a moved crate cannot make the
/// rules pass vacuously.
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    let mut sources = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        assert!(path.is_dir(), "production tree not found: {}", path.display());

        for entry in walkdir::WalkDir::new(&path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.path().extension().and_then(|s| s.to_str()) != Some("rs") {
                continue;
            }
            let Ok(text) = fs::read_to_string(entry.path()) else {
                continue;
            };
            let relative = entry
                .path()
                .strip_prefix(&root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            sources.push(SourceFile::from_text(&relative, &text));
        }
    }

    sources
}

/// Test-only module files (`test_utils.rs`) are exempt from production rules
pub fn is_test_support(path: &str) -> bool {
    path.ends_with("test_utils.rs")
}

/// `Some(is_async)` if the line opens a function
fn fn_signature(line: &str) -> Option<bool> {
    let mut rest = line;
    for prefix in ["pub(crate) ", "pub(super) ", "pub ", "const ", "unsafe "] {
        rest = rest.strip_prefix(prefix).unwrap_or(rest);
    }
    if rest.starts_with("async fn ") {
        Some(true)
    } else if rest.starts_with("fn ") {
        Some(false)
    } else {
        None
    }
}

/// The code before a line comment
fn code_part(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") {
        return "";
    }
    match line.find(" //") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let file = SourceFile::from_text(
            "a.rs",
            "impl Store {\n    pub async fn load(&self) {\n        let x = 1;\n    }\n}",
        );
        assert_eq!(file.enclosing_fn(2), FnContext::Async);
    }

    #[test]
    fn test_sync_function_detection() {
        let file = SourceFile::from_text(
            "a.rs",
            "pub fn load_config() {\n    let text = read();\n}",
        );
        assert_eq!(file.enclosing_fn(1), FnContext::Sync);
    }

    #[test]
    fn test_module_level_lines() {
        let file = SourceFile::from_text("a.rs", "fn a() {\n}\nuse std::fs;");
        assert_eq!(file.enclosing_fn(2), FnContext::Module);
    }

    #[test]
    fn test_test_region_excluded() {
        let file = SourceFile::from_text(
            "a.rs",
            "fn a() {}\n// comment only\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}",
        );
        let lines: Vec<usize> = file.production_lines().map(|(idx, _)| idx).collect();
        assert_eq!(lines, vec![0]);
    }

    #[test]
    fn test_trailing_comment_stripped() {
        assert_eq!(code_part("let a = 1; // std::fs::read"), "let a = 1;");
        assert_eq!(code_part("    // std::fs::read"), "");
        assert_eq!(
            code_part(r#"let url = "http://localhost";"#),
            r#"let url = "http://localhost";"#
        );
    }
}
