//! Hygiene: scans the lab's production sources for banned patterns.
//!
//! Every pattern has a budget of zero. The browser host runs inside a page
//! that cannot recover from a wasm trap, and dropped errors there never reach
//! a console, so failures are logged or propagated instead.

use std::fs;
use std::path::Path;

struct SourceFile {
    path: String,
    content: String,
}

/// Production `.rs` files under `src/`; sibling `_test.rs` files are skipped.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if path.extension().is_none_or(|e| e != "rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

/// Lines containing `pattern`, as `path:line` locations.
fn hits(files: &[SourceFile], pattern: &str) -> Vec<String> {
    files
        .iter()
        .flat_map(|file| {
            file.content
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(pattern))
                .map(|(n, _)| format!("  {}:{}", file.path, n + 1))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn assert_absent(pattern: &str, why: &str) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found; run from the crate root");
    let found = hits(&files, pattern);
    assert!(found.is_empty(), "`{pattern}` is not allowed ({why}), found {}:\n{}", found.len(), found.join("\n"));
}

#[test]
fn no_unwrap() {
    assert_absent(".unwrap()", "traps the page");
}

#[test]
fn no_expect() {
    assert_absent(".expect(", "traps the page");
}

#[test]
fn no_panic() {
    assert_absent("panic!(", "traps the page");
}

#[test]
fn no_unreachable() {
    assert_absent("unreachable!(", "traps the page");
}

#[test]
fn no_todo() {
    assert_absent("todo!(", "unfinished code");
}

#[test]
fn no_unimplemented() {
    assert_absent("unimplemented!(", "unfinished code");
}

#[test]
fn no_silent_discard() {
    assert_absent("let _ =", "drops a result without looking at it");
}

#[test]
fn no_dot_ok() {
    assert_absent(".ok()", "drops the error; log it or propagate it");
}

#[test]
fn no_allow_dead_code() {
    assert_absent("#[allow(dead_code)]", "delete unused code instead");
}
