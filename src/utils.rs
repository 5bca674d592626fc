//! Utility functions for text cleanup, string truncation and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing and HTML-to-text reduction
//! - Bounded, single-line text snippets for the store
//! - String truncation for logging
//! - File system validation for the store location

use scraper::Html;
use std::fs as stdfs;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce an HTML fragment to its text nodes, separated by spaces.
pub fn html_to_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    html.root_element().text().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `text` with newlines replaced by spaces.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(snippet("a\nb", 800), "a b");
/// ```
pub fn snippet(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file
/// whose name is unique to this process, so no existing file is touched.
///
/// # Errors
///
/// Returns the underlying I/O error, kind intact, if the directory cannot be
/// created or written (permission denied, read-only filesystem, full disk...).
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> io::Result<()> {
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let scratch = dir.join(format!(".paraiba_news_write_check.{}", std::process::id()));
    stdfs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&scratch)?;
    let _ = stdfs::remove_file(&scratch);
    info!(dir = %dir.display(), "Store directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b\u{a0}\u{a0}c  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text(r#"<a href="x">Título</a>&nbsp;<font>Fonte</font>"#);
        assert_eq!(collapse_whitespace(&text), "Título Fonte");
    }

    #[test]
    fn test_snippet_bounds_and_flattens() {
        assert_eq!(snippet("linha um\nlinha dois\n", 800), "linha um linha dois");
        assert_eq!(snippet("ação", 2), "aç");
        assert_eq!(snippet("", 10), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let result = truncate_for_log("ééé", 1);
        assert_eq!(result, "é…(+4 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("store.csv");
        ensure_writable_parent(&file).await.unwrap();
        assert!(dir.path().join("nested").is_dir());
        let leftovers = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_keeps_io_error_kind() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("plain_file");
        std::fs::write(&blocker, "x").unwrap();
        let file = blocker.join("store.csv");

        let expected = std::fs::create_dir_all(&blocker).unwrap_err().kind();
        let err = ensure_writable_parent(&file).await.unwrap_err();
        assert_eq!(err.kind(), expected);
        assert_ne!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
