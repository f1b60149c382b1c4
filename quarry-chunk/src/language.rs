//! File-extension based language detection.

use std::path::Path;

/// Map a file path to a language tag by its extension.
///
/// Unknown extensions (and files without one) map to `"text"`. The tag is
/// stored alongside each indexed file and echoed back in retrieval results
/// so callers can render fenced code blocks.
pub fn language_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("py") => "python",
        Some("js") | Some("jsx") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("html") => "html",
        Some("css") => "css",
        Some("lua") => "lua",
        Some("c") | Some("h") => "c",
        Some("cpp") | Some("hpp") => "cpp",
        Some("rs") => "rust",
        Some("go") => "go",
        Some("java") => "java",
        Some("rb") => "ruby",
        Some("php") => "php",
        Some("sh") => "bash",
        Some("yaml") | Some("yml") => "yaml",
        Some("json") => "json",
        Some("md") => "markdown",
        Some("sql") => "sql",
        _ => "text",
    }
}
