//! URL modeling and filename derivation.
//!
//! Picks the server-suggested filename for a download (Content-Disposition,
//! falling back to the URL path) and sanitizes metadata values before they
//! are rendered into a destination path.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use path::filename_from_url_path;
pub use sanitize::{sanitize, Platform};

/// Server-suggested filename for a download.
///
/// Prefers the filename from `content_disposition` (if present and parseable),
/// otherwise uses the last path segment of `url`.
pub fn suggested_filename(url: &str, content_disposition: Option<&str>) -> Option<String> {
    content_disposition
        .and_then(parse_content_disposition_filename)
        .filter(|s| !s.is_empty())
        .or_else(|| filename_from_url_path(url))
}

/// Extension of `filename` including the leading dot, or an empty string.
///
/// A name that only starts with a dot (e.g. `.hidden`) has no extension.
pub fn extension_of(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
