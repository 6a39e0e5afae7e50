//! Filename derivation and sanitization for downloaded images.

use std::path::{Component, Path};

use url::Url;

/// Filename used when a URL has no usable path tail.
pub const DEFAULT_FILENAME: &str = "image";

/// Extension appended when the path tail has none.
pub const DEFAULT_EXTENSION: &str = ".bin";

/// Derives the on-disk filename for `url` from its last path segment.
///
/// - Query string and fragment are ignored.
/// - Trailing slashes are ignored (`/gallery/` yields `gallery.bin`).
/// - An empty tail becomes [`DEFAULT_FILENAME`].
/// - A tail without a `.` gets [`DEFAULT_EXTENSION`] appended.
///
/// # Examples
///
/// ```
/// use bulk_image_downloader::download::derive_filename;
/// use url::Url;
///
/// let url = Url::parse("https://ex.com/img/cat.png?w=300#top").unwrap();
/// assert_eq!(derive_filename(&url), "cat.png");
///
/// let url = Url::parse("https://ex.com/").unwrap();
/// assert_eq!(derive_filename(&url), "image.bin");
/// ```
#[must_use]
pub fn derive_filename(url: &Url) -> String {
    let tail = url
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let mut name = sanitize_filename(tail);
    if name.is_empty() {
        name = DEFAULT_FILENAME.to_string();
    }
    if !name.contains('.') {
        name.push_str(DEFAULT_EXTENSION);
    }
    name
}

/// Sanitizes a path tail for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters with `_`. Names that would
/// escape the destination directory (`.`, `..`) are neutralised.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
