//! Image extension and content-type heuristics shared by the collector and
//! the downloader.

use url::Url;

/// File extensions treated as image content without further probing.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];

/// Returns true if `name` (a filename or URL path) ends with a known image extension.
///
/// Comparison is case-insensitive.
#[must_use]
pub fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Returns true if the URL's path (query and fragment excluded) ends with a
/// known image extension.
#[must_use]
pub fn url_has_image_extension(url: &Url) -> bool {
    has_image_extension(url.path())
}

/// Returns true if a Content-Type header value denotes image content.
#[must_use]
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("image")
}

/// Returns true for inline `data:image/...` references, which are embedded
/// payloads rather than fetchable resources.
#[must_use]
pub fn is_data_image_url(candidate: &str) -> bool {
    let trimmed = candidate.trim_start();
    trimmed
        .get(..11)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:image/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_has_image_extension_known_types() {
        for name in [
            "a.jpg", "a.jpeg", "a.png", "a.gif", "a.webp", "a.bmp", "a.svg",
        ] {
            assert!(has_image_extension(name), "{name} should be an image");
        }
    }

    #[test]
    fn test_has_image_extension_case_insensitive() {
        assert!(has_image_extension("PHOTO.JPG"));
        assert!(has_image_extension("Logo.Svg"));
    }

    #[test]
    fn test_has_image_extension_rejects_other_types() {
        assert!(!has_image_extension("page.html"));
        assert!(!has_image_extension("image.bin"));
        assert!(!has_image_extension("png"));
    }

    #[test]
    fn test_url_has_image_extension_ignores_query() {
        let url = Url::parse("https://ex.com/a.png?w=200#top").unwrap();
        assert!(url_has_image_extension(&url));

        let url = Url::parse("https://ex.com/render?file=a.png").unwrap();
        assert!(!url_has_image_extension(&url));
    }

    #[test]
    fn test_is_image_content_type() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("Image/JPEG; charset=binary"));
        assert!(!is_image_content_type("text/html; charset=utf-8"));
        assert!(!is_image_content_type(""));
    }

    #[test]
    fn test_is_data_image_url() {
        assert!(is_data_image_url("data:image/png;base64,iVBORw0KGgo="));
        assert!(is_data_image_url("DATA:IMAGE/gif;base64,R0lGOD"));
        assert!(!is_data_image_url("data:text/plain,hello"));
        assert!(!is_data_image_url("https://ex.com/data:image/x"));
        assert!(!is_data_image_url("data:"));
    }
}
