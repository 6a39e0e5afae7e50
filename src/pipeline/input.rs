//! Input URL list parsing.

use std::path::Path;

use super::PipelineError;

/// Reads page URLs from `path`, one per line.
///
/// # Errors
///
/// Returns [`PipelineError::Input`] if the file cannot be read.
pub async fn read_input_urls(path: &Path) -> Result<Vec<String>, PipelineError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PipelineError::Input {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_input_urls(&text))
}

/// Extracts page URLs from text: lines are trimmed, blank lines and lines
/// starting with `#` are skipped.
#[must_use]
pub fn parse_input_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let text = "# pages\nhttps://ex.com/a\n\n   \n  https://ex.com/b  \n#https://ex.com/c\n";
        assert_eq!(
            parse_input_urls(text),
            vec!["https://ex.com/a", "https://ex.com/b"]
        );
    }

    #[test]
    fn test_parse_handles_crlf() {
        assert_eq!(
            parse_input_urls("https://ex.com/a\r\nhttps://ex.com/b\r\n"),
            vec!["https://ex.com/a", "https://ex.com/b"]
        );
    }

    #[tokio::test]
    async fn test_read_missing_file_is_input_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = read_input_urls(&dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(PipelineError::Input { .. })));
    }
}
