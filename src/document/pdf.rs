//! PDF text extraction via lopdf content streams.

use crate::errors::AppError;
use std::path::Path;

/// Extract the text of every page. Pages that fail to parse are skipped with a
/// warning rather than failing the whole document.
pub fn extract_text(path: &Path) -> Result<String, AppError> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| AppError::AcquisitionFailed(format!("PDF load {}: {e}", path.display())))?;

    let mut text = String::new();
    for (page_index, page_id) in doc.page_iter().enumerate() {
        match doc.get_page_content(page_id) {
            Ok(content) => {
                text.push_str(&content_stream_text(&content));
                text.push('\n');
            }
            Err(e) => {
                tracing::warn!(page = page_index + 1, error = %e, "Skipping unreadable PDF page");
            }
        }
    }

    Ok(normalize_whitespace(&text))
}

/// Pull the text-showing operators out of a page content stream. Scans the
/// BT..ET text blocks for `Tj`, `TJ`, `'` and `"` operators.
fn content_stream_text(content: &[u8]) -> String {
    let content = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content.lines() {
        let line = line.trim();
        match line {
            "BT" => in_text_block = true,
            "ET" => {
                in_text_block = false;
                text.push(' ');
            }
            _ if in_text_block => {
                if let Some(shown) = operator_text(line) {
                    text.push_str(&shown);
                }
            }
            _ => {}
        }
    }

    text
}

/// Text carried by a single show-text operator line, if any.
fn operator_text(line: &str) -> Option<String> {
    if line.ends_with("Tj") || line.ends_with('\'') || line.ends_with('"') {
        let start = line.find('(')?;
        let end = line.rfind(')')?;
        if end <= start {
            return None;
        }
        return Some(decode_escapes(&line[start + 1..end]));
    }

    // `[(a) -120 (b)] TJ` shows an array of strings with kerning offsets.
    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut current = String::new();
        let mut in_string = false;
        for ch in line.chars() {
            match ch {
                '(' if !in_string => in_string = true,
                ')' if in_string => {
                    in_string = false;
                    result.push_str(&decode_escapes(&current));
                    current.clear();
                }
                _ if in_string => current.push(ch),
                _ => {}
            }
        }
        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Resolve PDF string escapes (`\n`, `\(`, `\)`, ...).
fn decode_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}

/// Collapse runs of whitespace left behind by positioned text operators.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_escapes() {
        assert_eq!(decode_escapes("Hello\\nWorld"), "Hello\nWorld");
        assert_eq!(decode_escapes("paren \\(x\\)"), "paren (x)");
        assert_eq!(decode_escapes("trailing\\"), "trailing");
    }

    #[test]
    fn extracts_tj_operators() {
        assert_eq!(operator_text("(Hello) Tj").as_deref(), Some("Hello"));
        assert_eq!(
            operator_text("[(Hel) -20 (lo)] TJ").as_deref(),
            Some("Hello")
        );
        assert_eq!(operator_text("1 0 0 1 72 720 Tm"), None);
    }

    #[test]
    fn walks_text_blocks() {
        let stream = b"q\nBT\n/F1 12 Tf\n(First) Tj\nET\nBT\n(Second) Tj\nET\nQ";
        let text = content_stream_text(stream);
        assert!(text.contains("First"));
        assert!(text.contains("Second"));
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_whitespace("a   b\n\n c\t"), "a b c");
    }
}
