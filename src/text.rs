//! Text helpers shared by the validator and the generation pipeline

use std::collections::HashSet;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use thiserror::Error;

/// `{{ name }}` with a name of letters, digits, `_` or `-`
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-zA-Z0-9_-]+)\s*\}\}").unwrap());

/// Reasoning spans emitted by some models, matched lazily across lines
static THINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{think\}\}.*?\{\{/think\}\}").unwrap());

/// A whole-text fenced block with an optional yaml/yml info string
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```(?:yaml|yml)?\s*\n(.*?)\n\s*```\s*$").unwrap()
});

/// Placeholder names in first-occurrence order, without duplicates.
///
/// ```
/// use cliqfile::extract_placeholders;
///
/// assert_eq!(extract_placeholders("echo {{b}} {{a}} {{b}}"), vec!["b", "a"]);
/// ```
pub fn extract_placeholders(command: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_RE
        .captures_iter(command)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Remove every `{{think}}...{{/think}}` span.
pub fn strip_think_tags(text: &str) -> String {
    THINK_RE.replace_all(text, "").into_owned()
}

/// Clean raw model output down to the template text.
///
/// Reasoning spans go first, since they may sit outside or straddle the
/// fence markers. The result is unwrapped only when the whole remaining text
/// is a single fenced block.
pub fn strip_presentation(raw: &str) -> String {
    let stripped = strip_think_tags(raw);
    let trimmed = stripped.trim();
    match FENCE_RE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => trimmed.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded text is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Standard padded base64, safe to embed in JSON strings.
pub fn transport_encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Inverse of [`transport_encode`].
pub fn transport_decode(encoded: &str) -> Result<String, TransportError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_first_occurrence_order() {
        assert_eq!(extract_placeholders("echo {{b}} {{a}} {{b}}"), vec!["b", "a"]);
    }

    #[test]
    fn test_extract_allows_inner_whitespace_and_dashes() {
        assert_eq!(
            extract_placeholders("ffmpeg -i {{ input-file }} -s {{width}}x{{ height }}"),
            vec!["input-file", "width", "height"]
        );
    }

    #[test]
    fn test_extract_ignores_malformed_tokens() {
        assert!(extract_placeholders("echo {{}} {{a b}} {x} {{$y}}").is_empty());
        assert!(extract_placeholders("").is_empty());
    }

    #[test]
    fn test_strip_think_then_fence() {
        let raw = "{{think}}reasoning{{/think}}\n```yaml\nname: x\n```";
        assert_eq!(strip_presentation(raw), "name: x");
    }

    #[test]
    fn test_strip_think_spanning_lines() {
        let raw = "{{think}}\nline one\nline two\n{{/think}}name: x";
        assert_eq!(strip_presentation(raw), "name: x");
    }

    #[test]
    fn test_strip_think_is_minimal() {
        assert_eq!(
            strip_think_tags("a{{think}}1{{/think}}b{{think}}2{{/think}}c"),
            "abc"
        );
    }

    #[test]
    fn test_strip_plain_fence_without_info_string() {
        assert_eq!(strip_presentation("  ```\nname: x\nversion: 1\n```  \n"), "name: x\nversion: 1");
    }

    #[test]
    fn test_strip_leaves_text_with_prose_around_fence() {
        let raw = "Here you go:\n```yaml\nname: x\n```";
        assert_eq!(strip_presentation(raw), raw);
    }

    #[test]
    fn test_strip_leaves_unfenced_text_trimmed() {
        assert_eq!(strip_presentation("\n\nname: x\n"), "name: x");
    }

    #[test]
    fn test_transport_round_trip() {
        let text = "name: x\ncommands:\n  - command: \"echo\"\n";
        let encoded = transport_encode(text);
        assert!(!encoded.contains('\n'));
        assert_eq!(transport_decode(&encoded).unwrap(), text);
    }

    #[test]
    fn test_transport_rejects_garbage() {
        assert!(transport_decode("not*base64").is_err());
    }
}
