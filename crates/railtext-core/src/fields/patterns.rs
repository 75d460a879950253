//! Field table for rail marking text and the label-to-regex builder.

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

pub const DATE: &str = "DATE";
pub const TIME: &str = "TIME";
pub const TEMP: &str = "TEMP";
pub const WELDER1: &str = "WELDER1";
pub const WELDER2: &str = "WELDER2";
pub const PROFILE: &str = "PROFILE";
pub const TRUCK: &str = "TRUCK";
pub const KM: &str = "KM";
pub const TAPPING: &str = "TAPPING";
pub const WELD: &str = "WELD";
pub const PORTION: &str = "PORTION";
pub const RAIL_TYPE: &str = "RAIL TYPE";

/// Label that ends a multi-word RAIL TYPE value.
pub const RAIL_TYPE_TERMINATOR: &str = "PEAK";

/// How the value following a field label is captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CaptureMode {
    /// A single run of non-whitespace characters.
    #[default]
    Token,
    /// One or more tokens, whitespace included, up to the terminator label.
    UntilLabel { terminator: String },
}

/// One row of the field table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Key used in extraction results and export headers.
    pub name: String,
    /// Label as printed on the rail, words separated by whitespace.
    pub label: String,
    /// Capture mode for the value.
    #[serde(default)]
    pub capture: CaptureMode,
}

impl FieldRule {
    /// Rule capturing a single token after the label.
    pub fn token(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            capture: CaptureMode::Token,
        }
    }

    /// Rule capturing everything between the label and `terminator`.
    pub fn until(
        name: impl Into<String>,
        label: impl Into<String>,
        terminator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            capture: CaptureMode::UntilLabel {
                terminator: terminator.into(),
            },
        }
    }
}

/// The built-in rail marking table, in extraction order.
///
/// WELDER1 and WELDER2 come before WELD; all labels are matched on word
/// boundaries so `WELD` never fires on the prefix of `WELDER1:`.
pub fn default_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::token(DATE, "DATE"),
        FieldRule::token(TIME, "TIME"),
        FieldRule::token(TEMP, "TEMP"),
        FieldRule::token(WELDER1, "WELDER 1"),
        FieldRule::token(WELDER2, "WELDER 2"),
        FieldRule::token(PROFILE, "PROFILE"),
        FieldRule::token(TRUCK, "TRUCK"),
        FieldRule::token(KM, "KM"),
        FieldRule::token(TAPPING, "TAPPING"),
        FieldRule::token(WELD, "WELD"),
        FieldRule::token(PORTION, "PORTION"),
        FieldRule::until(RAIL_TYPE, "RAIL TYPE", RAIL_TYPE_TERMINATOR),
    ]
}

/// Build the regex source for a rule.
///
/// Label `W1 W2` becomes `\bW1\s*W2\b`, followed by an optional `#`, a colon
/// or hyphen, and the capture group. Matching is case-insensitive. The value
/// must start on the label's line, so a blank label never takes the next
/// line's label as its value.
pub fn build_pattern(rule: &FieldRule) -> Result<String, ExtractionError> {
    let label = label_pattern(&rule.label).ok_or_else(|| ExtractionError::InvalidRule {
        field: rule.name.clone(),
        reason: "label is empty".to_string(),
    })?;

    let mut pattern = format!(r"(?is){}\s*#?\s*[:\-]{}", label, INLINE_SPACE);

    match &rule.capture {
        CaptureMode::Token => pattern.push_str(r"(\S+)"),
        CaptureMode::UntilLabel { terminator } => {
            let terminator =
                label_pattern(terminator).ok_or_else(|| ExtractionError::InvalidRule {
                    field: rule.name.clone(),
                    reason: "terminator label is empty".to_string(),
                })?;
            pattern.push_str(r"(\S.*?)\s*");
            pattern.push_str(&terminator);
        }
    }

    Ok(pattern)
}

/// Whitespace that does not cross a line break.
const INLINE_SPACE: &str = r"[^\S\r\n]*";

fn label_pattern(label: &str) -> Option<String> {
    let words: Vec<&str> = label.split_whitespace().collect();
    let first = words.first()?;
    let last = words.last()?;

    let mut pattern = String::new();
    if starts_with_word_char(first) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(
        &words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join(r"\s*"),
    );
    if ends_with_word_char(last) {
        pattern.push_str(r"\b");
    }

    Some(pattern)
}

fn starts_with_word_char(s: &str) -> bool {
    s.chars().next().is_some_and(is_word_char)
}

fn ends_with_word_char(s: &str) -> bool {
    s.chars().next_back().is_some_and(is_word_char)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let names: Vec<String> = default_rules().into_iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "DATE", "TIME", "TEMP", "WELDER1", "WELDER2", "PROFILE", "TRUCK", "KM",
                "TAPPING", "WELD", "PORTION", "RAIL TYPE"
            ]
        );
    }

    #[test]
    fn test_token_pattern() {
        let pattern = build_pattern(&FieldRule::token("WELDER1", "WELDER 1")).unwrap();
        assert_eq!(pattern, r"(?is)\bWELDER\s*1\b\s*#?\s*[:\-][^\S\r\n]*(\S+)");
    }

    #[test]
    fn test_until_pattern() {
        let pattern = build_pattern(&FieldRule::until("RAIL TYPE", "RAIL TYPE", "PEAK")).unwrap();
        assert_eq!(pattern, r"(?is)\bRAIL\s*TYPE\b\s*#?\s*[:\-][^\S\r\n]*(\S.*?)\s*\bPEAK\b");
    }

    #[test]
    fn test_label_is_escaped() {
        let pattern = build_pattern(&FieldRule::token("SPEED", "V.MAX")).unwrap();
        assert!(pattern.contains(r"V\.MAX"));
    }

    #[test]
    fn test_empty_label_rejected() {
        let err = build_pattern(&FieldRule::token("X", "   ")).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidRule { .. }));

        let err = build_pattern(&FieldRule::until("X", "X", "")).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidRule { .. }));
    }

    #[test]
    fn test_rule_deserializes_with_default_capture() {
        let rule: FieldRule = serde_json::from_str(r#"{"name": "GANG", "label": "GANG"}"#).unwrap();
        assert_eq!(rule.capture, CaptureMode::Token);

        let rule: FieldRule = serde_json::from_str(
            r#"{"name": "NOTE", "label": "NOTE", "capture": {"mode": "until_label", "terminator": "END"}}"#,
        )
        .unwrap();
        assert_eq!(
            rule.capture,
            CaptureMode::UntilLabel {
                terminator: "END".to_string()
            }
        );
    }
}
