//! Cosmetic clean-up of serialized JSON.
//!
//! Forecast XML files are pretty-printed, so text leaves often carry the
//! indentation and line breaks around them. The clean-up removes `\n`
//! escapes and trims whitespace just inside single-string arrays
//! (`["  x  "]` becomes `["x"]`). It is purely textual.

use regex::Regex;
use std::sync::LazyLock;

static OPEN_BRACKET_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\["\s+"#).expect("static pattern"));
static CLOSE_BRACKET_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+"\]"#).expect("static pattern"));

pub fn clean_json(json: &str) -> String {
    let without_newlines = strip_newline_escapes(json);
    let opened = OPEN_BRACKET_SPACE.replace_all(&without_newlines, "[\"");
    CLOSE_BRACKET_SPACE.replace_all(&opened, "\"]").into_owned()
}

/// Drops `\n` escape sequences, leaving escaped backslashes (`\\n`) alone.
fn strip_newline_escapes(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => {}
            Some(escaped) => {
                out.push('\\');
                out.push(escaped);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace_inside_brackets() {
        assert_eq!(clean_json(r#"{"a":["  1  "]}"#), r#"{"a":["1"]}"#);
    }

    #[test]
    fn removes_newline_escapes_before_trimming() {
        assert_eq!(
            clean_json(r#"{"v":["\n      Cloudy\n    "]}"#),
            r#"{"v":["Cloudy"]}"#
        );
    }

    #[test]
    fn keeps_escaped_backslashes() {
        assert_eq!(clean_json(r#"{"p":["C:\\new"]}"#), r#"{"p":["C:\\new"]}"#);
        assert_eq!(clean_json(r#"{"q":["say \"hi\""]}"#), r#"{"q":["say \"hi\""]}"#);
    }

    #[test]
    fn inner_whitespace_is_kept() {
        assert_eq!(
            clean_json(r#"{"w":["Partly cloudy with rain"]}"#),
            r#"{"w":["Partly cloudy with rain"]}"#
        );
    }

    #[test]
    fn result_is_still_valid_json() {
        let cleaned = clean_json(r#"{"root":[{"a":["\n  1\n"],"b":[""]}]}"#);
        let value: serde_json::Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value, serde_json::json!({"root": [{"a": ["1"], "b": [""]}]}));
    }
}
