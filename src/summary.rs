//! Run-log scraping: pull the `executive_summary` string out of a log.
//!
//! The log is free text with a JSON object embedded somewhere in it. The
//! first `{"executive_summary": "..."}` object is located by pattern, not by
//! parsing JSON, so surrounding noise and truncated output are tolerated.
//! The captured text is returned exactly as it appears in the log (escape
//! sequences are not decoded).

use once_cell::sync::Lazy;
use regex::Regex;

/// Log file read when no path is given.
pub const DEFAULT_LOG_PATH: &str = ".tmp-run.log";

/// Printed when the log holds no summary.
pub const NOT_FOUND_MESSAGE: &str = "not found";

static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\s*"executive_summary"\s*:\s*"([\s\S]*?)"\s*\}"#)
        .expect("static summary pattern")
});

/// Return the first `executive_summary` value in `log`, if any.
pub fn extract_executive_summary(log: &str) -> Option<&str> {
    SUMMARY_RE
        .captures(log)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_followed_by_noise() {
        let log = "{\"executive_summary\": \"hello\"}\nINFO done in 3.2s\n";
        assert_eq!(extract_executive_summary(log), Some("hello"));
    }

    #[test]
    fn first_object_wins() {
        let log = r#"step 1 {"executive_summary":"one"} step 2 {"executive_summary":"two"}"#;
        assert_eq!(extract_executive_summary(log), Some("one"));
    }

    #[test]
    fn whitespace_and_newlines_inside_value() {
        let log = "{ \"executive_summary\" :\n \"line a\nline b\" \n}";
        assert_eq!(extract_executive_summary(log), Some("line a\nline b"));
    }

    #[test]
    fn other_fields_in_object_do_not_match() {
        let log = r#"{"executive_summary": "x", "score": 3}"#;
        assert_eq!(extract_executive_summary(log), None);
    }

    #[test]
    fn absent_summary() {
        assert_eq!(extract_executive_summary("nothing to see"), None);
        assert_eq!(extract_executive_summary(""), None);
    }
}
