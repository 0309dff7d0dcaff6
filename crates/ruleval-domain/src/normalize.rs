//! Text cleanup helpers applied (opt-in) before evaluation.
//!
//! Scanned or extracted corpora tend to carry hard line breaks and runs of
//! whitespace that break substring patterns across lines; cleaning is a
//! caller decision, never applied implicitly by the evaluator.

use regex::Regex;

pub struct TextCleaner {
    line_breaks: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    pub fn new() -> Self {
        Self {
            line_breaks: Regex::new(r"[\r\n]+").expect("line-break regex is valid"),
            whitespace: Regex::new(r"\s+").expect("whitespace regex is valid"),
        }
    }

    /// Replaces CR/LF runs with a single space.
    pub fn strip_line_breaks(&self, text: &str) -> String {
        self.line_breaks.replace_all(text, " ").into_owned()
    }

    /// Collapses any whitespace run to a single space.
    pub fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").into_owned()
    }

    /// Both passes, line breaks first.
    pub fn clean(&self, text: &str) -> String {
        self.collapse_whitespace(&self.strip_line_breaks(text))
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}
