//! Line normalization.
//!
//! Turns an OCR line stream into the two views every downstream stage reads: a single
//! whitespace-collapsed blob and a parallel list of trimmed, non-empty lines.

use super::string_utils::collapse_whitespace;
use crate::core::config::NormalizerConfig;
use crate::types::LineStream;

/// Normalized view of one document's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Whitespace-collapsed text of the whole document.
    pub blob: String,
    /// Trimmed non-empty lines in reading order.
    pub lines: Vec<String>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.blob.is_empty()
    }
}

/// Normalize a line stream.
///
/// When `raw_text` is given (some OCR engines return a concatenated page text next to the
/// lines) the blob is built from it, otherwise from the lines joined by spaces. Lines whose
/// confidence is below `min_line_confidence` are dropped.
pub fn normalize(stream: &LineStream, raw_text: Option<&str>, config: &NormalizerConfig) -> NormalizedText {
    let lines: Vec<String> = stream
        .lines()
        .iter()
        .filter(|line| line.confidence >= config.min_line_confidence)
        .map(|line| collapse_whitespace(&line.text).into_owned())
        .filter(|line| !line.is_empty())
        .map(|line| {
            if config.fix_confusables {
                fix_confusables(&line)
            } else {
                line
            }
        })
        .collect();

    let blob = match raw_text {
        Some(raw) => {
            let collapsed = collapse_whitespace(raw);
            if config.fix_confusables {
                fix_confusables(&collapsed)
            } else {
                collapsed.into_owned()
            }
        }
        None => lines.join(" "),
    };

    NormalizedText { blob, lines }
}

/// Repair letters that OCR commonly reads in place of digits.
///
/// Only tokens that are overwhelmingly numeric (at least four characters, at least three
/// quarters digits) are touched, and only after their first digit, so identifiers with a
/// letter prefix such as `S1234567` or `KA01...` keep their prefix. MRZ tokens (anything
/// with a `<` filler) are left alone since their letters are positional.
pub fn fix_confusables(line: &str) -> String {
    line.split(' ').map(fix_token).collect::<Vec<_>>().join(" ")
}

fn fix_token(token: &str) -> String {
    let alnum = token.chars().filter(|c| c.is_ascii_alphanumeric()).count();
    let digits = token.chars().filter(char::is_ascii_digit).count();
    if token.chars().count() < 4 || alnum == 0 || digits * 4 < alnum * 3 || token.contains('<') {
        return token.to_string();
    }

    let mut seen_digit = false;
    token
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen_digit = true;
                return c;
            }
            if !seen_digit {
                return c;
            }
            match c {
                'O' | 'o' | 'D' => '0',
                'I' | 'l' | '|' => '1',
                'S' | 's' => '5',
                'B' => '8',
                'Z' => '2',
                other => other,
            }
        })
        .collect()
}
