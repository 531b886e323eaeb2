//! Institution-name canonicalization for university and college fields.

use super::string_utils::{capitalize, collapse_whitespace};
use crate::core::config::MergeConfig;
use once_cell::sync::Lazy;
use regex::Regex;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9.\s]").expect("Punctuation regex pattern is valid"));
static DOTTED_ACRONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\b[A-Z]\.\s*){2,}").expect("Dotted acronym regex pattern is valid"));
static SPACED_LETTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z](?:\s+[A-Z]\b)+").expect("Spaced letters regex pattern is valid"));

const STOPWORDS: &[&str] = &["of", "and", "the", "for", "in", "at"];
const LEADING_ARTICLES: &[&str] = &["the", "of"];

/// Canonicalize a university or college name.
///
/// `"V T U , Belagavi"` becomes `"VTU"` and `"VISVESVARAYA TECHNOLOGICAL UNIVERSITY, BELAGAVI"`
/// becomes `"Visvesvaraya Technological University"`. All-caps words up to
/// `acronym_max_len` letters are kept as acronyms. Results shorter than
/// `min_institution_len` are treated as noise and return `None`, except bare acronyms.
pub fn canonicalize_institution(name: &str, config: &MergeConfig) -> Option<String> {
    let text = PUNCTUATION.replace_all(name, " ");
    let text = DOTTED_ACRONYM.replace_all(&text, |caps: &regex::Captures<'_>| {
        let letters: String = caps[0].chars().filter(char::is_ascii_alphabetic).collect();
        format!("{} ", letters)
    });
    let text = text.replace('.', " ");
    let text = SPACED_LETTERS.replace_all(&text, |caps: &regex::Captures<'_>| {
        caps[0].split_whitespace().collect::<String>()
    });
    let text = collapse_whitespace(&text);

    let mut words: Vec<String> = text
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            if STOPWORDS.contains(&lower.as_str()) {
                capitalize(word)
            } else if is_acronym(word, config.acronym_max_len) {
                word.to_string()
            } else {
                capitalize(word)
            }
        })
        .collect();

    while let Some(last) = words.last() {
        let is_suffix = config
            .location_suffixes
            .iter()
            .any(|suffix| suffix.eq_ignore_ascii_case(last));
        if !is_suffix {
            break;
        }
        words.pop();
    }

    while let Some(first) = words.first() {
        if words.len() > 1 && LEADING_ARTICLES.contains(&first.to_lowercase().as_str()) {
            words.remove(0);
        } else {
            break;
        }
    }

    let result = words.join(" ");
    let is_bare_acronym = words.len() == 1 && result.len() >= 2 && is_acronym(&result, config.acronym_max_len);
    if result.chars().count() < config.min_institution_len && !is_bare_acronym {
        return None;
    }
    Some(result)
}

fn is_acronym(word: &str, max_len: usize) -> bool {
    let len = word.chars().count();
    len <= max_len && word.chars().all(|c| c.is_ascii_uppercase())
}
