//! Tesseract TSV output to line stream.

use crate::types::{LineStream, OcrLine};
use crate::{CardexError, Result};
use indexmap::IndexMap;

pub const TSV_HEADER_PREFIX: &str = "level\tpage_num";
const TSV_WORD_LEVEL: u32 = 5;
const TSV_MIN_FIELDS: usize = 12;

#[derive(Default)]
struct LineWords {
    words: Vec<String>,
    confidence_sum: f64,
    confidence_count: usize,
}

/// Group TSV word rows into text lines.
///
/// Words sharing (page, block, paragraph, line) numbers form one line, in first-seen order.
/// A line's confidence is the mean of its word confidences divided by 100. Words Tesseract
/// marks with confidence `-1` count as text but not toward the mean.
pub fn from_tsv(tsv_data: &str) -> Result<LineStream> {
    let mut lines = tsv_data.lines();
    match lines.next() {
        Some(header) if header.starts_with(TSV_HEADER_PREFIX) => {}
        _ => return Err(CardexError::parsing("TSV transcript is missing its header row")),
    }

    let mut grouped: IndexMap<(u32, u32, u32, u32), LineWords> = IndexMap::new();

    for row in lines {
        let row = row.trim_end_matches(['\r', '\n']);
        if row.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let level = fields[0].parse::<u32>().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let key = (
            fields[1].parse().unwrap_or(0),
            fields[2].parse().unwrap_or(0),
            fields[3].parse().unwrap_or(0),
            fields[4].parse().unwrap_or(0),
        );
        let entry = grouped.entry(key).or_default();
        entry.words.push(text.to_string());

        let conf = fields[10].parse::<f64>().unwrap_or(-1.0);
        if conf >= 0.0 {
            entry.confidence_sum += conf;
            entry.confidence_count += 1;
        }
    }

    Ok(grouped
        .into_values()
        .map(|line| {
            let confidence = if line.confidence_count == 0 {
                0.0
            } else {
                line.confidence_sum / line.confidence_count as f64 / 100.0
            };
            OcrLine::new(line.words.join(" "), confidence as f32)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_words_grouped_into_lines() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t90\tINCOME\n\
             5\t1\t1\t1\t1\t2\t70\t10\t50\t20\t80\tTAX\n\
             5\t1\t1\t1\t2\t1\t10\t40\t90\t20\t96\tABCDE1234F\n"
        );
        let stream = from_tsv(&tsv).unwrap();
        let texts: Vec<&str> = stream.texts().collect();
        assert_eq!(texts, vec!["INCOME TAX", "ABCDE1234F"]);
        assert!((stream.lines()[0].confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_unscored_words_kept() {
        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\t0\t0\t1\t1\t-1\tMALE\n");
        let stream = from_tsv(&tsv).unwrap();
        assert_eq!(stream.lines()[0].text, "MALE");
        assert_eq!(stream.lines()[0].confidence, 0.0);
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(matches!(
            from_tsv("5\t1\t1\t1\t1\t1\t0\t0\t1\t1\t90\tword"),
            Err(crate::CardexError::Parsing { .. })
        ));
    }
}
