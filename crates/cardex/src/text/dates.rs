//! Date detection and reformatting.
//!
//! Documents print dates day-first (`12/05/1990`, `12-05-1990`, `12.05.1990`); layout models
//! sometimes answer in ISO order. Both shapes are recognized, and output follows a
//! [`DateStyle`].

use crate::core::config::DateStyle;
use once_cell::sync::Lazy;
use regex::Regex;

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})\b").expect("Day-first date regex pattern is valid")
});
static ISO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})\b").expect("ISO date regex pattern is valid"));

/// A calendar date found in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch {
    pub start: usize,
    pub end: usize,
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

impl DateMatch {
    pub fn format(&self, style: DateStyle) -> String {
        match style {
            DateStyle::DayFirst => format!("{:02}-{:02}-{:04}", self.day, self.month, self.year),
            DateStyle::Iso => format!("{:04}-{:02}-{:02}", self.year, self.month, self.day),
        }
    }
}

fn plausible(day: u32, month: u32) -> bool {
    (1..=31).contains(&day) && (1..=12).contains(&month)
}

/// All day-first dates in `text`, in order of appearance.
pub fn find_dates(text: &str) -> Vec<DateMatch> {
    DAY_FIRST
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let day = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let year = caps[3].parse().ok()?;
            plausible(day, month).then_some(DateMatch {
                start: whole.start(),
                end: whole.end(),
                day,
                month,
                year,
            })
        })
        .collect()
}

/// First day-first date in `text`.
pub fn first_date(text: &str) -> Option<DateMatch> {
    find_dates(text).into_iter().next()
}

/// True when `text` contains a day-first date.
pub fn contains_date(text: &str) -> bool {
    !find_dates(text).is_empty()
}

/// Parse a value that is exactly one date in either shape.
pub fn parse_date(value: &str) -> Option<DateMatch> {
    let value = value.trim();
    let full = |m: regex::Match<'_>| m.start() == 0 && m.end() == value.len();

    if let Some(caps) = DAY_FIRST.captures(value)
        && caps.get(0).is_some_and(full)
    {
        let (day, month, year) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        return plausible(day, month).then_some(DateMatch {
            start: 0,
            end: value.len(),
            day,
            month,
            year,
        });
    }

    if let Some(caps) = ISO.captures(value)
        && caps.get(0).is_some_and(full)
    {
        let (year, month, day) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        return plausible(day, month).then_some(DateMatch {
            start: 0,
            end: value.len(),
            day,
            month,
            year,
        });
    }

    None
}

/// Reformat `value` when it is a single date, otherwise `None`.
pub fn normalize_date(value: &str, style: DateStyle) -> Option<String> {
    parse_date(value).map(|d| d.format(style))
}
