//! Passport field extraction.
//!
//! Labelled fields are read from the printed page first. The machine-readable zone is only a
//! fallback: it fills names, number and sex when the labels were lost, and never overrides a
//! labelled value.

use crate::core::config::DateStyle;
use crate::text::dates::{DateMatch, find_dates, first_date};
use crate::types::{DocumentType, FieldRecord, FieldValue};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static GIVEN_NAMES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:GIVEN\s*NAME\(S\)|GIVEN\s*NAMES?)[\s:/]*([A-Z][A-Z ]*?)(?:\s+(?:SURNAME|SEX|NATIONALITY|DATE)\b|[ \t]*[^A-Z \t]|[ \t]*$)",
    )
    .expect("Given names regex pattern is valid")
});
static SURNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"SURNAME[\s:/]*([A-Z][A-Z ]*?)(?:\s+(?:GIVEN|NATIONALITY|DATE|SEX)\b|[ \t]*[^A-Z \t]|[ \t]*$)")
        .expect("Surname regex pattern is valid")
});
static PASSPORT_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]{7}$").expect("Passport number line regex pattern is valid"));
static LABELLED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PASSPORT\s*N[O0]\.?[\s:]*([A-Z][0-9]{7})\b").expect("Labelled passport number regex pattern is valid")
});
static RAW_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][0-9]{7})\b").expect("Raw passport number regex pattern is valid"));
static DATE_OF_BIRTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"DATE\s*OF\s*BIRTH[\s:/]*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4})").expect("Date of birth regex pattern is valid")
});
static SEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:SEX|GENDER)[\s:/]*(MALE|FEMALE|M|F)\b").expect("Sex regex pattern is valid"));
static NATIONALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"NATIONALITY[\s:/]*([A-Z]{3,})").expect("Nationality regex pattern is valid"));
static MRZ_SEX_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+([MFX])\d+").expect("MRZ sex fragment regex pattern is valid"));

const NATIONALITY_DENYLIST: &[&str] = &["SEX", "DATE", "PLACE", "GIVEN", "SURNAME", "BIRTH"];
const MRZ_MIN_LEN: usize = 20;

pub fn extract(blob: &str, lines: &[String]) -> FieldRecord {
    let upper = blob.to_uppercase();
    let upper_lines: Vec<String> = lines.iter().map(|l| l.to_uppercase()).collect();

    // Name labels are matched line by line so a value never runs into the next line.
    let labelled_text = if upper_lines.is_empty() {
        upper.clone()
    } else {
        upper_lines.join("\n")
    };
    let mut surname = capture_trimmed(&SURNAME, &labelled_text);
    let mut given_names = capture_trimmed(&GIVEN_NAMES, &labelled_text);
    if surname.is_none() || given_names.is_none() {
        let (positional_surname, positional_given) = positional_names(&upper_lines);
        surname = surname.or(positional_surname);
        given_names = given_names.or(positional_given);
    }

    let date_of_birth = DATE_OF_BIRTH
        .captures(&upper)
        .and_then(|caps| first_date(&caps[1]))
        .or_else(|| first_date(&upper));

    let mut sex = SEX.captures(&upper).map(|caps| {
        if caps[1].starts_with('M') {
            "M".to_string()
        } else {
            "F".to_string()
        }
    });

    let mut passport_number = LABELLED_NUMBER
        .captures(&upper)
        .or_else(|| RAW_NUMBER.captures(&upper))
        .map(|caps| caps[1].to_string());

    let mrz = mrz_lines(lines);
    if let Some(mrz) = &mrz {
        if let Some(line1) = &mrz.line1
            && line1.contains('<')
            && (surname.is_none() || given_names.is_none())
            && let Some((mrz_surname, mrz_given)) = mrz_names(line1)
        {
            surname = surname.or(mrz_surname);
            given_names = given_names.or(mrz_given);
        }

        if passport_number.is_none() {
            passport_number = mrz
                .line2
                .get(0..9)
                .map(|s| s.replace('<', ""))
                .filter(|s| !s.is_empty());
        }

        if sex.is_none() {
            sex = mrz_sex(&mrz.line2);
        }
    }

    let (date_of_issue, date_of_expiry) = issue_and_expiry(&upper_lines, date_of_birth);

    let nationality = NATIONALITY
        .captures(&upper)
        .map(|caps| caps[1].to_string())
        .filter(|n| !NATIONALITY_DENYLIST.contains(&n.as_str()));

    let mut record = FieldRecord::for_document(DocumentType::Passport);
    record.insert_opt("passport_number", passport_number);
    if let (Some(given), Some(surname)) = (&given_names, &surname) {
        record.insert("full_name", format!("{} {}", given, surname));
    }
    record.insert_opt("surname", surname);
    record.insert_opt("given_names", given_names);
    record.insert_opt("date_of_birth", date_of_birth.map(|d| d.format(DateStyle::DayFirst)));
    record.insert_opt("sex", sex);
    record.insert_opt("nationality", nationality);
    record.insert_opt("date_of_issue", date_of_issue);
    record.insert_opt("date_of_expiry", date_of_expiry);
    if let Some(mrz) = mrz {
        record.insert("mrz", mrz.into_field());
    }
    record
}

fn capture_trimmed(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Names printed between the passport-number line and the first sex/birth line.
///
/// The first fragment is the surname, the rest are given names.
fn positional_names(upper_lines: &[String]) -> (Option<String>, Option<String>) {
    let mut number_index = None;
    let mut stop_index = None;

    for (i, line) in upper_lines.iter().enumerate() {
        if PASSPORT_NUMBER_LINE.is_match(line) {
            number_index.get_or_insert(i);
        } else if number_index.is_some()
            && (line.contains("SEX") || first_date(line).is_some_and(|d| d.start == 0) || line.contains("BIRTH"))
        {
            stop_index = Some(i);
            break;
        }
    }

    let (Some(start), Some(stop)) = (number_index, stop_index) else {
        return (None, None);
    };
    if stop - start <= 1 {
        return (None, None);
    }

    let fragments: Vec<&str> = upper_lines[start + 1..stop]
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.len() > 1 && !l.contains("IND") && !l.contains("NATIONALITY") && !l.contains("BIRTH"))
        .collect();

    let surname = fragments.first().map(|s| s.to_string());
    let given = (fragments.len() >= 2).then(|| fragments[1..].join(" "));
    (surname, given)
}

/// Issue and expiry dates: the first two line dates other than the birth date, ordered by year.
fn issue_and_expiry(upper_lines: &[String], date_of_birth: Option<DateMatch>) -> (Option<String>, Option<String>) {
    let same_day = |a: &DateMatch, b: &DateMatch| a.day == b.day && a.month == b.month && a.year == b.year;

    let mut dates: Vec<DateMatch> = upper_lines.iter().filter_map(|l| find_dates(l).into_iter().next()).collect();
    if let Some(dob) = date_of_birth
        && let Some(pos) = dates.iter().position(|d| same_day(d, &dob))
    {
        dates.remove(pos);
    }

    if dates.len() < 2 {
        return (None, None);
    }

    let (first, second) = (dates[0], dates[1]);
    let (issue, expiry) = if first.year < second.year {
        (first, second)
    } else {
        (second, first)
    };
    (
        Some(issue.format(DateStyle::DayFirst)),
        Some(expiry.format(DateStyle::DayFirst)),
    )
}

/// The machine-readable zone of a passport page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzLines {
    pub line1: Option<String>,
    pub line2: String,
}

impl MrzLines {
    fn into_field(self) -> FieldValue {
        let mut map = IndexMap::new();
        if let Some(line1) = self.line1 {
            map.insert("line1".to_string(), FieldValue::from(line1));
        }
        map.insert("line2".to_string(), FieldValue::from(self.line2));
        FieldValue::Map(map)
    }
}

/// Find MRZ lines: long space-free lines with `P<`, an `IND` that is not part of `INDIA`,
/// or more than two filler characters. The last two qualifying lines win; a lone line is
/// taken as line 2.
pub fn mrz_lines(lines: &[String]) -> Option<MrzLines> {
    let candidates: Vec<String> = lines
        .iter()
        .map(|l| l.replace(' ', ""))
        .filter(|l| {
            l.len() >= MRZ_MIN_LEN
                && (l.contains("P<") || (l.contains("IND") && !l.contains("INDIA")) || l.matches('<').count() > 2)
        })
        .collect();

    match candidates.as_slice() {
        [] => None,
        [only] => Some(MrzLines {
            line1: None,
            line2: only.clone(),
        }),
        [.., first, second] => Some(MrzLines {
            line1: Some(first.clone()),
            line2: second.clone(),
        }),
    }
}

/// Surname and given names from MRZ line 1 (`P<INDSURNAME<<GIVEN<NAMES<<<`).
fn mrz_names(line1: &str) -> Option<(Option<String>, Option<String>)> {
    let body = line1.get(5..)?;
    let parts: Vec<&str> = body.split("<<").collect();
    if parts.len() < 2 {
        return None;
    }
    let clean = |s: &str| Some(s.replace('<', " ").trim().to_string()).filter(|s| !s.is_empty());
    Some((clean(parts[0]), clean(parts[1])))
}

/// Sex from MRZ line 2: position 21, or a letter wedged between digits when the line is truncated.
fn mrz_sex(line2: &str) -> Option<String> {
    if let Some(c) = line2.chars().nth(20)
        && matches!(c, 'M' | 'F' | 'X')
    {
        return Some(c.to_string());
    }
    MRZ_SEX_FRAGMENT.captures(line2).map(|caps| caps[1].to_string())
}
