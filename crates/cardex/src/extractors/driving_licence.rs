//! Driving licence field extraction.
//!
//! Labelled values are matched against the upper-cased blob; line-oriented fields
//! (vehicle classes, issuing authority) walk the cleaned lines.

use crate::core::config::DateStyle;
use crate::text::dates::{DateMatch, contains_date, first_date, parse_date};
use crate::text::string_utils::collapse_whitespace;
use crate::types::{DocumentType, FieldRecord, FieldValue};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static DL_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bDL\s*NO\.?\s*[:\-]?").expect("DL label regex pattern is valid"));
static DL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2}[\s\-]?\d{2}").expect("DL prefix regex pattern is valid"));
static DL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}\d{2}\d{7,}$").expect("DL shape regex pattern is valid"));
static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bNAME\s*[:\-]?\s*([A-Z][A-Z ]*?)(?:\s+(?:D\.?O\.?B|DOB|S/W/D|S/O|D/O|W/O|SON|DAUGHTER|WIFE|BLOOD|ADDRESS)\b|\s*[^A-Z\s]|\s*$)",
    )
    .expect("DL name regex pattern is valid")
});
static RELATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:S/W/D|S/O|D/O|W/O|SLO)\b(?:\s+OF)?\s*[:\-]?\s*([A-Z][A-Z ]*?)(?:\s+(?:ADDRESS|D\.?O\.?B|DOB|BLOOD|DOI|VALID)\b|\s*[^A-Z\s]|\s*$)",
    )
    .expect("DL relation regex pattern is valid")
});
static DOB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\bD\.?O\.?B\.?|DATE\s+OF\s+BIRTH)\s*[:\-]?\s*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4})")
        .expect("DL dob regex pattern is valid")
});
static VALID_TILL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"VALID\s*TILL\s*[:\-]?\s*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4})").expect("Valid till regex pattern is valid")
});
static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\bADDRESS\s*[:\-]?\s*(.*?)\s*(?:SIGN\.|\bSIGN|\bHOLDER|\bAUTHORITY\b|\bRTO\b|$)")
        .expect("Address regex pattern is valid")
});
static POSTAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{6}\b").expect("Postal code regex pattern is valid"));
static VEHICLE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(MCWOG|MCWG|LMV|HMV)\b").expect("Vehicle class regex pattern is valid"));
static FORM_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFORM\s*-?\s*(\d+)\b").expect("Form regex pattern is valid"));
static RTO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bRTO\b").expect("RTO regex pattern is valid"));

const DL_MAX_LEN: usize = 16;
const NAME_DENYLIST: &[&str] = &["HOLDER", "SIGN", "AUTHORITY"];

pub fn extract(blob: &str, lines: &[String]) -> FieldRecord {
    let upper = blob.to_uppercase();
    let upper_lines: Vec<String> = lines.iter().map(|l| l.to_uppercase()).collect();

    let mut record = FieldRecord::for_document(DocumentType::DrivingLicence);
    record.insert_opt("dl_number", dl_number(&upper));
    record.insert_opt("name", name(&upper, &upper_lines));
    record.insert_opt("father_name", father_name(&upper));
    record.insert_opt("dob", labelled_date(&DOB, &upper));
    record.insert_opt("valid_till", labelled_date(&VALID_TILL, &upper));
    record.insert_opt("date_of_issue", date_of_issue(&upper_lines));
    record.insert_opt("address", address(&upper));

    let classes = vehicle_classes(&upper_lines);
    if !classes.is_empty() {
        record.insert("vehicle_classes", FieldValue::List(classes));
    }

    record.insert_opt(
        "issuing_authority",
        upper_lines.iter().position(|l| RTO.is_match(l)).map(|i| lines[i].clone()),
    );
    record.insert_opt(
        "national_validity",
        upper_lines
            .iter()
            .position(|l| l.contains("THROUGHOUT INDIA"))
            .map(|i| lines[i].clone()),
    );
    record.insert_opt(
        "form_number",
        FORM_NUMBER.captures(&upper).map(|caps| format!("FORM-{}", &caps[1])),
    );
    record
}

/// DL number after the "DL No" label, else the first raw `SS NN...` run that validates.
pub fn dl_number(upper: &str) -> Option<String> {
    if let Some(label) = DL_LABEL.find(upper)
        && let Some(number) = assemble_number(&upper[label.end()..])
    {
        return Some(number);
    }

    DL_PREFIX
        .find_iter(upper)
        .find_map(|m| assemble_number(&upper[m.start()..]))
}

/// Join the tokens that make up a licence number.
///
/// OCR splits numbers like `KA01 20190001234` or `KA-01-2019-0001234`, so the first token may
/// carry the state letters and every following token must be digits. Date tokens, words and
/// anything pushing past the maximum length end the number.
fn assemble_number(tail: &str) -> Option<String> {
    let mut number = String::new();

    for raw in tail.split_whitespace() {
        if contains_date(raw) {
            break;
        }
        let token: String = raw.chars().filter(|c| *c != '-' && *c != ':').collect();
        if token.is_empty() {
            continue;
        }
        let acceptable = if number.is_empty() {
            token.chars().all(|c| c.is_ascii_alphanumeric())
        } else {
            token.chars().all(|c| c.is_ascii_digit())
        };
        if !acceptable || number.len() + token.len() > DL_MAX_LEN {
            break;
        }
        number.push_str(&token);
    }

    (number.len() >= 11 && DL_SHAPE.is_match(&number)).then_some(number)
}

fn name(upper: &str, upper_lines: &[String]) -> Option<String> {
    let labelled = NAME.captures(upper).and_then(|caps| {
        let candidate = caps[1].trim().to_string();
        (candidate.len() > 3 && !NAME_DENYLIST.iter().any(|w| candidate.contains(w))).then_some(candidate)
    });
    if labelled.is_some() {
        return labelled;
    }

    upper_lines
        .iter()
        .position(|l| l.as_str() == "NAME")
        .and_then(|i| upper_lines.get(i + 1))
        .map(|next| next.replace(':', "").trim().to_string())
        .filter(|n| !n.is_empty())
}

fn father_name(upper: &str) -> Option<String> {
    RELATION
        .captures(upper)
        .map(|caps| caps[1].trim().to_string())
        .filter(|n| n.len() > 2)
}

fn labelled_date(pattern: &Regex, upper: &str) -> Option<String> {
    pattern
        .captures(upper)
        .and_then(|caps| parse_date(&caps[1]))
        .map(|d| d.format(DateStyle::DayFirst))
}

fn date_of_issue(upper_lines: &[String]) -> Option<String> {
    upper_lines
        .iter()
        .filter(|l| l.contains("DOI") && !l.contains("CDOI"))
        .find_map(|l| first_date(l))
        .map(|d| d.format(DateStyle::DayFirst))
}

fn address(upper: &str) -> Option<FieldValue> {
    let caps = ADDRESS.captures(upper)?;
    let full = collapse_whitespace(&caps[1]).into_owned();
    if full.is_empty() {
        return None;
    }

    let mut address = IndexMap::new();
    if let Some(pin) = POSTAL_CODE.find(&full) {
        address.insert("postal_code".to_string(), FieldValue::from(pin.as_str()));
    }
    address.insert("full_raw_address".to_string(), FieldValue::from(full));
    address.sort_keys();
    Some(FieldValue::Map(address))
}

/// A date that starts its line.
fn leading_date(line: &str) -> Option<DateMatch> {
    first_date(line).filter(|d| d.start == 0)
}

/// Vehicle classes with the date each was granted.
///
/// The grant date is looked for on the following line, then the preceding line, then the
/// class line itself. Each class is reported once.
fn vehicle_classes(upper_lines: &[String]) -> Vec<FieldValue> {
    let mut seen: Vec<String> = Vec::new();
    let mut classes = Vec::new();

    for (i, line) in upper_lines.iter().enumerate() {
        for caps in VEHICLE_CLASS.captures_iter(line) {
            let class = caps[1].to_string();
            if seen.contains(&class) {
                continue;
            }

            let issue_date = upper_lines
                .get(i + 1)
                .and_then(|l| leading_date(l))
                .or_else(|| i.checked_sub(1).and_then(|p| leading_date(&upper_lines[p])))
                .or_else(|| first_date(line));

            let mut entry = IndexMap::new();
            entry.insert("class".to_string(), FieldValue::from(class.as_str()));
            if let Some(date) = issue_date {
                entry.insert("issue_date".to_string(), FieldValue::from(date.format(DateStyle::DayFirst)));
            }
            classes.push(FieldValue::Map(entry));
            seen.push(class);
        }
    }

    classes
}
