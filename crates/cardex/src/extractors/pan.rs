//! PAN card field extraction.
//!
//! Names are found by label proximity first ("Name" / "Father's Name" followed by the value
//! line). Newer cards often lose their labels in OCR, so when a label is missing the lines
//! right above the date of birth are used: father's name directly above, holder's name above that.

use crate::core::config::DateStyle;
use crate::text::dates::{contains_date, first_date};
use crate::types::{DocumentType, FieldRecord};
use once_cell::sync::Lazy;
use regex::Regex;

static PAN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").expect("PAN number regex pattern is valid"));

const FATHER_DENYLIST: &[&str] = &["Number", "Card", "Signature", "Date", "DOB"];
const NAME_DENYLIST: &[&str] = &["Number", "Card", "Father", "Mother"];
const BOILERPLATE: &[&str] = &["GOVT", "TAX", "DEPARTMENT", "INDIA", "INCOME"];

pub fn extract(blob: &str, lines: &[String]) -> FieldRecord {
    let mut record = FieldRecord::for_document(DocumentType::Pan);
    record.insert_opt("pan_number", pan_number(blob));

    let dob = first_date(blob);
    record.insert_opt("dob", dob.map(|d| d.format(DateStyle::DayFirst)));

    let labelled = labelled_names(lines);
    let mut name = labelled.name;
    let mut father_name = labelled.father_name;

    if dob.is_some() && (name.is_none() || father_name.is_none()) {
        let positional = positional_names(lines);
        name = name.or(positional.name);
        father_name = father_name.or(positional.father_name);
    }

    record.insert_opt("name", name);
    record.insert_opt("father_name", father_name);
    record
}

/// The first PAN-shaped code, exactly as printed.
pub fn pan_number(blob: &str) -> Option<String> {
    PAN_NUMBER.find(blob).map(|m| m.as_str().to_string())
}

#[derive(Debug, Default)]
struct Names {
    name: Option<String>,
    father_name: Option<String>,
}

fn labelled_names(lines: &[String]) -> Names {
    let mut names = Names::default();

    for (i, line) in lines.iter().enumerate() {
        let next = lines.get(i + 1);
        if line.contains("Father") || line.contains("Mother") {
            if names.father_name.is_none()
                && let Some(candidate) = next
                && !FATHER_DENYLIST.iter().any(|w| candidate.contains(w))
            {
                names.father_name = Some(candidate.clone());
            }
            continue;
        }

        if line.contains("Name")
            && names.name.is_none()
            && let Some(candidate) = next
            && !NAME_DENYLIST.iter().any(|w| candidate.contains(w))
        {
            names.name = Some(candidate.clone());
        }
    }

    names
}

fn positional_names(lines: &[String]) -> Names {
    let Some(dob_index) = lines.iter().position(|line| contains_date(line)) else {
        return Names::default();
    };
    if dob_index < 2 {
        return Names::default();
    }

    let accept = |candidate: &String| {
        let upper = candidate.to_uppercase();
        (!BOILERPLATE.iter().any(|w| upper.contains(w))).then(|| candidate.clone())
    };

    Names {
        father_name: accept(&lines[dob_index - 1]),
        name: accept(&lines[dob_index - 2]),
    }
}
