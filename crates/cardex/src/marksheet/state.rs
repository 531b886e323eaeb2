//! Streaming subject-table state machine.
//!
//! OCR of a printed mark table loses column alignment: one logical row (code, multi-word name,
//! three marks, result letter) arrives as an unpredictable run of lines. The machine below
//! walks those lines once and cuts them back into rows.
//!
//! ```text
//! SeekingCode --code--> BuildingName --digits--> SeekingMarks --result--> SeekingCode
//!                                                  |      ^
//!                                            noise |      | digits
//!                                                  v      |
//!                                               SeekingResult --result--> SeekingCode
//! ```
//!
//! A semester header resets the machine from any state and discards the subject in flight.
//! Rows read before the first header belong to no semester and are dropped.
//! A new subject code in the middle of a row hands the unfinished row to the configured
//! [`ForceCompletionPolicy`].

use super::table::SemesterTable;
use crate::core::config::{ForceCompletionPolicy, MarksheetConfig};
use crate::text::string_utils::{has_digit, has_letter, is_digits};
use crate::types::{SubjectRecord, SubjectResult};
use once_cell::sync::Lazy;
use regex::Regex;

static SEMESTER_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsemester\s*[:\-]?\s*(\d{1,2})\b").expect("Semester header regex pattern is valid"));
static STRICT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{5,8}$").expect("Strict subject code regex pattern is valid"));
static LOOSE_CODE_NUMERIC_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}[A-Z]{2,3}\d{2,4}$").expect("Loose subject code regex pattern is valid"));
static LOOSE_CODE_LETTER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,3}\d{2,4}$").expect("Loose subject code regex pattern is valid"));
static ISO_DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("ISO date prefix regex pattern is valid"));

/// Column headers that show up between a subject's name lines.
const COLUMN_NOISE: &[&str] = &["internal", "external", "total", "result", "grade"];

/// Lines that never extend a subject name when merging orphan fragments.
const ORPHAN_NOISE: &[&str] = &[
    "internal", "external", "total", "result", "grade", "marks", "announced", "/updated", "on", "fail", "pass", "p",
    "f", "a", "w", "x", "ne->", "of", "na", "n/a",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    SeekingCode,
    BuildingName,
    SeekingMarks,
    SeekingResult,
}

#[derive(Debug, Default)]
struct PendingSubject {
    code: String,
    name_parts: Vec<String>,
    marks: Vec<String>,
}

impl PendingSubject {
    /// Build the record from the last three buffered marks, oldest first.
    fn complete(self, result: SubjectResult) -> Option<SubjectRecord> {
        let [internal, external, total] = self.marks.get(self.marks.len().checked_sub(3)?..)? else {
            return None;
        };
        Some(SubjectRecord {
            subject_code: self.code,
            subject_name: self.name_parts.join(" "),
            internal_marks: internal.clone(),
            external_marks: external.clone(),
            total: total.clone(),
            result,
        })
    }
}

/// Line-at-a-time subject table builder.
#[derive(Debug)]
pub struct Reconstructor<'a> {
    config: &'a MarksheetConfig,
    state: ParseState,
    pending: Option<PendingSubject>,
    semester: Option<u32>,
    table: SemesterTable,
    last_completed: Option<(u32, usize)>,
}

impl<'a> Reconstructor<'a> {
    pub fn new(config: &'a MarksheetConfig) -> Self {
        Self {
            config,
            state: ParseState::SeekingCode,
            pending: None,
            semester: None,
            table: SemesterTable::new(),
            last_completed: None,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Consume one line.
    pub fn feed(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(semester) = self.semester_header(line) {
            self.start_semester(semester);
            return;
        }

        if is_loose_code(line) || (self.state == ParseState::SeekingCode && is_strict_code(line)) {
            self.begin_subject(line);
            return;
        }

        match self.state {
            ParseState::SeekingCode => self.absorb_orphan(line),
            ParseState::BuildingName => self.build_name(line),
            ParseState::SeekingMarks => self.seek_marks(line),
            ParseState::SeekingResult => self.seek_result(line),
        }
    }

    /// End the pass. A subject still in flight is dropped rather than completed with guessed marks.
    pub fn finish(mut self) -> SemesterTable {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(code = %pending.code, "Dropping subject without result at end of table");
        }
        self.table.dedup();
        self.table
    }

    fn semester_header(&self, line: &str) -> Option<u32> {
        let caps = SEMESTER_HEADER.captures(line)?;
        let semester: u32 = caps[1].parse().ok()?;
        (1..=self.config.max_semester).contains(&semester).then_some(semester)
    }

    fn start_semester(&mut self, semester: u32) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(code = %pending.code, "Semester header discards unfinished subject");
        }
        self.semester = Some(semester);
        self.table.note_semester(semester);
        self.state = ParseState::SeekingCode;
        self.last_completed = None;
    }

    fn begin_subject(&mut self, code: &str) {
        if let Some(pending) = self.pending.take() {
            match self.config.force_completion {
                ForceCompletionPolicy::Drop => {
                    tracing::debug!(code = %pending.code, "Dropping unfinished subject at next code");
                }
                ForceCompletionPolicy::DefaultUnknown => {
                    let code = pending.code.clone();
                    match (self.semester, pending.complete(SubjectResult::Unknown)) {
                        (Some(semester), Some(subject)) => {
                            self.table.push(semester, subject);
                        }
                        (None, Some(_)) => tracing::debug!(code = %code, "Dropping subject outside any semester"),
                        (_, None) => tracing::debug!(code = %code, "Too few marks to force-complete subject"),
                    }
                }
            }
        }

        self.pending = Some(PendingSubject {
            code: code.to_string(),
            ..Default::default()
        });
        self.state = ParseState::BuildingName;
        self.last_completed = None;
    }

    fn build_name(&mut self, line: &str) {
        let Some(pending) = self.pending.as_mut() else {
            self.state = ParseState::SeekingCode;
            return;
        };

        if is_digits(line) {
            pending.marks.push(line.to_string());
            self.state = ParseState::SeekingMarks;
        } else if !COLUMN_NOISE.contains(&line.to_lowercase().as_str()) {
            pending.name_parts.push(line.to_string());
        }
    }

    fn seek_marks(&mut self, line: &str) {
        let Some(pending) = self.pending.as_mut() else {
            self.state = ParseState::SeekingCode;
            return;
        };

        if is_digits(line) {
            pending.marks.push(line.to_string());
        } else if line == "-" {
            pending.marks.push("0".to_string());
        } else if let Some(result) = SubjectResult::from_token(line) {
            self.complete(result);
        } else if pending.marks.len() >= 3 {
            self.state = ParseState::SeekingResult;
        }
    }

    fn seek_result(&mut self, line: &str) {
        if let Some(result) = SubjectResult::from_token(line) {
            self.complete(result);
            return;
        }

        let mark = if is_digits(line) {
            line.to_string()
        } else if line == "-" {
            "0".to_string()
        } else {
            return;
        };
        if let Some(pending) = self.pending.as_mut() {
            pending.marks.push(mark);
            self.state = ParseState::SeekingMarks;
        }
    }

    fn complete(&mut self, result: SubjectResult) {
        self.state = ParseState::SeekingCode;
        let Some(pending) = self.pending.take() else {
            return;
        };

        let code = pending.code.clone();
        match (self.semester, pending.complete(result)) {
            (Some(semester), Some(subject)) => {
                let index = self.table.push(semester, subject);
                self.last_completed = Some((semester, index));
            }
            (None, Some(_)) => tracing::debug!(code = %code, "Dropping subject outside any semester"),
            (_, None) => tracing::debug!(code = %code, "Dropping subject with fewer than three marks"),
        }
    }

    fn absorb_orphan(&mut self, line: &str) {
        if !self.config.merge_orphan_fragments || !is_orphan_fragment(line) {
            return;
        }
        if let Some((semester, index)) = self.last_completed
            && let Some(subject) = self.table.subject_mut(semester, index)
        {
            subject.subject_name = format!("{} {}", subject.subject_name, line).trim().to_string();
        }
    }
}

/// Reconstruct the semester table from cleaned marksheet lines.
pub fn reconstruct_table<S: AsRef<str>>(lines: &[S], config: &MarksheetConfig) -> SemesterTable {
    let mut reconstructor = Reconstructor::new(config);
    for line in lines {
        reconstructor.feed(line.as_ref());
    }
    reconstructor.finish()
}

fn is_code_candidate(line: &str) -> bool {
    let lower = line.to_lowercase();
    !line.contains(char::is_whitespace) && !lower.contains("code") && !lower.contains("subject")
}

/// Code shapes seen on university tables (`18CS31`, `CS301`). Recognised in any state.
fn is_loose_code(line: &str) -> bool {
    is_code_candidate(line) && (LOOSE_CODE_NUMERIC_PREFIX.is_match(line) || LOOSE_CODE_LETTER_PREFIX.is_match(line))
}

/// Any 5-8 character alphanumeric code mixing letters and digits. Only trusted between rows.
fn is_strict_code(line: &str) -> bool {
    is_code_candidate(line) && STRICT_CODE.is_match(line) && has_digit(line) && has_letter(line)
}

fn is_orphan_fragment(line: &str) -> bool {
    let lower = line.to_lowercase();
    has_letter(line)
        && !ISO_DATE_PREFIX.is_match(line)
        && !ORPHAN_NOISE.contains(&lower.as_str())
        && !line.contains("Nomenclature")
        && !line.contains("->")
        && !line.to_uppercase().contains("ELIGIBLE")
}
