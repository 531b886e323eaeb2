use crate::types::SubjectRecord;
use std::collections::{BTreeMap, HashSet};

/// Subjects grouped by semester, built during one reconstruction pass.
///
/// Only subjects under a semester header are stored; the reconstructor drops rows it reads
/// before the first header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemesterTable {
    semesters: BTreeMap<u32, Vec<SubjectRecord>>,
    max_semester: Option<u32>,
}

impl SemesterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a semester header, even if no subject follows it.
    pub fn note_semester(&mut self, semester: u32) {
        self.semesters.entry(semester).or_default();
        self.max_semester = Some(self.max_semester.map_or(semester, |max| max.max(semester)));
    }

    /// Append a subject and return its position within its list.
    pub fn push(&mut self, semester: u32, subject: SubjectRecord) -> usize {
        let list = self.semesters.entry(semester).or_default();
        list.push(subject);
        list.len() - 1
    }

    pub fn subject_mut(&mut self, semester: u32, index: usize) -> Option<&mut SubjectRecord> {
        self.semesters.get_mut(&semester)?.get_mut(index)
    }

    /// Collapse repeated subject codes within each semester, keeping the first occurrence.
    pub fn dedup(&mut self) {
        for list in self.semesters.values_mut() {
            let mut seen = HashSet::new();
            list.retain(|subject| seen.insert(subject.subject_code.clone()));
        }
    }

    /// Highest semester header seen.
    pub fn max_semester(&self) -> Option<u32> {
        self.max_semester
    }

    pub fn semester(&self, semester: u32) -> &[SubjectRecord] {
        self.semesters.get(&semester).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Subjects of the current (highest) semester. Empty when no header was seen.
    pub fn current_subjects(&self) -> &[SubjectRecord] {
        match self.max_semester {
            Some(max) => self.semester(max),
            None => &[],
        }
    }

    /// A lower semester's non-empty list, reported as backlog of the current semester.
    pub fn backlog(&self, semester: u32) -> Option<&[SubjectRecord]> {
        let max = self.max_semester?;
        let list = self.semester(semester);
        (semester < max && !list.is_empty()).then_some(list)
    }

    pub fn total_subjects(&self) -> usize {
        self.semesters.values().map(Vec::len).sum()
    }
}
