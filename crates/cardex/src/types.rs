use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// OCR line stream
// ============================================================================

/// One recognized text line with its recognition confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Ordered OCR output for a single document.
///
/// Order is significant: it is the top-to-bottom reading order that the marksheet
/// reconstructor relies on. A stream is built once per document and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineStream {
    lines: Vec<OcrLine>,
}

impl LineStream {
    pub fn new(lines: Vec<OcrLine>) -> Self {
        Self { lines }
    }

    /// Build a stream from bare text lines, each with full confidence.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts.into_iter().map(|t| OcrLine::new(t, 1.0)).collect()
    }

    pub fn push(&mut self, line: OcrLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[OcrLine] {
        &self.lines
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Mean line confidence, or `0.0` for an empty stream.
    pub fn mean_confidence(&self) -> f64 {
        if self.lines.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.lines.iter().map(|l| f64::from(l.confidence)).sum();
        sum / self.lines.len() as f64
    }
}

impl FromIterator<OcrLine> for LineStream {
    fn from_iter<T: IntoIterator<Item = OcrLine>>(iter: T) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Document type
// ============================================================================

/// Closed set of document kinds the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Aadhaar,
    Pan,
    DrivingLicence,
    Passport,
    Marksheet,
    Unknown,
}

impl DocumentType {
    /// Stable tag used as the `document_type` value in records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "aadhaar",
            DocumentType::Pan => "pan",
            DocumentType::DrivingLicence => "driving_licence",
            DocumentType::Passport => "passport",
            DocumentType::Marksheet => "marksheet",
            DocumentType::Unknown => "unknown",
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "Aadhaar Card",
            DocumentType::Pan => "PAN Card",
            DocumentType::DrivingLicence => "Driving Licence",
            DocumentType::Passport => "Passport",
            DocumentType::Marksheet => "Marksheet",
            DocumentType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = std::convert::Infallible;

    /// Accepts the stable tags as well as the display names other tools write
    /// ("Aadhaar Card", "Driving License", ...). Anything else is `Unknown`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        Ok(match key.as_str() {
            "aadhaar" | "aadhaar_card" | "aadhar" | "aadhar_card" => DocumentType::Aadhaar,
            "pan" | "pan_card" => DocumentType::Pan,
            "driving_licence" | "driving_license" | "dl" => DocumentType::DrivingLicence,
            "passport" => DocumentType::Passport,
            "marksheet" | "mark_sheet" => DocumentType::Marksheet,
            _ => DocumentType::Unknown,
        })
    }
}

// ============================================================================
// Subject records
// ============================================================================

/// Result code printed next to a subject on a marksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectResult {
    #[serde(rename = "P")]
    Pass,
    #[serde(rename = "F")]
    Fail,
    #[serde(rename = "A")]
    Absent,
    #[serde(rename = "W")]
    Withheld,
    #[serde(rename = "X")]
    NotEligible,
    /// Subject was force-completed without ever seeing its result token.
    Unknown,
}

impl SubjectResult {
    /// Parse a result token as printed in the result column.
    ///
    /// "PASS"/"FAIL" collapse to their first letter and the common OCR misreads
    /// "OF"/"0F" of a fail mark are read as `F`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "P" | "PASS" => Some(SubjectResult::Pass),
            "F" | "FAIL" | "OF" | "0F" => Some(SubjectResult::Fail),
            "A" => Some(SubjectResult::Absent),
            "W" => Some(SubjectResult::Withheld),
            "X" => Some(SubjectResult::NotEligible),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SubjectResult::Pass => "P",
            SubjectResult::Fail => "F",
            SubjectResult::Absent => "A",
            SubjectResult::Withheld => "W",
            SubjectResult::NotEligible => "X",
            SubjectResult::Unknown => "Unknown",
        }
    }

    /// Legend printed at the foot of the marksheet.
    pub fn legend() -> IndexMap<String, FieldValue> {
        [
            ("P", "Pass"),
            ("F", "Fail"),
            ("A", "Absent"),
            ("W", "Withheld"),
            ("X", "Not Eligible"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), FieldValue::from(v)))
        .collect()
    }
}

/// One row of a marksheet subject table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub subject_code: String,
    pub subject_name: String,
    pub internal_marks: String,
    pub external_marks: String,
    pub total: String,
    pub result: SubjectResult,
}

impl SubjectRecord {
    fn from_json(object: &serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        fn text(object: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
            match object.get(key) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => String::new(),
            }
        }

        let subject_code = text(object, "subject_code");
        if subject_code.is_empty() {
            return None;
        }
        Some(Self {
            subject_code,
            subject_name: text(object, "subject_name"),
            internal_marks: text(object, "internal_marks"),
            external_marks: text(object, "external_marks"),
            total: text(object, "total"),
            result: SubjectResult::from_token(&text(object, "result")).unwrap_or(SubjectResult::Unknown),
        })
    }
}

// ============================================================================
// Field records
// ============================================================================

/// A single field value in an extracted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Subjects(Vec<SubjectRecord>),
    List(Vec<FieldValue>),
    Map(IndexMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            FieldValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Subject rows, treating an empty generic list as an empty table.
    pub fn as_subjects(&self) -> Option<&[SubjectRecord]> {
        match self {
            FieldValue::Subjects(s) => Some(s),
            FieldValue::List(l) if l.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// True for empty strings, empty collections and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::Subjects(s) => s.is_empty(),
            FieldValue::List(l) => l.is_empty(),
            FieldValue::Map(m) => m.is_empty(),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Text(String::new()),
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or_else(|| FieldValue::Text(n.to_string())),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => {
                let looks_like_subjects = !items.is_empty()
                    && items
                        .iter()
                        .all(|item| item.as_object().is_some_and(|o| o.contains_key("subject_code")));
                if looks_like_subjects {
                    let subjects: Option<Vec<SubjectRecord>> = items
                        .iter()
                        .map(|item| item.as_object().and_then(SubjectRecord::from_json))
                        .collect();
                    if let Some(subjects) = subjects {
                        return FieldValue::Subjects(subjects);
                    }
                }
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            Value::Object(object) => {
                FieldValue::Map(object.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(FieldValue::from)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<Vec<SubjectRecord>> for FieldValue {
    fn from(value: Vec<SubjectRecord>) -> Self {
        FieldValue::Subjects(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl From<IndexMap<String, FieldValue>> for FieldValue {
    fn from(value: IndexMap<String, FieldValue>) -> Self {
        FieldValue::Map(value)
    }
}

/// Ordered mapping from field name to value.
///
/// Insertion order is preserved so serialized records read in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldRecord {
    fields: IndexMap<String, FieldValue>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a record tagged with `document_type`.
    pub fn for_document(document_type: DocumentType) -> Self {
        let mut record = Self::new();
        record.set_document_type(document_type);
        record
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(key.into(), value.into())
    }

    /// Insert only when `value` is `Some`.
    pub fn insert_opt(&mut self, key: &str, value: Option<impl Into<FieldValue>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Remove a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut FieldValue)> {
        self.fields.iter_mut()
    }

    pub fn retain(&mut self, keep: impl FnMut(&String, &mut FieldValue) -> bool) {
        self.fields.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Document type recorded in the `document_type` field, `Unknown` when absent.
    pub fn document_type(&self) -> DocumentType {
        self.get_text("document_type")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DocumentType::Unknown)
    }

    pub fn set_document_type(&mut self, document_type: DocumentType) {
        self.insert("document_type", document_type.as_str());
    }

    pub fn into_inner(self) -> IndexMap<String, FieldValue> {
        self.fields
    }

    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<'de> Deserialize<'de> for FieldRecord {
    /// Top-level `null` values are dropped: an absent field and a null field mean the same.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = IndexMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k, FieldValue::from(v)))
            .collect())
    }
}

impl From<IndexMap<String, FieldValue>> for FieldRecord {
    fn from(fields: IndexMap<String, FieldValue>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for FieldRecord {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

// ============================================================================
// Pipeline output
// ============================================================================

/// Final artifact of one pipeline run.
///
/// A failed validation does not discard the data: `record` then holds the
/// unvalidated fields and `validation_error` says what was wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub document_type: DocumentType,
    pub record: FieldRecord,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
    /// Reference to the source image (usually its path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_stream_mean_confidence() {
        let stream = LineStream::new(vec![OcrLine::new("a", 0.5), OcrLine::new("b", 1.0)]);
        assert!((stream.mean_confidence() - 0.75).abs() < 1e-9);
        assert_eq!(LineStream::default().mean_confidence(), 0.0);
    }

    #[test]
    fn test_ocr_line_clamps_confidence() {
        assert_eq!(OcrLine::new("x", 1.7).confidence, 1.0);
        assert_eq!(OcrLine::new("x", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_document_type_parses_display_names() {
        assert_eq!("Aadhaar Card".parse::<DocumentType>().unwrap(), DocumentType::Aadhaar);
        assert_eq!("PAN Card".parse::<DocumentType>().unwrap(), DocumentType::Pan);
        assert_eq!("Driving License".parse::<DocumentType>().unwrap(), DocumentType::DrivingLicence);
        assert_eq!("driving_licence".parse::<DocumentType>().unwrap(), DocumentType::DrivingLicence);
        assert_eq!("voter id".parse::<DocumentType>().unwrap(), DocumentType::Unknown);
    }

    #[test]
    fn test_subject_result_tokens() {
        assert_eq!(SubjectResult::from_token("pass"), Some(SubjectResult::Pass));
        assert_eq!(SubjectResult::from_token("FAIL"), Some(SubjectResult::Fail));
        assert_eq!(SubjectResult::from_token("0F"), Some(SubjectResult::Fail));
        assert_eq!(SubjectResult::from_token("X"), Some(SubjectResult::NotEligible));
        assert_eq!(SubjectResult::from_token("Q"), None);
    }

    #[test]
    fn test_field_record_preserves_order() {
        let mut record = FieldRecord::new();
        record.insert("b", "2");
        record.insert("a", "1");
        record.insert("c", "3");
        record.remove("a");
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_field_record_json_roundtrip_with_subjects() {
        let json = serde_json::json!({
            "document_type": "marksheet",
            "semester": "3",
            "subjects": [{
                "subject_code": "18CS31",
                "subject_name": "Data Structures",
                "internal_marks": "28",
                "external_marks": 65,
                "total": "93",
                "result": "P"
            }],
            "face_image": null
        });

        let record: FieldRecord = serde_json::from_value(json).unwrap();
        assert!(!record.contains_key("face_image"));
        assert_eq!(record.document_type(), DocumentType::Marksheet);

        let subjects = record.get("subjects").and_then(FieldValue::as_subjects).unwrap();
        assert_eq!(subjects[0].external_marks, "65");
        assert_eq!(subjects[0].result, SubjectResult::Pass);
    }

    #[test]
    fn test_field_value_blank() {
        assert!(FieldValue::from("  ").is_blank());
        assert!(FieldValue::List(vec![]).is_blank());
        assert!(!FieldValue::from(0.0).is_blank());
    }
}
