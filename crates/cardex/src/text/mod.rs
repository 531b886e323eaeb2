//! Text utilities shared by the classifier, extractors and the merge layer.

pub mod dates;
pub mod institution;
pub mod normalize;
pub mod string_utils;

pub use dates::{DateMatch, find_dates, first_date, normalize_date, parse_date};
pub use institution::canonicalize_institution;
pub use normalize::{NormalizedText, fix_confusables, normalize};
pub use string_utils::{collapse_whitespace, is_all_caps, title_case};
