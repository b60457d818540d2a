pub mod record;

pub use record::{CaseEntry, ErrorPlaceholder, ExtractionRecord, ResultSet, TargetLink};
