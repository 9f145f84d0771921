pub mod commands;
pub mod edit;
pub mod report;

pub use edit::{apply_edit, edit_record, validate_edit, EditReport, FieldOutcome, RecordEdit, ValidatedEdit};
pub use report::{monthly_report, MonthlyReport};
