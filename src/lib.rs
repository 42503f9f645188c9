// Consultations - fetch, filter, export and delete consultation records

pub mod api;
pub mod config;
pub mod console;
pub mod export;
pub mod filter;
pub mod record;
pub mod shell;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use api::{ApiError, ConsultationApi, HttpApi};
pub use config::Config;
pub use console::{ActionOutcome, AssumeYes, Confirm, Console, PromptConfirm};
pub use export::{DateTimeFormats, ExportRow, export_rows, export_to_spreadsheet, write_workbook};
pub use filter::{DayBucket, FilterCriteria, apply_filters};
pub use record::Consultation;
pub use store::{RecordStore, StoreEvent};
pub use view::render_table;
