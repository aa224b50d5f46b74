//! Terminal output: progress bar and report table.

pub mod progress;
pub mod table;

pub use progress::ProgressReporter;
pub use table::render_report;
