//! Report module - terminal summaries and the JSON analysis report

pub mod analysis_report;
pub mod summary;

pub use analysis_report::*;
pub use summary::*;
