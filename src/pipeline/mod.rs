//! Pipeline module - cleaning stages and the two analysis branches

pub mod aggregate;
pub mod coerce;
pub mod correlation;
pub mod describe;
pub mod encoder;
pub mod loader;
pub mod outliers;
pub mod regression;
pub mod runner;
pub mod schema;
pub mod table;

pub use aggregate::*;
pub use coerce::*;
pub use correlation::*;
pub use describe::*;
pub use encoder::*;
pub use loader::*;
pub use outliers::*;
pub use regression::*;
pub use runner::*;
pub use schema::*;
pub use table::{column_names, ColumnDrops, MISSING_CATEGORY};
