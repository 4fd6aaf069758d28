pub mod astro;
pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod fits;
pub mod header;
pub mod logging;
pub mod number_format;
pub mod operations;
pub mod report;
pub mod sexagesimal;
pub mod store;
pub mod utils;
pub mod validate;

// Re-export commonly used items
pub use batch::{BatchReport, Outcome, Schedule};
pub use engine::{Engine, FileEdit};
pub use error::{EditError, ErrorKind, Result};
pub use fits::{FitsFile, FitsStore};
pub use header::{HeaderRecord, HeaderValue};
pub use operations::{Operation, OperationDescriptor};
