//! File I/O, validation, and artifact writing for the ranforest pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, TrainingTable};
pub use error::IoError;
pub use reader::TableReader;
pub use writer::ResultWriter;
