//! Sample data model and storage.
pub mod sample;
pub mod storage;

pub use sample::{Sample, SampleSequence};
pub use storage::CsvWriter;
