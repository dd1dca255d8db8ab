// Censoring pipeline: per-file processing and the batch driver around it.

pub mod batch;
pub mod file;

pub use batch::{expand_inputs, run, BatchOutcome, BatchRequest, FileFailure};
pub use file::{collect_spans, process_file, FileReport};
