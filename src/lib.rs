// Redactor: censor personal information in plain-text documents.
//
// This is the library root. Each module corresponds to a stage of the
// censoring pipeline.

pub mod censor;
pub mod concepts;
pub mod config;
pub mod detect;
pub mod entities;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod stats;
