use thiserror::Error;

/// Per-file failures raised by the analysis pipeline.
///
/// Every variant is caught at the file boundary and turned into a
/// [`crate::data::pipeline::ProcessingResult::Failure`]; none of them aborts a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("could not parse table: {0}")]
    Parse(String),

    #[error("need at least 2 columns to pick voltage and current, found {columns}")]
    Selection { columns: usize },

    #[error("device area must be a positive number of µm², got {0}")]
    InvalidArea(f64),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
