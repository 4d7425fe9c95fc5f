use thiserror::Error;

use crate::context::OutputFormat;
use crate::pipeline::JobError;
use crate::pool::PoolError;

use super::MergeError;

/// Fatal outcome of [`BatchExecutor::run`](super::BatchExecutor::run).
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid request configuration: {0}")]
    Configuration(#[from] MergeError),

    #[error("There was a problem creating the processor: {0}")]
    Construction(#[source] JobError),

    #[error("Failed to submit job: {0}")]
    Submit(#[from] PoolError),

    #[error("Interrupted while waiting for the document to be processed")]
    Interrupted,

    #[error("Job finished without signalling completion")]
    Signal,

    #[error("Document processing failed: {0}")]
    Processing(String),

    #[error("No output sink for requested format {0}")]
    MissingSink(OutputFormat),

    #[error("Executor has already run")]
    AlreadyRun,
}
