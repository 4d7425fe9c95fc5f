//! annobatch - single-document batch annotation.
//!
//! One document plus its request overrides is merged with the service
//! configuration, processed by one job on a shared worker pool, and returned
//! as a corpus and, optionally, one serialized output format.

pub mod batch;
pub mod cli;
pub mod config;
pub mod context;
pub mod corpus;
pub mod dictionary;
pub mod pipeline;
pub mod pool;
pub mod server;

pub use batch::{BatchError, BatchExecutor, BatchRequest};
pub use context::{Context, ContextConfiguration, InputFormat, OutputFormat};
pub use corpus::Corpus;
pub use pipeline::ProcessorKind;
pub use pool::{TokioWorkerPool, WorkerPool};
