//! Annotation pipeline: the unit of work executors hand to the worker pool.
//!
//! A [`Job`] is built once through the processor registry
//! ([`processor::new_processor`]), bound to its input, its output sinks and
//! the shared corpus, then consumed by a single call to [`Job::process`].

mod job;
pub mod postprocess;
pub mod processor;
pub mod reader;
pub mod recognizer;
pub mod writers;

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::batch::OutputSink;
use crate::config::ServiceConfig;
use crate::context::{ContextConfiguration, InputFormat, OutputFormat};
use crate::corpus::Corpus;
use crate::dictionary::Dictionaries;

pub use job::AnnotationJob;
pub use processor::{new_processor, ProcessorConstructor, ProcessorKind, PROCESSORS};

/// A bound unit of document-processing work.
pub trait Job: Send {
    /// Identifier used in log lines.
    fn label(&self) -> &str;

    /// Run to completion. Called exactly once.
    fn process(self: Box<Self>) -> Result<(), JobError>;
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("No {0} dictionaries loaded")]
    NoDictionaries(&'static str),

    #[error("XML tags can only select regions of XML input, got {0:?}")]
    XmlTagsWithoutXml(InputFormat),

    #[error("Job received {sinks} output sinks for {formats} declared formats")]
    SinkMismatch { sinks: usize, formats: usize },

    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),

    #[error("Failed to write {format} output: {source}")]
    Output {
        format: OutputFormat,
        #[source]
        source: std::io::Error,
    },

    #[error("Result corpus is unavailable (lock poisoned)")]
    CorpusPoisoned,
}

/// Everything a processor constructor binds into a job.
pub struct JobParams {
    pub config: Arc<ContextConfiguration>,
    pub input: Box<dyn Read + Send>,
    /// One sink per `config.output_formats()`, in the same order.
    pub sinks: Vec<OutputSink>,
    pub service: Arc<ServiceConfig>,
    pub dictionaries: Arc<Dictionaries>,
    /// Result target shared with the executor.
    pub corpus: Arc<Mutex<Corpus>>,
    pub groups: HashMap<String, bool>,
    pub filter_groups: bool,
}
