//! Single-document batch execution.
//!
//! A [`BatchExecutor`] takes one document plus its request overrides, merges
//! them with the service configuration ([`merge`]), allocates one output sink
//! per declared format ([`sinks`]), runs one job on the shared worker pool and
//! exposes the requested output plus the resulting corpus.

mod error;
pub mod executor;
pub mod merge;
pub mod sinks;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::context::{InputFormat, OutputFormat};

pub use error::BatchError;
pub use executor::BatchExecutor;
pub use merge::{merge_configuration, ExtraOptions, MergeError, MergedConfiguration};
pub use sinks::{OutputSink, OutputSinks};

/// Per-request values layered over the service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub text: String,
    /// Semantic groups to keep. Absent or empty disables filtering.
    #[serde(default)]
    pub groups: Option<HashMap<String, bool>>,
    #[serde(default)]
    pub input_format: InputFormat,
    /// `None` annotates only; no serialized output is returned.
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
    #[serde(default, alias = "params")]
    pub extra_parameters: HashMap<String, String>,
}

impl BatchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_groups(mut self, groups: HashMap<String, bool>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn with_input_format(mut self, format: InputFormat) -> Self {
        self.input_format = format;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_extra_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_parameters.insert(key.into(), value.into());
        self
    }

    /// Whether the request restricts annotations to some semantic groups.
    pub fn is_filtering_groups(&self) -> bool {
        self.groups.as_ref().is_some_and(|g| !g.is_empty())
    }
}
