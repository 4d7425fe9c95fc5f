//! Processing context shared by every executor of a service.

mod configuration;

use std::sync::Arc;

pub use configuration::{
    ContextConfiguration, ContextConfigurationBuilder, InputFormat, OutputFormat, ParserLanguage,
    ParserLevel, ParserTool,
};

use crate::dictionary::Dictionaries;

/// Base configuration plus the loaded dictionaries.
///
/// A context is read-only once built; executors derive their own
/// configuration from it for each run and never write back.
#[derive(Debug, Clone)]
pub struct Context {
    configuration: Arc<ContextConfiguration>,
    dictionaries: Arc<Dictionaries>,
}

impl Context {
    pub fn new(configuration: ContextConfiguration, dictionaries: Dictionaries) -> Self {
        Self {
            configuration: Arc::new(configuration),
            dictionaries: Arc::new(dictionaries),
        }
    }

    pub fn configuration(&self) -> &Arc<ContextConfiguration> {
        &self.configuration
    }

    pub fn dictionaries(&self) -> &Arc<Dictionaries> {
        &self.dictionaries
    }
}
