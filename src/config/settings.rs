//! Application settings.

use std::path::PathBuf;

use crate::context::{
    ContextConfiguration, InputFormat, OutputFormat, ParserLanguage, ParserLevel, ParserTool,
};

use super::ServiceConfig;

/// Default HTTP bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8010;

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Number of jobs the worker pool runs at once.
    pub workers: usize,
    /// Dictionary files or directories.
    pub dictionary_paths: Vec<PathBuf>,
    /// Formats every job writes, in order.
    pub output_formats: Vec<OutputFormat>,
    pub input_format: InputFormat,
    pub parser_tool: ParserTool,
    pub parser_language: ParserLanguage,
    pub parser_level: ParserLevel,
    /// Service-level filtering and post-processing data.
    pub service: ServiceConfig,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            workers,
            dictionary_paths: Vec::new(),
            output_formats: OutputFormat::ALL.to_vec(),
            input_format: InputFormat::default(),
            parser_tool: ParserTool::default(),
            parser_language: ParserLanguage::default(),
            parser_level: ParserLevel::default(),
            service: ServiceConfig::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Configuration the processing context starts from.
    pub fn base_configuration(&self) -> ContextConfiguration {
        ContextConfiguration::builder()
            .with_input_format(self.input_format)
            .with_output_formats(self.output_formats.clone())
            .with_parser_tool(self.parser_tool)
            .with_parser_language(self.parser_language)
            .with_parser_level(self.parser_level)
            .build()
    }
}
