//! Processing configuration: formats, parser settings and the data blobs
//! a job needs (false positives, group normalization).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Format of the document handed to a job.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Plain text; the whole document is annotated.
    #[default]
    Raw,
    /// XML; only element text is annotated (optionally restricted to some tags).
    Xml,
    /// BioC XML; passages are read from `<text>` elements.
    Bioc,
}

/// Serialization target for annotated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// brat standoff annotations.
    A1,
    Json,
    /// Inline XML annotations.
    Xml,
    /// One annotation per line: `ids|start end|text`.
    Pipe,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Json,
        OutputFormat::Xml,
        OutputFormat::A1,
        OutputFormat::Pipe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::A1 => "a1",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Pipe => "pipe",
        }
    }

    /// MIME type used when the format is served over HTTP.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Xml => "application/xml",
            OutputFormat::A1 | OutputFormat::Pipe => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a1" => Ok(OutputFormat::A1),
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            "pipe" => Ok(OutputFormat::Pipe),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(InputFormat::Raw),
            "xml" => Ok(InputFormat::Xml),
            "bioc" => Ok(InputFormat::Bioc),
            other => Err(format!("unknown input format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserTool {
    #[default]
    Gdep,
    OpenNlp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserLanguage {
    #[default]
    English,
    Spanish,
    Portuguese,
    French,
}

/// How deep the parser goes before recognition runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserLevel {
    #[default]
    Tokenization,
    Pos,
    Lemmatization,
    Chunking,
    Dependency,
}

/// Configuration a single job runs with.
///
/// Values are immutable once built. Use [`ContextConfiguration::to_builder`]
/// to derive a modified copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextConfiguration {
    input_format: InputFormat,
    output_formats: Vec<OutputFormat>,
    parser_tool: ParserTool,
    parser_language: ParserLanguage,
    parser_level: ParserLevel,
    false_positives: Option<Vec<u8>>,
    semantic_groups_normalization: Option<Vec<u8>>,
    abbreviations: bool,
    disambiguation: bool,
}

impl ContextConfiguration {
    pub fn builder() -> ContextConfigurationBuilder {
        ContextConfigurationBuilder::default()
    }

    pub fn to_builder(&self) -> ContextConfigurationBuilder {
        ContextConfigurationBuilder {
            inner: self.clone(),
        }
    }

    pub fn input_format(&self) -> InputFormat {
        self.input_format
    }

    /// Formats every job built from this configuration writes, in order.
    pub fn output_formats(&self) -> &[OutputFormat] {
        &self.output_formats
    }

    pub fn parser_tool(&self) -> ParserTool {
        self.parser_tool
    }

    pub fn parser_language(&self) -> ParserLanguage {
        self.parser_language
    }

    pub fn parser_level(&self) -> ParserLevel {
        self.parser_level
    }

    /// Newline-separated terms that must never be annotated.
    pub fn false_positives(&self) -> Option<&[u8]> {
        self.false_positives.as_deref()
    }

    /// `GROUP\tNORMALIZED` lines applied to concept groups before writing.
    pub fn semantic_groups_normalization(&self) -> Option<&[u8]> {
        self.semantic_groups_normalization.as_deref()
    }

    pub fn abbreviations(&self) -> bool {
        self.abbreviations
    }

    pub fn disambiguation(&self) -> bool {
        self.disambiguation
    }
}

/// Builder for [`ContextConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct ContextConfigurationBuilder {
    inner: ContextConfiguration,
}

impl ContextConfigurationBuilder {
    pub fn with_input_format(mut self, format: InputFormat) -> Self {
        self.inner.input_format = format;
        self
    }

    pub fn with_output_formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.inner.output_formats = formats;
        self
    }

    pub fn with_parser_tool(mut self, tool: ParserTool) -> Self {
        self.inner.parser_tool = tool;
        self
    }

    pub fn with_parser_language(mut self, language: ParserLanguage) -> Self {
        self.inner.parser_language = language;
        self
    }

    pub fn with_parser_level(mut self, level: ParserLevel) -> Self {
        self.inner.parser_level = level;
        self
    }

    pub fn with_false_positives(mut self, data: Option<Vec<u8>>) -> Self {
        self.inner.false_positives = data;
        self
    }

    pub fn with_semantic_groups_normalization(mut self, data: Option<Vec<u8>>) -> Self {
        self.inner.semantic_groups_normalization = data;
        self
    }

    pub fn with_abbreviations(mut self, enabled: bool) -> Self {
        self.inner.abbreviations = enabled;
        self
    }

    pub fn with_disambiguation(mut self, enabled: bool) -> Self {
        self.inner.disambiguation = enabled;
        self
    }

    pub fn build(self) -> ContextConfiguration {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse_is_case_insensitive() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(" a1 ".parse::<OutputFormat>(), Ok(OutputFormat::A1));
        assert!("conll".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_to_builder_keeps_unchanged_fields() {
        let base = ContextConfiguration::builder()
            .with_output_formats(vec![OutputFormat::Json, OutputFormat::Xml])
            .with_parser_level(ParserLevel::Chunking)
            .with_abbreviations(true)
            .build();

        let derived = base.to_builder().with_disambiguation(true).build();

        assert_eq!(derived.output_formats(), base.output_formats());
        assert_eq!(derived.parser_level(), ParserLevel::Chunking);
        assert!(derived.abbreviations());
        assert!(derived.disambiguation());
        assert!(!base.disambiguation());
    }
}
