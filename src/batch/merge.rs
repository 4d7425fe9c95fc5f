//! Merging service data and request overrides into a run configuration.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::context::ContextConfiguration;

use super::BatchRequest;

/// Extra parameter selecting the XML elements to annotate.
pub const XML_TAGS_PARAM: &str = "xmltags";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// An empty tag name before the last one, or no tag name at all.
    #[error("Invalid xmltags value {0:?}: tag names must not be empty")]
    InvalidXmlTags(String),
}

/// Typed view of the request's extra parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraOptions {
    pub xml_tags: Option<Vec<String>>,
}

impl ExtraOptions {
    /// Parse recognized keys; unknown keys are ignored.
    pub fn parse(params: &HashMap<String, String>) -> Result<Self, MergeError> {
        let mut options = Self::default();
        for (key, value) in params {
            match key.as_str() {
                XML_TAGS_PARAM => options.xml_tags = Some(parse_xml_tags(value)?),
                other => tracing::debug!("Ignoring unknown extra parameter {}", other),
            }
        }
        Ok(options)
    }
}

/// Comma-separated tag names. Trailing empty entries are dropped; an empty
/// entry anywhere else, or no tag at all, is an error.
fn parse_xml_tags(value: &str) -> Result<Vec<String>, MergeError> {
    let mut tags: Vec<String> = value
        .trim()
        .split(',')
        .map(|tag| tag.trim().to_string())
        .collect();
    while tags.last().is_some_and(|tag| tag.is_empty()) {
        tags.pop();
    }
    if tags.is_empty() || tags.iter().any(|tag| tag.is_empty()) {
        return Err(MergeError::InvalidXmlTags(value.to_string()));
    }
    Ok(tags)
}

/// Result of a merge: the frozen run configuration and parsed options.
#[derive(Debug, Clone)]
pub struct MergedConfiguration {
    pub configuration: Arc<ContextConfiguration>,
    pub options: ExtraOptions,
}

/// Build the configuration for one run. `base` is left untouched.
///
/// False positives, abbreviations and disambiguation always come from the
/// service. Group normalization is only carried when an output format was
/// requested and the service has a table. A different input format rebuilds
/// the configuration from defaults, keeping the output formats and parser
/// settings of `base`.
pub fn merge_configuration(
    service: &ServiceConfig,
    request: &BatchRequest,
    base: &ContextConfiguration,
) -> Result<MergedConfiguration, MergeError> {
    let normalization = match request.output_format {
        Some(_) if !service.groups_normalization.is_empty() => {
            Some(service.groups_normalization_bytes())
        }
        _ => None,
    };

    let builder = if base.input_format() != request.input_format {
        tracing::debug!(
            "Rebuilding configuration for {:?} input (was {:?})",
            request.input_format,
            base.input_format()
        );
        ContextConfiguration::builder()
            .with_input_format(request.input_format)
            .with_output_formats(base.output_formats().to_vec())
            .with_parser_tool(base.parser_tool())
            .with_parser_language(base.parser_language())
            .with_parser_level(base.parser_level())
    } else {
        base.to_builder()
    };

    let configuration = builder
        .with_false_positives(service.false_positives_bytes())
        .with_semantic_groups_normalization(normalization)
        .with_abbreviations(service.abbreviations)
        .with_disambiguation(service.disambiguation)
        .build();

    let options = ExtraOptions::parse(&request.extra_parameters)?;

    Ok(MergedConfiguration {
        configuration: Arc::new(configuration),
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InputFormat, OutputFormat, ParserLanguage, ParserLevel, ParserTool};

    fn service() -> ServiceConfig {
        ServiceConfig {
            false_positives: Some("cell\n".to_string()),
            groups_normalization: HashMap::from([("PRGE".to_string(), "GENE".to_string())]),
            abbreviations: true,
            disambiguation: true,
        }
    }

    fn base() -> ContextConfiguration {
        ContextConfiguration::builder()
            .with_output_formats(vec![OutputFormat::Json, OutputFormat::Xml])
            .with_parser_tool(ParserTool::OpenNlp)
            .with_parser_language(ParserLanguage::Spanish)
            .with_parser_level(ParserLevel::Chunking)
            .build()
    }

    #[test]
    fn test_normalization_only_when_exporting() {
        let annotate = BatchRequest::new("x");
        let merged = merge_configuration(&service(), &annotate, &base()).unwrap();
        assert_eq!(merged.configuration.semantic_groups_normalization(), None);

        let export = BatchRequest::new("x").with_output_format(OutputFormat::Json);
        let merged = merge_configuration(&service(), &export, &base()).unwrap();
        assert_eq!(
            merged.configuration.semantic_groups_normalization(),
            Some(&b"PRGE\tGENE\n"[..])
        );
    }

    #[test]
    fn test_empty_normalization_table_is_cleared() {
        let service = ServiceConfig::default();
        let base = base()
            .to_builder()
            .with_semantic_groups_normalization(Some(b"OLD\tNEW\n".to_vec()))
            .build();
        let export = BatchRequest::new("x").with_output_format(OutputFormat::Json);
        let merged = merge_configuration(&service, &export, &base).unwrap();
        assert_eq!(merged.configuration.semantic_groups_normalization(), None);
    }

    #[test]
    fn test_service_data_is_copied() {
        let merged = merge_configuration(&service(), &BatchRequest::new("x"), &base()).unwrap();
        let config = &merged.configuration;
        assert_eq!(config.false_positives(), Some(&b"cell\n"[..]));
        assert!(config.abbreviations());
        assert!(config.disambiguation());

        let cleared = merge_configuration(
            &ServiceConfig::default(),
            &BatchRequest::new("x"),
            config,
        )
        .unwrap();
        assert_eq!(cleared.configuration.false_positives(), None);
        assert!(!cleared.configuration.abbreviations());
    }

    #[test]
    fn test_input_format_change_preserves_formats_and_parser() {
        let request = BatchRequest::new("<p>x</p>")
            .with_input_format(InputFormat::Xml)
            .with_output_format(OutputFormat::Json);
        let base = base();
        let merged = merge_configuration(&service(), &request, &base).unwrap();
        let config = &merged.configuration;

        assert_eq!(config.input_format(), InputFormat::Xml);
        assert_eq!(config.output_formats(), base.output_formats());
        assert_eq!(config.parser_tool(), ParserTool::OpenNlp);
        assert_eq!(config.parser_language(), ParserLanguage::Spanish);
        assert_eq!(config.parser_level(), ParserLevel::Chunking);
        // Service data survives the rebuild.
        assert!(config.false_positives().is_some());
        assert!(config.semantic_groups_normalization().is_some());
        // The base is never modified.
        assert_eq!(base.input_format(), InputFormat::Raw);
    }

    #[test]
    fn test_xml_tags_are_trimmed_in_order() {
        let request = BatchRequest::new("x").with_extra_parameter("xmltags", " PER, LOC ,ORG ");
        let merged = merge_configuration(&service(), &request, &base()).unwrap();
        assert_eq!(
            merged.options.xml_tags,
            Some(vec!["PER".to_string(), "LOC".to_string(), "ORG".to_string()])
        );
    }

    #[test]
    fn test_plain_xml_tags() {
        let request = BatchRequest::new("x").with_extra_parameter("xmltags", "PER,LOC,ORG");
        let options = ExtraOptions::parse(&request.extra_parameters).unwrap();
        assert_eq!(options.xml_tags.unwrap(), vec!["PER", "LOC", "ORG"]);
    }

    #[test]
    fn test_trailing_xml_tag_separator_is_ignored() {
        let request = BatchRequest::new("x").with_extra_parameter("xmltags", "PER,LOC,");
        let merged = merge_configuration(&service(), &request, &base()).unwrap();
        assert_eq!(merged.options.xml_tags.unwrap(), vec!["PER", "LOC"]);
    }

    #[test]
    fn test_xml_tags_without_any_name_are_rejected() {
        for value in [",", " , ", ""] {
            let request = BatchRequest::new("x").with_extra_parameter("xmltags", value);
            assert!(ExtraOptions::parse(&request.extra_parameters).is_err(), "{value:?}");
        }
    }

    #[test]
    fn test_empty_xml_tag_is_rejected() {
        let request = BatchRequest::new("x").with_extra_parameter("xmltags", "PER,,ORG");
        let err = merge_configuration(&service(), &request, &base()).unwrap_err();
        assert_eq!(err, MergeError::InvalidXmlTags("PER,,ORG".to_string()));
    }

    #[test]
    fn test_unknown_parameters_are_ignored() {
        let request = BatchRequest::new("x").with_extra_parameter("colour", "blue");
        let merged = merge_configuration(&service(), &request, &base()).unwrap();
        assert_eq!(merged.options, ExtraOptions::default());
    }
}
