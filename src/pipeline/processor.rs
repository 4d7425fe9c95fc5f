//! Processor registry.
//!
//! Every [`ProcessorKind`] maps to a static [`ProcessorConstructor`] with a
//! plain and an XML-tag-aware variant. Construction validates its inputs and
//! never starts work.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::InputFormat;

use super::job::AnnotationJob;
use super::recognizer::Recognizer;
use super::{Job, JobError, JobParams};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    /// Exact dictionary matching.
    #[default]
    Dictionary,
    /// Regex dictionary matching.
    Regex,
}

impl ProcessorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::Dictionary => "dictionary",
            ProcessorKind::Regex => "regex",
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ConstructFn = fn(JobParams) -> Result<Box<dyn Job>, JobError>;
pub type ConstructWithTagsFn = fn(JobParams, Vec<String>) -> Result<Box<dyn Job>, JobError>;

/// Constructor pair for one processor kind.
#[derive(Clone, Copy)]
pub struct ProcessorConstructor {
    pub new: ConstructFn,
    pub with_xml_tags: ConstructWithTagsFn,
}

pub static PROCESSORS: &[(ProcessorKind, ProcessorConstructor)] = &[
    (
        ProcessorKind::Dictionary,
        ProcessorConstructor {
            new: dictionary_job,
            with_xml_tags: dictionary_job_with_tags,
        },
    ),
    (
        ProcessorKind::Regex,
        ProcessorConstructor {
            new: regex_job,
            with_xml_tags: regex_job_with_tags,
        },
    ),
];

impl ProcessorKind {
    pub fn constructor(&self) -> &'static ProcessorConstructor {
        match self {
            ProcessorKind::Dictionary => &PROCESSORS[0].1,
            ProcessorKind::Regex => &PROCESSORS[1].1,
        }
    }
}

/// Build a job for `kind`, choosing the XML-tag variant when tags are given.
pub fn new_processor(
    kind: ProcessorKind,
    params: JobParams,
    xml_tags: Option<Vec<String>>,
) -> Result<Box<dyn Job>, JobError> {
    let constructor = kind.constructor();
    match xml_tags {
        Some(tags) => (constructor.with_xml_tags)(params, tags),
        None => (constructor.new)(params),
    }
}

fn dictionary_job(params: JobParams) -> Result<Box<dyn Job>, JobError> {
    build(ProcessorKind::Dictionary, params, None)
}

fn dictionary_job_with_tags(params: JobParams, tags: Vec<String>) -> Result<Box<dyn Job>, JobError> {
    build(ProcessorKind::Dictionary, params, Some(tags))
}

fn regex_job(params: JobParams) -> Result<Box<dyn Job>, JobError> {
    build(ProcessorKind::Regex, params, None)
}

fn regex_job_with_tags(params: JobParams, tags: Vec<String>) -> Result<Box<dyn Job>, JobError> {
    build(ProcessorKind::Regex, params, Some(tags))
}

fn build(
    kind: ProcessorKind,
    params: JobParams,
    xml_tags: Option<Vec<String>>,
) -> Result<Box<dyn Job>, JobError> {
    let recognizer = match kind {
        ProcessorKind::Dictionary if params.dictionaries.exact.is_empty() => {
            return Err(JobError::NoDictionaries("exact"));
        }
        ProcessorKind::Regex
            if params
                .dictionaries
                .regex
                .iter()
                .all(|d| d.patterns().is_empty()) =>
        {
            return Err(JobError::NoDictionaries("regex"));
        }
        ProcessorKind::Dictionary => Recognizer::Dictionary(params.dictionaries.clone()),
        ProcessorKind::Regex => Recognizer::Regex(params.dictionaries.clone()),
    };

    let input_format = params.config.input_format();
    if xml_tags.is_some() && input_format == InputFormat::Raw {
        return Err(JobError::XmlTagsWithoutXml(input_format));
    }

    let formats = params.config.output_formats().len();
    if params.sinks.len() != formats {
        return Err(JobError::SinkMismatch {
            sinks: params.sinks.len(),
            formats,
        });
    }

    let job = AnnotationJob::new(recognizer, params, xml_tags);
    tracing::debug!("Built {} processor {}", kind, job.label());
    Ok(Box::new(job))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use regex::Regex;

    use super::*;
    use crate::batch::OutputSinks;
    use crate::config::ServiceConfig;
    use crate::context::{ContextConfiguration, OutputFormat};
    use crate::corpus::Corpus;
    use crate::dictionary::{Dictionaries, Dictionary, RegexDictionary};

    fn dictionaries() -> Arc<Dictionaries> {
        let mut genes = Dictionary::new("genes");
        genes.insert("U:C1:T028:PRGE", "BRCA1");
        let mut variants = RegexDictionary::new("variants");
        variants.push(Regex::new(r"rs[0-9]+").unwrap(), "L:RS::MUTN");
        Arc::new(Dictionaries {
            exact: vec![genes],
            regex: vec![variants],
        })
    }

    fn params(
        config: ContextConfiguration,
        dictionaries: Arc<Dictionaries>,
        text: &str,
    ) -> (JobParams, OutputSinks, Arc<Mutex<Corpus>>) {
        let sinks = OutputSinks::allocate(config.output_formats());
        let corpus = Arc::new(Mutex::new(Corpus::default()));
        let params = JobParams {
            config: Arc::new(config),
            input: Box::new(Cursor::new(text.as_bytes().to_vec())),
            sinks: sinks.ordered().to_vec(),
            service: Arc::new(ServiceConfig::default()),
            dictionaries,
            corpus: corpus.clone(),
            groups: HashMap::new(),
            filter_groups: false,
        };
        (params, sinks, corpus)
    }

    #[test]
    fn test_registry_covers_every_kind() {
        for kind in [ProcessorKind::Dictionary, ProcessorKind::Regex] {
            assert!(PROCESSORS.iter().any(|(k, _)| *k == kind));
            let (registered, _) = PROCESSORS
                .iter()
                .find(|(_, c)| std::ptr::eq(c, kind.constructor()))
                .unwrap();
            assert_eq!(*registered, kind);
        }
    }

    #[test]
    fn test_dictionary_job_fills_corpus_and_sinks() {
        let config = ContextConfiguration::builder()
            .with_output_formats(vec![OutputFormat::Pipe, OutputFormat::A1])
            .build();
        let (params, sinks, corpus) = params(config, dictionaries(), "BRCA1 is a gene.");

        let job = new_processor(ProcessorKind::Dictionary, params, None).unwrap();
        job.process().unwrap();

        assert_eq!(corpus.lock().unwrap().annotation_count(), 1);
        let pipe = sinks.get(OutputFormat::Pipe).unwrap().to_text();
        assert_eq!(pipe, "U:C1:T028:PRGE|0 5|BRCA1\n");
        let a1 = sinks.get(OutputFormat::A1).unwrap().to_text();
        assert!(a1.starts_with("T1\tPRGE 0 5\tBRCA1\n"));
    }

    #[test]
    fn test_job_writes_every_declared_format() {
        let config = ContextConfiguration::builder()
            .with_output_formats(vec![
                OutputFormat::Json,
                OutputFormat::Xml,
                OutputFormat::A1,
                OutputFormat::Pipe,
            ])
            .build();
        let (params, sinks, _) = params(config, dictionaries(), "BRCA1 is a gene.");

        new_processor(ProcessorKind::Dictionary, params, None)
            .unwrap()
            .process()
            .unwrap();

        assert_eq!(sinks.len(), 4);
        for sink in sinks.ordered() {
            assert!(!sink.is_empty(), "{} sink was not written", sink.format());
        }
        assert!(sinks.get(OutputFormat::Xml).unwrap().to_text().contains("<document>"));
    }

    #[test]
    fn test_group_normalization_reaches_pipe_and_xml() {
        let config = ContextConfiguration::builder()
            .with_output_formats(vec![OutputFormat::Pipe, OutputFormat::Xml])
            .with_semantic_groups_normalization(Some(b"PRGE\tGENE\n".to_vec()))
            .build();
        let (params, sinks, _) = params(config, dictionaries(), "BRCA1 is a gene.");

        new_processor(ProcessorKind::Dictionary, params, None)
            .unwrap()
            .process()
            .unwrap();

        assert_eq!(
            sinks.get(OutputFormat::Pipe).unwrap().to_text(),
            "U:C1:T028:GENE|0 5|BRCA1\n"
        );
        let xml = sinks.get(OutputFormat::Xml).unwrap().to_text();
        assert!(xml.contains(r#"<e id="U:C1:T028:GENE">BRCA1</e>"#));
        assert!(!xml.contains("PRGE"));
    }

    #[test]
    fn test_regex_job() {
        let config = ContextConfiguration::builder()
            .with_output_formats(vec![OutputFormat::Pipe])
            .build();
        let (params, sinks, _) = params(config, dictionaries(), "Variant rs334 found.");

        new_processor(ProcessorKind::Regex, params, None)
            .unwrap()
            .process()
            .unwrap();
        assert_eq!(
            sinks.get(OutputFormat::Pipe).unwrap().to_text(),
            "L:RS::MUTN|8 13|rs334\n"
        );
    }

    #[test]
    fn test_missing_dictionaries_fail_construction() {
        let config = ContextConfiguration::builder().build();
        let (params, _, _) = params(config, Arc::new(Dictionaries::default()), "x");
        let err = new_processor(ProcessorKind::Regex, params, None).err().unwrap();
        assert!(matches!(err, JobError::NoDictionaries("regex")));
    }

    #[test]
    fn test_xml_tags_require_xml_input() {
        let config = ContextConfiguration::builder().build();
        let (params, _, _) = params(config, dictionaries(), "x");
        let err = new_processor(ProcessorKind::Dictionary, params, Some(vec!["p".into()]))
            .err()
            .unwrap();
        assert!(matches!(err, JobError::XmlTagsWithoutXml(InputFormat::Raw)));
    }

    #[test]
    fn test_xml_tags_select_regions() {
        let config = ContextConfiguration::builder()
            .with_input_format(InputFormat::Xml)
            .with_output_formats(vec![OutputFormat::Pipe])
            .build();
        let xml = "<doc><skip>BRCA1</skip><p>The BRCA1 gene</p></doc>";
        let (params, sinks, corpus) = params(config, dictionaries(), xml);

        new_processor(ProcessorKind::Dictionary, params, Some(vec!["p".into()]))
            .unwrap()
            .process()
            .unwrap();
        assert_eq!(corpus.lock().unwrap().text, "The BRCA1 gene");
        assert_eq!(
            sinks.get(OutputFormat::Pipe).unwrap().to_text(),
            "U:C1:T028:PRGE|4 9|BRCA1\n"
        );
    }

    #[test]
    fn test_sink_count_must_match_formats() {
        let config = ContextConfiguration::builder()
            .with_output_formats(vec![OutputFormat::Json, OutputFormat::Xml])
            .build();
        let (mut params, _, _) = params(config, dictionaries(), "x");
        params.sinks.pop();
        let err = new_processor(ProcessorKind::Dictionary, params, None)
            .err()
            .unwrap();
        assert!(matches!(err, JobError::SinkMismatch { sinks: 1, formats: 2 }));
    }
}
