//! Built-in annotation job.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

use crate::batch::OutputSink;
use crate::context::ContextConfiguration;
use crate::corpus::{Corpus, Sentence};

use super::recognizer::Recognizer;
use super::{postprocess, reader, writers, Job, JobError, JobParams};

/// Reads one document, annotates it sentence by sentence, stores the result
/// in the shared corpus and writes every declared output format.
pub struct AnnotationJob {
    label: String,
    recognizer: Recognizer,
    config: Arc<ContextConfiguration>,
    input: Box<dyn Read + Send>,
    sinks: Vec<OutputSink>,
    corpus: Arc<Mutex<Corpus>>,
    groups: Option<HashMap<String, bool>>,
    xml_tags: Option<Vec<String>>,
}

impl AnnotationJob {
    pub(crate) fn new(
        recognizer: Recognizer,
        params: JobParams,
        xml_tags: Option<Vec<String>>,
    ) -> Self {
        let groups = params.filter_groups.then_some(params.groups);
        Self {
            label: format!("job-{}", uuid::Uuid::new_v4()),
            recognizer,
            config: params.config,
            input: params.input,
            sinks: params.sinks,
            corpus: params.corpus,
            groups,
            xml_tags,
        }
    }

    fn annotate(&self, document: &str) -> Corpus {
        let text = reader::extract_text(
            document,
            self.config.input_format(),
            self.xml_tags.as_deref(),
        );

        let spans = reader::split_sentences(&text);
        let mut annotations = Vec::new();
        for &(start, end) in &spans {
            annotations.extend(self.recognizer.recognize(&text, start, end));
        }
        postprocess::apply(&mut annotations, &text, &self.config, self.groups.as_ref());

        let mut sentences: Vec<Sentence> = spans
            .iter()
            .map(|&(start, end)| Sentence {
                start,
                end,
                annotations: Vec::new(),
            })
            .collect();
        for annotation in annotations {
            if let Some(sentence) = sentences
                .iter_mut()
                .find(|s| s.start <= annotation.start && annotation.end <= s.end)
            {
                sentence.annotations.push(annotation);
            }
        }

        Corpus { text, sentences }
    }
}

impl Job for AnnotationJob {
    fn label(&self) -> &str {
        &self.label
    }

    fn process(mut self: Box<Self>) -> Result<(), JobError> {
        let mut document = String::new();
        self.input
            .read_to_string(&mut document)
            .map_err(JobError::Input)?;

        let corpus = self.annotate(&document);
        tracing::debug!(
            "{}: {} sentences, {} annotations",
            self.label,
            corpus.sentences.len(),
            corpus.annotation_count()
        );

        for (format, sink) in self.config.output_formats().iter().zip(self.sinks.iter_mut()) {
            writers::write_corpus(*format, &corpus, sink)
                .map_err(|source| JobError::Output {
                    format: *format,
                    source,
                })?;
        }

        let mut shared = self.corpus.lock().map_err(|_| JobError::CorpusPoisoned)?;
        *shared = corpus;
        Ok(())
    }
}
