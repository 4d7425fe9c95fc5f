//! Concept recognition over sentence spans.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::corpus::{Annotation, Concept};
use crate::dictionary::{normalize_name, Dictionaries};

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+(?:[-'][\p{L}\p{N}]+)*").unwrap());

/// Matching strategy bound into a job.
#[derive(Debug, Clone)]
pub enum Recognizer {
    /// Case-insensitive longest match against exact dictionaries.
    Dictionary(Arc<Dictionaries>),
    /// Every match of every regex dictionary pattern.
    Regex(Arc<Dictionaries>),
}

impl Recognizer {
    /// Recognize concepts in `text[start..end]`; offsets in the result are
    /// relative to `text`. Sorted by start, longest first.
    pub fn recognize(&self, text: &str, start: usize, end: usize) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        match self {
            Recognizer::Dictionary(dictionaries) => {
                recognize_exact(dictionaries, text, start, end, &mut annotations)
            }
            Recognizer::Regex(dictionaries) => {
                recognize_regex(dictionaries, text, start, end, &mut annotations)
            }
        }
        annotations.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        annotations
    }
}

fn recognize_exact(
    dictionaries: &Dictionaries,
    text: &str,
    start: usize,
    end: usize,
    out: &mut Vec<Annotation>,
) {
    let tokens: Vec<(usize, usize)> = WORD
        .find_iter(&text[start..end])
        .map(|m| (start + m.start(), start + m.end()))
        .collect();

    for dictionary in &dictionaries.exact {
        let mut i = 0;
        while i < tokens.len() {
            let longest = dictionary.max_words().min(tokens.len() - i);
            let mut matched = 0;
            for n in (1..=longest).rev() {
                let (s, _) = tokens[i];
                let (_, e) = tokens[i + n - 1];
                if let Some(ids) = dictionary.lookup(&normalize_name(&text[s..e])) {
                    let concepts: Vec<Concept> = ids.iter().map(|id| Concept::parse(id)).collect();
                    add_annotation(out, text, s, e, &concepts);
                    matched = n;
                    break;
                }
            }
            i += matched.max(1);
        }
    }
}

fn recognize_regex(
    dictionaries: &Dictionaries,
    text: &str,
    start: usize,
    end: usize,
    out: &mut Vec<Annotation>,
) {
    let sentence = &text[start..end];
    for dictionary in &dictionaries.regex {
        for (pattern, concept_id) in dictionary.patterns() {
            let concept = [Concept::parse(concept_id)];
            for m in pattern.find_iter(sentence) {
                if m.start() == m.end() {
                    continue;
                }
                add_annotation(out, text, start + m.start(), start + m.end(), &concept);
            }
        }
    }
}

/// Insert a span, merging concepts into an existing annotation of the same span.
pub(crate) fn add_annotation(
    out: &mut Vec<Annotation>,
    text: &str,
    start: usize,
    end: usize,
    concepts: &[Concept],
) {
    if let Some(existing) = out.iter_mut().find(|a| a.start == start && a.end == end) {
        existing.merge_concepts(concepts);
        return;
    }
    let mut annotation = Annotation {
        start,
        end,
        text: text[start..end].to_string(),
        concepts: Vec::new(),
    };
    annotation.merge_concepts(concepts);
    out.push(annotation);
}
