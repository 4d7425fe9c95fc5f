//! Result set produced for one document.

use serde::{Deserialize, Serialize};

/// A concept identifier such as `UMLS:C0011849:T047:DISO`.
///
/// The last colon-separated field is the semantic group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub group: String,
}

impl Concept {
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        let group = id.rsplit(':').next().unwrap_or(id).to_string();
        Self {
            id: id.to_string(),
            group,
        }
    }

    /// Move the concept to `group`, rewriting the group field of the id.
    pub fn relabel(&mut self, group: &str) {
        self.id = match self.id.rsplit_once(':') {
            Some((prefix, _)) => format!("{}:{}", prefix, group),
            None => group.to_string(),
        };
        self.group = group.to_string();
    }
}

/// A recognized span. Offsets are byte offsets into [`Corpus::text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub concepts: Vec<Concept>,
}

impl Annotation {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `self` lies inside `other` without being the same span.
    pub fn is_nested_in(&self, other: &Annotation) -> bool {
        other.start <= self.start && self.end <= other.end && self.len() < other.len()
    }

    /// Add concepts not already present, keeping insertion order.
    pub fn merge_concepts<'a>(&mut self, concepts: impl IntoIterator<Item = &'a Concept>) {
        for concept in concepts {
            if !self.concepts.contains(concept) {
                self.concepts.push(concept.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub start: usize,
    pub end: usize,
    pub annotations: Vec<Annotation>,
}

/// Structured annotation output for a single document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    /// Text the offsets refer to (markup already removed for XML input).
    pub text: String,
    pub sentences: Vec<Sentence>,
}

impl Corpus {
    pub fn annotation_count(&self) -> usize {
        self.sentences.iter().map(|s| s.annotations.len()).sum()
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.sentences.iter().flat_map(|s| s.annotations.iter())
    }

    pub fn sentence_text(&self, sentence: &Sentence) -> &str {
        &self.text[sentence.start..sentence.end]
    }
}
