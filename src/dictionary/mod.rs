//! Dictionary loading.
//!
//! Two kinds of dictionaries are supported, selected by file extension:
//!
//! - `.tsv` exact dictionaries: `CONCEPT_ID<TAB>name|synonym|...`
//! - `.rgx` regex dictionaries: `CONCEPT_ID<TAB>pattern`
//!
//! Lines starting with `#` and blank lines are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Failed to read dictionary {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: expected CONCEPT_ID<TAB>VALUE", .path.display())]
    InvalidLine { path: PathBuf, line: usize },
    #[error("{}:{line}: invalid pattern: {source}", .path.display())]
    Regex {
        path: PathBuf,
        line: usize,
        #[source]
        source: regex::Error,
    },
    #[error("Unsupported dictionary file: {}", .0.display())]
    UnsupportedFile(PathBuf),
}

/// Collapse whitespace and lowercase, the form names are matched in.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact-match dictionary keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    name: String,
    entries: HashMap<String, Vec<String>>,
    max_words: usize,
}

impl Dictionary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, concept_id: &str, name: &str) {
        let key = normalize_name(name);
        if key.is_empty() {
            return;
        }
        self.max_words = self.max_words.max(key.split(' ').count());
        let ids = self.entries.entry(key).or_default();
        if !ids.iter().any(|id| id == concept_id) {
            ids.push(concept_id.to_string());
        }
    }

    /// Concept IDs for an already-normalized name.
    pub fn lookup(&self, normalized: &str) -> Option<&[String]> {
        self.entries.get(normalized).map(|v| v.as_slice())
    }

    /// Longest entry, in words.
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parse(name: &str, contents: &str, path: &Path) -> Result<Self, DictionaryError> {
        let mut dictionary = Self::new(name);
        for (_, concept_id, value) in entries(contents, path)? {
            for synonym in value.split('|') {
                dictionary.insert(concept_id, synonym);
            }
        }
        Ok(dictionary)
    }
}

/// Dictionary of regular expressions.
#[derive(Debug, Clone, Default)]
pub struct RegexDictionary {
    name: String,
    patterns: Vec<(Regex, String)>,
}

impl RegexDictionary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, pattern: Regex, concept_id: impl Into<String>) {
        self.patterns.push((pattern, concept_id.into()));
    }

    pub fn patterns(&self) -> &[(Regex, String)] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn parse(name: &str, contents: &str, path: &Path) -> Result<Self, DictionaryError> {
        let mut dictionary = Self::new(name);
        for (line, concept_id, value) in entries(contents, path)? {
            let pattern = Regex::new(value).map_err(|source| DictionaryError::Regex {
                path: path.to_path_buf(),
                line,
                source,
            })?;
            dictionary.push(pattern, concept_id);
        }
        Ok(dictionary)
    }
}

/// Split dictionary contents into `(line_number, concept_id, value)` triples.
fn entries<'a>(
    contents: &'a str,
    path: &Path,
) -> Result<Vec<(usize, &'a str, &'a str)>, DictionaryError> {
    let mut out = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.split_once('\t') {
            Some((id, value)) if !id.trim().is_empty() && !value.trim().is_empty() => {
                out.push((idx + 1, id.trim(), value.trim()));
            }
            _ => {
                return Err(DictionaryError::InvalidLine {
                    path: path.to_path_buf(),
                    line: idx + 1,
                })
            }
        }
    }
    Ok(out)
}

/// All dictionaries available to jobs.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    pub exact: Vec<Dictionary>,
    pub regex: Vec<RegexDictionary>,
}

impl Dictionaries {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.regex.is_empty()
    }

    /// Load every file in `paths`. Directories are scanned (non-recursively)
    /// for `.tsv` and `.rgx` files.
    pub fn load(paths: &[PathBuf]) -> Result<Self, DictionaryError> {
        let mut dictionaries = Self::default();
        for path in paths {
            if path.is_dir() {
                let read_dir = std::fs::read_dir(path).map_err(|source| DictionaryError::Io {
                    path: path.clone(),
                    source,
                })?;
                let mut files: Vec<PathBuf> = read_dir
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| {
                        p.extension()
                            .is_some_and(|ext| ext == "tsv" || ext == "rgx")
                    })
                    .collect();
                files.sort();
                for file in files {
                    dictionaries.load_file(&file)?;
                }
            } else {
                dictionaries.load_file(path)?;
            }
        }
        tracing::debug!(
            "Loaded {} exact and {} regex dictionaries",
            dictionaries.exact.len(),
            dictionaries.regex.len()
        );
        Ok(dictionaries)
    }

    fn load_file(&mut self, path: &Path) -> Result<(), DictionaryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dictionary");

        match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") => self.exact.push(Dictionary::parse(name, &contents, path)?),
            Some("rgx") => self.regex.push(RegexDictionary::parse(name, &contents, path)?),
            _ => return Err(DictionaryError::UnsupportedFile(path.to_path_buf())),
        }
        Ok(())
    }
}
