//! Post-processing applied to recognized annotations before they reach the corpus.
//!
//! Order matters: false positives, abbreviations, disambiguation, group
//! filter, then group normalization. See [`apply`].

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::context::ContextConfiguration;
use crate::corpus::{Annotation, Concept};
use crate::dictionary::normalize_name;

use super::recognizer::add_annotation;

static SHORT_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*([\p{L}][\p{L}\p{N}-]{1,9})\s*\)").unwrap());

/// Run every enabled step over the document's annotations.
pub fn apply(
    annotations: &mut Vec<Annotation>,
    text: &str,
    config: &ContextConfiguration,
    groups: Option<&HashMap<String, bool>>,
) {
    remove_false_positives(annotations, config.false_positives());
    if config.abbreviations() {
        resolve_abbreviations(annotations, text);
    }
    if config.disambiguation() {
        disambiguate(annotations);
    }
    if let Some(groups) = groups {
        filter_groups(annotations, groups);
    }
    if let Some(table) = config.semantic_groups_normalization() {
        normalize_groups(annotations, table);
    }
    annotations.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
}

/// Drop annotations whose text is listed in the false positives blob.
pub fn remove_false_positives(annotations: &mut Vec<Annotation>, blob: Option<&[u8]>) {
    let Some(blob) = blob else {
        return;
    };
    let terms: HashSet<String> = String::from_utf8_lossy(blob)
        .lines()
        .map(normalize_name)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return;
    }

    let before = annotations.len();
    annotations.retain(|a| !terms.contains(&normalize_name(&a.text)));
    tracing::debug!("Removed {} false positives", before - annotations.len());
}

/// Propagate concepts from a long form to its abbreviation.
///
/// For every `Long Form (LF)` where an annotation ends right before the
/// parenthesis and shares its first letter with `LF`, each whole-word
/// occurrence of `LF` in the text receives the long form's concepts.
pub fn resolve_abbreviations(annotations: &mut Vec<Annotation>, text: &str) {
    let mut definitions: Vec<(String, Vec<Concept>)> = Vec::new();

    for caps in SHORT_FORM.captures_iter(text) {
        let (Some(whole), Some(short)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let long_form = annotations
            .iter()
            .filter(|a| a.end <= whole.start() && text[a.end..whole.start()].trim().is_empty())
            .max_by_key(|a| a.len());
        let Some(long_form) = long_form else {
            continue;
        };

        let first_long = long_form.text.chars().next().map(|c| c.to_lowercase().to_string());
        let first_short = short.as_str().chars().next().map(|c| c.to_lowercase().to_string());
        if first_long != first_short {
            continue;
        }
        definitions.push((short.as_str().to_string(), long_form.concepts.clone()));
    }

    for (short, concepts) in definitions {
        let pattern = format!(r"\b{}\b", regex::escape(&short));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        for m in re.find_iter(text) {
            add_annotation(annotations, text, m.start(), m.end(), &concepts);
        }
    }
}

/// Drop annotations nested inside longer ones and keep one concept per group.
pub fn disambiguate(annotations: &mut Vec<Annotation>) {
    let snapshot = annotations.clone();
    annotations.retain(|a| !snapshot.iter().any(|other| a.is_nested_in(other)));

    for annotation in annotations.iter_mut() {
        let mut seen = HashSet::new();
        annotation.concepts.retain(|c| seen.insert(c.group.clone()));
    }
}

/// Keep only concepts whose group is enabled; drop annotations left empty.
pub fn filter_groups(annotations: &mut Vec<Annotation>, groups: &HashMap<String, bool>) {
    let enabled: HashSet<String> = groups
        .iter()
        .filter(|(_, on)| **on)
        .map(|(g, _)| g.to_uppercase())
        .collect();

    for annotation in annotations.iter_mut() {
        annotation
            .concepts
            .retain(|c| enabled.contains(&c.group.to_uppercase()));
    }
    annotations.retain(|a| !a.concepts.is_empty());
}

/// Rename concept groups using `GROUP\tNORMALIZED` lines. The id's group
/// field is rewritten too, so every output format sees the new name.
pub fn normalize_groups(annotations: &mut [Annotation], table: &[u8]) {
    let table = String::from_utf8_lossy(table);
    let renames: HashMap<&str, &str> = table
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(from, to)| (from.trim(), to.trim()))
        .filter(|(from, to)| !from.is_empty() && !to.is_empty())
        .collect();

    for annotation in annotations.iter_mut() {
        for concept in annotation.concepts.iter_mut() {
            if let Some(to) = renames.get(concept.group.as_str()) {
                concept.relabel(to);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(start: usize, end: usize, text: &str, ids: &[&str]) -> Annotation {
        Annotation {
            start,
            end,
            text: text.to_string(),
            concepts: ids.iter().map(|id| Concept::parse(id)).collect(),
        }
    }

    #[test]
    fn test_remove_false_positives_is_case_insensitive() {
        let mut anns = vec![ann(0, 4, "Cell", &["A:1::ANAT"]), ann(5, 10, "BRCA1", &["A:2::PRGE"])];
        remove_false_positives(&mut anns, Some(&b"cell\n"[..]));
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].text, "BRCA1");
    }

    #[test]
    fn test_resolve_abbreviations() {
        let text = "Chronic myeloid leukemia (CML) is rare. CML patients";
        let mut anns = vec![ann(0, 24, "Chronic myeloid leukemia", &["U:C1:T191:DISO"])];
        resolve_abbreviations(&mut anns, text);

        let abbreviations: Vec<&Annotation> = anns.iter().filter(|a| a.text == "CML").collect();
        assert_eq!(abbreviations.len(), 2);
        assert!(abbreviations
            .iter()
            .all(|a| a.concepts[0].id == "U:C1:T191:DISO"));
    }

    #[test]
    fn test_abbreviation_requires_matching_first_letter() {
        let text = "Chronic myeloid leukemia (XYZ) is rare.";
        let mut anns = vec![ann(0, 24, "Chronic myeloid leukemia", &["U:C1:T191:DISO"])];
        resolve_abbreviations(&mut anns, text);
        assert_eq!(anns.len(), 1);
    }

    #[test]
    fn test_disambiguate_drops_nested_and_duplicate_groups() {
        let mut anns = vec![
            ann(0, 13, "breast cancer", &["A:1::DISO", "A:2::DISO", "A:3::PRGE"]),
            ann(7, 13, "cancer", &["A:4::DISO"]),
        ];
        disambiguate(&mut anns);
        assert_eq!(anns.len(), 1);
        let ids: Vec<&str> = anns[0].concepts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["A:1::DISO", "A:3::PRGE"]);
    }

    #[test]
    fn test_filter_groups() {
        let mut anns = vec![
            ann(0, 5, "BRCA1", &["A:1::PRGE"]),
            ann(6, 12, "cancer", &["A:2::DISO", "A:3::PRGE"]),
            ann(13, 18, "liver", &["A:4::ANAT"]),
        ];
        let groups = HashMap::from([("PRGE".to_string(), true), ("ANAT".to_string(), false)]);
        filter_groups(&mut anns, &groups);

        assert_eq!(anns.len(), 2);
        assert_eq!(anns[1].concepts.len(), 1);
        assert_eq!(anns[1].concepts[0].id, "A:3::PRGE");
    }

    #[test]
    fn test_normalize_groups() {
        let mut anns = vec![ann(0, 5, "BRCA1", &["A:1::PRGE"])];
        normalize_groups(&mut anns, b"PRGE\tGENE\n");
        assert_eq!(anns[0].concepts[0].group, "GENE");
        assert_eq!(anns[0].concepts[0].id, "A:1::GENE");
    }

    #[test]
    fn test_apply_skips_normalization_when_absent() {
        let config = ContextConfiguration::builder().build();
        let mut anns = vec![ann(0, 5, "BRCA1", &["A:1::PRGE"])];
        apply(&mut anns, "BRCA1", &config, None);
        assert_eq!(anns[0].concepts[0].group, "PRGE");
    }
}
