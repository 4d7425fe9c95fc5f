//! Service-level processing data shared by every request.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Filtering and post-processing data owned by the running service.
///
/// Read-only to executors; they copy what they need into the per-run
/// [`ContextConfiguration`](crate::context::ContextConfiguration).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Terms that must never be annotated, one per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_positives: Option<String>,
    /// Semantic group renames applied when exporting (e.g. `PRGE` -> `GENE`).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub groups_normalization: HashMap<String, String>,
    /// Resolve abbreviations defined in the text (`Long Form (LF)`).
    #[serde(default)]
    pub abbreviations: bool,
    /// Drop nested annotations and keep one concept per group.
    #[serde(default)]
    pub disambiguation: bool,
}

impl ServiceConfig {
    pub fn false_positives_bytes(&self) -> Option<Vec<u8>> {
        self.false_positives.as_ref().map(|fp| fp.as_bytes().to_vec())
    }

    /// Normalization table as `GROUP\tNORMALIZED` lines, sorted by group.
    pub fn groups_normalization_bytes(&self) -> Vec<u8> {
        let sorted: BTreeMap<_, _> = self.groups_normalization.iter().collect();
        let mut out = String::new();
        for (group, normalized) in sorted {
            out.push_str(group);
            out.push('\t');
            out.push_str(normalized);
            out.push('\n');
        }
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_normalization_bytes_are_sorted() {
        let service = ServiceConfig {
            groups_normalization: HashMap::from([
                ("PRGE".to_string(), "GENE".to_string()),
                ("DISO".to_string(), "DISEASE".to_string()),
            ]),
            ..Default::default()
        };
        assert_eq!(
            service.groups_normalization_bytes(),
            b"DISO\tDISEASE\nPRGE\tGENE\n".to_vec()
        );
    }

    #[test]
    fn test_false_positives_bytes() {
        let service = ServiceConfig {
            false_positives: Some("the\nof\n".to_string()),
            ..Default::default()
        };
        assert_eq!(service.false_positives_bytes(), Some(b"the\nof\n".to_vec()));
        assert_eq!(ServiceConfig::default().false_positives_bytes(), None);
    }
}
