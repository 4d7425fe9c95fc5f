//! Input readers and sentence splitting.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::InputFormat;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s+|\n+").unwrap());

/// Passage element read from BioC documents when no tags are given.
const BIOC_PASSAGE_TAG: &str = "text";

/// Extract the text to annotate from a document.
///
/// Raw input is returned unchanged. For XML, the text inside the selected
/// elements (or every element when none are selected) is returned, one
/// region per line with markup removed and entities decoded.
pub fn extract_text(input: &str, format: InputFormat, xml_tags: Option<&[String]>) -> String {
    match format {
        InputFormat::Raw => input.to_string(),
        InputFormat::Xml => match xml_tags {
            Some(tags) => select_regions(input, tags),
            None => strip_markup(input),
        },
        InputFormat::Bioc => match xml_tags {
            Some(tags) => select_regions(input, tags),
            None => select_regions(input, &[BIOC_PASSAGE_TAG.to_string()]),
        },
    }
}

/// Text of every element, markup removed, one non-empty segment per line.
fn strip_markup(xml: &str) -> String {
    MARKUP
        .split(xml)
        .map(|segment| decode_entities(segment.trim()))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of the given elements in document order.
fn select_regions(xml: &str, tags: &[String]) -> String {
    let mut regions: Vec<(usize, String)> = Vec::new();

    for tag in tags {
        let pattern = format!(
            r"(?s)<{tag}(?:\s[^>]*)?>(.*?)</{tag}\s*>",
            tag = regex::escape(tag)
        );
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!("Skipping XML tag {}: {}", tag, e);
                continue;
            }
        };
        for caps in re.captures_iter(xml) {
            if let Some(inner) = caps.get(1) {
                let text = strip_markup(inner.as_str());
                if !text.is_empty() {
                    regions.push((inner.start(), text));
                }
            }
        }
    }

    regions.sort_by_key(|(start, _)| *start);
    regions
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Split text into sentence spans (byte offsets, surrounding whitespace trimmed).
pub fn split_sentences(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        let end = boundary.start() + boundary.as_str().trim_end().len();
        push_trimmed(text, start, end, &mut spans);
        start = boundary.end();
    }
    push_trimmed(text, start, text.len(), &mut spans);

    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    if start >= end {
        return;
    }
    let slice = &text[start..end];
    let s = start + (slice.len() - slice.trim_start().len());
    let e = start + slice.trim_end().len();
    if s < e {
        spans.push((s, e));
    }
}
