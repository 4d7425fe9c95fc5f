//! Corpus serializers, one per output format.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::context::OutputFormat;
use crate::corpus::{Annotation, Corpus};

/// Serialize `corpus` in `format` into `out`.
pub fn write_corpus(format: OutputFormat, corpus: &Corpus, out: &mut dyn Write) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json(corpus, out),
        OutputFormat::Xml => write_xml(corpus, out),
        OutputFormat::A1 => write_a1(corpus, out),
        OutputFormat::Pipe => write_pipe(corpus, out),
    }
}

fn write_json(corpus: &Corpus, out: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, corpus).map_err(io::Error::other)?;
    writeln!(out)
}

/// Inline XML: each sentence in `<s>`, each annotation in `<e id="...">`.
///
/// Annotations overlapping an earlier one in the same sentence are skipped.
fn write_xml(corpus: &Corpus, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, "<document>")?;

    for (i, sentence) in corpus.sentences.iter().enumerate() {
        let mut line = String::new();
        let mut cursor = sentence.start;
        for annotation in &sentence.annotations {
            if annotation.start < cursor || annotation.end > sentence.end {
                continue;
            }
            line.push_str(&escape_xml(&corpus.text[cursor..annotation.start]));
            line.push_str(&format!(
                r#"<e id="{}">{}</e>"#,
                escape_xml(&concept_ids(annotation, ",")),
                escape_xml(&annotation.text)
            ));
            cursor = annotation.end;
        }
        line.push_str(&escape_xml(&corpus.text[cursor..sentence.end]));
        writeln!(out, r#"<s id="{}">{}</s>"#, i, line)?;
    }

    writeln!(out, "</document>")
}

/// Brat standoff: one text-bound entry per annotation and group, with the
/// concept identifiers attached as annotator notes.
fn write_a1(corpus: &Corpus, out: &mut dyn Write) -> io::Result<()> {
    let mut term = 0;
    for annotation in corpus.annotations() {
        let mut by_group: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for concept in &annotation.concepts {
            by_group
                .entry(concept.group.as_str())
                .or_default()
                .push(concept.id.as_str());
        }

        for (group, ids) in by_group {
            term += 1;
            writeln!(
                out,
                "T{}\t{} {} {}\t{}",
                term, group, annotation.start, annotation.end, annotation.text
            )?;
            writeln!(out, "#{}\tAnnotatorNotes T{}\t{}", term, term, ids.join(","))?;
        }
    }
    Ok(())
}

/// One `ids|start end|text` line per annotation.
fn write_pipe(corpus: &Corpus, out: &mut dyn Write) -> io::Result<()> {
    for annotation in corpus.annotations() {
        writeln!(
            out,
            "{}|{} {}|{}",
            concept_ids(annotation, ","),
            annotation.start,
            annotation.end,
            annotation.text
        )?;
    }
    Ok(())
}

fn concept_ids(annotation: &Annotation, separator: &str) -> String {
    annotation
        .concepts
        .iter()
        .map(|c| c.id.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
