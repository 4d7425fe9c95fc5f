//! Annotate and export commands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use console::style;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchExecutor, BatchRequest};
use crate::config::Settings;
use crate::context::{Context, InputFormat, OutputFormat};
use crate::dictionary::Dictionaries;
use crate::pipeline::ProcessorKind;
use crate::pool::{TokioWorkerPool, WorkerPool};

/// Document selection and per-request overrides.
#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// Document to annotate (`-` reads stdin)
    pub input: PathBuf,

    /// Recognizer to run
    #[arg(long, value_enum, default_value = "dictionary")]
    pub processor: ProcessorKind,

    /// Format of the input document
    #[arg(short, long, value_enum, default_value = "raw")]
    pub input_format: InputFormat,

    /// Semantic groups to keep (comma-separated, e.g. DISO,PRGE)
    #[arg(short, long, value_delimiter = ',')]
    pub groups: Vec<String>,

    /// XML elements to annotate (comma-separated, XML input only)
    #[arg(long)]
    pub xml_tags: Option<String>,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DocumentArgs {
    fn to_request(&self, text: String, output_format: Option<OutputFormat>) -> BatchRequest {
        let mut request = BatchRequest::new(text).with_input_format(self.input_format);
        if !self.groups.is_empty() {
            let groups: HashMap<String, bool> = self
                .groups
                .iter()
                .map(|g| g.trim())
                .filter(|g| !g.is_empty())
                .map(|g| (g.to_string(), true))
                .collect();
            request = request.with_groups(groups);
        }
        if let Some(ref tags) = self.xml_tags {
            request = request.with_extra_parameter("xmltags", tags.clone());
        }
        request.output_format = output_format;
        request
    }
}

/// Annotate a document and print its corpus as JSON.
pub async fn cmd_annotate(settings: &Settings, args: DocumentArgs) -> anyhow::Result<()> {
    let text = read_input(&args.input).await?;
    let executor = execute(settings, args.processor, args.to_request(text, None)).await?;

    let corpora = executor.processed_corpora();
    let annotations: usize = corpora.iter().map(|c| c.annotation_count()).sum();
    let json = serde_json::to_string_pretty(&corpora[0])?;
    write_output(args.output.as_deref(), &json).await?;

    eprintln!(
        "{} Annotated {} ({} annotations)",
        style("✓").green(),
        args.input.display(),
        annotations
    );
    Ok(())
}

/// Annotate a document and print it in `format`.
pub async fn cmd_export(
    settings: &Settings,
    args: DocumentArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !settings.output_formats.contains(&format) {
        anyhow::bail!(
            "{} is not one of the configured output formats ({})",
            format,
            settings
                .output_formats
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let text = read_input(&args.input).await?;
    let executor = execute(settings, args.processor, args.to_request(text, Some(format))).await?;

    write_output(args.output.as_deref(), executor.annotated_text().unwrap_or_default()).await?;
    eprintln!(
        "{} Exported {} as {}",
        style("✓").green(),
        args.input.display(),
        format
    );
    Ok(())
}

/// Run one executor; Ctrl+C interrupts the wait.
async fn execute(
    settings: &Settings,
    kind: ProcessorKind,
    request: BatchRequest,
) -> anyhow::Result<BatchExecutor> {
    let dictionaries = Dictionaries::load(&settings.dictionary_paths)?;
    if dictionaries.is_empty() {
        eprintln!(
            "{} No dictionaries configured; set `dictionaries` in annobatch.toml or ANNOBATCH_DICTIONARIES",
            style("!").yellow()
        );
    }
    let context = Context::new(settings.base_configuration(), dictionaries);
    let pool = Arc::new(TokioWorkerPool::new(settings.workers)?);

    let interrupt = CancellationToken::new();
    let ctrl_c = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        })
    };

    let shared: Arc<dyn WorkerPool> = pool.clone();
    let mut executor = BatchExecutor::new(Arc::new(settings.service.clone()), shared, request)
        .with_interrupt(interrupt);
    let result = executor.run(kind, &context).await;

    ctrl_c.abort();
    pool.close();
    result?;
    Ok(executor)
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))
}

async fn write_output(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, text)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e)),
        None => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(groups: Vec<&str>, xml_tags: Option<&str>) -> DocumentArgs {
        DocumentArgs {
            input: PathBuf::from("-"),
            processor: ProcessorKind::Dictionary,
            input_format: InputFormat::Xml,
            groups: groups.into_iter().map(String::from).collect(),
            xml_tags: xml_tags.map(String::from),
            output: None,
        }
    }

    #[test]
    fn test_request_from_args() {
        let request = args(vec!["DISO", " PRGE"], Some("title,p"))
            .to_request("<p>x</p>".to_string(), Some(OutputFormat::A1));

        assert!(request.is_filtering_groups());
        assert_eq!(request.groups.as_ref().unwrap().get("PRGE"), Some(&true));
        assert_eq!(request.extra_parameters["xmltags"], "title,p");
        assert_eq!(request.output_format, Some(OutputFormat::A1));
        assert_eq!(request.input_format, InputFormat::Xml);
    }

    #[test]
    fn test_no_groups_disables_filtering() {
        let request = args(vec![], None).to_request(String::new(), None);
        assert!(!request.is_filtering_groups());
        assert!(request.extra_parameters.is_empty());
    }

    #[tokio::test]
    async fn test_execute_with_dictionary_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("genes.tsv"), "U:C1:T028:PRGE\tBRCA1\n").unwrap();
        let settings = Settings {
            workers: 1,
            dictionary_paths: vec![dir.path().to_path_buf()],
            ..Default::default()
        };

        let request = BatchRequest::new("BRCA1 is a gene.").with_output_format(OutputFormat::Pipe);
        let executor = execute(&settings, ProcessorKind::Dictionary, request)
            .await
            .unwrap();
        assert_eq!(executor.annotated_text(), Some("U:C1:T028:PRGE|0 5|BRCA1\n"));
    }
}
