//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod annotate;
mod config_cmd;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::context::OutputFormat;

use annotate::DocumentArgs;

#[derive(Parser)]
#[command(name = "annobatch")]
#[command(about = "Single-document concept annotation over a shared worker pool")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a document and print its corpus as JSON
    Annotate {
        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Annotate a document and print it in one output format
    Export {
        #[command(flatten)]
        document: DocumentArgs,
        /// Output format to return
        #[arg(short, long, value_enum)]
        format: OutputFormat,
    },

    /// Start the HTTP server
    Serve {
        /// Bind address: port, host, or host:port
        bind: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved settings
    Show,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let settings = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Annotate { document } => annotate::cmd_annotate(&settings, document).await,
        Commands::Export { document, format } => {
            annotate::cmd_export(&settings, document, format).await
        }
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&settings),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InputFormat;
    use crate::pipeline::ProcessorKind;

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "annobatch",
            "export",
            "doc.xml",
            "--format",
            "a1",
            "--input-format",
            "xml",
            "--xml-tags",
            "title,p",
            "--groups",
            "DISO,PRGE",
        ])
        .unwrap();

        match cli.command {
            Commands::Export { document, format } => {
                assert_eq!(format, OutputFormat::A1);
                assert_eq!(document.input_format, InputFormat::Xml);
                assert_eq!(document.xml_tags.as_deref(), Some("title,p"));
                assert_eq!(document.processor, ProcessorKind::Dictionary);
                assert_eq!(document.groups, vec!["DISO", "PRGE"]);
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_command() {
        let cli =
            Cli::try_parse_from(["annobatch", "annotate", "-", "--processor", "regex", "-v"])
                .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Annotate { document } => {
                assert_eq!(document.processor, ProcessorKind::Regex);
                assert_eq!(document.input.to_str(), Some("-"));
            }
            _ => panic!("expected annotate command"),
        }
    }
}
