//! Configuration management commands.

use console::style;

use crate::config::Settings;

/// Print the resolved settings.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    println!("{}", style("Settings").bold());
    println!("  {} workers: {}", style("→").dim(), settings.workers);
    println!("  {} server: {}:{}", style("→").dim(), settings.host, settings.port);

    if settings.dictionary_paths.is_empty() {
        println!("  {} dictionaries: {}", style("!").yellow(), style("none").dim());
    } else {
        println!("  {} dictionaries:", style("→").dim());
        for path in &settings.dictionary_paths {
            let marker = if path.exists() {
                style("✓").green()
            } else {
                style("✗").red()
            };
            println!("      {} {}", marker, path.display());
        }
    }

    let formats: Vec<String> = settings.output_formats.iter().map(|f| f.to_string()).collect();
    println!("  {} output formats: {}", style("→").dim(), formats.join(", "));
    println!("  {} input format: {:?}", style("→").dim(), settings.input_format);
    println!(
        "  {} parser: {:?} / {:?} / {:?}",
        style("→").dim(),
        settings.parser_tool,
        settings.parser_language,
        settings.parser_level
    );

    let service = &settings.service;
    println!("{}", style("Service").bold());
    println!(
        "  {} false positives: {}",
        style("→").dim(),
        service
            .false_positives
            .as_ref()
            .map(|fp| format!("{} terms", fp.lines().filter(|l| !l.trim().is_empty()).count()))
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "  {} group normalization: {} entries",
        style("→").dim(),
        service.groups_normalization.len()
    );
    println!("  {} abbreviations: {}", style("→").dim(), service.abbreviations);
    println!("  {} disambiguation: {}", style("→").dim(), service.disambiguation);

    Ok(())
}
