use crate::cli::OutputFormat;
use crate::commands::Result;
use scholarsift_core::{AggregationReport, ScholarConfig, SourceConfig};
use serde::Serialize;

mod pretty;
pub use pretty::{format_record_cards, terminal_width, truncate_str};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    SearchReport(AggregationReport),
    SourceList(Vec<SourceConfig>),
    ConfigInfo {
        path: String,
        exists: bool,
        config: ScholarConfig,
    },
}

/// Render non-pretty formats; pretty rendering lives with each command.
pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            format_text_output(data)?;
        }
        OutputFormat::Markdown => {
            format_markdown_output(data)?;
        }
    }
    Ok(())
}

fn format_text_output(data: &OutputData) -> Result<()> {
    match data {
        OutputData::SearchReport(report) => {
            for record in &report.records {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    record.title, record.country, record.degree_level, record.deadline, record.url
                );
            }
            for failure in &report.errors {
                eprintln!("failed: {}: {}", failure.source, failure.error);
            }
        }
        OutputData::SourceList(sources) => {
            for source in sources {
                println!(
                    "{}\t{}\t{}\t{}",
                    source.name,
                    source.kind.as_str(),
                    if source.enabled { "enabled" } else { "disabled" },
                    source.url
                );
            }
        }
        OutputData::ConfigInfo { path, config, .. } => {
            println!("Configuration: {}", path);
            println!("{}", serde_yaml::to_string(config)?);
        }
    }
    Ok(())
}

fn format_markdown_output(data: &OutputData) -> Result<()> {
    match data {
        OutputData::SearchReport(report) => {
            println!("# Scholarships\n");
            println!(
                "{} results from {} of {} sources in {}ms\n",
                report.total_count(),
                report.completed.len(),
                report.dispatched,
                report.duration_ms
            );
            for (i, record) in report.records.iter().enumerate() {
                if record.url.is_empty() {
                    println!("## {}. {}\n", i + 1, record.title);
                } else {
                    println!("## {}. [{}]({})\n", i + 1, record.title, record.url);
                }
                println!("- **Country:** {}", record.country);
                println!("- **Degree:** {}", record.degree_level);
                println!("- **Field:** {}", record.field_of_study);
                println!("- **Funding:** {}", record.funding);
                println!("- **Deadline:** {}", record.deadline);
                println!("- **Eligibility:** {}", record.eligibility);
                println!();
            }
            if report.partial {
                println!("## Failed sources\n");
                for failure in &report.errors {
                    println!("- `{}`: {}", failure.source, failure.error);
                }
                println!();
            }
        }
        OutputData::SourceList(sources) => {
            println!("# Sources\n");
            println!("| Name | Display name | Kind | Priority | Country | Enabled |");
            println!("|------|--------------|------|----------|---------|---------|");
            for source in sources {
                println!(
                    "| `{}` | {} | {} | {} | {} | {} |",
                    source.name,
                    source.display_name,
                    source.kind.as_str(),
                    source.priority,
                    source.country.as_deref().unwrap_or("-"),
                    if source.enabled { "yes" } else { "no" }
                );
            }
        }
        OutputData::ConfigInfo { path, config, .. } => {
            println!("# Configuration\n");
            println!("Path: `{}`\n", path);
            println!("```yaml\n{}```", serde_yaml::to_string(config)?);
        }
    }
    Ok(())
}
