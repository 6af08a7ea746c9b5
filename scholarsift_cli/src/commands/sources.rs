use crate::cli::{Cli, OutputFormat};
use crate::commands::{load_config, Result};
use crate::output::{format_output, terminal_width, truncate_str, OutputData};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use scholarsift_core::{CollectorRegistry, SourceConfig};

pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let sources = config.sources;

    if sources.is_empty() {
        println!("{}", "No sources configured".yellow());
        return Ok(());
    }

    match cli.output_format() {
        OutputFormat::Pretty => {
            let registry = CollectorRegistry::builtin();
            let term_width = terminal_width();

            println!("{}", "Scholarship Sources".bold().cyan());
            println!();
            println!("{}", sources_table(&sources, &registry, term_width));
            println!();

            let enabled = sources.iter().filter(|s| s.enabled).count();
            println!(
                "{} of {} sources enabled",
                enabled.to_string().green().bold(),
                sources.len()
            );
            println!(
                "{} Use {} to query a subset",
                "Tip:".green().bold(),
                "scholarsift search --sources daad,hec".cyan()
            );
        }
        format => {
            format_output(&OutputData::SourceList(sources), &format)?;
        }
    }

    Ok(())
}

fn sources_table(sources: &[SourceConfig], registry: &CollectorRegistry, term_width: usize) -> Table {
    let url_width = term_width.saturating_sub(70).max(24);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(term_width as u16)
        .set_header(vec!["Name", "Source", "Kind", "Priority", "Country", "Parser", "Enabled", "URL"]);

    for source in sources {
        let parser = if registry.has_dedicated(&source.name) {
            "dedicated"
        } else {
            "generic"
        };
        table.add_row(vec![
            source.name.clone(),
            source.display_name.clone(),
            source.kind.as_str().to_string(),
            source.priority.to_string(),
            source.country.clone().unwrap_or_else(|| "-".to_string()),
            parser.to_string(),
            if source.enabled { "yes" } else { "no" }.to_string(),
            truncate_str(&source.url, url_width),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholarsift_core::ScholarConfig;

    #[test]
    fn test_sources_table_marks_parsers() {
        let config = ScholarConfig::builtin();
        let table = sources_table(&config.sources, &CollectorRegistry::builtin(), 200).to_string();
        assert!(table.contains("daad"));
        assert!(table.contains("dedicated"));
        assert!(table.contains("generic"));
    }
}
