use crate::cli::{Cli, ConfigAction, OutputFormat};
use crate::commands::{config_store, Result};
use crate::output::{format_output, OutputData};
use owo_colors::OwoColorize;

pub fn run(cli: &Cli, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => {
            println!("{}", config_store(cli).path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(cli, *force),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let store = config_store(cli);
    let config = store.load()?;

    match cli.output_format() {
        OutputFormat::Pretty => {
            println!();
            println!("{}", "Effective Configuration".bold().cyan());
            println!("{}", "=======================".cyan());
            println!();

            if store.exists() {
                println!("Config file: {}", store.path().display().dimmed());
            } else {
                println!(
                    "{} (not found, using built-in sources)",
                    store.path().display().dimmed()
                );
            }
            println!();

            let engine = &config.engine;
            println!("  {:<20} {}", "max_concurrency".dimmed(), engine.max_concurrency);
            println!(
                "  {:<20} {}ms",
                "collector_timeout".dimmed(),
                engine.collector_timeout_ms
            );
            match engine.run_timeout_ms {
                Some(ms) => println!("  {:<20} {}ms", "run_timeout".dimmed(), ms),
                None => println!("  {:<20} {}", "run_timeout".dimmed(), "none"),
            }
            println!("  {:<20} {}", "user_agent".dimmed(), engine.user_agent);
            println!();

            let enabled = config.sources.iter().filter(|s| s.enabled).count();
            println!(
                "  {} sources, {} enabled",
                config.sources.len().to_string().green().bold(),
                enabled.to_string().green()
            );
            println!();
            println!(
                "{} Run {} to write an editable copy",
                "Tip:".green().bold(),
                "scholarsift config init".cyan()
            );
        }
        format => {
            let data = OutputData::ConfigInfo {
                path: store.path().display().to_string(),
                exists: store.exists(),
                config,
            };
            format_output(&data, &format)?;
        }
    }

    Ok(())
}

fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let store = config_store(cli);

    if store.init(force)? {
        println!(
            "{} Wrote built-in sources to {}",
            "✓".green().bold(),
            store.path().display()
        );
    } else {
        println!(
            "{} {} already exists (use --force to overwrite)",
            "!".yellow().bold(),
            store.path().display()
        );
    }

    Ok(())
}
