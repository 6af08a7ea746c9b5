use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "scholarsift_cli=info,scholarsift_core=warn",
        1 => "scholarsift_cli=debug,scholarsift_core=info",
        2 => "scholarsift_cli=debug,scholarsift_core=debug",
        _ => "scholarsift_cli=trace,scholarsift_core=trace",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .init();

    let result = match &cli.command {
        None => {
            show_overview(&cli);
            Ok(())
        }
        Some(Commands::Search(args)) => search::run(&cli, args).await,
        Some(Commands::Sources) => sources::run(&cli),
        Some(Commands::Config { action }) => config::run(&cli, action),
    };

    if let Err(e) = result {
        if cli.no_color {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}: {}", "Error".red().bold(), e);
        }
        process::exit(1);
    }
}

fn show_overview(cli: &Cli) {
    println!();
    println!(
        "{}  {}",
        "Scholarsift".bold().cyan(),
        "- scholarship search across many sources".dimmed()
    );
    println!();

    match load_config(cli) {
        Ok(config) => {
            let enabled = config.sources.iter().filter(|s| s.enabled).count();
            println!(
                "  {} sources configured ({} enabled)",
                config.sources.len().to_string().green().bold(),
                enabled.to_string().green()
            );
        }
        Err(e) => {
            println!("  {} {}", "Config not readable:".yellow(), e);
        }
    }
    println!();

    println!("{}", "Quick Start:".bold().cyan());
    println!(
        "  {}{}",
        "scholarsift search --degree Master".cyan(),
        "   Search all sources".dimmed()
    );
    println!(
        "  {}{}",
        "scholarsift sources".cyan(),
        "                  List configured sources".dimmed()
    );
    println!(
        "  {}{}",
        "scholarsift config init".cyan(),
        "              Write an editable sources file".dimmed()
    );
    println!();

    println!(
        "{} Use {} for full help",
        "Tip:".dimmed(),
        "scholarsift --help".cyan()
    );
    println!();
}
