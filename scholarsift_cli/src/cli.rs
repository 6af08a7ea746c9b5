use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scholarsift")]
#[command(about = "Scholarsift - search many scholarship sources at once")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  scholarsift search --degree Master --country Germany
  scholarsift search --field Engineering --rank affinity
  scholarsift sources                     List configured sources
  scholarsift config init                 Write an editable sources file

\x1b[1;36mMore Info:\x1b[0m
  scholarsift <command> --help            Get help for any command")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Sources file to use instead of ~/.config/scholarsift/sources.yaml
    #[arg(long, global = true, env = "SCHOLARSIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Pretty output degrades to plain text when colors are off.
    pub fn output_format(&self) -> OutputFormat {
        match self.output {
            OutputFormat::Pretty if self.no_color => OutputFormat::Text,
            other => other,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every enabled source for scholarships matching a profile
    ///
    /// All sources are queried concurrently. Sources that fail or time out
    /// are reported after the results; they never fail the search.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  scholarsift search --degree PhD --country Germany
  scholarsift search --field \"Computer Science\" --nationality Pakistan --rank affinity
  scholarsift search --sources daad,hec --timeout-secs 20
  scholarsift search --exclude scholarshipportal --output json")]
    Search(SearchArgs),

    /// List configured scholarship sources
    #[command(alias = "ls")]
    Sources,

    /// Show or initialize the sources configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct SearchArgs {
    /// Degree level (Bachelor, Master, PhD, Postdoctoral)
    #[arg(short, long)]
    pub degree: Option<String>,

    /// Field of study; "All Fields" matches everything
    #[arg(short, long)]
    pub field: Option<String>,

    /// Destination country; "Any Country" matches everything
    #[arg(short, long)]
    pub country: Option<String>,

    /// Your nationality, used by affinity ranking
    #[arg(long)]
    pub nationality: Option<String>,

    /// Academic score out of 100, used by affinity ranking
    #[arg(long)]
    pub score: Option<f64>,

    /// Only query these sources (comma-separated names)
    #[arg(short = 's', long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Skip these sources (comma-separated names)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Maximum sources queried at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Time budget per source in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Result ordering
    #[arg(long, value_enum, default_value_t = RankMode::Arrival)]
    pub rank: RankMode,

    /// Show at most this many results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the built-in configuration to the configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankMode {
    /// Keep source dispatch order
    #[default]
    Arrival,
    /// Score each result against the profile
    Affinity,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
    /// Markdown output
    Markdown,
}
