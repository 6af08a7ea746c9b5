use crate::cli::{Cli, OutputFormat, RankMode, SearchArgs};
use crate::commands::{load_config, CommandError, Result};
use crate::output::{format_output, format_record_cards, OutputData};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use scholarsift_core::aggregate::ProgressEvent;
use scholarsift_core::pipeline::ProfileAffinity;
use scholarsift_core::{
    AggregationEngine, AggregationReport, CancellationToken, EngineError, Profile, ScholarConfig,
};
use tracing::{debug, info};

/// Run a search across every selected source.
pub async fn run(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let profile = build_profile(args)?;
    let config = apply_overrides(load_config(cli)?, args)?;

    let mut engine = AggregationEngine::from_config(&config)?;
    if args.rank == RankMode::Affinity {
        engine = engine.with_ranker(ProfileAffinity::ranker());
    }

    let format = cli.output_format();
    let progress = if format == OutputFormat::Pretty {
        ProgressBar::new(100)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {percent:>3}% {msg}")
            .expect("Invalid progress template")
            .progress_chars("=> "),
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(100));

    let cancel = CancellationToken::new();
    let ctrl_c = spawn_ctrl_c_watcher(cancel.clone());

    let bar = progress.clone();
    let on_progress = move |event: &ProgressEvent| {
        bar.set_position((event.fraction * 100.0).round() as u64);
        bar.set_message(event.message.clone());
    };

    info!(
        degree = ?profile.degree_level(),
        country = profile.country(),
        field = profile.field_of_study(),
        "searching"
    );
    let result = engine
        .run_detailed(&profile, Some(&on_progress), cancel)
        .await;
    ctrl_c.abort();
    progress.finish_and_clear();

    let mut report = match result {
        Ok(report) => report,
        Err(EngineError::Aborted) => return Err(CommandError::Cancelled),
        Err(e) => return Err(e.into()),
    };
    if let Some(limit) = args.limit {
        report.records.truncate(limit);
    }

    match format {
        OutputFormat::Pretty => print_pretty_report(&report, &profile),
        format => format_output(&OutputData::SearchReport(report), &format)?,
    }

    Ok(())
}

fn spawn_ctrl_c_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling search");
            cancel.cancel();
        }
    })
}

pub(crate) fn build_profile(args: &SearchArgs) -> Result<Profile> {
    let mut profile = Profile::new();
    if let Some(degree) = &args.degree {
        profile = profile.with_degree_level(degree);
    }
    if let Some(field) = &args.field {
        profile = profile.with_field_of_study(field);
    }
    if let Some(country) = &args.country {
        profile = profile.with_country(country);
    }
    if let Some(nationality) = &args.nationality {
        profile = profile.with_nationality(nationality);
    }
    if let Some(score) = args.score {
        if !(0.0..=100.0).contains(&score) {
            return Err(CommandError::InvalidInput(format!(
                "--score must be between 0 and 100, got {}",
                score
            )));
        }
        profile = profile.with_academic_score(score);
    }
    Ok(profile)
}

/// Apply source selection and engine flags on top of the loaded configuration.
pub(crate) fn apply_overrides(config: ScholarConfig, args: &SearchArgs) -> Result<ScholarConfig> {
    let unknown: Vec<&str> = args
        .sources
        .iter()
        .chain(&args.exclude)
        .filter(|name| {
            !config
                .sources
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(name))
        })
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(CommandError::UnknownSource(unknown.join(", ")));
    }

    let mut config = config;
    if !args.sources.is_empty() {
        config = config.only_sources(&args.sources);
    }
    if !args.exclude.is_empty() {
        config = config.without_sources(&args.exclude);
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err(CommandError::InvalidInput(
                "--concurrency must be at least 1".to_string(),
            ));
        }
        config.engine.max_concurrency = concurrency;
    }
    if let Some(secs) = args.timeout_secs {
        config.engine.collector_timeout_ms = secs.saturating_mul(1000);
    }

    Ok(config)
}

fn print_pretty_report(report: &AggregationReport, profile: &Profile) {
    let mut criteria = vec![profile.country().to_string(), profile.field_of_study().to_string()];
    if let Some(degree) = profile.degree_level() {
        criteria.insert(0, degree.to_string());
    }
    println!(
        "{} {}",
        "Scholarship Search:".bold().cyan(),
        criteria.join(" / ").yellow()
    );
    println!();

    if report.records.is_empty() {
        println!("   {}", "No matching scholarships found".dimmed());
    } else {
        println!("{}", format_record_cards(&report.records, Some("Scholarships")));
    }

    if report.partial && !report.errors.is_empty() {
        println!();
        println!("{}", "⚠ Partial results - some sources failed:".yellow());
        for err in &report.errors {
            let timeout_marker = if err.is_timeout { " (timeout)" } else { "" };
            println!(
                "   {} {}: {}{}",
                "•".dimmed(),
                err.display_name.yellow(),
                err.error.dimmed(),
                timeout_marker.dimmed()
            );
        }
    }

    println!();
    println!(
        "{}",
        format!(
            "{} unique of {} found across {}/{} sources in {}ms",
            report.unique_count,
            report.raw_count,
            report.completed.len(),
            report.dispatched,
            report.duration_ms
        )
        .dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SearchArgs {
        SearchArgs::default()
    }

    #[test]
    fn test_build_profile() {
        let profile = build_profile(&SearchArgs {
            degree: Some("PhD".into()),
            country: Some("Germany".into()),
            score: Some(85.0),
            ..args()
        })
        .unwrap();
        assert_eq!(profile.degree_level(), Some("PhD"));
        assert_eq!(profile.preferred_country(), Some("Germany"));
        assert_eq!(profile.field_of_study(), "All Fields");

        let err = build_profile(&SearchArgs {
            score: Some(140.0),
            ..args()
        })
        .unwrap_err();
        assert!(matches!(err, CommandError::InvalidInput(_)));
    }

    #[test]
    fn test_source_selection() {
        let config = apply_overrides(
            ScholarConfig::builtin(),
            &SearchArgs {
                sources: vec!["daad".into(), "hec".into()],
                exclude: vec!["hec".into()],
                timeout_secs: Some(5),
                ..args()
            },
        )
        .unwrap();
        let enabled: Vec<&str> = config
            .sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["daad"]);
        assert_eq!(config.engine.collector_timeout_ms, 5_000);
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let err = apply_overrides(
            ScholarConfig::builtin(),
            &SearchArgs {
                sources: vec!["nope".into()],
                ..args()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::UnknownSource(name) if name == "nope"));
    }
}
