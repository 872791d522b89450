//! CLI for the personalizer training harness.
//!
//! Loads feature/action catalogs, talks to the Personalizer service and runs
//! batch or interactive training against it.

mod config;
mod http;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use personalizer_core::Selections;
use personalizer_feedback::RunAnalyzer;
use personalizer_training::{
    load_cases, run_console, ActionCatalog, BatchOptions, BatchSummary, CaseOutcome,
    ContextBuilder, FeatureCatalog, InteractiveSession, RankClient, Rounds, Trainer,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppSettings;
use crate::http::PersonalizerClient;

const DEFAULT_CONFIG: &str = "appsettings.json";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to the settings file (endpoint key, resource name)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CatalogArgs {
    /// Feature catalog (JSON)
    #[arg(long, default_value = "data/features.json")]
    features: PathBuf,

    /// Action catalog (JSON)
    #[arg(long, default_value = "data/actions.json")]
    actions: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the catalogs and report what they contain
    Check {
        #[command(flatten)]
        catalogs: CatalogArgs,
    },
    /// Issue a single ranking request and print the result (no reward)
    Rank {
        #[command(flatten)]
        catalogs: CatalogArgs,

        /// Feature selection as Name=Label (repeatable, order is kept)
        #[arg(long = "select", value_parser = parse_selection)]
        select: Vec<(String, String)>,

        /// Action id to exclude (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// Run every case of a training file and report rewards
    Train {
        #[command(flatten)]
        catalogs: CatalogArgs,

        /// Training case file (JSON)
        #[arg(long, default_value = "data/training.json")]
        cases: PathBuf,

        /// Abort on the first case that fails structurally
        #[arg(long)]
        stop_on_error: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer feature prompts on the console and reward the ranking by hand
    Interactive {
        #[command(flatten)]
        catalogs: CatalogArgs,

        /// Feature to ask for (repeatable, asked in order)
        #[arg(long = "select", required = true)]
        select: Vec<String>,

        /// Action id to exclude (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Keep going after each reward until Q is entered
        #[arg(long)]
        repeat: bool,
    },
}

fn parse_selection(s: &str) -> Result<(String, String), String> {
    let (name, label) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Name=Label, got '{s}'"))?;
    let (name, label) = (name.trim(), label.trim());
    if name.is_empty() {
        return Err(format!("missing feature name in '{s}'"));
    }
    Ok((name.to_string(), label.to_string()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_catalogs(args: &CatalogArgs) -> Result<(FeatureCatalog, ActionCatalog)> {
    let features = FeatureCatalog::load(&args.features)
        .with_context(|| format!("Failed to load features from {:?}", args.features))?;
    let actions = ActionCatalog::load(&args.actions)
        .with_context(|| format!("Failed to load actions from {:?}", args.actions))?;
    info!(
        features = features.len(),
        actions = actions.len(),
        "catalogs loaded"
    );
    Ok((features, actions))
}

fn connect(config: Option<&Path>) -> Result<PersonalizerClient> {
    let settings = match config {
        Some(path) => AppSettings::load(path, true)?,
        None => AppSettings::load(Path::new(DEFAULT_CONFIG), false)?,
    };
    let resolved = settings
        .with_env(|k| std::env::var(k).ok())
        .resolve()
        .context("Personalizer connection is not configured")?;
    info!(endpoint = %resolved.endpoint, "using Personalizer endpoint");
    PersonalizerClient::new(&resolved)
}

fn check(catalogs: &CatalogArgs) -> Result<()> {
    let (features, actions) = load_catalogs(catalogs)?;
    println!("{} features:", features.len());
    for f in features.iter() {
        let labels: Vec<&str> = f.values.iter().map(|v| v.label.as_str()).collect();
        println!("  {} [{}]", f.name, labels.join(", "));
    }
    println!("{} actions:", actions.len());
    for a in actions.as_slice() {
        println!("  {} ({} feature sets)", a.id, a.features.len());
    }
    Ok(())
}

fn rank(
    config: Option<&Path>,
    catalogs: &CatalogArgs,
    select: Vec<(String, String)>,
    exclude: Vec<String>,
) -> Result<()> {
    let (features, actions) = load_catalogs(catalogs)?;
    let selections: Selections = select
        .iter()
        .map(|(name, label)| (name.as_str(), label.as_str()))
        .collect();
    let context = ContextBuilder::new(&features).build(&selections)?;

    let mut client = RankClient::new(connect(config)?);
    let ranking = client.rank(actions.as_slice(), &context, &exclude)?;
    let out = serde_json::json!({
        "eventId": ranking.event_id,
        "rewardActionId": ranking.reward_action_id,
        "ranking": ranking.ranking,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn train(
    config: Option<&Path>,
    catalogs: &CatalogArgs,
    cases_path: &Path,
    stop_on_error: bool,
    json: bool,
) -> Result<()> {
    let (features, actions) = load_catalogs(catalogs)?;
    let cases = load_cases(cases_path)
        .with_context(|| format!("Failed to load training cases from {:?}", cases_path))?;
    let backend = connect(config)?;
    let mut trainer = Trainer::new(&features, &actions, backend);

    let mut summary = BatchSummary::default();
    let mut results = Vec::new();
    for report in trainer.run_all(&cases, BatchOptions { stop_on_error }) {
        summary.record(&report);
        match report.outcome {
            CaseOutcome::Completed(result) => {
                if !json {
                    if result.passed {
                        println!("PASS  {}: chose '{}'", result.name, result.ranked_top);
                    } else {
                        println!(
                            "MISS  {}: chose '{}', expected '{}'",
                            result.name, result.ranked_top, result.expected
                        );
                    }
                }
                results.push(result);
            }
            CaseOutcome::Failed(e) => {
                if !json {
                    println!("ERROR {}: {}", report.name, e);
                }
            }
        }
    }

    let label = cases_path.display().to_string();
    let run_report = RunAnalyzer::default().report(&label, &results);
    if json {
        println!("{}", serde_json::to_string_pretty(&run_report)?);
    } else {
        println!(
            "{} cases: {} passed, {} missed, {} errors",
            summary.total, summary.passed, summary.failed, summary.errors
        );
        for pattern in &run_report.patterns {
            println!("  ! {pattern}");
        }
    }

    if summary.errors > 0 {
        anyhow::bail!("{} training case(s) failed with errors", summary.errors);
    }
    Ok(())
}

fn interactive(
    config: Option<&Path>,
    catalogs: &CatalogArgs,
    select: Vec<String>,
    exclude: Vec<String>,
    repeat: bool,
) -> Result<()> {
    let (features, actions) = load_catalogs(catalogs)?;
    let rounds = if repeat { Rounds::UntilQuit } else { Rounds::Single };
    let mut session = InteractiveSession::new(&features, select.as_slice(), exclude)?.with_rounds(rounds);
    let mut trainer = Trainer::new(&features, &actions, connect(config)?);

    let stdin = io::stdin();
    let outcome = run_console(&mut trainer, &mut session, stdin.lock(), io::stdout())?;
    if outcome.quit && outcome.rewards == 0 {
        warn!("interactive session ended without a reward");
    }
    info!(
        rank_calls = outcome.rank_calls,
        rewards = outcome.rewards,
        "interactive session finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Check { catalogs } => check(&catalogs),
        Commands::Rank {
            catalogs,
            select,
            exclude,
        } => rank(config, &catalogs, select, exclude),
        Commands::Train {
            catalogs,
            cases,
            stop_on_error,
            json,
        } => train(config, &catalogs, &cases, stop_on_error, json),
        Commands::Interactive {
            catalogs,
            select,
            exclude,
            repeat,
        } => interactive(config, &catalogs, select, exclude, repeat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            parse_selection("Location=Bedroom").unwrap(),
            ("Location".to_string(), "Bedroom".to_string())
        );
        assert_eq!(
            parse_selection(" Location = Living Room ").unwrap(),
            ("Location".to_string(), "Living Room".to_string())
        );
        // An empty label means "skip".
        assert_eq!(
            parse_selection("Mood=").unwrap(),
            ("Mood".to_string(), String::new())
        );
        assert!(parse_selection("Location").is_err());
        assert!(parse_selection("=Bedroom").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
