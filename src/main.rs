//! Subpipe - Video to Multilingual Subtitle Pipeline
//!
//! Command-line entry point: loads configuration, sets up logging and runs
//! the requested command.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use subpipe::cli::{Args, Commands, parse_language_list};
use subpipe::config::Config;
use subpipe::progress::SilentProgress;
use subpipe::stage::StageOutcome;
use subpipe::workflow::{Components, RunReport, Workflow};

const DEFAULT_CONFIG: &str = "subpipe.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered log lines reach the file
    let _guard = setup_logging(args.verbose)?;

    match args.command {
        Commands::Init { output, force } => {
            if output.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", output.display());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Run { project, url, output_dir, model, no_progress } => {
            let mut config = load_config(args.config.as_deref())?;

            if let Some(project) = project {
                config.project.name = project;
            }
            if let Some(url) = url {
                config.project.source_url = url;
            }
            if let Some(output_dir) = output_dir {
                config.project.output_dir = output_dir;
            }
            if let Some(model) = model {
                config.recognizer.model = model.parse()?;
            }

            let mut components = Components::from_config(&config)?;
            if no_progress {
                components.progress = Box::new(SilentProgress);
            }

            let workflow = Workflow::with_components(config, components)?;
            workflow.preflight().await?;

            match workflow.run().await {
                Ok(report) => print_summary(&report),
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    if let Some(stage) = e.stage() {
                        eprintln!("FAILED during {}: {}", stage, e.root());
                    } else {
                        eprintln!("FAILED: {}", e);
                    }
                    return Err(e.into());
                }
            }
        }
        Commands::Translate { input, from, to, output_dir } => {
            let config = load_config(args.config.as_deref())?;
            let targets = parse_language_list(&to);
            if targets.is_empty() {
                bail!("no target languages given");
            }

            info!("Translating subtitles: {}", input.display());
            let workflow = Workflow::new(config)?;
            let written = workflow
                .translate_caption_file(&input, &from.to_lowercase(), &targets, output_dir.as_deref())
                .await?;

            for path in written {
                println!("Wrote {}", display_path(&path));
            }
        }
    }

    Ok(())
}

/// Explicit path, else ./subpipe.toml, else defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG);
                Config::from_file(DEFAULT_CONFIG)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

fn print_summary(report: &RunReport) {
    println!("\nRun {} finished in {}s", report.run_id, report.elapsed().num_seconds());
    println!("Segments recognized: {}", report.segment_count);
    println!("{:<24} {:<10}", "Stage", "Outcome");
    println!("{}", "-".repeat(36));
    for (stage, outcome) in &report.stages {
        let outcome = match outcome {
            StageOutcome::Completed => "done".to_string(),
            StageOutcome::Skipped(reason) => format!("skipped ({:?})", reason),
        };
        println!("{:<24} {:<10}", stage.to_string(), outcome);
    }
    let skipped = report.stages.iter().filter(|(_, outcome)| outcome.is_skipped()).count();
    println!("{} of {} stages skipped", skipped, report.stages.len());
    for path in &report.captions {
        println!("Wrote {}", display_path(path));
    }
}

/// Path relative to the working directory when that is shorter.
fn display_path(path: &Path) -> String {
    let relative: Option<PathBuf> = std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd));
    relative
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".subpipe").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation
    let file_appender = rolling::daily(&log_dir, "subpipe.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subpipe.log").display()
    );

    Ok(guard)
}
