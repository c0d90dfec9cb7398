//! coral-research binary: run the pipeline from the command line.

use anyhow::Context;
use clap::Parser;
use coral::agents::SearchAgent;
use coral::cli::output::Output;
use coral::cli::{Cli, Commands};
use coral::phases::PhaseOrchestrator;
use coral::planner::FacetPlanner;
use coral::tools::ToolRegistry;
use coral::utils::CoralConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let out = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Commands::Init { path, force } => init(&path, force, &out),
        Commands::Run {
            topic,
            parallel,
            series,
            output,
            snapshot,
        } => {
            run(
                &cli.config,
                cli.verbose,
                &topic,
                parallel,
                series,
                output,
                snapshot,
                &out,
            )
            .await
        }
    }
}

/// Writes a commented coral.toml scaffold.
fn init(path: &Path, force: bool, out: &Output) -> anyhow::Result<()> {
    let target = path.join("coral.toml");
    if target.exists() && !force {
        out.error(&format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        ));
        anyhow::bail!("refusing to overwrite existing configuration");
    }
    std::fs::write(&target, CoralConfig::scaffold())
        .with_context(|| format!("writing {}", target.display()))?;
    out.success(&format!("wrote {}", target.display()));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run(
    config_path: &Path,
    verbose: bool,
    topic: &str,
    parallel: Option<usize>,
    series: bool,
    output: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    out: &Output,
) -> anyhow::Result<()> {
    let mut config = CoralConfig::load_or_default(config_path)?;
    if series {
        config.pipeline.max_parallel_topics = 1;
    } else if let Some(parallel) = parallel {
        config.pipeline.max_parallel_topics = parallel.max(1);
    }

    let default_filter = if verbose {
        "coral=debug".to_string()
    } else {
        config.log.level.clone()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    out.banner();
    out.info(&format!(
        "researching \"{}\" with {} worker(s)",
        topic, config.pipeline.max_parallel_topics
    ));

    let tools = Arc::new(ToolRegistry::with_default_tools());
    let orchestrator = PhaseOrchestrator::new(
        config.pipeline.clone(),
        tools,
        Arc::new(FacetPlanner::default()),
        Arc::new(SearchAgent::new(config.tools.num_results)),
    );

    // First ctrl-c cancels cooperatively; the run winds down and reports
    // whatever completed.
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = orchestrator.run(topic).await?;

    if let Some(path) = snapshot {
        orchestrator.snapshot(topic).save(&path)?;
        out.success(&format!("snapshot written to {}", path.display()));
    }

    if !report.skipped.is_empty() {
        out.warning(&format!(
            "{} subtopic(s) skipped; see the report's final section",
            report.skipped.len()
        ));
    }

    let markdown = report.to_markdown();
    match output {
        Some(path) => {
            std::fs::write(&path, &markdown)
                .with_context(|| format!("writing {}", path.display()))?;
            out.success(&format!("report written to {}", path.display()));
        }
        None => {
            out.section("Report");
            println!("{}", markdown);
        }
    }
    out.success(&format!(
        "{} section(s), {} reference(s)",
        report.outline.len(),
        report.references.len()
    ));
    Ok(())
}
