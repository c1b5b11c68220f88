//! surveystat - Stack Overflow developer survey statistics
//!
//! A CLI tool that runs a fixed set of aggregation queries over the survey
//! collection and renders the results as tables, Markdown, JSON or charts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, query or report failure)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use analysis::Analyzer;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::ReportMetadata;
use report::Report;
use source::{DataSource, RecordFilter};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("surveystat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .surveystat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to change the database, country list, limits and chart size.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Spinner on stderr, hidden in quiet mode.
fn spinner(args: &Args, message: String) -> Result<ProgressBar> {
    if args.quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Invalid progress template")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

/// Connect, run the selected analyses one after another and render them.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Step 1: Open the data source
    let settings = config.source_settings();
    let pb = spinner(&args, "Connecting to data source...".to_string())?;
    let source = DataSource::connect(&settings)
        .await
        .context("Failed to open the data source")?;
    pb.finish_and_clear();
    info!("Data source: {}", source.describe());

    let total_records = source
        .count(&RecordFilter::All)
        .await
        .context("Failed to count survey responses")?;

    if args.count_only {
        println!("Data Count: {}", total_records);
        return Ok(());
    }
    if total_records == 0 {
        warn!("The data source holds no survey responses");
    }

    // Step 2: Run the analyses in sequence
    let analyzer = Analyzer::new(&source, config.analysis_settings())?;
    let tasks = args.task.tasks();
    let mut results = Vec::with_capacity(tasks.len());

    for task in tasks {
        let pb = spinner(&args, format!("{}...", task.title()))?;
        let result = analyzer.run(task).await;
        pb.finish_and_clear();
        results.push(result.with_context(|| format!("Analysis failed: {}", task))?);
    }

    // Step 3: Render
    let report = Report {
        metadata: ReportMetadata {
            source: source.describe(),
            generated_at: Utc::now(),
            total_records,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        results,
    };

    let output = match args.format {
        OutputFormat::Console => report::render_console(&report),
        OutputFormat::Markdown => report::render_markdown(&report),
        OutputFormat::Json => report::render_json(&report)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    if let Some(ref dir) = config.report.chart_dir {
        let written = report::write_charts(&report.results, dir, config.chart_options())?;
        info!("{} chart(s) written to {}", written.len(), dir.display());
    }

    debug!(
        "Finished {} analyses in {:.1}s",
        report.results.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
