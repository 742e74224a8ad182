//! alleleload - create new MGI alleles from the generic allele input file

use alleleload::bulk::{advance_accession_max, BulkLoader};
use alleleload::config::{ConfigOverrides, LoadConfig, LoadMode};
use alleleload::db::create_pool;
use alleleload::domain::MGI_PREFIX;
use alleleload::keys::{initialize_keys, PgKeySource};
use alleleload::pipeline::AlleleLoadPipeline;
use alleleload::resolver::PgResolver;
use alleleload::sink::BcpFileSink;
use alleleload::transformer::RecordTransformer;
use alleleload_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tokio::io::BufReader;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "alleleload")]
#[command(author, version, about = "Load new alleles into the MGI database")]
struct Cli {
    /// Generic allele input file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for bcp files and run logs
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Reference cited by every marker association (J:nnnn)
    #[arg(short, long)]
    jnumber: Option<String>,

    /// load or preview
    #[arg(short, long)]
    mode: Option<LoadMode>,

    /// Also log to the console
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match LoadConfig::load(ConfigOverrides {
        input_file: cli.input,
        output_dir: cli.output_dir,
        jnumber: cli.jnumber,
        mode: cli.mode,
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        },
    };

    let diagnostics = config.paths().diagnostics();
    let log_config = LogConfig::builder()
        .level(LogLevel::Debug)
        .output(if cli.verbose {
            LogOutput::Both
        } else {
            LogOutput::File
        })
        .log_dir(config.output_dir.clone())
        .log_file_name(
            diagnostics
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "alleleload.diagnostics".to_string()),
        )
        .filter_directives("sqlx=warn")
        .build();

    // LOG_* variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: cannot initialize logging: {:#}", e);
            process::exit(1);
        },
    };

    if let Err(e) = run(&config).await {
        error!(error = %format!("{:#}", e), "Allele load failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(config: &LoadConfig) -> Result<()> {
    let started = Local::now();
    info!(
        start = %started.format("%Y-%m-%d %H:%M:%S"),
        database = %config.database.describe(),
        input = %config.input_file.display(),
        jnumber = %config.jnumber,
        mode = %config.mode,
        "Allele load started"
    );

    let pool = create_pool(&config.database)
        .await
        .context("Failed to connect to the database")?;

    let keys = initialize_keys(&mut PgKeySource::new(pool.clone()))
        .await
        .context("Failed to initialize keys")?;

    let input = tokio::fs::File::open(&config.input_file)
        .await
        .with_context(|| format!("Failed to open {}", config.input_file.display()))?;

    let paths = config.paths();
    let sink = BcpFileSink::create(paths.clone()).with_context(|| {
        format!("Failed to create output files in {}", paths.output_dir().display())
    })?;

    let transformer = RecordTransformer::new(
        PgResolver::new(pool.clone()),
        config.jnumber.clone(),
        started.naive_local(),
    );

    let mut pipeline = AlleleLoadPipeline::new(transformer, sink, keys);
    let stats = pipeline.run(BufReader::new(input)).await?;

    println!(
        "{} lines read, {} alleles created, {} lines rejected",
        stats.lines_read, stats.accepted, stats.rejected
    );

    if config.mode.is_preview() {
        info!("Preview mode: skipping bulk load and accession update");
    } else {
        let report = BulkLoader::new(pool.clone()).load_all(&paths).await;
        info!(rows = report.total_rows(), "Bulk load finished");

        if report.should_advance_accession_max() {
            advance_accession_max(&pool, MGI_PREFIX, stats.accepted as u64).await?;
        } else {
            warn!("Accession table not loaded, accession maximum unchanged");
        }
        report.into_result()?;
    }

    info!(
        end = %Local::now().format("%Y-%m-%d %H:%M:%S"),
        accepted = stats.accepted,
        rejected = stats.rejected,
        "Allele load finished"
    );

    Ok(())
}
