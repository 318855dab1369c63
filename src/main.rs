//! Refund Item Classifier CLI
//!
//! Batch runner and local tools for the refund item classification service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use burn::tensor::backend::Backend;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use refund_classifier::backend::{select_backend, ComputeBackend, CpuBackend};
#[cfg(feature = "cuda")]
use refund_classifier::backend::AcceleratorBackend;
use refund_classifier::batch::{
    run_batch, BatchConfig, PredictionStore, DEFAULT_API_URL, DEFAULT_DB_PATH, DEFAULT_IMAGES_DIR,
};
use refund_classifier::utils::format_percent;
use refund_classifier::utils::logging::{init_logging, LogConfig, LogLevel};
use refund_classifier::{ClassLabels, Prediction, Predictor};

/// Refund Item Classifier
///
/// Sends a directory of returned-item photos to the classification service and
/// stores the predictions in SQLite.
#[derive(Parser, Debug)]
#[command(name = "refund_classifier")]
#[command(version = "0.1.0")]
#[command(about = "Refund item image classification: batch runner and tools", long_about = None)]
struct Cli {
    /// Minimum log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Append logs to this file instead of stdout
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every image in a directory through the service and store the results
    Batch {
        /// Base URL of the inference service
        #[arg(long, env = "REFUND_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Directory of images (jpg, jpeg, png)
        #[arg(short, long, env = "REFUND_IMAGES_DIR", default_value = DEFAULT_IMAGES_DIR)]
        images_dir: PathBuf,

        /// SQLite database file
        #[arg(long, env = "REFUND_DB_PATH", default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Per-request timeout in seconds (no timeout if unset)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Classify a single image locally, without the service
    Predict {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the trained model record
        #[arg(short, long, env = "REFUND_MODEL_PATH", default_value = "app/model/model.mpk")]
        model: PathBuf,

        /// Model architecture config (JSON); defaults apply if unset
        #[arg(long, env = "REFUND_MODEL_CONFIG")]
        model_config: Option<PathBuf>,

        /// Class label mapping file
        #[arg(short, long, env = "REFUND_CLASSES_PATH", default_value = "app/classes.json")]
        labels: PathBuf,
    },

    /// Show the most recent stored predictions
    History {
        /// SQLite database file
        #[arg(long, env = "REFUND_DB_PATH", default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Number of records to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::default()
        .with_level(cli.log_level)
        .with_log_file(cli.log_file);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{}", e);
    }

    match cli.command {
        Commands::Batch {
            api_url,
            images_dir,
            db,
            timeout_secs,
        } => {
            let config = BatchConfig {
                api_url,
                images_dir,
                db_path: db,
                timeout: timeout_secs.map(Duration::from_secs),
            };
            cmd_batch(&config).await?;
        }

        Commands::Predict {
            input,
            model,
            model_config,
            labels,
        } => {
            cmd_predict(&input, &model, model_config.as_deref(), &labels)?;
        }

        Commands::History { db, limit } => {
            cmd_history(&db, limit)?;
        }
    }

    Ok(())
}

async fn cmd_batch(config: &BatchConfig) -> Result<()> {
    println!("{}", "Batch Configuration:".cyan().bold());
    println!("  API:      {}", config.api_url);
    println!("  Images:   {:?}", config.images_dir);
    println!("  Database: {:?}", config.db_path);
    println!();

    let report = run_batch(config).await?;

    println!();
    println!("{}", "Batch Summary:".green().bold());
    println!("  Scanned: {}", report.scanned);
    println!("  Saved:   {}", report.saved.to_string().green());
    if report.failed > 0 {
        println!("  Failed:  {}", report.failed.to_string().red());
    } else {
        println!("  Failed:  0");
    }

    Ok(())
}

fn cmd_predict(input: &Path, model: &Path, model_config: Option<&Path>, labels: &Path) -> Result<()> {
    info!("Running local inference on {:?}", input);

    println!("{}", "Inference Configuration:".cyan().bold());
    println!("  Input:   {:?}", input);
    println!("  Model:   {:?}", model);
    println!("  Labels:  {:?}", labels);
    let backend = select_backend();
    println!("  Backend: {}", backend);
    println!();

    let labels = ClassLabels::load(labels)?;

    println!("{}", "Loading model...".cyan());
    let prediction = match backend {
        ComputeBackend::Cpu => predict_on::<CpuBackend>(input, model, model_config, labels)?,
        #[cfg(feature = "cuda")]
        ComputeBackend::Accelerator => predict_on::<AcceleratorBackend>(input, model, model_config, labels)?,
    };
    println!();
    println!("{}", prediction.display());

    Ok(())
}

fn predict_on<B: Backend>(
    input: &Path,
    model: &Path,
    model_config: Option<&Path>,
    labels: ClassLabels,
) -> Result<Prediction> {
    let predictor = Predictor::<B>::load(model, model_config, labels, Default::default())?;
    Ok(predictor.predict_file(input)?)
}

fn cmd_history(db: &Path, limit: usize) -> Result<()> {
    if !db.exists() {
        warn!("Database not found: {:?}", db);
        println!("{} No predictions stored yet at {:?}", "Note:".yellow(), db);
        return Ok(());
    }

    let store = PredictionStore::open(db)?;
    let records = store.recent(limit)?;

    println!(
        "{}",
        format!("Last {} of {} predictions:", records.len(), store.count()?)
            .cyan()
            .bold()
    );
    for record in &records {
        println!(
            "  #{:<5} {}  {:<32} {:<20} {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.filename,
            record.predicted_class.green(),
            format_percent(record.confidence as f32)
        );
    }

    Ok(())
}
