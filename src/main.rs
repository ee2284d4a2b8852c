use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use onnx_digit::{
    config::{
        PreprocessConfig, ResampleFilter, ThresholdChannel, BINARY_THRESHOLD, DEFAULT_MODEL_PATH,
    },
    image::ImageLoader,
    models::OnnxClassifier,
    web::serve,
    Config, DigitPipeline,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onnx-digit")]
#[command(about = "Handwritten digit recognition backed by an ONNX classifier")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:5006", global = true)]
    bind: String,

    /// Number of worker threads
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// ONNX model file
    #[arg(long, default_value = DEFAULT_MODEL_PATH, global = true)]
    model: PathBuf,

    /// Intensity at or above which a canvas pixel counts as stroke
    #[arg(long, default_value_t = BINARY_THRESHOLD, global = true)]
    threshold: u8,

    /// Channel compared against the threshold
    #[arg(long, value_enum, default_value_t = ThresholdChannel::Red, global = true)]
    channel: ThresholdChannel,

    /// Downscaling kernel
    #[arg(long, value_enum, default_value_t = ResampleFilter::Area, global = true)]
    filter: ResampleFilter,

    /// Enable development mode
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Classify a single canvas image and exit
    Predict {
        /// PNG of the canvas, at canvas resolution
        #[arg(long)]
        image: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let preprocess = PreprocessConfig {
        threshold: args.threshold,
        channel: args.channel,
        filter: args.filter,
        ..PreprocessConfig::default()
    };
    let config = Config::new(args.bind, args.model, args.workers, args.dev, preprocess)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config),
        Command::Predict { image } => predict_file(&config, &image),
    }
}

fn run_server(config: Config) -> Result<()> {
    tracing::info!("Starting ONNX digit recognition service...");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Model: {}", config.model_path.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers.max(1))
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(config))?;
    Ok(())
}

fn predict_file(config: &Config, path: &Path) -> Result<()> {
    let pipeline = DigitPipeline::new(config.preprocess.clone())?;
    let classifier = OnnxClassifier::new(config)?;

    let image = ImageLoader::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let bitmap = ImageLoader::to_source_bitmap(image, config.preprocess.canvas_size)?;

    let prediction = pipeline.predict(&classifier, &bitmap)?;

    match prediction.label.index() {
        Some(_) => println!(
            "Predicted digit: {} (confidence {:.1}%)",
            prediction.label,
            prediction.confidence.unwrap_or_default() * 100.0
        ),
        None => println!("No prediction: classifier returned no scores"),
    }

    Ok(())
}
