use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use power_hour::{
    composition::{CompositionEngine, Job},
    config::Config,
    media::FfmpegEngine,
    PowerHourError,
};

const DEFAULT_SOURCE_FOLDER: &str = "source_video";
const DEFAULT_CONFIG_PATH: &str = "power_hour.cfg";
const DEFAULT_TRANSITION_FILE_PATH: &str = "transition.avi";
const DEFAULT_OUTFILE: &str = "out.avi";

#[derive(Parser)]
#[command(
    name = "power-hour",
    version,
    about = "Assemble a power hour compilation video",
    long_about = "Power Hour cuts every video in a folder down to one minute of program time, plays a numbered transition before each one and overlays the clip number and name."
)]
struct Cli {
    /// Path to directory with videos
    #[arg(long, default_value = DEFAULT_SOURCE_FOLDER)]
    source: PathBuf,

    /// Path to start override config (default: power_hour.cfg, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to transition file
    #[arg(long, default_value = DEFAULT_TRANSITION_FILE_PATH)]
    transition: PathBuf,

    /// Path to output file
    #[arg(long, default_value = DEFAULT_OUTFILE)]
    out: PathBuf,

    /// Video width (default: 1280)
    #[arg(long)]
    width: Option<u32>,

    /// Video height (default: 720)
    #[arg(long)]
    height: Option<u32>,

    /// Config delimiter (default: |)
    #[arg(long)]
    delimiter: Option<char>,

    /// Render/timing/overlay settings file (TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print the assembled timeline without rendering
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<PowerHourError>() {
            Some(power_hour_error) => {
                error!("{}", power_hour_error);
                eprintln!("error: {}", power_hour_error.user_message());
                ExitCode::from(power_hour_error.exit_code() as u8)
            }
            None => {
                error!("{:#}", err);
                eprintln!("error: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting Power Hour v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.settings {
        Some(settings_path) => {
            info!("Loading settings from {:?}", settings_path);
            Config::from_file(settings_path)?
        }
        None => Config::default(),
    };
    if let Some(width) = cli.width {
        config.output.width = width;
    }
    if let Some(height) = cli.height {
        config.output.height = height;
    }
    if let Some(delimiter) = cli.delimiter {
        config.overrides.delimiter = delimiter;
    }
    config.validate()?;

    let overrides = cli.config.clone().or_else(|| {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        default_path.is_file().then(|| default_path.to_path_buf())
    });

    let job = Job {
        source_dir: cli.source,
        overrides,
        transition: cli.transition,
        output: cli.out,
    };

    let media = FfmpegEngine::new(&config.tools);
    let engine = CompositionEngine::new(config, media);

    if cli.dry_run {
        let timeline = engine.plan(&job)?;
        println!("{}", timeline);
        return Ok(());
    }

    engine.engine().check_available()?;
    let report = engine.compose(&job).await?;

    info!(
        "Composition complete! Output saved to: {:?} at {}",
        report.path,
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}
