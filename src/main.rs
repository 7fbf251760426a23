//! handsign - replay recorded hand landmarks and dispatch gesture actions.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use handsign::hand::GestureClassifier;
use handsign::host::{self, ActionMode, FrameReader};
use handsign::{DispatchLoop, HandsignConfig};

#[derive(Parser, Debug)]
#[command(name = "handsign", about = "Hand gesture recognition and action dispatch")]
struct Cli {
    /// Recorded landmark frames, one s-expression per line
    #[arg(long, required_unless_present = "print_config")]
    frames: Option<PathBuf>,

    /// Config file (s-expression plist)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum milliseconds between two dispatched actions
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Thumb-to-index distance below which the hand reads as OK
    #[arg(long)]
    ok_pinch_threshold: Option<f32>,

    /// Index-to-pinky spread above which an open hand reads as a wave
    #[arg(long)]
    wave_spread_threshold: Option<f32>,

    /// Log bound actions instead of running their commands
    #[arg(long)]
    dry_run: bool,

    /// Run commands on worker threads instead of blocking the loop
    #[arg(long)]
    detach: bool,

    /// Print the active configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<HandsignConfig> {
        let mut config = match &self.config {
            Some(path) => HandsignConfig::load(path)?,
            None => HandsignConfig::default(),
        };
        if let Some(ms) = self.cooldown_ms {
            config.cooldown = Duration::from_millis(ms);
        }
        if let Some(t) = self.ok_pinch_threshold {
            config.classifier.ok_pinch_threshold = t;
        }
        if let Some(t) = self.wave_spread_threshold {
            config.classifier.wave_spread_threshold = t;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handsign=info".into()),
        )
        .init();

    let config = cli.resolve_config()?;
    if cli.print_config {
        println!("{}", config.config_sexp());
        return Ok(());
    }

    info!("handsign v{} starting", env!("CARGO_PKG_VERSION"));
    info!("config: {}", config.config_sexp());

    let mode = ActionMode {
        dry_run: cli.dry_run,
        detach: cli.detach,
    };
    let registry = host::build_registry(&config, mode);
    let mut dispatch = DispatchLoop::new(
        GestureClassifier::new(config.classifier.clone()),
        registry,
        config.cooldown,
    );

    let frames = cli.frames.as_ref().context("--frames is required")?;
    let file = File::open(frames)
        .with_context(|| format!("opening frames {}", frames.display()))?;
    let base = Instant::now();
    let result = host::replay(FrameReader::new(BufReader::new(file)), &mut dispatch, base);
    dispatch.stop();

    info!("status: {}", dispatch.status_sexp(Instant::now()));
    result.map(|_| ())
}
