use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use quilt_wm::common::config::{Config, config_file, restore_file};
use quilt_wm::common::log::init_logging;
use quilt_wm::model::persist;
use quilt_wm::model::quirks::QuirkRegistry;
use quilt_wm::model::store::Store;
use quilt_wm::pickers::DebugDescription;
use quilt_wm::reactor::Reactor;
use quilt_wm::sys::fake::FakePlatform;
use quilt_wm::sys::gateway::NativeEvent;

#[derive(Parser, Debug)]
#[command(name = "quilt", version, about = "Tiling window manager core")]
struct Cli {
    /// Config file path. Defaults to ~/.quilt.toml.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Check the configuration and exit.
    #[arg(long)]
    validate: bool,

    /// Replay a recorded event trace (RON, a list of native events) against
    /// the in-memory platform and print the resulting state.
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    std::panic::set_hook(Box::new(|info| {
        error!("panic: {info}");
        std::process::exit(1);
    }));
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config_file);
    let config = if config_path.exists() {
        Config::read(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else {
        info!(path = %config_path.display(), "no config file, using defaults");
        Config::default()
    };
    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("config: {problem}");
        }
        anyhow::bail!("{} configuration problem(s)", problems.len());
    }
    if cli.validate {
        println!("configuration ok");
        return Ok(());
    }

    let Some(trace_path) = cli.replay else {
        // The native backend lives in its own crate and drives
        // `Reactor::run` with a real event source.
        anyhow::bail!("no platform backend in this build; use --replay or --validate");
    };

    let trace = fs::read_to_string(&trace_path)
        .with_context(|| format!("reading {}", trace_path.display()))?;
    let events: Vec<NativeEvent> =
        ron::from_str(&trace).with_context(|| format!("parsing {}", trace_path.display()))?;

    let fake = Arc::new(FakePlatform::with_single_monitor());
    let store = Store::new(fake, config)?;
    let mut reactor = Reactor::new(store, QuirkRegistry::with_defaults(), CancellationToken::new());
    reactor.replay(events);

    print!("{}", reactor.store().pick(DebugDescription)?);
    let snapshot = reactor.store().capture_layout();
    let restore = restore_file();
    persist::save(&restore, &snapshot)?;
    info!(path = %restore.display(), "layout snapshot written");
    Ok(())
}
