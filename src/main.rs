mod audio;
mod audio_api;
mod middle;
mod pipeline;
mod shared;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use middle::Middle;
use pipeline::clock::{Tempo, Transport};
use pipeline::persistence;
use pipeline::project::Arrangement;
use pipeline::signal::Signals;

/// Plays an arrangement of patterns against a shared tempo.
#[derive(Parser, Debug)]
#[command(name = "ostinato", version)]
struct Cli {
    /// Arrangement file (JSON). Plays the built-in demo when omitted.
    arrangement: Option<PathBuf>,

    /// Override the arrangement's tempo
    #[arg(short, long)]
    bpm: Option<f64>,

    /// Render as fast as possible on a simulated clock instead of in real time
    #[arg(long)]
    offline: bool,

    /// Write every trigger, with its time, to this JSON file
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Stop after this many seconds of transport time (handy with --offline
    /// when a pattern loops forever)
    #[arg(long)]
    until: Option<f64>,

    /// Write the arrangement being played to this file and exit
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut arrangement = match &cli.arrangement {
        Some(path) => persistence::load_arrangement(path)?,
        None => Arrangement::demo(),
    };
    if let Some(bpm) = cli.bpm {
        anyhow::ensure!(Tempo::is_valid_bpm(bpm), "--bpm {} is out of range", bpm);
        arrangement.bpm = bpm;
    }
    if let Some(secs) = cli.until {
        anyhow::ensure!(secs.is_finite() && secs >= 0.0, "--until {} is not a time", secs);
    }
    if let Some(path) = &cli.dump {
        return persistence::save_arrangement(path, &arrangement);
    }

    // one thread, cooperative tasks; paused means the clock jumps straight
    // to the next deadline whenever every task is asleep
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(cli.offline)
        .build()
        .context("failed to build runtime")?;

    let sink = runtime.block_on(async {
        let transport = Transport::start();
        let (engine, sink) = audio::start_engine(transport, cli.offline, cli.log.is_some())?;
        let signals = Signals::new();
        let song = Middle::new(Arc::new(engine), signals).build(&arrangement)?;

        info!(bpm = song.tempo.bpm(), patterns = song.patterns.len(), offline = cli.offline, "performing");
        let time_limit = async {
            match cli.until {
                Some(secs) => tokio::time::sleep(Duration::from_secs_f64(secs)).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = song.perform() => info!(at = ?transport.position(), "done"),
            _ = time_limit => info!(at = ?transport.position(), "time limit reached"),
            _ = tokio::signal::ctrl_c() => info!(at = ?transport.position(), "interrupted"),
        }
        anyhow::Ok(sink)
    })?;
    // tears down the lfo and any still-looping sequences
    drop(runtime);

    let records = sink.finish()?;
    if let Some(path) = &cli.log {
        persistence::save_trigger_log(path, &records)?;
    }
    Ok(())
}
