use std::thread::JoinHandle;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::warn;

use crate::audio_api::{
    Engine, EngineCommand, FxScope, InstrumentTrigger, SampleParams, SampleTrigger, SynthParams,
};
use crate::pipeline::clock::Transport;
use crate::shared::Pitch;

mod effect;
mod engine;

pub use effect::EffectSpec;
pub use engine::TriggerRecord;

use engine::Journal;

const QUEUE_DEPTH: usize = 1024;

// What the voices hold. Cloning just clones the sender.
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<EngineCommand>,
    transport: Transport,
    lossless: bool,
}

impl EngineHandle {
    pub fn send(&self, cmd: EngineCommand) {
        if self.lossless {
            // simulated clock: waiting on the sink costs no musical time
            let _ = self.tx.send(cmd);
            return;
        }
        // live: never block a sequence on the sink; a dropped note beats a late one
        if let Err(TrySendError::Full(_)) = self.tx.try_send(cmd) {
            warn!("engine queue full, dropping trigger");
        }
    }
}

impl Engine for EngineHandle {
    fn trigger_instrument(&self, fx: &FxScope, instrument: &str, pitch: Pitch, params: &SynthParams) {
        self.send(EngineCommand::PlayInstrument(InstrumentTrigger {
            at: self.transport.position(),
            instrument: instrument.to_string(),
            pitch,
            params: params.clone(),
            effect_chain: fx.chain().to_vec(),
        }));
    }

    fn trigger_sample(&self, fx: &FxScope, name: &str, params: &SampleParams) {
        self.send(EngineCommand::PlaySample(SampleTrigger {
            at: self.transport.position(),
            sample: name.to_string(),
            params: params.clone(),
            effect_chain: fx.chain().to_vec(),
        }));
    }
}

// Owned by main; closes the journal and hands back what was played.
pub struct SinkHandle {
    tx: Sender<EngineCommand>,
    thread: JoinHandle<Vec<TriggerRecord>>,
}

impl SinkHandle {
    pub fn finish(self) -> anyhow::Result<Vec<TriggerRecord>> {
        // blocking send: shutdown must not be dropped on a full queue
        let _ = self.tx.send(EngineCommand::Shutdown);
        self.thread
            .join()
            .map_err(|_| anyhow::anyhow!("engine journal thread panicked"))
    }
}

/// `lossless` makes sends wait for room instead of dropping; only use it
/// when the clock is simulated. Triggers are handed back by
/// [`SinkHandle::finish`] only when `keep_log` is set; otherwise they are
/// logged and forgotten, so a piece that loops forever runs in constant memory.
pub fn start_engine(
    transport: Transport,
    lossless: bool,
    keep_log: bool,
) -> anyhow::Result<(EngineHandle, SinkHandle)> {
    let (tx, rx) = crossbeam_channel::bounded::<EngineCommand>(QUEUE_DEPTH);

    let thread = std::thread::Builder::new()
        .name("ostinato-engine".into())
        .spawn(move || run_journal(rx, keep_log))
        .context("failed to spawn engine thread")?;

    Ok((
        EngineHandle { tx: tx.clone(), transport, lossless },
        SinkHandle { tx, thread },
    ))
}

fn run_journal(rx: Receiver<EngineCommand>, keep_log: bool) -> Vec<TriggerRecord> {
    let mut journal = Journal::new(keep_log);
    // recv errors once every sender is gone, which also ends the journal
    while let Ok(cmd) = rx.recv() {
        if !journal.handle_cmd(cmd) {
            break;
        }
    }
    journal.into_records()
}
