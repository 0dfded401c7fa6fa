use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::clock::Tempo;
use super::sequence::Sequence;
use super::signal::Signals;

/// Sequences that start together. The pattern is done when every one of
/// them is, and says so by emitting `played_signal` once.
pub struct Pattern {
    id: String,
    played_signal: String,
    sequences: Vec<Arc<Sequence>>,
    signals: Signals,
    started: AtomicBool,
}

impl Pattern {
    pub fn new(signals: &Signals, id: impl Into<String>, played_signal: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            played_signal: played_signal.into(),
            sequences: Vec::new(),
            signals: signals.clone(),
            started: AtomicBool::new(false),
        }
    }

    pub fn add_sequence(&mut self, mut seq: Sequence) {
        seq.set_pattern_id(self.id.clone());
        self.sequences.push(Arc::new(seq));
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn played_signal(&self) -> &str {
        &self.played_signal
    }

    pub fn sequences(&self) -> &[Arc<Sequence>] {
        &self.sequences
    }

    /// True once every member sequence has finished. A pattern holding a
    /// `Forever` sequence never gets here.
    pub fn completed(&self) -> bool {
        self.sequences.iter().all(|s| s.finished())
    }

    /// Starts every sequence and waits for all of them in the background.
    /// Only the first call does anything.
    pub fn play(self: &Arc<Self>, tempo: Tempo) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!(pattern = %self.id, "pattern already played");
            return None;
        }
        let pattern = Arc::clone(self);
        Some(tokio::spawn(async move { pattern.run(tempo).await }))
    }

    async fn run(&self, tempo: Tempo) {
        // armed before anything can finish
        let mut members_done = self.signals.listen(&self.id);

        info!(pattern = %self.id, sequences = self.sequences.len(), bpm = tempo.bpm(), "pattern start");
        for seq in &self.sequences {
            seq.start(tempo, &self.signals);
        }

        // one wake can stand for several sequences finishing, so re-check
        while !self.completed() {
            members_done.wait().await;
            debug!(pattern = %self.id, "member finished, re-checking");
        }

        info!(pattern = %self.id, signal = %self.played_signal, "pattern played");
        self.signals.emit(&self.played_signal);
    }
}
