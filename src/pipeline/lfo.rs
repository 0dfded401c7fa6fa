use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tracing::debug;

use super::clock::TaskClock;
use super::ring::Ring;

pub const DEFAULT_STEP: f64 = 0.1;
// shortest time a value is held; a zero hold would never yield to the clock
const MIN_HOLD_BEATS: f64 = 0.001;

/// Low-frequency oscillator sweeping [-1, 1] back and forth.
///
/// One background task writes the current value; any number of voices read
/// it. The value lives in a single atomic so a read never waits on the
/// writer (last write wins).
pub struct Lfo {
    step: f64,
    ratio: f64,
    value: LfoReader,
}

/// Read side of an [`Lfo`], cheap to clone into voices.
#[derive(Clone, Debug)]
pub struct LfoReader(Arc<AtomicU64>);

impl LfoReader {
    fn new(initial: f64) -> Self {
        Self(Arc::new(AtomicU64::new(initial.to_bits())))
    }

    pub fn read(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn write(&self, v: f64) {
        self.0.store(v.clamp(-1.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

impl Lfo {
    /// `ratio` scales how long each table value is held: the loop sleeps
    /// `step * ratio` beats at the default tempo (one beat per second).
    pub fn new(ratio: f64) -> Self {
        Self::with_step(DEFAULT_STEP, ratio)
    }

    pub fn with_step(step: f64, ratio: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 { step.min(2.0) } else { DEFAULT_STEP };
        Self {
            step,
            ratio: if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 },
            value: LfoReader::new(-1.0),
        }
    }

    pub fn read(&self) -> f64 {
        self.value.read()
    }

    pub fn reader(&self) -> LfoReader {
        self.value.clone()
    }

    /// Runs until the runtime goes away.
    pub fn start(&self) -> JoinHandle<()> {
        let mut table = Ring::new(mirror_table(self.step));
        let hold = (self.step * self.ratio).max(MIN_HOLD_BEATS);
        let value = self.value.clone();
        debug!(step = self.step, ratio = self.ratio, len = table.len(), "lfo start");

        tokio::spawn(async move {
            let clock = TaskClock::default();
            loop {
                value.write(*table.tick());
                clock.sleep_beats(hold).await;
            }
        })
    }
}

// -1 up to 1 and back down again, each end appearing once per lap:
// -1, -0.9 .. 0.9, 1, 0.9 .. -0.9, (then -1 again)
fn mirror_table(step: f64) -> Vec<f64> {
    let n = ((2.0 / step).round() as usize).max(1);
    let at = |i: usize| -1.0 + 2.0 * i as f64 / n as f64;
    let up = (0..=n).map(at);
    let down = (1..n).rev().map(at);
    up.chain(down).collect()
}
