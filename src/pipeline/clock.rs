//! Beat time on top of the tokio timer.
//!
//! Every task owns a [`TaskClock`] carrying its tempo; the tempo is set when
//! the task starts and isn't shared afterwards. All tasks sleep against the
//! same runtime clock, so running the runtime with a paused clock turns the
//! whole arrangement into an instant, sample-exact offline render.

use std::time::Duration;

use tokio::time::Instant;

pub const MIN_BPM: f64 = 1.0;
pub const MAX_BPM: f64 = 999.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tempo(f64);

impl Tempo {
    /// Out-of-range (or NaN) tempos are clamped rather than rejected; use
    /// [`Tempo::is_valid_bpm`] first if the caller wants to complain.
    pub fn new(bpm: f64) -> Self {
        if bpm.is_nan() {
            return Self::default();
        }
        Self(bpm.clamp(MIN_BPM, MAX_BPM))
    }

    pub fn is_valid_bpm(bpm: f64) -> bool {
        (MIN_BPM..=MAX_BPM).contains(&bpm)
    }

    pub fn bpm(self) -> f64 {
        self.0
    }

    pub fn beats(self, beats: f64) -> Duration {
        Duration::from_secs_f64((beats.max(0.0) * 60.0) / self.0)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo(60.0) // one beat per second
    }
}

/// Per-task tempo context.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskClock {
    tempo: Tempo,
}

impl TaskClock {
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    pub async fn sleep_beats(&self, beats: f64) {
        tokio::time::sleep(self.tempo.beats(beats)).await;
    }
}

/// Where the shared clock started; the engine stamps triggers with it.
#[derive(Clone, Copy, Debug)]
pub struct Transport {
    origin: Instant,
}

impl Transport {
    pub fn start() -> Self {
        Self { origin: Instant::now() }
    }

    pub fn position(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }
}
