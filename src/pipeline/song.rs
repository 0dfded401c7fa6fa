use std::sync::Arc;

use tracing::info;

use super::clock::Tempo;
use super::lfo::Lfo;
use super::pattern::Pattern;
use super::signal::Signals;

/// A built arrangement, ready to perform.
pub struct Song {
    pub tempo: Tempo,
    pub oscillators: Vec<Lfo>,
    pub patterns: Vec<Arc<Pattern>>, // in play order
    pub signals: Signals,
}

impl Song {
    /// Plays each pattern after the previous one has signalled it's done.
    /// Returns once the last pattern has played; a pattern that loops
    /// forever keeps the song on it until the process exits.
    pub async fn perform(&self) {
        let _lfo_tasks: Vec<_> = self.oscillators.iter().map(Lfo::start).collect();

        for pattern in &self.patterns {
            let played = self.signals.wait(pattern.played_signal());
            if pattern.play(self.tempo).is_none() {
                // already played elsewhere, don't wait on a signal that's gone
                continue;
            }
            played.await;
        }
        info!(patterns = self.patterns.len(), "song finished");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pipeline::sequence::{Repeat, Sequence};
    use crate::pipeline::test_fixture::RecordingEngine;
    use crate::pipeline::voice::{Sample, Voice};

    fn pattern(signals: &Signals, engine: &Arc<RecordingEngine>, id: &str, steps: &[&str], repeat: Repeat) -> Arc<Pattern> {
        let voice: Arc<dyn Voice> = Arc::new(Sample::new(engine.clone(), id));
        let mut p = Pattern::new(signals, id, format!("{}_played", id));
        p.add_sequence(Sequence::from_symbols(voice, steps, repeat).unwrap());
        Arc::new(p)
    }

    #[tokio::test(start_paused = true)]
    async fn patterns_play_back_to_back() {
        let engine = Arc::new(RecordingEngine::default());
        let signals = Signals::new();
        let song = Song {
            tempo: Tempo::new(120.0),
            oscillators: vec![Lfo::new(0.5)],
            patterns: vec![
                pattern(&signals, &engine, "a", &["x", "q"], Repeat::Times(4)),
                pattern(&signals, &engine, "b", &["x", "h"], Repeat::Times(2)),
            ],
            signals: signals.clone(),
        };
        song.perform().await;

        let ms = |v: Vec<Duration>| v.into_iter().map(|d| d.as_millis()).collect::<Vec<_>>();
        assert_eq!(ms(engine.samples("a")), vec![0, 500, 1000, 1500]);
        assert_eq!(ms(engine.samples("b")), vec![2000, 3000]);
        assert_eq!(signals.emitted("a_played"), 1);
        assert_eq!(signals.emitted("b_played"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ratio_lfo_does_not_stall_the_clock() {
        let engine = Arc::new(RecordingEngine::default());
        let signals = Signals::new();
        let song = Song {
            tempo: Tempo::default(),
            oscillators: vec![Lfo::new(0.0)],
            patterns: vec![pattern(&signals, &engine, "k", &["x", "q"], Repeat::Times(2))],
            signals,
        };
        tokio::time::timeout(Duration::from_secs(10), song.perform()).await.unwrap();
        assert_eq!(engine.samples("k"), vec![Duration::ZERO, Duration::from_secs(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn looping_pattern_holds_the_song() {
        let engine = Arc::new(RecordingEngine::default());
        let signals = Signals::new();
        let song = Song {
            tempo: Tempo::default(),
            oscillators: vec![],
            patterns: vec![
                pattern(&signals, &engine, "loop", &["x", "q"], Repeat::Forever),
                pattern(&signals, &engine, "never", &["x", "q"], Repeat::Times(1)),
            ],
            signals,
        };
        let held = tokio::time::timeout(Duration::from_secs(1_000), song.perform()).await;
        assert!(held.is_err());
        assert!(engine.samples("never").is_empty());
        assert!(engine.samples("loop").len() >= 1_000);
    }
}
