use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::shared::{Event, NoteLength, Step};

use super::clock::{TaskClock, Tempo};
use super::ring::Ring;
use super::signal::Signals;
use super::voice::Voice;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("step list is empty")]
    Empty,
    #[error("step list has {0} entries; it must alternate event and length, so needs an even count")]
    OddLength(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    Times(u32),
    Forever,
}

impl Repeat {
    // positive counts are bounded, anything else loops until shutdown
    pub fn from_count(count: i64) -> Self {
        if count > 0 {
            Repeat::Times(count.min(u32::MAX as i64) as u32)
        } else {
            Repeat::Forever
        }
    }
}

/// One voice stepping through a ring of (event, length) pairs.
pub struct Sequence {
    voice: Arc<dyn Voice>,
    steps: Vec<Step>,
    repeat: Repeat,
    pattern_id: Option<String>,
    started: AtomicBool,
    finished: AtomicBool,
    rendered: AtomicU64,
}

impl Sequence {
    /// Builds from already-paired steps, so there is no odd-length case to
    /// reject here: each step is one (event, length) pair and a bounded run
    /// is `repeats * steps.len()` renders. Only an empty list is an error.
    pub fn new(voice: Arc<dyn Voice>, steps: Vec<Step>, repeat: Repeat) -> Result<Self, SequenceError> {
        if steps.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Self {
            voice,
            steps,
            repeat,
            pattern_id: None,
            started: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            rendered: AtomicU64::new(0),
        })
    }

    /// Builds from the flat written form: event, length, event, length, ...
    pub fn from_symbols<S: AsRef<str>>(voice: Arc<dyn Voice>, symbols: &[S], repeat: Repeat) -> Result<Self, SequenceError> {
        if symbols.len() % 2 != 0 {
            return Err(SequenceError::OddLength(symbols.len()));
        }
        let steps = symbols
            .chunks_exact(2)
            .map(|pair| Step::new(Event::parse(pair[0].as_ref()), NoteLength::parse(pair[1].as_ref())))
            .collect();
        Self::new(voice, steps, repeat)
    }

    /// Set by the owning pattern; completion is announced under this name.
    pub fn set_pattern_id(&mut self, id: impl Into<String>) {
        self.pattern_id = Some(id.into());
    }

    pub fn pattern_id(&self) -> Option<&str> {
        self.pattern_id.as_deref()
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Number of steps played so far (rests included).
    pub fn rendered(&self) -> u64 {
        self.rendered.load(Ordering::Relaxed)
    }

    // note-steps a bounded run takes: repetitions * list length / 2
    pub fn total_steps(&self) -> Option<u64> {
        match self.repeat {
            Repeat::Times(n) => Some(n as u64 * self.steps.len() as u64),
            Repeat::Forever => None,
        }
    }

    /// Starts the background task. A sequence only ever starts once.
    pub fn start(self: &Arc<Self>, tempo: Tempo, signals: &Signals) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!(pattern = ?self.pattern_id, "sequence already started");
            return None;
        }
        let seq = Arc::clone(self);
        let signals = signals.clone();
        Some(tokio::spawn(async move { seq.run(tempo, signals).await }))
    }

    async fn run(&self, tempo: Tempo, signals: Signals) {
        let mut clock = TaskClock::default();
        clock.set_tempo(tempo);
        // the cursor is private to this task
        let mut ring = Ring::new(self.steps.clone());

        match self.total_steps() {
            None => loop {
                self.play_next(&mut ring, &clock).await;
            },
            Some(total) => {
                for _ in 0..total {
                    self.play_next(&mut ring, &clock).await;
                }
                self.finished.store(true, Ordering::Release);
                debug!(pattern = ?self.pattern_id, steps = total, "sequence finished");
                if let Some(id) = &self.pattern_id {
                    signals.emit(id);
                }
            }
        }
    }

    async fn play_next(&self, ring: &mut Ring<Step>, clock: &TaskClock) {
        let step = *ring.tick();
        self.voice.render(&step.event);
        self.rendered.fetch_add(1, Ordering::Relaxed);
        clock.sleep_beats(step.length.beats()).await;
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("steps", &self.steps.len())
            .field("repeat", &self.repeat)
            .field("pattern_id", &self.pattern_id)
            .field("finished", &self.finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::pipeline::test_fixture::RecordingEngine;
    use crate::pipeline::voice::{CutoffRange, Sample, Synth};
    use crate::shared::Pitch;

    #[derive(Default)]
    struct Tally {
        events: Mutex<Vec<Event>>,
    }

    impl Voice for Tally {
        fn render(&self, event: &Event) {
            self.events.lock().unwrap().push(*event);
        }
    }

    #[test]
    fn repeat_sentinel() {
        assert_eq!(Repeat::from_count(4), Repeat::Times(4));
        assert_eq!(Repeat::from_count(0), Repeat::Forever);
        assert_eq!(Repeat::from_count(-1), Repeat::Forever);
        assert_eq!(Repeat::from_count(i64::MAX), Repeat::Times(u32::MAX));
    }

    #[test]
    fn odd_or_empty_lists_are_rejected() {
        let voice: Arc<dyn Voice> = Arc::new(Tally::default());
        assert_eq!(
            Sequence::from_symbols(voice.clone(), &["x", "q", "o"], Repeat::Times(1)).unwrap_err(),
            SequenceError::OddLength(3)
        );
        let empty: [&str; 0] = [];
        assert_eq!(
            Sequence::from_symbols(voice, &empty, Repeat::Forever).unwrap_err(),
            SequenceError::Empty
        );
    }

    #[test]
    fn total_steps_is_repeats_times_half_the_list() {
        let voice: Arc<dyn Voice> = Arc::new(Tally::default());
        let symbols = ["x", "e", "o", "e", "x", "e", "o", "e"];
        let seq = Sequence::from_symbols(voice.clone(), &symbols, Repeat::Times(8)).unwrap();
        assert_eq!(seq.total_steps(), Some(32));
        let seq = Sequence::from_symbols(voice, &symbols, Repeat::Forever).unwrap();
        assert_eq!(seq.total_steps(), None);
    }

    #[test]
    fn paired_steps_count_one_render_each() {
        let voice: Arc<dyn Voice> = Arc::new(Tally::default());
        let steps = vec![
            Step::new(Event::Hit, NoteLength::Quarter),
            Step::new(Event::Rest, NoteLength::Eighth),
            Step::new(Event::Ghost, NoteLength::Eighth),
        ];
        let seq = Sequence::new(voice.clone(), steps, Repeat::Times(3)).unwrap();
        assert_eq!(seq.total_steps(), Some(9));
        assert_eq!(Sequence::new(voice, Vec::new(), Repeat::Times(1)).unwrap_err(), SequenceError::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_run_renders_exactly_r_times_l_over_2() {
        let tally = Arc::new(Tally::default());
        let signals = Signals::new();
        let mut seq = Sequence::from_symbols(tally.clone(), &["a2", "e", "c3", "s", "none", "e."], Repeat::Times(5)).unwrap();
        seq.set_pattern_id("riff");
        let seq = Arc::new(seq);

        let mut done = signals.listen("riff");
        seq.start(Tempo::new(120.0), &signals).unwrap().await.unwrap();
        done.wait().await;

        assert_eq!(tally.events.lock().unwrap().len(), 15);
        assert_eq!(seq.rendered(), 15);
        assert!(seq.finished());
        assert_eq!(signals.emitted("riff"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn next_note_waits_for_the_previous_length() {
        let engine = Arc::new(RecordingEngine::default());
        let kick = Arc::new(Sample::new(engine.clone(), "kick"));
        // at 60 bpm: hits at 0, 1 (after a quarter), 3 (after a half)
        let seq = Arc::new(Sequence::from_symbols(kick, &["x", "q", "x", "h", "x", "w"], Repeat::Times(1)).unwrap());
        seq.start(Tempo::default(), &Signals::new()).unwrap().await.unwrap();
        assert_eq!(
            engine.samples("kick"),
            vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(3)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_length_lasts_one_beat() {
        let engine = Arc::new(RecordingEngine::default());
        let kick = Arc::new(Sample::new(engine.clone(), "kick"));
        let seq = Arc::new(Sequence::from_symbols(kick, &["x", "bogus"], Repeat::Times(3)).unwrap());
        seq.start(Tempo::default(), &Signals::new()).unwrap().await.unwrap();
        assert_eq!(
            engine.samples("kick"),
            vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn without_pattern_id_nothing_is_emitted() {
        let tally = Arc::new(Tally::default());
        let signals = Signals::new();
        let seq = Arc::new(Sequence::from_symbols(tally, &["x", "q"], Repeat::Times(2)).unwrap());
        seq.start(Tempo::default(), &signals).unwrap().await.unwrap();
        assert!(seq.finished());
        assert!(seq.pattern_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored() {
        let tally = Arc::new(Tally::default());
        let signals = Signals::new();
        let seq = Arc::new(Sequence::from_symbols(tally.clone(), &["x", "q"], Repeat::Times(2)).unwrap());
        let first = seq.start(Tempo::default(), &signals).unwrap();
        assert!(seq.start(Tempo::default(), &signals).is_none());
        first.await.unwrap();
        assert_eq!(tally.events.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn forever_never_finishes() {
        let tally = Arc::new(Tally::default());
        let signals = Signals::new();
        let mut seq = Sequence::from_symbols(tally.clone(), &["x", "s"], Repeat::Forever).unwrap();
        seq.set_pattern_id("loop");
        let seq = Arc::new(seq);
        let _task = seq.start(Tempo::default(), &signals).unwrap();

        // 10_000 beats of sixteenths
        tokio::time::sleep(Duration::from_secs(10_000)).await;
        assert!(!seq.finished());
        assert!(seq.rendered() >= 40_000);
        assert_eq!(signals.emitted("loop"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_voice_keeps_streams_apart() {
        let engine = Arc::new(RecordingEngine::default());
        let synth: Arc<dyn Voice> = Arc::new(Synth::new(engine.clone(), "tb303", CutoffRange { min: 70.0, max: 130.0 }, 0.9));

        // different note sets, overlapping rhythms
        let low = Arc::new(Sequence::from_symbols(synth.clone(), &["a2", "e", "c3", "s", "d3", "e."], Repeat::Times(6)).unwrap());
        let high = Arc::new(Sequence::from_symbols(synth, &["a4", "s", "e5", "s", "g5", "e"], Repeat::Times(6)).unwrap());
        let signals = Signals::new();
        let a = low.start(Tempo::new(100.0), &signals).unwrap();
        let b = high.start(Tempo::new(100.0), &signals).unwrap();
        a.await.unwrap();
        b.await.unwrap();

        let notes = engine.notes();
        let low_set = [Pitch(45), Pitch(48), Pitch(50)];
        let (lows, highs): (Vec<Pitch>, Vec<Pitch>) = notes.into_iter().partition(|p| low_set.contains(p));
        assert_eq!(lows, low_set.repeat(6));
        assert_eq!(highs, [Pitch(69), Pitch(76), Pitch(79)].repeat(6));
    }
}
