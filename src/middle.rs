// Turns an arrangement file into live objects. All the name lookups and
// validation happen here, before anything plays; once the song starts
// nothing can fail.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::audio_api::Engine;
use crate::pipeline::clock::Tempo;
use crate::pipeline::lfo::Lfo;
use crate::pipeline::pattern::Pattern;
use crate::pipeline::project::{Arrangement, SampleSpec, SynthSpec, VoiceSpec};
use crate::pipeline::sequence::{Repeat, Sequence, SequenceError};
use crate::pipeline::signal::Signals;
use crate::pipeline::song::Song;
use crate::pipeline::voice::{CutoffRange, Sample, Synth, Voice, SYNTH_AMP_ENV, SYNTH_CUTOFF_ENV};

#[derive(Debug, Error)]
pub enum ArrangementError {
    #[error("tempo {0} bpm is out of range")]
    BadTempo(f64),
    #[error("oscillator '{name}' has ratio {ratio}; it must be a positive number")]
    BadOscillator { name: String, ratio: f64 },
    #[error("voice '{voice}' uses unknown oscillator '{lfo}'")]
    UnknownOscillator { voice: String, lfo: String },
    #[error("pattern '{pattern}' uses unknown voice '{voice}'")]
    UnknownVoice { pattern: String, voice: String },
    #[error("play order names unknown pattern '{0}'")]
    UnknownPattern(String),
    #[error("pattern '{0}' is declared twice")]
    DuplicatePattern(String),
    #[error("pattern '{pattern}', sequence {index}: {source}")]
    BadSequence {
        pattern: String,
        index: usize,
        #[source]
        source: SequenceError,
    },
}

pub struct Middle {
    engine: Arc<dyn Engine>,
    signals: Signals,
}

impl Middle {
    pub fn new(engine: Arc<dyn Engine>, signals: Signals) -> Self {
        Self { engine, signals }
    }

    pub fn build(&self, arrangement: &Arrangement) -> Result<Song, ArrangementError> {
        if !Tempo::is_valid_bpm(arrangement.bpm) {
            return Err(ArrangementError::BadTempo(arrangement.bpm));
        }

        let mut oscillators: HashMap<&str, Lfo> = HashMap::new();
        for (name, spec) in &arrangement.oscillators {
            if !(spec.ratio.is_finite() && spec.ratio > 0.0) {
                return Err(ArrangementError::BadOscillator { name: name.clone(), ratio: spec.ratio });
            }
            oscillators.insert(name.as_str(), Lfo::with_step(spec.step, spec.ratio));
        }

        let mut voices: HashMap<&str, Arc<dyn Voice>> = HashMap::new();
        for (name, spec) in &arrangement.voices {
            let voice = match spec {
                VoiceSpec::Synth(s) => self.synth(name, s, &oscillators)?,
                VoiceSpec::Sample(s) => self.sample(s),
            };
            voices.insert(name.as_str(), voice);
        }

        let mut patterns: HashMap<&str, Arc<Pattern>> = HashMap::new();
        let mut declared = Vec::new();
        for spec in &arrangement.patterns {
            let mut pattern = Pattern::new(&self.signals, spec.id.clone(), spec.played_signal());
            for (index, seq) in spec.sequences.iter().enumerate() {
                let voice = voices.get(seq.voice.as_str()).ok_or_else(|| ArrangementError::UnknownVoice {
                    pattern: spec.id.clone(),
                    voice: seq.voice.clone(),
                })?;
                let sequence = Sequence::from_symbols(voice.clone(), &seq.steps, Repeat::from_count(seq.repeat))
                    .map_err(|source| ArrangementError::BadSequence { pattern: spec.id.clone(), index, source })?;
                pattern.add_sequence(sequence);
            }
            if patterns.insert(spec.id.as_str(), Arc::new(pattern)).is_some() {
                return Err(ArrangementError::DuplicatePattern(spec.id.clone()));
            }
            declared.push(spec.id.as_str());
        }

        let order: Vec<&str> = if arrangement.order.is_empty() {
            declared
        } else {
            arrangement.order.iter().map(String::as_str).collect()
        };
        let ordered = order
            .into_iter()
            .map(|id| patterns.get(id).cloned().ok_or_else(|| ArrangementError::UnknownPattern(id.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(voices = voices.len(), patterns = ordered.len(), "arrangement built");
        Ok(Song {
            tempo: Tempo::new(arrangement.bpm),
            oscillators: oscillators.into_values().collect(),
            patterns: ordered,
            signals: self.signals.clone(),
        })
    }

    fn synth(&self, name: &str, spec: &SynthSpec, oscillators: &HashMap<&str, Lfo>) -> Result<Arc<dyn Voice>, ArrangementError> {
        let mut synth = Synth::new(
            self.engine.clone(),
            spec.instrument.clone(),
            CutoffRange { min: spec.cutoff_min, max: spec.cutoff_max },
            spec.resonance,
        )
        .with_effects(spec.effects.clone());

        if let Some(lfo_name) = &spec.lfo {
            let lfo = oscillators.get(lfo_name.as_str()).ok_or_else(|| ArrangementError::UnknownOscillator {
                voice: name.to_string(),
                lfo: lfo_name.clone(),
            })?;
            synth = synth.with_lfo(lfo.reader());
        }
        if spec.envelope.is_some() || spec.cutoff_envelope.is_some() {
            synth = synth.with_envelope(
                spec.envelope.unwrap_or(SYNTH_AMP_ENV),
                spec.cutoff_envelope.unwrap_or(SYNTH_CUTOFF_ENV),
            );
        }
        if let Some(wave) = spec.wave {
            synth = synth.with_wave(wave);
        }
        Ok(Arc::new(synth))
    }

    fn sample(&self, spec: &SampleSpec) -> Arc<dyn Voice> {
        Arc::new(
            Sample::new(self.engine.clone(), spec.sample.clone())
                .with_envelope(spec.attack, spec.decay, spec.sustain, spec.release)
                .with_amp(spec.amp)
                .with_effects(spec.effects.clone()),
        )
    }
}
