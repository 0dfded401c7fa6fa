use std::fmt;
use std::sync::Arc;

use crate::audio_api::{EffectSpec, Engine, Envelope, FxBody, FxScope, SampleParams, SynthParams, Waveform};
use crate::shared::{Event, Pitch};

use super::lfo::LfoReader;

/// Anything a sequence can play through.
pub trait Voice: Send + Sync {
    fn render(&self, event: &Event);
}

// Wraps `trigger` in `effects`, first entry outermost, and runs the lot.
fn play_through_fx<'a>(engine: &'a dyn Engine, effects: &'a [EffectSpec], trigger: FxBody<'a>) {
    let chain = effects.iter().rev().fold(trigger, |inner, effect| -> FxBody<'a> {
        Box::new(move |fx: &mut FxScope| engine.with_effect(fx, effect, inner))
    });
    chain(&mut FxScope::default());
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutoffRange {
    pub min: f64,
    pub max: f64,
}

impl CutoffRange {
    // lfo value in [-1, 1] -> [min, max]
    pub fn at(&self, lfo: f64) -> f64 {
        self.min + (lfo + 1.0) * 0.5 * (self.max - self.min)
    }
}

// a short plucky acid envelope, with the filter opening a touch later
pub const SYNTH_AMP_ENV: Envelope = Envelope { attack: 0.0, decay: 0.25, sustain: 0.0, sustain_level: 0.0, release: 0.0 };
pub const SYNTH_CUTOFF_ENV: Envelope = Envelope { attack: 0.1, decay: 0.2, sustain: 0.0, sustain_level: 0.0, release: 0.0 };

/// A pitched voice. Notes play, everything else (rests included) is silent.
pub struct Synth {
    engine: Arc<dyn Engine>,
    instrument: String,
    lfo: Option<LfoReader>,
    cutoff: CutoffRange,
    params: SynthParams,
    effects: Vec<EffectSpec>,
}

impl Synth {
    pub fn new(engine: Arc<dyn Engine>, instrument: impl Into<String>, cutoff: CutoffRange, resonance: f64) -> Self {
        Self {
            engine,
            instrument: instrument.into(),
            lfo: None,
            cutoff,
            params: SynthParams {
                amp: SYNTH_AMP_ENV,
                cutoff_env: SYNTH_CUTOFF_ENV,
                // with no lfo attached the cutoff sits mid-range
                cutoff: cutoff.at(0.0),
                resonance,
                wave: Waveform::Square,
            },
            effects: Vec::new(),
        }
    }

    pub fn with_lfo(mut self, lfo: LfoReader) -> Self {
        self.lfo = Some(lfo);
        self
    }

    pub fn with_envelope(mut self, amp: Envelope, cutoff_env: Envelope) -> Self {
        self.params.amp = amp;
        self.params.cutoff_env = cutoff_env;
        self
    }

    pub fn with_wave(mut self, wave: Waveform) -> Self {
        self.params.wave = wave;
        self
    }

    pub fn with_effects(mut self, effects: Vec<EffectSpec>) -> Self {
        self.effects = effects;
        self
    }

    fn current_params(&self) -> SynthParams {
        let mut params = self.params.clone();
        if let Some(lfo) = &self.lfo {
            params.cutoff = self.cutoff.at(lfo.read());
        }
        params
    }

    fn play(&self, pitch: Pitch) {
        let params = self.current_params();
        let engine = self.engine.as_ref();
        let instrument = self.instrument.as_str();
        play_through_fx(
            engine,
            &self.effects,
            Box::new(move |fx: &mut FxScope| engine.trigger_instrument(fx, instrument, pitch, &params)),
        );
    }
}

impl Voice for Synth {
    fn render(&self, event: &Event) {
        if let Event::Note(pitch) = event {
            self.play(*pitch);
        }
    }
}

impl fmt::Debug for Synth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synth")
            .field("instrument", &self.instrument)
            .field("cutoff", &self.cutoff)
            .field("lfo", &self.lfo.is_some())
            .field("effects", &self.effects)
            .finish()
    }
}

/// A one-shot sample. Only a hit (`x`) sounds.
pub struct Sample {
    engine: Arc<dyn Engine>,
    name: String,
    params: SampleParams,
    effects: Vec<EffectSpec>,
}

pub const SAMPLE_AMP: f64 = 2.0;

impl Sample {
    pub fn new(engine: Arc<dyn Engine>, name: impl Into<String>) -> Self {
        Self {
            engine,
            name: name.into(),
            params: SampleParams { attack: 0.0, decay: 0.0, sustain_level: 1.0, release: 1.0, amp: SAMPLE_AMP },
            effects: Vec::new(),
        }
    }

    pub fn with_envelope(mut self, attack: f64, decay: f64, sustain_level: f64, release: f64) -> Self {
        self.params.attack = attack;
        self.params.decay = decay;
        self.params.sustain_level = sustain_level;
        self.params.release = release;
        self
    }

    pub fn with_amp(mut self, amp: f64) -> Self {
        self.params.amp = amp;
        self
    }

    pub fn with_effects(mut self, effects: Vec<EffectSpec>) -> Self {
        self.effects = effects;
        self
    }
}

impl Voice for Sample {
    fn render(&self, event: &Event) {
        if *event != Event::Hit {
            return;
        }
        let engine = self.engine.as_ref();
        let name = self.name.as_str();
        let params = &self.params;
        play_through_fx(
            engine,
            &self.effects,
            Box::new(move |fx: &mut FxScope| engine.trigger_sample(fx, name, params)),
        );
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}
