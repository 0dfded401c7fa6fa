// The narrow surface between the scheduler and whatever actually makes sound.
// Voices only ever talk to an `Engine`; the engine decides what a trigger
// means (the journal in audio/ logs it, tests record it).

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use crate::audio::EffectSpec;
use crate::shared::Pitch;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub sustain_level: f64,
    pub release: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Self { attack: 0.0, decay: 0.0, sustain: 0.0, sustain_level: 1.0, release: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Saw,
    Square,
    Pulse,
    Triangle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthParams {
    pub amp: Envelope,
    pub cutoff_env: Envelope,
    pub cutoff: f64, // MIDI-style cutoff, 0..130
    pub resonance: f64,
    pub wave: Waveform,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain_level: f64,
    pub release: f64,
    pub amp: f64,
}

// The effects wrapping the trigger that is about to fire, outermost first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FxScope {
    chain: Vec<EffectSpec>,
}

impl FxScope {
    pub fn enter(&mut self, effect: EffectSpec) {
        self.chain.push(effect);
    }

    pub fn leave(&mut self) {
        self.chain.pop();
    }

    pub fn chain(&self) -> &[EffectSpec] {
        &self.chain
    }
}

pub type FxBody<'a> = Box<dyn FnOnce(&mut FxScope) + 'a>;

pub trait Engine: Send + Sync {
    fn trigger_instrument(&self, fx: &FxScope, instrument: &str, pitch: Pitch, params: &SynthParams);

    fn trigger_sample(&self, fx: &FxScope, name: &str, params: &SampleParams);

    // `body` runs inside `effect`; nesting calls nests the effects
    fn with_effect(&self, fx: &mut FxScope, effect: &EffectSpec, body: FxBody<'_>) {
        fx.enter(effect.clone());
        body(fx);
        fx.leave();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentTrigger {
    pub at: Duration, // transport position
    pub instrument: String,
    pub pitch: Pitch,
    pub params: SynthParams,
    pub effect_chain: Vec<EffectSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleTrigger {
    pub at: Duration,
    pub sample: String,
    pub params: SampleParams,
    pub effect_chain: Vec<EffectSpec>,
}

#[derive(Clone, Debug)]
pub enum EngineCommand {
    PlayInstrument(InstrumentTrigger),
    PlaySample(SampleTrigger),

    // sent once by the sink handle; the journal thread exits after it
    Shutdown,
}
