// Purely for testing: an engine that writes down every trigger along with
// the transport position it fired at.

use std::sync::Mutex;
use std::time::Duration;

use crate::audio_api::{EffectSpec, Engine, FxScope, SampleParams, SynthParams};
use crate::shared::Pitch;

use super::clock::Transport;

#[derive(Clone, Debug, PartialEq)]
pub enum Played {
    Instrument { at: Duration, instrument: String, pitch: Pitch, params: SynthParams, fx: Vec<EffectSpec> },
    Sample { at: Duration, name: String, params: SampleParams, fx: Vec<EffectSpec> },
}

pub struct RecordingEngine {
    transport: Transport,
    played: Mutex<Vec<Played>>,
}

impl Default for RecordingEngine {
    // must be built inside the runtime when the test cares about timing
    fn default() -> Self {
        Self { transport: Transport::start(), played: Mutex::new(Vec::new()) }
    }
}

impl RecordingEngine {
    pub fn played(&self) -> Vec<Played> {
        self.played.lock().unwrap().clone()
    }

    pub fn notes(&self) -> Vec<Pitch> {
        self.played()
            .into_iter()
            .filter_map(|p| match p {
                Played::Instrument { pitch, .. } => Some(pitch),
                Played::Sample { .. } => None,
            })
            .collect()
    }

    pub fn samples(&self, wanted: &str) -> Vec<Duration> {
        self.played()
            .into_iter()
            .filter_map(|p| match p {
                Played::Sample { at, name, .. } if name == wanted => Some(at),
                _ => None,
            })
            .collect()
    }
}

impl Engine for RecordingEngine {
    fn trigger_instrument(&self, fx: &FxScope, instrument: &str, pitch: Pitch, params: &SynthParams) {
        self.played.lock().unwrap().push(Played::Instrument {
            at: self.transport.position(),
            instrument: instrument.to_string(),
            pitch,
            params: params.clone(),
            fx: fx.chain().to_vec(),
        });
    }

    fn trigger_sample(&self, fx: &FxScope, name: &str, params: &SampleParams) {
        self.played.lock().unwrap().push(Played::Sample {
            at: self.transport.position(),
            name: name.to_string(),
            params: params.clone(),
            fx: fx.chain().to_vec(),
        });
    }
}
