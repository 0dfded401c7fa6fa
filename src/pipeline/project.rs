// The on-disk arrangement: what middle.rs turns into live voices, sequences
// and patterns. Everything here is plain data.
//
// Terminology, since it gets muddled:
// "voice": something that can sound (a synth patch or a one-shot sample).
// "sequence": one voice's step list, repeated N times or forever.
// "pattern": sequences that start together and finish together.
// "order": which patterns play, one after the other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audio_api::{EffectSpec, Envelope, Waveform};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arrangement {
    pub bpm: f64,
    pub oscillators: BTreeMap<String, OscillatorSpec>,
    pub voices: BTreeMap<String, VoiceSpec>,
    pub patterns: Vec<PatternSpec>,
    // pattern ids; empty means "every pattern, as declared"
    pub order: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSpec {
    pub ratio: f64,
    #[serde(default = "default_lfo_step")]
    pub step: f64,
}

fn default_lfo_step() -> f64 { crate::pipeline::lfo::DEFAULT_STEP }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoiceSpec {
    Synth(SynthSpec),
    Sample(SampleSpec),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthSpec {
    #[serde(default = "default_instrument")]
    pub instrument: String,
    #[serde(default)]
    pub lfo: Option<String>, // name in `oscillators`
    pub cutoff_min: f64,
    pub cutoff_max: f64,
    #[serde(default)]
    pub resonance: f64,
    #[serde(default)]
    pub envelope: Option<Envelope>,
    #[serde(default)]
    pub cutoff_envelope: Option<Envelope>,
    #[serde(default)]
    pub wave: Option<Waveform>,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

fn default_instrument() -> String { "tb303".to_string() }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleSpec {
    pub sample: String,
    #[serde(default)]
    pub attack: f64,
    #[serde(default)]
    pub decay: f64,
    #[serde(default = "one")]
    pub sustain: f64,
    #[serde(default = "one")]
    pub release: f64,
    #[serde(default = "default_amp")]
    pub amp: f64,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

fn one() -> f64 { 1.0 }
fn default_amp() -> f64 { crate::pipeline::voice::SAMPLE_AMP }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub id: String,
    // defaults to "<id>_played"
    #[serde(default)]
    pub signal: Option<String>,
    pub sequences: Vec<SequenceSpec>,
}

impl PatternSpec {
    pub fn played_signal(&self) -> String {
        self.signal.clone().unwrap_or_else(|| format!("{}_played", self.id))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceSpec {
    pub voice: String,
    pub steps: Vec<String>, // event, length, event, length, ...
    // > 0 plays that many times; 0, negative, or missing loops forever
    #[serde(default = "forever")]
    pub repeat: i64,
}

fn forever() -> i64 { -1 }

fn symbols(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

impl Default for Arrangement {
    fn default() -> Self {
        Self {
            bpm: 100.0,
            oscillators: BTreeMap::new(),
            voices: BTreeMap::new(),
            patterns: Vec::new(),
            order: Vec::new(),
        }
    }
}

impl Arrangement {
    // what plays when no file is given: a tb303 line over a four-piece kit,
    // with the bassline alone as the intro
    pub fn demo() -> Self {
        let bassline = "none s c4 s a2 e a3 e a2 e c3 e d3 s e3 e. a2 e";
        let kick = "x e o e x e o e x e o e x e o e";
        let snare = "o e o e x e o e o e o e x e o e";
        let open_hat = "o e o e o e o e o e o e o e x e";

        let acid = SynthSpec {
            instrument: default_instrument(),
            lfo: Some("sweep".into()),
            cutoff_min: 70.0,
            cutoff_max: 130.0,
            resonance: 0.9,
            envelope: None,
            cutoff_envelope: None,
            wave: Some(Waveform::Square),
            effects: vec![EffectSpec::distortion()],
        };
        let drum = |name: &str| SampleSpec {
            sample: name.into(),
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 1.0,
            amp: default_amp(),
            effects: Vec::new(),
        };

        let mut voices = BTreeMap::new();
        voices.insert("acid".into(), VoiceSpec::Synth(acid));
        voices.insert("kick".into(), VoiceSpec::Sample(drum("drum_heavy_kick")));
        voices.insert("snare".into(), VoiceSpec::Sample(drum("drum_snare_hard")));
        voices.insert("pedal_hat".into(), VoiceSpec::Sample(drum("drum_cymbal_pedal")));
        voices.insert(
            "open_hat".into(),
            VoiceSpec::Sample(SampleSpec { decay: 0.25, sustain: 0.0, release: 0.0, ..drum("drum_cymbal_open") }),
        );

        let seq = |voice: &str, steps: &str, repeat: i64| SequenceSpec {
            voice: voice.into(),
            steps: symbols(steps),
            repeat,
        };

        let mut oscillators = BTreeMap::new();
        oscillators.insert("sweep".into(), OscillatorSpec { ratio: 0.5, step: default_lfo_step() });

        Self {
            bpm: 100.0,
            oscillators,
            voices,
            patterns: vec![
                PatternSpec {
                    id: "intro".into(),
                    signal: None,
                    sequences: vec![seq("acid", bassline, 4)],
                },
                PatternSpec {
                    id: "verse".into(),
                    signal: None,
                    sequences: vec![
                        seq("kick", kick, 8),
                        seq("snare", snare, 8),
                        seq("pedal_hat", kick, 8),
                        seq("open_hat", open_hat, 8),
                        seq("acid", bassline, 8),
                    ],
                },
            ],
            order: vec!["intro".into(), "verse".into()],
        }
    }
}
