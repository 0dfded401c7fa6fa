use serde::{Deserialize, Serialize};

// Effect descriptors. We never process audio here; a voice wraps its
// trigger in these (outermost first) and the engine builds its own graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectSpec {
    Distortion {
        #[serde(default = "default_distort")]
        distort: f32,
    },
    Reverb {
        #[serde(default = "default_room")]
        room: f32,
        #[serde(default = "default_mix")]
        mix: f32,
    },
    Bitcrusher {
        #[serde(default = "default_bits")]
        bits: u32,
    },
    Echo {
        #[serde(default = "default_phase")]
        phase: f32, // in beats
        #[serde(default = "default_mix")]
        mix: f32,
    },
    LowPass {
        cutoff: f32,
    },
}

fn default_distort() -> f32 { 0.5 }
fn default_room() -> f32 { 0.6 }
fn default_mix() -> f32 { 0.4 }
fn default_bits() -> u32 { 8 }
fn default_phase() -> f32 { 0.25 }

impl EffectSpec {
    pub fn distortion() -> Self {
        EffectSpec::Distortion { distort: default_distort() }
    }

    pub fn label(&self) -> String {
        match self {
            EffectSpec::Distortion { distort } => format!("Distortion({})", distort),
            EffectSpec::Reverb { room, mix } => format!("Reverb({}, {})", room, mix),
            EffectSpec::Bitcrusher { bits } => format!("Bitcrush({})", bits),
            EffectSpec::Echo { phase, mix } => format!("Echo({}, {})", phase, mix),
            EffectSpec::LowPass { cutoff } => format!("LowPass({})", cutoff),
        }
    }
}
