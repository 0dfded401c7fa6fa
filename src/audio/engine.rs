use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio_api::{EngineCommand, InstrumentTrigger, SampleTrigger};

// One line of the trigger journal, as written by `--log`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerRecord {
    Instrument(InstrumentTrigger),
    Sample(SampleTrigger),
}

impl TriggerRecord {
    pub fn at_secs(&self) -> f64 {
        match self {
            TriggerRecord::Instrument(t) => t.at.as_secs_f64(),
            TriggerRecord::Sample(t) => t.at.as_secs_f64(),
        }
    }
}

// Lives on the sink thread. Everything the scheduler fires is logged here,
// and kept only if someone asked for the trigger log.
pub struct Journal {
    records: Vec<TriggerRecord>,
    keep: bool,
}

impl Journal {
    pub fn new(keep: bool) -> Self {
        Self { records: Vec::new(), keep }
    }

    fn record(&mut self, record: TriggerRecord) {
        if self.keep {
            self.records.push(record);
        }
    }

    // returns false once the journal should stop listening
    pub fn handle_cmd(&mut self, cmd: EngineCommand) -> bool {
        match cmd {
            EngineCommand::PlayInstrument(t) => self.play_instrument(t),
            EngineCommand::PlaySample(t) => self.play_sample(t),
            EngineCommand::Shutdown => return false,
        }
        true
    }

    fn play_instrument(&mut self, t: InstrumentTrigger) {
        info!(
            at = format_args!("{:.3}s", t.at.as_secs_f64()),
            instrument = %t.instrument,
            note = t.pitch.0,
            cutoff = format_args!("{:.1}", t.params.cutoff),
            fx = %fx_labels(&t.effect_chain),
            "play"
        );
        self.record(TriggerRecord::Instrument(t));
    }

    fn play_sample(&mut self, t: SampleTrigger) {
        info!(
            at = format_args!("{:.3}s", t.at.as_secs_f64()),
            sample = %t.sample,
            amp = t.params.amp,
            fx = %fx_labels(&t.effect_chain),
            "sample"
        );
        self.record(TriggerRecord::Sample(t));
    }

    pub fn into_records(self) -> Vec<TriggerRecord> {
        debug!(count = self.records.len(), "journal closed");
        self.records
    }
}

fn fx_labels(chain: &[crate::audio::EffectSpec]) -> String {
    if chain.is_empty() {
        return "-".to_string();
    }
    chain.iter().map(|fx| fx.label()).collect::<Vec<_>>().join(" > ")
}
