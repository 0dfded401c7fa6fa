//! The scheduling core.
//!
//! - `clock`: tempo, per-task beat sleeps, the shared transport
//! - `signal`: named rendezvous between tasks
//! - `lfo`: the filter-sweep oscillator
//! - `voice`: synth and sample voices, effect chains
//! - `sequence` / `pattern` / `song`: who plays when
//! - `project` / `persistence`: arrangement files on disk

pub mod clock;
pub mod lfo;
pub mod pattern;
pub mod persistence;
pub mod project;
pub mod ring;
pub mod sequence;
pub mod signal;
pub mod song;
pub mod voice;

#[cfg(test)]
pub mod test_fixture;
