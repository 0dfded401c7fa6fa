// Reading arrangements and writing what got played.
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::audio::TriggerRecord;
use crate::pipeline::project::Arrangement;

pub fn load_arrangement(path: &Path) -> anyhow::Result<Arrangement> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading arrangement {}", path.display()))?;
    let arrangement = serde_json::from_str(&data)
        .with_context(|| format!("parsing arrangement {}", path.display()))?;
    info!(path = %path.display(), "arrangement loaded");
    Ok(arrangement)
}

// Save as pretty JSON, making parent dirs if they don't exist already
pub fn save_arrangement(path: &Path, arrangement: &Arrangement) -> anyhow::Result<()> {
    write_json(path, arrangement)
}

pub fn save_trigger_log(path: &Path, records: &[TriggerRecord]) -> anyhow::Result<()> {
    write_json(path, records)?;
    info!(path = %path.display(), triggers = records.len(), "trigger log written");
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
