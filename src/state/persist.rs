// src/state/persist.rs

//! Durable snapshots of [`State`].
//!
//! The whole arena serializes to a single JSON document. Writes go through
//! a temp file in the same directory followed by a rename, so a crash
//! mid-write never leaves a truncated snapshot behind.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::state::store::State;

/// Write a snapshot of `state` to `path`.
pub fn save(state: &State, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(state)?;

    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), bytes = json.len(), "state snapshot written");
    Ok(())
}

/// Read a snapshot back; the result can be settled again as-is.
pub fn load(path: &Path) -> Result<State> {
    let data = fs::read(path)?;
    let state: State = serde_json::from_slice(&data)?;
    debug!(path = %path.display(), "state snapshot loaded");
    Ok(state)
}
