// src/config/mod.rs

//! Engine policy configuration.
//!
//! Settle policy (timeout, idle poll interval, worker bound) and the state
//! snapshot location are data, not constants: embedders load them from a
//! TOML file. Deserialization produces a raw form; semantic validation
//! happens in the `TryFrom` conversion to the checked form.

pub mod loader;
pub mod model;

pub use loader::{load_and_validate, load_from_path};
pub use model::{EngineConfig, PersistSection, RawEngineConfig, SettleSection};
