// src/graph/mod.rs

//! Seed graph construction.
//!
//! - [`builder`] turns an ordered package list into one change made of
//!   per-package task chains plus the trailing mark-seeded task set.
//! - [`validate`] checks that a built change's wait edges form a DAG.

pub mod builder;
pub mod validate;

pub use builder::{build_seed_change, BuildOptions, SeedPackage, TaskParams};
pub use validate::ensure_acyclic;
