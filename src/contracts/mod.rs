// src/contracts/mod.rs
//! The soulbound credential registry and its failure modes.

pub mod errors;
pub mod sbt_registry;
