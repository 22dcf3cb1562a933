// src/models/mod.rs
//! Data structures shared across the registry, services and storage layers.

pub mod credential;
pub mod identity;
