// src/storage/mod.rs
//! Persistence for registry state.

pub mod snapshot_store;
