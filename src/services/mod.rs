// src/services/mod.rs
//! Business logic and API.

pub mod api_server;
pub mod credential_issuer;
pub mod registry_state;
pub mod verifier;
