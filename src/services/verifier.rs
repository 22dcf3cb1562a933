// src/services/verifier.rs
//! Credential verification service.
//!
//! Lets a third party check that an issuer really bound a given credential id
//! to a subject. A mismatch or an absent credential is a normal negative
//! answer, not an error.

use crate::models::identity::{format_identity, Identity};
use crate::services::registry_state::{ServiceError, SharedRegistry};

/// Read-only verifier over the shared registry.
#[derive(Clone)]
pub struct Verifier {
    registry: SharedRegistry,
}

impl Verifier {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Verifies that `issuer` issued `subject` the credential `id`.
    ///
    /// # Returns
    /// - `Ok(true)` if the issued credential for the pair carries `id`
    /// - `Ok(false)` if there is no issued credential or its id differs
    /// - `Err` only if either identity is the zero address
    pub async fn verify_sbt(
        &self,
        issuer: Identity,
        subject: Identity,
        id: u64,
    ) -> Result<bool, ServiceError> {
        let outcome = self.registry.read(|r| r.verify_sbt(issuer, subject, id)).await;
        match &outcome {
            Ok(is_valid) => log::debug!(
                "verifySBT({}, {}, {}) = {}",
                format_identity(issuer),
                format_identity(subject),
                id,
                is_valid
            ),
            Err(e) => log::warn!("verifySBT rejected: {}", e),
        }
        Ok(outcome?)
    }
}
