// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! This module drives the request/decision workflow between subjects and
//! issuing companies:
//! - Company registration
//! - Credential requests submitted by subjects
//! - Pending request review, acceptance and rejection by companies
//! - Issuance counts
//!
//! Each call carries the authenticated caller identity explicitly.

use crate::contracts::sbt_registry::{Decision, PendingRequests};
use crate::models::credential::CredentialRecord;
use crate::models::identity::{format_identity, Identity};
use crate::services::registry_state::{ServiceError, SharedRegistry};

/// Service for the issuer-facing side of the registry
///
/// Wraps the shared registry and logs every accepted and rejected call.
#[derive(Clone)]
pub struct CredentialIssuer {
    /// Transactional handle on the registry
    registry: SharedRegistry,
}

impl CredentialIssuer {
    /// Creates a new CredentialIssuer over the given registry
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Registers the caller as an issuing company
    ///
    /// # Errors
    /// Fails if the caller is the zero address or already registered
    pub async fn register_company(&self, caller: Identity) -> Result<(), ServiceError> {
        let result = self.registry.commit(|r| r.register_company(caller)).await;
        match &result {
            Ok(()) => log::info!("Registered company {}", format_identity(caller)),
            Err(e) => log::warn!("registerCompany by {} rejected: {}", format_identity(caller), e),
        }
        result
    }

    /// Submits a credential request from the caller (the subject) to `issuer`
    ///
    /// # Arguments
    /// * `caller` - Subject the credential would be issued to
    /// * `issuer` - Registered company asked to confirm the record
    /// * `record` - Proposed job history entry
    ///
    /// # Errors
    /// Fails if `issuer` is the zero address or unregistered, or if the caller
    /// already has an undecided request with (or a credential from) `issuer`
    pub async fn request_sbt(
        &self,
        caller: Identity,
        issuer: Identity,
        record: CredentialRecord,
    ) -> Result<(), ServiceError> {
        let id = record.id;
        let result = self
            .registry
            .commit(move |r| r.request_sbt(caller, issuer, record))
            .await;
        match &result {
            Ok(()) => log::info!(
                "Subject {} requested credential {} from {}",
                format_identity(caller),
                id,
                format_identity(issuer)
            ),
            Err(e) => log::warn!("requestSBT by {} rejected: {}", format_identity(caller), e),
        }
        result
    }

    /// Lists the caller's own pending requests in submission order
    ///
    /// # Errors
    /// Fails if the caller is not a registered company
    pub async fn pending_requests(&self, caller: Identity) -> Result<PendingRequests, ServiceError> {
        let pending = self
            .registry
            .read(|r| r.pending_sbt_requests(caller))
            .await
            .map_err(|e| {
                log::warn!("getPendingSBTRequests by {} rejected: {}", format_identity(caller), e);
                ServiceError::from(e)
            })?;
        if pending.is_empty() {
            log::debug!("No pending requests for {}", format_identity(caller));
        } else {
            log::debug!("{} pending requests for {}", pending.len(), format_identity(caller));
        }
        Ok(pending)
    }

    /// Accepts or rejects the request `subject` made to the caller
    ///
    /// # Returns
    /// Whether the credential was issued or discarded
    ///
    /// # Errors
    /// Fails if the caller is not a registered company or `subject` has no
    /// pending request with it
    pub async fn respond_to_request(
        &self,
        caller: Identity,
        subject: Identity,
        accept: bool,
    ) -> Result<Decision, ServiceError> {
        let result = self
            .registry
            .commit(|r| r.respond_to_request_sbt(caller, subject, accept))
            .await;
        match &result {
            Ok(decision) => log::info!(
                "Company {} responded to {}: {:?}",
                format_identity(caller),
                format_identity(subject),
                decision
            ),
            Err(e) => log::warn!("respondToRequestSBT by {} rejected: {}", format_identity(caller), e),
        }
        result
    }

    /// Number of credentials issued by the caller (0 if it never registered)
    pub async fn count_issued(&self, caller: Identity) -> u64 {
        self.registry.read(|r| r.count_issued(caller)).await
    }
}
