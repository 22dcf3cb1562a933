// src/contracts/sbt_registry.rs
//! Soulbound job credential registry.
//!
//! Holds every registered company together with its queue of pending
//! credential requests and its store of issued credentials. Every operation
//! takes the already-authenticated caller identity as an explicit argument,
//! validates its preconditions and either applies all of its effects or none.
//!
//! ## Request lifecycle (per issuer/subject pair)
//! ```text
//! NoRequest ──request_sbt──▶ Pending ──respond(accept)──▶ Issued   (terminal)
//!                               │
//!                               └──respond(reject)──▶ Rejected ──request_sbt──▶ Pending
//! ```
//!
//! Issued credentials cannot be revoked, transferred or overwritten.

use crate::contracts::errors::RegistryError;
use crate::models::credential::CredentialRecord;
use crate::models::identity::{ensure_identity, Identity, IdentityRole};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State kept for one registered company.
///
/// An `Issuer` only exists once its identity has registered, so presence in
/// the registry is the `registered` flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issuer {
    /// Undecided requests keyed by subject, in submission order
    pending_requests: IndexMap<Identity, CredentialRecord>,
    /// Accepted credentials keyed by subject
    issued_credentials: HashMap<Identity, CredentialRecord>,
    /// Number of accepted credentials; never decreases
    issued_count: u64,
}

impl Issuer {
    fn is_consistent(&self) -> bool {
        self.issued_count == self.issued_credentials.len() as u64
            && self.pending_requests.values().all(|record| record.is_set)
            && self.issued_credentials.values().all(|record| record.is_set)
    }
}

/// Pending requests of one issuer as two parallel, equal-length sequences.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingRequests {
    pub subjects: Vec<Identity>,
    pub records: Vec<CredentialRecord>,
}

impl PendingRequests {
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Outcome of an issuer's response to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Issued,
    Rejected,
}

/// The registry: sole owner and source of truth for all issuer state.
///
/// A plain owned value. Callers that share it across threads wrap it in a
/// lock (see `services::registry_state`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SbtRegistry {
    issuers: HashMap<Identity, Issuer>,
}

impl SbtRegistry {
    /// Creates an empty registry with no registered companies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the caller as a company.
    ///
    /// # Errors
    /// - `ZeroIdentity` if the caller is the zero address
    /// - `AlreadyRegistered` if the caller registered before
    pub fn register_company(&mut self, caller: Identity) -> Result<(), RegistryError> {
        let caller = ensure_identity(caller, IdentityRole::Caller)?;
        if self.is_registered(caller) {
            return Err(RegistryError::AlreadyRegistered(caller));
        }
        self.issuers.insert(caller, Issuer::default());
        Ok(())
    }

    /// Submits `record` to `issuer` on behalf of the calling subject.
    ///
    /// The record is stored with `is_set` raised and queued behind any other
    /// requests already pending with the issuer.
    ///
    /// # Errors
    /// - `ZeroIdentity` if `issuer` or the caller is the zero address
    /// - `IssuerNotRegistered` if `issuer` never registered
    /// - `DuplicateRequest` if the caller already has a request pending with `issuer`
    /// - `AlreadyIssued` if `issuer` already issued a credential to the caller
    pub fn request_sbt(
        &mut self,
        caller: Identity,
        issuer: Identity,
        record: CredentialRecord,
    ) -> Result<(), RegistryError> {
        let issuer = ensure_identity(issuer, IdentityRole::Issuer)?;
        let subject = ensure_identity(caller, IdentityRole::Subject)?;

        let company = self
            .issuers
            .get_mut(&issuer)
            .ok_or(RegistryError::IssuerNotRegistered(issuer))?;

        if company.pending_requests.contains_key(&subject) {
            return Err(RegistryError::DuplicateRequest { issuer, subject });
        }
        if company.issued_credentials.contains_key(&subject) {
            return Err(RegistryError::AlreadyIssued { issuer, subject });
        }

        company.pending_requests.insert(subject, record.into_stored());
        Ok(())
    }

    /// Lists the calling issuer's own pending requests in submission order.
    ///
    /// # Errors
    /// - `IssuerNotRegistered` if the caller is not a registered company
    pub fn pending_sbt_requests(&self, caller: Identity) -> Result<PendingRequests, RegistryError> {
        let company = self.company(caller)?;
        let (subjects, records) = company
            .pending_requests
            .iter()
            .map(|(subject, record)| (*subject, record.clone()))
            .unzip();
        Ok(PendingRequests { subjects, records })
    }

    /// Accepts or rejects the pending request `subject` made to the caller.
    ///
    /// The request leaves the pending queue either way; the relative order of
    /// the remaining requests is kept. Acceptance binds the record to the
    /// subject and bumps the issued count.
    ///
    /// # Errors
    /// - `IssuerNotRegistered` if the caller is not a registered company
    /// - `NoPendingRequest` if `subject` has nothing pending with the caller
    pub fn respond_to_request_sbt(
        &mut self,
        caller: Identity,
        subject: Identity,
        accept: bool,
    ) -> Result<Decision, RegistryError> {
        let company = self
            .issuers
            .get_mut(&caller)
            .ok_or(RegistryError::IssuerNotRegistered(caller))?;

        let record = company
            .pending_requests
            .shift_remove(&subject)
            .ok_or(RegistryError::NoPendingRequest {
                issuer: caller,
                subject,
            })?;

        if !accept {
            return Ok(Decision::Rejected);
        }

        company.issued_credentials.insert(subject, record);
        company.issued_count += 1;
        Ok(Decision::Issued)
    }

    /// Number of credentials the caller has issued; 0 for unregistered callers.
    pub fn count_issued(&self, caller: Identity) -> u64 {
        self.issuers
            .get(&caller)
            .map_or(0, |company| company.issued_count)
    }

    /// Checks whether `issuer` issued `subject` a credential with identifier `id`.
    ///
    /// # Returns
    /// - `Ok(true)` if an issued credential exists for the pair and its id matches
    /// - `Ok(false)` if none exists or the id differs
    ///
    /// # Errors
    /// - `ZeroIdentity` if either identity is the zero address
    pub fn verify_sbt(
        &self,
        issuer: Identity,
        subject: Identity,
        id: u64,
    ) -> Result<bool, RegistryError> {
        let issuer = ensure_identity(issuer, IdentityRole::Issuer)?;
        let subject = ensure_identity(subject, IdentityRole::Subject)?;

        Ok(self
            .issued_credential(issuer, subject)
            .is_some_and(|record| record.id == id))
    }

    pub fn is_registered(&self, identity: Identity) -> bool {
        self.issuers.contains_key(&identity)
    }

    /// The credential `issuer` bound to `subject`, if any.
    pub fn issued_credential(&self, issuer: Identity, subject: Identity) -> Option<&CredentialRecord> {
        self.issuers
            .get(&issuer)
            .and_then(|company| company.issued_credentials.get(&subject))
    }

    pub fn issuer_count(&self) -> usize {
        self.issuers.len()
    }

    /// Whether every issuer's bookkeeping agrees with its stores.
    ///
    /// Only a registry rebuilt from outside data can fail this; operations on
    /// a live registry keep it true.
    pub fn is_consistent(&self) -> bool {
        !self.issuers.contains_key(&Identity::zero())
            && self.issuers.values().all(Issuer::is_consistent)
    }

    fn company(&self, identity: Identity) -> Result<&Issuer, RegistryError> {
        self.issuers
            .get(&identity)
            .ok_or(RegistryError::IssuerNotRegistered(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> Identity {
        Identity::repeat_byte(0x10 + n)
    }

    fn job(id: u64) -> CredentialRecord {
        CredentialRecord::new(id, "Senior Dummy Engineer", (1, 2020), (12, 2021))
    }

    fn registry_with_company(company: Identity) -> SbtRegistry {
        let mut registry = SbtRegistry::new();
        registry.register_company(company).unwrap();
        registry
    }

    #[test]
    fn test_register_company_only_once() {
        let company = account(0);
        let mut registry = registry_with_company(company);

        assert!(registry.is_registered(company));
        assert_eq!(
            registry.register_company(company),
            Err(RegistryError::AlreadyRegistered(company))
        );
        assert_eq!(registry.issuer_count(), 1);
        assert_eq!(registry.count_issued(company), 0);
        assert!(registry.pending_sbt_requests(company).unwrap().is_empty());
    }

    #[test]
    fn test_zero_caller_cannot_register() {
        let mut registry = SbtRegistry::new();

        assert_eq!(
            registry.register_company(Identity::zero()),
            Err(RegistryError::ZeroIdentity { role: IdentityRole::Caller })
        );
        assert_eq!(registry.issuer_count(), 0);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_request_from_zero_issuer_is_rejected() {
        let mut registry = SbtRegistry::new();
        let err = registry
            .request_sbt(account(9), Identity::zero(), job(1))
            .unwrap_err();
        assert_eq!(err, RegistryError::ZeroIdentity { role: IdentityRole::Issuer });
    }

    #[test]
    fn test_request_from_zero_subject_is_rejected() {
        let company = account(0);
        let mut registry = registry_with_company(company);
        let err = registry
            .request_sbt(Identity::zero(), company, job(1))
            .unwrap_err();
        assert_eq!(err, RegistryError::ZeroIdentity { role: IdentityRole::Subject });
        assert!(registry.pending_sbt_requests(company).unwrap().is_empty());
    }

    #[test]
    fn test_request_to_unregistered_company_is_rejected() {
        let mut registry = SbtRegistry::new();
        assert_eq!(
            registry.request_sbt(account(9), account(0), job(1)),
            Err(RegistryError::IssuerNotRegistered(account(0)))
        );
    }

    #[test]
    fn test_duplicate_pending_request_is_rejected() {
        let (company, subject) = (account(0), account(9));
        let mut registry = registry_with_company(company);

        registry.request_sbt(subject, company, job(1)).unwrap();
        let before = registry.clone();

        assert_eq!(
            registry.request_sbt(subject, company, job(2)),
            Err(RegistryError::DuplicateRequest { issuer: company, subject })
        );
        assert_eq!(registry, before);
    }

    #[test]
    fn test_stored_request_is_marked_set() {
        let (company, subject) = (account(0), account(9));
        let mut registry = registry_with_company(company);
        registry.request_sbt(subject, company, job(1)).unwrap();

        let pending = registry.pending_sbt_requests(company).unwrap();
        assert!(pending.records[0].is_set);
        assert_eq!(pending.records[0].id, 1);
    }

    #[test]
    fn test_unregistered_caller_cannot_list_or_respond() {
        let mut registry = SbtRegistry::new();
        let caller = account(0);

        assert_eq!(
            registry.pending_sbt_requests(caller),
            Err(RegistryError::IssuerNotRegistered(caller))
        );
        assert_eq!(
            registry.respond_to_request_sbt(caller, account(3), true),
            Err(RegistryError::IssuerNotRegistered(caller))
        );
    }

    #[test]
    fn test_respond_without_pending_request_is_rejected() {
        let company = account(0);
        let mut registry = registry_with_company(company);

        assert_eq!(
            registry.respond_to_request_sbt(company, account(3), true),
            Err(RegistryError::NoPendingRequest { issuer: company, subject: account(3) })
        );
    }

    #[test]
    fn test_respond_twice_is_rejected() {
        let (company, subject) = (account(0), account(9));
        let mut registry = registry_with_company(company);
        registry.request_sbt(subject, company, job(1)).unwrap();

        assert_eq!(
            registry.respond_to_request_sbt(company, subject, false),
            Ok(Decision::Rejected)
        );
        assert_eq!(
            registry.respond_to_request_sbt(company, subject, true),
            Err(RegistryError::NoPendingRequest { issuer: company, subject })
        );
        assert_eq!(registry.count_issued(company), 0);
    }

    #[test]
    fn test_pending_requests_are_scoped_to_the_caller() {
        let (first, second) = (account(0), account(1));
        let mut registry = registry_with_company(first);
        registry.register_company(second).unwrap();

        registry.request_sbt(account(9), first, job(1)).unwrap();
        registry.request_sbt(account(9), second, job(1)).unwrap();
        registry.request_sbt(account(8), second, job(1)).unwrap();

        assert_eq!(registry.pending_sbt_requests(first).unwrap().len(), 1);
        assert_eq!(registry.pending_sbt_requests(second).unwrap().len(), 2);
    }

    #[test]
    fn test_pending_order_survives_removal() {
        let company = account(1);
        let mut registry = registry_with_company(company);
        for subject in [account(9), account(8), account(7), account(6)] {
            registry.request_sbt(subject, company, job(1)).unwrap();
        }

        registry.respond_to_request_sbt(company, account(8), true).unwrap();

        let pending = registry.pending_sbt_requests(company).unwrap();
        assert_eq!(pending.subjects, vec![account(9), account(7), account(6)]);
        assert_eq!(pending.subjects.len(), pending.records.len());
    }

    #[test]
    fn test_accept_and_reject_bookkeeping() {
        let company = account(1);
        let mut registry = registry_with_company(company);
        for subject in [account(9), account(8), account(7)] {
            registry.request_sbt(subject, company, job(1)).unwrap();
        }
        assert_eq!(registry.pending_sbt_requests(company).unwrap().len(), 3);

        assert_eq!(
            registry.respond_to_request_sbt(company, account(7), true),
            Ok(Decision::Issued)
        );
        assert_eq!(registry.pending_sbt_requests(company).unwrap().len(), 2);
        assert_eq!(registry.count_issued(company), 1);

        assert_eq!(
            registry.respond_to_request_sbt(company, account(8), false),
            Ok(Decision::Rejected)
        );
        assert_eq!(registry.pending_sbt_requests(company).unwrap().len(), 1);
        assert_eq!(registry.count_issued(company), 1);
        assert!(registry.issued_credential(company, account(8)).is_none());
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_re_request_after_rejection_is_allowed() {
        let (company, subject) = (account(0), account(9));
        let mut registry = registry_with_company(company);

        registry.request_sbt(subject, company, job(1)).unwrap();
        registry.respond_to_request_sbt(company, subject, false).unwrap();
        registry.request_sbt(subject, company, job(2)).unwrap();

        let pending = registry.pending_sbt_requests(company).unwrap();
        assert_eq!(pending.subjects, vec![subject]);
        assert_eq!(pending.records[0].id, 2);
    }

    #[test]
    fn test_re_request_after_issuance_is_rejected() {
        let (company, subject) = (account(0), account(9));
        let mut registry = registry_with_company(company);

        registry.request_sbt(subject, company, job(3)).unwrap();
        registry.respond_to_request_sbt(company, subject, true).unwrap();

        assert_eq!(
            registry.request_sbt(subject, company, job(4)),
            Err(RegistryError::AlreadyIssued { issuer: company, subject })
        );
        assert!(registry.verify_sbt(company, subject, 3).unwrap());
        assert_eq!(registry.count_issued(company), 1);
    }

    #[test]
    fn test_subject_may_hold_credentials_from_several_issuers() {
        let (first, second, subject) = (account(0), account(1), account(9));
        let mut registry = registry_with_company(first);
        registry.register_company(second).unwrap();

        registry.request_sbt(subject, first, job(10)).unwrap();
        registry.request_sbt(subject, second, job(20)).unwrap();
        registry.respond_to_request_sbt(first, subject, true).unwrap();

        assert!(registry.verify_sbt(first, subject, 10).unwrap());
        assert!(!registry.verify_sbt(second, subject, 20).unwrap());
        assert_eq!(registry.pending_sbt_requests(second).unwrap().len(), 1);
    }

    #[test]
    fn test_count_issued_for_unregistered_caller_is_zero() {
        assert_eq!(SbtRegistry::new().count_issued(account(5)), 0);
    }

    #[test]
    fn test_verify_rejects_zero_identities() {
        let registry = SbtRegistry::new();
        assert_eq!(
            registry.verify_sbt(Identity::zero(), account(9), 1),
            Err(RegistryError::ZeroIdentity { role: IdentityRole::Issuer })
        );
        assert_eq!(
            registry.verify_sbt(account(0), Identity::zero(), 1),
            Err(RegistryError::ZeroIdentity { role: IdentityRole::Subject })
        );
    }

    #[test]
    fn test_verify_scenario_single_issuer() {
        let (company, subject) = (account(0), account(9));
        let mut registry = registry_with_company(company);

        registry.request_sbt(subject, company, job(3)).unwrap();
        registry.respond_to_request_sbt(company, subject, true).unwrap();

        assert_eq!(registry.verify_sbt(company, subject, 3), Ok(true));
        assert_eq!(registry.verify_sbt(company, subject, 4), Ok(false));
        assert_eq!(registry.verify_sbt(company, account(8), 3), Ok(false));
        assert_eq!(registry.count_issued(company), 1);
    }

    #[test]
    fn test_full_two_company_walkthrough() {
        let (first, second) = (account(0), account(1));
        let mut registry = SbtRegistry::new();

        registry.register_company(first).unwrap();
        registry.request_sbt(account(9), first, job(1)).unwrap();
        registry.register_company(second).unwrap();

        registry.request_sbt(account(9), second, job(3)).unwrap();
        registry.request_sbt(account(8), second, job(5)).unwrap();
        registry.request_sbt(account(7), second, job(6)).unwrap();
        assert_eq!(registry.pending_sbt_requests(second).unwrap().len(), 3);
        assert_eq!(registry.pending_sbt_requests(first).unwrap().len(), 1);

        registry.respond_to_request_sbt(second, account(7), true).unwrap();
        registry.respond_to_request_sbt(second, account(8), false).unwrap();
        registry.respond_to_request_sbt(second, account(9), true).unwrap();

        assert!(registry.pending_sbt_requests(second).unwrap().is_empty());
        assert_eq!(registry.count_issued(second), 2);
        assert_eq!(registry.count_issued(first), 0);

        assert_eq!(registry.verify_sbt(second, account(9), 1), Ok(false));
        assert_eq!(registry.verify_sbt(second, account(9), 4), Ok(false));
        assert_eq!(registry.verify_sbt(second, account(9), 3), Ok(true));
        assert_eq!(registry.verify_sbt(second, account(8), 5), Ok(false));
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_consistency_detects_count_drift() {
        let company = account(0);
        let mut registry = registry_with_company(company);
        assert!(registry.is_consistent());

        if let Some(issuer) = registry.issuers.get_mut(&company) {
            issuer.issued_count = 5;
        }
        assert!(!registry.is_consistent());
    }
}
