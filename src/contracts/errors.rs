// src/contracts/errors.rs
//! Precondition violations raised by the registry.
//!
//! Every variant aborts the call that raised it without touching registry
//! state. A negative verification outcome is not represented here: it is a
//! successful `Ok(false)`.

use crate::models::identity::{Identity, IdentityRole};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An explicitly named identity was the zero address.
    #[error("{role} identity must not be the zero address")]
    ZeroIdentity { role: IdentityRole },

    #[error("company {0:?} is already registered")]
    AlreadyRegistered(Identity),

    #[error("company {0:?} is not registered")]
    IssuerNotRegistered(Identity),

    /// The subject already has an undecided request with this issuer.
    #[error("subject {subject:?} already has a pending request with {issuer:?}")]
    DuplicateRequest { issuer: Identity, subject: Identity },

    /// The issuer already bound a credential to this subject.
    #[error("{issuer:?} has already issued a credential to {subject:?}")]
    AlreadyIssued { issuer: Identity, subject: Identity },

    /// Covers both "never requested" and "already decided".
    #[error("no pending request from {subject:?} for {issuer:?}")]
    NoPendingRequest { issuer: Identity, subject: Identity },
}
