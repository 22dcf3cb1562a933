// src/models/identity.rs
//! Account identities for issuers, subjects and callers.
//!
//! Identities are 20-byte account addresses. Authentication happens before a
//! call reaches the registry; this module only deals with the address value
//! itself and the "zero identity" rule.

use crate::contracts::errors::RegistryError;
use ethers_core::types::Address;
use std::fmt;
use std::str::FromStr;

/// An already-authenticated account address.
pub type Identity = Address;

/// The argument position an identity was supplied in.
///
/// Used to report which input was the zero identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRole {
    Issuer,
    Subject,
    Caller,
}

impl fmt::Display for IdentityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Issuer => "issuer",
            Self::Subject => "subject",
            Self::Caller => "caller",
        })
    }
}

/// Rejects the zero identity.
///
/// # Returns
/// - `Ok(identity)` for any non-zero address
/// - `Err(RegistryError::ZeroIdentity)` naming `role` otherwise
pub fn ensure_identity(identity: Identity, role: IdentityRole) -> Result<Identity, RegistryError> {
    if identity.is_zero() {
        return Err(RegistryError::ZeroIdentity { role });
    }
    Ok(identity)
}

/// Parses a hex address, with or without the `0x` prefix.
pub fn parse_identity(input: &str) -> Result<Identity, String> {
    Address::from_str(input.trim()).map_err(|e| format!("invalid address '{}': {}", input, e))
}

/// Formats an identity as a lowercase hex string with 0x prefix.
pub fn format_identity(identity: Identity) -> String {
    format!("0x{:x}", identity)
}
