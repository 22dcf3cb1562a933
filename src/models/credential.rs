// src/models/credential.rs
//! Job credential data model.
//!
//! Defines the record a subject proposes to an issuer and that the issuer,
//! once it accepts, binds permanently to the subject as a soulbound token.

use crate::utils::serialization::deserialize_flag;
use serde::{Deserialize, Serialize};

/// A claimed job history entry.
///
/// The same value travels through the whole lifecycle: it is submitted with a
/// request, held in the issuer's pending queue and, on acceptance, copied into
/// the issuer's issued store. It is never mutated after it has been stored.
///
/// # Fields
/// - `id`: Caller-supplied credential identifier, checked by verification
/// - `title`: Job title
/// - `start_month` / `start_year`: Start of the employment period
/// - `end_month` / `end_year`: End of the employment period
/// - `is_set`: Distinguishes a populated record from an empty/default one
///
/// # Serialization
/// Uses camelCase keys on the wire:
/// `{ id, title, startMonth, startYear, endMonth, endYear, isSet }`.
/// `isSet` is accepted as a boolean or as a `0`/`1` integer.
///
/// # Uniqueness
/// The registry does not enforce `id` uniqueness, either per issuer or globally.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Credential identifier presented during verification
    /// Example: 3
    pub id: u64,

    /// Job title
    /// Example: "Senior Dummy Engineer"
    pub title: String,

    /// Month the employment started (1-12)
    pub start_month: u32,

    /// Year the employment started
    pub start_year: u32,

    /// Month the employment ended (1-12)
    pub end_month: u32,

    /// Year the employment ended
    pub end_year: u32,

    /// Set by the registry when the record is stored
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_set: bool,
}

impl CredentialRecord {
    /// Builds an unset record with the given identifier and period.
    #[cfg(test)]
    pub fn new(
        id: u64,
        title: impl Into<String>,
        (start_month, start_year): (u32, u32),
        (end_month, end_year): (u32, u32),
    ) -> Self {
        Self {
            id,
            title: title.into(),
            start_month,
            start_year,
            end_month,
            end_year,
            is_set: false,
        }
    }

    /// Returns the record flagged as populated.
    ///
    /// Called by the registry at the moment a request is stored, so every
    /// record held in a pending queue or issued store reports `is_set == true`
    /// regardless of what the subject submitted.
    pub fn into_stored(mut self) -> Self {
        self.is_set = true;
        self
    }
}
