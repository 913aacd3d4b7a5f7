//! Identification chip model.
//!
//! # Invariants
//! - `code` is the immutable business key and is unique across chips.
//! - A chip has no outbound reference; pets point at chips, not vice versa.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Server-assigned chip identity (`microchip.id_microchip`).
pub type ChipId = i64;

/// Implantable identification chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chip {
    /// `None` until the chip row is inserted.
    pub id: Option<ChipId>,
    pub code: String,
    pub implanted_on: NaiveDate,
    /// Issuing veterinary clinic.
    pub clinic: String,
    pub notes: Option<String>,
    /// Soft delete tombstone.
    pub deleted: bool,
}

impl Chip {
    /// Creates an unsaved chip with no notes.
    pub fn new(code: impl Into<String>, implanted_on: NaiveDate, clinic: impl Into<String>) -> Self {
        Self {
            id: None,
            code: code.into(),
            implanted_on,
            clinic: clinic.into(),
            notes: None,
            deleted: false,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns whether the chip row has been inserted.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}
