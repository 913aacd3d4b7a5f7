//! Pet model.
//!
//! # Invariants
//! - At most one chip is associated with a pet at any time.
//! - `chip` is a reference: dropping or deleting a pet leaves the chip alone.

use super::chip::{Chip, ChipId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Server-assigned pet identity (`mascota.id_mascota`).
pub type PetId = i64;

/// Pet record, optionally carrying its associated chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// `None` until the pet row is inserted.
    pub id: Option<PetId>,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub born_on: Option<NaiveDate>,
    /// Owner's name.
    pub owner: String,
    /// Soft delete tombstone.
    pub deleted: bool,
    /// Associated chip, hydrated on every read path.
    ///
    /// A chip without `id` is only accepted by `PetService::insert_with_chip`,
    /// which creates it in the same transaction.
    pub chip: Option<Chip>,
}

impl Pet {
    /// Creates an unsaved pet with no breed, birth date or chip.
    pub fn new(
        name: impl Into<String>,
        species: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            species: species.into(),
            breed: None,
            born_on: None,
            owner: owner.into(),
            deleted: false,
            chip: None,
        }
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    pub fn with_birth_date(mut self, born_on: NaiveDate) -> Self {
        self.born_on = Some(born_on);
        self
    }

    pub fn with_chip(mut self, chip: Chip) -> Self {
        self.chip = Some(chip);
        self
    }

    /// Id of the referenced chip, if the reference is persisted.
    pub fn chip_id(&self) -> Option<ChipId> {
        self.chip.as_ref().and_then(|chip| chip.id)
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::Pet;
    use crate::model::Chip;
    use chrono::NaiveDate;

    #[test]
    fn new_pet_starts_unsaved_and_unchipped() {
        let pet = Pet::new("Max", "Perro", "Ana");
        assert!(pet.id.is_none());
        assert!(pet.chip.is_none());
        assert!(pet.is_active());
    }

    #[test]
    fn chip_id_requires_persisted_chip() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(Chip::new("A1", date, "Vet"));
        assert_eq!(pet.chip_id(), None);

        if let Some(chip) = pet.chip.as_mut() {
            chip.id = Some(4);
        }
        assert_eq!(pet.chip_id(), Some(4));
    }
}
