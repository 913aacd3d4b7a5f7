//! Pet use-case service and chip association protocol.
//!
//! # Responsibility
//! - Validate pets before persistence.
//! - Create a pet together with a new chip atomically.
//! - Assign, reassign and remove a pet's chip by chip code.
//!
//! # Invariants
//! - Each public operation opens exactly one write unit; association lookups
//!   run in a separate read unit and no write unit is opened when they fail.
//! - Chips are never created by the association protocol.
//! - "One chip per pet" is enforced by storage; a conflict surfaces as
//!   `PersistenceError::ChipAlreadyAssigned`.
//!
//! # See also
//! - `crate::uow::UnitOfWork::transact`

use super::chip_service::{require_chip, validate_chip};
use super::{is_blank, RecordService};
use crate::db::ConnectionSource;
use crate::error::{NotFoundError, ServiceResult, ValidationError};
use crate::model::{Pet, PetId};
use crate::store::{ChipStore, PetStore, SqliteChipStore, SqlitePetStore};
use crate::uow::UnitOfWork;
use log::info;

/// Pet service over a connection source plus pet and chip stores.
pub struct PetService<S, P = SqlitePetStore, C = SqliteChipStore> {
    source: S,
    pets: P,
    chips: C,
}

impl<S: ConnectionSource> PetService<S> {
    /// Creates a service backed by the SQLite stores.
    pub fn new(source: S) -> Self {
        Self::with_stores(source, SqlitePetStore::new(), SqliteChipStore::new())
    }
}

impl<S, P, C> PetService<S, P, C>
where
    S: ConnectionSource,
    P: PetStore,
    C: ChipStore,
{
    pub fn with_stores(source: S, pets: P, chips: C) -> Self {
        Self {
            source,
            pets,
            chips,
        }
    }

    /// Inserts a pet and, when its chip has no id yet, the chip first.
    ///
    /// Both rows are committed together or not at all. On failure the ids
    /// assigned during the attempt are cleared again.
    ///
    /// # Errors
    /// - `ValidationError` for blank pet fields, or blank chip code/clinic
    ///   when a new chip is attached.
    /// - `PersistenceError::DuplicateChipCode` when the new chip's code is
    ///   taken; no pet row is written in that case.
    pub fn insert_with_chip(&self, pet: &mut Pet) -> ServiceResult<()> {
        validate_pet(pet)?;
        let creates_chip = match pet.chip.as_ref() {
            Some(chip) if chip.id.is_none() => {
                validate_chip(chip)?;
                true
            }
            _ => false,
        };

        let outcome = UnitOfWork::transact(&self.source, |conn| {
            if creates_chip {
                if let Some(chip) = pet.chip.as_mut() {
                    self.chips.create(chip, conn)?;
                }
            }
            self.pets.create(pet, conn)?;
            Ok(())
        });

        if let Err(err) = outcome {
            pet.id = None;
            if creates_chip {
                if let Some(chip) = pet.chip.as_mut() {
                    chip.id = None;
                }
            }
            return Err(err);
        }
        info!(
            "event=pet_insert module=service status=ok pet_id={} chip_id={} chip_created={}",
            pet.id.unwrap_or_default(),
            pet.chip_id().unwrap_or_default(),
            creates_chip
        );
        Ok(())
    }

    /// Substring search on pet name over active pets.
    pub fn find_by_name(&self, fragment: &str) -> ServiceResult<Vec<Pet>> {
        UnitOfWork::read(&self.source, |conn| {
            Ok(self.pets.find_by_name(fragment, conn)?)
        })
    }

    /// Associates the chip identified by `code` with pet `pet_id`.
    ///
    /// Also used to reassign a pet that already holds a chip. Returns the
    /// pet as written.
    ///
    /// # Errors
    /// - `ValidationError::BlankChipCode` for a blank code.
    /// - `NotFoundError::ChipCode` / `NotFoundError::Pet` when either lookup
    ///   misses; nothing is written.
    /// - `PersistenceError::ChipAlreadyAssigned` when another pet holds the
    ///   chip.
    pub fn assign_chip(&self, pet_id: PetId, code: &str) -> ServiceResult<Pet> {
        if is_blank(code) {
            return Err(ValidationError::BlankChipCode.into());
        }

        let (mut pet, chip) = UnitOfWork::read(&self.source, |conn| {
            let chip = require_chip(self.chips.find_by_code(code, conn)?, code)?;
            let pet = self
                .pets
                .read(pet_id, conn)?
                .ok_or(NotFoundError::Pet(pet_id))?;
            Ok((pet, chip))
        })?;

        let chip_id = chip.id.unwrap_or_default();
        let previous = pet.chip_id();
        pet.chip = Some(chip);
        self.update(&pet)?;
        info!(
            "event=chip_assign module=service status=ok pet_id={} chip_id={} reassigned={}",
            pet_id,
            chip_id,
            previous.is_some_and(|prev| prev != chip_id)
        );
        Ok(pet)
    }

    /// Clears the chip reference of pet `pet_id`. The chip row is untouched.
    pub fn remove_chip(&self, pet_id: PetId) -> ServiceResult<Pet> {
        let mut pet = self
            .get_by_id(pet_id)?
            .ok_or(NotFoundError::Pet(pet_id))?;
        pet.chip = None;
        self.update(&pet)?;
        info!("event=chip_remove module=service status=ok pet_id={pet_id}");
        Ok(pet)
    }
}

impl<S, P, C> RecordService<Pet> for PetService<S, P, C>
where
    S: ConnectionSource,
    P: PetStore,
    C: ChipStore,
{
    /// Inserts the pet row only; an attached chip must already have an id.
    fn insert(&self, pet: &mut Pet) -> ServiceResult<()> {
        validate_pet(pet)?;
        let outcome = UnitOfWork::transact(&self.source, |conn| Ok(self.pets.create(pet, conn)?));
        if let Err(err) = outcome {
            pet.id = None;
            return Err(err);
        }
        info!(
            "event=pet_insert module=service status=ok pet_id={} chip_id={} chip_created=false",
            pet.id.unwrap_or_default(),
            pet.chip_id().unwrap_or_default()
        );
        Ok(())
    }

    fn update(&self, pet: &Pet) -> ServiceResult<()> {
        let id = pet.id.ok_or(ValidationError::MissingId { entity: "pet" })?;
        validate_pet(pet)?;
        UnitOfWork::transact(&self.source, |conn| Ok(self.pets.update(pet, conn)?))?;
        info!("event=pet_update module=service status=ok pet_id={id}");
        Ok(())
    }

    fn delete(&self, id: PetId) -> ServiceResult<()> {
        UnitOfWork::transact(&self.source, |conn| Ok(self.pets.delete(id, conn)?))?;
        info!("event=pet_delete module=service status=ok pet_id={id}");
        Ok(())
    }

    fn get_by_id(&self, id: PetId) -> ServiceResult<Option<Pet>> {
        UnitOfWork::read(&self.source, |conn| Ok(self.pets.read(id, conn)?))
    }

    fn get_all(&self) -> ServiceResult<Vec<Pet>> {
        UnitOfWork::read(&self.source, |conn| Ok(self.pets.read_all(conn)?))
    }
}

fn validate_pet(pet: &Pet) -> Result<(), ValidationError> {
    if is_blank(&pet.name) {
        return Err(ValidationError::BlankPetName);
    }
    if is_blank(&pet.species) {
        return Err(ValidationError::BlankSpecies);
    }
    if is_blank(&pet.owner) {
        return Err(ValidationError::BlankOwner);
    }
    if let Some(chip) = pet.chip.as_ref() {
        if is_blank(&chip.code) {
            return Err(ValidationError::BlankChipCode);
        }
    }
    Ok(())
}
