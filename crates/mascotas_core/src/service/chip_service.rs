//! Chip use-case service.
//!
//! # Invariants
//! - Code and clinic are non-blank before a unit of work is opened.
//! - The implantation date is always present (`NaiveDate` is not optional).

use super::{is_blank, RecordService};
use crate::db::ConnectionSource;
use crate::error::{NotFoundError, ServiceResult, ValidationError};
use crate::model::{Chip, ChipId};
use crate::store::{ChipStore, SqliteChipStore};
use crate::uow::UnitOfWork;
use log::info;

/// Chip service over a connection source and a chip store.
pub struct ChipService<S, C = SqliteChipStore> {
    source: S,
    chips: C,
}

impl<S: ConnectionSource> ChipService<S> {
    /// Creates a service backed by the SQLite chip store.
    pub fn new(source: S) -> Self {
        Self::with_store(source, SqliteChipStore::new())
    }
}

impl<S: ConnectionSource, C: ChipStore> ChipService<S, C> {
    pub fn with_store(source: S, chips: C) -> Self {
        Self { source, chips }
    }

    /// Looks up an active chip by its code.
    pub fn get_by_code(&self, code: &str) -> ServiceResult<Option<Chip>> {
        if is_blank(code) {
            return Err(ValidationError::BlankChipCode.into());
        }
        UnitOfWork::read(&self.source, |conn| Ok(self.chips.find_by_code(code, conn)?))
    }
}

impl<S: ConnectionSource, C: ChipStore> RecordService<Chip> for ChipService<S, C> {
    fn insert(&self, chip: &mut Chip) -> ServiceResult<()> {
        validate_chip(chip)?;
        let outcome = UnitOfWork::transact(&self.source, |conn| Ok(self.chips.create(chip, conn)?));
        match outcome {
            Ok(()) => {
                info!(
                    "event=chip_insert module=service status=ok chip_id={}",
                    chip.id.unwrap_or_default()
                );
                Ok(())
            }
            Err(err) => {
                chip.id = None;
                Err(err)
            }
        }
    }

    fn update(&self, chip: &Chip) -> ServiceResult<()> {
        let id = chip
            .id
            .ok_or(ValidationError::MissingId { entity: "chip" })?;
        validate_chip(chip)?;
        UnitOfWork::transact(&self.source, |conn| Ok(self.chips.update(chip, conn)?))?;
        info!("event=chip_update module=service status=ok chip_id={id}");
        Ok(())
    }

    fn delete(&self, id: ChipId) -> ServiceResult<()> {
        UnitOfWork::transact(&self.source, |conn| Ok(self.chips.delete(id, conn)?))?;
        info!("event=chip_delete module=service status=ok chip_id={id}");
        Ok(())
    }

    fn get_by_id(&self, id: ChipId) -> ServiceResult<Option<Chip>> {
        UnitOfWork::read(&self.source, |conn| Ok(self.chips.read(id, conn)?))
    }

    fn get_all(&self) -> ServiceResult<Vec<Chip>> {
        UnitOfWork::read(&self.source, |conn| Ok(self.chips.read_all(conn)?))
    }
}

/// Fails with `NotFoundError::ChipCode` when `chip` is `None`.
pub(crate) fn require_chip(chip: Option<Chip>, code: &str) -> ServiceResult<Chip> {
    chip.ok_or_else(|| NotFoundError::ChipCode(code.to_string()).into())
}

pub(crate) fn validate_chip(chip: &Chip) -> Result<(), ValidationError> {
    if is_blank(&chip.code) {
        return Err(ValidationError::BlankChipCode);
    }
    if is_blank(&chip.clinic) {
        return Err(ValidationError::BlankClinic);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_chip;
    use crate::error::ValidationError;
    use crate::model::Chip;
    use chrono::NaiveDate;

    fn chip(code: &str, clinic: &str) -> Chip {
        Chip::new(code, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), clinic)
    }

    #[test]
    fn blank_code_is_rejected_before_clinic() {
        assert_eq!(
            validate_chip(&chip("  ", "")),
            Err(ValidationError::BlankChipCode)
        );
    }

    #[test]
    fn blank_clinic_is_rejected() {
        assert_eq!(
            validate_chip(&chip("ABC123", "\t")),
            Err(ValidationError::BlankClinic)
        );
        assert_eq!(validate_chip(&chip("ABC123", "VetCenter")), Ok(()));
    }
}
