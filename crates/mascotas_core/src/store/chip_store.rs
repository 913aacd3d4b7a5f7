//! SQLite chip store over the `microchip` table.
//!
//! # Invariants
//! - `update` overwrites every mutable column, `codigo` included.
//! - Duplicate codes surface as `PersistenceError::DuplicateChipCode` on
//!   both insert and update.

use super::{bool_to_int, constraint_violation, parse_deleted_flag, ChipStore, Store};
use crate::error::{NotFoundError, PersistenceError, StoreError, StoreResult};
use crate::model::{Chip, ChipId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const CHIP_TABLE: &str = "microchip";

const CHIP_SELECT_SQL: &str = "SELECT
    id_microchip,
    codigo,
    fecha_implantacion,
    veterinaria,
    observaciones,
    eliminado
FROM microchip";

/// Stateless SQLite implementation of `ChipStore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteChipStore;

impl SqliteChipStore {
    pub fn new() -> Self {
        Self
    }
}

impl Store<Chip> for SqliteChipStore {
    fn create(&self, chip: &mut Chip, conn: &Connection) -> StoreResult<()> {
        let id: Option<ChipId> = conn
            .query_row(
                "INSERT INTO microchip (
                    codigo,
                    fecha_implantacion,
                    veterinaria,
                    observaciones
                ) VALUES (?1, ?2, ?3, ?4)
                RETURNING id_microchip;",
                params![
                    chip.code.as_str(),
                    chip.implanted_on,
                    chip.clinic.as_str(),
                    chip.notes.as_deref(),
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| translate_write_error(err, chip))?;

        let id = id.ok_or(PersistenceError::MissingGeneratedKey { table: CHIP_TABLE })?;
        chip.id = Some(id);
        chip.deleted = false;
        debug!("event=chip_create module=store status=ok chip_id={id}");
        Ok(())
    }

    fn read(&self, id: ChipId, conn: &Connection) -> StoreResult<Option<Chip>> {
        let mut stmt = conn.prepare(&format!(
            "{CHIP_SELECT_SQL}
             WHERE id_microchip = ?1
               AND eliminado = 0;"
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_chip_row(row)?));
        }
        Ok(None)
    }

    fn read_all(&self, conn: &Connection) -> StoreResult<Vec<Chip>> {
        let mut stmt = conn.prepare(&format!(
            "{CHIP_SELECT_SQL}
             WHERE eliminado = 0
             ORDER BY id_microchip ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut chips = Vec::new();
        while let Some(row) = rows.next()? {
            chips.push(parse_chip_row(row)?);
        }
        Ok(chips)
    }

    fn update(&self, chip: &Chip, conn: &Connection) -> StoreResult<()> {
        let id = chip
            .id
            .ok_or(PersistenceError::MissingIdentity { table: CHIP_TABLE })?;

        let changed = conn
            .execute(
                "UPDATE microchip
                 SET
                    codigo = ?1,
                    fecha_implantacion = ?2,
                    veterinaria = ?3,
                    observaciones = ?4
                 WHERE id_microchip = ?5
                   AND eliminado = 0;",
                params![
                    chip.code.as_str(),
                    chip.implanted_on,
                    chip.clinic.as_str(),
                    chip.notes.as_deref(),
                    id
                ],
            )
            .map_err(|err| translate_write_error(err, chip))?;

        if changed == 0 {
            return Err(NotFoundError::Chip(id).into());
        }
        Ok(())
    }

    fn delete(&self, id: ChipId, conn: &Connection) -> StoreResult<()> {
        let changed = conn.execute(
            "UPDATE microchip SET eliminado = ?1 WHERE id_microchip = ?2;",
            params![bool_to_int(true), id],
        )?;
        debug!("event=chip_delete module=store status=ok chip_id={id} changed={changed}");
        Ok(())
    }
}

impl ChipStore for SqliteChipStore {
    fn find_by_code(&self, code: &str, conn: &Connection) -> StoreResult<Option<Chip>> {
        let chip = conn
            .query_row(
                &format!(
                    "{CHIP_SELECT_SQL}
                     WHERE codigo = ?1
                       AND eliminado = 0;"
                ),
                [code],
                |row| Ok(parse_chip_row(row)),
            )
            .optional()?;
        chip.transpose()
    }
}

fn parse_chip_row(row: &Row<'_>) -> StoreResult<Chip> {
    let deleted = parse_deleted_flag(row.get("eliminado")?, "microchip.eliminado")?;
    Ok(Chip {
        id: Some(row.get("id_microchip")?),
        code: row.get("codigo")?,
        implanted_on: row.get("fecha_implantacion")?,
        clinic: row.get("veterinaria")?,
        notes: row.get("observaciones")?,
        deleted,
    })
}

fn translate_write_error(err: rusqlite::Error, chip: &Chip) -> StoreError {
    match constraint_violation(&err) {
        Some(message) if message.contains("microchip.codigo") => {
            PersistenceError::DuplicateChipCode {
                code: chip.code.clone(),
            }
            .into()
        }
        _ => err.into(),
    }
}
