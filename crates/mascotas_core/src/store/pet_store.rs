//! SQLite pet store over the `mascota` table.
//!
//! # Responsibility
//! - Persist pets and their nullable chip reference (`id_microchip_fk`).
//! - Hydrate the referenced chip on every read path through a LEFT JOIN.
//!
//! # Invariants
//! - Only pets with `eliminado = 0` are returned.
//! - The hydrated chip is not filtered by its own soft-delete flag; callers
//!   see `chip.deleted` as stored.
//! - A chip reference without identity is never written.

use super::{
    bool_to_int, constraint_violation, escape_like, parse_deleted_flag, PetStore, Store,
};
use crate::error::{NotFoundError, PersistenceError, StoreError, StoreResult};
use crate::model::{Chip, ChipId, Pet, PetId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

const PET_TABLE: &str = "mascota";

const PET_SELECT_SQL: &str = "SELECT
    m.id_mascota AS id_mascota,
    m.nombre AS nombre,
    m.especie AS especie,
    m.raza AS raza,
    m.fecha_nacimiento AS fecha_nacimiento,
    m.duenio AS duenio,
    m.id_microchip_fk AS id_microchip_fk,
    m.eliminado AS eliminado,
    c.id_microchip AS chip_id,
    c.codigo AS chip_codigo,
    c.fecha_implantacion AS chip_fecha_implantacion,
    c.veterinaria AS chip_veterinaria,
    c.observaciones AS chip_observaciones,
    c.eliminado AS chip_eliminado
FROM mascota m
LEFT JOIN microchip c ON c.id_microchip = m.id_microchip_fk";

/// Stateless SQLite implementation of `PetStore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlitePetStore;

impl SqlitePetStore {
    pub fn new() -> Self {
        Self
    }

    fn query_pets(
        &self,
        conn: &Connection,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> StoreResult<Vec<Pet>> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut pets = Vec::new();
        while let Some(row) = rows.next()? {
            pets.push(parse_pet_row(row)?);
        }
        Ok(pets)
    }
}

impl Store<Pet> for SqlitePetStore {
    fn create(&self, pet: &mut Pet, conn: &Connection) -> StoreResult<()> {
        let chip_id = chip_reference(pet)?;

        let id: Option<PetId> = conn
            .query_row(
                "INSERT INTO mascota (
                    nombre,
                    especie,
                    raza,
                    fecha_nacimiento,
                    duenio,
                    id_microchip_fk
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                RETURNING id_mascota;",
                params![
                    pet.name.as_str(),
                    pet.species.as_str(),
                    pet.breed.as_deref(),
                    pet.born_on,
                    pet.owner.as_str(),
                    chip_id,
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| translate_write_error(err, chip_id))?;

        let id = id.ok_or(PersistenceError::MissingGeneratedKey { table: PET_TABLE })?;
        pet.id = Some(id);
        pet.deleted = false;
        debug!(
            "event=pet_create module=store status=ok pet_id={} has_chip={}",
            id,
            chip_id.is_some()
        );
        Ok(())
    }

    fn read(&self, id: PetId, conn: &Connection) -> StoreResult<Option<Pet>> {
        let mut stmt = conn.prepare(&format!(
            "{PET_SELECT_SQL}
             WHERE m.id_mascota = ?1
               AND m.eliminado = 0;"
        ))?;
        let pet = stmt
            .query_row([id], |row| Ok(parse_pet_row(row)))
            .optional()?;
        pet.transpose()
    }

    fn read_all(&self, conn: &Connection) -> StoreResult<Vec<Pet>> {
        self.query_pets(
            conn,
            &format!(
                "{PET_SELECT_SQL}
                 WHERE m.eliminado = 0
                 ORDER BY m.id_mascota ASC;"
            ),
            &[],
        )
    }

    fn update(&self, pet: &Pet, conn: &Connection) -> StoreResult<()> {
        let id = pet
            .id
            .ok_or(PersistenceError::MissingIdentity { table: PET_TABLE })?;
        let chip_id = chip_reference(pet)?;

        let changed = conn
            .execute(
                "UPDATE mascota
                 SET
                    nombre = ?1,
                    especie = ?2,
                    raza = ?3,
                    fecha_nacimiento = ?4,
                    duenio = ?5,
                    id_microchip_fk = ?6
                 WHERE id_mascota = ?7
                   AND eliminado = 0;",
                params![
                    pet.name.as_str(),
                    pet.species.as_str(),
                    pet.breed.as_deref(),
                    pet.born_on,
                    pet.owner.as_str(),
                    chip_id,
                    id,
                ],
            )
            .map_err(|err| translate_write_error(err, chip_id))?;

        if changed == 0 {
            return Err(NotFoundError::Pet(id).into());
        }
        debug!(
            "event=pet_update module=store status=ok pet_id={} has_chip={}",
            id,
            chip_id.is_some()
        );
        Ok(())
    }

    fn delete(&self, id: PetId, conn: &Connection) -> StoreResult<()> {
        let changed = conn.execute(
            "UPDATE mascota SET eliminado = ?1 WHERE id_mascota = ?2;",
            params![bool_to_int(true), id],
        )?;
        debug!("event=pet_delete module=store status=ok pet_id={id} changed={changed}");
        Ok(())
    }
}

impl PetStore for SqlitePetStore {
    fn find_by_name(&self, fragment: &str, conn: &Connection) -> StoreResult<Vec<Pet>> {
        let pattern = format!("%{}%", escape_like(fragment));
        self.query_pets(
            conn,
            &format!(
                "{PET_SELECT_SQL}
                 WHERE m.eliminado = 0
                   AND m.nombre LIKE ?1 ESCAPE '\\'
                 ORDER BY m.id_mascota ASC;"
            ),
            &[&pattern as &dyn ToSql],
        )
    }
}

/// Returns the chip id to store in `id_microchip_fk`.
fn chip_reference(pet: &Pet) -> StoreResult<Option<ChipId>> {
    match pet.chip.as_ref() {
        None => Ok(None),
        Some(chip) => match chip.id {
            Some(id) => Ok(Some(id)),
            None => Err(PersistenceError::UnsavedChipReference {
                code: chip.code.clone(),
            }
            .into()),
        },
    }
}

fn parse_pet_row(row: &Row<'_>) -> StoreResult<Pet> {
    let deleted = parse_deleted_flag(row.get("eliminado")?, "mascota.eliminado")?;
    let chip_fk: Option<ChipId> = row.get("id_microchip_fk")?;
    let joined_chip_id: Option<ChipId> = row.get("chip_id")?;

    let chip = match (chip_fk, joined_chip_id) {
        (Some(_), Some(chip_id)) => Some(Chip {
            id: Some(chip_id),
            code: row.get("chip_codigo")?,
            implanted_on: row.get("chip_fecha_implantacion")?,
            clinic: row.get("chip_veterinaria")?,
            notes: row.get("chip_observaciones")?,
            deleted: parse_deleted_flag(row.get("chip_eliminado")?, "microchip.eliminado")?,
        }),
        _ => None,
    };

    Ok(Pet {
        id: Some(row.get("id_mascota")?),
        name: row.get("nombre")?,
        species: row.get("especie")?,
        breed: row.get("raza")?,
        born_on: row.get("fecha_nacimiento")?,
        owner: row.get("duenio")?,
        deleted,
        chip,
    })
}

fn translate_write_error(err: rusqlite::Error, chip_id: Option<ChipId>) -> StoreError {
    let Some(chip_id) = chip_id else {
        return err.into();
    };
    match constraint_violation(&err) {
        Some(message) if message.contains("mascota.id_microchip_fk") => {
            PersistenceError::ChipAlreadyAssigned { chip_id }.into()
        }
        Some(message) if message.contains("FOREIGN KEY") => {
            PersistenceError::DanglingChipReference { chip_id }.into()
        }
        _ => err.into(),
    }
}
