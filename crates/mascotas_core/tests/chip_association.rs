use chrono::NaiveDate;
use mascotas_core::{
    Chip, ChipService, DatabaseConfig, NotFoundError, PersistenceError, Pet, PetService, PetStore,
    RecordService, ServiceError, SqliteChipStore, SqliteConnectionProvider, SqlitePetStore, Store,
    StoreResult,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Pet store that counts `update` calls before delegating.
struct CountingPetStore {
    inner: SqlitePetStore,
    updates: Arc<AtomicUsize>,
}

impl Store<Pet> for CountingPetStore {
    fn create(&self, record: &mut Pet, conn: &Connection) -> StoreResult<()> {
        self.inner.create(record, conn)
    }

    fn read(&self, id: i64, conn: &Connection) -> StoreResult<Option<Pet>> {
        self.inner.read(id, conn)
    }

    fn read_all(&self, conn: &Connection) -> StoreResult<Vec<Pet>> {
        self.inner.read_all(conn)
    }

    fn update(&self, record: &Pet, conn: &Connection) -> StoreResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(record, conn)
    }

    fn delete(&self, id: i64, conn: &Connection) -> StoreResult<()> {
        self.inner.delete(id, conn)
    }
}

impl PetStore for CountingPetStore {
    fn find_by_name(&self, fragment: &str, conn: &Connection) -> StoreResult<Vec<Pet>> {
        self.inner.find_by_name(fragment, conn)
    }
}

/// Pet store whose inserts always fail.
struct RejectingPetStore;

impl Store<Pet> for RejectingPetStore {
    fn create(&self, _record: &mut Pet, _conn: &Connection) -> StoreResult<()> {
        Err(PersistenceError::InvalidData("rejected".to_string()).into())
    }

    fn read(&self, id: i64, conn: &Connection) -> StoreResult<Option<Pet>> {
        SqlitePetStore::new().read(id, conn)
    }

    fn read_all(&self, conn: &Connection) -> StoreResult<Vec<Pet>> {
        SqlitePetStore::new().read_all(conn)
    }

    fn update(&self, record: &Pet, conn: &Connection) -> StoreResult<()> {
        SqlitePetStore::new().update(record, conn)
    }

    fn delete(&self, id: i64, conn: &Connection) -> StoreResult<()> {
        SqlitePetStore::new().delete(id, conn)
    }
}

impl PetStore for RejectingPetStore {
    fn find_by_name(&self, fragment: &str, conn: &Connection) -> StoreResult<Vec<Pet>> {
        SqlitePetStore::new().find_by_name(fragment, conn)
    }
}

fn setup() -> (tempfile::TempDir, PathBuf, SqliteConnectionProvider) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("association.db");
    let provider = SqliteConnectionProvider::new(&DatabaseConfig::sqlite(&path)).unwrap();
    (dir, path, provider)
}

fn new_chip(code: &str) -> Chip {
    Chip::new(code, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), "VetCenter")
}

fn saved_chip(provider: &SqliteConnectionProvider, code: &str) -> Chip {
    let mut chip = new_chip(code);
    ChipService::new(provider).insert(&mut chip).unwrap();
    chip
}

fn saved_pet(service: &PetService<&SqliteConnectionProvider>, name: &str) -> Pet {
    let mut pet = Pet::new(name, "Perro", "Ana");
    service.insert(&mut pet).unwrap();
    pet
}

fn count(path: &Path, table: &str) -> i64 {
    let conn = Connection::open(path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn stored_chip_fk(path: &Path, pet_id: i64) -> Option<i64> {
    let conn = Connection::open(path).unwrap();
    conn.query_row(
        "SELECT id_microchip_fk FROM mascota WHERE id_mascota = ?1;",
        [pet_id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn insert_with_chip_writes_both_rows() {
    let (_dir, path, provider) = setup();
    let service = PetService::new(&provider);
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(new_chip("NEW-1"));

    service.insert_with_chip(&mut pet).unwrap();

    let chip_id = pet.chip_id().unwrap();
    assert_eq!(stored_chip_fk(&path, pet.id.unwrap()), Some(chip_id));

    let loaded = service.get_by_id(pet.id.unwrap()).unwrap().unwrap();
    let chip = loaded.chip.unwrap();
    assert_eq!(chip.id, Some(chip_id));
    assert_eq!(chip.code, "NEW-1");
    assert_eq!(chip.clinic, "VetCenter");
}

#[test]
fn insert_with_chip_reuses_a_persisted_chip() {
    let (_dir, path, provider) = setup();
    let chip = saved_chip(&provider, "OLD-1");
    let service = PetService::new(&provider);
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(chip.clone());

    service.insert_with_chip(&mut pet).unwrap();

    assert_eq!(pet.chip_id(), chip.id);
    assert_eq!(count(&path, "microchip"), 1);
}

#[test]
fn duplicate_chip_code_leaves_no_pet_row() {
    let (_dir, path, provider) = setup();
    saved_chip(&provider, "TAKEN");
    let service = PetService::new(&provider);
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(new_chip("TAKEN"));

    let err = service.insert_with_chip(&mut pet).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Persistence(PersistenceError::DuplicateChipCode { .. })
    ));
    assert_eq!(count(&path, "mascota"), 0);
    assert_eq!(count(&path, "microchip"), 1);
    assert!(pet.id.is_none());
    assert!(pet.chip_id().is_none());
}

#[test]
fn pet_failure_rolls_back_the_new_chip() {
    let (_dir, path, provider) = setup();
    let service = PetService::with_stores(&provider, RejectingPetStore, SqliteChipStore::new());
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(new_chip("FRESH"));

    let err = service.insert_with_chip(&mut pet).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Persistence(PersistenceError::InvalidData(_))
    ));
    assert_eq!(count(&path, "microchip"), 0);
    assert!(pet.chip_id().is_none());
}

#[test]
fn plain_insert_rejects_unsaved_chip() {
    let (_dir, path, provider) = setup();
    let service = PetService::new(&provider);
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(new_chip("LOOSE"));

    let err = service.insert(&mut pet).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Persistence(PersistenceError::UnsavedChipReference { .. })
    ));
    assert_eq!(count(&path, "mascota"), 0);
    assert_eq!(count(&path, "microchip"), 0);
}

#[test]
fn assign_chip_links_existing_chip() {
    let (_dir, path, provider) = setup();
    let chip = saved_chip(&provider, "ABC123");
    let service = PetService::new(&provider);
    let pet = saved_pet(&service, "Max");

    let updated = service.assign_chip(pet.id.unwrap(), "ABC123").unwrap();

    assert_eq!(updated.chip_id(), chip.id);
    assert_eq!(stored_chip_fk(&path, pet.id.unwrap()), chip.id);
}

#[test]
fn assign_unknown_code_writes_nothing() {
    let (_dir, path, provider) = setup();
    let chip = saved_chip(&provider, "KNOWN");
    let updates = Arc::new(AtomicUsize::new(0));
    let service = PetService::with_stores(
        &provider,
        CountingPetStore {
            inner: SqlitePetStore::new(),
            updates: Arc::clone(&updates),
        },
        SqliteChipStore::new(),
    );
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(chip.clone());
    service.insert(&mut pet).unwrap();
    let pet_id = pet.id.unwrap();

    let err = service.assign_chip(pet_id, "UNKNOWN").unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound(NotFoundError::ChipCode(ref code)) if code == "UNKNOWN"
    ));
    assert_eq!(updates.load(Ordering::SeqCst), 0);
    assert_eq!(stored_chip_fk(&path, pet_id), chip.id);
}

#[test]
fn assign_to_missing_pet_is_not_found() {
    let (_dir, _path, provider) = setup();
    saved_chip(&provider, "KNOWN");
    let service = PetService::new(&provider);

    let err = service.assign_chip(77, "KNOWN").unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(NotFoundError::Pet(77))));
}

#[test]
fn assign_deleted_chip_code_is_not_found() {
    let (_dir, _path, provider) = setup();
    let chip = saved_chip(&provider, "RETIRED");
    ChipService::new(&provider).delete(chip.id.unwrap()).unwrap();
    let service = PetService::new(&provider);
    let pet = saved_pet(&service, "Max");

    let err = service.assign_chip(pet.id.unwrap(), "RETIRED").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound(NotFoundError::ChipCode(_))
    ));
}

#[test]
fn reassignment_replaces_previous_chip() {
    let (_dir, path, provider) = setup();
    let first = saved_chip(&provider, "FIRST");
    let second = saved_chip(&provider, "SECOND");
    let service = PetService::new(&provider);
    let pet = saved_pet(&service, "Max");
    let pet_id = pet.id.unwrap();

    service.assign_chip(pet_id, "FIRST").unwrap();
    service.assign_chip(pet_id, "SECOND").unwrap();

    assert_eq!(stored_chip_fk(&path, pet_id), second.id);
    // The previous chip is free again.
    let other = saved_pet(&service, "Rex");
    let linked = service.assign_chip(other.id.unwrap(), "FIRST").unwrap();
    assert_eq!(linked.chip_id(), first.id);
}

#[test]
fn chip_held_by_another_pet_cannot_be_assigned() {
    let (_dir, path, provider) = setup();
    let chip = saved_chip(&provider, "HELD");
    let service = PetService::new(&provider);
    let owner = saved_pet(&service, "Max");
    let other = saved_pet(&service, "Rex");
    service.assign_chip(owner.id.unwrap(), "HELD").unwrap();

    let err = service.assign_chip(other.id.unwrap(), "HELD").unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Persistence(PersistenceError::ChipAlreadyAssigned { chip_id })
            if Some(chip_id) == chip.id
    ));
    assert_eq!(stored_chip_fk(&path, other.id.unwrap()), None);
    assert_eq!(stored_chip_fk(&path, owner.id.unwrap()), chip.id);
}

#[test]
fn remove_chip_clears_reference_and_keeps_chip() {
    let (_dir, path, provider) = setup();
    let chip = saved_chip(&provider, "LEAVE");
    let service = PetService::new(&provider);
    let pet = saved_pet(&service, "Max");
    service.assign_chip(pet.id.unwrap(), "LEAVE").unwrap();

    let updated = service.remove_chip(pet.id.unwrap()).unwrap();

    assert!(updated.chip.is_none());
    assert_eq!(stored_chip_fk(&path, pet.id.unwrap()), None);
    let still_there = ChipService::new(&provider)
        .get_by_id(chip.id.unwrap())
        .unwrap();
    assert_eq!(still_there, Some(chip));
}

#[test]
fn remove_chip_on_missing_pet_is_not_found() {
    let (_dir, _path, provider) = setup();
    let err = PetService::new(&provider).remove_chip(5).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(NotFoundError::Pet(5))));
}

#[test]
fn deleting_a_pet_keeps_its_chip() {
    let (_dir, _path, provider) = setup();
    let service = PetService::new(&provider);
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(new_chip("STAY"));
    service.insert_with_chip(&mut pet).unwrap();

    service.delete(pet.id.unwrap()).unwrap();

    let chip = ChipService::new(&provider).get_by_code("STAY").unwrap();
    assert!(chip.is_some_and(|chip| !chip.deleted));
}

#[test]
fn deleted_chip_stays_visible_on_its_pet() {
    let (_dir, _path, provider) = setup();
    let service = PetService::new(&provider);
    let mut pet = Pet::new("Max", "Perro", "Ana").with_chip(new_chip("FADE"));
    service.insert_with_chip(&mut pet).unwrap();

    ChipService::new(&provider)
        .delete(pet.chip_id().unwrap())
        .unwrap();

    let loaded = service.get_by_id(pet.id.unwrap()).unwrap().unwrap();
    let chip = loaded.chip.unwrap();
    assert_eq!(chip.code, "FADE");
    assert!(chip.deleted);
}
