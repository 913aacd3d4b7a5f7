//! Pet commands

use super::{print_json, CommandResult};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use mascotas_core::{
    Chip, ChipService, NotFoundError, Pet, PetId, PetService, RecordService,
    SqliteConnectionProvider,
};
use serde_json::json;

#[derive(Debug, Args)]
pub struct PetArgs {
    #[command(subcommand)]
    pub command: PetCommand,
}

#[derive(Debug, Subcommand)]
pub enum PetCommand {
    /// Register a pet, optionally with a new or existing chip
    Add(AddPetArgs),
    /// List active pets
    List,
    /// Show one pet by id
    Get { id: PetId },
    /// Search pets whose name contains a fragment
    Find { fragment: String },
    /// Change pet fields
    Update(UpdatePetArgs),
    /// Soft-delete a pet; its chip is kept
    Delete { id: PetId },
    /// Associate an existing chip with a pet
    AssignChip { id: PetId, code: String },
    /// Remove the chip association of a pet
    RemoveChip { id: PetId },
}

#[derive(Debug, Args)]
pub struct AddPetArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub species: String,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub breed: Option<String>,

    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    pub born: Option<NaiveDate>,

    /// Chip code; refers to an existing chip unless --chip-implanted is given
    #[arg(long)]
    pub chip_code: Option<String>,

    /// Implantation date of a new chip (YYYY-MM-DD)
    #[arg(long, requires_all = ["chip_code", "chip_clinic"])]
    pub chip_implanted: Option<NaiveDate>,

    #[arg(long, requires = "chip_implanted")]
    pub chip_clinic: Option<String>,

    #[arg(long, requires = "chip_implanted")]
    pub chip_notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdatePetArgs {
    pub id: PetId,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub species: Option<String>,

    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub breed: Option<String>,

    #[arg(long)]
    pub born: Option<NaiveDate>,
}

pub fn execute(provider: &SqliteConnectionProvider, args: PetArgs) -> CommandResult {
    let service = PetService::new(provider);

    match args.command {
        PetCommand::Add(add) => execute_add(provider, &service, add),
        PetCommand::List => print_json(&service.get_all()?),
        PetCommand::Get { id } => {
            let pet = service.get_by_id(id)?.ok_or(NotFoundError::Pet(id))?;
            print_json(&pet)
        }
        PetCommand::Find { fragment } => print_json(&service.find_by_name(&fragment)?),
        PetCommand::Update(update) => {
            let mut pet = service
                .get_by_id(update.id)?
                .ok_or(NotFoundError::Pet(update.id))?;
            if let Some(name) = update.name {
                pet.name = name;
            }
            if let Some(species) = update.species {
                pet.species = species;
            }
            if let Some(owner) = update.owner {
                pet.owner = owner;
            }
            if update.breed.is_some() {
                pet.breed = update.breed;
            }
            if update.born.is_some() {
                pet.born_on = update.born;
            }
            service.update(&pet)?;
            print_json(&pet)
        }
        PetCommand::Delete { id } => {
            service.delete(id)?;
            print_json(&json!({ "deleted": id }))
        }
        PetCommand::AssignChip { id, code } => print_json(&service.assign_chip(id, &code)?),
        PetCommand::RemoveChip { id } => print_json(&service.remove_chip(id)?),
    }
}

fn execute_add(
    provider: &SqliteConnectionProvider,
    service: &PetService<&SqliteConnectionProvider>,
    add: AddPetArgs,
) -> CommandResult {
    let mut pet = Pet::new(add.name, add.species, add.owner);
    pet.breed = add.breed;
    pet.born_on = add.born;

    match (add.chip_code, add.chip_implanted) {
        (Some(code), Some(implanted)) => {
            let mut chip = Chip::new(code, implanted, add.chip_clinic.unwrap_or_default());
            chip.notes = add.chip_notes;
            pet.chip = Some(chip);
            service.insert_with_chip(&mut pet)?;
        }
        (Some(code), None) => {
            let chip = ChipService::new(provider)
                .get_by_code(&code)?
                .ok_or_else(|| NotFoundError::ChipCode(code.clone()))?;
            pet.chip = Some(chip);
            service.insert(&mut pet)?;
        }
        (None, _) => service.insert(&mut pet)?,
    }

    print_json(&pet)
}
