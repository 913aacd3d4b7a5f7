//! Chip commands

use super::{print_json, CommandResult};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use mascotas_core::{
    Chip, ChipId, ChipService, NotFoundError, RecordService, SqliteConnectionProvider,
};
use serde_json::json;

#[derive(Debug, Args)]
pub struct ChipArgs {
    #[command(subcommand)]
    pub command: ChipCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChipCommand {
    /// Register a new chip
    Add(AddChipArgs),
    /// List active chips
    List,
    /// Show one chip by id
    Get { id: ChipId },
    /// Show one chip by code
    Code { code: String },
    /// Change implantation date, clinic or notes
    Update(UpdateChipArgs),
    /// Soft-delete a chip
    Delete { id: ChipId },
}

#[derive(Debug, Args)]
pub struct AddChipArgs {
    #[arg(long)]
    pub code: String,

    /// Implantation date (YYYY-MM-DD)
    #[arg(long)]
    pub implanted: NaiveDate,

    #[arg(long)]
    pub clinic: String,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateChipArgs {
    pub id: ChipId,

    #[arg(long)]
    pub implanted: Option<NaiveDate>,

    #[arg(long)]
    pub clinic: Option<String>,

    #[arg(long, conflicts_with = "clear_notes")]
    pub notes: Option<String>,

    #[arg(long)]
    pub clear_notes: bool,
}

pub fn execute(provider: &SqliteConnectionProvider, args: ChipArgs) -> CommandResult {
    let service = ChipService::new(provider);

    match args.command {
        ChipCommand::Add(add) => {
            let mut chip = Chip::new(add.code, add.implanted, add.clinic);
            chip.notes = add.notes;
            service.insert(&mut chip)?;
            print_json(&chip)
        }
        ChipCommand::List => print_json(&service.get_all()?),
        ChipCommand::Get { id } => {
            let chip = service.get_by_id(id)?.ok_or(NotFoundError::Chip(id))?;
            print_json(&chip)
        }
        ChipCommand::Code { code } => {
            let chip = service
                .get_by_code(&code)?
                .ok_or_else(|| NotFoundError::ChipCode(code.clone()))?;
            print_json(&chip)
        }
        ChipCommand::Update(update) => {
            let mut chip = service
                .get_by_id(update.id)?
                .ok_or(NotFoundError::Chip(update.id))?;
            if let Some(implanted) = update.implanted {
                chip.implanted_on = implanted;
            }
            if let Some(clinic) = update.clinic {
                chip.clinic = clinic;
            }
            if update.clear_notes {
                chip.notes = None;
            } else if update.notes.is_some() {
                chip.notes = update.notes;
            }
            service.update(&chip)?;
            print_json(&chip)
        }
        ChipCommand::Delete { id } => {
            service.delete(id)?;
            print_json(&json!({ "deleted": id }))
        }
    }
}
