//! Connection check

use super::{print_json, CommandResult};
use mascotas_core::db::latest_version;
use mascotas_core::{SqliteConnectionProvider, UnitOfWork};
use serde_json::json;

pub fn execute(provider: &SqliteConnectionProvider) -> CommandResult {
    let uow = UnitOfWork::open_read_only(provider)?;
    let uow_id = uow.id();
    drop(uow);

    print_json(&json!({
        "status": "ok",
        "database": provider.settings().path.display().to_string(),
        "schema_version": latest_version(),
        "uow_id": uow_id.to_string(),
    }))
}
