pub mod check;
pub mod chip;
pub mod pet;

use serde::Serialize;
use std::error::Error;

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
