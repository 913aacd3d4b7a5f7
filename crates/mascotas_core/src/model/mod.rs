//! Domain model for pets and identification chips.
//!
//! # Responsibility
//! - Define the records persisted by the stores and exchanged with callers.
//!
//! # Invariants
//! - Identity is assigned by storage; `None` means "not persisted yet".
//! - Deletion is represented by a soft-delete flag, never a hard delete.
//! - A pet references a chip; it never owns the chip's lifecycle.

pub mod chip;
pub mod pet;

pub use chip::{Chip, ChipId};
pub use pet::{Pet, PetId};
