//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the database row and,
//! where rows are created through the API, a `Deserialize` create DTO.

pub mod campaign;
pub mod note;
pub mod note_version;
pub mod user;
