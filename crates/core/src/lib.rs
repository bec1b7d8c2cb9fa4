//! Edit coordination for collaboratively edited campaign notes.
//!
//! Pure policy (lease timing, retention, validation) sits alongside the
//! components that apply it through the [`store::NoteStore`] persistence
//! interface: [`lock_manager::LockManager`], [`version_store::VersionStore`],
//! and the [`coordinator::EditCoordinator`] façade that callers use.
//!
//! This crate has no internal dependencies so the API, repository layer, and
//! tooling can all share the same constants and rules.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod lease;
pub mod lock_manager;
pub mod memory;
pub mod note;
pub mod policy;
pub mod roles;
pub mod store;
pub mod types;
pub mod version_store;
pub mod versioning;
