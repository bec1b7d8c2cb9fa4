//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod campaign_repo;
pub mod note_repo;
pub mod note_version_repo;
pub mod user_repo;

pub use campaign_repo::CampaignRepo;
pub use note_repo::NoteRepo;
pub use note_version_repo::NoteVersionRepo;
pub use user_repo::UserRepo;
