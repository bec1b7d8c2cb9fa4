//! Campaign and membership models.

use lorekeep_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub name: String,
    pub owner_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub owner_id: DbId,
}

/// A row from the `campaign_members` table. `role` holds one of the
/// `lorekeep_core::roles::ROLE_*` values.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampaignMember {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
