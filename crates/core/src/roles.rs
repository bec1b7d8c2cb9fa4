//! Campaign roles and the caller identity handed to the edit coordinator.
//!
//! Role names must match the CHECK constraint on `campaign_members.role`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_VIEWER: &str = "viewer";
pub const ROLE_MEMBER: &str = "member";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_OWNER: &str = "owner";

/// A user's role inside one campaign, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignRole {
    Viewer,
    Member,
    Admin,
    Owner,
}

/// Lowest role allowed to lock and edit shared notes.
pub const MIN_COLLABORATION_ROLE: CampaignRole = CampaignRole::Member;

impl CampaignRole {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignRole::Viewer => ROLE_VIEWER,
            CampaignRole::Member => ROLE_MEMBER,
            CampaignRole::Admin => ROLE_ADMIN,
            CampaignRole::Owner => ROLE_OWNER,
        }
    }

    /// Whether this role may edit shared notes (and therefore lock them).
    pub fn can_collaborate(self) -> bool {
        self >= MIN_COLLABORATION_ROLE
    }

    /// Whether this role may break another user's lock. Owner only.
    pub fn can_force_unlock(self) -> bool {
        self == CampaignRole::Owner
    }
}

impl fmt::Display for CampaignRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_VIEWER => Ok(CampaignRole::Viewer),
            ROLE_MEMBER => Ok(CampaignRole::Member),
            ROLE_ADMIN => Ok(CampaignRole::Admin),
            ROLE_OWNER => Ok(CampaignRole::Owner),
            other => Err(CoreError::Validation(format!(
                "Invalid campaign role '{other}'. Must be one of: {ROLE_VIEWER}, {ROLE_MEMBER}, {ROLE_ADMIN}, {ROLE_OWNER}"
            ))),
        }
    }
}

/// The acting user, as resolved by the caller's identity/role collaborator.
///
/// `role` is the user's role in the campaign that owns the note being
/// touched, or `None` when the user is not a member of that campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: DbId,
    pub role: Option<CampaignRole>,
}

impl Principal {
    pub fn new(user_id: DbId, role: Option<CampaignRole>) -> Self {
        Self { user_id, role }
    }

    pub fn member(user_id: DbId) -> Self {
        Self::new(user_id, Some(CampaignRole::Member))
    }

    pub fn can_collaborate(&self) -> bool {
        self.role.is_some_and(CampaignRole::can_collaborate)
    }

    pub fn can_force_unlock(&self) -> bool {
        self.role.is_some_and(CampaignRole::can_force_unlock)
    }
}
