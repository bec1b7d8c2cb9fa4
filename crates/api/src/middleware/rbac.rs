//! Campaign role resolution.
//!
//! Roles are per campaign, so they are looked up per request from
//! `campaign_members` rather than carried in the token. The resulting
//! [`Principal`] is what the edit coordinator authorizes against.

use lorekeep_core::error::{entities, CoreError};
use lorekeep_core::roles::{CampaignRole, Principal};
use lorekeep_core::types::DbId;
use lorekeep_db::repositories::CampaignRepo;
use lorekeep_db::DbPool;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};

fn parse_role(role: Option<String>) -> AppResult<Option<CampaignRole>> {
    role.map(|r| r.parse::<CampaignRole>())
        .transpose()
        .map_err(|e| AppError::InternalError(format!("Stored campaign role is invalid: {e}")))
}

/// The caller as a member (or non-member) of the campaign owning `note_id`.
///
/// A missing note yields a principal with no role; the coordinator reports
/// the 404 when it loads the note.
pub async fn principal_for_note(
    pool: &DbPool,
    note_id: DbId,
    user: &AuthUser,
) -> AppResult<Principal> {
    let role = CampaignRepo::find_role_for_note(pool, note_id, user.user_id).await?;
    Ok(Principal::new(user.user_id, parse_role(role)?))
}

/// The caller as a member of `campaign_id`. Fails with 404 if the campaign
/// does not exist and 403 if the caller is not a member.
pub async fn require_campaign_member(
    pool: &DbPool,
    campaign_id: DbId,
    user: &AuthUser,
) -> AppResult<Principal> {
    if CampaignRepo::find_by_id(pool, campaign_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: entities::CAMPAIGN,
            id: campaign_id,
        }));
    }
    let role = parse_role(CampaignRepo::find_role(pool, campaign_id, user.user_id).await?)?;
    if role.is_none() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not a member of this campaign".into(),
        )));
    }
    Ok(Principal::new(user.user_id, role))
}

/// Force-unlock is reserved for the campaign owner.
pub fn require_force_unlock(principal: &Principal) -> AppResult<()> {
    if !principal.can_force_unlock() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the campaign owner can force-release a lock".into(),
        )));
    }
    Ok(())
}
