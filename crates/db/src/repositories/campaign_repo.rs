//! Repository for `campaigns` and `campaign_members`.

use lorekeep_core::roles::{CampaignRole, ROLE_OWNER};
use lorekeep_core::types::DbId;
use sqlx::PgPool;

use crate::models::campaign::{Campaign, CampaignMember, CreateCampaign};

const COLUMNS: &str = "id, name, owner_id, created_at, updated_at";

const MEMBER_COLUMNS: &str = "id, campaign_id, user_id, role, created_at, updated_at";

pub struct CampaignRepo;

impl CampaignRepo {
    /// Create a campaign and enrol its owner with the `owner` role in one
    /// transaction.
    pub async fn create(pool: &PgPool, input: &CreateCampaign) -> Result<Campaign, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO campaigns (name, owner_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(&input.name)
            .bind(input.owner_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO campaign_members (campaign_id, user_id, role)
             VALUES ($1, $2, $3)",
        )
        .bind(campaign.id)
        .bind(campaign.owner_id)
        .bind(ROLE_OWNER)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(campaign)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Add a member. A duplicate membership violates
    /// `uq_campaign_members_campaign_user`.
    pub async fn add_member(
        pool: &PgPool,
        campaign_id: DbId,
        user_id: DbId,
        role: CampaignRole,
    ) -> Result<CampaignMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaign_members (campaign_id, user_id, role)
             VALUES ($1, $2, $3)
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, CampaignMember>(&query)
            .bind(campaign_id)
            .bind(user_id)
            .bind(role.as_str())
            .fetch_one(pool)
            .await
    }

    /// The user's role string in a campaign, if a member.
    pub async fn find_role(
        pool: &PgPool,
        campaign_id: DbId,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT role FROM campaign_members WHERE campaign_id = $1 AND user_id = $2",
        )
        .bind(campaign_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(role,)| role))
    }

    /// The user's role in the campaign that owns `note_id`. `None` when the
    /// note does not exist or the user is not a member.
    pub async fn find_role_for_note(
        pool: &PgPool,
        note_id: DbId,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT m.role
             FROM notes n
             JOIN campaign_members m ON m.campaign_id = n.campaign_id
             WHERE n.id = $1 AND m.user_id = $2",
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(role,)| role))
    }
}
