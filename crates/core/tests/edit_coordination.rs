//! End-to-end behaviour of the edit coordinator on the in-memory store.
//!
//! Time is driven by a `ManualClock` so lease expiry scenarios are exact:
//! - lock exclusivity, heartbeat, release, stale reclamation
//! - force unlock
//! - snapshot-before-write, retention bound, restore
//! - private notes bypassing locks
//! - best-effort snapshots

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use tokio::task::JoinSet;

use lorekeep_core::clock::ManualClock;
use lorekeep_core::coordinator::{EditCoordinator, LockGrant};
use lorekeep_core::error::{CoreError, EditError};
use lorekeep_core::memory::MemoryNoteStore;
use lorekeep_core::note::{NewNote, Note, NoteContent, Visibility};
use lorekeep_core::policy::EditPolicy;
use lorekeep_core::roles::{CampaignRole, Principal};
use lorekeep_core::store::{GuardedWrite, NoteStore, StoreResult};
use lorekeep_core::types::{DbId, Timestamp};
use lorekeep_core::versioning::{NoteVersion, NoteVersionSummary};

const ALICE: DbId = 1;
const BOB: DbId = 2;
const CAROL: DbId = 3;
const OWEN: DbId = 4;
const CAMPAIGN: DbId = 10;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Coordinator = EditCoordinator<MemoryNoteStore, Arc<ManualClock>>;

struct Harness {
    store: Arc<MemoryNoteStore>,
    clock: Arc<ManualClock>,
    coord: Arc<Coordinator>,
}

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

async fn harness() -> Harness {
    let store = Arc::new(MemoryNoteStore::new());
    store.add_user(ALICE, "Alice").await;
    store.add_user(BOB, "Bob").await;
    store.add_user(CAROL, "Carol").await;
    store.add_user(OWEN, "Owen").await;

    let clock = Arc::new(ManualClock::new(t0()));
    let coord = Arc::new(EditCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        EditPolicy::default(),
    ));
    Harness {
        store,
        clock,
        coord,
    }
}

impl Harness {
    /// Set the clock to `secs` seconds after t0.
    fn at(&self, secs: i64) {
        self.clock.set(t0() + Duration::seconds(secs));
    }

    async fn note(&self, creator: DbId, visibility: Visibility) -> Note {
        self.store.insert_note(new_note(creator, visibility), t0()).await
    }

    async fn reload(&self, note_id: DbId) -> Note {
        self.store.find_note(note_id).await.unwrap().unwrap()
    }
}

fn new_note(creator: DbId, visibility: Visibility) -> NewNote {
    NewNote {
        campaign_id: CAMPAIGN,
        created_by: creator,
        visibility,
        title: "The Drowned Library".to_string(),
        content: json!({"type": "doc", "content": []}),
        rendered_html: "<p></p>".to_string(),
    }
}

fn member(user_id: DbId) -> Principal {
    Principal::member(user_id)
}

fn owner(user_id: DbId) -> Principal {
    Principal::new(user_id, Some(CampaignRole::Owner))
}

fn body(n: usize) -> NoteContent {
    NoteContent {
        title: format!("Revision {n}"),
        content: json!({"type": "doc", "rev": n}),
        rendered_html: format!("<p>rev {n}</p>"),
    }
}

fn expect_granted(grant: LockGrant) -> lorekeep_core::lock_manager::Lease {
    match grant {
        LockGrant::Granted(lease) => lease,
        LockGrant::NotRequired => panic!("expected a granted lease"),
    }
}

// ---------------------------------------------------------------------------
// Lock exclusivity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_acquirer_gets_conflict_naming_holder() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    let lease = expect_granted(h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap());
    assert_eq!(lease.holder_id, ALICE);
    assert_eq!(lease.acquired_at, t0());
    assert_eq!(lease.expires_at, t0() + Duration::minutes(5));
    assert_eq!(lease.heartbeat_interval_secs, 120);

    h.at(45);
    let err = h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(conflict) => {
        assert_eq!(conflict.holder_id, Some(ALICE));
        assert_eq!(conflict.holder_name.as_deref(), Some("Alice"));
        assert_eq!(conflict.held_since, Some(t0()));
        assert_eq!(conflict.held_since_seconds, Some(45));
    });

    assert_eq!(h.reload(note.id).await.lock_holder_id, Some(ALICE));
}

#[tokio::test]
async fn concurrent_acquires_grant_exactly_one() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    let note_id = note.id;
    let mut tasks = JoinSet::new();
    for user in 100..132 {
        let coord = Arc::clone(&h.coord);
        tasks.spawn(async move { coord.acquire_lock(note_id, &member(user)).await });
    }

    let mut granted = Vec::new();
    let mut conflicts = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(grant) => granted.push(expect_granted(grant).holder_id),
            Err(EditError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(granted.len(), 1, "exactly one acquire may win");
    assert_eq!(conflicts, 31);
    assert_eq!(h.reload(note.id).await.lock_holder_id, Some(granted[0]));
}

#[tokio::test]
async fn holder_reacquire_refreshes_lease() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.at(200);
    let lease = expect_granted(h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap());
    assert_eq!(lease.acquired_at, t0() + Duration::seconds(200));
}

// ---------------------------------------------------------------------------
// Timed scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn heartbeating_holder_blocks_others_until_release() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.at(0);
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    h.at(120);
    let lease = expect_granted(h.coord.heartbeat(note.id, &member(ALICE)).await.unwrap());
    assert_eq!(lease.acquired_at, t0() + Duration::seconds(120));

    h.at(200);
    let err = h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(ALICE)));

    h.at(240);
    h.coord.heartbeat(note.id, &member(ALICE)).await.unwrap();

    h.at(300);
    h.coord.release_lock(note.id, &member(ALICE)).await.unwrap();

    h.at(301);
    let lease = expect_granted(h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap());
    assert_eq!(lease.holder_id, BOB);
}

#[tokio::test]
async fn silent_holder_is_reclaimed_after_ttl() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.at(0);
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    h.at(290);
    let err = h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(ALICE)));

    h.at(301);
    let lease = expect_granted(h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap());
    assert_eq!(lease.holder_id, BOB);

    let reloaded = h.reload(note.id).await;
    assert_eq!(reloaded.lock_holder_id, Some(BOB));
    assert_eq!(reloaded.lock_acquired_at, Some(t0() + Duration::seconds(301)));
}

#[tokio::test]
async fn lease_exactly_at_ttl_is_still_held() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.at(300);
    let err = h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(_));
}

#[tokio::test]
async fn reclaimed_holder_learns_on_next_heartbeat() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.at(400);
    h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap();

    h.at(410);
    let err = h.coord.heartbeat(note.id, &member(ALICE)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => {
        assert_eq!(c.holder_id, Some(BOB));
        assert_eq!(c.holder_name.as_deref(), Some("Bob"));
        assert_eq!(c.held_since_seconds, Some(10));
    });

    let err = h.coord.update_content(note.id, &member(ALICE), body(1)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(BOB)));
}

// ---------------------------------------------------------------------------
// Non-holders never mutate lock state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_holder_heartbeat_does_not_touch_lock() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.at(100);
    let err = h.coord.heartbeat(note.id, &member(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(ALICE)));

    let reloaded = h.reload(note.id).await;
    assert_eq!(reloaded.lock_holder_id, Some(ALICE));
    assert_eq!(reloaded.lock_acquired_at, Some(t0()));
}

#[tokio::test]
async fn heartbeat_on_unlocked_note_is_conflict() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    let err = h.coord.heartbeat(note.id, &member(ALICE)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, None));
    assert_eq!(h.reload(note.id).await.lock_holder_id, None);
}

#[tokio::test]
async fn non_holder_release_never_clears() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    let err = h.coord.release_lock(note.id, &member(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(ALICE)));

    let reloaded = h.reload(note.id).await;
    assert_eq!(reloaded.lock_holder_id, Some(ALICE));
    assert!(reloaded.lock_acquired_at.is_some());
}

#[tokio::test]
async fn holder_release_clears_both_columns() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.coord.release_lock(note.id, &member(ALICE)).await.unwrap();

    let reloaded = h.reload(note.id).await;
    assert_eq!(reloaded.lock_holder_id, None);
    assert_eq!(reloaded.lock_acquired_at, None);
}

// ---------------------------------------------------------------------------
// Force unlock and roles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn force_unlock_breaks_any_lock() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    let previous = h.coord.force_unlock(note.id, &owner(OWEN)).await.unwrap();
    assert_eq!(previous, Some(ALICE));

    let reloaded = h.reload(note.id).await;
    assert_eq!(reloaded.lock_holder_id, None);
    assert_eq!(reloaded.lock_acquired_at, None);

    h.at(1);
    let lease = expect_granted(h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap());
    assert_eq!(lease.holder_id, BOB);
}

#[tokio::test]
async fn force_unlock_on_unlocked_note_reports_nothing() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    let previous = h.coord.force_unlock(note.id, &owner(OWEN)).await.unwrap();
    assert_eq!(previous, None);
}

#[tokio::test]
async fn viewer_cannot_lock_shared_note() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    let viewer = Principal::new(CAROL, Some(CampaignRole::Viewer));

    let err = h.coord.acquire_lock(note.id, &viewer).await.unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::Forbidden(_)));
    assert_eq!(h.reload(note.id).await.lock_holder_id, None);
}

#[tokio::test]
async fn missing_note_is_not_found() {
    let h = harness().await;
    let err = h.coord.acquire_lock(9_999, &member(ALICE)).await.unwrap_err();
    assert_matches!(
        err,
        EditError::Core(CoreError::NotFound { entity: "Note", id: 9_999 })
    );
}

// ---------------------------------------------------------------------------
// Private notes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn private_note_rejects_other_users_regardless_of_lease() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Private).await;

    let err = h.coord.acquire_lock(note.id, &owner(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::Forbidden(_)));

    h.at(10_000);
    let err = h.coord.acquire_lock(note.id, &owner(BOB)).await.unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::Forbidden(_)));

    let err = h.coord.update_content(note.id, &owner(BOB), body(1)).await.unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::Forbidden(_)));

    let reloaded = h.reload(note.id).await;
    assert_eq!(reloaded.lock_holder_id, None);
    assert_eq!(reloaded.lock_acquired_at, None);
}

#[tokio::test]
async fn private_note_creator_edits_without_lock() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Private).await;

    let grant = h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    assert_eq!(grant, LockGrant::NotRequired);
    assert_eq!(h.reload(note.id).await.lock_holder_id, None);

    let updated = h
        .coord
        .update_content(note.id, &member(ALICE), body(1))
        .await
        .unwrap();
    assert_eq!(updated.title, "Revision 1");
    assert_eq!(updated.last_edited_by, Some(ALICE));

    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert_eq!(versions.len(), 1);
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_requires_holding_the_lock() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    let err = h.coord.update_content(note.id, &member(ALICE), body(1)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, None));

    h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap();
    let err = h.coord.update_content(note.id, &member(ALICE), body(1)).await.unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(BOB)));

    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert!(versions.is_empty(), "rejected updates must not snapshot");
}

#[tokio::test]
async fn update_snapshots_prior_state_and_keeps_lock() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(note.id, &member(BOB)).await.unwrap();
    h.at(30);
    let updated = h
        .coord
        .update_content(note.id, &member(BOB), body(1))
        .await
        .unwrap();

    assert_eq!(updated.title, "Revision 1");
    assert_eq!(updated.content, json!({"type": "doc", "rev": 1}));
    assert_eq!(updated.rendered_html, "<p>rev 1</p>");
    assert_eq!(updated.last_edited_by, Some(BOB));
    assert_eq!(updated.updated_at, t0() + Duration::seconds(30));
    assert_eq!(updated.lock_holder_id, Some(BOB), "update must not release");

    let versions = h.coord.list_versions(note.id, &member(BOB)).await.unwrap();
    assert_eq!(versions.len(), 1);
    let snapshot = h
        .coord
        .get_version(note.id, &member(BOB), versions[0].id)
        .await
        .unwrap();
    assert_eq!(snapshot.title, note.title);
    assert_eq!(snapshot.content, note.content);
    assert_eq!(snapshot.rendered_html, note.rendered_html);
    assert_eq!(snapshot.author_id, BOB);
}

#[tokio::test]
async fn invalid_content_rejected_before_any_work() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    let mut bad = body(1);
    bad.title = "  ".to_string();
    let err = h.coord.update_content(note.id, &member(ALICE), bad).await.unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::Validation(_)));

    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert!(versions.is_empty());
    assert_eq!(h.reload(note.id).await.title, "The Drowned Library");
}

#[tokio::test]
async fn failed_snapshot_does_not_block_update() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    h.store.fail_version_writes(true);
    let updated = h
        .coord
        .update_content(note.id, &member(ALICE), body(7))
        .await
        .unwrap();
    assert_eq!(updated.title, "Revision 7");

    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert!(versions.is_empty());
}

/// Hands the lease to `thief` just before every content write, as a stale
/// reclaim landing between the coordinator's lock check and its write would.
struct LeaseReclaimedBeforeWrite {
    inner: MemoryNoteStore,
    thief: DbId,
}

impl NoteStore for LeaseReclaimedBeforeWrite {
    async fn find_note(&self, note_id: DbId) -> StoreResult<Option<Note>> {
        self.inner.find_note(note_id).await
    }

    async fn try_acquire_lock(
        &self,
        note_id: DbId,
        user_id: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> StoreResult<bool> {
        self.inner
            .try_acquire_lock(note_id, user_id, now, stale_before)
            .await
    }

    async fn renew_lock(&self, note_id: DbId, user_id: DbId, now: Timestamp) -> StoreResult<bool> {
        self.inner.renew_lock(note_id, user_id, now).await
    }

    async fn release_lock(&self, note_id: DbId, user_id: DbId) -> StoreResult<bool> {
        self.inner.release_lock(note_id, user_id).await
    }

    async fn clear_lock(&self, note_id: DbId) -> StoreResult<bool> {
        self.inner.clear_lock(note_id).await
    }

    async fn write_with_snapshot(
        &self,
        note_id: DbId,
        editor_id: DbId,
        content: &NoteContent,
        retention: i64,
        now: Timestamp,
    ) -> StoreResult<Option<GuardedWrite>> {
        self.inner.clear_lock(note_id).await?;
        self.inner
            .try_acquire_lock(note_id, self.thief, now, now)
            .await?;
        self.inner
            .write_with_snapshot(note_id, editor_id, content, retention, now)
            .await
    }

    async fn list_versions(&self, note_id: DbId) -> StoreResult<Vec<NoteVersionSummary>> {
        self.inner.list_versions(note_id).await
    }

    async fn find_version(&self, version_id: DbId) -> StoreResult<Option<NoteVersion>> {
        self.inner.find_version(version_id).await
    }
}

#[tokio::test]
async fn update_rejected_at_write_leaves_no_snapshot() {
    let store = Arc::new(LeaseReclaimedBeforeWrite {
        inner: MemoryNoteStore::new(),
        thief: BOB,
    });
    let note = store
        .inner
        .insert_note(new_note(ALICE, Visibility::Shared), t0())
        .await;
    let coord = EditCoordinator::new(
        Arc::clone(&store),
        Arc::new(ManualClock::new(t0())),
        EditPolicy::default(),
    );
    coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    let err = coord
        .update_content(note.id, &member(ALICE), body(1))
        .await
        .unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(BOB)));

    let versions = store.inner.list_versions(note.id).await.unwrap();
    assert!(versions.is_empty(), "a rejected write must not leave a snapshot");
    let current = store.inner.find_note(note.id).await.unwrap().unwrap();
    assert_eq!(current.title, "The Drowned Library");
    assert_eq!(current.last_edited_by, None);
}

#[tokio::test]
async fn concurrent_private_writes_snapshot_each_replaced_state() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Private).await;

    let note_id = note.id;
    let mut tasks = JoinSet::new();
    for n in 1..=2 {
        let coord = Arc::clone(&h.coord);
        tasks.spawn(async move { coord.update_content(note_id, &member(ALICE), body(n)).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    let last = h.reload(note_id).await.title;
    let first = if last == "Revision 1" { "Revision 2" } else { "Revision 1" };

    let mut titles: Vec<String> = h
        .coord
        .list_versions(note_id, &member(ALICE))
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.title_preview)
        .collect();
    titles.sort();
    let mut expected = vec![first.to_string(), "The Drowned Library".to_string()];
    expected.sort();
    assert_eq!(titles, expected, "each write must snapshot the state it replaced");
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sixty_updates_keep_the_newest_fifty_versions() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    let mut first_version_id = None;
    for n in 1..=60 {
        h.at(n as i64);
        h.coord
            .update_content(note.id, &member(ALICE), body(n))
            .await
            .unwrap();

        if n == 1 {
            let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
            first_version_id = Some(versions[0].id);
        }
        if n == 51 {
            let err = h
                .coord
                .get_version(note.id, &member(ALICE), first_version_id.unwrap())
                .await
                .unwrap_err();
            assert_matches!(err, EditError::Core(CoreError::NotFound { .. }));
        }
    }

    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert_eq!(versions.len(), 50);

    // Snapshots hold pre-update state: snapshot k holds revision k-1, so the
    // survivors are revisions 10..=59, newest first.
    assert_eq!(versions[0].title_preview, "Revision 59");
    assert_eq!(versions[49].title_preview, "Revision 10");
    assert!(versions
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn retention_breaks_timestamp_ties_by_insertion_order() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    // Clock never moves: every snapshot shares one timestamp.
    for n in 1..=52 {
        h.coord
            .update_content(note.id, &member(ALICE), body(n))
            .await
            .unwrap();
    }

    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert_eq!(versions.len(), 50);
    assert_eq!(versions[0].title_preview, "Revision 51");
    assert_eq!(versions[49].title_preview, "Revision 2");
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

#[tokio::test]
async fn restore_copies_target_and_snapshots_prior_state() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();

    for n in 1..=3 {
        h.at(n);
        h.coord
            .update_content(note.id, &member(ALICE), body(n as usize))
            .await
            .unwrap();
    }

    // Newest first: [rev 2, rev 1, original].
    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    let rev1 = versions
        .iter()
        .find(|v| v.title_preview == "Revision 1")
        .unwrap()
        .id;
    let target = h
        .coord
        .get_version(note.id, &member(ALICE), rev1)
        .await
        .unwrap();

    h.at(10);
    let restored = h
        .coord
        .restore_version(note.id, &member(ALICE), rev1)
        .await
        .unwrap();
    assert_eq!(restored.title, target.title);
    assert_eq!(restored.content, target.content);
    assert_eq!(restored.rendered_html, target.rendered_html);
    assert_eq!(restored.last_edited_by, Some(ALICE));

    let after = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert_eq!(after.len(), versions.len() + 1);
    let undo = h
        .coord
        .get_version(note.id, &member(ALICE), after[0].id)
        .await
        .unwrap();
    assert_eq!(undo.content_state(), body(3), "restore must snapshot the state it replaced");

    // Restoring the undo snapshot brings revision 3 back.
    let back = h
        .coord
        .restore_version(note.id, &member(ALICE), undo.id)
        .await
        .unwrap();
    assert_eq!(back.content_state(), body(3));
}

#[tokio::test]
async fn restore_of_unknown_version_leaves_history_untouched() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.coord
        .update_content(note.id, &member(ALICE), body(1))
        .await
        .unwrap();

    let err = h
        .coord
        .restore_version(note.id, &member(ALICE), 424_242)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        EditError::Core(CoreError::NotFound { entity: "NoteVersion", .. })
    );

    let versions = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap();
    assert_eq!(versions.len(), 1);
}

#[tokio::test]
async fn restore_rejects_version_of_another_note() {
    let h = harness().await;
    let first = h.note(ALICE, Visibility::Shared).await;
    let second = h.note(ALICE, Visibility::Shared).await;

    h.coord.acquire_lock(first.id, &member(ALICE)).await.unwrap();
    h.coord
        .update_content(first.id, &member(ALICE), body(1))
        .await
        .unwrap();
    let foreign = h.coord.list_versions(first.id, &member(ALICE)).await.unwrap()[0].id;

    h.coord.acquire_lock(second.id, &member(ALICE)).await.unwrap();
    let err = h
        .coord
        .restore_version(second.id, &member(ALICE), foreign)
        .await
        .unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::NotFound { .. }));

    let err = h
        .coord
        .get_version(second.id, &member(ALICE), foreign)
        .await
        .unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::NotFound { .. }));
}

#[tokio::test]
async fn restore_requires_the_lock() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;
    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.coord
        .update_content(note.id, &member(ALICE), body(1))
        .await
        .unwrap();
    let version_id = h.coord.list_versions(note.id, &member(ALICE)).await.unwrap()[0].id;

    let err = h
        .coord
        .restore_version(note.id, &member(BOB), version_id)
        .await
        .unwrap_err();
    assert_matches!(err, EditError::Conflict(c) => assert_eq!(c.holder_id, Some(ALICE)));
}

// ---------------------------------------------------------------------------
// Lock status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lock_status_reports_staleness_without_clearing() {
    let h = harness().await;
    let note = h.note(ALICE, Visibility::Shared).await;

    let status = h.coord.lock_status(note.id, &member(BOB)).await.unwrap();
    assert!(!status.locked);

    h.coord.acquire_lock(note.id, &member(ALICE)).await.unwrap();
    h.at(600);
    let status = h.coord.lock_status(note.id, &member(BOB)).await.unwrap();
    assert!(status.locked);
    assert!(status.stale);
    assert_eq!(status.holder_name.as_deref(), Some("Alice"));
    assert_eq!(status.held_since_seconds, Some(600));
    assert_eq!(status.expires_at, Some(t0() + Duration::seconds(300)));

    assert_eq!(h.reload(note.id).await.lock_holder_id, Some(ALICE));
}
