//! Integration tests for the storage layer
//!
//! Runs the authoring flows against a real database:
//! pending write → approval → merge → live read, graph saves, cascades and
//! notifications.
//!
//! Requires PostgreSQL at `DATABASE_URL`; run with `cargo test -- --ignored`.

use std::sync::OnceLock;
use std::time::Duration;

use serde_json::{json, Value};
use sqlx::postgres::PgListener;
use tokio::sync::{Mutex, MutexGuard};

use tower_admin_server::graph::GraphId;
use tower_admin_server::storage::expeditions::ExpeditionGraph;
use tower_admin_server::storage::moderation::BANNED_WORDS_CHANNEL;
use tower_admin_server::storage::quests::{NewQuestChain, QuestGraph};
use tower_admin_server::storage::servers::default_ends_at;
use tower_admin_server::storage::{Item, PendingAction, PostgresError, PostgresStore};

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database")
}

/// Tests share one database, so they run one at a time.
async fn store() -> (PostgresStore, MutexGuard<'static, ()>) {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let guard = LOCK.get_or_init(|| Mutex::new(())).lock().await;
    let store = PostgresStore::new(&database_url(), 2)
        .await
        .expect("PostgreSQL not available at DATABASE_URL");
    (store, guard)
}

fn unique(prefix: &str) -> String {
    format!(
        "{} {}",
        prefix,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

fn item(name: &str) -> Item {
    serde_json::from_value(json!({
        "name": name,
        "type": "head",
        "assetID": 12,
        "silver": 10,
        "socket": false,
        "stats": [{"stat": "armor", "value": 2}]
    }))
    .unwrap()
}

async fn approved_pending_count(store: &PostgresStore) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM tooling.items WHERE approved")
        .fetch_one(store.pool())
        .await
        .unwrap()
}

// ============================================================================
// Content authoring cycle
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_item_authoring_cycle() {
    let (store, _guard) = store().await;
    let name = unique("Iron Helm");

    let authored = store.create_pending(&item(&name), None).await.unwrap();
    assert_eq!(authored.action, PendingAction::Insert);

    let live = store.list_live::<Item>().await.unwrap();
    assert!(live.iter().all(|r| r.data.name != name));
    let pending = store.list_pending::<Item>().await.unwrap();
    let row = pending
        .iter()
        .find(|p| p.tooling_id == authored.tooling_id)
        .unwrap();
    assert!(!row.approved);
    assert_eq!(row.game_id, None);
    assert_eq!(pending[0].tooling_id, authored.tooling_id, "newest first");

    assert!(store.toggle_approve::<Item>(authored.tooling_id).await.unwrap());
    let before = store.list_live::<Item>().await.unwrap().len();
    let report = store.merge::<Item>().await.unwrap();
    assert!(report.inserted >= 1);

    let live = store.list_live::<Item>().await.unwrap();
    assert_eq!(live.len(), before + report.inserted);
    let merged = live.iter().find(|r| r.data.name == name).unwrap();
    assert_eq!(merged.version, 1);
    assert_eq!(merged.data, item(&name));
    assert!(store
        .list_pending::<Item>()
        .await
        .unwrap()
        .iter()
        .all(|p| p.tooling_id != authored.tooling_id));
    assert_eq!(approved_pending_count(&store).await, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_keeps_id_and_bumps_version() {
    let (store, _guard) = store().await;
    let name = unique("Leather Cap");

    let authored = store.create_pending(&item(&name), None).await.unwrap();
    store.toggle_approve::<Item>(authored.tooling_id).await.unwrap();
    store.merge::<Item>().await.unwrap();
    let live = store.list_live::<Item>().await.unwrap();
    let original = live.iter().find(|r| r.data.name == name).unwrap().clone();

    let mut edited = item(&name);
    edited.silver = 25;
    let update = store
        .create_pending(&edited, Some(original.id))
        .await
        .unwrap();
    assert_eq!(update.action, PendingAction::Update);

    let pending = store.list_pending::<Item>().await.unwrap();
    let row = pending
        .iter()
        .find(|p| p.tooling_id == update.tooling_id)
        .unwrap();
    assert_eq!(row.version, original.version);
    assert!(!row.is_stale());

    store.toggle_approve::<Item>(update.tooling_id).await.unwrap();
    let report = store.merge::<Item>().await.unwrap();
    assert!(report.updated >= 1);

    let live = store.list_live::<Item>().await.unwrap();
    let after = live.iter().find(|r| r.id == original.id).unwrap();
    assert_eq!(after.version, original.version + 1);
    assert_eq!(after.data.silver, 25);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_of_missing_live_row_rejected() {
    let (store, _guard) = store().await;

    let err = store
        .create_pending(&item(&unique("Ghost")), Some(i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, PostgresError::Validation(m) if m.starts_with("gameId")));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_invalid_type_writes_nothing() {
    let (store, _guard) = store().await;
    let before = store.list_pending::<Item>().await.unwrap().len();

    let mut bad = item(&unique("Hat"));
    bad.item_type = "hat".to_string();
    assert!(store.create_pending(&bad, None).await.is_err());

    assert_eq!(store.list_pending::<Item>().await.unwrap().len(), before);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_orphaned_update_skipped_and_removed() {
    let (store, _guard) = store().await;
    let name = unique("Doomed Helm");

    let authored = store.create_pending(&item(&name), None).await.unwrap();
    store.toggle_approve::<Item>(authored.tooling_id).await.unwrap();
    store.merge::<Item>().await.unwrap();
    let live_id = store
        .list_live::<Item>()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.data.name == name)
        .unwrap()
        .id;

    let update = store
        .create_pending(&item(&name), Some(live_id))
        .await
        .unwrap();
    sqlx::query("DELETE FROM game.items WHERE id = $1")
        .bind(live_id)
        .execute(store.pool())
        .await
        .unwrap();
    store.toggle_approve::<Item>(update.tooling_id).await.unwrap();

    let report = store.merge::<Item>().await.unwrap();
    assert!(report.skipped.contains(&update.tooling_id));
    assert!(store
        .list_pending::<Item>()
        .await
        .unwrap()
        .iter()
        .all(|p| p.tooling_id != update.tooling_id));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_revise_resets_approval() {
    let (store, _guard) = store().await;
    let name = unique("Draft Helm");

    let authored = store.create_pending(&item(&name), None).await.unwrap();
    store.toggle_approve::<Item>(authored.tooling_id).await.unwrap();

    let mut revised = item(&name);
    revised.description = Some("now with a visor".to_string());
    let again = store
        .revise_pending(authored.tooling_id, &revised)
        .await
        .unwrap();
    assert_eq!(again.action, PendingAction::Insert);

    let pending = store.list_pending::<Item>().await.unwrap();
    let row = pending
        .iter()
        .find(|p| p.tooling_id == authored.tooling_id)
        .unwrap();
    assert!(!row.approved);
    assert_eq!(row.data.description.as_deref(), Some("now with a visor"));

    store.remove_pending::<Item>(authored.tooling_id).await.unwrap();
    assert!(matches!(
        store.remove_pending::<Item>(authored.tooling_id).await,
        Err(PostgresError::NotFound(_))
    ));
}

// ============================================================================
// Expedition graphs
// ============================================================================

fn two_slide_graph() -> ExpeditionGraph {
    serde_json::from_value(json!({
        "name": unique("Caves"),
        "slides": [
            {"id": -1, "text": "start", "isStart": true, "options": [
                {"text": "flee", "connections": [{"targetSlideId": -2, "weight": 0}]}
            ]},
            {"id": -2, "text": "end", "isStart": false, "options": []}
        ]
    }))
    .unwrap()
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_expedition_save_and_load() {
    let (store, _guard) = store().await;

    let saved = store.save_expedition(&two_slide_graph()).await.unwrap();
    let start = saved.slide_mapping.resolve(GraphId::Local(-1)).unwrap();
    let end = saved.slide_mapping.resolve(GraphId::Local(-2)).unwrap();
    assert_eq!(saved.slide_mapping.len(), 2);
    let option_id = saved.option_mapping["-1-0"];

    let weight: i32 = sqlx::query_scalar(
        "SELECT weight FROM game.expedition_outcomes WHERE option_id = $1",
    )
    .bind(option_id)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(weight, 1);

    let loaded = store.get_expedition(saved.expedition_id).await.unwrap();
    assert_eq!(loaded.slides.len(), 2);
    let first = loaded
        .slides
        .iter()
        .find(|s| s.id == GraphId::Server(start))
        .unwrap();
    assert!(first.is_start);
    assert_eq!(first.options[0].text, "flee");
    assert_eq!(
        first.options[0].connections[0].target_slide_id,
        GraphId::Server(end)
    );
    let last = loaded
        .slides
        .iter()
        .find(|s| s.id == GraphId::Server(end))
        .unwrap();
    assert!(!last.is_start);
    assert!(last.options.is_empty());

    store.delete_expedition(saved.expedition_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_unlisted_target_is_auto_created() {
    let (store, _guard) = store().await;

    let graph: ExpeditionGraph = serde_json::from_value(json!({
        "slides": [
            {"id": -1, "text": "start", "isStart": true, "options": [
                {"text": "onward", "connections": [{"targetSlideId": -7}]},
                {"text": "astray", "connections": [{"targetSlideId": 999999999}]}
            ]}
        ]
    }))
    .unwrap();

    let saved = store.save_expedition(&graph).await.unwrap();
    assert!(saved.slide_mapping.contains_local(-7));

    let loaded = store.get_expedition(saved.expedition_id).await.unwrap();
    assert_eq!(loaded.slides.len(), 2);
    let start = loaded.slides.iter().find(|s| s.is_start).unwrap();
    assert_eq!(start.options[0].connections.len(), 1);
    assert!(start.options[1].connections.is_empty());

    store.delete_expedition(saved.expedition_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_slide_delete_clears_incoming_outcomes() {
    let (store, _guard) = store().await;

    let saved = store.save_expedition(&two_slide_graph()).await.unwrap();
    let end = saved.slide_mapping.resolve(GraphId::Local(-2)).unwrap();
    store.delete_expedition_slide(end).await.unwrap();

    let loaded = store.get_expedition(saved.expedition_id).await.unwrap();
    assert_eq!(loaded.slides.len(), 1);
    assert!(loaded.slides[0].options[0].connections.is_empty());

    store.delete_expedition(saved.expedition_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_deleted_slide_ids_stay_within_expedition() {
    let (store, _guard) = store().await;

    let first = store.save_expedition(&two_slide_graph()).await.unwrap();
    let foreign_end = first.slide_mapping.resolve(GraphId::Local(-2)).unwrap();

    let mut second = two_slide_graph();
    second.deleted_slide_ids = vec![foreign_end];
    let other = store.save_expedition(&second).await.unwrap();

    let untouched = store.get_expedition(first.expedition_id).await.unwrap();
    assert_eq!(untouched.slides.len(), 2);
    let start = untouched.slides.iter().find(|s| s.is_start).unwrap();
    assert_eq!(
        start.options[0].connections[0].target_slide_id,
        GraphId::Server(foreign_end)
    );

    store.delete_expedition(other.expedition_id).await.unwrap();
    store.delete_expedition(first.expedition_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_connection_to_other_expedition_slide_skipped() {
    let (store, _guard) = store().await;

    let first = store.save_expedition(&two_slide_graph()).await.unwrap();
    let foreign_start = first.slide_mapping.resolve(GraphId::Local(-1)).unwrap();

    let graph: ExpeditionGraph = serde_json::from_value(json!({
        "name": unique("Detour"),
        "slides": [
            {"id": -1, "text": "start", "isStart": true, "options": [
                {"text": "jump", "connections": [{"targetSlideId": foreign_start}]}
            ]}
        ]
    }))
    .unwrap();
    let saved = store.save_expedition(&graph).await.unwrap();

    let loaded = store.get_expedition(saved.expedition_id).await.unwrap();
    assert_eq!(loaded.slides.len(), 1);
    assert!(loaded.slides[0].options[0].connections.is_empty());

    let incoming: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM game.expedition_outcomes WHERE target_slide_id = $1",
    )
    .bind(foreign_start)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(incoming, 0);

    store.delete_expedition(saved.expedition_id).await.unwrap();
    store.delete_expedition(first.expedition_id).await.unwrap();
}

// ============================================================================
// Quest graphs
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_quest_option_delete_cascades() {
    let (store, _guard) = store().await;

    let chain_id = store
        .create_quest_chain(&NewQuestChain {
            name: unique("Smith's debt"),
            description: None,
            settlement_id: None,
            asset_id: None,
        })
        .await
        .unwrap();

    let graph: QuestGraph = serde_json::from_value(json!({
        "chainId": chain_id,
        "quests": [
            {"id": -1, "title": "Ask", "options": [
                {"id": -10, "text": "Ask around"},
                {"id": -11, "text": "Pay", "endsQuest": true}
            ]},
            {"id": -2, "title": "Repay", "requisiteOptionId": -10, "options": []}
        ],
        "requirements": [
            {"localOptionId": -11, "localRequiredOptionId": -10},
            {"localOptionId": -11, "localRequiredOptionId": -11}
        ]
    }))
    .unwrap();

    let saved = store.save_quest_chain(&graph).await.unwrap();
    let ask = saved.option_mapping.resolve(GraphId::Local(-10)).unwrap();
    let repay = saved.quest_mapping.resolve(GraphId::Local(-2)).unwrap();

    let requirements: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM game.quest_option_requirements WHERE required_option_id = $1",
    )
    .bind(ask)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(requirements, 1, "self requirement skipped");

    store.delete_quest_option(ask).await.unwrap();

    let requirements: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM game.quest_option_requirements
         WHERE option_id = $1 OR required_option_id = $1",
    )
    .bind(ask)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(requirements, 0);

    let requisite: Option<i32> =
        sqlx::query_scalar("SELECT requisite_option_id FROM game.quests WHERE id = $1")
            .bind(repay)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(requisite, None);

    let chains = store.list_quest_chains().await.unwrap();
    let chain = chains.iter().find(|c| c.id == chain_id).unwrap();
    assert_eq!(chain.quests.len(), 2);
}

async fn new_chain(store: &PostgresStore) -> i32 {
    store
        .create_quest_chain(&NewQuestChain {
            name: unique("Lost letters"),
            description: None,
            settlement_id: None,
            asset_id: None,
        })
        .await
        .unwrap()
}

async fn requirement_count(store: &PostgresStore, option_id: i32) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM game.quest_option_requirements
         WHERE option_id = $1 OR required_option_id = $1",
    )
    .bind(option_id)
    .fetch_one(store.pool())
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_unknown_server_option_references_skipped() {
    let (store, _guard) = store().await;
    let chain_id = new_chain(&store).await;

    let graph: QuestGraph = serde_json::from_value(json!({
        "chainId": chain_id,
        "quests": [
            {"id": -1, "title": "Deliver", "requisiteOptionId": 999999999, "options": [
                {"id": -10, "text": "Hand over"}
            ]}
        ],
        "requirements": [
            {"localOptionId": -10, "requiredOptionId": 999999999}
        ]
    }))
    .unwrap();

    let saved = store.save_quest_chain(&graph).await.unwrap();
    let option = saved.option_mapping.resolve(GraphId::Local(-10)).unwrap();
    let quest = saved.quest_mapping.resolve(GraphId::Local(-1)).unwrap();
    assert_eq!(requirement_count(&store, option).await, 0);

    let requisite: Option<i32> =
        sqlx::query_scalar("SELECT requisite_option_id FROM game.quests WHERE id = $1")
            .bind(quest)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(requisite, None);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_requirement_on_option_deleted_in_same_save_skipped() {
    let (store, _guard) = store().await;
    let chain_id = new_chain(&store).await;

    let first: QuestGraph = serde_json::from_value(json!({
        "chainId": chain_id,
        "quests": [
            {"id": -1, "title": "Read", "options": [
                {"id": -10, "text": "Open"},
                {"id": -11, "text": "Burn"}
            ]}
        ]
    }))
    .unwrap();
    let saved = store.save_quest_chain(&first).await.unwrap();
    let quest = saved.quest_mapping.resolve(GraphId::Local(-1)).unwrap();
    let open = saved.option_mapping.resolve(GraphId::Local(-10)).unwrap();
    let burn = saved.option_mapping.resolve(GraphId::Local(-11)).unwrap();

    let second: QuestGraph = serde_json::from_value(json!({
        "chainId": chain_id,
        "quests": [
            {"id": quest, "title": "Read", "options": [
                {"id": open, "text": "Open"}
            ]}
        ],
        "requirements": [
            {"optionId": open, "requiredOptionId": burn}
        ],
        "deletedOptionIds": [burn]
    }))
    .unwrap();
    store.save_quest_chain(&second).await.unwrap();

    assert_eq!(requirement_count(&store, open).await, 0);
    let chains = store.list_quest_chains().await.unwrap();
    let chain = chains.iter().find(|c| c.id == chain_id).unwrap();
    assert_eq!(chain.quests[0].options.len(), 1);
}

// ============================================================================
// Moderation & servers
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_banned_word_notification() {
    let (store, _guard) = store().await;
    let mut listener = PgListener::connect(&database_url()).await.unwrap();
    listener.listen(BANNED_WORDS_CHANNEL).await.unwrap();

    let word = unique("foo");
    let added = store.add_banned_word(&word, 2).await.unwrap();

    let notification = tokio::time::timeout(Duration::from_secs(5), listener.recv())
        .await
        .expect("no notification received")
        .unwrap();
    let payload: Value = serde_json::from_str(notification.payload()).unwrap();
    assert_eq!(
        payload,
        json!({"action": "added", "id": added.id, "word": word, "severity": 2})
    );

    assert!(matches!(
        store.add_banned_word(&word, 1).await,
        Err(PostgresError::Validation(_))
    ));

    store.remove_banned_word(added.id).await.unwrap();
    let notification = tokio::time::timeout(Duration::from_secs(5), listener.recv())
        .await
        .expect("no notification received")
        .unwrap();
    let payload: Value = serde_json::from_str(notification.payload()).unwrap();
    assert_eq!(payload["action"], "removed");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_server_defaults_and_counts() {
    let (store, _guard) = store().await;

    let server = store.create_server(Some("Season 9"), None).await.unwrap();
    assert_eq!(server.ends_at, default_ends_at(server.created_at));

    for player in ["p1", "p1", "p2"] {
        sqlx::query("INSERT INTO game.characters (player_id, server_id) VALUES ($1, $2)")
            .bind(player)
            .bind(server.id)
            .execute(store.pool())
            .await
            .unwrap();
    }

    let servers = store.list_servers().await.unwrap();
    let listed = servers.iter().find(|s| s.id == server.id).unwrap();
    assert_eq!(listed.character_count, 3);
    assert_eq!(listed.player_count, 2);

    sqlx::query("DELETE FROM game.characters WHERE server_id = $1")
        .bind(server.id)
        .execute(store.pool())
        .await
        .unwrap();
    store.delete_server(server.id).await.unwrap();
}
