//! History survives restarts through the SQLite store, and a broken store
//! never stops the editor.

use std::sync::Arc;

use super::common::fixtures::{texture_light, BrokenStore};
use lumen::data::{Database, SqliteStore};
use lumen::{
    DurableStore, MemoryAddressBar, SceneState, StoreAddressBar, Studio, StudioOptions,
    HISTORY_LIMIT,
};
use serde_json::json;
use tempfile::TempDir;

fn sqlite_studio(db: &Database) -> Studio {
    Studio::new(
        SceneState::default(),
        Arc::new(SqliteStore::new(db)),
        Arc::new(MemoryAddressBar::new("")),
        StudioOptions::default(),
    )
}

#[tokio::test]
async fn test_history_reloads_after_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("lumen.db");

    {
        let db = Database::open(db_path.clone()).unwrap();
        let mut studio = sqlite_studio(&db);
        studio.hydrate().await;

        studio.edit(|scene| scene.add_light(texture_light()));
        studio.pointer_up().await;
        studio.edit(|scene| scene.set_ibl_rotation(1.25));
        studio.pointer_up().await;
        studio.undo();
        studio.shutdown().await;
    }

    let db = Database::open(db_path).unwrap();
    let mut studio = sqlite_studio(&db);
    studio.hydrate().await;

    assert_eq!(studio.engine().entries().len(), 3);
    assert_eq!(studio.engine().index(), 1);
    assert_eq!(studio.scene().lights.len(), 2);
    assert_eq!(studio.scene().ibl_rotation, 0.0);

    assert!(studio.redo());
    assert_eq!(studio.scene().ibl_rotation, 1.25);
}

/// Same wiring as the CLI: history and shared link in one database
fn linked_studio(db: &Database) -> Studio {
    let store: Arc<dyn DurableStore> = Arc::new(SqliteStore::new(db));
    Studio::new(
        SceneState::default(),
        store.clone(),
        Arc::new(StoreAddressBar::new(store, "address_bar")),
        StudioOptions::default(),
    )
}

#[tokio::test]
async fn test_redo_survives_restart_with_stored_link() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("lumen.db");

    {
        let db = Database::open(db_path.clone()).unwrap();
        let mut studio = linked_studio(&db);
        studio.hydrate().await;

        let id = studio.edit(|scene| scene.add_light(texture_light()));
        studio.edit(|scene| scene.update_light(&id, |light| light.base.intensity = 4.0));
        studio.pointer_up().await;
        studio.edit(|scene| scene.set_ibl_rotation(0.75));
        studio.pointer_up().await;
        assert!(studio.undo());
        studio.shutdown().await;
    }

    for _ in 0..2 {
        let db = Database::open(db_path.clone()).unwrap();
        let mut studio = linked_studio(&db);
        studio.hydrate().await;

        assert_eq!(studio.engine().entries().len(), 3);
        assert_eq!(studio.engine().index(), 1);
        assert!(studio.engine().can_redo());
        studio.shutdown().await;
    }

    let db = Database::open(db_path).unwrap();
    let mut studio = linked_studio(&db);
    studio.hydrate().await;
    assert!(studio.redo());
    assert_eq!(studio.scene().ibl_rotation, 0.75);
}

#[tokio::test]
async fn test_persisted_history_is_capped() {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path().join("lumen.db")).unwrap();
    let mut studio = sqlite_studio(&db);
    studio.hydrate().await;

    for step in 0..=HISTORY_LIMIT {
        studio.edit(|scene| scene.set_ibl_rotation(step as f64 * 0.01 + 0.01));
        studio.commit();
    }
    studio.shutdown().await;

    let saved = SqliteStore::new(&db).get("history").await.unwrap().unwrap();
    let entries = saved["entries"].as_array().unwrap();
    assert_eq!(entries.len(), HISTORY_LIMIT);
    assert_eq!(saved["index"], json!(HISTORY_LIMIT - 1));
    // The initial default scene was dropped first
    assert!(entries[0]["iblRotation"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_malformed_entries_are_dropped_on_load() {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path().join("lumen.db")).unwrap();
    let store = SqliteStore::new(&db);
    store
        .set(
            "history",
            &json!({
                "entries": [
                    { "version": 0, "lights": [], "cameras": [] },
                    { "version": 1, "lights": [], "cameras": [], "iblRotation": "oops" },
                    { "version": 1, "lights": "nope", "cameras": [] }
                ],
                "index": 2
            }),
        )
        .await
        .unwrap();

    let mut studio = sqlite_studio(&db);
    studio.hydrate().await;

    assert_eq!(studio.engine().entries().len(), 1);
    assert_eq!(studio.engine().index(), 0);
    assert!(studio.scene().lights.is_empty());
    assert_eq!(studio.scene().ibl_rotation, 0.0);
}

#[tokio::test]
async fn test_broken_store_falls_back_to_memory_history() {
    let mut studio = Studio::new(
        SceneState::default(),
        Arc::new(BrokenStore),
        Arc::new(MemoryAddressBar::new("")),
        StudioOptions::default(),
    );
    studio.hydrate().await;
    assert!(studio.engine().is_hydrated());
    assert_eq!(studio.engine().entries().len(), 1);

    studio.edit(|scene| scene.add_light(texture_light()));
    studio.pointer_up().await;

    // The edit is kept in memory and the failed write stays pending
    assert_eq!(studio.engine().entries().len(), 2);
    assert!(studio.history_sync().is_dirty());
    assert_eq!(studio.history_sync().writes(), 0);
    assert!(studio.undo());
}
