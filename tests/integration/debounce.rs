//! Debounced flushing driven by the background studio task

use std::sync::Arc;
use std::time::Duration;

use super::common::fixtures::CountingStore;
use lumen::core::join;
use lumen::share::{AddressBar, ShareState};
use lumen::{MemoryAddressBar, SceneState, Studio, StudioHandle, StudioOptions};
use tokio::task::JoinHandle;
use tokio::time::sleep;

async fn spawn_studio(
    store: Arc<CountingStore>,
    bar: Arc<MemoryAddressBar>,
) -> (StudioHandle, JoinHandle<Studio>) {
    let mut studio = Studio::new(SceneState::default(), store, bar, StudioOptions::default());
    studio.hydrate().await;
    StudioHandle::spawn(studio)
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_writes_once() {
    let store = CountingStore::new();
    let bar = Arc::new(MemoryAddressBar::new(""));
    let (handle, task) = spawn_studio(store.clone(), bar.clone()).await;

    for step in 1..=10 {
        handle.edit(move |scene| scene.set_ibl_rotation(step as f64 * 0.1));
        handle.commit();
        sleep(Duration::from_millis(30)).await;
    }

    // Both quiet periods (350 ms link, 1200 ms history) have passed
    sleep(Duration::from_secs(2)).await;
    assert_eq!(bar.writes(), 1);
    assert_eq!(store.writes(), 1);

    let query = bar.query().await.unwrap();
    let shared = ShareState::from_query(&query);
    assert!(shared.lights.is_some());

    handle.shutdown();
    let studio = join(task).await.unwrap();
    assert!((studio.scene().ibl_rotation - 1.0).abs() < 1e-12);
    assert_eq!(studio.engine().entries().len(), 11);

    // Teardown found nothing new to write
    assert_eq!(bar.writes(), 1);
    assert_eq!(store.writes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_flush_waits_for_pointer_release() {
    let store = CountingStore::new();
    let bar = Arc::new(MemoryAddressBar::new(""));
    let (handle, task) = spawn_studio(store.clone(), bar.clone()).await;

    handle.pointer_down();
    handle.edit(|scene| scene.set_ibl_rotation(0.5));
    sleep(Duration::from_secs(3)).await;
    assert_eq!(bar.writes(), 0);

    handle.pointer_up();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(bar.writes(), 1);
    assert_eq!(store.writes(), 1);

    handle.shutdown();
    join(task).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_pending_changes() {
    let store = CountingStore::new();
    let bar = Arc::new(MemoryAddressBar::new(""));
    let (handle, task) = spawn_studio(store.clone(), bar.clone()).await;

    handle.edit(|scene| scene.set_ibl_rotation(2.0));
    handle.shutdown();
    let studio = join(task).await.unwrap();

    assert_eq!(store.writes(), 1);
    assert_eq!(bar.writes(), 1);
    assert_eq!(studio.engine().entries().len(), 2);
}
