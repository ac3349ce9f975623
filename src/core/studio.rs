//! The editor session: live scene, undo history and their persistence.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::Config;
use crate::data::{open_store, DurableStore};
use crate::export::Notification;
use crate::history::{HistoryEngine, PersistedHistory, PushOutcome};
use crate::scene::{import_settings, SceneState, Snapshot, UiMode};
use crate::share::{AddressBar, ShareState, StoreAddressBar};
use crate::sync::DebouncedSync;
use crate::util::database_path;

const HISTORY_CHANNEL: &str = "history";
const URL_CHANNEL: &str = "url";

#[derive(Debug, Clone)]
pub struct StudioOptions {
    pub history_key: String,
    pub history_delay: Duration,
    pub url_delay: Duration,
    pub release_delay: Duration,
}

impl From<&Config> for StudioOptions {
    fn from(config: &Config) -> Self {
        Self {
            history_key: config.history_key.clone(),
            history_delay: config.sync.history_delay,
            url_delay: config.sync.url_delay,
            release_delay: config.sync.release_delay,
        }
    }
}

impl Default for StudioOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Owns the history engine and keeps the durable store and the shared link
/// in step with it.
///
/// The history blob follows history changes (commit, undo, redo, import);
/// the shared link follows the live scene and UI mode. Nothing is written
/// before [`Studio::hydrate`] has run.
pub struct Studio {
    engine: HistoryEngine,
    mode: UiMode,
    store: Arc<dyn DurableStore>,
    address_bar: Arc<dyn AddressBar>,
    history_sync: DebouncedSync,
    url_sync: DebouncedSync,
    history_key: String,
}

impl Studio {
    pub fn new(
        scene: SceneState,
        store: Arc<dyn DurableStore>,
        address_bar: Arc<dyn AddressBar>,
        options: StudioOptions,
    ) -> Self {
        Self {
            engine: HistoryEngine::new(scene),
            mode: UiMode::new(),
            store,
            address_bar,
            history_sync: DebouncedSync::new(
                HISTORY_CHANNEL,
                options.history_delay,
                options.release_delay,
            ),
            url_sync: DebouncedSync::new(URL_CHANNEL, options.url_delay, options.release_delay),
            history_key: options.history_key,
        }
    }

    /// Studio backed by the on-disk database, falling back to memory when it
    /// cannot be opened. The shared link lives in the same store.
    pub fn open(config: &Config) -> Self {
        let store = open_store(database_path());
        let address_bar = Arc::new(StoreAddressBar::new(
            store.clone(),
            config.address_bar_key.clone(),
        ));
        Self::new(
            SceneState::default(),
            store,
            address_bar,
            StudioOptions::from(config),
        )
    }

    pub fn engine(&self) -> &HistoryEngine {
        &self.engine
    }

    pub fn scene(&self) -> &SceneState {
        self.engine.scene()
    }

    pub fn mode(&self) -> &UiMode {
        &self.mode
    }

    pub fn history_sync(&self) -> &DebouncedSync {
        &self.history_sync
    }

    pub fn url_sync(&self) -> &DebouncedSync {
        &self.url_sync
    }

    /// Earliest pending flush across both channels
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.history_sync.next_deadline(), self.url_sync.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Load persisted history and the shared link, then start syncing.
    ///
    /// Lights and cameras carried by the link are applied over the restored
    /// scene and committed, so opening a link is itself undoable. A link that
    /// already matches the restored entry is left alone.
    pub async fn hydrate(&mut self) {
        let (persisted, query) = tokio::join!(
            self.store.get(&self.history_key),
            self.address_bar.query()
        );

        let persisted = persisted.unwrap_or_else(|e| {
            tracing::warn!(error = %e, key = %self.history_key, "Failed to load history, starting fresh");
            None
        });
        let query = query.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read shared link");
            String::new()
        });

        self.engine.hydrate(persisted.as_ref());
        self.history_sync.mark_synced(&self.engine.persisted());
        self.url_sync.mark_synced(query.as_str());

        let shared = ShareState::from_query(&query);
        if let Some(mode) = shared.mode {
            self.mode = mode;
        }
        if shared.lights.is_some() || shared.cameras.is_some() {
            let mut linked = self.engine.scene().clone();
            if let Some(lights) = shared.lights {
                linked.lights = lights;
            }
            if let Some(cameras) = shared.cameras {
                linked.cameras = cameras;
            }
            linked.ensure_camera_selection();

            // Links carry lights without timestamps
            if Snapshot::capture(&linked).same_scene(self.engine.current()) {
                tracing::debug!("Shared link matches restored history");
            } else {
                self.engine.edit(|scene| *scene = linked);
                self.commit();
            }
        }

        tracing::debug!(
            entries = self.engine.entries().len(),
            index = self.engine.index(),
            "Studio hydrated"
        );
    }

    /// Mutate the live scene
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut SceneState) -> R) -> R {
        let result = self.engine.edit(f);
        self.live_changed();
        result
    }

    pub fn set_mode(&mut self, mode: UiMode) {
        self.mode = mode;
        self.live_changed();
    }

    /// Push pending live edits into history. Returns `true` if an entry was
    /// appended.
    pub fn commit(&mut self) -> bool {
        let appended = self.engine.commit() == Some(PushOutcome::Appended);
        if appended {
            self.history_changed();
        }
        appended
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.engine.undo();
        if moved {
            self.history_changed();
            self.live_changed();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.engine.redo();
        if moved {
            self.history_changed();
            self.live_changed();
        }
        moved
    }

    /// Replace the scene with a settings file. Invalid files leave the
    /// scene untouched and come back as a notification.
    pub fn import_settings(&mut self, bytes: &[u8]) -> Result<(), Notification> {
        let snapshot = import_settings(bytes).map_err(|e| {
            tracing::warn!(error = %e, "Rejected settings file");
            Notification::error(format!("Could not import settings: {}", e))
        })?;

        self.engine.edit(|scene| scene.restore(&snapshot));
        self.commit();
        self.live_changed();
        Ok(())
    }

    pub fn pointer_down(&mut self) {
        self.history_sync.pointer_down();
        self.url_sync.pointer_down();
    }

    /// End of a gesture: commit it and flush both channels right away
    pub async fn pointer_up(&mut self) {
        self.commit();
        let now = Instant::now();
        self.history_sync.pointer_up(now);
        self.url_sync.pointer_up(now);
        self.flush_history().await;
        self.flush_url().await;
    }

    /// Run whichever flushes are due at `now`
    pub async fn tick(&mut self, now: Instant) {
        if self.history_sync.poll(now) {
            self.flush_history().await;
        }
        if self.url_sync.poll(now) {
            self.flush_url().await;
        }
    }

    /// Final flush on teardown
    pub async fn shutdown(&mut self) {
        self.commit();
        self.flush_history().await;
        self.flush_url().await;
    }

    /// Query string describing the current scene and mode
    pub fn share_query(&self) -> Result<String, serde_json::Error> {
        ShareState::capture(&self.mode, self.engine.scene()).to_query()
    }

    fn history_changed(&mut self) {
        if self.engine.is_hydrated() {
            self.history_sync.notify_change(Instant::now());
        }
    }

    fn live_changed(&mut self) {
        if self.engine.is_hydrated() {
            self.url_sync.notify_change(Instant::now());
        }
    }

    async fn flush_history(&mut self) {
        if !self.engine.is_hydrated() {
            return;
        }

        let payload: PersistedHistory = self.engine.persisted();
        let fingerprint = match self.history_sync.begin_flush(&payload) {
            Ok(Some(fingerprint)) => fingerprint,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot serialize history");
                return;
            }
        };

        let result = match serde_json::to_value(&payload) {
            Ok(value) => self.store.set(&self.history_key, &value).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => self.history_sync.finish_flush(fingerprint),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist history");
                self.history_sync.fail_flush(Instant::now());
            }
        }
    }

    async fn flush_url(&mut self) {
        if !self.engine.is_hydrated() {
            return;
        }

        let existing = self.address_bar.query().await.unwrap_or_default();
        let query = match ShareState::capture(&self.mode, self.engine.scene())
            .merge_into_query(&existing)
        {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot encode shared link");
                return;
            }
        };

        let fingerprint = match self.url_sync.begin_flush(query.as_str()) {
            Ok(Some(fingerprint)) => fingerprint,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot fingerprint shared link");
                return;
            }
        };

        match self.address_bar.replace_query(&query).await {
            Ok(()) => self.url_sync.finish_flush(fingerprint),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to update shared link");
                self.url_sync.fail_flush(Instant::now());
            }
        }
    }
}
