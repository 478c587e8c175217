//! DashboardStore: the single owner of the in-memory configuration.
//!
//! A UI (settings page, CLI, HTTP handler) holds one `DashboardStore` and
//! routes every user action through it.  Each mutating method:
//!
//! 1. applies the change to the in-memory [`Configuration`],
//! 2. persists the *whole* document through [`ConfigRepository::save`],
//! 3. returns only after the save has settled.
//!
//! Mutating methods take `&mut self`, so a second edit cannot start while the
//! previous save is in flight.  There is exactly one writer at a time and no
//! lost updates from overlapping saves.
//!
//! # Save failures
//!
//! What happens to the local change when the save fails is a [`SavePolicy`]:
//!
//! - [`SavePolicy::Optimistic`] keeps the change in memory.  The UI keeps
//!   showing what the user did, at the cost of diverging from the backend
//!   until the next successful save.
//! - [`SavePolicy::RollbackOnFailure`] restores the configuration from before
//!   the change.
//!
//! Either way the outcome is returned as [`Persistence::Failed`] so the caller
//! can show a notification.

use tracing::{debug, info, warn};

use crate::application::persistence::PersistenceBackend;
use crate::application::repository::{ConfigRepository, ConfigSource};
use crate::domain::collection::{apply_edit, Collection, Edit, EditEffect, EditError, NewsFeeds, Services};
use crate::domain::config::{Configuration, Feed, Panel, Service};

/// What to do with a local change whose save failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavePolicy {
    #[default]
    Optimistic,
    RollbackOnFailure,
}

/// Outcome of a mutating store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// The change was applied and the backend acknowledged it.
    Saved,
    /// Nothing changed, so nothing was sent.
    Unchanged,
    /// The backend rejected or never received the write.
    Failed {
        /// `true` when the in-memory change was undone.
        rolled_back: bool,
    },
}

impl Persistence {
    pub fn is_failure(self) -> bool {
        matches!(self, Persistence::Failed { .. })
    }
}

/// Holds the current configuration and persists every change.
pub struct DashboardStore<B> {
    repository: ConfigRepository<B>,
    config: Configuration,
    source: ConfigSource,
    policy: SavePolicy,
}

impl<B: PersistenceBackend> DashboardStore<B> {
    /// Loads the configuration once and takes ownership of it.
    ///
    /// Check [`DashboardStore::source`] afterwards to find out whether the
    /// backend was reachable.
    pub async fn open(repository: ConfigRepository<B>, policy: SavePolicy) -> Self {
        let loaded = repository.load().await;
        Self {
            repository,
            config: loaded.config,
            source: loaded.source,
            policy,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// How the configuration was obtained at the last load.
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    pub fn repository(&self) -> &ConfigRepository<B> {
        &self.repository
    }

    /// Current items of collection `C`.
    pub fn items<C: Collection>(&self) -> &[C::Item] {
        C::items(&self.config)
    }

    // ── Collection editing ────────────────────────────────────────────────────

    /// Applies `edit` to collection `C` and persists the result.
    ///
    /// Boundary moves return [`Persistence::Unchanged`] without a save.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::IndexOutOfRange`] for a stale or invalid index.
    /// The configuration is untouched and nothing is sent to the backend.
    pub async fn edit<C: Collection>(&mut self, edit: Edit<C::Item>) -> Result<Persistence, EditError> {
        let previous = self.snapshot();
        let op = edit.label();

        let effect = apply_edit(C::items_mut(&mut self.config), edit).map_err(|e| {
            warn!(collection = C::NAME, op, "edit rejected: {e}");
            e
        })?;

        if effect == EditEffect::Unchanged {
            debug!(collection = C::NAME, op, "edit was a no-op");
            return Ok(Persistence::Unchanged);
        }

        debug!(collection = C::NAME, op, len = C::items(&self.config).len(), "edit applied");
        Ok(self.persist(previous).await)
    }

    /// Appends to collection `C`.  Unlike indexed edits this cannot be rejected.
    pub async fn append<C: Collection>(&mut self, item: C::Item) -> Persistence {
        let previous = self.snapshot();
        C::items_mut(&mut self.config).push(item);
        debug!(collection = C::NAME, len = C::items(&self.config).len(), "item appended");
        self.persist(previous).await
    }

    pub async fn add_service(&mut self, service: Service) -> Persistence {
        self.append::<Services>(service).await
    }

    pub async fn update_service(&mut self, index: usize, service: Service) -> Result<Persistence, EditError> {
        self.edit::<Services>(Edit::Update(index, service)).await
    }

    pub async fn remove_service(&mut self, index: usize) -> Result<Persistence, EditError> {
        self.edit::<Services>(Edit::Remove(index)).await
    }

    pub async fn move_service_up(&mut self, index: usize) -> Result<Persistence, EditError> {
        self.edit::<Services>(Edit::MoveUp(index)).await
    }

    pub async fn move_service_down(&mut self, index: usize) -> Result<Persistence, EditError> {
        self.edit::<Services>(Edit::MoveDown(index)).await
    }

    pub async fn add_feed(&mut self, feed: Feed) -> Persistence {
        self.append::<NewsFeeds>(feed).await
    }

    pub async fn update_feed(&mut self, index: usize, feed: Feed) -> Result<Persistence, EditError> {
        self.edit::<NewsFeeds>(Edit::Update(index, feed)).await
    }

    pub async fn remove_feed(&mut self, index: usize) -> Result<Persistence, EditError> {
        self.edit::<NewsFeeds>(Edit::Remove(index)).await
    }

    pub async fn move_feed_up(&mut self, index: usize) -> Result<Persistence, EditError> {
        self.edit::<NewsFeeds>(Edit::MoveUp(index)).await
    }

    pub async fn move_feed_down(&mut self, index: usize) -> Result<Persistence, EditError> {
        self.edit::<NewsFeeds>(Edit::MoveDown(index)).await
    }

    // ── Scalar settings ───────────────────────────────────────────────────────

    pub async fn set_title(&mut self, title: impl Into<String>) -> Persistence {
        let title = title.into();
        self.set_with(|cfg| replace_if_different(&mut cfg.app_title, title)).await
    }

    pub async fn set_theme(&mut self, theme: impl Into<String>) -> Persistence {
        let theme = theme.into();
        self.set_with(|cfg| replace_if_different(&mut cfg.theme, theme)).await
    }

    pub async fn set_panel(&mut self, panel: Panel, visible: bool) -> Persistence {
        self.set_with(|cfg| {
            let changed = cfg.panels.get(panel) != visible;
            cfg.panels.set(panel, visible);
            changed
        })
        .await
    }

    pub async fn set_max_news_per_feed(&mut self, max: u32) -> Persistence {
        self.set_with(|cfg| replace_if_different(&mut cfg.max_news_per_feed, max)).await
    }

    // ── Whole-document operations ─────────────────────────────────────────────

    /// Deletes the stored document and, on success, resets the in-memory
    /// configuration to defaults.
    ///
    /// A failed reset leaves the in-memory configuration as it was.
    pub async fn reset(&mut self) -> Persistence {
        if !self.repository.reset().await {
            warn!("reset failed; keeping current configuration");
            return Persistence::Failed { rolled_back: false };
        }
        self.config = Configuration::default();
        self.source = ConfigSource::Backend {
            defaulted_fields: Vec::new(),
        };
        info!("configuration reset to defaults");
        Persistence::Saved
    }

    /// Replaces the whole configuration with `config`, bypassing the
    /// defaults merge, and sends it as an import.
    pub async fn import(&mut self, config: Configuration) -> Persistence {
        let previous = self.snapshot();
        self.config = config;
        if self.repository.import(&self.config).await {
            return Persistence::Saved;
        }
        self.settle_failure(previous)
    }

    /// Discards the in-memory configuration and loads it again.
    pub async fn reload(&mut self) -> &ConfigSource {
        let loaded = self.repository.load().await;
        self.config = loaded.config;
        self.source = loaded.source;
        &self.source
    }

    /// Serializes the current configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; this does not happen for well-formed
    /// configurations.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.config)
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn snapshot(&self) -> Option<Configuration> {
        (self.policy == SavePolicy::RollbackOnFailure).then(|| self.config.clone())
    }

    async fn set_with(&mut self, change: impl FnOnce(&mut Configuration) -> bool) -> Persistence {
        let previous = self.snapshot();
        if !change(&mut self.config) {
            return Persistence::Unchanged;
        }
        self.persist(previous).await
    }

    async fn persist(&mut self, previous: Option<Configuration>) -> Persistence {
        if self.repository.save(&self.config).await {
            return Persistence::Saved;
        }
        self.settle_failure(previous)
    }

    fn settle_failure(&mut self, previous: Option<Configuration>) -> Persistence {
        match previous {
            Some(previous) => {
                warn!("save failed; local change rolled back");
                self.config = previous;
                Persistence::Failed { rolled_back: true }
            }
            None => {
                warn!("save failed; keeping local change");
                Persistence::Failed { rolled_back: false }
            }
        }
    }
}

fn replace_if_different<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::persistence::MemoryBackend;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn named(names: &[&str]) -> Vec<Service> {
        names
            .iter()
            .map(|n| Service::new(*n, format!("http://{}", n.to_lowercase())))
            .collect()
    }

    fn names(store: &DashboardStore<MemoryBackend>) -> Vec<String> {
        store.items::<Services>().iter().map(|s| s.name.clone()).collect()
    }

    async fn store_with(services: &[&str], policy: SavePolicy) -> DashboardStore<MemoryBackend> {
        let mut cfg = Configuration::default();
        cfg.services = named(services);
        let backend = MemoryBackend::with_document(serde_json::to_value(&cfg).unwrap());
        DashboardStore::open(ConfigRepository::new(backend), policy).await
    }

    fn stored_names(store: &DashboardStore<MemoryBackend>) -> Vec<String> {
        let doc = store.repository().backend().document().unwrap();
        doc["services"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_open_loads_from_backend() {
        let store = store_with(&["A", "B"], SavePolicy::Optimistic).await;
        assert_eq!(names(&store), ["A", "B"]);
        assert!(matches!(store.source(), ConfigSource::Backend { .. }));
    }

    #[tokio::test]
    async fn test_unrelated_save_keeps_service_with_null_description() {
        // Arrange
        let backend = MemoryBackend::with_document(json!({
            "services": [
                {"name": "NAS", "url": "http://nas", "description": null},
                {"name": "Git", "url": "http://git"}
            ]
        }));
        let mut store = DashboardStore::open(ConfigRepository::new(backend), SavePolicy::Optimistic).await;

        // Act
        let outcome = store.add_feed(Feed::new("LWN", "https://lwn.net")).await;

        // Assert
        assert_eq!(outcome, Persistence::Saved);
        assert_eq!(names(&store), ["NAS", "Git"]);
        assert_eq!(stored_names(&store), ["NAS", "Git"]);
    }

    #[tokio::test]
    async fn test_add_then_move_up_persists_new_order() {
        // Arrange
        let mut store = store_with(&["A"], SavePolicy::Optimistic).await;

        // Act
        let added = store.add_service(Service::new("Wiki", "http://wiki")).await;
        let moved = assert_ok!(store.move_service_up(1).await);

        // Assert
        assert_eq!(added, Persistence::Saved);
        assert_eq!(moved, Persistence::Saved);
        assert_eq!(names(&store), ["Wiki", "A"]);
        assert_eq!(stored_names(&store), ["Wiki", "A"]);
    }

    #[tokio::test]
    async fn test_out_of_range_remove_is_rejected_and_not_persisted() {
        // Arrange
        let mut store = store_with(&["A", "B", "C"], SavePolicy::Optimistic).await;
        let writes_before = store.repository().backend().write_count();

        // Act
        let result = store.remove_service(5).await;

        // Assert
        assert_eq!(result, Err(EditError::IndexOutOfRange { index: 5, len: 3 }));
        assert_eq!(names(&store), ["A", "B", "C"]);
        assert_eq!(store.repository().backend().write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_boundary_move_is_unchanged_and_not_persisted() {
        let mut store = store_with(&["A", "B"], SavePolicy::Optimistic).await;
        assert_eq!(store.move_service_up(0).await, Ok(Persistence::Unchanged));
        assert_eq!(store.move_service_down(1).await, Ok(Persistence::Unchanged));
        assert_eq!(store.repository().backend().write_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_local_change_when_optimistic() {
        // Arrange
        let mut store = store_with(&["A"], SavePolicy::Optimistic).await;
        store.repository().backend().set_failing(true);

        // Act
        let outcome = store.add_service(Service::new("B", "http://b")).await;

        // Assert
        assert_eq!(outcome, Persistence::Failed { rolled_back: false });
        assert_eq!(names(&store), ["A", "B"]);
        store.repository().backend().set_failing(false);
        assert_eq!(stored_names(&store), ["A"]);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_when_policy_says_so() {
        let mut store = store_with(&["A", "B"], SavePolicy::RollbackOnFailure).await;
        store.repository().backend().set_failing(true);

        let outcome = store.remove_service(0).await;

        assert_eq!(outcome, Ok(Persistence::Failed { rolled_back: true }));
        assert_eq!(names(&store), ["A", "B"]);
    }

    #[tokio::test]
    async fn test_sequential_edits_each_see_previous_result() {
        // Arrange
        let mut store = store_with(&["A", "B", "C"], SavePolicy::Optimistic).await;

        // Act: every edit is awaited before the next one starts
        assert_ok!(store.remove_service(0).await);
        assert_ok!(store.update_service(1, Service::new("Z", "http://z")).await);
        assert_ok!(store.move_service_down(0).await);

        // Assert
        assert_eq!(names(&store), ["Z", "B"]);
        assert_eq!(stored_names(&store), ["Z", "B"]);
        assert_eq!(store.repository().backend().write_count(), 3);
    }

    #[tokio::test]
    async fn test_feed_edits_do_not_touch_services() {
        let mut store = store_with(&["A"], SavePolicy::Optimistic).await;
        store.add_feed(Feed::new("LWN", "https://lwn.net")).await;
        store.add_feed(Feed::new("HN", "https://news.ycombinator.com/rss")).await;
        assert_ok!(store.move_feed_down(0).await);
        assert_ok!(store.remove_feed(1).await);

        let feeds: Vec<_> = store.items::<NewsFeeds>().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(feeds, ["HN"]);
        assert_eq!(names(&store), ["A"]);
    }

    #[tokio::test]
    async fn test_set_title_same_value_is_unchanged() {
        let mut store = store_with(&[], SavePolicy::Optimistic).await;
        assert_eq!(store.set_title("Home").await, Persistence::Saved);
        assert_eq!(store.set_title("Home").await, Persistence::Unchanged);
        assert_eq!(store.repository().backend().write_count(), 1);
    }

    #[tokio::test]
    async fn test_set_panel_persists_flag() {
        let mut store = store_with(&[], SavePolicy::Optimistic).await;
        assert_eq!(store.set_panel(Panel::SystemMonitor, true).await, Persistence::Saved);
        let doc = store.repository().backend().document().unwrap();
        assert_eq!(doc["showSystemMonitor"], json!(true));
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let mut store = store_with(&["A"], SavePolicy::Optimistic).await;
        store.set_theme("nord-frost").await;

        assert_eq!(store.reset().await, Persistence::Saved);

        assert_eq!(store.config(), &Configuration::default());
        assert!(store.repository().backend().document().is_none());
    }

    #[tokio::test]
    async fn test_failed_reset_keeps_configuration() {
        let mut store = store_with(&["A"], SavePolicy::Optimistic).await;
        store.repository().backend().set_failing(true);
        assert_eq!(store.reset().await, Persistence::Failed { rolled_back: false });
        assert_eq!(names(&store), ["A"]);
    }

    #[tokio::test]
    async fn test_import_replaces_whole_configuration() {
        // Arrange
        let mut store = store_with(&["A", "B"], SavePolicy::Optimistic).await;
        let mut incoming = Configuration::default();
        incoming.app_title = "Lab".to_string();
        incoming.services = named(&["X"]);

        // Act
        let outcome = store.import(incoming.clone()).await;

        // Assert
        assert_eq!(outcome, Persistence::Saved);
        assert_eq!(store.config(), &incoming);
        assert_eq!(stored_names(&store), ["X"]);
    }

    #[tokio::test]
    async fn test_open_with_unreachable_backend_uses_defaults() {
        let backend = MemoryBackend::with_document(json!({"appTitle": "Home"}));
        backend.set_failing(true);
        let store = DashboardStore::open(ConfigRepository::new(backend), SavePolicy::Optimistic).await;
        assert!(matches!(store.source(), ConfigSource::Defaults { .. }));
        assert_eq!(store.config(), &Configuration::default());
    }

    #[tokio::test]
    async fn test_reload_picks_up_backend_changes() {
        let mut store = store_with(&["A"], SavePolicy::Optimistic).await;
        let replacement = json!({"services": [{"name": "Q", "url": "http://q"}]});
        assert_ok!(store.repository().backend().store(&replacement).await);

        store.reload().await;

        assert_eq!(names(&store), ["Q"]);
    }

    #[tokio::test]
    async fn test_export_json_is_pretty_and_parseable() {
        let store = store_with(&["A"], SavePolicy::Optimistic).await;
        let text = store.export_json().unwrap();
        assert!(text.contains('\n'));
        let parsed: Configuration = serde_json::from_str(&text).unwrap();
        assert_eq!(&parsed, store.config());
    }
}
