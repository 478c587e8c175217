//! The dashboard configuration document.
//!
//! One [`Configuration`] describes the whole homepage: the title, the ordered
//! service grid, the ordered news feeds, the theme, and which auxiliary panels
//! are visible.  It is stored as a single JSON object with camelCase keys:
//!
//! ```json
//! {
//!   "appTitle": "Home",
//!   "services": [
//!     { "name": "Git", "url": "http://git", "icon": "📁", "color": "blue" }
//!   ],
//!   "newsFeeds": [ { "name": "LWN", "url": "https://lwn.net/headlines/rss" } ],
//!   "theme": "nord-frost",
//!   "showSystemMonitor": true
//! }
//! ```
//!
//! # Defaults and the load-time merge
//!
//! Documents coming back from a backend may be partial or carry fields of the
//! wrong shape.  [`merge_over_defaults`] walks the document field by field: a
//! field is taken from the document only if it is present and well-formed,
//! otherwise the compiled-in default is used.  Collections are always arrays
//! after the merge, never absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Theme applied when the document does not name one.
pub const DEFAULT_THEME: &str = "catppuccin-macchiato";

/// Placeholder glyph for services submitted without an icon.
pub const DEFAULT_ICON: &str = "📁";

/// Number of headlines shown per feed when the document does not say.
pub const DEFAULT_MAX_NEWS_PER_FEED: u32 = 3;

// ── Document types ────────────────────────────────────────────────────────────

/// Top-level dashboard configuration.
///
/// `services` and `news_feeds` are ordered: index order is display order, and
/// an item's index is its identity (see [`crate::domain::collection`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Display title override.  Empty means "use the localized default".
    #[serde(default)]
    pub app_title: String,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub news_feeds: Vec<Feed>,
    /// Theme identifier.  Opaque to this crate.
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_max_news_per_feed")]
    pub max_news_per_feed: u32,
    #[serde(flatten)]
    pub panels: PanelVisibility,
}

/// One shortcut card in the service grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default = "default_icon", deserialize_with = "null_as_default_icon")]
    pub icon: String,
    /// Category tag, used by the renderer to pick a card accent.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub color: String,
}

/// One RSS source for the news panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub name: String,
    pub url: String,
}

/// Visibility flags for the auxiliary panels.  All hidden by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelVisibility {
    #[serde(default)]
    pub show_system_monitor: bool,
    #[serde(default)]
    pub show_k3s_nodes: bool,
    #[serde(default)]
    pub show_k3s_pods: bool,
    #[serde(default)]
    pub show_k3s_deployments: bool,
    #[serde(default)]
    pub show_k3s_services: bool,
    #[serde(default)]
    pub show_k3s_events: bool,
}

/// Names one of the auxiliary panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    SystemMonitor,
    K3sNodes,
    K3sPods,
    K3sDeployments,
    K3sServices,
    K3sEvents,
}

/// Error returned when a panel name cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown panel '{0}' (expected one of: system-monitor, k3s-nodes, k3s-pods, k3s-deployments, k3s-services, k3s-events)")]
pub struct UnknownPanel(pub String);

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}
fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}
fn default_max_news_per_feed() -> u32 {
    DEFAULT_MAX_NEWS_PER_FEED
}

// An explicit `null` in an optional field reads as the field's default.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
fn null_as_default_icon<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_icon))
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            app_title: String::new(),
            services: Vec::new(),
            news_feeds: Vec::new(),
            theme: default_theme(),
            max_news_per_feed: default_max_news_per_feed(),
            panels: PanelVisibility::default(),
        }
    }
}

impl Service {
    /// Builds a service with the default icon, no description, and no color tag.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: String::new(),
            icon: default_icon(),
            color: String::new(),
        }
    }
}

impl Feed {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

// ── Panels ────────────────────────────────────────────────────────────────────

impl Panel {
    pub const ALL: [Panel; 6] = [
        Panel::SystemMonitor,
        Panel::K3sNodes,
        Panel::K3sPods,
        Panel::K3sDeployments,
        Panel::K3sServices,
        Panel::K3sEvents,
    ];

    /// The document key holding this panel's flag.
    pub fn document_key(self) -> &'static str {
        match self {
            Panel::SystemMonitor => "showSystemMonitor",
            Panel::K3sNodes => "showK3sNodes",
            Panel::K3sPods => "showK3sPods",
            Panel::K3sDeployments => "showK3sDeployments",
            Panel::K3sServices => "showK3sServices",
            Panel::K3sEvents => "showK3sEvents",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Panel::SystemMonitor => "system-monitor",
            Panel::K3sNodes => "k3s-nodes",
            Panel::K3sPods => "k3s-pods",
            Panel::K3sDeployments => "k3s-deployments",
            Panel::K3sServices => "k3s-services",
            Panel::K3sEvents => "k3s-events",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Panel {
    type Err = UnknownPanel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Panel::ALL
            .into_iter()
            .find(|p| p.slug() == wanted)
            .ok_or_else(|| UnknownPanel(s.to_string()))
    }
}

impl PanelVisibility {
    pub fn get(&self, panel: Panel) -> bool {
        match panel {
            Panel::SystemMonitor => self.show_system_monitor,
            Panel::K3sNodes => self.show_k3s_nodes,
            Panel::K3sPods => self.show_k3s_pods,
            Panel::K3sDeployments => self.show_k3s_deployments,
            Panel::K3sServices => self.show_k3s_services,
            Panel::K3sEvents => self.show_k3s_events,
        }
    }

    pub fn set(&mut self, panel: Panel, visible: bool) {
        let flag = match panel {
            Panel::SystemMonitor => &mut self.show_system_monitor,
            Panel::K3sNodes => &mut self.show_k3s_nodes,
            Panel::K3sPods => &mut self.show_k3s_pods,
            Panel::K3sDeployments => &mut self.show_k3s_deployments,
            Panel::K3sServices => &mut self.show_k3s_services,
            Panel::K3sEvents => &mut self.show_k3s_events,
        };
        *flag = visible;
    }
}

// ── Load-time merge ───────────────────────────────────────────────────────────

/// Result of [`merge_over_defaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub config: Configuration,
    /// Document keys that were absent or malformed and fell back to defaults.
    pub defaulted: Vec<&'static str>,
}

/// Returns `true` when a backend body must be treated as a failure.
///
/// Anything that is not a JSON object, and any object carrying a non-null
/// `error` member, counts as an error-flagged payload.
pub fn is_error_payload(document: &Value) -> bool {
    match document.as_object() {
        Some(fields) => fields.get("error").is_some_and(|e| !e.is_null()),
        None => true,
    }
}

/// Builds a [`Configuration`] by taking each well-formed field of `document`
/// and the compiled-in default for everything else.
///
/// String fields fall back when empty.  Within a collection, elements that do
/// not deserialize are dropped with a warning and the rest keep their order.
pub fn merge_over_defaults(document: &Value) -> Merged {
    let mut config = Configuration::default();
    let mut defaulted = Vec::new();

    let Some(fields) = document.as_object() else {
        defaulted.extend(all_document_keys());
        return Merged { config, defaulted };
    };

    match non_empty_string(fields, "appTitle") {
        Some(title) => config.app_title = title,
        None => defaulted.push("appTitle"),
    }

    match fields.get("services").and_then(Value::as_array) {
        Some(items) => config.services = collect_items(items, "services"),
        None => defaulted.push("services"),
    }

    match fields.get("newsFeeds").and_then(Value::as_array) {
        Some(items) => config.news_feeds = collect_items(items, "newsFeeds"),
        None => defaulted.push("newsFeeds"),
    }

    match non_empty_string(fields, "theme") {
        Some(theme) => config.theme = theme,
        None => defaulted.push("theme"),
    }

    match fields
        .get("maxNewsPerFeed")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
    {
        Some(n) => config.max_news_per_feed = n,
        None => defaulted.push("maxNewsPerFeed"),
    }

    for panel in Panel::ALL {
        match fields.get(panel.document_key()).and_then(Value::as_bool) {
            Some(visible) => config.panels.set(panel, visible),
            None => defaulted.push(panel.document_key()),
        }
    }

    Merged { config, defaulted }
}

fn all_document_keys() -> Vec<&'static str> {
    let mut keys = vec!["appTitle", "services", "newsFeeds", "theme", "maxNewsPerFeed"];
    keys.extend(Panel::ALL.iter().map(|p| p.document_key()));
    keys
}

fn non_empty_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn collect_items<T: DeserializeOwned>(items: &[Value], field: &str) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(field, index, "dropping malformed element: {e}");
                None
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_configuration_default_has_empty_collections() {
        let cfg = Configuration::default();
        assert!(cfg.services.is_empty());
        assert!(cfg.news_feeds.is_empty());
    }

    #[test]
    fn test_configuration_default_theme_and_news_limit() {
        let cfg = Configuration::default();
        assert_eq!(cfg.theme, "catppuccin-macchiato");
        assert_eq!(cfg.max_news_per_feed, 3);
        assert_eq!(cfg.app_title, "");
    }

    #[test]
    fn test_all_panels_hidden_by_default() {
        let panels = PanelVisibility::default();
        assert!(Panel::ALL.iter().all(|p| !panels.get(*p)));
    }

    #[test]
    fn test_service_new_uses_placeholder_icon() {
        let svc = Service::new("Wiki", "http://wiki");
        assert_eq!(svc.icon, DEFAULT_ICON);
        assert_eq!(svc.description, "");
    }

    // ── Serde shape ───────────────────────────────────────────────────────────

    #[test]
    fn test_configuration_serializes_with_camel_case_keys() {
        // Arrange
        let mut cfg = Configuration::default();
        cfg.panels.show_k3s_nodes = true;

        // Act
        let value = serde_json::to_value(&cfg).expect("serialize");

        // Assert
        assert!(value.get("appTitle").is_some());
        assert!(value.get("newsFeeds").is_some());
        assert!(value.get("maxNewsPerFeed").is_some());
        assert_eq!(value["showK3sNodes"], json!(true));
        assert_eq!(value["showSystemMonitor"], json!(false));
        assert!(value.get("panels").is_none(), "panel flags are flattened");
    }

    #[test]
    fn test_service_without_optional_fields_deserializes_with_defaults() {
        let svc: Service =
            serde_json::from_value(json!({"name": "Wiki", "url": "http://wiki"})).unwrap();
        assert_eq!(svc.icon, "📁");
        assert_eq!(svc.color, "");
    }

    #[test]
    fn test_service_with_null_optional_fields_deserializes_with_defaults() {
        let svc: Service = serde_json::from_value(json!({
            "name": "NAS",
            "url": "http://nas",
            "description": null,
            "icon": null,
            "color": null
        }))
        .unwrap();

        assert_eq!(svc.description, "");
        assert_eq!(svc.icon, "📁");
        assert_eq!(svc.color, "");
    }

    // ── Panels ────────────────────────────────────────────────────────────────

    #[test]
    fn test_panel_from_str_accepts_slug_case_insensitively() {
        assert_eq!("K3S-Pods".parse::<Panel>(), Ok(Panel::K3sPods));
        assert_eq!("system-monitor".parse::<Panel>(), Ok(Panel::SystemMonitor));
    }

    #[test]
    fn test_panel_from_str_rejects_unknown_name() {
        assert!("cpu".parse::<Panel>().is_err());
    }

    #[test]
    fn test_panel_visibility_set_then_get() {
        let mut panels = PanelVisibility::default();
        panels.set(Panel::K3sEvents, true);
        assert!(panels.get(Panel::K3sEvents));
        assert!(!panels.get(Panel::K3sPods));
    }

    // ── Error payloads ────────────────────────────────────────────────────────

    #[test]
    fn test_object_with_error_member_is_error_payload() {
        assert!(is_error_payload(&json!({"error": "boom"})));
    }

    #[test]
    fn test_null_error_member_is_not_error_payload() {
        assert!(!is_error_payload(&json!({"error": null, "services": []})));
    }

    #[test]
    fn test_non_object_is_error_payload() {
        assert!(is_error_payload(&json!([1, 2, 3])));
        assert!(is_error_payload(&json!("text")));
    }

    // ── merge_over_defaults ───────────────────────────────────────────────────

    #[test]
    fn test_merge_takes_present_fields_and_defaults_the_rest() {
        // Arrange
        let doc = json!({
            "services": [{"name": "Git", "url": "http://git", "icon": "📁", "color": "blue"}],
            "newsFeeds": []
        });

        // Act
        let merged = merge_over_defaults(&doc);

        // Assert
        assert_eq!(merged.config.services.len(), 1);
        assert_eq!(merged.config.services[0].name, "Git");
        assert!(merged.config.news_feeds.is_empty());
        assert_eq!(merged.config.app_title, "");
        assert_eq!(merged.config.theme, DEFAULT_THEME);
        assert!(merged.defaulted.contains(&"appTitle"));
        assert!(!merged.defaulted.contains(&"services"));
        assert!(!merged.defaulted.contains(&"newsFeeds"));
    }

    #[test]
    fn test_merge_of_empty_object_equals_defaults() {
        let merged = merge_over_defaults(&json!({}));
        assert_eq!(merged.config, Configuration::default());
    }

    #[test]
    fn test_merge_substitutes_empty_sequence_for_null_collections() {
        let merged = merge_over_defaults(&json!({"services": null, "newsFeeds": "nope"}));
        assert!(merged.config.services.is_empty());
        assert!(merged.config.news_feeds.is_empty());
        assert!(merged.defaulted.contains(&"services"));
        assert!(merged.defaulted.contains(&"newsFeeds"));
    }

    #[test]
    fn test_merge_empty_theme_falls_back_to_default() {
        let merged = merge_over_defaults(&json!({"theme": ""}));
        assert_eq!(merged.config.theme, DEFAULT_THEME);
    }

    #[test]
    fn test_merge_wrong_type_field_falls_back() {
        let merged = merge_over_defaults(&json!({"appTitle": 42, "maxNewsPerFeed": "ten"}));
        assert_eq!(merged.config.app_title, "");
        assert_eq!(merged.config.max_news_per_feed, DEFAULT_MAX_NEWS_PER_FEED);
    }

    #[test]
    fn test_merge_drops_malformed_elements_and_keeps_order() {
        // Arrange: the middle element has no url
        let doc = json!({
            "services": [
                {"name": "A", "url": "http://a"},
                {"name": "broken"},
                {"name": "C", "url": "http://c"}
            ]
        });

        // Act
        let merged = merge_over_defaults(&doc);

        // Assert
        let names: Vec<_> = merged.config.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
    }

    #[test]
    fn test_merge_keeps_services_with_null_optional_fields() {
        // Arrange
        let doc = json!({
            "services": [
                {"name": "NAS", "url": "http://nas", "description": null},
                {"name": "Git", "url": "http://git"}
            ]
        });

        // Act
        let merged = merge_over_defaults(&doc);

        // Assert
        let names: Vec<_> = merged.config.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["NAS", "Git"]);
        assert_eq!(merged.config.services[0].description, "");
        assert!(!merged.defaulted.contains(&"services"));
    }

    #[test]
    fn test_merge_reads_panel_flags() {
        let merged = merge_over_defaults(&json!({"showSystemMonitor": true, "showK3sPods": true}));
        assert!(merged.config.panels.show_system_monitor);
        assert!(merged.config.panels.show_k3s_pods);
        assert!(!merged.config.panels.show_k3s_nodes);
    }

    #[test]
    fn test_merge_of_non_object_defaults_every_field() {
        let merged = merge_over_defaults(&json!(null));
        assert_eq!(merged.config, Configuration::default());
        assert_eq!(merged.defaulted.len(), 11);
    }

    #[test]
    fn test_merge_of_serialized_configuration_is_identity() {
        // Arrange
        let mut cfg = Configuration::default();
        cfg.app_title = "Home".to_string();
        cfg.theme = "nord-frost".to_string();
        cfg.services.push(Service::new("Git", "http://git"));
        cfg.news_feeds.push(Feed::new("LWN", "https://lwn.net"));
        cfg.panels.show_k3s_events = true;

        // Act
        let merged = merge_over_defaults(&serde_json::to_value(&cfg).unwrap());

        // Assert
        assert_eq!(merged.config, cfg);
        assert!(merged.defaulted.is_empty());
    }
}
