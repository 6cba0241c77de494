//! Installed-app button: launch, validate, or open a client page for
//! one configured app.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use steampad_steam::{IconResolver, Steam};
use tracing::{debug, warn};

use crate::contract::ButtonContext;

/// What a key press does for the configured app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMode {
    #[default]
    Launch,
    News,
    Properties,
    Store,
    Community,
    Validate,
}

/// Per-button settings, as persisted by the property inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// The property inspector sends the id as a string; accept both.
    #[serde(deserialize_with = "app_id_from_string_or_number")]
    pub id: Option<u32>,
    pub name: String,
    /// Extra launch parameters appended to the launch request.
    pub params: String,
    pub action_mode: ActionMode,
}

fn app_id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

fn parse_settings(value: Value) -> AppSettings {
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("unusable app settings, using defaults: {e}");
        AppSettings::default()
    })
}

/// Handler for the installed-app action.
pub struct AppAction {
    steam: Arc<Steam>,
    icons: IconResolver,
}

impl AppAction {
    pub fn new(steam: Arc<Steam>, icons: IconResolver) -> Self {
        Self { steam, icons }
    }

    /// Settings changed: backfill the display name from the installed-apps
    /// snapshot, re-title the button, and refresh the icon. A missing
    /// icon leaves the current image alone.
    pub async fn settings_received(&self, ctx: &dyn ButtonContext) {
        let mut settings = parse_settings(ctx.settings().await);
        let Some(id) = settings.id else {
            debug!("no app configured yet");
            return;
        };

        if settings.name.is_empty() {
            if let Some(app) = self.steam.app_by_id(id) {
                settings.name = app.name.clone();
                match serde_json::to_value(&settings) {
                    Ok(value) => ctx.set_settings(value).await,
                    Err(e) => warn!("failed to persist settings: {e}"),
                }
            }
        }

        let title = if settings.name.is_empty() {
            id.to_string()
        } else {
            settings.name.clone()
        };
        ctx.set_title(title).await;

        if let Some(icon) = self.icons.resolve_app_icon(id).await {
            ctx.set_image(Some(icon)).await;
        }
    }

    /// Key press: dispatch the configured control request.
    pub async fn key_down(&self, ctx: &dyn ButtonContext) {
        let settings = parse_settings(ctx.settings().await);
        let Some(id) = settings.id else {
            warn!("key down with no app configured");
            return;
        };

        debug!(app_id = id, mode = ?settings.action_mode, "app action");
        let protocol = self.steam.protocol();
        match settings.action_mode {
            ActionMode::Launch => {
                let params = (!settings.params.is_empty()).then_some(settings.params.as_str());
                protocol.launch_app(id, params);
            }
            ActionMode::News => protocol.open_app_news(id),
            ActionMode::Properties => protocol.open_app_properties(id),
            ActionMode::Store => protocol.open_app_store(id),
            ActionMode::Community => protocol.open_app_community(id),
            ActionMode::Validate => protocol.validate_app(id),
        }
    }

    /// Pushes the installed-apps choice list to the property inspector.
    pub async fn send_datasource(&self, ctx: &dyn ButtonContext) {
        let items: Vec<Value> = self
            .steam
            .installed_apps()
            .iter()
            .map(|app| json!({ "value": app.id.to_string(), "label": app.name }))
            .collect();
        ctx.send_to_property_inspector(json!({
            "event": "installedApps",
            "items": items,
        }))
        .await;
    }
}
