//! Account button: switch the client to a configured login.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use steampad_steam::Steam;
use tracing::{debug, warn};

use crate::contract::{ButtonContext, GlobalStore};
use crate::global::sync_from_facade;

/// Per-button settings, as persisted by the property inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountSettings {
    pub account_name: String,
    pub persona_name: String,
}

fn parse_settings(value: Value) -> AccountSettings {
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("unusable account settings, using defaults: {e}");
        AccountSettings::default()
    })
}

/// Handler for the account-switch action.
pub struct AccountAction {
    steam: Arc<Steam>,
}

impl AccountAction {
    pub fn new(steam: Arc<Steam>) -> Self {
        Self { steam }
    }

    /// Settings changed: backfill the persona name from the cached login
    /// profiles, re-title the button, and show the cached avatar when one
    /// exists.
    pub async fn settings_received(&self, ctx: &dyn ButtonContext) {
        let mut settings = parse_settings(ctx.settings().await);
        if settings.account_name.is_empty() {
            debug!("no account configured yet");
            return;
        }

        let profile = self
            .steam
            .user_profiles()
            .iter()
            .find(|p| p.account_name == settings.account_name);

        if settings.persona_name.is_empty() {
            if let Some(profile) = profile.filter(|p| !p.persona_name.is_empty()) {
                settings.persona_name = profile.persona_name.clone();
                match serde_json::to_value(&settings) {
                    Ok(value) => ctx.set_settings(value).await,
                    Err(e) => warn!("failed to persist settings: {e}"),
                }
            }
        }

        let title = if settings.persona_name.is_empty() {
            settings.account_name.clone()
        } else {
            settings.persona_name.clone()
        };
        ctx.set_title(title).await;

        if let Some(avatar) = profile.and_then(|p| p.avatar.clone()) {
            ctx.set_image(Some(avatar)).await;
        }
    }

    /// Key press: restart the client logged in as the configured account,
    /// then re-sync the observed client state.
    pub async fn key_down(&self, ctx: &dyn ButtonContext, store: &dyn GlobalStore) {
        let settings = parse_settings(ctx.settings().await);
        if settings.account_name.is_empty() {
            warn!("key down with no account configured");
            return;
        }
        self.steam
            .protocol()
            .start_client(Some(&settings.account_name))
            .await;
        sync_from_facade(&self.steam, store).await;
    }

    /// Pushes the known-logins choice list to the property inspector.
    pub async fn send_datasource(&self, ctx: &dyn ButtonContext) {
        let items: Vec<Value> = self
            .steam
            .user_profiles()
            .iter()
            .map(|p| {
                let label = if p.persona_name.is_empty() {
                    &p.account_name
                } else {
                    &p.persona_name
                };
                json!({ "value": p.account_name, "label": label })
            })
            .collect();
        ctx.send_to_property_inspector(json!({
            "event": "steamUsers",
            "items": items,
        }))
        .await;
    }
}
