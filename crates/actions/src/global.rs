//! Plugin-wide persisted state.
//!
//! The runtime stores one JSON object for the whole plugin. Handlers
//! never write it directly; they go through [`sync_global_state`],
//! which merges partial updates over the stored object and stamps the
//! update time. Unknown or corrupt stored state falls back to defaults
//! rather than failing a button press.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steampad_steam::{FriendStatus, Steam};
use tracing::{debug, warn};

use crate::contract::GlobalStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginGlobalState {
    pub steam_running: bool,
    pub auto_login_user: String,
    pub steam_path: String,
    pub big_picture_open: bool,
    pub friend_status: Option<FriendStatus>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A partial update; `None` fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub steam_running: Option<bool>,
    pub auto_login_user: Option<String>,
    pub steam_path: Option<String>,
    pub big_picture_open: Option<bool>,
    pub friend_status: Option<FriendStatus>,
}

/// Reads the stored global state, falling back to defaults when the
/// stored object is unusable.
pub async fn read_global_state(store: &dyn GlobalStore) -> PluginGlobalState {
    match serde_json::from_value(store.global().await) {
        Ok(state) => state,
        Err(e) => {
            warn!("stored global state unusable, starting fresh: {e}");
            PluginGlobalState::default()
        }
    }
}

/// Merges `update` over the stored global state, stamps `last_updated`
/// with the current time, persists, and returns the new state.
pub async fn sync_global_state(store: &dyn GlobalStore, update: StateUpdate) -> PluginGlobalState {
    let mut state = read_global_state(store).await;

    if let Some(running) = update.steam_running {
        state.steam_running = running;
    }
    if let Some(user) = update.auto_login_user {
        state.auto_login_user = user;
    }
    if let Some(path) = update.steam_path {
        state.steam_path = path;
    }
    if let Some(open) = update.big_picture_open {
        state.big_picture_open = open;
    }
    if let Some(status) = update.friend_status {
        state.friend_status = Some(status);
    }
    state.last_updated = Some(Utc::now());

    match serde_json::to_value(&state) {
        Ok(value) => store.set_global(value).await,
        Err(e) => warn!("failed to serialize global state: {e}"),
    }
    debug!(?state, "global state synced");
    state
}

/// Re-syncs the facade-derived fields (running flag, auto-login user,
/// install path) into the global state. Called opportunistically after
/// observed client launch/terminate.
pub async fn sync_from_facade(steam: &Steam, store: &dyn GlobalStore) -> PluginGlobalState {
    let running = steam.is_client_running().await;
    sync_global_state(
        store,
        StateUpdate {
            steam_running: Some(running),
            auto_login_user: Some(steam.auto_login_account().unwrap_or("").to_string()),
            steam_path: Some(steam.install_path().to_string_lossy().into_owned()),
            ..Default::default()
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::testing::FakeStore;
    use serde_json::json;

    #[tokio::test]
    async fn update_merges_over_stored_state() {
        let store = FakeStore {
            value: serde_json::to_value(PluginGlobalState {
                steam_running: true,
                auto_login_user: "gabe".into(),
                ..Default::default()
            })
            .unwrap()
            .into(),
        };

        let state = sync_global_state(
            &store,
            StateUpdate {
                big_picture_open: Some(true),
                ..Default::default()
            },
        )
        .await;

        assert!(state.steam_running);
        assert_eq!(state.auto_login_user, "gabe");
        assert!(state.big_picture_open);
        assert!(state.last_updated.is_some());

        let persisted: PluginGlobalState =
            serde_json::from_value(store.value.lock().unwrap().clone()).unwrap();
        assert_eq!(persisted, state);
    }

    #[tokio::test]
    async fn corrupt_stored_state_starts_fresh() {
        let store = FakeStore {
            value: json!("not an object").into(),
        };

        let state = sync_global_state(
            &store,
            StateUpdate {
                steam_path: Some("/opt/steam".into()),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(state.steam_path, "/opt/steam");
        assert!(!state.steam_running);
    }

    #[tokio::test]
    async fn friend_status_persists() {
        let store = FakeStore::default();

        let state = sync_global_state(
            &store,
            StateUpdate {
                friend_status: Some(FriendStatus::Away),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(state.friend_status, Some(FriendStatus::Away));

        // A later unrelated update keeps it.
        let state = sync_global_state(&store, StateUpdate::default()).await;
        assert_eq!(state.friend_status, Some(FriendStatus::Away));
    }

    #[tokio::test]
    async fn facade_sync_records_installation_fields() {
        use steampad_shell::PowerShell;
        use steampad_steam::Installation;
        use std::sync::Arc;

        let tmp = tempfile::TempDir::new().unwrap();
        let installation = Installation {
            exe_path: "steam".into(),
            install_path: tmp.path().to_path_buf(),
            auto_login_account: "gabe".into(),
        };
        let steam = Steam::from_installation(installation, Arc::new(PowerShell::new())).await;
        let store = FakeStore::default();

        let state = sync_from_facade(&steam, &store).await;

        assert_eq!(state.auto_login_user, "gabe");
        assert_eq!(state.steam_path, tmp.path().to_string_lossy());
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn state_serializes_camel_case() {
        let state = PluginGlobalState {
            auto_login_user: "gabe".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"steamRunning\""));
        assert!(json.contains("\"autoLoginUser\""));
        assert!(json.contains("\"bigPictureOpen\""));
        assert!(json.contains("\"lastUpdated\""));
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let state: PluginGlobalState = serde_json::from_value(json!({})).unwrap();
        assert_eq!(state, PluginGlobalState::default());
    }
}
