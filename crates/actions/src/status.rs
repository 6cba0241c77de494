//! Friend-status button: each press advances the status one step
//! through the fixed cycle online → away → invisible → offline.

use std::sync::Arc;

use steampad_steam::{FriendStatus, Steam};
use tracing::debug;

use crate::contract::{ButtonContext, GlobalStore};
use crate::global::{StateUpdate, read_global_state, sync_global_state};

/// Handler for the friend-status action.
pub struct StatusAction {
    steam: Arc<Steam>,
}

impl StatusAction {
    pub fn new(steam: Arc<Steam>) -> Self {
        Self { steam }
    }

    /// Re-titles the button from the persisted status when it appears.
    pub async fn will_appear(&self, ctx: &dyn ButtonContext, store: &dyn GlobalStore) {
        let state = read_global_state(store).await;
        if let Some(status) = state.friend_status {
            ctx.set_title(status.as_str().to_string()).await;
        }
    }

    /// Key press: advance the cycle, tell the client, persist, re-title.
    /// With nothing persisted yet the first press sets `online`.
    pub async fn key_down(&self, ctx: &dyn ButtonContext, store: &dyn GlobalStore) {
        let state = read_global_state(store).await;
        let current = state.friend_status.unwrap_or(FriendStatus::Offline);
        let next = current.next();
        debug!(from = current.as_str(), to = next.as_str(), "cycling friend status");

        self.steam.protocol().set_friend_status(next);
        sync_global_state(
            store,
            StateUpdate {
                friend_status: Some(next),
                ..Default::default()
            },
        )
        .await;
        ctx.set_title(next.as_str().to_string()).await;
    }
}
