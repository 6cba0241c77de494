//! Big Picture button: short press opens Big Picture mode, long press
//! closes it.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use steampad_steam::Steam;
use tracing::debug;

use crate::contract::{ButtonContext, GlobalStore};
use crate::global::{StateUpdate, sync_global_state};

/// Presses held at least this long close Big Picture instead of
/// opening it.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(500);

const TITLE_ON: &str = "BP: ON";
const TITLE_OFF: &str = "BP: OFF";

/// Handler for the Big Picture action.
pub struct BigPictureAction {
    steam: Arc<Steam>,
    pressed_at: Mutex<Option<Instant>>,
}

impl BigPictureAction {
    pub fn new(steam: Arc<Steam>) -> Self {
        Self {
            steam,
            pressed_at: Mutex::new(None),
        }
    }

    /// Marks the press start; the decision happens on key up.
    pub fn key_down(&self) {
        *self.pressed_at.lock().unwrap() = Some(Instant::now());
    }

    pub async fn key_up(&self, ctx: &dyn ButtonContext, store: &dyn GlobalStore) {
        let held = self
            .pressed_at
            .lock()
            .unwrap()
            .take()
            .map(|at| at.elapsed())
            .unwrap_or_default();
        self.dispatch(ctx, store, held).await;
    }

    async fn dispatch(&self, ctx: &dyn ButtonContext, store: &dyn GlobalStore, held: Duration) {
        let open = if held >= LONG_PRESS_THRESHOLD {
            debug!(?held, "long press, closing Big Picture");
            self.steam.protocol().exit_big_picture();
            false
        } else {
            debug!(?held, "short press, opening Big Picture");
            // Best-effort verification; the title reflects the re-probe.
            self.steam.protocol().launch_big_picture().await
        };

        sync_global_state(
            store,
            StateUpdate {
                big_picture_open: Some(open),
                ..Default::default()
            },
        )
        .await;
        ctx.set_title(if open { TITLE_ON } else { TITLE_OFF }.to_string())
            .await;
    }
}
