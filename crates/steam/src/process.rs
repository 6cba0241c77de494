//! Process liveness probes and lifecycle control.
//!
//! Big Picture runs the same executable as the regular client, so its
//! detection matches on window-title content ("big picture",
//! case-insensitive), never on process name alone. Plain client
//! detection matches on process name only. On non-Windows systems there
//! is no window-title query, so both fall back to process-name matching.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use steampad_shell::PowerShell;
#[cfg(windows)]
use steampad_shell::ProcessTarget;
use tracing::info;

/// Name pattern matching the Steam client processes.
pub const CLIENT_PROCESS_PATTERN: &str = "steam*";

/// Plain process name used by `pgrep`/`pkill` on non-Windows systems.
#[cfg(not(windows))]
const CLIENT_PROCESS_NAME: &str = "steam";

/// Case-insensitive window-title marker for Big Picture mode.
const BIG_PICTURE_TITLE: &str = "big picture";

/// Poll period for [`ProcessInspector::wait_for_exit`].
#[cfg(not(windows))]
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Probes and controls named OS processes.
pub struct ProcessInspector {
    #[cfg_attr(not(windows), allow(dead_code))]
    powershell: Arc<PowerShell>,
}

impl ProcessInspector {
    pub fn new(powershell: Arc<PowerShell>) -> Self {
        Self { powershell }
    }

    /// Whether any Steam client process is running. Matches on process
    /// name only; always probed live, never cached.
    #[cfg(windows)]
    pub async fn is_client_running(&self) -> bool {
        !self
            .powershell
            .get_process(CLIENT_PROCESS_PATTERN, None, &["Name", "Id"])
            .await
            .is_empty()
    }

    #[cfg(not(windows))]
    pub async fn is_client_running(&self) -> bool {
        let output = tokio::process::Command::new("pgrep")
            .args(["-x", CLIENT_PROCESS_NAME])
            .output()
            .await;
        match output {
            Ok(o) => o.status.success() && !o.stdout.is_empty(),
            Err(_) => false,
        }
    }

    /// Whether the client is running in Big Picture mode. Matches on
    /// window-title content; a running client with a different title
    /// yields `false`.
    #[cfg(windows)]
    pub async fn is_big_picture_running(&self) -> bool {
        let processes = self
            .powershell
            .get_process(
                CLIENT_PROCESS_PATTERN,
                None,
                &["Name", "ProcessName", "MainWindowTitle"],
            )
            .await;
        any_big_picture_title(&processes)
    }

    #[cfg(not(windows))]
    pub async fn is_big_picture_running(&self) -> bool {
        // No window-title query here; match on process-name substring.
        let output = tokio::process::Command::new("pgrep")
            .args(["-fi", BIG_PICTURE_TITLE])
            .output()
            .await;
        match output {
            Ok(o) => o.status.success() && !o.stdout.is_empty(),
            Err(_) => false,
        }
    }

    /// Waits until no process matches `pattern`, polling every 100 ms.
    /// Returns `false` on timeout; never errors.
    pub async fn wait_for_exit(&self, pattern: &str, timeout: Duration) -> bool {
        #[cfg(windows)]
        {
            self.powershell
                .wait_process(&ProcessTarget::Name(pattern.to_string()), timeout)
                .await
        }
        #[cfg(not(windows))]
        {
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let running = tokio::process::Command::new("pgrep")
                    .args(["-x", pattern])
                    .output()
                    .await
                    .map(|o| o.status.success() && !o.stdout.is_empty())
                    .unwrap_or(false);
                if !running {
                    return true;
                }
                if tokio::time::Instant::now() >= deadline {
                    return false;
                }
                tokio::time::sleep(EXIT_POLL_INTERVAL).await;
            }
        }
    }

    /// Stops all processes matching `pattern`. Best-effort: failures are
    /// logged and swallowed.
    pub async fn stop(&self, pattern: &str, force: bool) {
        info!(pattern, force, "stopping process");
        #[cfg(windows)]
        {
            if let Err(e) = self
                .powershell
                .stop_process(&ProcessTarget::Name(pattern.to_string()), force)
                .await
            {
                tracing::warn!(pattern, "stop failed: {e}");
            }
        }
        #[cfg(not(windows))]
        {
            let mut cmd = tokio::process::Command::new("pkill");
            if force {
                cmd.arg("-9");
            }
            match cmd.arg("-x").arg(pattern).output().await {
                Ok(o) if !o.status.success() => {
                    tracing::warn!(pattern, "pkill returned non-zero");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(pattern, "pkill failed: {e}"),
            }
        }
    }
}

/// Whether a window title marks Big Picture mode.
pub fn title_matches_big_picture(title: &str) -> bool {
    title.to_lowercase().contains(BIG_PICTURE_TITLE)
}

/// Whether any process record carries a Big Picture window title.
pub fn any_big_picture_title(processes: &[Value]) -> bool {
    processes.iter().any(|p| {
        p.get("MainWindowTitle")
            .and_then(Value::as_str)
            .is_some_and(title_matches_big_picture)
    })
}
