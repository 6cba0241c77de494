//! `steam://` URI-scheme control requests.
//!
//! Every control command is a fire-and-forget URI handed to the OS; no
//! response is ever read back. Success, where it matters at all, is
//! inferred by a subsequent state re-probe. Failures are logged and
//! swallowed — a failed "open store page" must not crash a button-press
//! handler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use steampad_shell::PowerShell;
#[cfg(windows)]
use steampad_shell::StartProcessOptions;
use tracing::{debug, info, warn};

use crate::process::ProcessInspector;

/// How long a running client gets to exit gracefully before an account
/// switch force-terminates it.
pub const CLIENT_EXIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Delay before re-probing after a Big Picture launch request.
/// Best-effort only; there is no readiness signal to wait on.
pub const BIG_PICTURE_VERIFY_DELAY: Duration = Duration::from_millis(500);

/// Friend status values, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Online,
    Away,
    Invisible,
    Offline,
}

impl FriendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendStatus::Online => "online",
            FriendStatus::Away => "away",
            FriendStatus::Invisible => "invisible",
            FriendStatus::Offline => "offline",
        }
    }

    /// The next status in the fixed cycle
    /// online → away → invisible → offline → online.
    pub fn next(&self) -> FriendStatus {
        match self {
            FriendStatus::Online => FriendStatus::Away,
            FriendStatus::Away => FriendStatus::Invisible,
            FriendStatus::Invisible => FriendStatus::Offline,
            FriendStatus::Offline => FriendStatus::Online,
        }
    }
}

// URI constructors. Kept pure so the request text is testable.

pub fn exit_uri() -> String {
    "steam://exit".into()
}

pub fn open_big_picture_uri() -> String {
    "steam://open/bigpicture".into()
}

pub fn close_big_picture_uri() -> String {
    "steam://close/bigpicture".into()
}

pub fn friend_status_uri(status: FriendStatus) -> String {
    format!("steam://friends/status/{}", status.as_str())
}

pub fn friends_list_uri() -> String {
    "steam://open/friends".into()
}

pub fn launch_app_uri(app_id: u32, params: Option<&str>) -> String {
    match params {
        Some(params) if !params.is_empty() => format!("steam://launch/{app_id}/{params}"),
        _ => format!("steam://launch/{app_id}"),
    }
}

pub fn validate_app_uri(app_id: u32) -> String {
    format!("steam://validate/{app_id}")
}

pub fn app_store_uri(app_id: u32) -> String {
    format!("steam://store/{app_id}")
}

pub fn app_news_uri(app_id: u32) -> String {
    format!("steam://appnews/{app_id}")
}

pub fn app_properties_uri(app_id: u32) -> String {
    format!("steam://gameproperties/{app_id}")
}

pub fn app_community_uri(app_id: u32) -> String {
    format!("steam://url/GameHub/{app_id}")
}

/// Issues control requests against the local client.
pub struct SteamProtocol {
    exe_path: PathBuf,
    #[cfg_attr(not(windows), allow(dead_code))]
    powershell: Arc<PowerShell>,
    inspector: Arc<ProcessInspector>,
}

impl SteamProtocol {
    pub fn new(
        exe_path: PathBuf,
        powershell: Arc<PowerShell>,
        inspector: Arc<ProcessInspector>,
    ) -> Self {
        Self {
            exe_path,
            powershell,
            inspector,
        }
    }

    /// Starts the client, optionally logging in as a specific account.
    ///
    /// An account switch first requests graceful exit of any running
    /// instance, waits up to [`CLIENT_EXIT_TIMEOUT`], and force-terminates
    /// only if the graceful exit does not complete in time.
    pub async fn start_client(&self, account: Option<&str>) {
        match account {
            Some(account) => {
                info!(account, "starting client as account");

                if self.inspector.is_client_running().await {
                    self.exit_client();
                    let exited = self
                        .inspector
                        .wait_for_exit(client_wait_pattern(), CLIENT_EXIT_TIMEOUT)
                        .await;
                    if !exited {
                        warn!("client did not exit in time, force-stopping");
                        self.inspector.stop(client_wait_pattern(), true).await;
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                }

                self.spawn_exe(&["-login", account]).await;
            }
            None => {
                info!("starting client");
                self.spawn_exe(&[]).await;
            }
        }
    }

    /// Requests a graceful client exit.
    pub fn exit_client(&self) {
        info!("requesting client exit");
        self.open_uri(exit_uri());
    }

    /// Fires the Big Picture launch request, then re-probes running
    /// status after a short fixed delay. The result is best-effort, not
    /// authoritative.
    pub async fn launch_big_picture(&self) -> bool {
        debug!("launching Big Picture mode");
        self.open_uri(open_big_picture_uri());

        tokio::time::sleep(BIG_PICTURE_VERIFY_DELAY).await;
        let running = self.inspector.is_big_picture_running().await;
        if !running {
            warn!("Big Picture launch request sent, but verification failed");
        }
        running
    }

    pub fn exit_big_picture(&self) {
        debug!("exiting Big Picture mode");
        self.open_uri(close_big_picture_uri());
    }

    pub fn set_friend_status(&self, status: FriendStatus) {
        self.open_uri(friend_status_uri(status));
    }

    pub fn open_friends_list(&self) {
        self.open_uri(friends_list_uri());
    }

    pub fn launch_app(&self, app_id: u32, params: Option<&str>) {
        self.open_uri(launch_app_uri(app_id, params));
    }

    pub fn validate_app(&self, app_id: u32) {
        self.open_uri(validate_app_uri(app_id));
    }

    pub fn open_app_store(&self, app_id: u32) {
        self.open_uri(app_store_uri(app_id));
    }

    pub fn open_app_news(&self, app_id: u32) {
        self.open_uri(app_news_uri(app_id));
    }

    pub fn open_app_properties(&self, app_id: u32) {
        self.open_uri(app_properties_uri(app_id));
    }

    pub fn open_app_community(&self, app_id: u32) {
        self.open_uri(app_community_uri(app_id));
    }

    /// Hands a URI to the OS handler, fire-and-forget. Failures are
    /// logged; no retry, no propagation.
    fn open_uri(&self, uri: String) {
        debug!(%uri, "firing control request");

        #[cfg(windows)]
        {
            let powershell = Arc::clone(&self.powershell);
            tokio::spawn(async move {
                if let Err(e) = powershell
                    .start_process(&StartProcessOptions::new(&uri))
                    .await
                {
                    warn!(%uri, "control request failed: {e}");
                }
            });
        }

        #[cfg(not(windows))]
        {
            if let Err(e) = tokio::process::Command::new("xdg-open")
                .arg(&uri)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
            {
                warn!(%uri, "control request failed: {e}");
            }
        }
    }

    /// Launches the client executable directly.
    async fn spawn_exe(&self, args: &[&str]) {
        #[cfg(windows)]
        {
            let mut options = StartProcessOptions::new(self.exe_path.to_string_lossy());
            options.args = args.iter().map(|a| (*a).to_string()).collect();
            if let Err(e) = self.powershell.start_process(&options).await {
                warn!("failed to start client: {e}");
            }
        }

        #[cfg(not(windows))]
        {
            if let Err(e) = tokio::process::Command::new(&self.exe_path)
                .args(args)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
            {
                warn!("failed to start client: {e}");
            }
        }
    }
}

/// Pattern used when waiting for the client to exit.
fn client_wait_pattern() -> &'static str {
    #[cfg(windows)]
    {
        crate::process::CLIENT_PROCESS_PATTERN
    }
    #[cfg(not(windows))]
    {
        "steam"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friend_status_cycle_returns_to_online() {
        let mut status = FriendStatus::Online;
        let mut seen = Vec::new();
        for _ in 0..4 {
            status = status.next();
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                FriendStatus::Away,
                FriendStatus::Invisible,
                FriendStatus::Offline,
                FriendStatus::Online,
            ]
        );
    }

    #[test]
    fn friend_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FriendStatus::Invisible).unwrap(),
            "\"invisible\""
        );
        let parsed: FriendStatus = serde_json::from_str("\"away\"").unwrap();
        assert_eq!(parsed, FriendStatus::Away);
    }

    #[test]
    fn control_uris() {
        assert_eq!(exit_uri(), "steam://exit");
        assert_eq!(open_big_picture_uri(), "steam://open/bigpicture");
        assert_eq!(close_big_picture_uri(), "steam://close/bigpicture");
        assert_eq!(
            friend_status_uri(FriendStatus::Away),
            "steam://friends/status/away"
        );
        assert_eq!(friends_list_uri(), "steam://open/friends");
    }

    #[test]
    fn app_uris() {
        assert_eq!(launch_app_uri(440, None), "steam://launch/440");
        assert_eq!(
            launch_app_uri(440, Some("-novid")),
            "steam://launch/440/-novid"
        );
        assert_eq!(launch_app_uri(440, Some("")), "steam://launch/440");
        assert_eq!(validate_app_uri(440), "steam://validate/440");
        assert_eq!(app_store_uri(440), "steam://store/440");
        assert_eq!(app_news_uri(440), "steam://appnews/440");
        assert_eq!(app_properties_uri(440), "steam://gameproperties/440");
        assert_eq!(app_community_uri(440), "steam://url/GameHub/440");
    }
}
