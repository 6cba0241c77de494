//! The high-level Steam facade and its shared, lazily-initialized handle.
//!
//! A [`Steam`] value is a snapshot: installation record, library folders,
//! installed apps, and user profiles are read once at construction.
//! Process liveness is the exception and is always probed live. Callers
//! that need fresh disk state drop the value and build a new one, which
//! [`SteamHandle::reset`] makes explicit.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use steampad_shell::PowerShell;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::SteamError;
use crate::icon::{IconResolver, MetadataLookup};
use crate::install::Installation;
use crate::library::{self, InstalledApp, LibraryFolder};
use crate::process::ProcessInspector;
use crate::protocol::SteamProtocol;
use crate::users::{self, UserProfile};

/// A slot holding one shared value, initialized on first access.
///
/// Construction is serialized: concurrent first accesses run the
/// initializer exactly once and all receive the same `Arc`. A failed
/// initialization leaves the slot empty, so the next access retries.
pub struct AsyncSlot<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> AsyncSlot<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::const_new(None),
        }
    }

    /// Returns the held value, running `init` first if the slot is empty.
    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // The lock is held across `init` so a second caller waits for the
        // in-flight construction instead of starting its own.
        let mut slot = self.slot.lock().await;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init().await?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Empties the slot; the next access re-initializes.
    pub async fn reset(&self) {
        *self.slot.lock().await = None;
    }
}

impl<T> Default for AsyncSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide access point for the lazily-built [`Steam`] facade.
pub struct SteamHandle {
    slot: AsyncSlot<Steam>,
}

impl SteamHandle {
    pub const fn new() -> Self {
        Self {
            slot: AsyncSlot::new(),
        }
    }

    /// Returns the shared facade, detecting the installation on first use.
    pub async fn get(&self) -> Result<Arc<Steam>, SteamError> {
        self.slot.get_or_try_init(Steam::create).await
    }

    /// Drops the cached facade so the next [`get`](Self::get) rebuilds it
    /// from current disk state.
    pub async fn reset(&self) {
        self.slot.reset().await;
    }
}

impl Default for SteamHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the local Steam installation plus live control surfaces.
pub struct Steam {
    installation: Installation,
    folders: Vec<LibraryFolder>,
    apps: Vec<InstalledApp>,
    profiles: Vec<UserProfile>,
    inspector: Arc<ProcessInspector>,
    protocol: SteamProtocol,
}

impl Steam {
    /// Detects the installation and reads the full snapshot.
    pub async fn create() -> Result<Self, SteamError> {
        let powershell = Arc::new(PowerShell::new());
        let installation = Installation::detect(&powershell).await?;
        Ok(Self::from_installation(installation, powershell).await)
    }

    /// Builds the facade for a known installation. Library or profile
    /// reads that fail degrade to empty collections; the facade itself
    /// always constructs.
    pub async fn from_installation(installation: Installation, powershell: Arc<PowerShell>) -> Self {
        info!(path = %installation.install_path.display(), "building Steam facade");

        let folders = match library::list_library_folders(&installation.install_path).await {
            Ok(folders) => folders,
            Err(e) => {
                warn!("failed to read library folders: {e}");
                Vec::new()
            }
        };
        let apps = library::list_installed_apps(&folders).await;
        let profiles = users::list_profiles(&installation.install_path).await;

        let inspector = Arc::new(ProcessInspector::new(Arc::clone(&powershell)));
        let protocol = SteamProtocol::new(
            installation.exe_path.clone(),
            powershell,
            Arc::clone(&inspector),
        );

        Self {
            installation,
            folders,
            apps,
            profiles,
            inspector,
            protocol,
        }
    }

    pub fn installation(&self) -> &Installation {
        &self.installation
    }

    pub fn install_path(&self) -> &Path {
        &self.installation.install_path
    }

    /// The auto-login account name, or `None` when not configured.
    pub fn auto_login_account(&self) -> Option<&str> {
        let account = self.installation.auto_login_account.as_str();
        (!account.is_empty()).then_some(account)
    }

    pub fn library_folders(&self) -> &[LibraryFolder] {
        &self.folders
    }

    pub fn installed_apps(&self) -> &[InstalledApp] {
        &self.apps
    }

    pub fn app_by_id(&self, app_id: u32) -> Option<&InstalledApp> {
        self.apps.iter().find(|app| app.id == app_id)
    }

    pub fn user_profiles(&self) -> &[UserProfile] {
        &self.profiles
    }

    pub fn profile_by_id(&self, steam_id64: &str) -> Option<&UserProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.steam_id64 == steam_id64)
    }

    /// Live probe, never cached.
    pub async fn is_client_running(&self) -> bool {
        self.inspector.is_client_running().await
    }

    /// Live probe, never cached.
    pub async fn is_big_picture_running(&self) -> bool {
        self.inspector.is_big_picture_running().await
    }

    /// The `steam://` control surface.
    pub fn protocol(&self) -> &SteamProtocol {
        &self.protocol
    }

    /// An icon resolver bound to this installation.
    pub fn icon_resolver(&self, lookup: Arc<dyn MetadataLookup>) -> IconResolver {
        IconResolver::new(self.installation.install_path.clone(), lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_installation(install: &Path) -> Installation {
        Installation {
            exe_path: "steam".into(),
            install_path: install.to_path_buf(),
            auto_login_account: "gabe".into(),
        }
    }

    fn write_fixture(install: &Path) {
        let steamapps = install.join("steamapps");
        fs::create_dir_all(&steamapps).unwrap();
        fs::write(
            steamapps.join("libraryfolders.vdf"),
            format!(
                "\"libraryfolders\"\n{{\n\t\"0\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n}}\n",
                install.display()
            ),
        )
        .unwrap();
        fs::write(
            steamapps.join("appmanifest_70.acf"),
            "\"AppState\"\n{\n\t\"appid\"\t\t\"70\"\n\t\"name\"\t\t\"Half-Life\"\n\t\"installdir\"\t\t\"Half-Life\"\n\t\"StateFlags\"\t\t\"4\"\n}\n",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn facade_snapshot_from_fixture() {
        let tmp = TempDir::new().unwrap();
        write_fixture(tmp.path());

        let steam = Steam::from_installation(
            test_installation(tmp.path()),
            Arc::new(PowerShell::new()),
        )
        .await;

        assert_eq!(steam.library_folders().len(), 1);
        assert_eq!(steam.installed_apps().len(), 1);
        assert_eq!(steam.app_by_id(70).unwrap().name, "Half-Life");
        assert!(steam.app_by_id(440).is_none());
        assert_eq!(steam.auto_login_account(), Some("gabe"));
    }

    #[tokio::test]
    async fn missing_library_document_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();

        let steam = Steam::from_installation(
            test_installation(tmp.path()),
            Arc::new(PowerShell::new()),
        )
        .await;

        assert!(steam.library_folders().is_empty());
        assert!(steam.installed_apps().is_empty());
        assert!(steam.user_profiles().is_empty());
    }

    #[tokio::test]
    async fn empty_auto_login_is_none() {
        let tmp = TempDir::new().unwrap();
        let mut installation = test_installation(tmp.path());
        installation.auto_login_account = String::new();

        let steam =
            Steam::from_installation(installation, Arc::new(PowerShell::new())).await;
        assert_eq!(steam.auto_login_account(), None);
    }

    #[tokio::test]
    async fn concurrent_first_access_initializes_once() {
        let slot = Arc::new(AsyncSlot::<u32>::new());
        let constructions = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let constructions = Arc::clone(&constructions);
                tokio::spawn(async move {
                    slot.get_or_try_init(|| async {
                        constructions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, std::convert::Infallible>(7)
                    })
                    .await
                    .unwrap()
                })
            })
            .collect();

        let mut values = Vec::new();
        for task in tasks {
            values.push(task.await.unwrap());
        }

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }

    #[tokio::test]
    async fn failed_initialization_is_retried() {
        let slot = AsyncSlot::<u32>::new();

        let first = slot
            .get_or_try_init(|| async { Err::<u32, &str>("boom") })
            .await;
        assert!(first.is_err());

        let second = slot
            .get_or_try_init(|| async { Ok::<_, &str>(7) })
            .await
            .unwrap();
        assert_eq!(*second, 7);
    }

    #[tokio::test]
    async fn reset_forces_reinitialization() {
        let slot = AsyncSlot::<u32>::new();
        let constructions = AtomicUsize::new(0);

        for _ in 0..2 {
            slot.get_or_try_init(|| async {
                constructions.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(7)
            })
            .await
            .unwrap();
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 1);

        slot.reset().await;
        slot.get_or_try_init(|| async {
            constructions.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::convert::Infallible>(8)
        })
        .await
        .unwrap();
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
    }
}
