//! Steam library readers: declared library folders and installed apps.
//!
//! The library-folders document declares where Steam stores apps; the
//! authoritative installed-app list comes from the manifest files that
//! actually exist under each folder's steamapps directory. One corrupt
//! manifest is dropped with a warning and never aborts the rest of the
//! enumeration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::state::StateFlags;
use crate::vdf::{self, Value};
use crate::SteamError;

/// Known non-game utility app ids hidden from the installed-apps view.
/// 228980 is Steamworks Common Redistributables.
pub const EXCLUDED_APP_IDS: &[u32] = &[228980];

/// One storage location Steam is configured to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFolder {
    /// The folder's steamapps directory.
    pub path: PathBuf,
    pub content_id: String,
    pub total_size: u64,
    /// Declared membership only; not authoritative.
    pub apps: Vec<u32>,
}

/// One app manifest found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApp {
    pub id: u32,
    pub name: String,
    pub install_dir: String,
    pub state_flags: StateFlags,
}

/// Parses the library-folders document under `install_path`.
///
/// Returns exactly one entry per declared folder record, ordered by the
/// record's numeric index.
pub async fn list_library_folders(install_path: &Path) -> Result<Vec<LibraryFolder>, SteamError> {
    let vdf_path = install_path.join("steamapps").join("libraryfolders.vdf");
    debug!(path = %vdf_path.display(), "reading library folders");

    let text = tokio::fs::read_to_string(&vdf_path)
        .await
        .map_err(|e| SteamError::Io(format!("failed to read {}: {e}", vdf_path.display())))?;
    let doc = vdf::parse(&text)?;

    // Newer documents nest the records under "libraryfolders".
    let records = doc.get("libraryfolders").unwrap_or(&doc);

    let mut indexed: Vec<(u32, LibraryFolder)> = Vec::new();
    if let Some(map) = records.as_obj() {
        for (key, value) in map {
            let Ok(index) = key.parse::<u32>() else {
                continue;
            };
            let Some(path) = value.get_str("path") else {
                continue;
            };

            let mut apps: Vec<u32> = value
                .get("apps")
                .and_then(Value::as_obj)
                .map(|apps| apps.keys().filter_map(|k| k.parse().ok()).collect())
                .unwrap_or_default();
            apps.sort_unstable();

            indexed.push((
                index,
                LibraryFolder {
                    path: crate::install::normalize_path(path).join("steamapps"),
                    content_id: value.get_str("contentid").unwrap_or("").to_string(),
                    total_size: value
                        .get_str("totalsize")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0),
                    apps,
                },
            ));
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    let folders: Vec<LibraryFolder> = indexed.into_iter().map(|(_, f)| f).collect();
    debug!(count = folders.len(), "found library folders");
    Ok(folders)
}

/// Enumerates app manifests across all folders.
///
/// Manifests within one folder are parsed concurrently; a failing parse
/// drops that one file only. Folder roots that cannot be read are skipped
/// with a warning. Duplicate app ids across folders keep the first
/// occurrence. Known utility apps are excluded from the result.
pub async fn list_installed_apps(folders: &[LibraryFolder]) -> Vec<InstalledApp> {
    let mut apps: Vec<InstalledApp> = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();

    for folder in folders {
        let manifests = match manifest_paths(&folder.path).await {
            Ok(paths) => paths,
            Err(e) => {
                warn!(path = %folder.path.display(), "skipping unreadable library folder: {e}");
                continue;
            }
        };
        debug!(
            path = %folder.path.display(),
            count = manifests.len(),
            "found manifests"
        );

        let parsed = join_all(manifests.iter().map(|path| parse_manifest(path))).await;

        for app in parsed.into_iter().flatten() {
            if EXCLUDED_APP_IDS.contains(&app.id) {
                continue;
            }
            if !seen.insert(app.id) {
                // Data inconsistency across library folders; keep the first.
                warn!(
                    app_id = app.id,
                    folder = %folder.path.display(),
                    "duplicate app id, keeping first occurrence"
                );
                continue;
            }
            apps.push(app);
        }
    }

    debug!(count = apps.len(), "total installed apps");
    apps
}

/// Lists `appmanifest_*.acf` files directly under a steamapps directory.
async fn manifest_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("appmanifest_") && name.ends_with(".acf") {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

/// Parses one manifest into an app entry. Any failure (unreadable file,
/// malformed VDF, unusable app id) drops this manifest only.
async fn parse_manifest(path: &Path) -> Option<InstalledApp> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), "failed to read manifest: {e}");
            return None;
        }
    };

    let doc = match vdf::parse(&text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), "failed to parse manifest: {e}");
            return None;
        }
    };

    let app_state = doc.get_ignore_case("AppState").unwrap_or(&doc);

    let id: u32 = match app_state
        .get_str_ignore_case("appid")
        .and_then(|s| s.parse().ok())
    {
        Some(id) => id,
        None => {
            warn!(path = %path.display(), "manifest has no usable app id");
            return None;
        }
    };

    Some(InstalledApp {
        id,
        name: app_state
            .get_str_ignore_case("name")
            .unwrap_or("")
            .to_string(),
        install_dir: app_state
            .get_str_ignore_case("installdir")
            .unwrap_or("")
            .to_string(),
        state_flags: StateFlags::parse(app_state.get_str_ignore_case("StateFlags").unwrap_or("0")),
    })
}
