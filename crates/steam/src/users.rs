//! Logged-in user profiles from the cached login-users document.
//!
//! A fresh installation plausibly has no loginusers.vdf yet, so an
//! absent or unreadable document yields an empty list, logged but not
//! raised. A missing avatar cache file drops just that profile's avatar,
//! never the profile itself.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::vdf;

/// One locally cached Steam login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub steam_id64: String,
    pub account_name: String,
    pub persona_name: String,
    /// PNG data URI from the avatar cache; `None` when the cache file is
    /// absent.
    pub avatar: Option<String>,
}

/// Parses `config/loginusers.vdf` and resolves each profile's cached
/// avatar. Avatar loads fan out concurrently and are all awaited.
pub async fn list_profiles(install_path: &Path) -> Vec<UserProfile> {
    let vdf_path = install_path.join("config").join("loginusers.vdf");
    debug!(path = %vdf_path.display(), "reading login users");

    let text = match tokio::fs::read_to_string(&vdf_path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %vdf_path.display(), "failed to read login users: {e}");
            return Vec::new();
        }
    };

    let doc = match vdf::parse(&text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %vdf_path.display(), "failed to parse login users: {e}");
            return Vec::new();
        }
    };

    let users = doc.get("users").unwrap_or(&doc);
    let Some(entries) = users.as_obj() else {
        return Vec::new();
    };

    let profiles = join_all(entries.iter().map(|(steam_id64, entry)| async move {
        UserProfile {
            steam_id64: steam_id64.clone(),
            account_name: entry
                .get_str_ignore_case("AccountName")
                .unwrap_or("")
                .to_string(),
            persona_name: entry
                .get_str_ignore_case("PersonaName")
                .unwrap_or("")
                .to_string(),
            avatar: load_avatar(install_path, steam_id64).await,
        }
    }))
    .await;

    let mut profiles = profiles;
    profiles.sort_by(|a, b| a.steam_id64.cmp(&b.steam_id64));
    debug!(count = profiles.len(), "found logged-in users");
    profiles
}

/// Loads the cached avatar for a user as a PNG data URI.
async fn load_avatar(install_path: &Path, steam_id64: &str) -> Option<String> {
    let avatar_path = install_path
        .join("config")
        .join("avatarcache")
        .join(format!("{steam_id64}.png"));

    match tokio::fs::read(&avatar_path).await {
        Ok(bytes) => Some(format!(
            "data:image/png;base64,{}",
            BASE64.encode(&bytes)
        )),
        Err(e) => {
            warn!(path = %avatar_path.display(), "avatar cache miss: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_login_users(install: &Path, users: &[(&str, &str, &str)]) {
        let mut body = String::from("\"users\"\n{\n");
        for (id, account, persona) in users {
            body.push_str(&format!(
                "\t\"{id}\"\n\t{{\n\t\t\"AccountName\"\t\t\"{account}\"\n\t\t\"PersonaName\"\t\t\"{persona}\"\n\t\t\"RememberPassword\"\t\t\"1\"\n\t}}\n"
            ));
        }
        body.push_str("}\n");
        let config = install.join("config");
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join("loginusers.vdf"), body).unwrap();
    }

    #[tokio::test]
    async fn absent_document_is_an_empty_list() {
        let tmp = TempDir::new().unwrap();
        assert!(list_profiles(tmp.path()).await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_document_is_an_empty_list() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("config");
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join("loginusers.vdf"), "\"users\" {").unwrap();
        assert!(list_profiles(tmp.path()).await.is_empty());
    }

    #[tokio::test]
    async fn profiles_carry_account_and_persona() {
        let tmp = TempDir::new().unwrap();
        write_login_users(
            tmp.path(),
            &[
                ("76561197960287930", "gabe", "Gabe"),
                ("76561197960287931", "gordon", "Dr. Freeman"),
            ],
        );

        let profiles = list_profiles(tmp.path()).await;
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].account_name, "gabe");
        assert_eq!(profiles[1].persona_name, "Dr. Freeman");
    }

    #[tokio::test]
    async fn missing_avatar_keeps_the_profile() {
        let tmp = TempDir::new().unwrap();
        write_login_users(
            tmp.path(),
            &[
                ("76561197960287930", "gabe", "Gabe"),
                ("76561197960287931", "gordon", "Dr. Freeman"),
            ],
        );
        let cache = tmp.path().join("config").join("avatarcache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("76561197960287930.png"), b"\x89PNG fake").unwrap();

        let profiles = list_profiles(tmp.path()).await;
        assert_eq!(profiles.len(), 2);

        let with_avatar = &profiles[0];
        let avatar = with_avatar.avatar.as_deref().unwrap();
        assert!(avatar.starts_with("data:image/png;base64,"));

        assert!(profiles[1].avatar.is_none());
    }

    #[test]
    fn profile_serializes_camel_case() {
        let profile = UserProfile {
            steam_id64: "123".into(),
            account_name: "gabe".into(),
            persona_name: "Gabe".into(),
            avatar: None,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"steamId64\""));
        assert!(json.contains("\"accountName\""));
        assert!(json.contains("\"personaName\""));
    }
}
