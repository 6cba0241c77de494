//! Response types for the steamcmd.net app-info API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The subset of remote app metadata this plugin consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    pub app_id: u32,
    /// Display name; empty when the catalog record lacks one.
    #[serde(default)]
    pub name: String,
    /// Client-icon hash, if the app publishes one.
    #[serde(default)]
    pub icon_hash: Option<String>,
}

/// Top-level app-info response (internal).
///
/// The full payload is large; only the fields we read are modeled and
/// everything else is ignored by serde.
#[derive(Debug, Deserialize)]
pub(crate) struct InfoResponse {
    pub status: String,
    #[serde(default)]
    pub data: HashMap<String, AppEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppEntry {
    #[serde(default)]
    pub common: Option<CommonInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommonInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub clienticon: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_response_parses_fixture() {
        let json = r#"{
            "status": "success",
            "data": {
                "440": {
                    "common": {
                        "name": "Team Fortress 2",
                        "clienticon": "2775a4a30515c0c6d9a6c2c8e135c71a7a75cfbe",
                        "type": "game",
                        "oslist": "windows,macos,linux"
                    },
                    "config": {"installdir": "Team Fortress 2"}
                }
            }
        }"#;
        let resp: InfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, "success");
        let common = resp.data["440"].common.as_ref().unwrap();
        assert_eq!(common.name, "Team Fortress 2");
        assert_eq!(
            common.clienticon.as_deref(),
            Some("2775a4a30515c0c6d9a6c2c8e135c71a7a75cfbe")
        );
    }

    #[test]
    fn missing_common_block_is_none() {
        let json = r#"{"status":"success","data":{"999999":{}}}"#;
        let resp: InfoResponse = serde_json::from_str(json).unwrap();
        assert!(resp.data["999999"].common.is_none());
    }

    #[test]
    fn common_without_icon_defaults() {
        let json = r#"{"status":"success","data":{"70":{"common":{"name":"Half-Life"}}}}"#;
        let resp: InfoResponse = serde_json::from_str(json).unwrap();
        let common = resp.data["70"].common.as_ref().unwrap();
        assert_eq!(common.name, "Half-Life");
        assert!(common.clienticon.is_none());
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let meta = AppMetadata {
            app_id: 440,
            name: "Team Fortress 2".into(),
            icon_hash: Some("abc".into()),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"appId\""));
        assert!(json.contains("\"iconHash\""));
    }
}
