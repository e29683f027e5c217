//! Singleton configuration records.
//!
//! There is exactly one of each per installation, so they have no ID and
//! are written whole.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Application settings, including keyboard shortcuts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Action name → key chord
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub keyboard_shortcuts: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Local automation (HTTP) server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationServerConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deployment defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
