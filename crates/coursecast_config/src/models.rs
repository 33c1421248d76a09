// --- File: crates/coursecast_config/src/models.rs ---

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

// --- Database Config ---
// When present the device registry is SQL-backed, otherwise it lives in memory.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/coursecast.db, loaded via COURSECAST__DATABASE__URL
}

// --- Firebase Config (one per partner) ---
// Either key_path or service_account_json must resolve to a service account key.
// service_account_json is normally "secret_from_env".
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub service_account_json: Option<String>,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("key_path", &self.key_path)
            .field(
                "service_account_json",
                &self.service_account_json.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

// --- Push Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PushConfig {
    /// Upper bound for a single call into the delivery gateway.
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,
    /// Provision the built-in roster when `roster` is empty.
    #[serde(default = "default_true")]
    pub default_roster: bool,
}

fn default_gateway_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            gateway_timeout_secs: default_gateway_timeout_secs(),
            default_roster: true,
        }
    }
}

// --- Roster ---
/// One identity of the closed roster, provisioned before first use.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    #[serde(default)]
    pub courses: Vec<String>,
}

impl RosterEntry {
    pub fn new(id: &str, courses: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            courses: courses.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// The roster shipped with the first deployment: one student per partner/stage.
pub fn builtin_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("poc1qa123456", &["123"]),
        RosterEntry::new("poc1staging123456", &["456"]),
        RosterEntry::new("poc1release123456", &["789"]),
        RosterEntry::new("poc2qa123456", &["321"]),
        RosterEntry::new("poc2staging123456", &["654"]),
        RosterEntry::new("poc2release123456", &["987"]),
    ]
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub push: PushConfig,

    /// Static partner tag -> Firebase project table.
    #[serde(default)]
    pub partners: HashMap<String, FirebaseConfig>,

    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

impl AppConfig {
    /// The roster to provision: the configured one, or the built-in one when allowed.
    pub fn effective_roster(&self) -> Vec<RosterEntry> {
        if self.roster.is_empty() && self.push.default_roster {
            builtin_roster()
        } else {
            self.roster.clone()
        }
    }
}
