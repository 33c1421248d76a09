// --- File: crates/coursecast_common/src/models.rs ---

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The device record of one enrolled identity.
///
/// Records are provisioned from the roster before first use and afterwards only
/// rewritten by token registration, which replaces `token`, `partner`,
/// `environment`, `version` and `updated_at` together.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Stable identifier from the roster
    pub id: String,

    /// Current push delivery token, empty until the first registration
    pub token: String,

    /// Distribution partner tag
    pub partner: String,

    /// Deployment stage tag (qa, staging, release, ...)
    pub environment: String,

    /// App version reported by the client
    pub version: String,

    /// Courses the identity is enrolled in, fixed at provisioning time
    pub courses: Vec<String>,

    /// Time of the last registration write
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    /// Create a provisioned, not yet registered record
    pub fn provisioned(id: impl Into<String>, courses: Vec<String>) -> Self {
        Self {
            id: id.into(),
            token: String::new(),
            partner: String::new(),
            environment: String::new(),
            version: String::new(),
            courses,
            updated_at: None,
        }
    }

    /// A record takes part in resolution only once it carries a token.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn is_enrolled_in(&self, course: &str) -> bool {
        self.courses.iter().any(|c| c == course)
    }

    /// Whether the record was last registered under this partner and environment.
    pub fn belongs_to(&self, partner: &str, environment: &str) -> bool {
        self.partner == partner && self.environment == environment
    }
}
