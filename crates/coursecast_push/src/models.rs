//! Request and response bodies of the push and token endpoints.

use coursecast_common::{DeviceRecord, MulticastReport};
use serde::{Deserialize, Serialize};

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Body of `POST /push`
///
/// Every field is optional on the wire so that missing fields are reported by
/// name instead of as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PushRequest {
    pub partner: Option<String>,
    pub environment: Option<String>,
    /// Notification title
    pub title: Option<String>,
    /// Notification body
    pub message: Option<String>,
    /// Target a single student by id
    pub student: Option<String>,
    /// Target every registered student of a course
    pub course: Option<String>,
    /// Target a specific app version
    pub version: Option<String>,
}

impl PushRequest {
    /// Split into targeting selectors and notification content. Empty strings
    /// count as absent.
    pub fn into_parts(self) -> (Targeting, String, String) {
        let targeting = Targeting {
            partner: self.partner.unwrap_or_default(),
            environment: self.environment.unwrap_or_default(),
            student: present(self.student),
            course: present(self.course),
            version: present(self.version),
        };
        (
            targeting,
            self.title.unwrap_or_default(),
            self.message.unwrap_or_default(),
        )
    }
}

/// Selectors of one push
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targeting {
    pub partner: String,
    pub environment: String,
    pub student: Option<String>,
    pub course: Option<String>,
    pub version: Option<String>,
}

/// Body of `POST /api/token`
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterTokenRequest {
    #[serde(rename = "studentId")]
    pub student_id: Option<String>,
    /// Push delivery token of the device
    pub token: Option<String>,
    pub partner: Option<String>,
    pub environment: Option<String>,
    /// App version running on the device
    pub version: Option<String>,
}

/// Successful response of `POST /api/token`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterTokenResponse {
    pub success: bool,
    pub student: DeviceRecord,
}

/// Which targeting rule a push was resolved by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Individual,
    Course,
    SpecificVersion,
    GeneralTopic,
}

/// Message id of a single send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SingleDelivery {
    pub message_id: String,
}

/// Gateway response, shaped by the kind of send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum DeliveryOutcome {
    Single(SingleDelivery),
    Multicast(MulticastReport),
}

/// Successful response of `POST /push`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeliveryReport {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// Student id or topic name the push was sent to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Number of tokens of a multicast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<usize>,
    pub response: DeliveryOutcome,
}

impl DeliveryReport {
    pub(crate) fn new(kind: TargetKind, response: DeliveryOutcome) -> Self {
        Self {
            success: true,
            kind,
            sent_to: None,
            token: None,
            course: None,
            version: None,
            quantity: None,
            response,
        }
    }
}
