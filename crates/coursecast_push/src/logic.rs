//! Recipient resolution.
//!
//! A push is routed by exactly one [`TargetingRule`]. Rules are tried in
//! [`TargetingRule::PRIORITY`] order and the first whose selector is present
//! wins; the state of the registry never influences which rule fires.

use crate::error::PushError;
use crate::models::{TargetKind, Targeting};
use coursecast_common::DeviceRecord;
use coursecast_db::DeviceRegistry;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Joins partner and environment into a topic name
pub const TOPIC_SEPARATOR: &str = "-";

/// Topic the clients of a partner/environment pair subscribe to
pub fn topic_name(partner: &str, environment: &str) -> String {
    format!("{partner}{TOPIC_SEPARATOR}{environment}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingRule {
    Individual,
    Course,
    Version,
    Topic,
}

impl TargetingRule {
    pub const PRIORITY: [TargetingRule; 4] = [
        TargetingRule::Individual,
        TargetingRule::Course,
        TargetingRule::Version,
        TargetingRule::Topic,
    ];

    pub fn applies_to(self, targeting: &Targeting) -> bool {
        match self {
            TargetingRule::Individual => targeting.student.is_some(),
            TargetingRule::Course => targeting.course.is_some(),
            TargetingRule::Version => targeting.version.is_some(),
            TargetingRule::Topic => true,
        }
    }

    pub fn select(targeting: &Targeting) -> TargetingRule {
        Self::PRIORITY
            .into_iter()
            .find(|rule| rule.applies_to(targeting))
            .unwrap_or(TargetingRule::Topic)
    }

    pub fn kind(self) -> TargetKind {
        match self {
            TargetingRule::Individual => TargetKind::Individual,
            TargetingRule::Course => TargetKind::Course,
            TargetingRule::Version => TargetKind::SpecificVersion,
            TargetingRule::Topic => TargetKind::GeneralTopic,
        }
    }
}

/// Resolved delivery destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientTarget {
    /// One device of one identity
    Single {
        student: String,
        token: String,
        /// Version stored on the record
        version: String,
    },
    /// Devices selected by course or version
    Multiple { tokens: Vec<String> },
    Topic(String),
}

/// Resolve the delivery target of `targeting` against `registry`.
///
/// # Errors
///
/// * `NotFound`, `VersionMismatch` or `EmptyToken` for an individual target
/// * `NoRecipients` when a course or version selection matches no token
/// * `Registry` when the registry cannot be read
pub async fn resolve_recipients<R: DeviceRegistry>(
    registry: &R,
    targeting: &Targeting,
) -> Result<(TargetingRule, RecipientTarget), PushError> {
    let rule = TargetingRule::select(targeting);
    debug!(
        "Targeting rule {:?} selected for {}/{}",
        rule, targeting.partner, targeting.environment
    );

    let target = match rule {
        TargetingRule::Individual => {
            let student = targeting.student.as_deref().unwrap_or_default();
            let record = registry.get(student).await?;
            individual_target(&record, targeting.version.as_deref())?
        }
        TargetingRule::Course => {
            let course = targeting.course.as_deref().unwrap_or_default();
            let records = registry.list().await?;
            let tokens = course_tokens(
                &records,
                &targeting.partner,
                &targeting.environment,
                course,
                targeting.version.as_deref(),
            );
            if tokens.is_empty() {
                return Err(PushError::NoRecipients(format!("course {course}")));
            }
            RecipientTarget::Multiple { tokens }
        }
        TargetingRule::Version => {
            let version = targeting.version.as_deref().unwrap_or_default();
            let records = registry.list().await?;
            let tokens = version_tokens(
                &records,
                &targeting.partner,
                &targeting.environment,
                version,
            );
            if tokens.is_empty() {
                return Err(PushError::NoRecipients(format!("version {version}")));
            }
            RecipientTarget::Multiple { tokens }
        }
        TargetingRule::Topic => {
            RecipientTarget::Topic(topic_name(&targeting.partner, &targeting.environment))
        }
    };

    Ok((rule, target))
}

/// Target a single record, checking the requested version against the stored one.
pub fn individual_target(
    record: &DeviceRecord,
    requested_version: Option<&str>,
) -> Result<RecipientTarget, PushError> {
    if let Some(requested) = requested_version {
        if requested != record.version {
            return Err(PushError::VersionMismatch {
                student: record.id.clone(),
                requested: requested.to_string(),
                actual: record.version.clone(),
            });
        }
    }
    if !record.has_token() {
        return Err(PushError::EmptyToken(record.id.clone()));
    }
    Ok(RecipientTarget::Single {
        student: record.id.clone(),
        token: record.token.clone(),
        version: record.version.clone(),
    })
}

/// Tokens of the registered records enrolled in `course`, optionally narrowed to
/// one app version.
pub fn course_tokens(
    records: &[DeviceRecord],
    partner: &str,
    environment: &str,
    course: &str,
    version: Option<&str>,
) -> Vec<String> {
    collect_tokens(records, |record| {
        record.belongs_to(partner, environment)
            && record.is_enrolled_in(course)
            && version.map_or(true, |v| record.version == v)
    })
}

/// Tokens of the registered records running `version`
pub fn version_tokens(
    records: &[DeviceRecord],
    partner: &str,
    environment: &str,
    version: &str,
) -> Vec<String> {
    collect_tokens(records, |record| {
        record.belongs_to(partner, environment) && record.version == version
    })
}

// Ordered by record id; a token shared by several records is sent once.
fn collect_tokens(
    records: &[DeviceRecord],
    matches: impl Fn(&DeviceRecord) -> bool,
) -> Vec<String> {
    let mut selected: Vec<&DeviceRecord> = records
        .iter()
        .filter(|record| record.has_token() && matches(record))
        .collect();
    selected.sort_by(|a, b| a.id.cmp(&b.id));

    let mut seen = HashSet::new();
    selected
        .into_iter()
        .map(|record| record.token.clone())
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Key/value metadata delivered with the notification.
pub fn message_data(targeting: &Targeting, target: &RecipientTarget) -> HashMap<String, String> {
    let mut data = HashMap::from([
        ("partner".to_string(), targeting.partner.clone()),
        ("environment".to_string(), targeting.environment.clone()),
    ]);
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();

    match target {
        RecipientTarget::Single {
            student, version, ..
        } => {
            data.insert("student".to_string(), student.clone());
            data.insert("course".to_string(), optional(&targeting.course));
            data.insert("version".to_string(), version.clone());
        }
        RecipientTarget::Multiple { .. } => {
            if let Some(course) = &targeting.course {
                data.insert("course".to_string(), course.clone());
            }
            data.insert("version".to_string(), optional(&targeting.version));
        }
        RecipientTarget::Topic(_) => {}
    }
    data
}
