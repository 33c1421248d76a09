//! Registry contract for device records

use crate::error::DbError;
use chrono::{DateTime, Utc};

pub use coursecast_common::models::DeviceRecord;

/// The fields rewritten by a token registration, applied as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub token: String,
    pub partner: String,
    pub environment: String,
    pub version: String,
    pub updated_at: DateTime<Utc>,
}

impl DeviceUpdate {
    /// Overwrite the mutable fields of `record`; `id` and `courses` are untouched.
    pub fn apply_to(self, record: &mut DeviceRecord) {
        record.token = self.token;
        record.partner = self.partner;
        record.environment = self.environment;
        record.version = self.version;
        record.updated_at = Some(self.updated_at);
    }
}

/// Keyed store of device records over a closed roster.
///
/// The set of ids is fixed when the registry is provisioned: `update` never
/// inserts, and nothing is ever deleted.
pub trait DeviceRegistry: Send + Sync {
    /// Fetch one record, failing with [`DbError::NotFound`] for ids outside the roster
    fn get(&self, id: &str) -> impl std::future::Future<Output = Result<DeviceRecord, DbError>> + Send;

    /// A consistent snapshot of every record. Order is unspecified.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<DeviceRecord>, DbError>> + Send;

    /// Replace token, partner, environment, version and timestamp of an existing record.
    ///
    /// Readers observe either the old or the new record, never a mix. Concurrent
    /// updates of the same id are linearised; the last committed write wins.
    fn update(
        &self,
        id: &str,
        update: DeviceUpdate,
    ) -> impl std::future::Future<Output = Result<DeviceRecord, DbError>> + Send;
}
