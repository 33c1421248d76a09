//! In-memory device registry
//!
//! Used when no database is configured and throughout the tests. Records are
//! held in a map behind a single `RwLock`: scans clone under the read lock so a
//! resolution call always sees one point in time, and each update is a single
//! replace under the write lock.

use crate::error::DbError;
use crate::repositories::device_record::{DeviceRecord, DeviceRegistry, DeviceUpdate};
use coursecast_config::RosterEntry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDeviceRegistry {
    // key: student id
    records: Arc<RwLock<HashMap<String, DeviceRecord>>>,
}

impl InMemoryDeviceRegistry {
    /// Provision one empty record per roster entry
    pub fn from_roster(roster: &[RosterEntry]) -> Self {
        Self::from_records(
            roster
                .iter()
                .map(|entry| DeviceRecord::provisioned(entry.id.clone(), entry.courses.clone()))
                .collect(),
        )
    }

    /// Build a registry from fully populated records, e.g. a restored snapshot
    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Arc::new(RwLock::new(map)),
        }
    }
}

impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn get(&self, id: &str) -> Result<DeviceRecord, DbError> {
        let map = self.records.read().await;
        map.get(id)
            .cloned()
            .ok_or_else(|| DbError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<DeviceRecord>, DbError> {
        let map = self.records.read().await;
        Ok(map.values().cloned().collect())
    }

    async fn update(&self, id: &str, update: DeviceUpdate) -> Result<DeviceRecord, DbError> {
        let mut map = self.records.write().await;
        let record = map
            .get_mut(id)
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        // Build the new value first so the swap is a single assignment.
        let mut next = record.clone();
        update.apply_to(&mut next);
        *record = next.clone();

        debug!("Updated device record for student: {}", id);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn registration(token: &str, version: &str) -> DeviceUpdate {
        DeviceUpdate {
            token: token.to_string(),
            partner: "poc1".to_string(),
            environment: "qa".to_string(),
            version: version.to_string(),
            updated_at: Utc::now(),
        }
    }

    fn registry() -> InMemoryDeviceRegistry {
        InMemoryDeviceRegistry::from_roster(&[
            RosterEntry::new("poc1qa123456", &["123"]),
            RosterEntry::new("poc1qa654321", &["123", "999"]),
        ])
    }

    #[tokio::test]
    async fn test_get_provisioned_record() {
        let registry = registry();
        let record = registry.get("poc1qa654321").await.unwrap();
        assert_eq!(record.courses, vec!["123".to_string(), "999".to_string()]);
        assert!(record.token.is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let err = registry().get("ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_courses() {
        let registry = registry();
        let updated = registry
            .update("poc1qa123456", registration("tok-1", "1.0.0"))
            .await
            .unwrap();
        assert_eq!(updated.token, "tok-1");
        assert_eq!(updated.partner, "poc1");
        assert_eq!(updated.environment, "qa");
        assert_eq!(updated.version, "1.0.0");
        assert_eq!(updated.courses, vec!["123".to_string()]);
        assert!(updated.updated_at.is_some());

        assert_eq!(registry.get("poc1qa123456").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_never_inserts() {
        let registry = registry();
        let err = registry
            .update("intruder", registration("tok", "1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert_eq!(registry.list().await.unwrap().len(), 2);
        assert!(registry.get("intruder").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_to_different_ids_do_not_interfere() {
        let registry = registry();
        let mut handles = Vec::new();
        for i in 0..50 {
            let a = registry.clone();
            let b = registry.clone();
            handles.push(tokio::spawn(async move {
                a.update("poc1qa123456", registration(&format!("a-{i}"), "1.0.0"))
                    .await
                    .unwrap();
            }));
            handles.push(tokio::spawn(async move {
                b.update("poc1qa654321", registration(&format!("b-{i}"), "2.0.0"))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let a = registry.get("poc1qa123456").await.unwrap();
        let b = registry.get("poc1qa654321").await.unwrap();
        assert!(a.token.starts_with("a-"));
        assert_eq!(a.version, "1.0.0");
        assert!(b.token.starts_with("b-"));
        assert_eq!(b.version, "2.0.0");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_to_same_id_leave_a_whole_write() {
        let registry = registry();
        let mut handles = Vec::new();
        for i in 0..50 {
            let r = registry.clone();
            handles.push(tokio::spawn(async move {
                r.update(
                    "poc1qa123456",
                    registration(&format!("tok-{i}"), &format!("v{i}")),
                )
                .await
                .unwrap()
            }));
        }
        let mut committed = Vec::new();
        for handle in handles {
            committed.push(handle.await.unwrap());
        }

        // The final state is exactly one of the committed writes, token and
        // version never mixed from different writers.
        let last = registry.get("poc1qa123456").await.unwrap();
        let suffix = last.token.trim_start_matches("tok-");
        assert_eq!(last.version, format!("v{suffix}"));
        assert!(committed.iter().any(|c| c == &last));
    }
}
