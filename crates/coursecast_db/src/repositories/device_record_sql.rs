//! SQL implementation of the device registry
//!
//! Courses are stored as a JSON array and timestamps as RFC 3339 text, which
//! keeps the schema portable across the drivers reachable through `sqlx::Any`.

use crate::error::DbError;
use crate::repositories::device_record::{DeviceRecord, DeviceRegistry, DeviceUpdate};
use crate::DbClient;
use chrono::{DateTime, Utc};
use coursecast_config::RosterEntry;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

// `Any` cannot decode a NULL text column, so unregistered rows read back as ''.
const SELECT_COLUMNS: &str =
    "id, token, partner, environment, version, courses, COALESCE(updated_at, '') AS updated_at";

/// SQL implementation of the device registry
#[derive(Debug, Clone)]
pub struct SqlDeviceRegistry {
    db_client: DbClient,
}

impl SqlDeviceRegistry {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Create the `device_records` table if it doesn't exist
    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device record schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS device_records (
                id TEXT PRIMARY KEY,
                token TEXT NOT NULL DEFAULT '',
                partner TEXT NOT NULL DEFAULT '',
                environment TEXT NOT NULL DEFAULT '',
                version TEXT NOT NULL DEFAULT '',
                courses TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Device record schema initialized successfully");
        Ok(())
    }

    /// Provision the roster. Existing rows are left untouched so registrations
    /// survive restarts.
    pub async fn seed_roster(&self, roster: &[RosterEntry]) -> Result<u64, DbError> {
        let mut inserted = 0;
        for entry in roster {
            let courses = serde_json::to_string(&entry.courses).map_err(|e| {
                DbError::CorruptRecord {
                    id: entry.id.clone(),
                    message: e.to_string(),
                }
            })?;

            let result = sqlx::query(
                r#"
                INSERT INTO device_records (id, courses)
                VALUES ($1, $2)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&entry.id)
            .bind(courses)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to provision student {}: {}", entry.id, e);
                DbError::QueryError(e.to_string())
            })?;
            inserted += result.rows_affected();
        }

        info!("Provisioned {} new device records", inserted);
        Ok(inserted)
    }
}

fn row_to_record(row: &AnyRow) -> Result<DeviceRecord, DbError> {
    let id: String = row.try_get("id")?;
    let courses: String = row.try_get("courses")?;
    let courses: Vec<String> =
        serde_json::from_str(&courses).map_err(|e| DbError::CorruptRecord {
            id: id.clone(),
            message: format!("courses: {e}"),
        })?;
    let updated_at: String = row.try_get("updated_at")?;
    let updated_at = Some(updated_at)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::CorruptRecord {
                    id: id.clone(),
                    message: format!("updated_at: {e}"),
                })
        })
        .transpose()?;

    Ok(DeviceRecord {
        token: row.try_get("token")?,
        partner: row.try_get("partner")?,
        environment: row.try_get("environment")?,
        version: row.try_get("version")?,
        courses,
        updated_at,
        id,
    })
}

impl DeviceRegistry for SqlDeviceRegistry {
    async fn get(&self, id: &str) -> Result<DeviceRecord, DbError> {
        debug!("Finding device record for student: {}", id);

        let query = format!("SELECT {SELECT_COLUMNS} FROM device_records WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find device record: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(DbError::NotFound(id.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<DeviceRecord>, DbError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM device_records");
        // A single SELECT reads one snapshot of the table.
        let rows = sqlx::query(&query)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list device records: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(row_to_record).collect()
    }

    async fn update(&self, id: &str, update: DeviceUpdate) -> Result<DeviceRecord, DbError> {
        debug!("Updating device record for student: {}", id);

        let query = format!(
            r#"
            UPDATE device_records
            SET token = $1, partner = $2, environment = $3, version = $4, updated_at = $5
            WHERE id = $6
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(update.token)
            .bind(update.partner)
            .bind(update.environment)
            .bind(update.version)
            .bind(update.updated_at.to_rfc3339())
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update device record: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        match row {
            Some(row) => {
                info!("Device record updated for student: {}", id);
                row_to_record(&row)
            }
            None => Err(DbError::NotFound(id.to_string())),
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    async fn registry() -> SqlDeviceRegistry {
        let client = DbClient::from_url("sqlite::memory:").await.unwrap();
        let registry = SqlDeviceRegistry::new(client);
        registry.init_schema().await.unwrap();
        registry
            .seed_roster(&[
                RosterEntry::new("poc1qa123456", &["123"]),
                RosterEntry::new("poc2qa123456", &["321"]),
            ])
            .await
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_seed_is_idempotent_and_preserves_registrations() {
        let registry = registry().await;
        registry
            .update(
                "poc1qa123456",
                DeviceUpdate {
                    token: "tok".to_string(),
                    partner: "poc1".to_string(),
                    environment: "qa".to_string(),
                    version: "1.0.0".to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let inserted = registry
            .seed_roster(&[RosterEntry::new("poc1qa123456", &["123"])])
            .await
            .unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(registry.get("poc1qa123456").await.unwrap().token, "tok");
    }

    #[tokio::test]
    async fn test_update_round_trips_all_fields() {
        let registry = registry().await;
        let now = Utc::now();
        let updated = registry
            .update(
                "poc2qa123456",
                DeviceUpdate {
                    token: "tok-2".to_string(),
                    partner: "poc2".to_string(),
                    environment: "qa".to_string(),
                    version: "2.1.0".to_string(),
                    updated_at: now,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, "poc2qa123456");
        assert_eq!(updated.courses, vec!["321".to_string()]);
        assert_eq!(updated.version, "2.1.0");
        assert_eq!(
            updated.updated_at.map(|t| t.timestamp_micros()),
            Some(now.timestamp_micros())
        );
        assert_eq!(registry.get("poc2qa123456").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_and_not_inserted() {
        let registry = registry().await;
        let err = registry
            .update(
                "ghost",
                DeviceUpdate {
                    token: "t".to_string(),
                    partner: "poc1".to_string(),
                    environment: "qa".to_string(),
                    version: "1".to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert_eq!(registry.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_rows_read_back_without_timestamp() {
        let registry = registry().await;
        registry
            .update(
                "poc1qa123456",
                DeviceUpdate {
                    token: "tok".to_string(),
                    partner: "poc1".to_string(),
                    environment: "qa".to_string(),
                    version: "1.0.0".to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let pending = registry.get("poc2qa123456").await.unwrap();
        assert_eq!(pending.token, "");
        assert_eq!(pending.courses, vec!["321".to_string()]);
        assert!(pending.updated_at.is_none());

        let mut records = registry.list().await.unwrap();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(records.len(), 2);
        assert!(records[0].updated_at.is_some());
        assert_eq!(records[1], pending);
    }
}
