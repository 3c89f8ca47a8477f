//! Structured fault history backed by SQLite.
//!
//! A single `failures` table holds reliability records for every tenant.
//! Reads are always scoped to one tenant.

use crate::sqlite_vector::open_pool;
use aerobrain_core::error::StoreError;
use aerobrain_core::fault::{
    FaultFilter, FaultRecord, FaultStore, FaultTrends, MAX_FAULT_RESULTS, TrendBucket,
};
use aerobrain_core::retrieval::TenantId;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

pub struct SqliteFaultStore {
    pool: SqlitePool,
}

impl SqliteFaultStore {
    /// Open (or create) the fault database at `path`.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let pool = open_pool(path).await?;
        let store = Self { pool };
        store.init().await?;
        info!("Fault history store initialized at {path}");
        Ok(store)
    }

    /// Create the `failures` table if it does not exist.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS failures (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id        INTEGER,
                aircraft          TEXT,
                ata               TEXT,
                fault_code        TEXT,
                description       TEXT,
                corrective_action TEXT,
                failure_type      TEXT,
                occurrence_date   TEXT,
                reliability_rate  REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("failures table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_failures_company_date ON failures(company_id, occurrence_date DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("failures index: {e}")))?;
        Ok(())
    }

    /// Insert a record; the stored id is returned. `record.id` is ignored.
    pub async fn insert(&self, record: &FaultRecord) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO failures (company_id, aircraft, ata, fault_code, description,
                                  corrective_action, failure_type, occurrence_date,
                                  reliability_rate)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(record.company_id.0)
        .bind(&record.aircraft)
        .bind(&record.ata)
        .bind(&record.fault_code)
        .bind(&record.description)
        .bind(&record.corrective_action)
        .bind(&record.failure_type)
        .bind(&record.occurrence_date)
        .bind(record.reliability_rate)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<FaultRecord, StoreError> {
        fn col<'r, T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>>(
            row: &'r sqlx::sqlite::SqliteRow,
            name: &str,
        ) -> Result<T, StoreError> {
            row.try_get(name)
                .map_err(|e| StoreError::QueryFailed(format!("{name} column: {e}")))
        }

        Ok(FaultRecord {
            id: col(row, "id")?,
            company_id: TenantId(col::<Option<i64>>(row, "company_id")?.unwrap_or_default()),
            aircraft: col(row, "aircraft")?,
            ata: col(row, "ata")?,
            fault_code: col(row, "fault_code")?,
            description: col(row, "description")?,
            corrective_action: col(row, "corrective_action")?,
            failure_type: col(row, "failure_type")?,
            occurrence_date: col(row, "occurrence_date")?,
            reliability_rate: col(row, "reliability_rate")?,
        })
    }

    async fn group_counts(
        &self,
        tenant_id: TenantId,
        column: &str,
    ) -> Result<Vec<TrendBucket>, StoreError> {
        // `column` is one of two fixed names, never user input.
        let sql = format!(
            "SELECT {column} AS key, COUNT(*) AS count FROM failures \
             WHERE company_id = ?1 GROUP BY {column} ORDER BY count DESC, key"
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("{column} trends: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(TrendBucket {
                    key: row
                        .try_get("key")
                        .map_err(|e| StoreError::QueryFailed(format!("key column: {e}")))?,
                    count: row
                        .try_get("count")
                        .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?,
                })
            })
            .collect()
    }
}

/// Blank filter values are treated as absent.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
impl FaultStore for SqliteFaultStore {
    async fn search(
        &self,
        tenant_id: TenantId,
        filter: &FaultFilter,
    ) -> Result<Vec<FaultRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM failures
            WHERE company_id = ?1
              AND (?2 IS NULL OR aircraft = ?2)
              AND (?3 IS NULL OR ata = ?3)
              AND (?4 IS NULL OR fault_code = ?4)
            ORDER BY occurrence_date DESC
            LIMIT ?5
            "#,
        )
        .bind(tenant_id.0)
        .bind(non_blank(&filter.aircraft))
        .bind(non_blank(&filter.ata))
        .bind(non_blank(&filter.fault_code))
        .bind(MAX_FAULT_RESULTS as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Fault search: {e}")))?;

        debug!(tenant = %tenant_id, count = rows.len(), "Fault search complete");
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn trends(&self, tenant_id: TenantId) -> Result<FaultTrends, StoreError> {
        Ok(FaultTrends {
            by_ata: self.group_counts(tenant_id, "ata").await?,
            by_aircraft: self.group_counts(tenant_id, "aircraft").await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteFaultStore {
        SqliteFaultStore::new("sqlite::memory:").await.unwrap()
    }

    fn record(company: i64, aircraft: &str, ata: &str, code: &str, date: &str) -> FaultRecord {
        FaultRecord {
            id: 0,
            company_id: TenantId(company),
            aircraft: Some(aircraft.into()),
            ata: Some(ata.into()),
            fault_code: Some(code.into()),
            description: Some(format!("{code} reported")),
            corrective_action: Some("Replaced LRU".into()),
            failure_type: Some("UNSCHEDULED".into()),
            occurrence_date: Some(date.into()),
            reliability_rate: Some(0.98),
        }
    }

    async fn seeded() -> SqliteFaultStore {
        let store = test_store().await;
        for r in [
            record(1, "A320", "29", "HYD-LO-PR", "2024-03-01"),
            record(1, "A320", "32", "BSCU-FAULT", "2024-05-10"),
            record(1, "B737", "29", "HYD-LO-PR", "2024-04-15"),
            record(2, "A320", "29", "HYD-LO-PR", "2024-06-01"),
        ] {
            store.insert(&r).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn search_is_tenant_scoped_and_newest_first() {
        let store = seeded().await;
        let results = store.search(TenantId(1), &FaultFilter::default()).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.company_id == TenantId(1)));
        assert_eq!(results[0].occurrence_date.as_deref(), Some("2024-05-10"));
        assert_eq!(results[2].occurrence_date.as_deref(), Some("2024-03-01"));
    }

    #[tokio::test]
    async fn search_applies_exact_filters() {
        let store = seeded().await;
        let filter = FaultFilter {
            aircraft: Some("A320".into()),
            ata: Some("29".into()),
            fault_code: None,
        };
        let results = store.search(TenantId(1), &filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fault_code.as_deref(), Some("HYD-LO-PR"));
        assert!(results[0].id > 0);
    }

    #[tokio::test]
    async fn blank_filters_are_ignored() {
        let store = seeded().await;
        let filter = FaultFilter {
            aircraft: Some("  ".into()),
            ata: Some(String::new()),
            fault_code: None,
        };
        assert_eq!(store.search(TenantId(1), &filter).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn search_caps_results() {
        let store = test_store().await;
        for i in 0..(MAX_FAULT_RESULTS + 5) {
            let date = format!("2024-01-01T00:{:02}:{:02}", i / 60, i % 60);
            store.insert(&record(9, "A350", "21", "PACK", &date)).await.unwrap();
        }
        let results = store.search(TenantId(9), &FaultFilter::default()).await.unwrap();
        assert_eq!(results.len(), MAX_FAULT_RESULTS);
    }

    #[tokio::test]
    async fn trends_group_by_ata_and_aircraft() {
        let store = seeded().await;
        let trends = store.trends(TenantId(1)).await.unwrap();

        assert_eq!(
            trends.by_ata[0],
            TrendBucket {
                key: Some("29".into()),
                count: 2
            }
        );
        assert_eq!(trends.by_ata.len(), 2);
        assert_eq!(trends.by_aircraft[0].key.as_deref(), Some("A320"));
        assert_eq!(trends.by_aircraft[0].count, 2);
    }

    #[tokio::test]
    async fn trends_for_unknown_tenant_are_empty() {
        let store = seeded().await;
        assert_eq!(store.trends(TenantId(42)).await.unwrap(), FaultTrends::default());
    }
}
