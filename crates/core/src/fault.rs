//! Fault history: read-only reliability records per tenant.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::retrieval::TenantId;

/// A recorded failure / defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    #[serde(default)]
    pub id: i64,
    pub company_id: TenantId,
    pub aircraft: Option<String>,
    pub ata: Option<String>,
    pub fault_code: Option<String>,
    pub description: Option<String>,
    pub corrective_action: Option<String>,
    pub failure_type: Option<String>,
    /// ISO-8601 date; ordering is lexicographic.
    pub occurrence_date: Option<String>,
    pub reliability_rate: Option<f64>,
}

/// Optional exact-match filters. Blank values are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultFilter {
    pub aircraft: Option<String>,
    pub ata: Option<String>,
    pub fault_code: Option<String>,
}

/// Count of failures for one grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendBucket {
    pub key: Option<String>,
    pub count: i64,
}

/// Failure counts grouped by ATA chapter and by aircraft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultTrends {
    pub by_ata: Vec<TrendBucket>,
    pub by_aircraft: Vec<TrendBucket>,
}

/// Maximum number of records returned by a search.
pub const MAX_FAULT_RESULTS: usize = 200;

#[async_trait]
pub trait FaultStore: Send + Sync {
    /// Most recent records first, at most [`MAX_FAULT_RESULTS`].
    async fn search(
        &self,
        tenant_id: TenantId,
        filter: &FaultFilter,
    ) -> Result<Vec<FaultRecord>, StoreError>;

    async fn trends(&self, tenant_id: TenantId) -> Result<FaultTrends, StoreError>;
}
