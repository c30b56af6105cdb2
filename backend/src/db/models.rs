use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::BatchJobStatus;

/// A portal account. Never serialized into responses, see `UserResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
}

/// Validated input for a new batch job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJobRequest {
    pub old_patients_target: f64,
    pub import_setup_id: i64,
    pub hourly_batch_count: f64,
}

/// A recorded batch job descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub id: i32,
    pub old_patients_target: f64,
    pub import_setup_id: i64,
    pub hourly_batch_count: f64,
    pub status: BatchJobStatus,
    pub created_at: DateTime<Utc>,
}

impl BatchJob {
    pub fn from_request(id: i32, request: BatchJobRequest, created_at: DateTime<Utc>) -> Self {
        BatchJob {
            id,
            old_patients_target: request.old_patients_target,
            import_setup_id: request.import_setup_id,
            hourly_batch_count: request.hourly_batch_count,
            status: BatchJobStatus::Pending,
            created_at,
        }
    }
}
