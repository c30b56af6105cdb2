use serde::{Deserialize, Serialize};

use crate::db::models::BatchJob;

pub const BATCH_STARTED_MESSAGE: &str = "Batch started successfully!";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBatchResponse {
    pub status: String, // always "success"
    pub message: String,
    pub batch_job: BatchJob,
}

impl StartBatchResponse {
    pub fn started(batch_job: BatchJob) -> Self {
        StartBatchResponse {
            status: "success".to_string(),
            message: BATCH_STARTED_MESSAGE.to_string(),
            batch_job,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJobListResponse {
    pub batch_jobs: Vec<BatchJob>,
}
