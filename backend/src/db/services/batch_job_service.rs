use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::db::models::{BatchJob, BatchJobRequest};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Batch job id space exhausted")]
    IdSpaceExhausted,
}

/// Append-only record of submitted batch jobs.
#[async_trait]
pub trait JobLedger: Send + Sync {
    async fn create_job(&self, request: BatchJobRequest) -> Result<BatchJob, LedgerError>;
    async fn list_jobs(&self) -> Vec<BatchJob>;
    async fn len(&self) -> usize;
}

#[derive(Debug)]
struct LedgerState {
    jobs: Vec<BatchJob>,
    next_id: i32,
}

/// Jobs kept in insertion order. Id assignment and append share one lock.
#[derive(Debug)]
pub struct InMemoryJobLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryJobLedger {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    fn starting_at(next_id: i32) -> Self {
        InMemoryJobLedger {
            state: Mutex::new(LedgerState {
                jobs: Vec::new(),
                next_id,
            }),
        }
    }
}

impl Default for InMemoryJobLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobLedger for InMemoryJobLedger {
    async fn create_job(&self, request: BatchJobRequest) -> Result<BatchJob, LedgerError> {
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id = id.checked_add(1).ok_or(LedgerError::IdSpaceExhausted)?;

        let job = BatchJob::from_request(id, request, Utc::now());
        state.jobs.push(job.clone());
        info!(
            batch_job_id = job.id,
            import_setup_id = job.import_setup_id,
            "Recorded pending batch job."
        );
        Ok(job)
    }

    async fn list_jobs(&self) -> Vec<BatchJob> {
        self.state.lock().await.jobs.clone()
    }

    async fn len(&self) -> usize {
        self.state.lock().await.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::BatchJobStatus;
    use std::sync::Arc;

    fn request(import_setup_id: i64) -> BatchJobRequest {
        BatchJobRequest {
            old_patients_target: 10.0,
            import_setup_id,
            hourly_batch_count: 60.0,
        }
    }

    #[tokio::test]
    async fn test_create_job_is_pending_with_sequential_ids() {
        let ledger = InMemoryJobLedger::new();
        let first = ledger.create_job(request(5)).await.unwrap();
        let second = ledger.create_job(request(6)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, BatchJobStatus::Pending);
        assert_eq!(first.import_setup_id, 5);
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn test_list_jobs_in_insertion_order() {
        let ledger = InMemoryJobLedger::new();
        for id in [3, 1, 2] {
            ledger.create_job(request(id)).await.unwrap();
        }
        let setup_ids: Vec<i64> = ledger
            .list_jobs()
            .await
            .iter()
            .map(|j| j.import_setup_id)
            .collect();
        assert_eq!(setup_ids, vec![3, 1, 2]);
        assert_eq!(ledger.len().await, 3);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_get_unique_ids() {
        let ledger = Arc::new(InMemoryJobLedger::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.create_job(request(i + 1)).await.unwrap().id
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=50).collect::<Vec<i32>>());

        let listed: Vec<i32> = ledger.list_jobs().await.iter().map(|j| j.id).collect();
        assert!(listed.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_exhausted_id_space_stores_nothing() {
        let ledger = InMemoryJobLedger::starting_at(i32::MAX);
        let err = ledger.create_job(request(1)).await.unwrap_err();
        assert_eq!(err, LedgerError::IdSpaceExhausted);
        assert_eq!(ledger.len().await, 0);
    }
}
