//! In-process stores backing the portal.
//!
//! Handlers only see the `CredentialStore` and `JobLedger` traits through
//! `AppState`, so tests can build fresh instances or swap in failing doubles.

pub mod batch_job_service;
pub mod user_service;

pub use batch_job_service::{InMemoryJobLedger, JobLedger, LedgerError};
pub use user_service::{InMemoryCredentialStore, CredentialStore, StoreError};
