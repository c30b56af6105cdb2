use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a recorded batch job.
///
/// Jobs are only ever recorded, never executed, so `Pending` is the sole state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchJobStatus {
    Pending,
}

impl BatchJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchJobStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for BatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_serializes_lowercase() {
        let json = serde_json::to_string(&BatchJobStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        assert_eq!(BatchJobStatus::Pending.to_string(), "pending");
    }
}
