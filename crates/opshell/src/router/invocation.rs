//! Invocation records capturing dispatch timing and outcome.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Terminal state of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationStatus {
    /// The handler ran and reported success.
    Completed,
    /// The handler failed, errored, or panicked.
    Failed,
    /// A middleware produced the terminal result before the handler ran.
    ShortCircuited,
}

/// Record of a single dispatch through the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub id: Uuid,
    /// Registry key of the dispatched command.
    pub command: String,
    pub started_at: SystemTime,
    pub ended_at: SystemTime,
    pub duration_ms: u64,
    pub status: InvocationStatus,
    pub error_code: Option<String>,
}

impl InvocationRecord {
    pub fn new(
        id: Uuid,
        command: String,
        started_at: SystemTime,
        ended_at: SystemTime,
        status: InvocationStatus,
    ) -> Self {
        let duration_ms = ended_at
            .duration_since(started_at)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            id,
            command,
            started_at,
            ended_at,
            duration_ms,
            status,
            error_code: None,
        }
    }
}
