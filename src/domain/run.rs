//! Invoice run record (§3, §4.10).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lease::ProrationMethod;
use crate::ids::{InvoiceRunId, OrgId};

/// Invoice run status (§4.10, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Completed => "Completed",
            RunStatus::CompletedWithErrors => "CompletedWithErrors",
            RunStatus::Failed => "Failed",
        }
    }

    /// Final status given the §4.10 step-4 accounting rule.
    pub fn from_counts(total_leases: u32, failure_count: u32) -> RunStatus {
        if total_leases == 0 || failure_count == 0 {
            RunStatus::Completed
        } else if failure_count < total_leases {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Failed
        }
    }
}

/// Record of a bulk invoice-generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRun {
    pub id: InvoiceRunId,
    pub org_id: OrgId,
    pub run_at: DateTime<Utc>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub proration_method: ProrationMethod,
    pub total_leases: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub status: RunStatus,
    pub error_messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_leases_completes() {
        assert_eq!(RunStatus::from_counts(0, 0), RunStatus::Completed);
    }

    #[test]
    fn no_failures_completes() {
        assert_eq!(RunStatus::from_counts(5, 0), RunStatus::Completed);
    }

    #[test]
    fn partial_failures_completes_with_errors() {
        assert_eq!(RunStatus::from_counts(5, 2), RunStatus::CompletedWithErrors);
    }

    #[test]
    fn total_failure_fails() {
        assert_eq!(RunStatus::from_counts(5, 5), RunStatus::Failed);
    }
}
