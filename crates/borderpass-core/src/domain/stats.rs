use chrono::NaiveDate;
use serde::Serialize;

use super::process::{OverallStatus, Process, ProcessKind};

/// Aggregate counts for the administrator dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStats {
    pub total: usize,
    pub minor_travel: usize,
    pub vehicle_admission: usize,
    pub declaration: usize,
    pub in_agriculture_review: usize,
    pub in_identity_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub submitted_today: usize,
    pub vehicles_today: usize,
}

impl ProcessStats {
    /// Count `processes`, treating `today` as the current UTC date.
    pub fn from_processes<'a>(
        processes: impl IntoIterator<Item = &'a Process>,
        today: NaiveDate,
    ) -> Self {
        let mut stats = Self::default();
        for process in processes {
            stats.total += 1;
            match process.kind {
                ProcessKind::MinorTravel => stats.minor_travel += 1,
                ProcessKind::VehicleAdmission => stats.vehicle_admission += 1,
                ProcessKind::Declaration => stats.declaration += 1,
            }
            match process.overall_status {
                OverallStatus::Submitted | OverallStatus::AgricultureReview => {
                    stats.in_agriculture_review += 1
                }
                OverallStatus::IdentityReview => stats.in_identity_review += 1,
                OverallStatus::Approved => stats.approved += 1,
                OverallStatus::Rejected => stats.rejected += 1,
            }
            if process.created_at.date_naive() == today {
                stats.submitted_today += 1;
                if process.kind == ProcessKind::VehicleAdmission {
                    stats.vehicles_today += 1;
                }
            }
        }
        stats
    }
}
