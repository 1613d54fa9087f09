//! Dashboard statistics.

use serde::Serialize;

/// Row counts across the surveillance tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SystemStats {
    pub total_persons: i64,
    pub active_cameras: i64,
    pub alerts: i64,
    pub unacknowledged_alerts: i64,
    pub detections: i64,
}
