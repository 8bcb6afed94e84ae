//! Device memory monitoring: point-in-time snapshots and the pressure
//! threshold that triggers reactive reclamation.
//!
//! Snapshots come from the model runtime
//! ([`device_memory`](crate::model::ModelRuntime::device_memory)); this
//! module only interprets them. A missing snapshot means no accelerator is
//! present, and every consumer treats that as "nothing to monitor" rather
//! than an error.

use serde::{Deserialize, Serialize};

/// Usage percentage above which the session reclaims before generating.
pub const DEFAULT_PRESSURE_THRESHOLD: f64 = 85.0;

/// Point-in-time device memory stats, in gigabytes.
///
/// `free_gb` and `usage_percent` are derived from the reserved and total
/// figures at construction, so a snapshot is internally consistent no matter
/// where it came from. Usage is computed against *reserved* memory: on
/// caching allocators the reserved pool is what actually starves the next
/// allocation, not the currently allocated bytes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MemorySnapshot {
    pub allocated_gb: f64,
    pub reserved_gb: f64,
    pub total_gb: f64,
    pub free_gb: f64,
    pub usage_percent: f64,
}

impl MemorySnapshot {
    /// Build a snapshot from raw figures, deriving `free_gb` and
    /// `usage_percent`. A zero total (no device, or a probe that failed)
    /// yields zero usage rather than dividing by zero.
    pub fn new(allocated_gb: f64, reserved_gb: f64, total_gb: f64) -> Self {
        let usage_percent = if total_gb > 0.0 {
            reserved_gb / total_gb * 100.0
        } else {
            0.0
        };
        Self {
            allocated_gb,
            reserved_gb,
            total_gb,
            free_gb: total_gb - reserved_gb,
            usage_percent,
        }
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "device memory: allocated {:.2} GB, reserved {:.2} GB, total {:.2} GB, free {:.2} GB ({:.1}% used)",
            self.allocated_gb, self.reserved_gb, self.total_gb, self.free_gb, self.usage_percent,
        )
    }
}

/// Whether a snapshot is past the reclaim-before-generating threshold.
///
/// Strictly greater than: sitting exactly at the threshold does not trigger.
pub fn pressure_exceeded(snapshot: &MemorySnapshot, threshold_percent: f64) -> bool {
    snapshot.usage_percent > threshold_percent
}

/// Human-readable status block for display surfaces.
///
/// `None` reports the accelerator as unavailable instead of erroring.
pub fn status_report(snapshot: Option<&MemorySnapshot>) -> String {
    match snapshot {
        Some(snap) => format!(
            "Device memory status\n\
             - allocated: {:.2} GB\n\
             - reserved: {:.2} GB\n\
             - total: {:.2} GB\n\
             - free: {:.2} GB\n\
             - usage: {:.1}%",
            snap.allocated_gb, snap.reserved_gb, snap.total_gb, snap.free_gb, snap.usage_percent,
        ),
        None => "Device memory status\n- no accelerator available".to_string(),
    }
}
