//! Lifecycle audit events.
//!
//! RULE: An event commits in the same transaction as the collection
//! write it describes. The log is append-only, like remarks.

use crate::{
    complaint::{ComplaintStatus, Priority},
    types::{Timestamp, TrackingId},
};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    ComplaintFiled {
        at: Timestamp,
        tracking_id: TrackingId,
        department: String,
        priority: Priority,
    },
    ComplaintForwarded {
        at: Timestamp,
        tracking_id: TrackingId,
        department: String,
        from: ComplaintStatus,
    },
    StatusChanged {
        at: Timestamp,
        tracking_id: TrackingId,
        from: ComplaintStatus,
        to: ComplaintStatus,
        remark_added: bool,
    },
    DemoDataSeeded {
        at: Timestamp,
        tracking_id: TrackingId,
    },
}

impl LifecycleEvent {
    pub fn tracking_id(&self) -> &str {
        match self {
            Self::ComplaintFiled { tracking_id, .. }
            | Self::ComplaintForwarded { tracking_id, .. }
            | Self::StatusChanged { tracking_id, .. }
            | Self::DemoDataSeeded { tracking_id, .. } => tracking_id,
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Self::ComplaintFiled { at, .. }
            | Self::ComplaintForwarded { at, .. }
            | Self::StatusChanged { at, .. }
            | Self::DemoDataSeeded { at, .. } => *at,
        }
    }

    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ComplaintFiled { .. }     => "complaint_filed",
            Self::ComplaintForwarded { .. } => "complaint_forwarded",
            Self::StatusChanged { .. }      => "status_changed",
            Self::DemoDataSeeded { .. }     => "demo_data_seeded",
        }
    }
}

/// One persisted row of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub tracking_id: TrackingId,
    pub event_type: String,
    pub payload: String,
}
