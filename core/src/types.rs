//! Shared primitive types used across the portal.

use chrono::{DateTime, Utc};

/// Externally visible complaint identifier, `GRV-YYYYMMDD-NNNN`.
pub type TrackingId = String;

/// Every timestamp in the portal is UTC.
pub type Timestamp = DateTime<Utc>;
