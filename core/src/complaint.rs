//! The complaint record and the fields a citizen submits.
//!
//! Field names serialize in camelCase so the stored blob keeps the
//! shape the portal front end reads (`fullName`, `forwardedAt`, ...).

use crate::{
    config::PortalConfig,
    error::{GrievanceError, GrievanceResult},
    types::{Timestamp, TrackingId},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Department value that switches to the free-text override.
pub const OTHER_DEPARTMENT: &str = "Other";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ComplaintStatus {
    #[serde(rename = "Submitted")]
    Submitted,
    #[serde(rename = "Forwarded")]
    Forwarded,
    /// Legacy value. Reachable in stored data, no operation moves into it.
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Resolved")]
    Resolved,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 6] = [
        Self::Submitted,
        Self::Forwarded,
        Self::UnderReview,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted   => "Submitted",
            Self::Forwarded   => "Forwarded",
            Self::UnderReview => "Under Review",
            Self::InProgress  => "In Progress",
            Self::Resolved    => "Resolved",
            Self::Rejected    => "Rejected",
        }
    }

    /// RESOLVED and REJECTED have no outgoing transition in the state diagram.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = GrievanceError;

    /// Accepts the display form ("In Progress") and the snake form ("in_progress").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().to_ascii_lowercase() == key)
            .ok_or_else(|| GrievanceError::UnknownChoice {
                field: "status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Low  => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = GrievanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "low"  => Ok(Self::Low),
            _ => Err(GrievanceError::UnknownChoice {
                field: "priority",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: TrackingId,
    #[serde(default = "guest_user")]
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub department: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: ComplaintStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_proof: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_proof: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_at: Option<Timestamp>,
    /// Append-only. Insertion order is chronological order.
    #[serde(default)]
    pub remarks: Vec<String>,
}

fn guest_user() -> String {
    "guest".to_string()
}

impl Complaint {
    /// Text shown on the public tracking page.
    pub fn status_label(&self) -> String {
        match self.status {
            ComplaintStatus::Forwarded => format!("Forwarded to {} Dept.", self.department),
            other => other.to_string(),
        }
    }

    /// Forwarding is offered only before the complaint has been routed or closed.
    pub fn can_forward(&self) -> bool {
        !matches!(
            self.status,
            ComplaintStatus::Forwarded | ComplaintStatus::Resolved | ComplaintStatus::Rejected
        )
    }
}

/// Everything a citizen supplies on the lodge form.
/// Priority is decided separately by the classifier before `create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    #[serde(default)]
    pub user_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    pub department: String,
    /// Used only when `department` is "Other".
    #[serde(default)]
    pub other_department: Option<String>,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub voice_note: Option<String>,
    #[serde(default)]
    pub image_proof: Option<String>,
    #[serde(default)]
    pub document_proof: Option<String>,
}

impl NewComplaint {
    /// Check required fields and resolve the final department name.
    pub fn validate(&self, config: &PortalConfig) -> GrievanceResult<String> {
        require("full_name", &self.full_name)?;
        require("email", &self.email)?;
        require("phone", &self.phone)?;
        let department = self.resolve_department(config)?;
        require("category", &self.category)?;
        if !config.categories.iter().any(|c| c == self.category.trim()) {
            return Err(GrievanceError::UnknownChoice {
                field: "category",
                value: self.category.clone(),
            });
        }
        require("title", &self.title)?;
        require("description", &self.description)?;
        Ok(department)
    }

    fn resolve_department(&self, config: &PortalConfig) -> GrievanceResult<String> {
        let chosen = self.department.trim();
        require("department", chosen)?;
        if chosen == OTHER_DEPARTMENT {
            let custom = self.other_department.as_deref().unwrap_or_default().trim();
            require("other_department", custom)?;
            return Ok(custom.to_string());
        }
        if !config.departments.iter().any(|d| d == chosen) {
            return Err(GrievanceError::UnknownChoice {
                field: "department",
                value: chosen.to_string(),
            });
        }
        Ok(chosen.to_string())
    }
}

fn require(field: &'static str, value: &str) -> GrievanceResult<()> {
    if value.trim().is_empty() {
        return Err(GrievanceError::MissingField { field });
    }
    Ok(())
}

/// Blank optional strings are stored as absent.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
