use crate::complaint::ComplaintStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrievanceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Required field '{field}' is empty")]
    MissingField { field: &'static str },

    #[error("'{value}' is not a valid {field}")]
    UnknownChoice { field: &'static str, value: String },

    #[error("Complaint {id} cannot move from {from} to {to}")]
    IllegalTransition {
        id: String,
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    #[error("No unused tracking id after {attempts} attempts")]
    TrackingIdExhausted { attempts: u32 },

    #[error("Complaint collection changed underneath {attempts} write attempts")]
    ConcurrentModification { attempts: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GrievanceResult<T> = Result<T, GrievanceError>;
