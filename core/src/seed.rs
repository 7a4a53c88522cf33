//! First-run demonstration records.
//!
//! Timestamps are relative to `now` so the dashboard always shows one
//! complaint that is already overdue (forwarded 12 days ago).

use crate::{
    complaint::{Complaint, ComplaintStatus, Priority},
    types::Timestamp,
};
use chrono::Duration;

struct Demo {
    id: &'static str,
    user_id: &'static str,
    full_name: &'static str,
    email: &'static str,
    phone: &'static str,
    department: &'static str,
    category: &'static str,
    title: &'static str,
    description: &'static str,
    priority: Priority,
    status: ComplaintStatus,
}

impl Demo {
    fn at(self, created_at: Timestamp, updated_at: Timestamp) -> Complaint {
        Complaint {
            id: self.id.to_string(),
            user_id: self.user_id.to_string(),
            full_name: self.full_name.to_string(),
            email: self.email.to_string(),
            phone: self.phone.to_string(),
            address: None,
            department: self.department.to_string(),
            category: self.category.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            priority: self.priority,
            status: self.status,
            voice_note: None,
            image_proof: None,
            document_proof: None,
            created_at,
            updated_at,
            forwarded_at: None,
            remarks: Vec::new(),
        }
    }
}

pub fn demo_complaints(now: Timestamp) -> Vec<Complaint> {
    let days = Duration::days;

    let live_wire = Demo {
        id: "GRV-20231025-1234",
        user_id: "user1",
        full_name: "Ramesh Gupta",
        email: "ramesh@example.com",
        phone: "9876543210",
        department: "Electricity",
        category: "Safety Hazard",
        title: "Live wire hanging near school",
        description: "There is a live electricity wire hanging very low near the primary school \
                      entrance. Immediate action required.",
        priority: Priority::High,
        status: ComplaintStatus::Submitted,
    }
    .at(now - days(2), now - days(2));

    let garbage = Demo {
        id: "GRV-20231026-5678",
        user_id: "user2",
        full_name: "Sita Verma",
        email: "sita@example.com",
        phone: "9876543211",
        department: "Municipal/Corporation",
        category: "Sanitation",
        title: "Garbage not collected for 5 days",
        description: "The garbage truck has not visited Sector 4 for the past 5 days. \
                      Piles of trash are accumulating.",
        priority: Priority::Low,
        status: ComplaintStatus::InProgress,
    }
    .at(now - days(1), now - Duration::hours(12));

    let hospital = Demo {
        id: "GRV-20231027-9101",
        user_id: "user3",
        full_name: "Amit Kumar",
        email: "amit@example.com",
        phone: "9876543212",
        department: "Health",
        category: "Service Issue",
        title: "Unavailability of doctors at City Hospital",
        description: "Visited the ward last night, no senior doctor was available for 3 hours.",
        priority: Priority::Low,
        status: ComplaintStatus::UnderReview,
    }
    .at(now, now);

    let mut pothole = Demo {
        id: "GRV-20231015-9999",
        user_id: "user4",
        full_name: "Vikram Singh",
        email: "vikram@example.com",
        phone: "9876543213",
        department: "Transport",
        category: "Infrastructure",
        title: "Large Pothole on Main Road",
        description: "A very deep pothole causing accidents near the market area. \
                      Forwarded to department long ago but no action.",
        priority: Priority::High,
        status: ComplaintStatus::Forwarded,
    }
    .at(now - days(15), now - days(12));
    pothole.forwarded_at = Some(now - days(12));
    pothole.remarks.push("Forwarded to Transport department.".to_string());

    vec![live_wire, garbage, hospital, pothole]
}
