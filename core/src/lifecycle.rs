//! Complaint lifecycle manager.
//!
//! Owns create / read / status update / forward and the overdue rule.
//!
//!   SUBMITTED ──forward──▶ FORWARDED ──▶ IN_PROGRESS ──▶ RESOLVED
//!       │                     │               │
//!       └──────────────┬──────┴───────────────┘
//!                      ▼
//!                   REJECTED
//!
//! UNDER_REVIEW is a stored legacy value with no transition into it.
//!
//! RULES:
//!   - Every mutation is a read-modify-write of the whole collection,
//!     committed with a revision check and retried on conflict.
//!   - The audit event commits in the same transaction as the write.
//!   - Remarks are only ever appended.
//!   - Overdue is recomputed on every read, never stored.

use crate::{
    classifier::PriorityClassifier,
    clock::{Clock, SystemClock},
    complaint::{non_blank, Complaint, ComplaintStatus, NewComplaint, Priority},
    config::{PortalConfig, TransitionPolicy},
    error::{GrievanceError, GrievanceResult},
    event::LifecycleEvent,
    seed,
    store::{ComplaintStore, StoreSnapshot},
    tracking::TrackingIdGenerator,
    types::{Timestamp, TrackingId},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// A forwarded complaint becomes overdue after this many hours (10 days).
pub const OVERDUE_AFTER_HOURS: i64 = 240;

/// Forwarded more than 10 days ago and still open.
pub fn is_overdue(complaint: &Complaint, now: Timestamp) -> bool {
    let Some(forwarded_at) = complaint.forwarded_at else {
        return false;
    };
    now - forwarded_at > Duration::hours(OVERDUE_AFTER_HOURS) && !complaint.status.is_terminal()
}

/// Edges of the lifecycle diagram, used under `TransitionPolicy::Strict`.
pub fn transition_allowed(from: ComplaintStatus, to: ComplaintStatus) -> bool {
    use ComplaintStatus::*;
    matches!(
        (from, to),
        (Submitted, Forwarded)
            | (Submitted, Rejected)
            | (UnderReview, Forwarded)
            | (UnderReview, InProgress)
            | (UnderReview, Rejected)
            | (Forwarded, InProgress)
            | (Forwarded, Rejected)
            | (InProgress, Resolved)
            | (InProgress, Rejected)
    )
}

pub fn forward_remark(department: &str, note: Option<&str>) -> String {
    match note {
        Some(note) => format!("Forwarded to {department} department. Note: {note}"),
        None => format!("Forwarded to {department} department."),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of tracking id, submitter name or department.
    pub search: Option<String>,
}

impl ComplaintFilter {
    pub fn matches(&self, c: &Complaint) -> bool {
        if self.status.is_some_and(|s| s != c.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != c.priority) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                [&c.id, &c.full_name, &c.department]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }
}

/// Triage order: High before Low, then newest first.
pub fn sort_for_triage(complaints: &mut [Complaint]) {
    complaints.sort_by(|a, b| {
        let rank = |p: Priority| if p == Priority::High { 0 } else { 1 };
        rank(a.priority)
            .cmp(&rank(b.priority))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    /// Still SUBMITTED.
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub high_priority: usize,
    pub overdue: usize,
}

pub struct LifecycleManager<S: ComplaintStore> {
    store: S,
    config: PortalConfig,
    clock: Box<dyn Clock>,
    ids: TrackingIdGenerator,
}

impl<S: ComplaintStore> LifecycleManager<S> {
    /// Manager on the wall clock with an entropy-seeded id generator.
    pub fn new(store: S, config: PortalConfig) -> Self {
        Self::with_parts(store, config, Box::new(SystemClock), TrackingIdGenerator::from_entropy())
    }

    pub fn with_parts(
        store: S,
        config: PortalConfig,
        clock: Box<dyn Clock>,
        ids: TrackingIdGenerator,
    ) -> Self {
        Self { store, config, clock, ids }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Commands ───────────────────────────────────────────────────

    /// File a new complaint with the priority already decided by the classifier.
    pub fn create(&mut self, fields: NewComplaint, priority: Priority) -> GrievanceResult<Complaint> {
        let department = fields.validate(&self.config)?;
        let now = self.clock.now();
        let attempts = self.config.tracking_id_attempts.max(1);

        let complaint = self.read_modify_write(|complaints, ids| {
            let id = unused_tracking_id(complaints, ids, now, attempts)?;
            let complaint = Complaint {
                id,
                user_id: non_blank(&fields.user_id).unwrap_or_else(|| "guest".to_string()),
                full_name: fields.full_name.trim().to_string(),
                email: fields.email.trim().to_string(),
                phone: fields.phone.trim().to_string(),
                address: non_blank(&fields.address),
                department: department.clone(),
                category: fields.category.trim().to_string(),
                title: fields.title.trim().to_string(),
                description: fields.description.trim().to_string(),
                priority,
                status: ComplaintStatus::Submitted,
                voice_note: non_blank(&fields.voice_note),
                image_proof: non_blank(&fields.image_proof),
                document_proof: non_blank(&fields.document_proof),
                created_at: now,
                updated_at: now,
                forwarded_at: None,
                remarks: Vec::new(),
            };
            let event = LifecycleEvent::ComplaintFiled {
                at: now,
                tracking_id: complaint.id.clone(),
                department: complaint.department.clone(),
                priority,
            };
            complaints.push(complaint.clone());
            Ok(Some((complaint, event)))
        })?;
        let complaint = complaint
            .ok_or_else(|| GrievanceError::Other(anyhow::anyhow!("create produced no record")))?;

        log::info!(
            "filed {} dept={} priority={}",
            complaint.id,
            complaint.department,
            complaint.priority
        );
        Ok(complaint)
    }

    /// Submission flow: validate, classify, then create.
    /// Invalid input is rejected before the classifier is consulted.
    pub fn submit(
        &mut self,
        fields: NewComplaint,
        classifier: &PriorityClassifier<'_>,
    ) -> GrievanceResult<Complaint> {
        let department = fields.validate(&self.config)?;
        let priority = classifier.classify(&fields.title, &fields.description, &department);
        self.create(fields, priority)
    }

    /// Set any status (subject to the configured policy), optionally appending a remark.
    /// `Ok(None)` when no complaint has this id.
    pub fn update_status(
        &mut self,
        id: &str,
        new_status: ComplaintStatus,
        remark: Option<&str>,
    ) -> GrievanceResult<Option<Complaint>> {
        let now = self.clock.now();
        let policy = self.config.transition_policy;
        let remark = clean_remark(remark);

        let updated = self.read_modify_write(|complaints, _| {
            let Some(c) = complaints.iter_mut().find(|c| c.id == id) else {
                return Ok(None);
            };
            if policy == TransitionPolicy::Strict && !transition_allowed(c.status, new_status) {
                return Err(GrievanceError::IllegalTransition {
                    id: c.id.clone(),
                    from: c.status,
                    to: new_status,
                });
            }
            let event = LifecycleEvent::StatusChanged {
                at: now,
                tracking_id: c.id.clone(),
                from: c.status,
                to: new_status,
                remark_added: remark.is_some(),
            };
            c.status = new_status;
            if new_status == ComplaintStatus::Forwarded && c.forwarded_at.is_none() {
                c.forwarded_at = Some(now);
            }
            if let Some(remark) = &remark {
                c.remarks.push(remark.clone());
            }
            touch(c, now);
            Ok(Some((c.clone(), event)))
        })?;

        match &updated {
            Some(c) => log::info!("{} status -> {new_status}", c.id),
            None => log::debug!("update_status: no complaint {id}"),
        }
        Ok(updated)
    }

    /// Route a complaint to its department.
    /// Rejected with `IllegalTransition` when already FORWARDED, RESOLVED or REJECTED.
    pub fn forward(&mut self, id: &str, remark: Option<&str>) -> GrievanceResult<Option<Complaint>> {
        let now = self.clock.now();
        let policy = self.config.transition_policy;
        let note = clean_remark(remark);

        let updated = self.read_modify_write(|complaints, _| {
            let Some(c) = complaints.iter_mut().find(|c| c.id == id) else {
                return Ok(None);
            };
            let to = ComplaintStatus::Forwarded;
            let strict_refusal =
                policy == TransitionPolicy::Strict && !transition_allowed(c.status, to);
            if !c.can_forward() || strict_refusal {
                log::warn!("refusing to forward {} in status {}", c.id, c.status);
                return Err(GrievanceError::IllegalTransition {
                    id: c.id.clone(),
                    from: c.status,
                    to,
                });
            }
            let event = LifecycleEvent::ComplaintForwarded {
                at: now,
                tracking_id: c.id.clone(),
                department: c.department.clone(),
                from: c.status,
            };
            c.status = to;
            if c.forwarded_at.is_none() {
                c.forwarded_at = Some(now);
            }
            c.remarks.push(forward_remark(&c.department, note.as_deref()));
            touch(c, now);
            Ok(Some((c.clone(), event)))
        })?;

        match &updated {
            Some(c) => log::info!("{} forwarded to {}", c.id, c.department),
            None => log::debug!("forward: no complaint {id}"),
        }
        Ok(updated)
    }

    /// Write the demonstration records if the collection has never been written.
    /// Returns true if records were seeded.
    pub fn seed_if_uninitialized(&mut self) -> GrievanceResult<bool> {
        if !self.config.seed_demo_data || self.store.is_initialized()? {
            return Ok(false);
        }
        let now = self.clock.now();
        let records = seed::demo_complaints(now);
        let events: Vec<LifecycleEvent> = records
            .iter()
            .map(|c| LifecycleEvent::DemoDataSeeded {
                at: now,
                tracking_id: c.id.clone(),
            })
            .collect();
        if !self.store.replace_if_unchanged(0, &records, &events)? {
            // Another writer initialised the collection first.
            return Ok(false);
        }
        log::info!("seeded {} demonstration complaints", records.len());
        Ok(true)
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Exact, case-sensitive lookup. Callers canonicalize user input first.
    pub fn get_by_id(&self, id: &str) -> GrievanceResult<Option<Complaint>> {
        Ok(self.store.load()?.into_iter().find(|c| c.id == id))
    }

    pub fn is_overdue(&self, complaint: &Complaint) -> bool {
        is_overdue(complaint, self.clock.now())
    }

    /// Filtered complaints in triage order.
    pub fn list(&self, filter: &ComplaintFilter) -> GrievanceResult<Vec<Complaint>> {
        let mut complaints: Vec<Complaint> = self
            .store
            .load()?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect();
        sort_for_triage(&mut complaints);
        Ok(complaints)
    }

    pub fn stats(&self) -> GrievanceResult<DashboardStats> {
        let now = self.clock.now();
        let complaints = self.store.load()?;
        let count = |status: ComplaintStatus| complaints.iter().filter(|c| c.status == status).count();
        Ok(DashboardStats {
            total: complaints.len(),
            pending: count(ComplaintStatus::Submitted),
            in_progress: count(ComplaintStatus::InProgress),
            resolved: count(ComplaintStatus::Resolved),
            high_priority: complaints.iter().filter(|c| c.priority == Priority::High).count(),
            overdue: complaints.iter().filter(|c| is_overdue(c, now)).count(),
        })
    }

    /// Overdue complaints, longest-waiting first.
    pub fn escalations(&self) -> GrievanceResult<Vec<Complaint>> {
        let now = self.clock.now();
        let mut overdue: Vec<Complaint> = self
            .store
            .load()?
            .into_iter()
            .filter(|c| is_overdue(c, now))
            .collect();
        overdue.sort_by_key(|c| c.forwarded_at);
        Ok(overdue)
    }

    // ── Write path ─────────────────────────────────────────────────

    /// Load the collection, let `apply` mutate it, commit it together with
    /// the returned audit event if nobody else wrote in between. `apply`
    /// returning `Ok(None)` means "nothing to do" and commits nothing.
    fn read_modify_write<T>(
        &mut self,
        mut apply: impl FnMut(
            &mut Vec<Complaint>,
            &mut TrackingIdGenerator,
        ) -> GrievanceResult<Option<(T, LifecycleEvent)>>,
    ) -> GrievanceResult<Option<T>> {
        let attempts = self.config.write_attempts.max(1);
        for attempt in 1..=attempts {
            let StoreSnapshot { mut complaints, revision } = self.store.snapshot()?;
            let Some((result, event)) = apply(&mut complaints, &mut self.ids)? else {
                return Ok(None);
            };
            if self.store.replace_if_unchanged(revision, &complaints, &[event])? {
                return Ok(Some(result));
            }
            log::warn!("collection changed at revision {revision}, retrying ({attempt}/{attempts})");
        }
        Err(GrievanceError::ConcurrentModification { attempts })
    }
}

fn unused_tracking_id(
    existing: &[Complaint],
    ids: &mut TrackingIdGenerator,
    now: Timestamp,
    attempts: u32,
) -> GrievanceResult<TrackingId> {
    for attempt in 1..=attempts {
        let id = ids.generate(now);
        if !existing.iter().any(|c| c.id == id) {
            return Ok(id);
        }
        log::debug!("tracking id {id} already taken ({attempt}/{attempts})");
    }
    Err(GrievanceError::TrackingIdExhausted { attempts })
}

fn clean_remark(remark: Option<&str>) -> Option<String> {
    remark
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
}

/// `updated_at` never moves behind `created_at`, even under a rewound clock.
fn touch(c: &mut Complaint, now: Timestamp) {
    c.updated_at = now.max(c.created_at);
}
