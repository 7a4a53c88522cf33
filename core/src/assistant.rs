//! Conversational assistant bridge.
//!
//! Scans a chat message for a tracking id, looks it up, and appends a
//! delimited system note with the real record (or an explicit not-found
//! marker) before the message goes to the conversation oracle. The
//! bridge never mutates complaints.

use crate::{
    complaint::Complaint,
    lifecycle::LifecycleManager,
    oracle::{ChatTurn, Oracle},
    store::ComplaintStore,
    tracking::find_tracking_id,
};

pub const APOLOGY_REPLY: &str =
    "I am currently experiencing technical difficulties. Please try again later.";

pub const EMPTY_REPLY: &str = "I'm sorry, I didn't catch that. Could you please rephrase?";

pub const SYSTEM_INSTRUCTION: &str = "You are the helpful AI assistant for the \"Grievance Redressal Portal\".
Your role is to guide citizens on how to lodge complaints, track status, and explain the process.

Key Information:
- To lodge a complaint, go to the \"Lodge Complaint\" page.
- You need a valid email and phone number.
- You can attach a description, a voice note, and document or image proof.
- High priority issues (safety, health) are prioritized automatically.
- Tracking requires the \"Complaint Tracking Number\" (e.g., GRV-20231025-1234).

IMPORTANT:
If the user message contains a \"[SYSTEM: ...]\" note, it is real-time database information added by the portal.
Only that note may be used for claims about a complaint's status. Never invent or guess a status.
If the note says \"DATABASE RECORD FOUND\", summarize the status details politely.
If the note says \"DATABASE RECORD NOT FOUND\", tell the user the ID seems incorrect and ask them to check it.
If the note says the lookup is unavailable, ask the user to try again later.

Keep answers concise, polite, and helpful.";

/// Result of looking up the id mentioned in a message.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Complaint),
    NotFound,
    /// The store could not be read; no record data is available.
    Unavailable,
}

/// The delimited note appended to a message that mentions `id`.
pub fn system_note(id: &str, lookup: &Lookup) -> String {
    match lookup {
        Lookup::Found(c) => {
            let remarks = if c.remarks.is_empty() {
                "None".to_string()
            } else {
                c.remarks.join("; ")
            };
            format!(
                "[SYSTEM: User mentioned Tracking ID {id}. DATABASE RECORD FOUND: {{ \
                 Status: \"{}\", Priority: \"{}\", Department: \"{}\", Title: \"{}\", \
                 Remarks: \"{remarks}\", LastUpdated: \"{}\" }}. Use this info to update the user.]",
                c.status,
                c.priority,
                c.department,
                c.title,
                c.updated_at.to_rfc3339(),
            )
        }
        Lookup::NotFound => format!(
            "[SYSTEM: User mentioned Tracking ID {id}. DATABASE RECORD NOT FOUND. \
             Inform the user to check the ID.]"
        ),
        Lookup::Unavailable => format!(
            "[SYSTEM: User mentioned Tracking ID {id}. Record lookup is unavailable right now. \
             Do not state any status; ask the user to try again later.]"
        ),
    }
}

/// Pure augmentation step: `lookup` is called at most once, with the
/// canonical (uppercase) id found in `raw`.
pub fn augment_with(raw: &str, lookup: impl FnOnce(&str) -> Lookup) -> String {
    match find_tracking_id(raw) {
        Some(id) => {
            let found = lookup(&id);
            format!("{raw}\n\n{}", system_note(&id, &found))
        }
        None => raw.to_string(),
    }
}

pub struct AssistantBridge<'a, S: ComplaintStore> {
    lifecycle: &'a LifecycleManager<S>,
    oracle: &'a dyn Oracle,
}

impl<'a, S: ComplaintStore> AssistantBridge<'a, S> {
    pub fn new(lifecycle: &'a LifecycleManager<S>, oracle: &'a dyn Oracle) -> Self {
        Self { lifecycle, oracle }
    }

    pub fn augment(&self, raw: &str) -> String {
        augment_with(raw, |id| match self.lifecycle.get_by_id(id) {
            Ok(Some(c)) => Lookup::Found(c),
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                log::warn!("assistant: lookup of {id} failed: {e}");
                Lookup::Unavailable
            }
        })
    }

    /// Reply to `raw` given the prior turns. Never fails: oracle errors
    /// and timeouts become `APOLOGY_REPLY`.
    pub fn reply(&self, history: &[ChatTurn], raw: &str) -> String {
        let message = self.augment(raw);
        match self.oracle.converse(SYSTEM_INSTRUCTION, history, &message) {
            Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(text) => text,
            Err(e) => {
                log::warn!("assistant: conversation oracle failed: {e}");
                APOLOGY_REPLY.to_string()
            }
        }
    }
}
