//! A complaint's whole life, from the lodge form to resolution.

use chrono::{TimeZone, Utc};
use grievance_core::{
    assistant::AssistantBridge,
    classifier::PriorityClassifier,
    clock::ManualClock,
    complaint::{ComplaintStatus, NewComplaint, Priority},
    config::PortalConfig,
    lifecycle::LifecycleManager,
    oracle::{ChatTurn, OfflineOracle, Oracle, OracleError},
    store::PortalStore,
    tracking::TrackingIdGenerator,
};

/// Echoes the (augmented) message back, so the test can see what the assistant was told.
struct EchoOracle;

impl Oracle for EchoOracle {
    fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }

    fn converse(&self, _: &str, _: &[ChatTurn], message: &str) -> Result<String, OracleError> {
        Ok(message.to_string())
    }
}

#[test]
fn live_wire_is_filed_forwarded_escalated_and_resolved() {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = PortalStore::in_memory().unwrap();
    store.migrate().unwrap();
    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2023, 10, 25, 11, 0, 0).unwrap());
    let mut desk = LifecycleManager::with_parts(
        store,
        PortalConfig::default_test(),
        Box::new(clock.clone()),
        TrackingIdGenerator::seeded(2023),
    );

    // Lodge with no oracle reachable: the keyword scan decides.
    let offline = OfflineOracle;
    let classifier = PriorityClassifier::new(&offline, &desk.config().fallback_keywords);
    let form = NewComplaint {
        full_name: "Ramesh Gupta".into(),
        email: "ramesh@example.com".into(),
        phone: "9876543210".into(),
        department: "Electricity".into(),
        category: "Safety Hazard".into(),
        title: "Live wire near school".into(),
        description: "Exposed electricity cable, real danger to children".into(),
        ..NewComplaint::default()
    };
    let filed = desk.submit(form, &classifier).unwrap();
    assert_eq!(filed.priority, Priority::High);
    assert_eq!(filed.status, ComplaintStatus::Submitted);
    assert!(filed.id.starts_with("GRV-20231025-"));

    // Admin routes it.
    let forwarded = desk.forward(&filed.id, Some("escalated")).unwrap().unwrap();
    assert_eq!(forwarded.status, ComplaintStatus::Forwarded);
    assert_eq!(
        forwarded.remarks,
        vec!["Forwarded to Electricity department. Note: escalated".to_string()]
    );
    assert!(!desk.is_overdue(&forwarded));

    // Eleven quiet days later it shows up on the escalation list.
    clock.advance_days(11);
    let waiting = desk.get_by_id(&filed.id).unwrap().unwrap();
    assert!(desk.is_overdue(&waiting));
    assert_eq!(desk.escalations().unwrap().len(), 1);
    assert_eq!(desk.stats().unwrap().overdue, 1);

    // Resolution clears it.
    let resolved = desk
        .update_status(&filed.id, ComplaintStatus::Resolved, None)
        .unwrap()
        .unwrap();
    assert!(!desk.is_overdue(&resolved));
    assert_eq!(resolved.remarks.len(), 1);
    assert!(desk.escalations().unwrap().is_empty());

    // The citizen asks the assistant, using a lowercase id.
    let echo = EchoOracle;
    let bridge = AssistantBridge::new(&desk, &echo);
    let question = format!("hi, any update on {}?", filed.id.to_lowercase());
    let told = bridge.reply(&[], &question);
    assert!(told.contains("DATABASE RECORD FOUND"));
    assert!(told.contains("Status: \"Resolved\""));
    assert!(told.contains("Remarks: \"Forwarded to Electricity department. Note: escalated\""));

    let trail: Vec<String> = desk
        .store()
        .events_for(&filed.id)
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(trail, vec!["complaint_filed", "complaint_forwarded", "status_changed"]);
}
