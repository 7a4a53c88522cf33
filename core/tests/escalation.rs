//! Overdue rule, dashboard counts, triage listing, demo seeding.

use chrono::{Duration, TimeZone, Utc};
use grievance_core::{
    clock::ManualClock,
    complaint::{ComplaintStatus, NewComplaint, Priority},
    config::PortalConfig,
    lifecycle::{is_overdue, ComplaintFilter, LifecycleManager, OVERDUE_AFTER_HOURS},
    store::{ComplaintStore, PortalStore},
    tracking::TrackingIdGenerator,
    types::Timestamp,
};

fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

fn build_desk(config: PortalConfig) -> (LifecycleManager<PortalStore>, ManualClock) {
    let store = PortalStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let clock = ManualClock::starting_at(start());
    let desk = LifecycleManager::with_parts(
        store,
        config,
        Box::new(clock.clone()),
        TrackingIdGenerator::seeded(3),
    );
    (desk, clock)
}

fn seeded_desk() -> (LifecycleManager<PortalStore>, ManualClock) {
    let config = PortalConfig {
        seed_demo_data: true,
        ..PortalConfig::default_test()
    };
    let (mut desk, clock) = build_desk(config);
    assert!(desk.seed_if_uninitialized().unwrap(), "fresh store should be seeded");
    (desk, clock)
}

fn streetlight() -> NewComplaint {
    NewComplaint {
        full_name: "Kiran Das".into(),
        email: "kiran@example.com".into(),
        phone: "9000000002".into(),
        department: "Electricity".into(),
        category: "Infrastructure".into(),
        title: "Streetlight out".into(),
        description: "Lane 4 has been dark for a week.".into(),
        ..NewComplaint::default()
    }
}

fn ids(list: &[grievance_core::complaint::Complaint]) -> Vec<&str> {
    list.iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn never_forwarded_is_never_overdue() {
    let (mut desk, clock) = build_desk(PortalConfig::default_test());
    let c = desk.create(streetlight(), Priority::Low).unwrap();

    clock.advance_days(100);
    assert!(!desk.is_overdue(&c));
}

#[test]
fn overdue_boundary_is_strictly_after_ten_days() {
    let (mut desk, clock) = build_desk(PortalConfig::default_test());
    let c = desk.create(streetlight(), Priority::Low).unwrap();
    let c = desk.forward(&c.id, None).unwrap().unwrap();

    clock.advance(Duration::hours(OVERDUE_AFTER_HOURS));
    assert!(!desk.is_overdue(&c), "exactly 240h is not yet overdue");

    clock.advance(Duration::seconds(1));
    assert!(desk.is_overdue(&c));
}

#[test]
fn closed_complaints_are_never_overdue() {
    for closing in [ComplaintStatus::Resolved, ComplaintStatus::Rejected] {
        let (mut desk, clock) = build_desk(PortalConfig::default_test());
        let c = desk.create(streetlight(), Priority::Low).unwrap();
        desk.forward(&c.id, None).unwrap();
        clock.advance_days(11);
        let open = desk.get_by_id(&c.id).unwrap().unwrap();
        assert!(desk.is_overdue(&open));

        let closed = desk.update_status(&c.id, closing, None).unwrap().unwrap();
        assert!(!desk.is_overdue(&closed), "{closing} must clear the overdue flag");
    }
}

#[test]
fn overdue_survives_moving_to_in_progress() {
    let (mut desk, clock) = build_desk(PortalConfig::default_test());
    let c = desk.create(streetlight(), Priority::Low).unwrap();
    desk.forward(&c.id, None).unwrap();
    clock.advance_days(3);
    let ip = desk
        .update_status(&c.id, ComplaintStatus::InProgress, None)
        .unwrap()
        .unwrap();

    clock.advance_days(8);
    assert!(is_overdue(&ip, desk.now()));
}

#[test]
fn seeding_happens_once_and_only_when_enabled() {
    let (mut desk, _clock) = seeded_desk();
    assert_eq!(desk.store().load().unwrap().len(), 4);
    assert!(!desk.seed_if_uninitialized().unwrap(), "second run must not reseed");
    assert_eq!(desk.store().load().unwrap().len(), 4);
    assert_eq!(desk.store().event_count().unwrap(), 4);

    let (mut plain, _clock) = build_desk(PortalConfig::default_test());
    assert!(!plain.seed_if_uninitialized().unwrap());
    assert!(!plain.store().is_initialized().unwrap());
}

#[test]
fn seeding_skips_a_collection_emptied_by_an_admin() {
    let config = PortalConfig {
        seed_demo_data: true,
        ..PortalConfig::default_test()
    };
    let (mut desk, _clock) = build_desk(config);
    desk.store().replace(&[]).unwrap();
    assert!(!desk.seed_if_uninitialized().unwrap());
    assert!(desk.store().load().unwrap().is_empty());
}

#[test]
fn demo_records_drive_the_dashboard() {
    let (desk, _clock) = seeded_desk();
    let stats = desk.stats().unwrap();

    assert_eq!(stats.total, 4);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.resolved, 0);
    assert_eq!(stats.high_priority, 2);
    assert_eq!(stats.overdue, 1);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["inProgress"], 1);
    assert_eq!(json["highPriority"], 2);
    assert!(json.get("in_progress").is_none());

    let escalated = desk.escalations().unwrap();
    assert_eq!(ids(&escalated), vec!["GRV-20231015-9999"]);
}

#[test]
fn escalations_list_longest_waiting_first() {
    let (mut desk, clock) = build_desk(PortalConfig::default_test());
    let older = desk.create(streetlight(), Priority::Low).unwrap();
    desk.forward(&older.id, None).unwrap();
    clock.advance_days(2);
    let newer = desk.create(streetlight(), Priority::High).unwrap();
    desk.forward(&newer.id, None).unwrap();

    clock.advance_days(9);
    assert_eq!(ids(&desk.escalations().unwrap()), vec![older.id.as_str()]);

    clock.advance_days(2);
    assert_eq!(
        ids(&desk.escalations().unwrap()),
        vec![older.id.as_str(), newer.id.as_str()]
    );
    assert_eq!(desk.stats().unwrap().overdue, 2);
}

#[test]
fn listing_puts_high_priority_first_then_newest() {
    let (desk, _clock) = seeded_desk();
    let all = desk.list(&ComplaintFilter::default()).unwrap();
    assert_eq!(
        ids(&all),
        vec![
            "GRV-20231025-1234",
            "GRV-20231015-9999",
            "GRV-20231027-9101",
            "GRV-20231026-5678",
        ]
    );
}

#[test]
fn listing_filters_by_status_priority_and_search() {
    let (desk, _clock) = seeded_desk();

    let in_progress = desk
        .list(&ComplaintFilter {
            status: Some(ComplaintStatus::InProgress),
            ..ComplaintFilter::default()
        })
        .unwrap();
    assert_eq!(ids(&in_progress), vec!["GRV-20231026-5678"]);

    let low = desk
        .list(&ComplaintFilter {
            priority: Some(Priority::Low),
            ..ComplaintFilter::default()
        })
        .unwrap();
    assert_eq!(ids(&low), vec!["GRV-20231027-9101", "GRV-20231026-5678"]);

    let by_dept = desk
        .list(&ComplaintFilter {
            search: Some("transport".into()),
            ..ComplaintFilter::default()
        })
        .unwrap();
    assert_eq!(ids(&by_dept), vec!["GRV-20231015-9999"]);

    let by_id = desk
        .list(&ComplaintFilter {
            search: Some("grv-20231026".into()),
            ..ComplaintFilter::default()
        })
        .unwrap();
    assert_eq!(ids(&by_id), vec!["GRV-20231026-5678"]);

    let by_name = desk
        .list(&ComplaintFilter {
            search: Some("Ramesh".into()),
            priority: Some(Priority::Low),
            ..ComplaintFilter::default()
        })
        .unwrap();
    assert!(by_name.is_empty(), "filters combine with AND");
}
