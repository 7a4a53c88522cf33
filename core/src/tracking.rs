//! Tracking ids: generation and recognition in free text.
//!
//! Format is `GRV-YYYYMMDD-NNNN`. The date is the UTC calendar date at
//! generation time; NNNN is uniform in [1000, 9999]. The generator does
//! not know about the store, so uniqueness is checked by the caller.

use crate::types::{Timestamp, TrackingId};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use regex::Regex;
use std::sync::OnceLock;

pub const TRACKING_PREFIX: &str = "GRV";

fn tracking_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)GRV-[0-9]{8}-[0-9]{4}").expect("valid tracking regex"))
}

fn exact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^GRV-[0-9]{8}-[0-9]{4}$").expect("valid tracking regex"))
}

/// First tracking-id-shaped token in `text`, canonicalized to uppercase.
pub fn find_tracking_id(text: &str) -> Option<TrackingId> {
    tracking_pattern()
        .find(text)
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// True if `id` is exactly a canonical (uppercase) tracking id.
pub fn is_tracking_id(id: &str) -> bool {
    exact_pattern().is_match(id)
}

pub struct TrackingIdGenerator {
    inner: Pcg64Mcg,
}

impl TrackingIdGenerator {
    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            inner: Pcg64Mcg::from_entropy(),
        }
    }

    /// Reproducible stream, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, now: Timestamp) -> TrackingId {
        let serial: u16 = self.inner.gen_range(1000..=9999);
        format!("{TRACKING_PREFIX}-{}-{serial}", now.format("%Y%m%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn generated_ids_carry_the_date_and_a_four_digit_serial() {
        let now = Utc.with_ymd_and_hms(2023, 10, 25, 23, 59, 0).unwrap();
        let mut gen = TrackingIdGenerator::seeded(7);
        for _ in 0..200 {
            let id = gen.generate(now);
            assert!(is_tracking_id(&id), "bad id {id}");
            assert!(id.starts_with("GRV-20231025-"), "wrong date in {id}");
            let serial: u32 = id[13..].parse().unwrap();
            assert!((1000..=9999).contains(&serial), "serial out of range: {serial}");
        }
    }

    #[test]
    fn same_seed_same_ids() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut a = TrackingIdGenerator::seeded(99);
        let mut b = TrackingIdGenerator::seeded(99);
        assert_eq!(a.generate(now), b.generate(now));
    }

    #[test]
    fn finds_ids_case_insensitively_and_uppercases_them() {
        assert_eq!(
            find_tracking_id("What about grv-20231025-1234?").as_deref(),
            Some("GRV-20231025-1234")
        );
        assert_eq!(
            find_tracking_id("first GRV-20231025-1111 then GRV-20231025-2222").as_deref(),
            Some("GRV-20231025-1111")
        );
        assert_eq!(find_tracking_id("GRV-2023-1234 is too short"), None);
        assert_eq!(find_tracking_id("no id here"), None);
    }

    #[test]
    fn only_ascii_digits_form_an_id() {
        assert_eq!(find_tracking_id("status of GRV-٢٠٢٣١٠٢٥-١٢٣٤?"), None);
        assert_eq!(find_tracking_id("GRV-２０２３１０２５-１２３４"), None);
        assert!(!is_tracking_id("GRV-٢٠٢٣١٠٢٥-١٢٣٤"));
        assert!(!is_tracking_id("GRV-２０２３１０２５-１２３４"));
    }

    #[test]
    fn exact_match_requires_canonical_form() {
        assert!(is_tracking_id("GRV-20231025-1234"));
        assert!(!is_tracking_id("grv-20231025-1234"));
        assert!(!is_tracking_id(" GRV-20231025-1234"));
        assert!(!is_tracking_id("GRV-20231025-12345"));
    }
}
