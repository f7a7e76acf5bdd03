use std::cmp::Ordering;

use crate::domain::booking::{Booking, BookingStatus};

/// Display ordering: status rank ascending, then most recent first, then id
/// so the order is total.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOrderingPolicy;

impl StatusOrderingPolicy {
    pub fn rank(status: BookingStatus) -> u8 {
        match status {
            BookingStatus::Pending => 1,
            BookingStatus::Confirmed => 2,
            BookingStatus::Completed => 3,
            BookingStatus::Cancelled => 4,
        }
    }

    pub fn compare(a: &Booking, b: &Booking) -> Ordering {
        Self::rank(a.status)
            .cmp(&Self::rank(b.status))
            .then_with(|| b.recency().cmp(&a.recency()))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn order(&self, mut bookings: Vec<Booking>) -> Vec<Booking> {
        bookings.sort_by(Self::compare);
        bookings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingId, TimeSlot};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn booking(id: &str, status: BookingStatus, date: Option<(i32, u32, u32)>) -> Booking {
        let created = Utc.with_ymd_and_hms(2023, 12, 1, 8, 0, 0).unwrap();
        Booking {
            id: BookingId::from(id),
            status,
            booking_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            time_slot: TimeSlot::new(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            )
            .unwrap(),
            service_type: "cleaning".into(),
            provider_ref: "P1".into(),
            customer_ref: "C1".into(),
            created_at: created,
            updated_at: created,
            version: 0,
            cancellation: None,
        }
    }

    fn ids(list: &[Booking]) -> Vec<&str> {
        list.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn single_booking_is_unchanged() {
        let b = booking("B1", BookingStatus::Confirmed, Some((2024, 1, 1)));
        assert_eq!(StatusOrderingPolicy.order(vec![b.clone()]), vec![b]);
    }

    #[test]
    fn lower_rank_wins_over_recency() {
        let confirmed = booking("B1", BookingStatus::Confirmed, Some((2024, 1, 1)));
        let pending = booking("B2", BookingStatus::Pending, Some((2024, 6, 1)));
        let ordered = StatusOrderingPolicy.order(vec![confirmed, pending]);
        assert_eq!(ids(&ordered), vec!["B2", "B1"]);

        let older_pending = booking("B3", BookingStatus::Pending, Some((2023, 1, 1)));
        let confirmed = booking("B1", BookingStatus::Confirmed, Some((2025, 1, 1)));
        let ordered = StatusOrderingPolicy.order(vec![confirmed, older_pending]);
        assert_eq!(ids(&ordered), vec!["B3", "B1"]);
    }

    #[test]
    fn ties_go_most_recent_first_then_by_id() {
        let list = vec![
            booking("B1", BookingStatus::Pending, Some((2024, 1, 1))),
            booking("B2", BookingStatus::Pending, Some((2024, 3, 1))),
            booking("B4", BookingStatus::Pending, None),
            booking("B3", BookingStatus::Pending, Some((2024, 3, 1))),
        ];
        let ordered = StatusOrderingPolicy.order(list);
        assert_eq!(ids(&ordered), vec!["B2", "B3", "B1", "B4"]);
    }

    #[test]
    fn ordering_is_idempotent() {
        let list = vec![
            booking("B5", BookingStatus::Cancelled, Some((2024, 2, 1))),
            booking("B1", BookingStatus::Completed, Some((2024, 5, 1))),
            booking("B2", BookingStatus::Pending, None),
            booking("B3", BookingStatus::Confirmed, Some((2024, 5, 1))),
            booking("B4", BookingStatus::Pending, Some((2024, 5, 1))),
            booking("B6", BookingStatus::Confirmed, Some((2024, 7, 1))),
        ];
        let once = StatusOrderingPolicy.order(list);
        let twice = StatusOrderingPolicy.order(once.clone());
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["B4", "B2", "B6", "B3", "B1", "B5"]);
    }
}
