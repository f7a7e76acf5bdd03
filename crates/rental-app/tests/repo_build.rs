use chrono::{NaiveDate, NaiveTime};
use rental_repo::{build_repo, Repo};
use rental_types::domain::actor::Actor;
use rental_types::domain::booking::{Booking, NewBooking};
use rental_types::ports::repository::{BookingRepository, OrderRepository};

#[tokio::test]
async fn builds_repo_and_persists_a_booking() {
    // Use a temp DB path for isolation.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rental-test.db");
    let url = format!("sqlite://{}", db_path.display());

    let repo: Repo = build_repo(Some(&url)).await.expect("build repo");
    let alice = Actor::customer("C1", "Alice").with_account("A100");
    assert!(repo.list_orders_for(&alice).await.expect("list").is_empty());

    let booking = Booking::new(
        &alice,
        NewBooking {
            provider_ref: "P1".into(),
            service_type: "Cleaning".into(),
            booking_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        },
    )
    .unwrap();
    let created = repo.create_booking(booking).await.expect("create");

    let bob = Actor::provider("P1", "Bob");
    let listed = repo.list_bookings_for(&bob).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
}
