use chrono::{NaiveDate, NaiveTime};
use rental_hex::application::booking_service::BookingService;
use rental_hex::application::order_service::OrderService;
use rental_hex::errors::AppError;
use rental_repo::memory::InMemoryRepo;
use rental_types::domain::actor::Actor;
use rental_types::domain::booking::{BookingStatus, NewBooking};
use rental_types::domain::errors::BookingError;
use rental_types::domain::feedback::{FeedbackDraft, ServiceQuality};
use rental_types::domain::order::{NewOrder, OrderStatus};
use rental_types::lifecycle::BookingAction;
use std::sync::Arc;

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn alice() -> Actor {
    Actor::customer("C1", "Alice").with_account("A100")
}

fn bob() -> Actor {
    Actor::provider("P1", "Bob").with_account("A200")
}

fn request() -> NewBooking {
    NewBooking {
        provider_ref: "P1".into(),
        service_type: "Cleaning".into(),
        booking_date: NaiveDate::from_ymd_opt(2024, 5, 1),
        start_time: hm(9, 0),
        end_time: hm(10, 0),
    }
}

// Full booking lifecycle against the in-memory adapter.
#[tokio::test]
async fn booking_lifecycle_through_feedback() {
    let repo = Arc::new(InMemoryRepo::new());
    let svc = BookingService::new(repo);

    let booking = svc.create_booking(&alice(), request()).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let confirmed = svc
        .transition(&bob(), &booking.id, 0, BookingAction::Confirm)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let completed = svc
        .transition(&bob(), &booking.id, confirmed.version, BookingAction::Complete)
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let draft = FeedbackDraft {
        rating: 5,
        service_quality: ServiceQuality::Excellent,
        message: "spotless".into(),
    };
    let feedback = svc
        .submit_feedback(&alice(), &booking.id, draft.clone())
        .await
        .unwrap();
    assert_eq!(feedback.rating, 5);

    let again = svc.submit_feedback(&alice(), &booking.id, draft).await;
    assert!(matches!(
        again,
        Err(AppError::Booking(BookingError::NotEligible(_)))
    ));

    let mine = svc.list_feedback(&alice()).await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn cancelled_booking_carries_canceller_identity() {
    let svc = BookingService::new(Arc::new(InMemoryRepo::new()));
    let booking = svc.create_booking(&alice(), request()).await.unwrap();

    let cancelled = svc
        .transition(
            &alice(),
            &booking.id,
            0,
            BookingAction::Cancel {
                reason: Some("  plans changed ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    let c = cancelled.cancellation.expect("attribution");
    assert_eq!(c.canceled_by, "Alice");
    assert_eq!(c.canceled_account_id, "A100");
    assert_eq!(c.reason.as_deref(), Some("plans changed"));

    let confirm = svc
        .transition(&bob(), &booking.id, cancelled.version, BookingAction::Confirm)
        .await;
    assert!(matches!(
        confirm,
        Err(AppError::Booking(BookingError::InvalidTransition(_)))
    ));
}

#[tokio::test]
async fn order_flow_with_shared_repo() {
    let repo = Arc::new(InMemoryRepo::new());
    let orders = OrderService::new(repo.clone());
    let bookings = BookingService::new(repo);

    let order = orders
        .create_order(
            &alice(),
            NewOrder {
                listing_ref: "L9".into(),
                owner_ref: "P1".into(),
                payment_method: "card".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Booked);

    let canceled = orders
        .cancel_order(&bob(), &order.id, order.version, None)
        .await
        .unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert_eq!(canceled.canceled_by(), Some("Bob"));

    assert!(bookings.list_bookings(&alice()).await.unwrap().is_empty());
    assert_eq!(orders.list_orders(&bob()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn listing_ignores_id_matches_on_the_other_side() {
    let svc = BookingService::new(Arc::new(InMemoryRepo::new()));
    svc.create_booking(&alice(), request()).await.unwrap();

    let impostor = Actor::customer("P1", "Mallory");
    assert!(svc.list_bookings(&impostor).await.unwrap().is_empty());
    assert_eq!(svc.list_bookings(&bob()).await.unwrap().len(), 1);
    assert_eq!(svc.list_bookings(&alice()).await.unwrap().len(), 1);
}
