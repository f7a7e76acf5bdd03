///  To run :
///  cargo r --example client_example
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use rental_client::{BookingSession, RentalClient, RetryingApi};
use rental_hex::auth::StaticSessions;
use rental_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use rental_repo::build_repo;
use rental_types::domain::actor::Actor;
use rental_types::domain::booking::NewBooking;
use rental_types::domain::errors::BookingError;
use rental_types::domain::feedback::{FeedbackDraft, ServiceQuality};
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn session_api(base: &str, token: &str) -> anyhow::Result<RetryingApi<RentalClient>> {
    let client = RentalClient::builder(base)?
        .with_bearer_token(token)?
        .with_timeout(Duration::from_secs(5))
        .build()?;
    Ok(RetryingApi::new(client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("rental.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let alice = Actor::customer("C1", "Alice").with_account("A100");
    let bob = Actor::provider("P1", "Bob").with_account("A200");
    let sessions = StaticSessions::new()
        .with_session("alice-token", alice.clone())
        .with_session("bob-token", bob.clone());

    let repo = build_repo(Some(&db_url)).await?;
    let server = HttpServer::new(
        AppState::new(repo, Arc::new(sessions)),
        HttpServerConfig {
            port: port.to_string(),
            cors_allow_origin: None,
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    // Wait until the server answers its health check.
    let probe = reqwest::Client::new();
    for _ in 0..50 {
        match probe.get(format!("{addr}health")).send().await {
            Ok(res) if res.status().is_success() => break,
            _ => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }

    let mut customer = BookingSession::new(session_api(&addr, "alice-token")?, alice);
    let mut provider = BookingSession::new(session_api(&addr, "bob-token")?, bob);

    let booking = customer
        .create(NewBooking {
            provider_ref: "P1".into(),
            service_type: "Plumbing".into(),
            booking_date: NaiveDate::from_ymd_opt(2024, 6, 3),
            start_time: NaiveTime::from_hms_opt(8, 30, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
        })
        .await?;
    println!("Created booking id={} status={}", booking.id, booking.status);

    provider.refresh().await?;
    let confirmed = provider.confirm(&booking.id).await?;
    println!("Provider confirmed, version={}", confirmed.version);

    // The customer still holds version 0, so the server refuses the write
    // and the session rolls back and refetches.
    match customer.cancel(&booking.id, Some("changed my mind".into())).await {
        Err(BookingError::Conflict(msg)) => println!("Stale cancel refused: {msg}"),
        other => println!("Unexpected cancel outcome: {other:?}"),
    }

    let completed = provider.complete(&booking.id).await?;
    println!("Provider completed, status={}", completed.status);

    customer.refresh().await?;
    if customer.can_submit_feedback(&booking.id) {
        let feedback = customer
            .submit_feedback(
                &booking.id,
                FeedbackDraft {
                    rating: 5,
                    service_quality: ServiceQuality::Excellent,
                    message: "Quick and tidy".into(),
                },
            )
            .await?;
        println!("Feedback stored: rating={}", feedback.rating);
    }

    for b in customer.store().ordered() {
        println!("{} {} {}", b.id, b.status, b.service_type);
    }

    handle.abort();
    Ok(())
}
