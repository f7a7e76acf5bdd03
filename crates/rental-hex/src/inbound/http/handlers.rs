use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rental_types::domain::booking::{Booking, BookingId, NewBooking};
use rental_types::domain::feedback::{Feedback, FeedbackDraft};
use rental_types::domain::order::{NewOrder, Order, OrderId};
use rental_types::lifecycle::BookingAction;
use rental_types::ports::booking_api::{CancelRequest, ModifyRequest, VersionedRequest};
use rental_types::ports::repository::RentalRepository;
use std::sync::Arc;

use super::server::AppState;
use crate::auth::authenticate;
use crate::errors::AppError;

type Shared<R> = State<Arc<AppState<R>>>;

pub(super) async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub(super) async fn list_bookings<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    Ok(Json(state.bookings.list_bookings(&actor).await?))
}

pub(super) async fn create_booking<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let booking = state.bookings.create_booking(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub(super) async fn get_booking<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let booking = state.bookings.get_booking(&actor, &BookingId::new(id)).await?;
    Ok(Json(booking))
}

pub(super) async fn confirm_booking<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<VersionedRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let booking = state
        .bookings
        .transition(
            &actor,
            &BookingId::new(id),
            payload.expected_version,
            BookingAction::Confirm,
        )
        .await?;
    Ok(Json(booking))
}

pub(super) async fn complete_booking<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<VersionedRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let booking = state
        .bookings
        .transition(
            &actor,
            &BookingId::new(id),
            payload.expected_version,
            BookingAction::Complete,
        )
        .await?;
    Ok(Json(booking))
}

pub(super) async fn cancel_booking<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let booking = state
        .bookings
        .transition(
            &actor,
            &BookingId::new(id),
            payload.expected_version,
            BookingAction::Cancel {
                reason: payload.reason,
            },
        )
        .await?;
    Ok(Json(booking))
}

pub(super) async fn modify_booking<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<ModifyRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let booking = state
        .bookings
        .transition(
            &actor,
            &BookingId::new(id),
            payload.expected_version,
            BookingAction::Modify {
                booking_date: payload.booking_date,
                start: payload.start_time,
                end: payload.end_time,
            },
        )
        .await?;
    Ok(Json(booking))
}

pub(super) async fn submit_feedback<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<FeedbackDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let feedback = state
        .bookings
        .submit_feedback(&actor, &BookingId::new(id), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub(super) async fn list_feedback<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
) -> Result<Json<Vec<Feedback>>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    Ok(Json(state.bookings.list_feedback(&actor).await?))
}

pub(super) async fn list_orders<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    Ok(Json(state.orders.list_orders(&actor).await?))
}

pub(super) async fn create_order<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let order = state.orders.create_order(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub(super) async fn cancel_order<R: RentalRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let actor = authenticate(state.sessions.as_ref(), &headers)?;
    let Json(payload) = payload?;
    let order = state
        .orders
        .cancel_order(
            &actor,
            &OrderId::new(id),
            payload.expected_version,
            payload.reason,
        )
        .await?;
    Ok(Json(order))
}
