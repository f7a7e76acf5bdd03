//! In-process stand-ins for the remote API, used by the client unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rental_types::domain::actor::Actor;
use rental_types::domain::booking::{Booking, BookingId, NewBooking, TimeSlot};
use rental_types::domain::errors::BookingError;
use rental_types::domain::feedback::{Feedback, FeedbackDraft};
use rental_types::domain::order::{NewOrder, Order, OrderId};
use rental_types::lifecycle::{BookingAction, BookingLifecycle, FeedbackGate, OrderLifecycle};
use rental_types::ports::booking_api::{
    BookingApi, CancelRequest, ModifyRequest, OrderApi,
};
use rental_types::ports::payment::PaymentGateway;

pub fn alice() -> Actor {
    Actor::customer("C1", "Alice").with_account("A100")
}

pub fn bob() -> Actor {
    Actor::provider("P1", "Bob").with_account("A200")
}

pub fn new_booking() -> NewBooking {
    NewBooking {
        provider_ref: "P1".into(),
        service_type: "Cleaning".into(),
        booking_date: NaiveDate::from_ymd_opt(2024, 5, 1),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    }
}

/// Behaves like the reference server for one signed-in actor: runs the
/// lifecycle, checks versions and bumps them on every write.
pub struct FakeBookingApi {
    actor: Actor,
    bookings: Mutex<Vec<Booking>>,
    feedback: Mutex<Vec<Feedback>>,
    failures: Mutex<VecDeque<BookingError>>,
    calls: AtomicU32,
}

impl FakeBookingApi {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            bookings: Mutex::new(Vec::new()),
            feedback: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Signed in as the provider, with one pending booking from Alice.
    pub fn seeded() -> Self {
        let api = Self::new(bob());
        api.seed(Booking::new(&alice(), new_booking()).unwrap());
        api
    }

    pub fn seed(&self, booking: Booking) {
        self.bookings.lock().unwrap().push(booking);
    }

    pub fn fail_next(&self, err: BookingError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn booking_ids(&self) -> Vec<BookingId> {
        self.bookings.lock().unwrap().iter().map(|b| b.id.clone()).collect()
    }

    pub fn stored(&self, id: &BookingId) -> Option<Booking> {
        self.bookings.lock().unwrap().iter().find(|b| &b.id == id).cloned()
    }

    /// Simulates another client's write landing first.
    pub fn overwrite(&self, booking: Booking) {
        let mut bookings = self.bookings.lock().unwrap();
        if let Some(slot) = bookings.iter_mut().find(|b| b.id == booking.id) {
            *slot = booking;
        }
    }

    fn begin(&self) -> Result<(), BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn apply(
        &self,
        id: &BookingId,
        expected_version: u64,
        action: BookingAction,
    ) -> Result<Booking, BookingError> {
        self.begin()?;
        let mut bookings = self.bookings.lock().unwrap();
        let slot = bookings
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;
        if slot.version != expected_version {
            return Err(BookingError::Conflict(format!("booking {id} moved on")));
        }
        let transition = BookingLifecycle::new().transition(slot, &self.actor, action)?;
        let mut stored = transition.after;
        stored.version += 1;
        *slot = stored.clone();
        Ok(stored)
    }
}

#[async_trait]
impl BookingApi for FakeBookingApi {
    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        self.begin()?;
        Ok(self.bookings.lock().unwrap().clone())
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Booking, BookingError> {
        self.begin()?;
        self.stored(id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))
    }

    async fn create_booking(&self, request: &NewBooking) -> Result<Booking, BookingError> {
        self.begin()?;
        let booking = Booking::new(&self.actor, request.clone())?;
        self.bookings.lock().unwrap().push(booking.clone());
        Ok(booking)
    }

    async fn confirm_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError> {
        self.apply(id, expected_version, BookingAction::Confirm)
    }

    async fn complete_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError> {
        self.apply(id, expected_version, BookingAction::Complete)
    }

    async fn cancel_booking(
        &self,
        id: &BookingId,
        request: &CancelRequest,
    ) -> Result<Booking, BookingError> {
        self.apply(
            id,
            request.expected_version,
            BookingAction::Cancel {
                reason: request.reason.clone(),
            },
        )
    }

    async fn modify_booking(
        &self,
        id: &BookingId,
        request: &ModifyRequest,
    ) -> Result<Booking, BookingError> {
        TimeSlot::new(request.start_time, request.end_time)?;
        self.apply(
            id,
            request.expected_version,
            BookingAction::Modify {
                booking_date: request.booking_date,
                start: request.start_time,
                end: request.end_time,
            },
        )
    }

    async fn submit_feedback(
        &self,
        id: &BookingId,
        draft: &FeedbackDraft,
    ) -> Result<Feedback, BookingError> {
        self.begin()?;
        let booking = self
            .stored(id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;
        let mut feedback = self.feedback.lock().unwrap();
        let mut gate = FeedbackGate::with_existing(feedback.iter().map(|f| f.booking_id.clone()));
        let created = gate.submit(&booking, &self.actor, draft.clone())?;
        feedback.push(created.clone());
        Ok(created)
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, BookingError> {
        self.begin()?;
        Ok(self.feedback.lock().unwrap().clone())
    }
}

pub struct FakeOrderApi {
    actor: Actor,
    orders: Mutex<Vec<Order>>,
    calls: AtomicU32,
}

impl FakeOrderApi {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            orders: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderApi for FakeOrderApi {
    async fn list_orders(&self) -> Result<Vec<Order>, BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn create_order(&self, request: &NewOrder) -> Result<Order, BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let order = OrderLifecycle::new().place(&self.actor, request.clone(), true)?;
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn cancel_order(
        &self,
        id: &OrderId,
        request: &CancelRequest,
    ) -> Result<Order, BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut orders = self.orders.lock().unwrap();
        let slot = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| BookingError::NotFound(format!("order {id}")))?;
        if slot.version != request.expected_version {
            return Err(BookingError::Conflict(format!("order {id} moved on")));
        }
        let mut canceled =
            OrderLifecycle::new().cancel(slot, &self.actor, request.reason.clone())?;
        canceled.version += 1;
        *slot = canceled.clone();
        Ok(canceled)
    }
}

/// Payment provider with a fixed answer.
pub struct FixedPayments(pub bool);

#[async_trait]
impl PaymentGateway for FixedPayments {
    async fn authorize(&self, _customer: &Actor, _order: &NewOrder) -> Result<bool, BookingError> {
        Ok(self.0)
    }
}
