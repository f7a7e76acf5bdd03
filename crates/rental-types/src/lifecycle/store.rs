use std::sync::Arc;

use crate::domain::booking::{Booking, BookingId, BookingStatus};
use crate::domain::errors::BookingError;
use crate::domain::order::{Order, OrderStatus};
use crate::lifecycle::ordering::StatusOrderingPolicy;
use crate::lifecycle::Transition;

/// Tabs of the bookings view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGroup {
    /// Everything that is not cancelled.
    Booked,
    Cancelled,
}

impl StatusGroup {
    pub fn of_booking(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Cancelled => StatusGroup::Cancelled,
            _ => StatusGroup::Booked,
        }
    }

    pub fn of_order(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Canceled => StatusGroup::Cancelled,
            OrderStatus::Booked => StatusGroup::Booked,
        }
    }

    pub fn filter_orders<'a>(self, orders: impl IntoIterator<Item = &'a Order>) -> Vec<Order> {
        orders
            .into_iter()
            .filter(|o| StatusGroup::of_order(o.status) == self)
            .cloned()
            .collect()
    }
}

/// Immutable snapshot of the bookings visible to one actor. Every mutating
/// operation returns a new snapshot with a bumped revision; existing
/// snapshots held elsewhere never change.
#[derive(Debug, Clone, Default)]
pub struct BookingStore {
    bookings: Arc<Vec<Booking>>,
    revision: u64,
}

impl BookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole view. A later duplicate id wins.
    pub fn replace_all(&self, bookings: Vec<Booking>) -> Self {
        let mut deduped: Vec<Booking> = Vec::with_capacity(bookings.len());
        for booking in bookings {
            match deduped.iter_mut().find(|b| b.id == booking.id) {
                Some(slot) => *slot = booking,
                None => deduped.push(booking),
            }
        }
        self.next(deduped)
    }

    pub fn apply_transition(
        &self,
        booking_id: &BookingId,
        transition: &Transition,
    ) -> Result<Self, BookingError> {
        if transition.booking_id() != booking_id {
            return Err(BookingError::Validation(format!(
                "transition for booking {} applied to {}",
                transition.booking_id(),
                booking_id
            )));
        }
        self.replace(transition.after.clone())
    }

    /// Swaps in a newer copy of an existing booking, e.g. the server's
    /// acknowledged record.
    pub fn replace(&self, booking: Booking) -> Result<Self, BookingError> {
        let idx = self
            .position(&booking.id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking.id)))?;
        let mut bookings = self.bookings.as_ref().clone();
        bookings[idx] = booking;
        Ok(self.next(bookings))
    }

    /// Adds a booking, replacing any existing record with the same id.
    pub fn insert(&self, booking: Booking) -> Self {
        let mut bookings = self.bookings.as_ref().clone();
        match bookings.iter_mut().find(|b| b.id == booking.id) {
            Some(slot) => *slot = booking,
            None => bookings.push(booking),
        }
        self.next(bookings)
    }

    pub fn get(&self, booking_id: &BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|b| &b.id == booking_id)
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn ordered(&self) -> Vec<Booking> {
        StatusOrderingPolicy.order(self.bookings.as_ref().clone())
    }

    pub fn filter_by_status_group(&self, group: StatusGroup) -> Vec<Booking> {
        let matching = self
            .bookings
            .iter()
            .filter(|b| StatusGroup::of_booking(b.status) == group)
            .cloned()
            .collect();
        StatusOrderingPolicy.order(matching)
    }

    /// Changes on every mutation; cheap memoization key for views.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn position(&self, booking_id: &BookingId) -> Option<usize> {
        self.bookings.iter().position(|b| &b.id == booking_id)
    }

    fn next(&self, bookings: Vec<Booking>) -> Self {
        Self {
            bookings: Arc::new(bookings),
            revision: self.revision + 1,
        }
    }
}
