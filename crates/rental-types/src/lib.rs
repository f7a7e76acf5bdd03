//! rental-types: booking/order domain, lifecycle rules and the ports both
//! sides of the rental API are written against.

pub mod domain;
pub mod lifecycle;
pub mod ports;

pub use domain::errors::BookingError;
