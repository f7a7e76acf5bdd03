pub mod booking_api;
pub mod payment;
pub mod repository;
pub mod session;
