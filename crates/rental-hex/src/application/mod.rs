pub mod booking_service;
pub mod order_service;
