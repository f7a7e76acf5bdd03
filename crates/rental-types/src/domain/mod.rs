pub mod actor;
pub mod booking;
pub mod cancellation;
pub mod errors;
pub mod feedback;
pub mod order;
