//! rental-hex: reference rental API library (lifecycle services + inbound HTTP)

pub mod auth;
pub mod config;
pub mod errors;

pub mod application;

pub use rental_types::{domain, lifecycle, ports};

pub mod inbound; // HTTP adapter (server + handlers)
