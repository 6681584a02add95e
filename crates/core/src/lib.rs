//! Core business logic for rendezvous-rs.

pub mod services;

pub use services::*;
