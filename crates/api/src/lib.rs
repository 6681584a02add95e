//! HTTP API layer for rendezvous-rs.
//!
//! - **Endpoints**: registration, voting, presentation, pairing, admin
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: auth resolution, logging, CORS
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
