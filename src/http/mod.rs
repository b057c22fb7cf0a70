//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → server.rs (Axum router, middleware, handlers)
//!     → admission / workload / upstream components
//!     → error.rs (typed outcomes → status codes)
//!     → JSON response
//! ```

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::HttpServer;
