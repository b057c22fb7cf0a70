//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape on its own listener)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap; call sites use the `record_*` helpers and
//!   never assemble label sets by hand
//! - The exporter runs on a dedicated address, separate from the API listener

pub mod logging;
pub mod metrics;
