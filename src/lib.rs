//! Request-admission and upstream-resilience layer for a synthetic
//! compute-serving endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                    LOAD GATE                      │
//!                  │                                                   │
//!   POST /work ────┼─▶ admission ──▶ workload (cpu spin + fail draw)  │
//!                  │   (accept/shed)                                   │
//!                  │                                                   │
//!   GET /upstream ─┼─▶ workload (remote instance of the simulator)    │
//!                  │                                                   │
//!   GET /client ───┼─▶ upstream client ──▶ circuit breaker gate       │
//!                  │        │                     │                    │
//!                  │        ▼                     ▼                    │
//!                  │   bounded-timeout call   record outcome           │
//!                  │                                                   │
//!                  │  ┌────────────────────────────────────────────┐  │
//!                  │  │  config · observability · lifecycle        │  │
//!                  │  └────────────────────────────────────────────┘  │
//!                  └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod admission;
pub mod config;
pub mod http;
pub mod upstream;
pub mod workload;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
