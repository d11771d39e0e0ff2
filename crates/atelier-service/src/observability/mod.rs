//! Observability for the Atelier service.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
