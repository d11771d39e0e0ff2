//! Atelier Service Library
//!
//! REST backend for an artist and video catalogue. Reads are public; every
//! write is guarded by a bearer-token gate that verifies a signed JWT against
//! the issuer's published key set and checks a per-route permission.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//!                        |
//!                        v
//!                  auth/gate.rs -> auth/{bearer,jwks,jwt,claims}.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Token extraction, key resolution, verification, permissions
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Permission guard, metrics, routing responses
//! - `models` - Records, request bodies and response envelopes
//! - `observability` - Prometheus metrics
//! - `repositories` - Postgres access
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
