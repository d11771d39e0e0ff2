//! HTTP middleware layers.
//!
//! # Components
//!
//! - `auth` - permission middleware for privileged routes
//! - `http_metrics` - request metrics for every response
//! - `routing` - 404 for non-integer ids and JSON 405/408 bodies

pub mod auth;
pub mod http_metrics;
pub mod routing;

pub use auth::{require_permission, ClaimsExt, PermissionGuard};
pub use http_metrics::http_metrics_middleware;
pub use routing::{json_method_not_allowed, json_request_timeout, require_integer_id};
