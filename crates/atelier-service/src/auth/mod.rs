//! Authentication and authorization for privileged routes.
//!
//! # Components
//!
//! - `bearer` - `Authorization: Bearer <token>` extraction
//! - `jwks` - key set providers (HTTP JWKS client with TTL cache, static set)
//! - `jwt` - signature and registered-claims verification
//! - `claims` - decoded claims and the permission check
//! - `gate` - the ordered composition of all of the above
//! - `error` - failure taxonomy shared by every stage

pub mod bearer;
pub mod claims;
pub mod error;
pub mod gate;
pub mod jwks;
pub mod jwt;

pub use claims::{Audience, Claims};
pub use error::AuthError;
pub use gate::{AuthGate, Denied, GateStage};
pub use jwks::{Jwk, JwksClient, KeySetProvider, StaticKeySet};
pub use jwt::TokenVerifier;
