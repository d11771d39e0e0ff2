//! # Atelier Test Utilities
//!
//! Shared test utilities for the Atelier service.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed RSA key, seeded Ed25519 keys)
//! - Claims builders (`TestTokenBuilder`)
//! - A wiremock-backed JWKS endpoint (`JwksMock`)
//! - Server test harness (`TestAtelierServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atelier_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> anyhow::Result<()> {
//!     let server = TestAtelierServer::spawn(pool).await?;
//!
//!     let claims = TestTokenBuilder::new()
//!         .with_permissions(&["delete:artist"])
//!         .build();
//!     let token = TestRsaKey::default().sign(&claims)?;
//!     // ...
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_mock;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_mock::*;
pub use server_harness::*;
pub use token_builders::*;
