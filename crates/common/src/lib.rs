//! Common utilities shared across Atelier crates.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (size limit, header inspection, algorithm allow-list)
pub mod jwt;
