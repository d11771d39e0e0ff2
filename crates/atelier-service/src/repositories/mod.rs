//! Repository layer for the atelier service.
//!
//! Handlers call these directly; each query records its duration and outcome.

pub mod artists;
pub mod videos;

pub use artists::ArtistsRepository;
pub use videos::VideosRepository;
