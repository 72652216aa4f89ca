//! Utility types and functions for the exporter.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`Hasher`] / [`Fingerprint`] - Content fingerprinting for the bake caches
//! - Math type re-exports from glam plus [`Aabb`]

mod error;
mod hash;
mod math;

pub use error::*;
pub use hash::*;
pub use math::*;
