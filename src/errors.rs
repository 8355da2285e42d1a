//! Error Types
//!
//! This module defines the error types used throughout the importer.
//!
//! # Overview
//!
//! The main error type [`ImportError`] covers the fatal failure classes of
//! the import pipeline:
//! - document content the importer cannot represent (`InvalidFormat`)
//! - references that cannot be resolved against the built scene
//!   (`InvalidParameter`)
//! - features the source format allows but this importer refuses
//!   (`Unsupported`)
//!
//! Non-fatal conditions (undefined source ids, unresolvable animation
//! targets, unknown target element types) are reported through `log::warn!`
//! and the offending unit is skipped; they never surface as an error value.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ImportError>`.

use thiserror::Error;

/// The main error type for the COLLADA import pipeline.
///
/// An error is always scoped to the unit being processed (one geometry,
/// one animation element, one controller); the caller decides whether
/// sibling units continue, which the top-level importer does for
/// per-node content.
#[derive(Error, Debug)]
pub enum ImportError {
    // ========================================================================
    // Format Errors
    // ========================================================================
    /// The document declares content in a shape the importer cannot
    /// represent: unsupported primitive types, spline geometry, mixed
    /// sampler interpolation modes, wrong component counts for a track.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    // ========================================================================
    // Parameter Errors
    // ========================================================================
    /// A cross-reference failed to resolve while binding to the scene:
    /// an unknown bone name/id, a skeleton root that is not a bone, an
    /// out-of-range index.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // ========================================================================
    // Unsupported Features
    // ========================================================================
    /// A feature with no recovery path: TCB interpolation, quaternion-array
    /// rotation sampling. Surfaced as a hard error rather than silently
    /// producing partial data.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

/// Alias for `Result<T, ImportError>`.
pub type Result<T> = std::result::Result<T, ImportError>;
