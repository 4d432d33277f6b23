//! Errors surfaced by the generation API.
//!
//! Geometric rejections (an extrusion that would self-intersect, a hole that
//! cannot be dug) are *not* errors: they are normal control flow and are
//! signalled with `Option` so the generator can retry or fall back locally.
//! The variants here are programmer/input errors that must not be silently
//! swallowed.

use thiserror::Error;

/// All the ways cave generation can fail outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaveError {
    /// Two rings handed to the wall triangulation have different vertex counts.
    #[error("cannot triangulate between rings of {left} and {right} vertices")]
    MismatchedRingSizes { left: usize, right: usize },

    /// An append-only ring builder was pushed past its declared capacity.
    #[error("ring builder is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    /// A ring needs at least three vertices to bound a cross-section.
    #[error("ring with {size} vertices is too small")]
    RingTooSmall { size: usize },

    /// The gate polyline has fewer than three points or spans no area.
    #[error("gate polyline is degenerate")]
    DegenerateGate,
}
