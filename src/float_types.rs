//! Scalar type selection and numeric tolerances.

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Tolerance used by the geometric predicates across the crate.
#[cfg(feature = "f32")]
pub const EPSILON: Real = 1e-4;
#[cfg(feature = "f64")]
pub const EPSILON: Real = 1e-9;

#[cfg(feature = "f32")]
pub const PI: Real = core::f32::consts::PI;
#[cfg(feature = "f64")]
pub const PI: Real = core::f64::consts::PI;
