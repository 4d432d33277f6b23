//! Procedural generation of cave systems as renderable triangle meshes.
//!
//! A cave starts from a *gate* (a user-supplied closed polyline) and grows by
//! repeatedly extruding the current cross-section ring: each step offsets the
//! ring along a scheduled direction and distance, optionally scaling and
//! rotating it, and stitches the two rings into inside-facing wall quads.
//! Tunnels fork by digging *holes* in their walls, each hole seeding a new
//! branch; a coarse bounding-box test keeps branches from running through one
//! another. Stalagmites, stalactites, pillars and point-light positions are
//! grown along the way.
//!
//! ```no_run
//! use cavegen::{CaveConfig, generate_cave};
//! use nalgebra::Point3;
//!
//! let gate: Vec<Point3<cavegen::Real>> = (0..8)
//!     .map(|i| {
//!         let a = i as cavegen::Real / 8.0 * 2.0 * cavegen::float_types::PI;
//!         Point3::new(a.cos() * 3.0, a.sin() * 3.0, 0.0)
//!     })
//!     .collect();
//! let cave = generate_cave(&gate, CaveConfig::default(), 42).unwrap();
//! println!("{} tunnels, {} lights", cave.tunnels.len(), cave.lights.len());
//! ```
//!
//! All geometry is `f32` by default; enable the `f64` feature (and disable
//! `f32`) for double precision.

#![forbid(unsafe_code)]

#[cfg(all(feature = "f64", feature = "f32"))]
compile_error!("Features f64 and f32 are mutually exclusive");

#[cfg(not(any(feature = "f64", feature = "f32")))]
compile_error!("Either feature f64 or f32 must be enabled");

pub mod config;
pub mod decision;
pub mod errors;
pub mod float_types;
pub mod generator;
pub mod geometry;
pub mod intersections;
pub mod mesh;
pub mod ops;

pub use config::{Cadence, CaveConfig, HolePolicy, Strategy};
pub use errors::CaveError;
pub use float_types::Real;
pub use generator::{CaveGenerator, CaveOutput, StepObserver, generate_cave};
pub use mesh::{CaveMesh, MeshBuffers};
