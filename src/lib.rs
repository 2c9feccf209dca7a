//! # fftplan - plan-and-execute engine for discrete Fourier transforms
//!
//! Callers describe a transform (shape, direction, precision, planner
//! flags), obtain a reusable [`Plan`] from a bounded LRU [`PlanCache`], and
//! execute it repeatedly against their own buffers. Numerical kernels sit
//! behind the [`kernel::Kernel`] capability trait; the crate ships a
//! pure-Rust reference backend ([`dft::DftKernel`]) so the engine works out
//! of the box, and FFI-backed kernels plug in through the same trait.
//!
//! ## Features
//!
//! - **Reusable plans**: expensive planning runs once per
//!   (precision, shape, direction, flags, placement) key
//! - **Bounded plan cache**: LRU eviction caps native resource consumption;
//!   eviction never destroys a plan mid-execution
//! - **Single-flight planning**: concurrent misses on one key collapse into
//!   one kernel build
//! - **FFTW-style flags**: effort levels, wisdom-only planning, input
//!   preservation and alignment hints, validated at construction
//! - **Optional result normalization**: raw, `1/sqrt(N)` (unitary), or
//!   `1/N` scaling applied after execution
//! - **no_std core**: shapes, flags, and the reference kernel work with
//!   `alloc` alone; the cache and engine need the `std` feature
//!
//! ## Cargo Features
//!
//! - `std` (default): enable the plan cache and [`FftEngine`]
//! - `verbose-logging`: debug-level records of cache traffic and planning
//!
//! ## Example
//!
//! ```
//! use fftplan::{Complex64, FftEngine, Shape};
//!
//! let engine = FftEngine::<f64>::default();
//! let shape = Shape::new_1d(8).unwrap();
//! let input = vec![Complex64::new(1.0, 0.0); 8];
//! let mut output = vec![Complex64::zero(); 8];
//! engine.forward(&shape, &input, &mut output).unwrap();
//! assert!((output[0].re - 8.0).abs() < 1e-12);
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0
//! - MIT license
//!
//! at your option.

#![no_std]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Debug-level planner/cache tracing, compiled out without the
/// `verbose-logging` feature.
#[cfg(feature = "verbose-logging")]
macro_rules! vlog {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}
#[cfg(not(feature = "verbose-logging"))]
macro_rules! vlog {
    ($($arg:tt)*) => {{}};
}
pub(crate) use vlog;

pub mod num;

/// Validated transform shapes (rank, extents, element count).
pub mod shape;

/// Planner directives: effort levels, wisdom restrictions, hints.
pub mod flags;

/// The kernel capability boundary and the shared error taxonomy.
pub mod kernel;

/// Built-in pure-Rust reference kernel (radix-2 + Bluestein, rank-N).
pub mod dft;

/// Built plans: lifecycle, validation, in-flight accounting.
#[cfg(feature = "std")]
pub mod plan;

/// Bounded LRU plan cache with single-flight building.
#[cfg(feature = "std")]
pub mod cache;

/// Top-level transform façade.
#[cfg(feature = "std")]
pub mod engine;

pub use flags::{Effort, Flags};
pub use kernel::{Cost, Direction, FftError, Kernel, KernelPlan, Normalization, Placement};
pub use num::{Complex, Complex32, Complex64, Float, Precision};
pub use shape::Shape;

#[cfg(feature = "std")]
pub use cache::PlanCache;
#[cfg(feature = "std")]
pub use engine::{FftEngine, DEFAULT_CACHE_CAPACITY};
#[cfg(feature = "std")]
pub use plan::{Plan, PlanKey};
