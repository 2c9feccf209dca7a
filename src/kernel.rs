//! The native kernel capability boundary.
//!
//! Everything numerical sits behind [`Kernel`]: the planner-facing side that
//! turns a (shape, direction, flags) description into a built [`KernelPlan`].
//! A built plan is executed any number of times and releases its native
//! resources exactly once, when the owning `Box` is dropped. The crate ships
//! [`crate::dft::DftKernel`] as a pure-Rust reference backend; FFI-backed
//! kernels implement the same two traits.

use alloc::boxed::Box;

use crate::flags::Flags;
use crate::num::{Complex, Float};
use crate::shape::Shape;

/// Errors surfaced by planning, caching, and execution.
///
/// Construction-time failures (`InvalidShape`, `ConflictingFlags`) never
/// reach a kernel. `PlanningFailed` carries the backend's diagnostic code
/// verbatim; retrying an identical build is expected to fail identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    InvalidShape,
    ConflictingFlags,
    PlanningFailed(i32),
    ShapeMismatch,
    AliasingViolation,
    AlignmentViolation,
    UseAfterDestroy,
    CacheCapacityExceeded,
}

impl core::fmt::Display for FftError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FftError::InvalidShape => write!(f, "invalid transform shape"),
            FftError::ConflictingFlags => write!(f, "conflicting planner flags"),
            FftError::PlanningFailed(code) => {
                write!(f, "kernel planning failed (code {code})")
            }
            FftError::ShapeMismatch => write!(f, "buffer length does not match plan shape"),
            FftError::AliasingViolation => {
                write!(f, "buffer aliasing does not match plan placement")
            }
            FftError::AlignmentViolation => {
                write!(f, "buffer alignment weaker than planned")
            }
            FftError::UseAfterDestroy => write!(f, "plan was already destroyed"),
            FftError::CacheCapacityExceeded => {
                write!(f, "plan cache has zero capacity and cannot admit plans")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FftError {}

/// Sign of the transform exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Whether input and output denote the same storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    InPlace,
    OutOfPlace,
}

/// Scaling applied to the result after execution.
///
/// Kernels always produce unnormalized output; normalization is a separate
/// pass over the result buffer. `Full` on the backward leg of a round trip
/// (or `Sqrt` on both legs) restores the original signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Normalization {
    /// Raw kernel output.
    #[default]
    None,
    /// Divide by the square root of the element count (unitary transform).
    Sqrt,
    /// Divide by the element count.
    Full,
}

impl Normalization {
    /// Multiplicative factor applied to each output sample of a transform
    /// over `n` elements.
    pub fn factor<T: Float>(self, n: usize) -> T {
        let n = T::from_usize(n).unwrap_or_else(|| T::from_f32(n as f32));
        match self {
            Normalization::None => T::one(),
            Normalization::Sqrt => T::one() / n.sqrt(),
            Normalization::Full => T::one() / n,
        }
    }
}

/// Floating-point operation counts reported by a built plan.
///
/// `estimated_flops` is the planner's model prediction; `actual_flops`
/// counts the work the chosen algorithm really performs per execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost {
    pub estimated_flops: f64,
    pub actual_flops: f64,
}

/// Per-precision planner entry point.
///
/// `sample_in` and `sample_out` are representative buffers used only to
/// observe alignment and placement characteristics; the kernel must not
/// retain them. For in-place planning both samples may denote the same
/// storage.
pub trait Kernel<T: Float>: Send + Sync {
    fn plan(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        placement: Placement,
        sample_in: &[Complex<T>],
        sample_out: &[Complex<T>],
    ) -> Result<Box<dyn KernelPlan<T>>, FftError>;
}

/// A built native plan. Dropping the box is the single destruction point.
///
/// `execute` may be called concurrently from multiple threads; planning is
/// the only non-reentrant phase.
pub trait KernelPlan<T: Float>: Send + Sync {
    /// Out-of-place execution; `input` is left untouched.
    fn execute(&self, input: &[Complex<T>], output: &mut [Complex<T>]) -> Result<(), FftError>;
    /// In-place execution.
    fn execute_in_place(&self, buf: &mut [Complex<T>]) -> Result<(), FftError>;
    /// Operation counts recorded at planning time; no recomputation.
    fn cost(&self) -> Cost;
}
