//! Top-level transform façade.
//!
//! [`FftEngine`] composes a kernel, the plan cache, and the validation
//! rules: callers describe a transform with a [`Shape`], a [`Direction`]
//! and [`Flags`], hand over buffers, and the engine finds or builds the
//! matching plan and executes it. Placement is derived from the entry
//! point: `transform` is out-of-place (the borrow rules already guarantee
//! disjoint buffers), `transform_in_place` is in-place. Results are
//! unnormalized unless a [`Normalization`] is requested through the
//! `*_normalized` variants. Shutting the engine
//! down clears the cache and drains in-flight executions first; dropping
//! the engine shuts it down implicitly.

use alloc::sync::Arc;

use crate::cache::PlanCache;
use crate::dft::DftKernel;
use crate::flags::Flags;
use crate::kernel::{Direction, FftError, Kernel, Normalization, Placement};
use crate::num::{zero_buffer, Complex, Float};
use crate::plan::{Plan, PlanKey};
use crate::shape::Shape;

/// Default number of live plans the cache retains.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Plan-and-execute engine for one element precision.
pub struct FftEngine<T: Float> {
    cache: PlanCache<T>,
}

impl<T: Float> Default for FftEngine<T> {
    /// Engine backed by the built-in reference kernel.
    fn default() -> Self {
        Self::new(Arc::new(DftKernel::new()))
    }
}

impl<T: Float> FftEngine<T> {
    pub fn new(kernel: Arc<dyn Kernel<T>>) -> Self {
        Self::with_capacity(kernel, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(kernel: Arc<dyn Kernel<T>>, capacity: usize) -> Self {
        Self {
            cache: PlanCache::new(kernel, capacity),
        }
    }

    pub fn cache(&self) -> &PlanCache<T> {
        &self.cache
    }

    /// Find or build the plan for an explicit key, without executing.
    ///
    /// Planning probes a zeroed representative buffer; the returned plan is
    /// shared with the cache and stays valid until evicted or shut down.
    pub fn plan(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        placement: Placement,
    ) -> Result<Arc<Plan<T>>, FftError> {
        let probe = zero_buffer::<T>(shape.len());
        let key = PlanKey::new::<T>(shape.clone(), direction, flags, placement);
        self.cache.get_or_build(key, &probe, &probe)
    }

    /// Out-of-place transform of `input` into `output`.
    ///
    /// Both buffers must hold exactly `shape.len()` elements. The output is
    /// unnormalized; a Forward/Backward round trip scales by the element
    /// count. Use [`transform_normalized`] to scale the result.
    ///
    /// [`transform_normalized`]: FftEngine::transform_normalized
    pub fn transform(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        self.transform_normalized(shape, direction, flags, Normalization::None, input, output)
    }

    /// Out-of-place transform with the result scaled by `normalization`.
    pub fn transform_normalized(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        normalization: Normalization,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if input.len() != shape.len() || output.len() != shape.len() {
            return Err(FftError::ShapeMismatch);
        }
        let key = PlanKey::new::<T>(shape.clone(), direction, flags, Placement::OutOfPlace);
        let plan = self.cache.get_or_build(key, input, output)?;
        plan.execute_normalized(input, output, normalization)
    }

    /// In-place transform of `buf`.
    pub fn transform_in_place(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        buf: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        self.transform_in_place_normalized(shape, direction, flags, Normalization::None, buf)
    }

    /// In-place transform with the result scaled by `normalization`.
    pub fn transform_in_place_normalized(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        normalization: Normalization,
        buf: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if buf.len() != shape.len() {
            return Err(FftError::ShapeMismatch);
        }
        let key = PlanKey::new::<T>(shape.clone(), direction, flags, Placement::InPlace);
        let plan = self.cache.get_or_build(key, buf, buf)?;
        plan.execute_in_place_normalized(buf, normalization)
    }

    /// Forward transform with default (`Estimate`) flags.
    pub fn forward(
        &self,
        shape: &Shape,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        self.transform(shape, Direction::Forward, Flags::estimate(), input, output)
    }

    /// Backward transform with default (`Estimate`) flags, unnormalized.
    pub fn backward(
        &self,
        shape: &Shape,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        self.transform(shape, Direction::Backward, Flags::estimate(), input, output)
    }

    /// Retire every cached plan, draining in-flight executions first.
    pub fn shutdown(&self) {
        crate::vlog!("engine: shutdown");
        self.cache.clear();
    }
}

impl<T: Float> Drop for FftEngine<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
