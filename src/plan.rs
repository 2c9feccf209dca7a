//! Built plans and their lifecycle.
//!
//! A [`Plan`] wraps one built [`KernelPlan`] together with the key it was
//! built for. It is always observed in the `Built` state (an unbuilt plan is
//! unrepresentable); [`Plan::retire`] moves it to `Retired`, after which new
//! executions fail with [`FftError::UseAfterDestroy`]. The native resource
//! itself is released when the last `Arc<Plan>` drops, so an execution that
//! was already in flight when its plan was evicted always completes against
//! live storage. [`Plan::wait_idle`] lets the cache drain in-flight
//! executions before teardown reports completion.

use alloc::boxed::Box;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use crate::flags::Flags;
use crate::kernel::{Cost, Direction, FftError, KernelPlan, Normalization, Placement};
use crate::num::{Complex, Float, Precision};
use crate::shape::Shape;

/// Composite identity of a plan: everything that makes two transforms
/// interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub precision: Precision,
    pub shape: Shape,
    pub direction: Direction,
    pub flags: Flags,
    pub placement: Placement,
}

impl PlanKey {
    pub fn new<T: Float>(
        shape: Shape,
        direction: Direction,
        flags: Flags,
        placement: Placement,
    ) -> Self {
        Self {
            precision: T::PRECISION,
            shape,
            direction,
            flags,
            placement,
        }
    }
}

/// Widest alignment a plan records from its sample buffers: the 16-byte
/// vector lane width kernels commonly specialize for. Execution buffers
/// must be at least as aligned as the recorded value.
pub(crate) const MAX_PLANNED_ALIGN: usize = 16;

/// Largest power-of-two divisor of a slice's base address, capped at 64
/// bytes (the widest alignment planners distinguish).
pub(crate) fn slice_alignment<T: Float>(buf: &[Complex<T>]) -> usize {
    let addr = buf.as_ptr() as usize;
    if addr == 0 {
        return 64;
    }
    1usize << addr.trailing_zeros().min(6)
}

/// A built, reusable transform plan for a fixed key.
pub struct Plan<T: Float> {
    key: PlanKey,
    inner: Box<dyn KernelPlan<T>>,
    /// Alignment in bytes assumed at planning time; 1 when the plan was
    /// built with the `Unaligned` flag.
    align: usize,
    in_flight: AtomicUsize,
    retired: AtomicBool,
    idle_lock: Mutex<()>,
    idle_cv: Condvar,
}

impl<T: Float> core::fmt::Debug for Plan<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Plan")
            .field("key", &self.key)
            .field("align", &self.align)
            .field("retired", &self.retired)
            .finish_non_exhaustive()
    }
}

impl<T: Float> Plan<T> {
    pub(crate) fn new(key: PlanKey, inner: Box<dyn KernelPlan<T>>, align: usize) -> Self {
        Self {
            key,
            inner,
            align,
            in_flight: AtomicUsize::new(0),
            retired: AtomicBool::new(false),
            idle_lock: Mutex::new(()),
            idle_cv: Condvar::new(),
        }
    }

    pub fn key(&self) -> &PlanKey {
        &self.key
    }
    pub fn shape(&self) -> &Shape {
        &self.key.shape
    }
    pub fn direction(&self) -> Direction {
        self.key.direction
    }
    pub fn flags(&self) -> Flags {
        self.key.flags
    }
    pub fn placement(&self) -> Placement {
        self.key.placement
    }

    /// Operation counts recorded by the kernel at planning time.
    pub fn cost(&self) -> Result<Cost, FftError> {
        if self.retired.load(Ordering::Acquire) {
            return Err(FftError::UseAfterDestroy);
        }
        Ok(self.inner.cost())
    }

    /// Number of executions currently running against this plan.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Out-of-place execution. The plan must have been built for
    /// [`Placement::OutOfPlace`].
    pub fn execute(&self, input: &[Complex<T>], output: &mut [Complex<T>]) -> Result<(), FftError> {
        self.execute_normalized(input, output, Normalization::None)
    }

    /// Out-of-place execution with the result scaled by `normalization`.
    pub fn execute_normalized(
        &self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
        normalization: Normalization,
    ) -> Result<(), FftError> {
        let _guard = self.begin()?;
        if self.key.placement != Placement::OutOfPlace {
            return Err(FftError::AliasingViolation);
        }
        self.check_len(input.len())?;
        self.check_len(output.len())?;
        self.check_alignment(input)?;
        self.check_alignment(output)?;
        self.inner.execute(input, output)?;
        self.normalize(output, normalization);
        Ok(())
    }

    /// In-place execution. The plan must have been built for
    /// [`Placement::InPlace`].
    pub fn execute_in_place(&self, buf: &mut [Complex<T>]) -> Result<(), FftError> {
        self.execute_in_place_normalized(buf, Normalization::None)
    }

    /// In-place execution with the result scaled by `normalization`.
    pub fn execute_in_place_normalized(
        &self,
        buf: &mut [Complex<T>],
        normalization: Normalization,
    ) -> Result<(), FftError> {
        let _guard = self.begin()?;
        if self.key.placement != Placement::InPlace {
            return Err(FftError::AliasingViolation);
        }
        self.check_len(buf.len())?;
        self.check_alignment(buf)?;
        self.inner.execute_in_place(buf)?;
        self.normalize(buf, normalization);
        Ok(())
    }

    fn normalize(&self, buf: &mut [Complex<T>], normalization: Normalization) {
        if normalization == Normalization::None {
            return;
        }
        let factor = normalization.factor::<T>(self.key.shape.len());
        for c in buf.iter_mut() {
            *c = c.scale(factor);
        }
    }

    fn check_len(&self, len: usize) -> Result<(), FftError> {
        if len != self.key.shape.len() {
            return Err(FftError::ShapeMismatch);
        }
        Ok(())
    }

    fn check_alignment(&self, buf: &[Complex<T>]) -> Result<(), FftError> {
        if slice_alignment(buf) < self.align {
            return Err(FftError::AlignmentViolation);
        }
        Ok(())
    }

    fn begin(&self) -> Result<ExecGuard<'_, T>, FftError> {
        if self.retired.load(Ordering::Acquire) {
            return Err(FftError::UseAfterDestroy);
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        // close the race with a retire that landed between the check and
        // the increment
        if self.retired.load(Ordering::Acquire) {
            self.finish();
            return Err(FftError::UseAfterDestroy);
        }
        Ok(ExecGuard { plan: self })
    }

    fn finish(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _held = match self.idle_lock.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            self.idle_cv.notify_all();
        }
    }

    /// Refuse new executions. Already-running executions are unaffected.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    /// Block until every in-flight execution has completed.
    pub(crate) fn wait_idle(&self) {
        let mut held = match self.idle_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while self.in_flight.load(Ordering::Acquire) > 0 {
            held = match self.idle_cv.wait(held) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}

struct ExecGuard<'a, T: Float> {
    plan: &'a Plan<T>,
}

impl<T: Float> Drop for ExecGuard<'_, T> {
    fn drop(&mut self) {
        self.plan.finish();
    }
}
