//! Built-in reference kernel.
//!
//! [`DftKernel`] is a pure-Rust backend for the [`Kernel`] capability:
//! iterative radix-2 Cooley–Tukey for power-of-two lengths and Bluestein's
//! chirp-z algorithm for everything else, applied axis by axis with the
//! row-column algorithm for rank > 1. Twiddle and chirp tables are computed
//! once at planning time and owned by the built plan, so execution is pure
//! and reentrant.
//!
//! Wisdom here is simply the set of line lengths the kernel has planned
//! before; a `WisdomOnly` request for an unseen length fails with
//! [`FftError::PlanningFailed`]`(`[`NO_WISDOM`]`)`.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::flags::Flags;
use crate::kernel::{Cost, Direction, FftError, Kernel, KernelPlan, Placement};
use crate::num::{Complex, Float};
use crate::shape::Shape;

/// Diagnostic code: `WisdomOnly` was requested but no wisdom covers the shape.
pub const NO_WISDOM: i32 = -1;
/// Diagnostic code: sample buffer lengths disagree with the shape.
pub const BAD_SAMPLE_BUFFERS: i32 = -2;

fn usize_to_float<T: Float>(x: usize) -> T {
    T::from_usize(x).unwrap_or_else(|| T::from_f32(x as f32))
}

/// `i² mod 2n` with the square taken in `u128` so the reduction stays exact
/// for line lengths near the allocation limit.
fn chirp_phase_index(i: usize, n: usize) -> usize {
    let m = 2 * n as u128;
    let r = i as u128 % m;
    ((r * r) % m) as usize
}

/// Iterative radix-2 line transform with per-stage twiddle tables.
///
/// The table for stage size `len` has `len/2` entries `exp(-2πi k / len)`,
/// generated by rotation recurrence.
struct Radix2Line<T: Float> {
    n: usize,
    twiddles: Vec<Vec<Complex<T>>>,
}

impl<T: Float> Radix2Line<T> {
    fn new(n: usize) -> Self {
        debug_assert!(n.is_power_of_two());
        let mut twiddles = Vec::new();
        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let angle = -T::from_f32(2.0) * T::pi() / usize_to_float::<T>(len);
            let (sin_step, cos_step) = angle.sin_cos();
            let mut table = Vec::with_capacity(half);
            let mut w_re = T::one();
            let mut w_im = T::zero();
            for _ in 0..half {
                table.push(Complex::new(w_re, w_im));
                let tmp = w_re;
                w_re = w_re.mul_add(cos_step, -(w_im * sin_step));
                w_im = w_im.mul_add(cos_step, tmp * sin_step);
            }
            twiddles.push(table);
            len *= 2;
        }
        Self { n, twiddles }
    }

    /// Forward DFT of one line, in place, unnormalized.
    fn execute(&self, buf: &mut [Complex<T>]) {
        let n = self.n;
        debug_assert_eq!(buf.len(), n);
        if n < 2 {
            return;
        }
        // bit-reversal permutation
        let mut j = 0usize;
        for i in 1..n {
            let mut bit = n >> 1;
            while j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j |= bit;
            if i < j {
                buf.swap(i, j);
            }
        }
        for table in &self.twiddles {
            let half = table.len();
            let len = half * 2;
            let mut base = 0;
            while base < n {
                for k in 0..half {
                    let t = buf[base + k + half].mul(table[k]);
                    let u = buf[base + k];
                    buf[base + k] = u.add(t);
                    buf[base + k + half] = u.sub(t);
                }
                base += len;
            }
        }
    }

    /// Exact butterfly flop count for one execution of this line.
    fn flops(&self) -> f64 {
        // log2(n) stages, n/2 butterflies each, 10 flops per butterfly
        5.0 * self.n as f64 * self.twiddles.len() as f64
    }
}

/// Bluestein chirp-z line transform for arbitrary lengths.
///
/// Convolution is carried out by a padded power-of-two FFT of size `m`;
/// the chirp and the transformed kernel `b_fft` are precomputed.
struct BluesteinLine<T: Float> {
    n: usize,
    chirp: Vec<Complex<T>>,
    b_fft: Vec<Complex<T>>,
    inner: Radix2Line<T>,
}

impl<T: Float> BluesteinLine<T> {
    fn new(n: usize) -> Self {
        let m = (2 * n - 1).next_power_of_two();
        let mut chirp = Vec::with_capacity(n);
        let mut b = vec![Complex::zero(); m];
        for i in 0..n {
            // reduce i^2 mod 2n before the float conversion to keep the
            // phase argument small and exact
            let k = chirp_phase_index(i, n);
            let angle = T::pi() * usize_to_float::<T>(k) / usize_to_float::<T>(n);
            chirp.push(Complex::expi(-angle));
            b[i] = Complex::expi(angle);
        }
        for i in 1..n {
            b[m - i] = b[i];
        }
        let inner = Radix2Line::new(m);
        inner.execute(&mut b);
        Self {
            n,
            chirp,
            b_fft: b,
            inner,
        }
    }

    fn execute(&self, line: &mut [Complex<T>]) {
        let n = self.n;
        let m = self.b_fft.len();
        let mut a = Vec::with_capacity(m);
        for (x, &c) in line.iter().zip(self.chirp.iter()) {
            a.push(x.mul(c));
        }
        a.resize(m, Complex::zero());
        self.inner.execute(&mut a);
        for (ai, &bi) in a.iter_mut().zip(self.b_fft.iter()) {
            *ai = ai.mul(bi);
        }
        // inverse convolution FFT via conjugation, scaled by 1/m
        for c in a.iter_mut() {
            c.im = -c.im;
        }
        self.inner.execute(&mut a);
        let scale = T::one() / usize_to_float::<T>(m);
        for c in a.iter_mut() {
            c.im = -c.im;
            *c = c.scale(scale);
        }
        for (out, (ai, &ci)) in line.iter_mut().zip(a.iter().zip(self.chirp.iter())) {
            *out = ai.mul(ci);
        }
    }

    fn flops(&self) -> f64 {
        let n = self.n as f64;
        let m = self.b_fft.len() as f64;
        // three inner FFTs plus the chirp and kernel pointwise products
        3.0 * self.inner.flops() + 6.0 * (2.0 * n + m) + 2.0 * m
    }
}

enum LinePlan<T: Float> {
    Radix2(Radix2Line<T>),
    Bluestein(BluesteinLine<T>),
}

impl<T: Float> LinePlan<T> {
    fn new(n: usize) -> Self {
        if n.is_power_of_two() {
            LinePlan::Radix2(Radix2Line::new(n))
        } else {
            LinePlan::Bluestein(BluesteinLine::new(n))
        }
    }

    fn execute(&self, line: &mut [Complex<T>]) {
        match self {
            LinePlan::Radix2(r) => r.execute(line),
            LinePlan::Bluestein(b) => b.execute(line),
        }
    }

    fn flops(&self) -> f64 {
        match self {
            LinePlan::Radix2(r) => r.flops(),
            LinePlan::Bluestein(b) => b.flops(),
        }
    }
}

struct AxisPass<T: Float> {
    len: usize,
    stride: usize,
    line: Arc<LinePlan<T>>,
}

/// A built reference plan: one [`AxisPass`] per dimension plus the cost
/// model recorded at planning time.
struct DftPlan<T: Float> {
    total: usize,
    direction: Direction,
    passes: Vec<AxisPass<T>>,
    cost: Cost,
}

impl<T: Float> DftPlan<T> {
    fn run(&self, data: &mut [Complex<T>]) {
        if self.direction == Direction::Backward {
            for c in data.iter_mut() {
                c.im = -c.im;
            }
        }
        for pass in &self.passes {
            let block = pass.len * pass.stride;
            let mut line = vec![Complex::zero(); pass.len];
            let mut base_block = 0;
            while base_block < self.total {
                for offset in 0..pass.stride {
                    let base = base_block + offset;
                    for (j, slot) in line.iter_mut().enumerate() {
                        *slot = data[base + j * pass.stride];
                    }
                    pass.line.execute(&mut line);
                    for (j, &value) in line.iter().enumerate() {
                        data[base + j * pass.stride] = value;
                    }
                }
                base_block += block;
            }
        }
        if self.direction == Direction::Backward {
            for c in data.iter_mut() {
                c.im = -c.im;
            }
        }
    }
}

impl<T: Float> KernelPlan<T> for DftPlan<T> {
    fn execute(&self, input: &[Complex<T>], output: &mut [Complex<T>]) -> Result<(), FftError> {
        if input.len() != self.total || output.len() != self.total {
            return Err(FftError::ShapeMismatch);
        }
        output.copy_from_slice(input);
        self.run(output);
        Ok(())
    }

    fn execute_in_place(&self, buf: &mut [Complex<T>]) -> Result<(), FftError> {
        if buf.len() != self.total {
            return Err(FftError::ShapeMismatch);
        }
        self.run(buf);
        Ok(())
    }

    fn cost(&self) -> Cost {
        self.cost
    }
}

/// Pure-Rust reference backend for the [`Kernel`] capability.
pub struct DftKernel<T: Float> {
    #[cfg(feature = "std")]
    wisdom: std::sync::Mutex<hashbrown::HashSet<usize>>,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T: Float> Default for DftKernel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> DftKernel<T> {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "std")]
            wisdom: std::sync::Mutex::new(hashbrown::HashSet::new()),
            _marker: core::marker::PhantomData,
        }
    }

    /// Whether wisdom already covers every line length of `shape`.
    #[cfg(feature = "std")]
    fn has_wisdom(&self, shape: &Shape) -> bool {
        let wisdom = match self.wisdom.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        shape.extents().iter().all(|len| wisdom.contains(len))
    }

    #[cfg(feature = "std")]
    fn record_wisdom(&self, shape: &Shape) {
        let mut wisdom = match self.wisdom.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for &len in shape.extents() {
            wisdom.insert(len);
        }
    }
}

impl<T: Float> Kernel<T> for DftKernel<T> {
    fn plan(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        _placement: Placement,
        sample_in: &[Complex<T>],
        sample_out: &[Complex<T>],
    ) -> Result<Box<dyn KernelPlan<T>>, FftError> {
        let total = shape.len();
        if sample_in.len() != total || sample_out.len() != total {
            return Err(FftError::PlanningFailed(BAD_SAMPLE_BUFFERS));
        }
        if flags.wisdom_only() {
            #[cfg(feature = "std")]
            if !self.has_wisdom(shape) {
                return Err(FftError::PlanningFailed(NO_WISDOM));
            }
            #[cfg(not(feature = "std"))]
            return Err(FftError::PlanningFailed(NO_WISDOM));
        }

        let mut passes: Vec<AxisPass<T>> = Vec::with_capacity(shape.rank());
        let mut estimated = 0.0_f64;
        let mut actual = 0.0_f64;
        for axis in 0..shape.rank() {
            let len = shape.extents()[axis];
            let line = passes
                .iter()
                .find(|p| p.len == len)
                .map(|p| Arc::clone(&p.line))
                .unwrap_or_else(|| Arc::new(LinePlan::new(len)));
            let lines = (total / len) as f64;
            estimated += total as f64 * 5.0 * libm::log2(len as f64);
            actual += lines * line.flops();
            passes.push(AxisPass {
                len,
                stride: shape.stride(axis),
                line,
            });
        }

        #[cfg(feature = "std")]
        self.record_wisdom(shape);

        crate::vlog!(
            "dft: planned shape {:?} direction {:?} effort {:?}",
            shape.extents(),
            direction,
            flags.effort()
        );

        Ok(Box::new(DftPlan {
            total,
            direction,
            passes,
            cost: Cost {
                estimated_flops: estimated,
                actual_flops: actual,
            },
        }))
    }
}
