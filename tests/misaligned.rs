//! Alignment contract: plans built on lane-aligned buffers reject
//! weaker-aligned views unless planned with the `Unaligned` flag.

use fftplan::{Complex64, Direction, FftEngine, FftError, Flags, Placement, PlanKey, Shape};

/// Transform length used for alignment tests.
const LEN: usize = 4;

/// Sample storage forced to the 16-byte lane alignment planners record.
#[repr(align(16))]
struct LaneAligned([Complex64; LEN]);

/// Scalar storage one element longer than the transform, also lane-aligned
/// so the offset view below has a known address.
#[repr(align(16))]
struct OffsetStorage([f64; 2 * LEN + 2]);

impl LaneAligned {
    fn zeroed() -> Self {
        Self([Complex64::zero(); LEN])
    }
}

/// View skipping one scalar into the storage: still element-aligned
/// (8 bytes), but below the 16-byte alignment recorded at planning time.
fn half_aligned_view(storage: &mut OffsetStorage) -> &mut [Complex64] {
    let ptr = unsafe { storage.0.as_mut_ptr().add(1) } as *mut Complex64;
    unsafe { core::slice::from_raw_parts_mut(ptr, LEN) }
}

fn build_plan(engine: &FftEngine<f64>, flags: Flags) -> std::sync::Arc<fftplan::Plan<f64>> {
    let shape = Shape::new_1d(LEN).unwrap();
    let key = PlanKey::new::<f64>(shape, Direction::Forward, flags, Placement::InPlace);
    let samples = LaneAligned::zeroed();
    engine
        .cache()
        .get_or_build(key, &samples.0, &samples.0)
        .unwrap()
}

#[test]
fn execute_detects_weaker_alignment_than_planned() {
    let engine = FftEngine::<f64>::default();
    let plan = build_plan(&engine, Flags::estimate());

    let mut storage = OffsetStorage([0.0; 2 * LEN + 2]);
    let data = half_aligned_view(&mut storage);
    assert_eq!(
        plan.execute_in_place(data),
        Err(FftError::AlignmentViolation)
    );
}

#[test]
fn unaligned_flag_accepts_weaker_alignment() {
    let engine = FftEngine::<f64>::default();
    let flags = Flags::builder().unaligned().build().unwrap();
    let plan = build_plan(&engine, flags);

    let mut storage = OffsetStorage([0.0; 2 * LEN + 2]);
    let data = half_aligned_view(&mut storage);
    // impulse in, flat spectrum out, through the offset view
    data[0] = Complex64::new(1.0, 0.0);
    plan.execute_in_place(data).unwrap();
    for c in data.iter() {
        assert!((c.re - 1.0).abs() < 1e-12);
        assert!(c.im.abs() < 1e-12);
    }
}

#[test]
fn lane_aligned_buffers_pass_the_check() {
    let engine = FftEngine::<f64>::default();
    let plan = build_plan(&engine, Flags::estimate());
    let mut buf = LaneAligned::zeroed();
    buf.0[0] = Complex64::new(1.0, 0.0);
    plan.execute_in_place(&mut buf.0).unwrap();
    for c in &buf.0 {
        assert!((c.re - 1.0).abs() < 1e-12);
    }
}
