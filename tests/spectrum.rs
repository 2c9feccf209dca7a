use fftplan::{Complex64, Direction, FftEngine, Flags, Normalization, Shape};

/// Tolerance appropriate for double precision at this length.
const TOLERANCE: f64 = 1e-9;

/// A real sinusoid at bin 1 over 8 samples concentrates its energy at
/// bins 1 and 7 (conjugate symmetry) and nowhere else.
#[test]
fn real_sinusoid_at_bin_one_has_conjugate_symmetric_peaks() {
    let engine = FftEngine::<f64>::default();
    let n = 8;
    let shape = Shape::new_1d(n).unwrap();
    let input: Vec<Complex64> = (0..n)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            Complex64::new(angle.cos(), 0.0)
        })
        .collect();
    let mut output = vec![Complex64::zero(); n];
    engine.forward(&shape, &input, &mut output).unwrap();

    let magnitude = |c: &Complex64| (c.re * c.re + c.im * c.im).sqrt();
    // cos splits evenly: n/2 at bin 1 and bin n-1
    assert!((magnitude(&output[1]) - n as f64 / 2.0).abs() < TOLERANCE);
    assert!((magnitude(&output[7]) - n as f64 / 2.0).abs() < TOLERANCE);
    for (i, c) in output.iter().enumerate() {
        if i != 1 && i != 7 {
            assert!(magnitude(c) < TOLERANCE, "unexpected energy at bin {i}");
        }
    }
}

/// The DC bin of an all-ones signal equals the element count
/// (unnormalized convention).
#[test]
fn dc_bin_equals_element_count() {
    let engine = FftEngine::<f64>::default();
    let shape = Shape::new(&[4, 4]).unwrap();
    let input = vec![Complex64::new(1.0, 0.0); 16];
    let mut output = vec![Complex64::zero(); 16];
    engine.forward(&shape, &input, &mut output).unwrap();
    assert!((output[0].re - 16.0).abs() < TOLERANCE);
    for c in &output[1..] {
        assert!(c.re.abs() < TOLERANCE && c.im.abs() < TOLERANCE);
    }
}

fn dc_bin_under(normalization: Normalization) -> f64 {
    let engine = FftEngine::<f64>::default();
    let shape = Shape::new(&[8, 8]).unwrap();
    let input = vec![Complex64::new(1.0, 0.0); 64];
    let mut output = vec![Complex64::zero(); 64];
    engine
        .transform_normalized(
            &shape,
            Direction::Forward,
            Flags::estimate(),
            normalization,
            &input,
            &mut output,
        )
        .unwrap();
    output[0].re
}

#[test]
fn no_normalization_leaves_the_raw_dc_bin() {
    assert!((dc_bin_under(Normalization::None) - 64.0).abs() < TOLERANCE);
}

#[test]
fn full_normalization_divides_by_the_element_count() {
    assert!((dc_bin_under(Normalization::Full) - 1.0).abs() < TOLERANCE);
}

#[test]
fn sqrt_normalization_divides_by_the_root_of_the_element_count() {
    assert!((dc_bin_under(Normalization::Sqrt) - 8.0).abs() < TOLERANCE);
}

#[test]
fn in_place_full_normalization_matches_out_of_place() {
    let engine = FftEngine::<f64>::default();
    let shape = Shape::new(&[8, 8]).unwrap();
    let mut buf = vec![Complex64::new(1.0, 0.0); 64];
    engine
        .transform_in_place_normalized(
            &shape,
            Direction::Forward,
            Flags::estimate(),
            Normalization::Full,
            &mut buf,
        )
        .unwrap();
    assert!((buf[0].re - 1.0).abs() < TOLERANCE);
    for c in &buf[1..] {
        assert!(c.re.abs() < TOLERANCE && c.im.abs() < TOLERANCE);
    }
}
