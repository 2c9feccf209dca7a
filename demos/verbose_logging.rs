//! Demonstrates enabling verbose logging for fftplan.
use fftplan::{Complex64, FftEngine, Shape};

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let engine = FftEngine::<f64>::default();
    let shape = Shape::new(&[8, 8]).unwrap();
    let input = vec![Complex64::new(1.0, 0.0); shape.len()];
    let mut output = vec![Complex64::zero(); shape.len()];

    // first call logs the miss and the kernel planning, second one the hit
    engine.forward(&shape, &input, &mut output).unwrap();
    engine.forward(&shape, &input, &mut output).unwrap();

    println!("dc bin = {:.1}", output[0].re);
    engine.shutdown();
}
