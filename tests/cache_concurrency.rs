//! Concurrency contracts of the plan cache: single-flight building and
//! eviction safety for in-flight executions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use fftplan::dft::DftKernel;
use fftplan::{
    Complex64, Cost, Direction, FftEngine, FftError, Flags, Kernel, KernelPlan, Placement, Shape,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    ExecStart,
    ExecEnd,
    Destroy,
}

/// Reference kernel wrapped with build counting, configurable delays, and
/// an event log for observing the destroy ordering.
struct ObservedKernel {
    inner: DftKernel<f64>,
    builds: AtomicUsize,
    build_delay: Duration,
    exec_delay: Duration,
    events: Arc<Mutex<Vec<Event>>>,
}

impl ObservedKernel {
    fn new(build_delay: Duration, exec_delay: Duration) -> (Arc<Self>, Arc<Mutex<Vec<Event>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let kernel = Arc::new(Self {
            inner: DftKernel::new(),
            builds: AtomicUsize::new(0),
            build_delay,
            exec_delay,
            events: Arc::clone(&events),
        });
        (kernel, events)
    }
}

impl Kernel<f64> for ObservedKernel {
    fn plan(
        &self,
        shape: &Shape,
        direction: Direction,
        flags: Flags,
        placement: Placement,
        sample_in: &[Complex64],
        sample_out: &[Complex64],
    ) -> Result<Box<dyn KernelPlan<f64>>, FftError> {
        thread::sleep(self.build_delay);
        self.builds.fetch_add(1, Ordering::SeqCst);
        let inner = self
            .inner
            .plan(shape, direction, flags, placement, sample_in, sample_out)?;
        Ok(Box::new(ObservedPlan {
            inner,
            exec_delay: self.exec_delay,
            events: Arc::clone(&self.events),
        }))
    }
}

struct ObservedPlan {
    inner: Box<dyn KernelPlan<f64>>,
    exec_delay: Duration,
    events: Arc<Mutex<Vec<Event>>>,
}

impl ObservedPlan {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl KernelPlan<f64> for ObservedPlan {
    fn execute(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<(), FftError> {
        self.record(Event::ExecStart);
        thread::sleep(self.exec_delay);
        let result = self.inner.execute(input, output);
        self.record(Event::ExecEnd);
        result
    }

    fn execute_in_place(&self, buf: &mut [Complex64]) -> Result<(), FftError> {
        self.record(Event::ExecStart);
        thread::sleep(self.exec_delay);
        let result = self.inner.execute_in_place(buf);
        self.record(Event::ExecEnd);
        result
    }

    fn cost(&self) -> Cost {
        self.inner.cost()
    }
}

impl Drop for ObservedPlan {
    fn drop(&mut self) {
        self.record(Event::Destroy);
    }
}

/// Block until the worker's execution has actually begun.
fn wait_for_start(events: &Arc<Mutex<Vec<Event>>>) {
    while !events.lock().unwrap().contains(&Event::ExecStart) {
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn concurrent_misses_build_exactly_once() {
    let (kernel, _) = ObservedKernel::new(Duration::from_millis(50), Duration::ZERO);
    let engine = Arc::new(FftEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel<f64>>));
    let shape = Shape::new_1d(16).unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let shape = shape.clone();
        handles.push(thread::spawn(move || {
            engine
                .plan(
                    &shape,
                    Direction::Forward,
                    Flags::estimate(),
                    Placement::OutOfPlace,
                )
                .unwrap()
        }));
    }
    let plans: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(kernel.builds.load(Ordering::SeqCst), 1);
    for plan in &plans[1..] {
        assert!(Arc::ptr_eq(&plans[0], plan));
    }
}

#[test]
fn eviction_defers_destroy_until_execution_completes() {
    let (kernel, events) = ObservedKernel::new(Duration::ZERO, Duration::from_millis(150));
    let engine = Arc::new(FftEngine::with_capacity(
        Arc::clone(&kernel) as Arc<dyn Kernel<f64>>,
        1,
    ));
    let shape = Shape::new_1d(8).unwrap();
    let plan = engine
        .plan(
            &shape,
            Direction::Forward,
            Flags::estimate(),
            Placement::InPlace,
        )
        .unwrap();

    let worker = thread::spawn(move || {
        let mut buf = vec![Complex64::new(1.0, 0.0); 8];
        // holds the only outside Arc for the duration of the execution
        plan.execute_in_place(&mut buf).unwrap();
    });

    // let the execution begin, then force eviction from another caller
    wait_for_start(&events);
    let other = Shape::new_1d(4).unwrap();
    engine
        .plan(
            &other,
            Direction::Forward,
            Flags::estimate(),
            Placement::InPlace,
        )
        .unwrap();

    worker.join().unwrap();
    engine.shutdown();

    let log = events.lock().unwrap();
    let end = log.iter().position(|&e| e == Event::ExecEnd).unwrap();
    let destroy = log.iter().position(|&e| e == Event::Destroy).unwrap();
    assert!(
        destroy > end,
        "native destroy observed before execution completed: {log:?}"
    );
}

#[test]
fn shutdown_waits_for_in_flight_executions() {
    let (kernel, events) = ObservedKernel::new(Duration::ZERO, Duration::from_millis(120));
    let engine = Arc::new(FftEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel<f64>>));
    let shape = Shape::new_1d(8).unwrap();

    let runner = {
        let engine = Arc::clone(&engine);
        let shape = shape.clone();
        thread::spawn(move || {
            let input = vec![Complex64::new(1.0, 0.0); 8];
            let mut output = vec![Complex64::zero(); 8];
            engine.forward(&shape, &input, &mut output).unwrap();
        })
    };

    wait_for_start(&events);
    engine.shutdown();
    // clear() only returns after the in-flight execution drained
    {
        let log = events.lock().unwrap();
        assert!(log.contains(&Event::ExecEnd), "shutdown returned early: {log:?}");
    }
    runner.join().unwrap();
}
