use criterion::{Criterion, black_box, criterion_group, criterion_main};
use weigh_core::{Classifier, Detector, LineSession, WeightLimits};

/// Deterministic pseudo-noise around 65 kg, cheap enough to not dominate the
/// measurement.
fn jittered(i: u64) -> f64 {
    65.0 + (i.wrapping_mul(2_654_435_761) % 9) as f64 * 0.01 - 0.04
}

fn bench_observe(c: &mut Criterion) {
    let det = Detector::default();
    c.bench_function("detector_observe_steady", |b| {
        let mut s = LineSession::new();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            black_box(det.observe(&mut s, jittered(i), i * 200));
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let det = Detector::default();
    let classifier = Classifier::default();
    let limits = WeightLimits::new(59.74, 85.0);
    let mut s = LineSession::new();
    let panel = {
        let mut last = det.observe(&mut s, 65.0, 0);
        for i in 1..4u64 {
            last = det.observe(&mut s, 65.0, i * 200);
        }
        last
    };
    c.bench_function("classifier_eligibility", |b| {
        b.iter(|| black_box(classifier.eligibility(&panel, Some(limits))));
    });
}

criterion_group!(benches, bench_observe, bench_classify);
criterion_main!(benches);
