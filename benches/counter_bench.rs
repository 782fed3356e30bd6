use criterion::{black_box, criterion_group, criterion_main, Criterion};
use single_thread_shared_ptr::Counter;

fn bench_counter(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter");
    group.bench_function("owning_release", |b| {
        b.iter(|| {
            let mut c = Counter::owning();
            black_box(c.is_sole_owner());
            c.release();
        })
    });
    group.bench_function("promote_release", |b| {
        let base = Counter::owning();
        b.iter(|| {
            let mut copy = base.try_copy().unwrap();
            black_box(copy.count());
            copy.release();
            black_box(base.count());
        })
    });
    group.bench_function("shared_copy_release", |b| {
        let base = Counter::owning();
        let _keep = base.clone();
        b.iter(|| {
            let mut copy = base.try_copy().unwrap();
            black_box(copy.count());
            copy.release();
        })
    });
    group.bench_function("swap", |b| {
        let mut a = Counter::owning();
        let mut e = Counter::empty();
        b.iter(|| {
            a.swap(&mut e);
            black_box(&a);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_counter);
criterion_main!(benches);
