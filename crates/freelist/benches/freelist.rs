//! Free list benchmarks
//!
//! Compares the release disciplines and a mutex-guarded `Vec` baseline,
//! single-threaded and under contention.

use std::hint::black_box;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use nebula_freelist::{FreeList, FreeListConfig};

const CAPACITY: usize = 1024;
const OPS_PER_THREAD: u64 = 10_000;

/// Mutex-guarded stack with the same bump-then-reuse policy.
struct MutexIndexAllocator {
    next: Mutex<(usize, Vec<usize>)>,
}

impl MutexIndexAllocator {
    fn new() -> Self {
        Self {
            next: Mutex::new((0, Vec::with_capacity(CAPACITY))),
        }
    }

    fn acquire(&self) -> Option<usize> {
        let mut guard = self.next.lock().unwrap();
        if let Some(index) = guard.1.pop() {
            return Some(index);
        }
        (guard.0 < CAPACITY).then(|| {
            guard.0 += 1;
            guard.0 - 1
        })
    }

    fn release(&self, index: usize) {
        self.next.lock().unwrap().1.push(index);
    }
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push_unsafe", |b| {
        let list = FreeList::performance(CAPACITY).unwrap();
        b.iter(|| {
            let index = list.acquire().unwrap();
            list.push_unsafe(black_box(index));
        });
    });

    group.bench_function("try_release", |b| {
        let list = FreeList::production(CAPACITY).unwrap();
        b.iter(|| {
            let index = list.acquire().unwrap();
            black_box(list.try_release(index));
        });
    });

    group.bench_function("guard", |b| {
        let list = FreeList::production(CAPACITY).unwrap();
        b.iter(|| {
            let guard = list.acquire_guard().unwrap();
            black_box(guard.index());
        });
    });

    group.bench_function("mutex_vec", |b| {
        let allocator = MutexIndexAllocator::new();
        b.iter(|| {
            let index = allocator.acquire().unwrap();
            allocator.release(black_box(index));
        });
    });

    group.bench_function("in_use_consistent", |b| {
        let list = FreeList::production(CAPACITY).unwrap();
        for _ in 0..CAPACITY / 2 {
            list.acquire().unwrap();
        }
        b.iter(|| black_box(list.in_use_consistent()));
    });

    group.finish();
}

fn run_contended<S, F>(threads: usize, shared: &Arc<S>, op: F)
where
    S: Send + Sync + 'static,
    F: Fn(&S) + Send + Sync + Copy + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let shared = Arc::clone(shared);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..OPS_PER_THREAD {
                    op(&*shared);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    group.sample_size(20);

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * OPS_PER_THREAD));

        group.bench_with_input(
            BenchmarkId::new("free_list", threads),
            &threads,
            |b, &threads| {
                let config = FreeListConfig {
                    max_retries: None,
                    ..FreeListConfig::production()
                };
                let list = Arc::new(FreeList::with_config(CAPACITY, config).unwrap());
                b.iter(|| {
                    run_contended(threads, &list, |list| {
                        let index = list.acquire().unwrap();
                        black_box(list.try_release(index));
                    });
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("mutex_vec", threads),
            &threads,
            |b, &threads| {
                let allocator = Arc::new(MutexIndexAllocator::new());
                b.iter(|| {
                    run_contended(threads, &allocator, |allocator| {
                        let index = allocator.acquire().unwrap();
                        allocator.release(black_box(index));
                    });
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_contended);
criterion_main!(benches);
