use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

extern crate filecache;

use filecache::buffer::{BufferPool, FileCache};
use filecache::config::CacheConfig;
use filecache::store::MemoryStore;

// Test configuration
const CAPACITY: usize = 16;
const FILE_SIZE: usize = 64 * 1024;
const THREADS: usize = 4;
const OPERATIONS_PER_THREAD: usize = 1_000;

fn new_pool(capacity: usize) -> Arc<BufferPool> {
    let config = CacheConfig::new(capacity).with_file_size(FILE_SIZE);
    let store = Arc::new(MemoryStore::new());
    Arc::new(BufferPool::new(config, store).unwrap())
}

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("unit-{}", i)).collect()
}

// Resident working set: every pin is a hit
pub fn bench_pin_hit(c: &mut Criterion) {
    let pool = new_pool(CAPACITY);
    let names = names(CAPACITY);
    for name in &names {
        pool.pin_files(&[name.as_str()]).unwrap();
        pool.unpin_files(&[name.as_str()]);
    }

    c.bench_function("PinUnpinHit", |b| {
        let mut i = 0;
        b.iter(|| {
            let name = names[i % names.len()].as_str();
            pool.pin_files(&[name]).unwrap();
            black_box(pool.file_data(name).unwrap()[0]);
            pool.unpin_files(&[name]);
            i += 1;
        })
    });
}

// Working set larger than the pool: most pins evict and reload
pub fn bench_pin_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("PinUnpinEvict");
    for dirty in [false, true] {
        let pool = new_pool(CAPACITY);
        let names = names(CAPACITY * 4);
        group.bench_with_input(BenchmarkId::from_parameter(if dirty { "dirty" } else { "clean" }), &dirty, |b, &dirty| {
            let mut i = 0;
            b.iter(|| {
                let name = names[i % names.len()].as_str();
                pool.pin_files(&[name]).unwrap();
                if dirty {
                    pool.mutable_file_data(name).unwrap()[0] = i as u8;
                }
                pool.unpin_files(&[name]);
                i += 1;
            })
        });
    }
    group.finish();
}

// Several threads competing for a pool smaller than their combined working set
pub fn bench_contended(c: &mut Criterion) {
    let names = Arc::new(names(CAPACITY * 2));
    c.bench_function("ContendedPinUnpin", |b| {
        b.iter(|| {
            let pool = new_pool(CAPACITY);
            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let pool = pool.clone();
                    let names = names.clone();
                    thread::spawn(move || {
                        for i in 0..OPERATIONS_PER_THREAD {
                            let name = names[(i * (t + 1)) % names.len()].as_str();
                            pool.pin_files(&[name]).unwrap();
                            black_box(pool.file_data(name).unwrap()[0]);
                            pool.unpin_files(&[name]);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_pin_hit, bench_pin_evict, bench_contended);
criterion_main!(benches);
