//! Benchmark scenarios module

use filecache::{BufferResult, FileCache};
use rand::Rng;
use rand::rngs::StdRng;
use std::hint::black_box;

/// Scenario trait - defines a benchmark workload against a cache
pub trait Scenario: Send + Sync {
    /// Prepare scenario (warm the working set, etc.)
    fn prepare(&self, cache: &dyn FileCache) -> BufferResult<()>;

    /// Execute one iteration of the scenario
    fn execute(&self, cache: &dyn FileCache, rng: &mut StdRng) -> BufferResult<()>;

    /// Most files one iteration holds pinned at the same time
    fn max_pins(&self) -> usize;
}

fn file_names(files: usize) -> Vec<String> {
    (0..files.max(1)).map(|i| format!("bench-{:06}", i)).collect()
}

/// Pins and unpins every name once so the first iterations are not all misses
fn touch_all(cache: &dyn FileCache, names: &[String]) -> BufferResult<()> {
    for name in names {
        cache.pin_files(&[name.as_str()])?;
        cache.unpin_files(&[name.as_str()]);
    }
    Ok(())
}

/// Read only scenario - pin one random file, read it, unpin
pub struct ReadOnly {
    names: Vec<String>,
}

impl ReadOnly {
    pub fn new(files: usize) -> Self {
        Self {
            names: file_names(files),
        }
    }
}

impl Scenario for ReadOnly {
    fn prepare(&self, cache: &dyn FileCache) -> BufferResult<()> {
        touch_all(cache, &self.names)
    }

    fn execute(&self, cache: &dyn FileCache, rng: &mut StdRng) -> BufferResult<()> {
        let name = self.names[rng.gen_range(0..self.names.len())].as_str();
        cache.pin_files(&[name])?;
        if let Some(view) = cache.file_data(name) {
            let offset = rng.gen_range(0..view.len());
            black_box(view[offset]);
        }
        cache.unpin_files(&[name]);
        Ok(())
    }

    fn max_pins(&self) -> usize {
        1
    }
}

/// Read write scenario - pin two files, copy a byte from one into the other
pub struct ReadWrite {
    names: Vec<String>,
}

impl ReadWrite {
    pub fn new(files: usize) -> Self {
        Self {
            names: file_names(files),
        }
    }
}

impl Scenario for ReadWrite {
    fn prepare(&self, cache: &dyn FileCache) -> BufferResult<()> {
        touch_all(cache, &self.names)
    }

    fn execute(&self, cache: &dyn FileCache, rng: &mut StdRng) -> BufferResult<()> {
        let source = self.names[rng.gen_range(0..self.names.len())].as_str();
        let target = self.names[rng.gen_range(0..self.names.len())].as_str();
        cache.pin_files(&[source, target])?;

        let byte = match cache.file_data(source) {
            Some(view) => view[rng.gen_range(0..view.len())],
            None => 0,
        };
        if let Some(mut view) = cache.mutable_file_data(target) {
            let offset = rng.gen_range(0..view.len());
            view[offset] = byte.wrapping_add(1);
        }

        cache.unpin_files(&[source, target]);
        Ok(())
    }

    fn max_pins(&self) -> usize {
        2
    }
}

/// Churn scenario - pin a batch of consecutive files so most pins evict
pub struct Churn {
    names: Vec<String>,
    batch: usize,
}

impl Churn {
    pub fn new(files: usize, capacity: usize) -> Self {
        Self {
            names: file_names(files),
            batch: (capacity / 4).clamp(1, 8),
        }
    }
}

impl Scenario for Churn {
    fn prepare(&self, _cache: &dyn FileCache) -> BufferResult<()> {
        Ok(())
    }

    fn execute(&self, cache: &dyn FileCache, rng: &mut StdRng) -> BufferResult<()> {
        let start = rng.gen_range(0..self.names.len());
        let batch: Vec<&str> = (0..self.batch)
            .map(|i| self.names[(start + i) % self.names.len()].as_str())
            .collect();

        cache.pin_files(&batch)?;
        for &name in &batch {
            if let Some(mut view) = cache.mutable_file_data(name) {
                view[0] = view[0].wrapping_add(1);
            }
        }
        cache.unpin_files(&batch);
        Ok(())
    }

    fn max_pins(&self) -> usize {
        self.batch
    }
}
