//! Filecache load generator

// Use jemalloc as global allocator
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

use clap::Parser;
use filecache::{CacheConfig, FileCache, MemoryStore, create_cache, open_cache};
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod metrics;
mod scenarios;

use metrics::Metrics;
use scenarios::Scenario;

#[derive(Parser, Debug, Clone)]
#[command(name = "filecache-bench")]
#[command(about = "Filecache buffer pool load generator")]
struct Args {
    #[arg(short = 't', long, default_value = "1")]
    threads: usize,

    #[arg(short = 'd', long, default_value = "10")]
    duration: u64,

    #[arg(short = 's', long, default_value = "read_only")]
    scenario: String,

    /// Maximum number of resident files
    #[arg(short = 'c', long, default_value = "16")]
    capacity: usize,

    /// Number of distinct files the scenario touches
    #[arg(short = 'f', long, default_value = "64")]
    files: usize,

    /// Bytes per file
    #[arg(long, default_value = "65536")]
    file_size: usize,

    /// Back the cache with files in this directory instead of memory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(short = 'w', long, default_value = "0")]
    warmup: u64,

    #[arg(long, default_value = "0")]
    seed: u64,

    #[arg(short = 'v', long)]
    verbose: bool,
}

fn run_thread(
    thread_id: usize,
    cache: Arc<dyn FileCache>,
    scenario: Arc<dyn Scenario>,
    stop_flag: Arc<AtomicBool>,
    metrics: Arc<Metrics>,
    seed: u64,
) {
    let seed = seed.wrapping_add(thread_id as u64 * 0x9e3779b97f4a7c15);
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    while !stop_flag.load(Ordering::Relaxed) {
        let start = Instant::now();
        let result = scenario.execute(cache.as_ref(), &mut rng);
        let elapsed = start.elapsed().as_nanos() as u64;

        match result {
            Ok(()) => metrics.record_op(elapsed),
            Err(err) => {
                tracing::warn!("Thread {} operation failed: {}", thread_id, err);
                metrics.record_error();
            }
        }
    }
}

fn build_cache(args: &Args) -> filecache::BufferResult<Arc<dyn FileCache>> {
    let cache = match &args.data_dir {
        Some(dir) => {
            let config = CacheConfig::new(args.capacity)
                .with_file_size(args.file_size)
                .with_data_dir(dir);
            open_cache(&config)?
        }
        None => {
            let config = CacheConfig::new(args.capacity).with_file_size(args.file_size);
            let pool = filecache::BufferPool::new(config, Arc::new(MemoryStore::new()))?;
            Box::new(pool) as Box<dyn FileCache>
        }
    };
    Ok(Arc::from(cache))
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    println!("Filecache Benchmark Tool");
    println!("========================");
    println!("Scenario: {}", args.scenario);
    println!("Threads: {}", args.threads);
    println!("Duration: {}s", args.duration);
    println!("Capacity: {}", args.capacity);
    println!("Files: {}", args.files);
    println!("File size: {}", args.file_size);
    println!();

    let scenario: Arc<dyn Scenario> = match args.scenario.as_str() {
        "read_only" => Arc::new(scenarios::ReadOnly::new(args.files)),
        "read_write" => Arc::new(scenarios::ReadWrite::new(args.files)),
        "churn" => Arc::new(scenarios::Churn::new(args.files, args.capacity)),
        _ => {
            eprintln!("Unknown scenario: {}", args.scenario);
            std::process::exit(1);
        }
    };

    if args.threads * scenario.max_pins() > args.capacity {
        eprintln!(
            "{} threads pinning up to {} files each can exceed a capacity of {}",
            args.threads,
            scenario.max_pins(),
            args.capacity
        );
    }

    println!("Initializing...");
    let cache = match build_cache(&args) {
        Ok(cache) => cache,
        Err(err) => {
            eprintln!("Failed to create cache: {}", err);
            std::process::exit(1);
        }
    };
    if let Err(err) = scenario.prepare(cache.as_ref()) {
        eprintln!("Failed to prepare: {}", err);
        std::process::exit(1);
    }
    println!("Initialization complete.");

    let stop_flag = Arc::new(AtomicBool::new(false));
    let metrics = Arc::new(Metrics::new());
    let duration = Duration::from_secs(args.duration);

    if args.warmup > 0 {
        println!("Warming up for {}s...", args.warmup);
        std::thread::sleep(Duration::from_secs(args.warmup));
    }

    println!("Running benchmark...");
    let start_time = Instant::now();

    let mut handles = Vec::new();
    for i in 0..args.threads {
        let cache = Arc::clone(&cache);
        let scenario = Arc::clone(&scenario);
        let stop = Arc::clone(&stop_flag);
        let metrics = Arc::clone(&metrics);
        let seed = args.seed;

        let handle = std::thread::spawn(move || {
            run_thread(i, cache, scenario, stop, metrics, seed);
        });
        handles.push(handle);
    }

    std::thread::sleep(duration);
    stop_flag.store(true, Ordering::Relaxed);

    for handle in handles {
        let _ = handle.join();
    }

    let elapsed = start_time.elapsed();
    let stats = cache.stats();
    let flushed = cache.flush_all();

    let total_ops = metrics.total_ops();
    let ops_per_sec = total_ops as f64 / elapsed.as_secs_f64();
    let avg_latency_us = if total_ops > 0 {
        (metrics.total_latency_ns() / total_ops) as f64 / 1000.0
    } else {
        0.0
    };
    let max_latency_us = metrics.max_latency_ns() as f64 / 1000.0;

    println!();
    println!("Cache statistics:");
    println!("    operations:        {:>12} ({:.1} ops/s)", total_ops, ops_per_sec);
    println!(
        "    latency:           {:8.2} us (avg), {:8.2} us (max)",
        avg_latency_us, max_latency_us
    );
    println!(
        "    latency p99:       {:8.2} us (bucket bound)",
        metrics.percentile_ns(99.0) as f64 / 1000.0
    );
    println!("    errors:            {:>12}", metrics.total_errors());
    println!("    resident:          {:>12} / {}", stats.resident, stats.capacity);
    println!("    dirty at end:      {:>12}", stats.dirty);
    match flushed {
        Ok(count) => println!("    flushed at end:    {:>12}", count),
        Err(err) => println!("    flush failed:      {}", err),
    }
}
