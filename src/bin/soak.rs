//! Thin driver that exercises a chosen queue variant under concurrent
//! load: many writer threads feed synthetic `(key, value)` pairs, many
//! reader threads drain them, and the run reports whether the accounting
//! identity `writes - dedups <= reads + size()` held.
//!
//! This binary, and the [`DataSource`] it uses, mirror
//! `examples/original_source/main.cpp` and `DataSource.h` but are
//! non-normative: the library crate's public contract ends at
//! [`dedup_queue::DedupQueue`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use dedup_queue::{
    DedupQueue, ShardedSingleLockQueue, ShardedTwoLockQueue, SingleLockQueue, SplitShardedQueue,
    TwoLockQueue,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Variant {
    SingleLock,
    TwoLock,
    ShardedSingleLock,
    ShardedTwoLock,
    SplitSharded,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DataSet {
    /// Densely-spaced 8-bit ids: frequent duplication.
    Linear8,
    /// Sparsely-spaced 16-bit ids: infrequent duplication.
    Linear16,
    /// Full 64-bit ids: nearly no duplication.
    Random,
    /// A single constant id: constant duplication.
    Zeroes,
}

/// Soak-test a bounded deduplicating queue with many concurrent writers
/// and readers.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = Variant::TwoLock)]
    variant: Variant,

    #[arg(long, value_enum, default_value_t = DataSet::Linear16)]
    dataset: DataSet,

    #[arg(long, default_value_t = 1024)]
    capacity: u32,

    #[arg(long, default_value_t = 128)]
    writers: u32,

    #[arg(long, default_value_t = 128)]
    readers: u32,

    #[arg(long, default_value_t = 2_000)]
    writes_per_writer: u32,
}

/// Synthetic `(key, value)` source: a hex-encoded 64-bit identifier paired
/// with a 32-bit integer, matching `examples/original_source/DataSource.h`.
/// Each thread owns its own generator seeded from its thread id, so no
/// coordination is needed between producers.
struct DataSource {
    dataset: DataSet,
    rng: SmallRng,
    linear_counter: u64,
    step: u64,
}

impl DataSource {
    fn new(dataset: DataSet, thread_seed: u64) -> Self {
        let step = match dataset {
            DataSet::Linear8 => (thread_seed % 0xFF).max(1),
            DataSet::Linear16 => (thread_seed % 0xFFFF).max(1),
            DataSet::Random | DataSet::Zeroes => 0,
        };
        Self {
            dataset,
            rng: SmallRng::seed_from_u64(thread_seed),
            linear_counter: thread_seed,
            step,
        }
    }

    fn next(&mut self) -> (String, i32) {
        let (id, val) = match self.dataset {
            DataSet::Linear8 | DataSet::Linear16 => {
                self.linear_counter = self.linear_counter.wrapping_add(self.step);
                (self.linear_counter, self.rng.r#gen())
            }
            DataSet::Random => (self.rng.r#gen(), self.rng.r#gen()),
            DataSet::Zeroes => (0, 0),
        };
        (format!("{id:016X}"), val)
    }
}

fn run_soak<Q>(queue: Arc<Q>, args: &Args)
where
    Q: DedupQueue<String, i32> + Send + Sync + 'static,
{
    let total_writes = Arc::new(AtomicU64::new(0));
    let total_reads = Arc::new(AtomicU64::new(0));

    let started = Instant::now();

    let writers: Vec<_> = (0..args.writers)
        .map(|i| {
            let queue = Arc::clone(&queue);
            let total_writes = Arc::clone(&total_writes);
            let dataset = args.dataset;
            let writes_per_writer = args.writes_per_writer;
            thread::spawn(move || {
                let mut source = DataSource::new(dataset, i as u64 + 1);
                for _ in 0..writes_per_writer {
                    let (key, value) = source.next();
                    if queue.try_write(key, value) {
                        total_writes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..args.readers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let total_reads = Arc::clone(&total_reads);
            thread::spawn(move || {
                loop {
                    match queue.read() {
                        Ok(_) => {
                            total_reads.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => break,
                    }
                }
            })
        })
        .collect();

    for w in writers {
        w.join().expect("writer thread panicked");
    }
    log::info!("all writers finished, stopping queue");
    queue.stop();

    for r in readers {
        r.join().expect("reader thread panicked");
    }

    let elapsed = started.elapsed();
    let writes = total_writes.load(Ordering::Relaxed);
    let reads = total_reads.load(Ordering::Relaxed);
    let remaining = queue.size();

    log::info!(
        "variant done in {elapsed:?}: accepted_writes={writes} reads={reads} remaining_size={remaining}"
    );
    assert!(
        reads as u64 + remaining as u64 <= writes,
        "accounting identity violated: reads + size() should not exceed accepted writes"
    );
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match args.variant {
        Variant::SingleLock => run_soak(
            Arc::new(SingleLockQueue::<String, i32>::new(args.capacity)),
            &args,
        ),
        Variant::TwoLock => run_soak(
            Arc::new(TwoLockQueue::<String, i32>::new(args.capacity)),
            &args,
        ),
        Variant::ShardedSingleLock => run_soak(
            Arc::new(ShardedSingleLockQueue::<String, i32>::new(args.capacity)),
            &args,
        ),
        Variant::ShardedTwoLock => run_soak(
            Arc::new(ShardedTwoLockQueue::<String, i32>::new(args.capacity)),
            &args,
        ),
        Variant::SplitSharded => run_soak(
            Arc::new(SplitShardedQueue::<String, i32>::new(args.capacity)),
            &args,
        ),
    }
}
