//! Throughput comparison across all five variants under a heavy load of
//! 128 writer threads and 128 reader threads. Purely diagnostic: nothing
//! here is a correctness check.

use std::sync::Arc;
use std::thread;

use criterion::{Criterion, criterion_group, criterion_main};
use dedup_queue::{
    DedupQueue, ShardedSingleLockQueue, ShardedTwoLockQueue, SingleLockQueue, SplitShardedQueue,
    TwoLockQueue,
};

const WRITERS: u64 = 128;
const READERS: u64 = 128;
const WRITES_PER_WRITER: u64 = 64;
const CAPACITY: u32 = 4096;

fn drive<Q: DedupQueue<u64, u64> + Send + Sync + 'static>(queue: Arc<Q>) {
    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..WRITES_PER_WRITER {
                    let key = w.wrapping_mul(2654435761).wrapping_add(i) % (CAPACITY as u64 * 2);
                    let _ = queue.try_write(key, i);
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || while queue.read().is_ok() {})
        })
        .collect();

    for w in writers {
        w.join().unwrap();
    }
    queue.stop();
    for r in readers {
        r.join().unwrap();
    }
}

fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_queue_throughput");
    group.sample_size(10);

    group.bench_function("single_lock", |b| {
        b.iter(|| drive(Arc::new(SingleLockQueue::<u64, u64>::new(CAPACITY))))
    });
    group.bench_function("two_lock", |b| {
        b.iter(|| drive(Arc::new(TwoLockQueue::<u64, u64>::new(CAPACITY))))
    });
    group.bench_function("sharded_single_lock", |b| {
        b.iter(|| drive(Arc::new(ShardedSingleLockQueue::<u64, u64, 16>::new(CAPACITY))))
    });
    group.bench_function("sharded_two_lock", |b| {
        b.iter(|| drive(Arc::new(ShardedTwoLockQueue::<u64, u64, 16>::new(CAPACITY))))
    });
    group.bench_function("split_sharded", |b| {
        b.iter(|| drive(Arc::new(SplitShardedQueue::<u64, u64, 16>::new(CAPACITY))))
    });

    group.finish();
}

criterion_group!(benches, bench_variants);
criterion_main!(benches);
