//! Single-pair throughput benchmark for the lossy push/pop path.
//! Compares pinned vs unpinned producer/consumer threads.

use std::alloc::{alloc_zeroed, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use temporal_ring::control_block::ControlBlock;
use temporal_ring::{Consumer, Producer};

const MSG: u64 = 20_000_000;
const N: usize = 1 << 16;
const WARMUP_RUNS: usize = 1;
const BENCH_RUNS: usize = 5;

fn main() {
    println!("temporal_ring, lossy push/pop throughput");
    println!("{MSG} messages produced, ring={N} slots\n");

    for pinned in [false, true] {
        let rates = run_benchmark(pinned);
        let (median, stddev) = stats(&rates);
        println!(
            "pinned={pinned:<5} median={median:.3} M msg/s (produced)  stddev=±{stddev:.3}"
        );
    }
}

fn run_benchmark(pinned: bool) -> Vec<f64> {
    for _ in 0..WARMUP_RUNS {
        let _ = run_once(pinned);
    }
    (0..BENCH_RUNS).map(|_| run_once(pinned)).collect()
}

/// Rate is reported in produced messages per second, not delivered ones:
/// this benchmark drives the lossy path, where the consumer deliberately
/// drops whatever the producer has lapped, so "messages delivered" is not
/// a meaningful denominator and waiting for it to reach `MSG` would hang
/// once the producer finishes and the ring drains.
fn run_once(pinned: bool) -> f64 {
    let layout = Layout::from_size_align(ControlBlock::region_size::<u64>(N), 128).unwrap();
    let region = unsafe { alloc_zeroed(layout) };
    assert!(!region.is_null());
    let cb = NonNull::new(region as *mut ControlBlock).unwrap();

    let mut producer: Producer<u64, N> = unsafe { Producer::attach(cb).unwrap() };
    let mut consumer: Consumer<u64, N> = unsafe { Consumer::join(cb).unwrap() };

    let producer_done = Arc::new(AtomicBool::new(false));
    let consumer_done = Arc::clone(&producer_done);

    let t0 = Instant::now();

    let consumer_thread = thread::spawn(move || {
        if pinned {
            pin_to_cpu(1);
        }
        loop {
            match consumer.pop() {
                Ok(_) => {}
                Err(_) if consumer_done.load(Ordering::Acquire) => break,
                Err(_) => std::hint::spin_loop(),
            }
        }
    });

    let producer_thread = thread::spawn(move || {
        if pinned {
            pin_to_cpu(0);
        }
        for i in 0..MSG {
            producer.push(i);
        }
        producer.sync();
        producer_done.store(true, Ordering::Release);
    });

    producer_thread.join().unwrap();
    consumer_thread.join().unwrap();

    let elapsed = t0.elapsed();
    unsafe { std::alloc::dealloc(region, layout) };

    MSG as f64 / elapsed.as_secs_f64() / 1_000_000.0
}

fn pin_to_cpu(cpu_id: usize) {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if cpu_id < core_ids.len() {
            core_affinity::set_for_current(core_ids[cpu_id]);
        }
    }
}

fn stats(rates: &[f64]) -> (f64, f64) {
    let mut sorted = rates.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = if sorted.len() % 2 == 0 {
        (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    };
    let mean: f64 = rates.iter().sum::<f64>() / rates.len() as f64;
    let variance: f64 = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / rates.len() as f64;
    (median, variance.sqrt())
}
