//! Producer-side demo: initializes (or joins) the shared region, waits for
//! a consumer heartbeat, pushes four lossless values, publishes, and waits
//! for the consumer to ack.
//!
//! Usage: `producer_demo [--id PATH] [--page-size standard|huge|gigantic]`

use std::ptr::NonNull;

use temporal_ring::control_block::ControlBlock;
use temporal_ring::shmem::{PageSize, ShmRegion, ShmemConfig};
use temporal_ring::Producer;

const N: usize = 4;

fn parse_page_size(arg: &str) -> PageSize {
    match arg {
        "standard" => PageSize::Standard,
        "huge" => PageSize::Huge2Mb,
        "gigantic" => PageSize::Gigantic1Gb,
        other => {
            eprintln!("invalid page size: {other}");
            std::process::exit(1);
        }
    }
}

fn main() {
    let mut id = String::from("temporal-ring-demo");
    let mut page_size = PageSize::Standard;

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--id" => id = args.next().expect("--id requires a value"),
            "--page-size" => page_size = parse_page_size(&args.next().expect("--page-size requires a value")),
            other => {
                eprintln!("unknown flag: {other}");
                std::process::exit(1);
            }
        }
    }

    let config = ShmemConfig::new(id).with_page_size(page_size);
    let size = ControlBlock::region_size::<u64>(N);
    eprintln!("opening shmem of size {size}");
    let region = ShmRegion::create_or_open(&config, size).expect("failed to open shmem");
    eprintln!("mapped shmem");

    let cb = NonNull::new(region.as_ptr() as *mut ControlBlock).unwrap();
    let mut producer: Producer<u64, N> =
        unsafe { Producer::attach(cb).expect("failed to initialize producer") };
    eprintln!("initialized producer");

    eprintln!("waiting for consumer heartbeat");
    while !producer.consumer_heartbeat() {
        std::hint::spin_loop();
    }

    let value: u64 = 0x2A2A_2A2A_2A2A_2A2A;
    for _ in 0..N {
        producer.push_lossless(value).expect("ring unexpectedly full");
    }
    assert!(producer.push_lossless(value).is_err(), "ring should be full");

    producer.sync();
    producer.beat();
    eprintln!("published value {value:#x}");

    eprintln!("waiting for consumer ack");
    while !producer.consumer_heartbeat() {
        std::hint::spin_loop();
    }
    eprintln!("cleanup done");
}
