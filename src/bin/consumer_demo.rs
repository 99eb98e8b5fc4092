//! Consumer-side demo: joins the shared region, acks the join with a
//! heartbeat, spins on `pop` until the producer's value arrives, and acks
//! the message with a second heartbeat.
//!
//! Usage: `consumer_demo [--id PATH] [--page-size standard|huge|gigantic]`

use std::ptr::NonNull;

use temporal_ring::control_block::ControlBlock;
use temporal_ring::shmem::{PageSize, ShmRegion, ShmemConfig};
use temporal_ring::Consumer;

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
    eprintln!("joining consumer");
    let mut consumer: Consumer<u64, N> = unsafe { Consumer::join(cb).expect("failed to join consumer") };
    eprintln!("joined consumer");

    consumer.beat();

    let value = loop {
        match consumer.lossless_pop() {
            Ok(value) => break value,
            Err(_) => std::hint::spin_loop(),
        }
    };
    eprintln!("read value {value:#x}");

    consumer.beat();
}
