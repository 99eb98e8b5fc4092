//! Prints the byte offsets of every control-block field, for diagnosing
//! layout mismatches between two binaries attaching to the same region.

use temporal_ring::{field_offsets, ControlBlock};

fn main() {
    let offsets = field_offsets();
    eprintln!("Layout of ControlBlock");
    eprintln!("size:                       {}", std::mem::size_of::<ControlBlock>());
    eprintln!("align:                      {}", std::mem::align_of::<ControlBlock>());
    eprintln!("tail offset:                {}", offsets.tail);
    eprintln!("head offset:                {}", offsets.head);
    eprintln!("producer_heartbeat offset:  {}", offsets.producer_heartbeat);
    eprintln!("consumer_heartbeat offset:  {}", offsets.consumer_heartbeat);
    eprintln!("capacity offset:            {}", offsets.capacity);
    eprintln!("magic offset:               {}", offsets.magic);
}
