//! Allocator walkthrough.
//!
//! Demonstrates: three small allocations → two frees (which coalesce) →
//! two reallocations reusing the freed space → an over-capacity request.
//! Set `RUST_LOG=trace` to see every split and merge.

use tagheap_arena::{Heap, HeapConfig};
use tagheap_core::PayloadOffset;
use tracing_subscriber::EnvFilter;

fn print_layout(heap: &Heap) {
    for chunk in heap.chunks() {
        println!(
            "    chunk {:>4}  size {:>4}  left {:>4}  {}",
            chunk.offset,
            chunk.size(),
            chunk.header.left_size,
            if chunk.is_free() { "free" } else { "occupied" },
        );
    }
    let free: Vec<String> = heap.free_chunks().map(|c| c.offset.to_string()).collect();
    println!("    free list: [{}]", free.join(", "));
}

fn allocate(heap: &mut Heap, size: usize) -> Option<PayloadOffset> {
    match heap.allocate(size) {
        Ok(p) => {
            println!("allocate({size}) -> payload {p}");
            Some(p)
        }
        Err(e) => {
            println!("allocate({size}) -> {e}");
            None
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== tagheap walkthrough ===\n");
    let mut heap = Heap::new(HeapConfig::new(128)).unwrap();
    println!("new heap, capacity {}", heap.capacity());
    print_layout(&heap);

    let a = allocate(&mut heap, 4);
    let b = allocate(&mut heap, 4);
    let _c = allocate(&mut heap, 4);
    print_layout(&heap);

    for p in [a, b].into_iter().flatten() {
        heap.free(p).unwrap();
        println!("free({p})");
    }
    print_layout(&heap);

    let d = allocate(&mut heap, 8);
    let _e = allocate(&mut heap, 8);
    print_layout(&heap);

    if let Some(d) = d {
        heap.payload_mut(d).unwrap()[..8].copy_from_slice(b"tagheap!");
        println!("payload {d}: {:?}", String::from_utf8_lossy(&heap.payload(d).unwrap()[..8]));
    }

    allocate(&mut heap, 200);

    let stats = heap.stats();
    println!(
        "\n{} chunks ({} free), {} bytes free, fragmentation {:.2}",
        stats.chunks,
        stats.free_chunks,
        stats.free_bytes,
        stats.fragmentation()
    );
    heap.check().unwrap();
    println!("\n=== done ===");
}
