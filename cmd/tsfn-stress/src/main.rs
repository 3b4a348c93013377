//! Stress test - many producers, one threadsafe function
//!
//! Producer threads push tagged items through a bounded threadsafe
//! function with blocking calls; a dedicated interpreter thread drains
//! them. Checks per-producer FIFO order and a single finalizer run.

use libc::c_void;
use napi_host::abi::{napi_env, napi_value};
use napi_host::{
    CallInvoker, CallMode, DeliveryMode, ReleaseMode, ThreadInvoker, ThreadSafeFunction,
    TsfnOptions,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TAG_SHIFT: u32 = 40;

struct Sink {
    /// Last sequence number seen per producer, plus one
    next: Mutex<Vec<u64>>,
    delivered: AtomicU64,
    out_of_order: AtomicU64,
    finalized: AtomicU64,
}

unsafe extern "C" fn deliver(_env: napi_env, _js_cb: napi_value, context: *mut c_void, data: *mut c_void) {
    let sink = &*(context as *const Sink);
    let item = data as u64;
    let producer = (item >> TAG_SHIFT) as usize;
    let seq = item & ((1 << TAG_SHIFT) - 1);

    let mut next = sink.next.lock();
    if next[producer] != seq {
        sink.out_of_order.fetch_add(1, Ordering::Relaxed);
    }
    next[producer] = seq + 1;
    sink.delivered.fetch_add(1, Ordering::Relaxed);
}

unsafe extern "C" fn finalize(_env: napi_env, data: *mut c_void, _hint: *mut c_void) {
    let sink = &*(data as *const Sink);
    sink.finalized.fetch_add(1, Ordering::SeqCst);
}

fn arg(n: usize, default: usize) -> usize {
    std::env::args()
        .nth(n)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main() {
    println!("=== Threadsafe Function Stress Test ===\n");

    let producers = arg(1, 8).max(1);
    let items = arg(2, 100_000);
    let max_queue = arg(3, 1024);
    let total = (producers * items) as u64;

    println!("Producers: {}", producers);
    println!("Items:     {} per producer", items);
    println!("Queue:     {}", if max_queue == 0 { "unbounded".to_string() } else { max_queue.to_string() });

    let invoker = match ThreadInvoker::spawn() {
        Ok(invoker) => Arc::new(invoker),
        Err(e) => {
            eprintln!("failed to spawn interpreter thread: {}", e);
            std::process::exit(1);
        }
    };
    let dynamic: Arc<dyn CallInvoker> = invoker.clone();

    let sink = Arc::new(Sink {
        next: Mutex::new(vec![0; producers]),
        delivered: AtomicU64::new(0),
        out_of_order: AtomicU64::new(0),
        finalized: AtomicU64::new(0),
    });
    let sink_ptr = Arc::as_ptr(&sink) as *mut c_void;

    let tsfn = ThreadSafeFunction::create(
        Arc::downgrade(&dynamic),
        TsfnOptions::new(0x1 as napi_env)
            .max_queue_size(max_queue)
            .initial_thread_count(producers)
            .call_js(deliver)
            .context(sink_ptr)
            .finalizer(finalize, sink_ptr)
            .delivery(DeliveryMode::Async),
    );

    let start = Instant::now();

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let tsfn = Arc::clone(&tsfn);
            std::thread::spawn(move || {
                let mut failed = 0u64;
                for seq in 0..items as u64 {
                    let item = ((p as u64) << TAG_SHIFT) | seq;
                    if tsfn.call(item as *mut c_void, CallMode::Blocking).is_err() {
                        failed += 1;
                    }
                }
                let _ = tsfn.release(ReleaseMode::Release);
                failed
            })
        })
        .collect();

    let mut failed = 0;
    for h in handles {
        failed += h.join().unwrap_or(0);
    }
    let produce_time = start.elapsed();

    // Wait for the interpreter thread to drain and finalize
    let drain_start = Instant::now();
    loop {
        let done = sink.delivered.load(Ordering::Relaxed);
        if sink.finalized.load(Ordering::SeqCst) > 0 {
            break;
        }
        if drain_start.elapsed().as_secs() > 30 {
            println!("Timeout! Only {}/{} delivered", done, total);
            break;
        }
        print!("\rDelivered: {}/{}", done, total);
        std::thread::sleep(Duration::from_millis(100));
    }
    let total_time = start.elapsed();

    // Everything queued before this barrier has run
    let _ = invoker.invoke_sync(Box::new(|| {}));
    drop(dynamic);
    let stats = invoker.shutdown();

    let delivered = sink.delivered.load(Ordering::Relaxed);
    let out_of_order = sink.out_of_order.load(Ordering::Relaxed);
    let finalized = sink.finalized.load(Ordering::SeqCst);

    println!("\n\n=== Results ===");
    println!("Total items:     {}", total);
    println!("Delivered:       {}", delivered);
    println!("Failed calls:    {}", failed);
    println!("Out of order:    {}", out_of_order);
    println!("Finalizer runs:  {}", finalized);
    println!("Produce time:    {:?}", produce_time);
    println!("Total time:      {:?}", total_time);
    println!("Throughput:      {:.0} items/sec", delivered as f64 / total_time.as_secs_f64());
    if let Some(stats) = stats {
        println!("Tasks run:       {}", stats.tasks_run);
        println!("Parks:           {}", stats.parks);
    }

    let ok = delivered == total && failed == 0 && out_of_order == 0 && finalized == 1;
    println!("\n=== Stress Test {} ===", if ok { "Complete" } else { "FAILED" });
    if !ok {
        std::process::exit(1);
    }
}
