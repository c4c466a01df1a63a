/*!
 * Concurrency Tests
 * Parallel callers sharing one manager
 */

use native_mem::{MemoryError, NativeMemoryManager};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;

#[test]
fn test_parallel_allocate_free_preserves_invariants() {
    let manager = NativeMemoryManager::with_pool(1 << 20).unwrap();

    let workers: Vec<_> = (0..8u64)
        .map(|worker| {
            let manager = manager.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(worker);
                let mut live = Vec::new();
                let tag = format!("worker{}", worker);

                for _ in 0..500 {
                    if live.is_empty() || rng.gen_bool(0.6) {
                        match manager.allocate(rng.gen_range(1..4096), &tag) {
                            Ok(handle) => live.push(handle),
                            Err(MemoryError::OutOfMemory { .. }) => {}
                            Err(e) => panic!("unexpected error: {}", e),
                        }
                    } else {
                        let index = rng.gen_range(0..live.len());
                        let handle = live.swap_remove(index);
                        manager.free(handle).unwrap();
                    }
                }

                for handle in live {
                    manager.free(handle).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(manager.total_allocated(), Ok(0));
    assert!(manager.validate().is_ok());
    assert_eq!(manager.regions().unwrap().len(), 1);
}

#[test]
fn test_handles_are_unique_across_threads() {
    let manager = NativeMemoryManager::with_pool(64 * 1024).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                (0..32)
                    .map(|_| manager.allocate(128, "unique").unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut handles: Vec<_> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect();
    handles.sort_unstable();
    let count = handles.len();
    handles.dedup();

    assert_eq!(handles.len(), count);
    assert_eq!(manager.total_allocated(), Ok(4 * 32 * 128));
    assert!(manager.validate().is_ok());
}
