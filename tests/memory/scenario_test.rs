/*!
 * Pool Scenario Tests
 * End-to-end allocation sequences through the facade
 */

use native_mem::memory::pool::BlockTable;
use native_mem::{MemoryError, NativeMemoryManager};
use pretty_assertions::assert_eq;

fn assert_partitioned(manager: &NativeMemoryManager) {
    manager.validate().expect("pool invariants violated");
}

#[test]
fn test_first_fit_reuses_freed_region() {
    let manager = NativeMemoryManager::with_pool(1024).unwrap();

    let a = manager.allocate(100, "a").unwrap();
    let _b = manager.allocate(200, "b").unwrap();
    manager.free(a).unwrap();

    let c = manager.allocate(50, "c").unwrap();
    assert_eq!(c, a, "first fit should land in the freed leading region");
    assert_eq!(manager.total_allocated(), Ok(250));
    assert_eq!(manager.available(), Ok(774));
    assert_partitioned(&manager);
}

#[test]
fn test_full_pool_then_coalesce_to_one_region() {
    let manager = NativeMemoryManager::with_pool(300).unwrap();

    let handles: Vec<_> = (0..3)
        .map(|i| manager.allocate(100, &format!("block{}", i)).unwrap())
        .collect();
    assert_eq!(manager.available(), Ok(0));

    assert!(matches!(
        manager.allocate(1, "overflow"),
        Err(MemoryError::OutOfMemory { requested: 1, .. })
    ));

    for handle in handles {
        manager.free(handle).unwrap();
    }

    let regions = manager.regions().unwrap();
    assert_eq!(regions.len(), 1);
    assert!(!regions[0].used);
    assert_eq!(regions[0].size, 300);

    // one free region per 300/1024 KB
    let ratio = manager.fragmentation_ratio().unwrap();
    assert!((ratio - 1024.0 / 300.0).abs() < 1e-9, "ratio was {}", ratio);
    assert_partitioned(&manager);
}

#[test]
fn test_round_trip_restores_previous_state() {
    let manager = NativeMemoryManager::with_pool(4096).unwrap();
    let _a = manager.allocate(512, "a").unwrap();
    let b = manager.allocate(256, "b").unwrap();
    let _c = manager.allocate(128, "c").unwrap();
    manager.free(b).unwrap();

    let before_regions = manager.regions().unwrap();
    let before_total = manager.total_allocated().unwrap();

    let handle = manager.allocate(1000, "x").unwrap();
    manager.free(handle).unwrap();

    assert_eq!(manager.total_allocated(), Ok(before_total));
    assert_eq!(manager.regions().unwrap(), before_regions);
}

#[test]
fn test_free_in_any_order_coalesces_fully() {
    let manager = NativeMemoryManager::with_pool(2048).unwrap();
    let handles: Vec<_> = (0..8).map(|_| manager.allocate(200, "x").unwrap()).collect();

    for &i in &[3usize, 0, 7, 5, 1, 6, 2, 4] {
        manager.free(handles[i]).unwrap();
        assert_partitioned(&manager);
    }

    let regions = manager.regions().unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].size, 2048);
}

#[test]
fn test_free_all_resets_to_single_region() {
    let manager = NativeMemoryManager::with_pool(1024).unwrap();
    manager.allocate(100, "a").unwrap();
    manager.allocate(100, "b").unwrap();

    manager.free_all().unwrap();
    let regions = manager.regions().unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(manager.total_allocated(), Ok(0));

    let table = regions.into_iter().fold(BlockTable::new(), |mut table, region| {
        table.insert(region);
        table
    });
    assert_eq!(table.free_summary().bytes, 1024);
}

#[test]
fn test_tags_do_not_influence_placement() {
    let first = NativeMemoryManager::with_pool(1024).unwrap();
    let second = NativeMemoryManager::with_pool(1024).unwrap();

    let sizes = [64usize, 300, 17, 128];
    let offsets = |manager: &NativeMemoryManager, tag: &str| -> Vec<u64> {
        let base = manager.regions().unwrap()[0].address as u64;
        sizes
            .iter()
            .map(|&size| manager.allocate(size, tag).unwrap() - base)
            .collect()
    };

    assert_eq!(offsets(&first, "alpha"), offsets(&second, "a much longer tag"));
}
