/*!
 * Property Tests
 * Pool invariants under arbitrary allocate/free sequences
 */

use native_mem::memory::pool::{BlockTable, PoolAllocator};
use native_mem::memory::RegionAllocator;
use native_mem::{Address, MemoryError, Size};
use proptest::prelude::*;

const POOL_SIZE: Size = 8192;

#[derive(Debug, Clone)]
enum Op {
    Allocate(Size),
    Free(usize),
    Defragment,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1..=3000usize).prop_map(Op::Allocate),
        3 => any::<usize>().prop_map(Op::Free),
        1 => Just(Op::Defragment),
    ]
}

fn check_invariants(pool: &PoolAllocator) -> Result<(), TestCaseError> {
    let table: BlockTable = pool.regions().into_iter().fold(BlockTable::new(), |mut t, r| {
        t.insert(r);
        t
    });

    prop_assert_eq!(table.validate(pool.base_address(), pool.total_size()), Ok(()));
    prop_assert_eq!(table.used_bytes(), pool.total_allocated());
    prop_assert_eq!(pool.available() + pool.total_allocated(), pool.total_size());
    prop_assert!(table.adjacent_free_pair().is_none());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_pool_invariants_hold(ops in prop::collection::vec(op(), 1..80)) {
        let mut pool = PoolAllocator::new(POOL_SIZE).unwrap();
        let mut live: Vec<Address> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate(size) => {
                    let before = pool.total_allocated();
                    match pool.allocate(size, "prop") {
                        Ok(address) => {
                            prop_assert!(pool.contains(address));
                            prop_assert!(pool.total_allocated() >= before + size);
                            live.push(address);
                        }
                        Err(MemoryError::OutOfMemory { .. }) => {
                            prop_assert_eq!(pool.total_allocated(), before);
                        }
                        Err(e) => return Err(TestCaseError::fail(e.to_string())),
                    }
                }
                Op::Free(pick) => {
                    if live.is_empty() {
                        continue;
                    }
                    let address = live.swap_remove(pick % live.len());
                    prop_assert!(pool.free(address).is_ok());
                    prop_assert!(pool.free(address).is_err());
                }
                Op::Defragment => {
                    prop_assert_eq!(pool.coalesce(), 0);
                }
            }
            check_invariants(&pool)?;
        }
    }

    #[test]
    fn prop_defragment_is_idempotent(sizes in prop::collection::vec(1..500usize, 1..20), mask in any::<u32>()) {
        let mut pool = PoolAllocator::new(POOL_SIZE).unwrap();
        let handles: Vec<Address> = sizes
            .iter()
            .filter_map(|&size| pool.allocate(size, "x").ok())
            .collect();

        for (i, address) in handles.iter().enumerate() {
            if mask & (1 << (i % 32)) != 0 {
                pool.free(*address).unwrap();
            }
        }

        pool.coalesce();
        let first = pool.regions();
        prop_assert_eq!(pool.coalesce(), 0);
        prop_assert_eq!(pool.regions(), first);
    }

    #[test]
    fn prop_allocate_then_free_restores_counters(prefix in prop::collection::vec(1..800usize, 0..8), size in 1..2000usize) {
        let mut pool = PoolAllocator::new(POOL_SIZE).unwrap();
        for s in prefix {
            let _ = pool.allocate(s, "prefix");
        }

        let before = pool.total_allocated();
        if let Ok(address) = pool.allocate(size, "x") {
            pool.free(address).unwrap();
        }
        prop_assert_eq!(pool.total_allocated(), before);
    }
}
