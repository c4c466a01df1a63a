/*!
 * Boundary Tests
 * Size limits, bad handles and uninitialized use
 */

use native_mem::{AllocatorConfig, MemoryError, MemoryErrorKind, NativeMemoryManager, NULL_HANDLE};
use pretty_assertions::assert_eq;

#[test]
fn test_zero_size_fails() {
    let manager = NativeMemoryManager::with_pool(1024).unwrap();
    let result = manager.allocate(0, "x");
    assert_eq!(result, Err(MemoryError::InvalidSize(0)));
    assert_eq!(manager.total_allocated(), Ok(0));
}

#[test]
fn test_larger_than_pool_is_out_of_memory() {
    let manager = NativeMemoryManager::with_pool(1024).unwrap();
    let err = manager.allocate(1025, "x").unwrap_err();
    assert_eq!(err.kind(), MemoryErrorKind::OutOfMemory);
    assert!(err.is_recoverable());
    assert_eq!(manager.total_allocated(), Ok(0));
    assert!(manager.validate().is_ok());
}

#[test]
fn test_exact_pool_size_succeeds() {
    let manager = NativeMemoryManager::with_pool(1024).unwrap();
    manager.allocate(1024, "all").unwrap();
    assert_eq!(manager.available(), Ok(0));
    assert!(!manager.is_memory_available(1));
}

#[test]
fn test_unknown_handle_changes_nothing() {
    let manager = NativeMemoryManager::with_pool(1024).unwrap();
    let handle = manager.allocate(128, "a").unwrap();
    let before = manager.regions().unwrap();

    for bogus in [NULL_HANDLE, handle + 1, handle + 64, 0xdead_beef] {
        let err = manager.free(bogus).unwrap_err();
        assert_eq!(err.kind(), MemoryErrorKind::InvalidPointer);
    }

    assert_eq!(manager.total_allocated(), Ok(128));
    assert_eq!(manager.regions().unwrap(), before);
}

#[test]
fn test_interior_of_free_region_is_not_a_handle() {
    let manager = NativeMemoryManager::with_pool(1024).unwrap();
    let a = manager.allocate(100, "a").unwrap();
    manager.free(a).unwrap();
    assert!(matches!(manager.free(a), Err(MemoryError::InvalidPointer(_))));
}

#[test]
fn test_operations_before_initialization() {
    let manager = NativeMemoryManager::new(AllocatorConfig::default()).unwrap();
    assert_eq!(manager.allocate(8, "x"), Err(MemoryError::NotInitialized));
    assert_eq!(manager.free(0x1000), Err(MemoryError::NotInitialized));
    assert_eq!(manager.free_all(), Err(MemoryError::NotInitialized));
    assert_eq!(manager.available(), Err(MemoryError::NotInitialized));
    assert_eq!(manager.defragment(), Err(MemoryError::NotInitialized));

    manager.initialize_pool(64).unwrap();
    assert!(manager.allocate(8, "x").is_ok());
}

#[test]
fn test_split_threshold_from_config() {
    let manager =
        NativeMemoryManager::new(AllocatorConfig::pool(256).with_split_threshold(0)).unwrap();
    manager.allocate(250, "x").unwrap();
    assert_eq!(manager.regions().unwrap().len(), 2);

    let default = NativeMemoryManager::with_pool(256).unwrap();
    default.allocate(250, "x").unwrap();
    let regions = default.regions().unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(default.total_allocated(), Ok(256));
}
