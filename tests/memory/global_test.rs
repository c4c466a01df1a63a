/*!
 * Global Manager Tests
 * Process-wide singleton and the plain-value bridge
 */

use native_mem::memory::bridge;
use native_mem::{global, NULL_HANDLE};
use pretty_assertions::assert_eq;
use serial_test::serial;

#[test]
#[serial]
fn test_bridge_pool_lifecycle() {
    if global().backend_kind() != native_mem::BackendKind::Pool {
        return;
    }

    assert!(bridge::initialize_pool(1024));

    let a = bridge::allocate(100, "a");
    let b = bridge::allocate(200, "b");
    assert_ne!(a, NULL_HANDLE);
    assert_ne!(b, NULL_HANDLE);
    assert!(bridge::free(a));

    let c = bridge::allocate(50, "c");
    assert_eq!(c, a);
    assert_eq!(bridge::total_allocated(), 250);
    assert_eq!(bridge::available(), 774);

    assert_eq!(bridge::allocate(0, "zero"), NULL_HANDLE);
    assert_eq!(bridge::allocate(2048, "huge"), NULL_HANDLE);
    assert!(!bridge::free(0xdead_0000));

    bridge::free_all();
    bridge::defragment();
    assert_eq!(bridge::total_allocated(), 0);
    assert!((bridge::fragmentation_ratio() - 1.0).abs() < 1e-9);
}

#[test]
#[serial]
fn test_global_shutdown_and_reinitialize() {
    if global().backend_kind() != native_mem::BackendKind::Pool {
        return;
    }

    assert!(bridge::initialize_pool(512));
    native_mem::shutdown_global();
    assert_eq!(bridge::allocate(8, "after"), NULL_HANDLE);
    assert_eq!(bridge::total_allocated(), 0);

    assert!(bridge::initialize_pool(512));
    assert_ne!(bridge::allocate(8, "again"), NULL_HANDLE);
    bridge::free_all();
}
