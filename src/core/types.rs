/*!
 * Core Types
 * Common types used across the allocator
 */

/// Address type for memory operations
pub type Address = usize;

/// Size type for memory operations
pub type Size = usize;

/// Opaque handle handed across the language boundary.
///
/// Wide enough to carry any native address; `0` never names a live region.
pub type Handle = u64;

/// Handle value reported for a failed allocation
pub const NULL_HANDLE: Handle = 0;

/// Convert a native address into a boundary handle
#[inline]
pub fn handle_from_address(address: Address) -> Handle {
    address as Handle
}

/// Convert a boundary handle back into a native address
///
/// Returns `None` for the null handle or a value that does not fit in a
/// native pointer on this target.
#[inline]
pub fn address_from_handle(handle: Handle) -> Option<Address> {
    if handle == NULL_HANDLE {
        return None;
    }
    Address::try_from(handle).ok()
}
