//! Raw aligned allocation.
//!
//! Every heap allocation made by the storages in this crate goes through this module. Failure is
//! reported as `None` instead of aborting, so that callers can hand an
//! [`AllocError`](crate::AllocError) back to their own callers.

use core::ptr::NonNull;

#[cfg(not(feature = "std"))]
use alloc::alloc::{self, Layout};
#[cfg(feature = "std")]
use std::alloc::{self, Layout};

use crate::sptr;

/// Allocate a block of memory for `layout` from the global allocator.
///
/// Zero-sized layouts never touch the allocator and yield a dangling pointer aligned to
/// `layout.align()`. Returns `None` if the allocator reports failure.
///
/// # Example
///
/// ```
/// use core::alloc::Layout;
/// use erased_storage::raw_alloc;
///
/// let layout = Layout::new::<[u64; 4]>();
/// let block = raw_alloc::allocate(layout).unwrap();
/// assert_eq!(block.as_ptr() as usize % layout.align(), 0);
/// unsafe { raw_alloc::deallocate(block, layout) };
/// ```
pub fn allocate(layout: Layout) -> Option<NonNull<u8>> {
    if layout.size() == 0 {
        return NonNull::new(sptr::dangling_aligned(layout.align()));
    }

    // SAFETY: the layout has a non-zero size.
    let block = NonNull::new(unsafe { alloc::alloc(layout) });
    if block.is_none() {
        warn_event!(
            size = layout.size(),
            align = layout.align(),
            "allocation failed"
        );
    }
    block
}

/// Release a block obtained from [`allocate`].
///
/// # Safety
///
/// - `block` must have been returned by [`allocate`] with the same `layout`.
/// - `block` must not be used after this call.
pub unsafe fn deallocate(block: NonNull<u8>, layout: Layout) {
    if layout.size() != 0 {
        alloc::dealloc(block.as_ptr(), layout);
    }
}
