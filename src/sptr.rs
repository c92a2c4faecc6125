//! Pointer provenance helpers.

#[cfg(feature = "nightly")]
mod implementation {
    pub use core::ptr::without_provenance_mut;
}

#[cfg(not(feature = "nightly"))]
#[allow(clippy::as_conversions)]
mod implementation {
    pub fn without_provenance_mut<T>(addr: usize) -> *mut T {
        addr as _
    }
}

pub use implementation::*;

/// A dangling, well-aligned, non-null address for zero-sized allocations.
pub fn dangling_aligned(align: usize) -> *mut u8 {
    debug_assert!(align.is_power_of_two());
    without_provenance_mut(align)
}
