//! Always-allocating storage with self-describing heap blocks.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

#[cfg(not(feature = "std"))]
use alloc::alloc::handle_alloc_error;
#[cfg(feature = "std")]
use std::alloc::handle_alloc_error;

use crate::raw_alloc;
use crate::table::{BlockCloneFn, CopyPolicy, Copyable, Erasable, MoveOnly};
use crate::{AllocError, Emplace, Storage};

/// A [`HeapStorage`] that accepts values which are not [`Clone`], and is not [`Clone`] itself.
///
/// ```compile_fail
/// use erased_storage::MoveOnlyHeapStorage;
///
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<MoveOnlyHeapStorage>();
/// ```
pub type MoveOnlyHeapStorage = HeapStorage<MoveOnly>;

/// Per-block operations, stored in front of the value.
///
/// The header only depends on the policy, so a block can be dropped or cloned without knowing
/// the type of its value.
#[repr(C)]
pub(crate) struct Header<P: CopyPolicy> {
    drop: unsafe fn(NonNull<u8>),
    clone: P::CloneFn<BlockCloneFn>,
    value: NonNull<u8>,
    layout: Layout,
}

#[repr(C)]
pub(crate) struct Block<T, P: CopyPolicy> {
    header: Header<P>,
    value: T,
}

impl<T, P: CopyPolicy> Block<T, P> {
    fn allocate(
        value: T,
        drop: unsafe fn(NonNull<u8>),
        clone: P::CloneFn<BlockCloneFn>,
    ) -> Option<NonNull<u8>> {
        let layout = Layout::new::<Self>();
        let raw = raw_alloc::allocate(layout)?;
        let block = raw.as_ptr().cast::<Self>();

        unsafe {
            let value_ptr = ptr::addr_of_mut!((*block).value);
            value_ptr.write(value);
            ptr::addr_of_mut!((*block).header).write(Header {
                drop,
                clone,
                value: NonNull::new_unchecked(value_ptr.cast()),
                layout,
            });
        }

        trace_event!(size = layout.size(), align = layout.align(), "allocated heap block");
        Some(raw)
    }
}

/// Drops the value of a `Block<T, P>` and releases the block.
///
/// # Safety
///
/// `block` must have been created by `Block::<T, P>::allocate` and must not be used again.
pub(crate) unsafe fn drop_block<T, P: CopyPolicy>(block: NonNull<u8>) {
    ptr::drop_in_place(block.as_ptr().cast::<Block<T, P>>());
    raw_alloc::deallocate(block, Layout::new::<Block<T, P>>());
}

/// Allocates a new block holding a clone of the value in `block`.
///
/// # Safety
///
/// `block` must have been created by `Block::<T, Copyable>::allocate` and must be live.
pub(crate) unsafe fn clone_block<T: Clone>(block: NonNull<u8>) -> Option<NonNull<u8>> {
    let src = &*block.as_ptr().cast::<Block<T, Copyable>>();
    Block::<T, Copyable>::allocate(src.value.clone(), src.header.drop, src.header.clone)
}

/// Storage that always keeps its value in a heap block.
///
/// The block carries its own drop (and, for [`Copyable`], clone) function, so the storage itself
/// is a single nullable pointer. Moving the storage never moves the value.
///
/// # Example
///
/// ```
/// use erased_storage::{HeapStorage, Storage};
///
/// let mut storage: HeapStorage = HeapStorage::new();
/// storage.emplace(String::from("boxed")).unwrap();
///
/// let address = storage.data();
/// let moved = storage;
/// assert_eq!(moved.data(), address);
/// ```
pub struct HeapStorage<P: CopyPolicy = Copyable> {
    block: Option<NonNull<u8>>,
    _phantom: PhantomData<P>,
}

impl<P: CopyPolicy> HeapStorage<P> {
    /// An empty storage.
    #[inline]
    pub const fn new() -> Self {
        HeapStorage {
            block: None,
            _phantom: PhantomData,
        }
    }

    /// Drops the current value, then stores `value` in a new block.
    #[inline]
    pub fn emplace<T: Erasable<P>>(&mut self, value: T) -> Result<&mut T, AllocError> {
        self.emplace_with(|| value)
    }

    /// Drops the current value, then stores the value returned by `f` in a new block.
    ///
    /// On error the storage is empty.
    pub fn emplace_with<T: Erasable<P>, F: FnOnce() -> T>(
        &mut self,
        f: F,
    ) -> Result<&mut T, AllocError> {
        self.reset();
        let table = T::TABLE;
        let block =
            Block::<T, P>::allocate(f(), table.block_drop, table.block_clone).ok_or(AllocError)?;
        self.block = Some(block);
        unsafe { Ok(&mut (*block.as_ptr().cast::<Block<T, P>>()).value) }
    }

    /// Layout of the whole block, header included.
    #[inline]
    pub fn block_layout(&self) -> Option<Layout> {
        self.header().map(|header| header.layout)
    }

    #[inline]
    fn header(&self) -> Option<&Header<P>> {
        self.block
            .map(|block| unsafe { &*block.as_ptr().cast::<Header<P>>() })
    }
}

impl HeapStorage<Copyable> {
    /// Drops the current value, then stores a clone of the value in `src`.
    pub fn copy_from(&mut self, src: &HeapStorage<Copyable>) -> Result<(), AllocError> {
        self.reset();
        if let (Some(block), Some(header)) = (src.block, src.header()) {
            let copy = unsafe { (header.clone)(block) }.ok_or(AllocError)?;
            self.block = Some(copy);
        }
        Ok(())
    }

    /// Clones the storage, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let mut result = HeapStorage::new();
        result.copy_from(self)?;
        Ok(result)
    }
}

impl<P: CopyPolicy> Storage for HeapStorage<P> {
    #[inline]
    fn data(&self) -> *const () {
        match self.header() {
            Some(header) => header.value.as_ptr().cast_const().cast(),
            None => ptr::null(),
        }
    }

    #[inline]
    fn data_mut(&mut self) -> *mut () {
        match self.header() {
            Some(header) => header.value.as_ptr().cast(),
            None => ptr::null_mut(),
        }
    }

    fn reset(&mut self) {
        if let Some(block) = self.block.take() {
            unsafe {
                let drop = (*block.as_ptr().cast::<Header<P>>()).drop;
                drop(block);
            }
        }
    }
}

impl<P: CopyPolicy, T: Erasable<P>> Emplace<T> for HeapStorage<P> {
    #[inline]
    fn try_emplace_with<F>(&mut self, f: F) -> Result<&mut T, AllocError>
    where
        F: FnOnce() -> T,
    {
        self.emplace_with(f)
    }
}

impl<P: CopyPolicy> Default for HeapStorage<P> {
    fn default() -> Self {
        HeapStorage::new()
    }
}

impl<P: CopyPolicy> Drop for HeapStorage<P> {
    fn drop(&mut self) {
        self.reset()
    }
}

impl Clone for HeapStorage<Copyable> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(result) => result,
            Err(AllocError) => {
                handle_alloc_error(self.block_layout().unwrap_or(Layout::new::<()>()))
            }
        }
    }
}

impl<P: CopyPolicy> fmt::Debug for HeapStorage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapStorage")
            .field("block", &self.block)
            .field("layout", &self.block_layout())
            .finish()
    }
}
