//! Small-buffer storage: inline when the value fits, heap otherwise.

use core::alloc::Layout;
use core::fmt;
use core::mem::{align_of, size_of, ManuallyDrop, MaybeUninit};
use core::ptr::{self, NonNull};

#[cfg(not(feature = "std"))]
use alloc::alloc::handle_alloc_error;
#[cfg(feature = "std")]
use std::alloc::handle_alloc_error;

use crate::raw_alloc;
use crate::space::S2;
use crate::table::{CopyPolicy, Copyable, Erasable, MoveOnly, ResourceTable};
use crate::{AllocError, Emplace, Storage};

/// An [`SboStorage`] that accepts values which are not [`Clone`], and is not [`Clone`] itself.
///
/// ```compile_fail
/// use erased_storage::MoveOnlySboStorage;
///
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<MoveOnlySboStorage>();
/// ```
pub type MoveOnlySboStorage<Space = S2> = SboStorage<Space, MoveOnly>;

#[repr(C)]
union Buffer<Space> {
    inline: ManuallyDrop<MaybeUninit<Space>>,
    heap: NonNull<u8>,
}

/// Storage that keeps small values inline and falls back to the heap for large ones.
///
/// A value is stored inline iff its size and alignment fit `Space`. Whether the current value is
/// on the heap is derived from its [`ResourceTable`] layout, never stored separately, which is
/// what lets values move between storages with different spaces.
///
/// # Example
///
/// ```
/// use erased_storage::space::S4;
/// use erased_storage::{SboStorage, Storage};
///
/// let mut storage: SboStorage<S4> = SboStorage::new();
///
/// storage.emplace([0usize; 2]).unwrap();
/// assert!(!storage.is_heap_allocated());
///
/// storage.emplace([1usize; 8]).unwrap();
/// assert!(storage.is_heap_allocated());
/// assert_eq!(unsafe { storage.downcast_ref::<[usize; 8]>() }, Some(&[1; 8]));
/// ```
pub struct SboStorage<Space = S2, P: CopyPolicy = Copyable> {
    buffer: Buffer<Space>,
    table: Option<&'static ResourceTable<P>>,
}

impl<Space, P: CopyPolicy> SboStorage<Space, P> {
    /// An empty storage.
    #[inline]
    pub const fn new() -> Self {
        SboStorage {
            buffer: Buffer {
                inline: ManuallyDrop::new(MaybeUninit::uninit()),
            },
            table: None,
        }
    }

    /// The size and alignment available to inline values.
    #[inline]
    pub const fn capacity() -> Layout {
        Layout::new::<Space>()
    }

    /// Returns true if a `T` would be stored inline.
    #[inline]
    pub const fn fits<T>() -> bool {
        size_of::<T>() <= size_of::<Space>() && align_of::<T>() <= align_of::<Space>()
    }

    /// Returns true if the current value lives in a heap allocation.
    #[inline]
    pub fn is_heap_allocated(&self) -> bool {
        self.table.is_some_and(|table| !table.fits_in(Self::capacity()))
    }

    /// Returns the resource table of the stored value.
    #[inline]
    pub fn table(&self) -> Option<&'static ResourceTable<P>> {
        self.table
    }

    /// Drops the current value, then stores `value`.
    ///
    /// Returns an error if `value` needs a heap allocation that cannot be served. The storage is
    /// empty in that case.
    #[inline]
    pub fn emplace<T: Erasable<P>>(&mut self, value: T) -> Result<&mut T, AllocError> {
        self.emplace_with(|| value)
    }

    /// Drops the current value, then stores the value returned by `f`.
    pub fn emplace_with<T: Erasable<P>, F: FnOnce() -> T>(
        &mut self,
        f: F,
    ) -> Result<&mut T, AllocError> {
        self.reset();
        let value = f();

        let slot = if Self::fits::<T>() {
            self.inline_ptr().cast::<T>()
        } else {
            trace_event!(
                size = size_of::<T>(),
                align = align_of::<T>(),
                "value exceeds inline space, allocating"
            );
            let block = raw_alloc::allocate(Layout::new::<T>()).ok_or(AllocError)?;
            self.buffer.heap = block;
            block.as_ptr().cast::<T>()
        };

        unsafe {
            slot.write(value);
            self.table = Some(T::TABLE);
            Ok(&mut *slot)
        }
    }

    /// Moves the value out of `src`, leaving it empty.
    ///
    /// `src` may have any space. A value that fits this storage is moved inline, wherever it
    /// lived in `src`. Otherwise a heap allocation in `src` is taken over as is, and an inline
    /// value is moved into a new allocation.
    ///
    /// On error `src` is left untouched and this storage is empty.
    pub fn move_from<Other>(&mut self, src: &mut SboStorage<Other, P>) -> Result<(), AllocError> {
        self.reset();
        let Some(table) = src.table else {
            return Ok(());
        };
        let src_on_heap = src.is_heap_allocated();

        if table.fits_in(Self::capacity()) {
            unsafe {
                (table.relocate)(src.value_ptr(), self.inline_ptr());
                if src_on_heap {
                    raw_alloc::deallocate(src.buffer.heap, table.layout());
                }
            }
        } else if src_on_heap {
            self.buffer.heap = unsafe { src.buffer.heap };
        } else {
            trace_event!(
                size = table.layout().size(),
                align = table.layout().align(),
                "moving inline value to the heap"
            );
            let block = unsafe { (table.heap_relocate)(src.inline_ptr()) }.ok_or(AllocError)?;
            self.buffer.heap = block;
        }

        src.table = None;
        self.table = Some(table);
        Ok(())
    }

    /// Transforms into a storage with a different space.
    ///
    /// A heap value that still does not fit keeps its allocation. Returns `self` back if a
    /// required allocation fails.
    ///
    /// # Example
    ///
    /// ```
    /// use erased_storage::space::{S1, S2, S4};
    /// use erased_storage::SboStorage;
    ///
    /// let mut s: SboStorage<S4> = SboStorage::new();
    /// s.emplace([0usize; 2]).unwrap();
    ///
    /// let m: SboStorage<S2> = s.resize().unwrap();
    /// assert!(!m.is_heap_allocated());
    ///
    /// let xs: SboStorage<S1> = m.resize().unwrap();
    /// assert!(xs.is_heap_allocated());
    /// ```
    pub fn resize<ToSpace>(mut self) -> Result<SboStorage<ToSpace, P>, Self> {
        let mut result = SboStorage::new();
        match result.move_from(&mut self) {
            Ok(()) => Ok(result),
            Err(AllocError) => Err(self),
        }
    }

    #[inline]
    fn inline_ptr(&mut self) -> *mut u8 {
        ptr::addr_of_mut!(self.buffer).cast()
    }

    /// Address of the live value, inline or not.
    ///
    /// # Safety
    ///
    /// The storage must not be empty.
    #[inline]
    unsafe fn value_ptr(&mut self) -> *mut u8 {
        if self.is_heap_allocated() {
            self.buffer.heap.as_ptr()
        } else {
            self.inline_ptr()
        }
    }
}

impl<Space> SboStorage<Space, Copyable> {
    /// Drops the current value, then stores a clone of the value in `src`.
    ///
    /// `src` may have any space; the clone is placed inline iff it fits this storage.
    pub fn copy_from<Other>(&mut self, src: &SboStorage<Other, Copyable>) -> Result<(), AllocError> {
        self.reset();
        let Some(table) = src.table else {
            return Ok(());
        };
        let from = src.data().cast::<u8>();

        if table.fits_in(Self::capacity()) {
            unsafe { (table.clone)(from, self.inline_ptr()) };
        } else {
            trace_event!(
                size = table.layout().size(),
                align = table.layout().align(),
                "cloning value to the heap"
            );
            let block = unsafe { (table.heap_clone)(from) }.ok_or(AllocError)?;
            self.buffer.heap = block;
        }

        self.table = Some(table);
        Ok(())
    }

    /// Clones the storage, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let mut result = SboStorage::new();
        result.copy_from(self)?;
        Ok(result)
    }
}

impl<Space, P: CopyPolicy> Storage for SboStorage<Space, P> {
    #[inline]
    fn data(&self) -> *const () {
        match self.table {
            None => ptr::null(),
            Some(table) if table.fits_in(Self::capacity()) => ptr::addr_of!(self.buffer).cast(),
            Some(_) => unsafe { self.buffer.heap.as_ptr().cast_const().cast() },
        }
    }

    #[inline]
    fn data_mut(&mut self) -> *mut () {
        match self.table {
            None => ptr::null_mut(),
            Some(_) => unsafe { self.value_ptr().cast() },
        }
    }

    fn reset(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };

        unsafe {
            if table.fits_in(Self::capacity()) {
                (table.drop)(self.inline_ptr());
            } else {
                (table.heap_drop)(self.buffer.heap);
            }
        }
    }
}

impl<Space, P: CopyPolicy, T: Erasable<P>> Emplace<T> for SboStorage<Space, P> {
    #[inline]
    fn try_emplace_with<F>(&mut self, f: F) -> Result<&mut T, AllocError>
    where
        F: FnOnce() -> T,
    {
        self.emplace_with(f)
    }
}

impl<Space, P: CopyPolicy> Default for SboStorage<Space, P> {
    fn default() -> Self {
        SboStorage::new()
    }
}

impl<Space, P: CopyPolicy> Drop for SboStorage<Space, P> {
    fn drop(&mut self) {
        self.reset()
    }
}

impl<Space> Clone for SboStorage<Space, Copyable> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(result) => result,
            Err(AllocError) => {
                handle_alloc_error(self.table.map_or(Layout::new::<()>(), |t| t.layout()))
            }
        }
    }
}

impl<Space, P: CopyPolicy> fmt::Debug for SboStorage<Space, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SboStorage")
            .field("capacity", &Self::capacity())
            .field("table", &self.table)
            .field("heap", &self.is_heap_allocated())
            .finish()
    }
}
