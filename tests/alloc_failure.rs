mod common;

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::ptr;

use common::{live, no_leaks, Counted};
use erased_storage::space::{S1, S8};
use erased_storage::{AllocError, HeapStorage, MoveOnlySboStorage, SboStorage, Storage};

thread_local! {
    static FAIL: Cell<bool> = const { Cell::new(false) };
}

/// Fails every allocation made on a thread inside [`failing`].
struct FailOnDemand;

unsafe impl GlobalAlloc for FailOnDemand {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if FAIL.try_with(Cell::get).unwrap_or(false) {
            ptr::null_mut()
        } else {
            System.alloc(layout)
        }
    }

    unsafe fn dealloc(&self, block: *mut u8, layout: Layout) {
        System.dealloc(block, layout)
    }
}

#[global_allocator]
static ALLOCATOR: FailOnDemand = FailOnDemand;

// Nothing inside `f` may allocate on purpose, including assertion messages.
fn failing<R>(f: impl FnOnce() -> R) -> R {
    FAIL.with(|fail| fail.set(true));
    let result = f();
    FAIL.with(|fail| fail.set(false));
    result
}

type Large = Counted<[u64; 3]>;

#[test]
fn sbo_emplace_leaves_storage_empty() {
    no_leaks(|| {
        let mut storage: SboStorage<S1> = SboStorage::new();
        storage.emplace(Counted::unit(1)).unwrap();

        let result = failing(|| storage.emplace(Counted::new(2, [0u64; 3])).map(|_| ()));
        assert_eq!(result, Err(AllocError));
        assert!(storage.is_empty());
        assert_eq!(live(), 0);
    });
}

#[test]
fn sbo_move_to_heap_leaves_source_untouched() {
    no_leaks(|| {
        let mut src: MoveOnlySboStorage<S8> = SboStorage::new();
        src.emplace(Counted::new(3, [7u64; 3])).unwrap();
        let mut dst: MoveOnlySboStorage<S1> = SboStorage::new();
        dst.emplace(Counted::unit(4)).unwrap();

        let result = failing(|| dst.move_from(&mut src));
        assert_eq!(result, Err(AllocError));
        assert!(dst.is_empty());
        assert!(!src.is_heap_allocated());
        assert_eq!(
            unsafe { src.downcast_ref::<Large>() }.map(|c| (c.id, c.pad)),
            Some((3, [7; 3]))
        );
        assert_eq!(live(), 1);
    });
}

#[test]
fn sbo_copy_to_heap_drops_the_clone() {
    no_leaks(|| {
        let mut src: SboStorage<S1> = SboStorage::new();
        src.emplace(Counted::new(5, [1u64; 3])).unwrap();
        let mut dst: SboStorage<S1> = SboStorage::new();

        let result = failing(|| dst.copy_from(&src));
        assert_eq!(result, Err(AllocError));
        assert!(dst.is_empty());
        assert_eq!(unsafe { src.downcast_ref::<Large>() }.map(|c| c.id), Some(5));
        assert_eq!(live(), 1);
    });
}

#[test]
fn sbo_resize_hands_back_the_storage() {
    no_leaks(|| {
        let mut storage: SboStorage<S8> = SboStorage::new();
        storage.emplace(Counted::new(6, [2u64; 3])).unwrap();

        let result = failing(|| storage.resize::<S1>());
        let storage = match result {
            Ok(_) => panic!("resize to a smaller space needs an allocation"),
            Err(storage) => storage,
        };
        assert!(!storage.is_heap_allocated());
        assert_eq!(unsafe { storage.downcast_ref::<Large>() }.map(|c| c.id), Some(6));
    });
}

#[test]
fn heap_emplace_leaves_storage_empty() {
    no_leaks(|| {
        let mut storage: HeapStorage = HeapStorage::new();
        storage.emplace(Counted::unit(7)).unwrap();

        let result = failing(|| storage.emplace(Counted::unit(8)).map(|_| ()));
        assert_eq!(result, Err(AllocError));
        assert!(storage.is_empty());
        assert_eq!(storage.block_layout(), None);
        assert_eq!(live(), 0);
    });
}

#[test]
fn heap_try_clone_reports_failure() {
    no_leaks(|| {
        let mut storage: HeapStorage = HeapStorage::new();
        storage.emplace(Counted::unit(9)).unwrap();

        let result = failing(|| storage.try_clone().map(|_| ()));
        assert_eq!(result, Err(AllocError));
        assert_eq!(unsafe { storage.downcast_ref::<Counted>() }.map(|c| c.id), Some(9));
        assert_eq!(live(), 1);
    });
}
