mod common;

use common::{live, no_leaks, Counted};
use erased_storage::{Emplace, HeapStorage, MoveOnlyHeapStorage, Storage};

#[test]
fn value_never_moves() {
    no_leaks(|| {
        let mut storage: HeapStorage = HeapStorage::new();
        storage.emplace(Counted::new(1, [0u8; 3])).unwrap();
        let address = storage.data();

        let boxed = Box::new(storage);
        assert_eq!(boxed.data(), address);

        let mut other: HeapStorage = HeapStorage::new();
        other.emplace(Counted::unit(2)).unwrap();
        other = *boxed;
        assert_eq!(other.data(), address);
        assert_eq!(live(), 1);
    });
}

#[test]
fn reset_releases_block() {
    no_leaks(|| {
        let mut storage: MoveOnlyHeapStorage = HeapStorage::new();
        storage.emplace(Counted::unit(1)).unwrap();
        assert!(storage.block_layout().is_some());

        storage.reset();
        assert!(storage.is_empty());
        assert_eq!(storage.block_layout(), None);
        assert_eq!(live(), 0);
    });
}

#[test]
fn copy_assign() {
    no_leaks(|| {
        let mut a: HeapStorage = HeapStorage::new();
        a.emplace(Counted::new(5, String::from("five"))).unwrap();

        let mut b: HeapStorage = HeapStorage::new();
        b.emplace(0u8).unwrap();
        b.copy_from(&a).unwrap();
        assert_eq!(live(), 2);

        unsafe { b.downcast_mut::<Counted<String>>() }.unwrap().pad.push('!');
        assert_eq!(unsafe { a.downcast_ref::<Counted<String>>() }.unwrap().pad, "five");
        assert_eq!(unsafe { b.downcast_ref::<Counted<String>>() }.unwrap().pad, "five!");

        let empty: HeapStorage = HeapStorage::new();
        b.copy_from(&empty).unwrap();
        assert!(b.is_empty());
        assert_eq!(live(), 1);
    });
}

#[test]
fn generic_over_storages() {
    fn store<S: Emplace<Counted>>(id: u64) -> S {
        let mut storage = S::default();
        storage.try_emplace(Counted::unit(id)).unwrap();
        storage
    }

    no_leaks(|| {
        let storage: HeapStorage = store(4);
        assert_eq!(unsafe { storage.downcast_ref::<Counted>() }.map(|c| c.id), Some(4));
    });
}
