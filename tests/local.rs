mod common;

use common::{live, no_leaks, Counted};
use erased_storage::space::{Space, S1, S2, S4};
use erased_storage::{Emplace, LocalStorage, MoveOnlyLocalStorage, Storage};

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(8))]
struct Payload {
    a: u64,
    b: u32,
    c: [u8; 12],
}

#[test]
fn payload_of_24_bytes() {
    assert_eq!(core::mem::size_of::<Payload>(), 24);

    let value = Payload {
        a: 1,
        b: 2,
        c: [3; 12],
    };
    let mut storage: LocalStorage<Space<32, 8>> = LocalStorage::new();
    storage.emplace(value);
    assert_eq!(unsafe { storage.downcast_ref::<Payload>() }, Some(&value));

    let moved = core::mem::take(&mut storage);
    assert!(storage.is_empty());
    assert_eq!(unsafe { moved.downcast_ref::<Payload>() }, Some(&value));
}

#[test]
fn default_is_empty() {
    let storage: LocalStorage<S4> = LocalStorage::default();
    assert!(storage.is_empty());
    assert!(storage.data().is_null());
    assert!(storage.table().is_none());
}

#[test]
fn destructor_runs_once() {
    no_leaks(|| {
        let mut storage: LocalStorage<S2> = LocalStorage::new();
        storage.emplace(Counted::unit(1));
        assert_eq!(live(), 1);

        storage.emplace(Counted::unit(2));
        assert_eq!(live(), 1);

        let mut other: LocalStorage<S2> = LocalStorage::new();
        other.move_from(&mut storage);
        assert_eq!(live(), 1);
        assert_eq!(unsafe { other.downcast_ref::<Counted>() }.map(|c| c.id), Some(2));

        storage.reset();
        assert_eq!(live(), 1);
    });
}

#[test]
fn move_only_values() {
    struct Token(Counted);

    no_leaks(|| {
        let mut storage: MoveOnlyLocalStorage<S2> = LocalStorage::new();
        storage.emplace(Token(Counted::unit(7)));
        let grown: MoveOnlyLocalStorage<S4> = storage.resize();
        assert_eq!(unsafe { grown.downcast_ref::<Token>() }.map(|t| t.0.id), Some(7));
    });
}

#[test]
fn copies_are_independent() {
    no_leaks(|| {
        let mut a: LocalStorage<S4> = LocalStorage::new();
        a.emplace(Counted::new(1, [0u8; 8]));

        let mut b = a.clone();
        assert_eq!(live(), 2);
        assert_ne!(a.data(), b.data());

        unsafe { b.downcast_mut::<Counted<[u8; 8]>>() }.unwrap().pad[0] = 1;
        assert_eq!(unsafe { a.downcast_ref::<Counted<[u8; 8]>>() }.unwrap().pad, [0; 8]);

        let mut c: LocalStorage<S4> = LocalStorage::new();
        c.emplace(0u8);
        c.clone_from(&a);
        assert_eq!(live(), 3);
    });
}

#[test]
fn emplace_through_trait() {
    fn fill<S: Emplace<u16>>(storage: &mut S) {
        *storage.try_emplace(1).unwrap() += 1;
    }

    let mut storage: LocalStorage<S1> = LocalStorage::new();
    fill(&mut storage);
    assert_eq!(unsafe { storage.downcast_ref::<u16>() }, Some(&2));
}

#[test]
fn debug_reports_capacity() {
    let storage: LocalStorage<Space<16, 8>> = LocalStorage::new();
    let debug = format!("{:?}", storage);
    assert!(debug.starts_with("LocalStorage { capacity: Layout { size: 16"));
    assert!(debug.ends_with("table: None }"));
}
