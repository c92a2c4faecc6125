use std::cell::RefCell;
use std::rc::Rc;

use erased_storage::{type_list, Storage, VariantStorage};

type Log = Rc<RefCell<Vec<String>>>;

macro_rules! traced {
    ($name:ident) => {
        struct $name(Log);

        impl $name {
            fn new(log: &Log) -> Self {
                log.borrow_mut().push(format!("new {}", stringify!($name)));
                $name(log.clone())
            }
        }

        impl Clone for $name {
            fn clone(&self) -> Self {
                $name::new(&self.0)
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.0.borrow_mut().push(format!("drop {}", stringify!($name)));
            }
        }
    };
}

traced!(A);
traced!(B);
traced!(C);

type Abc = type_list![A, B, C];

#[test]
fn replacing_drops_before_constructing() {
    let log = Log::default();
    let mut storage: VariantStorage<Abc> = VariantStorage::new();

    storage.emplace_with(|| B::new(&log));
    assert_eq!(storage.tag(), Some(1));

    storage.emplace_with(|| A::new(&log));
    assert_eq!(storage.tag(), Some(0));
    assert!(storage.holds::<A, _>());
    assert_eq!(*log.borrow(), ["new B", "drop B", "new A"]);

    drop(storage);
    assert_eq!(log.borrow().last().map(String::as_str), Some("drop A"));
}

#[test]
fn clone_and_take() {
    let log = Log::default();
    let mut storage: VariantStorage<Abc> = VariantStorage::new();
    storage.emplace(C::new(&log));

    let copy = storage.clone();
    assert_eq!(copy.tag(), Some(2));
    assert_ne!(copy.data(), storage.data());

    let moved = std::mem::take(&mut storage);
    assert!(storage.is_empty());
    assert_eq!(moved.tag(), Some(2));

    drop(moved);
    drop(copy);
    assert_eq!(*log.borrow(), ["new C", "new C", "drop C", "drop C"]);
    assert_eq!(Rc::strong_count(&log), 1);
}

#[test]
fn typed_access() {
    let mut storage: VariantStorage<type_list![u32, String]> = VariantStorage::new();
    storage.emplace(String::from("x"));
    storage.get_mut::<String, _>().unwrap().push('y');
    assert_eq!(storage.get::<u32, _>(), None);
    assert_eq!(storage.get::<String, _>().map(String::as_str), Some("xy"));

    storage.reset();
    assert_eq!(storage.tag(), None);
    assert_eq!(storage.get::<String, _>(), None);
}
