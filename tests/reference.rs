use erased_storage::space::S2;
use erased_storage::{HeapStorage, RefStorage, SboStorage, Storage};

#[test]
fn view_of_owning_storages() {
    let mut sbo: SboStorage<S2> = SboStorage::new();
    sbo.emplace(10u32).unwrap();
    let mut heap: HeapStorage = HeapStorage::new();
    heap.emplace(20u32).unwrap();

    let total: u32 = [RefStorage::borrow(&sbo), RefStorage::borrow(&heap)]
        .iter()
        .filter_map(|r| unsafe { r.downcast_ref::<u32>() })
        .sum();
    assert_eq!(total, 30);
}

#[test]
fn write_through_borrowed_storage() {
    let mut heap: HeapStorage = HeapStorage::new();
    heap.emplace(vec![1u8]).unwrap();
    {
        let mut view = RefStorage::borrow_mut(&mut heap);
        unsafe { view.downcast_mut::<Vec<u8>>() }.unwrap().push(2);
    }
    assert_eq!(unsafe { heap.downcast_ref::<Vec<u8>>() }, Some(&vec![1, 2]));
}

#[test]
fn empty_storage_gives_empty_view() {
    let sbo: SboStorage = SboStorage::new();
    assert!(RefStorage::borrow(&sbo).is_empty());
}
