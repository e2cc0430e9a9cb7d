use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use world_registry::engine::component::ComponentMeta;
use world_registry::engine::error::{ECSError, NotFound};
use world_registry::engine::storage::Column;

#[derive(Debug)]
struct Tracked {
    value: u32,
    drops: Arc<AtomicUsize>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked(value: u32, drops: &Arc<AtomicUsize>) -> Tracked {
    Tracked { value, drops: drops.clone() }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Marker;

#[test]
fn insert_then_read_and_overwrite() {
    let mut column = Column::new(ComponentMeta::of::<u64>(1), 8);
    column.insert(0, 10u64).unwrap();
    column.insert(3, 40u64).unwrap();

    assert_eq!(column.rows(), 4);
    assert_eq!(column.count(), 2);
    assert_eq!(*column.get::<u64>(0).unwrap(), 10);
    assert_eq!(*column.get::<u64>(3).unwrap(), 40);
    assert!(!column.is_occupied(1));
    assert_eq!(
        column.get::<u64>(1).unwrap_err(),
        ECSError::NotFound(NotFound::Row { component: 1, row: 1 })
    );

    *column.get_mut::<u64>(3).unwrap() += 2;
    column.insert(0, 11u64).unwrap();
    assert_eq!(*column.get::<u64>(0).unwrap(), 11);
    assert_eq!(*column.get::<u64>(3).unwrap(), 42);
    assert_eq!(column.count(), 2);
}

#[test]
fn typed_access_checks_the_stored_type() {
    let mut column = Column::new(ComponentMeta::of::<u32>(7), 4);
    assert!(matches!(column.insert(0, 1.0f32), Err(ECSError::TypeMismatch { .. })));
    column.insert(0, 1u32).unwrap();
    assert!(matches!(column.get::<i32>(0), Err(ECSError::TypeMismatch { .. })));
}

#[test]
fn writes_beyond_capacity_fail() {
    let mut column = Column::new(ComponentMeta::of::<u8>(2), 2);
    column.push_vacant().unwrap();
    column.push_vacant().unwrap();
    assert_eq!(
        column.push_vacant().unwrap_err(),
        ECSError::CapacityExceeded { component: 2, capacity: 2 }
    );
    assert_eq!(
        column.insert(2, 1u8).unwrap_err(),
        ECSError::CapacityExceeded { component: 2, capacity: 2 }
    );
    column.insert(1, 1u8).unwrap();
}

#[test]
fn swap_remove_moves_the_last_slot() {
    let mut column = Column::new(ComponentMeta::of::<String>(3), 8);
    for (row, s) in ["a", "b", "c"].into_iter().enumerate() {
        column.insert(row, s.to_string()).unwrap();
    }

    assert_eq!(column.swap_remove(0).unwrap(), Some(2));
    assert_eq!(column.get::<String>(0).unwrap(), "c");
    assert_eq!(column.get::<String>(1).unwrap(), "b");
    assert_eq!(column.swap_remove(1).unwrap(), None);
    assert_eq!(column.rows(), 1);
    assert_eq!(column.count(), 1);
    assert!(column.swap_remove(5).unwrap_err().is_not_found());
}

#[test]
fn swap_remove_carries_vacancy() {
    let mut column = Column::new(ComponentMeta::of::<u16>(4), 8);
    column.insert(0, 1u16).unwrap();
    column.push_vacant().unwrap();

    column.swap_remove(0).unwrap();
    assert_eq!(column.rows(), 1);
    assert!(!column.is_occupied(0));
    assert_eq!(column.count(), 0);
}

#[test]
fn values_are_dropped_exactly_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    {
        let mut column = Column::new(ComponentMeta::of::<Tracked>(5), 16);
        for row in 0..4 {
            column.insert(row, tracked(row as u32, &drops)).unwrap();
        }

        column.insert(1, tracked(100, &drops)).unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        column.swap_remove(0).unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert_eq!(column.get::<Tracked>(0).unwrap().value, 3);
    }
    // Three values were still alive when the column went away.
    assert_eq!(drops.load(Ordering::SeqCst), 5);
}

#[test]
fn move_slot_transfers_ownership() {
    let drops = Arc::new(AtomicUsize::new(0));
    let meta = ComponentMeta::of::<Tracked>(6);
    let mut src = Column::new(meta, 4);
    let mut dst = Column::new(meta, 4);

    src.insert(0, tracked(9, &drops)).unwrap();
    dst.push_vacant().unwrap();
    src.move_slot_into(0, &mut dst, 0).unwrap();

    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert!(!src.is_occupied(0));
    assert_eq!(src.count(), 0);
    assert_eq!(dst.get::<Tracked>(0).unwrap().value, 9);

    src.swap_remove(0).unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(dst);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn move_slot_rejects_other_components() {
    let mut src = Column::new(ComponentMeta::of::<u32>(1), 4);
    let mut dst = Column::new(ComponentMeta::of::<u32>(2), 4);
    src.insert(0, 5u32).unwrap();
    dst.push_vacant().unwrap();
    assert!(matches!(src.move_slot_into(0, &mut dst, 0), Err(ECSError::TypeMismatch { .. })));
    assert_eq!(*src.get::<u32>(0).unwrap(), 5);
}

#[test]
fn zero_sized_components_need_no_allocation() {
    let mut column = Column::new(ComponentMeta::of::<Marker>(8), 1_000);
    for row in 0..1_000 {
        column.insert(row, Marker).unwrap();
    }
    assert_eq!(column.count(), 1_000);
    assert_eq!(*column.get::<Marker>(999).unwrap(), Marker);
    assert_eq!(column.swap_remove(0).unwrap(), Some(999));
}

#[test]
fn values_survive_reallocation() {
    let mut column = Column::new(ComponentMeta::of::<Vec<u8>>(9), 64);
    for row in 0..64 {
        column.insert(row, vec![row as u8; 3]).unwrap();
    }
    for row in 0..64 {
        assert_eq!(column.get::<Vec<u8>>(row).unwrap(), &vec![row as u8; 3]);
    }
    assert!(column.insert(64, Vec::<u8>::new()).is_err());
}
