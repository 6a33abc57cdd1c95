//! Tests for the generational arena.

use super::arena::Arena;

#[test]
fn test_insert_and_get() {
    let mut arena = Arena::new();
    let a = arena.insert(10);
    let b = arena.insert(20);

    assert_eq!(arena.len(), 2);
    assert_eq!(arena.get(a), Some(&10));
    assert_eq!(arena.get(b), Some(&20));
}

#[test]
fn test_stale_handle_after_reuse() {
    let mut arena = Arena::new();
    let a = arena.insert("first");
    assert_eq!(arena.remove(a), Some("first"));
    assert_eq!(arena.remove(a), None);

    let b = arena.insert("second");
    assert_eq!(b.index(), a.index());
    assert_ne!(b.generation(), a.generation());
    assert_eq!(arena.get(a), None);
    assert!(!arena.contains(a));
    assert_eq!(arena.get(b), Some(&"second"));
}

#[test]
fn test_get_mut() {
    let mut arena = Arena::new();
    let a = arena.insert(1);
    if let Some(value) = arena.get_mut(a) {
        *value += 41;
    }
    assert_eq!(arena.get(a), Some(&42));
}

#[test]
fn test_free_list_reuses_all_slots() {
    let mut arena = Arena::with_capacity(4);
    let handles: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();
    for handle in &handles {
        arena.remove(*handle);
    }
    assert!(arena.is_empty());

    let reused: Vec<_> = (0..4).map(|i| arena.insert(i * 10)).collect();
    let mut indices: Vec<_> = reused.iter().map(|h| h.index()).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(arena.len(), 4);
}

#[test]
fn test_clear_invalidates_handles() {
    let mut arena = Arena::new();
    let a = arena.insert('a');
    let _b = arena.insert('b');
    arena.clear();

    assert!(arena.is_empty());
    assert_eq!(arena.get(a), None);
    assert_eq!(arena.iter().count(), 0);
}

#[test]
fn test_iter_skips_vacant_slots() {
    let mut arena = Arena::new();
    let _a = arena.insert(1);
    let b = arena.insert(2);
    let _c = arena.insert(3);
    arena.remove(b);

    let values: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![1, 3]);
}
