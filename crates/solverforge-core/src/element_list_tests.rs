//! Tests for arena-backed backpointer lists.

use super::element_list::ElementAwareLists;
use super::error::SolverForgeError;

fn values(lists: &ElementAwareLists<i32>, list: super::ListId) -> Vec<i32> {
    lists.iter(list).copied().collect()
}

#[test]
fn test_add_preserves_order() {
    let mut lists = ElementAwareLists::new();
    let list = lists.new_list();
    for i in 0..5 {
        lists.add(list, i).unwrap();
    }
    assert_eq!(values(&lists, list), vec![0, 1, 2, 3, 4]);
    assert_eq!(lists.len(list), 5);
}

#[test]
fn test_remove_first_middle_last() {
    let mut lists = ElementAwareLists::new();
    let list = lists.new_list();
    let entries: Vec<_> = (0..5).map(|i| lists.add(list, i).unwrap()).collect();

    assert_eq!(lists.remove(entries[2]).unwrap(), 2);
    assert_eq!(values(&lists, list), vec![0, 1, 3, 4]);

    assert_eq!(lists.remove(entries[0]).unwrap(), 0);
    assert_eq!(values(&lists, list), vec![1, 3, 4]);

    assert_eq!(lists.remove(entries[4]).unwrap(), 4);
    assert_eq!(values(&lists, list), vec![1, 3]);

    // Appending after removing the tail links onto the new tail.
    lists.add(list, 9).unwrap();
    assert_eq!(values(&lists, list), vec![1, 3, 9]);
}

#[test]
fn test_remove_twice_is_stale() {
    let mut lists = ElementAwareLists::new();
    let list = lists.new_list();
    let entry = lists.add(list, 1).unwrap();
    lists.remove(entry).unwrap();

    assert!(matches!(
        lists.remove(entry),
        Err(SolverForgeError::StaleHandle)
    ));
    assert!(lists.is_empty(list));
}

#[test]
fn test_lists_are_independent() {
    let mut lists = ElementAwareLists::new();
    let left = lists.new_list();
    let right = lists.new_list();
    let l = lists.add(left, 1).unwrap();
    let r = lists.add(right, 2).unwrap();

    assert_eq!(lists.list_of(l).unwrap(), left);
    assert_eq!(lists.list_of(r).unwrap(), right);
    assert_eq!(lists.entry_count(), 2);

    lists.remove(l).unwrap();
    assert!(lists.is_empty(left));
    assert_eq!(values(&lists, right), vec![2]);
}

#[test]
fn test_remove_list_drains_entries() {
    let mut lists = ElementAwareLists::new();
    let list = lists.new_list();
    let entry = lists.add(list, 7).unwrap();
    lists.add(list, 8).unwrap();

    assert_eq!(lists.remove_list(list).unwrap(), vec![7, 8]);
    assert!(!lists.contains_list(list));
    assert_eq!(lists.entry_count(), 0);
    assert!(lists.get(entry).is_none());
    assert!(matches!(
        lists.add(list, 9),
        Err(SolverForgeError::StaleHandle)
    ));
}

#[test]
fn test_entries_iterates_handles() {
    let mut lists = ElementAwareLists::new();
    let list = lists.new_list();
    let a = lists.add(list, 1).unwrap();
    let b = lists.add(list, 2).unwrap();

    let handles: Vec<_> = lists.entries(list).collect();
    assert_eq!(handles, vec![a, b]);
    assert_eq!(lists.to_vec(list), vec![1, 2]);
}
