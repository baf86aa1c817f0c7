//! Helpers over sorted, duplicate-free slices (member arrays).

use std::cmp::Ordering;

pub fn sorted_contains<T: Ord>(haystack: &[T], needle: &T) -> bool {
    haystack.binary_search(needle).is_ok()
}

/// True if every element of `small` occurs in `large`. Both must be sorted.
pub fn is_sorted_subset<T: Ord>(small: &[T], large: &[T]) -> bool {
    if small.len() > large.len() {
        return false;
    }
    let mut j = 0;
    for x in small {
        loop {
            if j == large.len() {
                return false;
            }
            match large[j].cmp(x) {
                Ordering::Less => j += 1,
                Ordering::Equal => {
                    j += 1;
                    break;
                }
                Ordering::Greater => return false,
            }
        }
    }
    true
}

/// Sorted intersection of two sorted slices.
pub fn intersect_sorted<T: Ord + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut res = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                res.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    res
}

/// Elements of `a` not in `b`. Both must be sorted.
pub fn remove_sorted<T: Ord + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut res = Vec::with_capacity(a.len());
    let mut j = 0;
    for &x in a {
        while j < b.len() && b[j] < x {
            j += 1;
        }
        if j == b.len() || b[j] != x {
            res.push(x);
        }
    }
    res
}

/// Sorted union of two sorted slices.
pub fn merge_sorted<T: Ord + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                res.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                res.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                res.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    res.extend_from_slice(&a[i..]);
    res.extend_from_slice(&b[j..]);
    res
}
