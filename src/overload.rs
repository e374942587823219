//! Overload resolution: pick the primary call signature of a function and
//! order the remaining variants as alternates.
//!
//! Ranking is by declared parameter count, descending. On equal counts a
//! variant ending in varargs ranks first. Remaining ties keep source order
//! (the sort is stable), so the result is deterministic.
use std::cmp::Reverse;

use crate::model::Variant;

/// Indices into the variant list, primary first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub primary: usize,
    pub alternates: Vec<usize>,
}

pub fn resolve(variants: &[Variant]) -> Resolved {
    let mut order: Vec<usize> = (0..variants.len()).collect();
    order.sort_by_key(|&i| {
        let v = &variants[i];
        (Reverse(v.arity()), Reverse(v.is_variadic()))
    });
    let mut it = order.into_iter();
    Resolved {
        primary: it.next().unwrap_or(0),
        alternates: it.collect(),
    }
}
