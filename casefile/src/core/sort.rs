//! Stable ordering of records by a single field.
//!
//! The comparator is deliberately not a total order: pairs involving a
//! blank value, an unparseable date, or mismatched runtime types compare
//! equal. `slice::sort_by` may panic on such comparators, so records are
//! ordered with an insertion sort that only moves an element past
//! neighbours that are strictly greater. Records that compare equal to
//! everything therefore keep their input position relative to each other.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::collation::compare_text;
use crate::core::types::{FieldKind, FieldValue, Record};
use crate::core::validator::parse_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` (any case) is descending; every other value is ascending.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub order: SortOrder,
}

/// Reorder `records` in place. Unknown keys leave the input untouched.
pub fn sort_records<R: Record>(records: &mut [R], spec: &SortSpec) {
    let Some(kind) = R::field_kind(&spec.key) else {
        return;
    };
    let key = spec.key.as_str();
    insertion_sort(records, |left, right| {
        let ordering = compare_field(kind, left.field(key), right.field(key));
        match spec.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn compare_field(
    kind: FieldKind,
    left: Option<FieldValue<'_>>,
    right: Option<FieldValue<'_>>,
) -> Ordering {
    let (Some(left), Some(right)) = (left, right) else {
        return Ordering::Equal;
    };
    if kind == FieldKind::Date {
        return match (
            left.as_text().and_then(parse_date),
            right.as_text().and_then(parse_date),
        ) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        };
    }
    if left.is_blank() || right.is_blank() {
        return Ordering::Equal;
    }
    match (left, right) {
        (FieldValue::Text(a), FieldValue::Text(b)) => compare_text(a, b),
        (FieldValue::Number(a), FieldValue::Number(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

fn insertion_sort<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for current in 1..items.len() {
        let mut slot = current;
        while slot > 0 && compare(&items[slot - 1], &items[slot]) == Ordering::Greater {
            items.swap(slot - 1, slot);
            slot -= 1;
        }
    }
}
