// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::derived::IntegerArrayFromBooleanMaskArray;
use super::lattice::IntegerLatticeArray;
use super::ArrayAccess;
use crate::error::{out_of_range, to_index, Error, Result};
use crate::store::{ExternalDataArray, ExternalStore};
use crate::value::ValueKind;

/// Integer array (`AbstractIntegerArray`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntegerArray {
    /// `count` copies of `value`.
    Constant { value: i64, count: usize },
    /// `start, start + 1, ..., start + count - 1`.
    Range { start: i64, count: usize },
    Lattice(IntegerLatticeArray),
    /// Values carried in the record itself.
    Inline {
        values: Vec<i64>,
        null_value: Option<i64>,
    },
    /// Values stored in an external dataset.
    External {
        data: ExternalDataArray,
        null_value: Option<i64>,
    },
    /// Positions of the true elements of a mask.
    FromBooleanMask(IntegerArrayFromBooleanMaskArray),
}

impl IntegerArray {
    /// Inline array without a null value.
    pub fn inline(values: Vec<i64>) -> Self {
        IntegerArray::Inline {
            values,
            null_value: None,
        }
    }

    /// External array without a null value.
    pub fn external(data: ExternalDataArray) -> Self {
        IntegerArray::External {
            data,
            null_value: None,
        }
    }

    /// The sentinel that marks a missing value, as declared by the field.
    pub fn null_value(&self) -> Option<i64> {
        match self {
            IntegerArray::Inline { null_value, .. } | IntegerArray::External { null_value, .. } => {
                *null_value
            }
            _ => None,
        }
    }

    /// Returns `true` if `value` is this array's null sentinel.
    pub fn is_null(&self, value: i64) -> bool {
        self.null_value() == Some(value)
    }

    /// Materializes the array as indices. Negative values (including a
    /// negative null sentinel) are a structural error.
    pub fn materialize_indices(
        &self,
        store: &dyn ExternalStore,
        context: &'static str,
    ) -> Result<Vec<usize>> {
        self.materialize(store)?
            .into_iter()
            .map(|v| to_index(v, context))
            .collect()
    }

    /// Materializes the array as optional indices: the null sentinel and
    /// negative values map to `None`.
    pub fn materialize_optional_indices(
        &self,
        store: &dyn ExternalStore,
    ) -> Result<Vec<Option<usize>>> {
        let null = self.null_value();
        Ok(self
            .materialize(store)?
            .into_iter()
            .map(|v| {
                if Some(v) == null {
                    None
                } else {
                    usize::try_from(v).ok()
                }
            })
            .collect())
    }

    /// Checks that the array has `expected` elements.
    pub fn expect_len(&self, expected: usize, context: &'static str) -> Result<()> {
        if self.len() != expected {
            return Err(Error::structural(
                context,
                format!("expected {expected} integers, found {}", self.len()),
            ));
        }
        Ok(())
    }
}

impl ArrayAccess for IntegerArray {
    type Item = i64;

    fn len(&self) -> usize {
        match self {
            IntegerArray::Constant { count, .. } | IntegerArray::Range { count, .. } => *count,
            IntegerArray::Lattice(l) => l.len(),
            IntegerArray::Inline { values, .. } => values.len(),
            IntegerArray::External { data, .. } => data.len(),
            IntegerArray::FromBooleanMask(m) => m.len(),
        }
    }

    fn get(&self, index: usize, store: &dyn ExternalStore) -> Result<i64> {
        let len = self.len();
        if index >= len {
            out_of_range(index, len);
        }
        match self {
            IntegerArray::Constant { value, .. } => Ok(*value),
            IntegerArray::Range { start, .. } => range_value(*start, index),
            IntegerArray::Lattice(l) => l.get(index),
            IntegerArray::Inline { values, .. } => Ok(values[index]),
            IntegerArray::External { data, .. } => data
                .read(index, ValueKind::Integer, store)?
                .as_int()
                .ok_or_else(|| Error::structural("integer array", "non-integer element")),
            IntegerArray::FromBooleanMask(m) => Ok(m.get(index)),
        }
    }

    fn materialize(&self, store: &dyn ExternalStore) -> Result<Vec<i64>> {
        match self {
            IntegerArray::Constant { value, count } => Ok(vec![*value; *count]),
            IntegerArray::Range { start, count } => {
                (0..*count).map(|i| range_value(*start, i)).collect()
            }
            IntegerArray::Lattice(l) => l.materialize(),
            IntegerArray::Inline { values, .. } => Ok(values.clone()),
            IntegerArray::External { data, .. } => data.read_integers(store),
            IntegerArray::FromBooleanMask(m) => Ok(m.positions().to_vec()),
        }
    }
}

fn range_value(start: i64, index: usize) -> Result<i64> {
    i64::try_from(index)
        .ok()
        .and_then(|i| start.checked_add(i))
        .ok_or_else(|| {
            Error::structural("integer range array", format!("value {index} overflows i64"))
        })
}

impl From<Vec<i64>> for IntegerArray {
    fn from(values: Vec<i64>) -> Self {
        IntegerArray::inline(values)
    }
}
