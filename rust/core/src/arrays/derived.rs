// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arrays derived from another array's indices or mask.
//!
//! The declared length of a derived array differs from the size of the
//! source it is built from, so it is checked against the source when the
//! array is constructed. The source is resolved at that point and only the
//! derived lookup structure is kept.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ArrayAccess, BooleanArray, IntegerArray};
use crate::error::{out_of_range, Error, Result};
use crate::store::ExternalStore;

/// Boolean array that is `index_is_true` at the listed indices and the
/// opposite elsewhere (`BooleanArrayFromIndexArray`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "IndexArrayParts", into = "IndexArrayParts")
)]
pub struct BooleanArrayFromIndexArray {
    count: usize,
    /// Sorted, unique.
    indices: Vec<usize>,
    index_is_true: bool,
}

/// Unvalidated wire form of a [`BooleanArrayFromIndexArray`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexArrayParts {
    pub count: usize,
    pub indices: Vec<usize>,
    pub index_is_true: bool,
}

impl BooleanArrayFromIndexArray {
    const CONTEXT: &'static str = "boolean array from index array";

    pub fn try_new(
        count: usize,
        indices: &IntegerArray,
        index_is_true: bool,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        let indices = indices.materialize_indices(store, Self::CONTEXT)?;
        Self::from_indices(count, indices, index_is_true)
    }

    /// Builds the array from already resolved indices, in any order.
    pub fn from_indices(
        count: usize,
        mut indices: Vec<usize>,
        index_is_true: bool,
    ) -> Result<Self> {
        indices.sort_unstable();
        if let Some(&last) = indices.last() {
            if last >= count {
                return Err(Error::structural(
                    Self::CONTEXT,
                    format!("index {last} outside declared count {count}"),
                ));
            }
        }
        if indices.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::structural(Self::CONTEXT, "duplicate index"));
        }

        Ok(Self {
            count,
            indices,
            index_is_true,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> bool {
        if index >= self.count {
            out_of_range(index, self.count);
        }
        self.indices.binary_search(&index).is_ok() == self.index_is_true
    }
}

/// Integer array holding the positions of the true elements of a mask
/// (`IntegerArrayFromBooleanMaskArray`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "BooleanMaskParts", into = "BooleanMaskParts")
)]
pub struct IntegerArrayFromBooleanMaskArray {
    total_index_count: usize,
    positions: Vec<i64>,
}

/// Unvalidated wire form of an [`IntegerArrayFromBooleanMaskArray`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BooleanMaskParts {
    pub total_index_count: usize,
    pub positions: Vec<i64>,
}

impl IntegerArrayFromBooleanMaskArray {
    const CONTEXT: &'static str = "integer array from boolean mask";

    /// `total_index_count` is the number of integers in the derived array
    /// and must equal the number of true mask elements.
    pub fn try_new(
        total_index_count: usize,
        mask: &BooleanArray,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        let positions: Vec<i64> = mask
            .materialize(store)?
            .into_iter()
            .enumerate()
            .filter_map(|(i, bit)| bit.then_some(i as i64))
            .collect();
        Self::from_positions(total_index_count, positions)
    }

    /// Builds the array from the positions of the true mask elements, which
    /// must be non-negative and strictly increasing.
    pub fn from_positions(total_index_count: usize, positions: Vec<i64>) -> Result<Self> {
        if positions.len() != total_index_count {
            return Err(Error::structural(
                Self::CONTEXT,
                format!(
                    "declared {total_index_count} indices but mask has {} true elements",
                    positions.len()
                ),
            ));
        }
        if positions.first().is_some_and(|&p| p < 0)
            || positions.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(Error::structural(
                Self::CONTEXT,
                "mask positions must be non-negative and strictly increasing",
            ));
        }

        Ok(Self {
            total_index_count,
            positions,
        })
    }

    pub fn len(&self) -> usize {
        self.total_index_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_index_count == 0
    }

    pub fn get(&self, index: usize) -> i64 {
        match self.positions.get(index) {
            Some(&p) => p,
            None => out_of_range(index, self.total_index_count),
        }
    }

    pub fn positions(&self) -> &[i64] {
        &self.positions
    }
}

/// Boolean array that is true where a discrete property takes a given value
/// (`BooleanArrayFromDiscretePropertyArray`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BooleanArrayFromDiscretePropertyArray {
    value: i64,
    matches: Vec<bool>,
}

impl BooleanArrayFromDiscretePropertyArray {
    /// Null property values never match.
    pub fn try_new(
        count: usize,
        property_values: &IntegerArray,
        value: i64,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        property_values.expect_len(count, "boolean array from discrete property")?;
        let null = property_values.null_value();
        let matches = property_values
            .materialize(store)?
            .into_iter()
            .map(|v| v == value && Some(v) != null)
            .collect();
        Ok(Self { value, matches })
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> bool {
        match self.matches.get(index) {
            Some(&m) => m,
            None => out_of_range(index, self.matches.len()),
        }
    }
}

impl TryFrom<IndexArrayParts> for BooleanArrayFromIndexArray {
    type Error = Error;

    fn try_from(parts: IndexArrayParts) -> Result<Self> {
        Self::from_indices(parts.count, parts.indices, parts.index_is_true)
    }
}

impl From<BooleanArrayFromIndexArray> for IndexArrayParts {
    fn from(array: BooleanArrayFromIndexArray) -> Self {
        IndexArrayParts {
            count: array.count,
            indices: array.indices,
            index_is_true: array.index_is_true,
        }
    }
}

impl TryFrom<BooleanMaskParts> for IntegerArrayFromBooleanMaskArray {
    type Error = Error;

    fn try_from(parts: BooleanMaskParts) -> Result<Self> {
        Self::from_positions(parts.total_index_count, parts.positions)
    }
}

impl From<IntegerArrayFromBooleanMaskArray> for BooleanMaskParts {
    fn from(array: IntegerArrayFromBooleanMaskArray) -> Self {
        BooleanMaskParts {
            total_index_count: array.total_index_count,
            positions: array.positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NoExternalStore;

    #[test]
    fn index_array_count_differs_from_index_count() {
        let array = BooleanArrayFromIndexArray::try_new(
            6,
            &IntegerArray::inline(vec![4, 0]),
            false,
            &NoExternalStore,
        )
        .unwrap();
        assert_eq!(array.len(), 6);
        let values: Vec<bool> = (0..6).map(|i| array.get(i)).collect();
        assert_eq!(values, vec![false, true, true, true, false, true]);
    }

    #[test]
    fn index_array_rejects_bad_indices() {
        let out_of_count = BooleanArrayFromIndexArray::try_new(
            3,
            &IntegerArray::inline(vec![3]),
            true,
            &NoExternalStore,
        );
        assert!(matches!(out_of_count, Err(Error::StructuralInconsistency { .. })));

        let duplicate = BooleanArrayFromIndexArray::try_new(
            3,
            &IntegerArray::inline(vec![1, 1]),
            true,
            &NoExternalStore,
        );
        assert!(duplicate.is_err());

        let negative = BooleanArrayFromIndexArray::try_new(
            3,
            &IntegerArray::inline(vec![-1]),
            true,
            &NoExternalStore,
        );
        assert!(negative.is_err());
    }

    #[test]
    fn mask_count_must_match_true_bits() {
        let mask = BooleanArray::Inline(vec![true, false, true]);
        assert!(IntegerArrayFromBooleanMaskArray::try_new(3, &mask, &NoExternalStore).is_err());
        let ok = IntegerArrayFromBooleanMaskArray::try_new(2, &mask, &NoExternalStore).unwrap();
        assert_eq!(ok.positions(), &[0, 2]);
    }

    #[test]
    fn discrete_property_ignores_nulls() {
        let property = IntegerArray::Inline {
            values: vec![2, -999, 2, 5],
            null_value: Some(-999),
        };
        let array =
            BooleanArrayFromDiscretePropertyArray::try_new(4, &property, 2, &NoExternalStore)
                .unwrap();
        assert_eq!(
            (0..4).map(|i| array.get(i)).collect::<Vec<_>>(),
            vec![true, false, true, false]
        );

        let null_match =
            BooleanArrayFromDiscretePropertyArray::try_new(4, &property, -999, &NoExternalStore)
                .unwrap();
        assert!(!null_match.get(1));

        assert!(
            BooleanArrayFromDiscretePropertyArray::try_new(5, &property, 2, &NoExternalStore)
                .is_err()
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn decoding_rejects_inconsistent_mask_positions() {
        let short = serde_json::from_str::<IntegerArray>(
            r#"{"FromBooleanMask":{"total_index_count":3,"positions":[1]}}"#,
        );
        assert!(short.is_err());
        assert!(matches!(
            IntegerArrayFromBooleanMaskArray::from_positions(3, vec![1]),
            Err(Error::StructuralInconsistency { .. })
        ));

        let unordered = serde_json::from_str::<IntegerArrayFromBooleanMaskArray>(
            r#"{"total_index_count":2,"positions":[4,1]}"#,
        );
        assert!(unordered.is_err());

        let ok = serde_json::from_str::<IntegerArray>(
            r#"{"FromBooleanMask":{"total_index_count":2,"positions":[0,2]}}"#,
        )
        .unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn decoding_rejects_index_outside_count() {
        let bad = serde_json::from_str::<BooleanArrayFromIndexArray>(
            r#"{"count":3,"indices":[0,3],"index_is_true":true}"#,
        );
        assert!(bad.is_err());

        let duplicate = serde_json::from_str::<BooleanArrayFromIndexArray>(
            r#"{"count":3,"indices":[1,1],"index_is_true":true}"#,
        );
        assert!(duplicate.is_err());

        let array = BooleanArrayFromIndexArray::from_indices(4, vec![2, 0], true).unwrap();
        let json = serde_json::to_string(&array).unwrap();
        let restored: BooleanArrayFromIndexArray = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, array);
        assert!(restored.get(2) && !restored.get(3));
    }
}
