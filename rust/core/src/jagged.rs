// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Jagged (ragged) arrays: flat elements plus cumulative lengths.
//!
//! Sub-array `i` spans `elements[cumulative[i-1]..cumulative[i]]`, with an
//! implicit leading zero. This is the adjacency-list primitive behind
//! nodes-per-face, faces-per-cell, pillars-per-column and every owner list of
//! a split element.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrays::{ArrayAccess, IntegerArray, ValueArray};
use crate::error::{out_of_range, to_index, Error, Result};
use crate::store::ExternalStore;
use crate::value::Value;

/// Jagged array of `T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "JaggedParts<T>", into = "JaggedParts<T>", bound(
        serialize = "T: Clone + Serialize",
        deserialize = "T: Deserialize<'de>"
    ))
)]
pub struct JaggedArray<T> {
    elements: Vec<T>,
    cumulative_length: Vec<usize>,
}

/// Unvalidated wire form of a [`JaggedArray`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JaggedParts<T> {
    pub elements: Vec<T>,
    pub cumulative_length: Vec<usize>,
}

impl<T> JaggedArray<T> {
    /// Builds a jagged array, checking that the cumulative lengths are
    /// non-decreasing and end at `elements.len()`.
    pub fn try_new(elements: Vec<T>, cumulative_length: Vec<usize>) -> Result<Self> {
        const CONTEXT: &str = "jagged array";

        if let Some(i) = cumulative_length.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "cumulative length decreases at sub-array {}: {} after {}",
                    i + 1,
                    cumulative_length[i + 1],
                    cumulative_length[i]
                ),
            ));
        }

        let last = cumulative_length.last().copied().unwrap_or(0);
        if last != elements.len() {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "last cumulative length {last} does not match {} elements",
                    elements.len()
                ),
            ));
        }

        Ok(Self {
            elements,
            cumulative_length,
        })
    }

    /// Builds a jagged array from per-sub-array vectors.
    pub fn from_nested<I>(rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = T>,
    {
        let mut elements = Vec::new();
        let mut cumulative_length = Vec::new();
        for row in rows {
            elements.extend(row);
            cumulative_length.push(elements.len());
        }
        Self {
            elements,
            cumulative_length,
        }
    }

    /// Number of sub-arrays.
    pub fn sub_array_count(&self) -> usize {
        self.cumulative_length.len()
    }

    #[inline]
    fn bounds(&self, i: usize) -> (usize, usize) {
        if i >= self.cumulative_length.len() {
            out_of_range(i, self.cumulative_length.len());
        }
        let start = if i == 0 {
            0
        } else {
            self.cumulative_length[i - 1]
        };
        (start, self.cumulative_length[i])
    }

    /// Elements of sub-array `i`.
    #[inline]
    pub fn sub_array(&self, i: usize) -> &[T] {
        let (start, end) = self.bounds(i);
        &self.elements[start..end]
    }

    #[inline]
    pub fn sub_array_len(&self, i: usize) -> usize {
        let (start, end) = self.bounds(i);
        end - start
    }

    /// Offset of sub-array `i`'s first element in the flat element list.
    #[inline]
    pub fn sub_array_offset(&self, i: usize) -> usize {
        self.bounds(i).0
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn cumulative_length(&self) -> &[usize] {
        &self.cumulative_length
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        (0..self.sub_array_count()).map(move |i| self.sub_array(i))
    }

    /// Applies `f` to every element, keeping the shape.
    pub fn try_map<U, F>(&self, mut f: F) -> Result<JaggedArray<U>>
    where
        F: FnMut(&T) -> Result<U>,
    {
        Ok(JaggedArray {
            elements: self.elements.iter().map(&mut f).collect::<Result<_>>()?,
            cumulative_length: self.cumulative_length.clone(),
        })
    }
}

impl JaggedArray<usize> {
    /// Resolves an integer jagged array of indices from its schema arrays.
    pub fn resolve_indices(
        elements: &IntegerArray,
        cumulative_length: &IntegerArray,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        let cumulative = cumulative_length.materialize_indices(store, "jagged array")?;
        Self::try_new(elements.materialize_indices(store, "jagged array")?, cumulative)
    }

    /// Checks that every element is below `bound`.
    pub fn check_bound(&self, bound: usize, context: &'static str) -> Result<()> {
        if let Some(&bad) = self.elements.iter().find(|&&e| e >= bound) {
            return Err(Error::structural(
                context,
                format!("index {bad} outside 0..{bound}"),
            ));
        }
        Ok(())
    }
}

impl JaggedArray<Value> {
    /// Resolves a jagged array of any element kind.
    pub fn resolve(
        elements: &ValueArray,
        cumulative_length: &IntegerArray,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        let cumulative = cumulative_length
            .materialize(store)?
            .into_iter()
            .map(|v| to_index(v, "jagged array"))
            .collect::<Result<Vec<_>>>()?;
        Self::try_new(elements.materialize(store)?, cumulative)
    }
}

impl<T> TryFrom<JaggedParts<T>> for JaggedArray<T> {
    type Error = Error;

    fn try_from(parts: JaggedParts<T>) -> Result<Self> {
        Self::try_new(parts.elements, parts.cumulative_length)
    }
}

impl<T> From<JaggedArray<T>> for JaggedParts<T> {
    fn from(array: JaggedArray<T>) -> Self {
        JaggedParts {
            elements: array.elements,
            cumulative_length: array.cumulative_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NoExternalStore;
    use proptest::prelude::*;

    #[test]
    fn scenario_with_empty_sub_array() {
        let jagged = JaggedArray::try_new(vec![1, 2, 3, 4, 5, 6, 7], vec![3, 3, 7]).unwrap();
        assert_eq!(jagged.sub_array_count(), 3);
        assert_eq!(jagged.sub_array(0), &[1, 2, 3]);
        assert!(jagged.sub_array(1).is_empty());
        assert_eq!(jagged.sub_array(2), &[4, 5, 6, 7]);
        assert_eq!(jagged.sub_array_len(2), 4);
        assert_eq!(jagged.sub_array_offset(2), 3);
    }

    #[test]
    fn rejects_bad_final_length() {
        let err = JaggedArray::try_new(vec![1, 2, 3], vec![1, 2]).unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency { .. }));

        let err = JaggedArray::try_new(vec![1], Vec::new()).unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency { .. }));
    }

    #[test]
    fn resolves_from_schema_arrays() {
        let jagged = JaggedArray::resolve_indices(
            &IntegerArray::inline(vec![0, 1, 2, 1, 2, 3]),
            &IntegerArray::Lattice(crate::arrays::IntegerLatticeArray::new(3, [(3, 2)])),
            &NoExternalStore,
        )
        .unwrap();
        assert_eq!(jagged.sub_array(1), &[1, 2, 3]);
        assert!(jagged.check_bound(4, "test").is_ok());
        assert!(jagged.check_bound(3, "test").is_err());

        let values = JaggedArray::resolve(
            &ValueArray::Double(crate::arrays::DoubleArray::Inline(vec![0.5, 1.5])),
            &IntegerArray::inline(vec![1, 2]),
            &NoExternalStore,
        )
        .unwrap();
        assert_eq!(values.sub_array(1), &[Value::Double(1.5)]);
    }

    #[test]
    #[should_panic(expected = "OutOfRangeAccess")]
    fn sub_array_out_of_range() {
        JaggedArray::from_nested(vec![vec![1u32]]).sub_array(1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialization_revalidates() {
        let ok: JaggedArray<u32> =
            serde_json::from_str(r#"{"elements":[1,2],"cumulative_length":[0,2]}"#).unwrap();
        assert_eq!(ok.sub_array(1), &[1, 2]);
        let bad: std::result::Result<JaggedArray<u32>, _> =
            serde_json::from_str(r#"{"elements":[1,2],"cumulative_length":[2,1]}"#);
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn lengths_sum_and_concatenation_reconstructs(
            rows in prop::collection::vec(prop::collection::vec(any::<i32>(), 0..6), 0..20)
        ) {
            let jagged = JaggedArray::from_nested(rows.clone());
            let total: usize = (0..jagged.sub_array_count()).map(|i| jagged.sub_array_len(i)).sum();
            prop_assert_eq!(total, jagged.elements().len());

            let concatenated: Vec<i32> = jagged.iter().flatten().copied().collect();
            prop_assert_eq!(&concatenated, &rows.concat());

            let rebuilt = JaggedArray::try_new(
                jagged.elements().to_vec(),
                jagged.cumulative_length().to_vec(),
            );
            prop_assert!(rebuilt.is_ok());
        }

        #[test]
        fn decreasing_cumulative_lengths_rejected(
            mut cumulative in prop::collection::vec(0usize..50, 2..20),
            at in any::<prop::sample::Index>(),
        ) {
            cumulative.sort_unstable();
            let i = at.index(cumulative.len() - 1);
            // Force a strict decrease between positions i and i + 1.
            cumulative[i + 1] = cumulative[i];
            cumulative[i] += 1;
            let len = *cumulative.last().unwrap();
            let result = JaggedArray::try_new(vec![0u8; len], cumulative);
            let is_structural = matches!(result, Err(Error::StructuralInconsistency { .. }));
            prop_assert!(is_structural);
        }
    }
}
