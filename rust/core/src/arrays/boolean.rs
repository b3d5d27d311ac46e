// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::derived::{BooleanArrayFromDiscretePropertyArray, BooleanArrayFromIndexArray};
use super::ArrayAccess;
use crate::error::{out_of_range, Error, Result};
use crate::store::{ExternalDataArray, ExternalStore};
use crate::value::ValueKind;

/// Boolean array (`AbstractBooleanArray`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BooleanArray {
    Constant { value: bool, count: usize },
    Inline(Vec<bool>),
    External(ExternalDataArray),
    /// True (or false) exactly at the listed indices.
    FromIndexArray(BooleanArrayFromIndexArray),
    /// True where a discrete property equals a value.
    FromDiscreteProperty(BooleanArrayFromDiscretePropertyArray),
}

impl BooleanArray {
    pub fn expect_len(&self, expected: usize, context: &'static str) -> Result<()> {
        if self.len() != expected {
            return Err(Error::structural(
                context,
                format!("expected {expected} booleans, found {}", self.len()),
            ));
        }
        Ok(())
    }
}

impl ArrayAccess for BooleanArray {
    type Item = bool;

    fn len(&self) -> usize {
        match self {
            BooleanArray::Constant { count, .. } => *count,
            BooleanArray::Inline(values) => values.len(),
            BooleanArray::External(data) => data.len(),
            BooleanArray::FromIndexArray(a) => a.len(),
            BooleanArray::FromDiscreteProperty(a) => a.len(),
        }
    }

    fn get(&self, index: usize, store: &dyn ExternalStore) -> Result<bool> {
        let len = self.len();
        if index >= len {
            out_of_range(index, len);
        }
        match self {
            BooleanArray::Constant { value, .. } => Ok(*value),
            BooleanArray::Inline(values) => Ok(values[index]),
            BooleanArray::External(data) => data
                .read(index, ValueKind::Boolean, store)?
                .as_bool()
                .ok_or_else(|| Error::structural("boolean array", "non-boolean element")),
            BooleanArray::FromIndexArray(a) => Ok(a.get(index)),
            BooleanArray::FromDiscreteProperty(a) => Ok(a.get(index)),
        }
    }

    fn materialize(&self, store: &dyn ExternalStore) -> Result<Vec<bool>> {
        match self {
            BooleanArray::Constant { value, count } => Ok(vec![*value; *count]),
            BooleanArray::Inline(values) => Ok(values.clone()),
            BooleanArray::External(data) => data
                .read_all(ValueKind::Boolean, store)?
                .into_iter()
                .map(|v| {
                    v.as_bool()
                        .ok_or_else(|| Error::structural("boolean array", "non-boolean element"))
                })
                .collect(),
            BooleanArray::FromIndexArray(a) => Ok((0..a.len()).map(|i| a.get(i)).collect()),
            BooleanArray::FromDiscreteProperty(a) => Ok((0..a.len()).map(|i| a.get(i)).collect()),
        }
    }
}

impl From<Vec<bool>> for BooleanArray {
    fn from(values: Vec<bool>) -> Self {
        BooleanArray::Inline(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::IntegerArray;
    use crate::store::tests::proxy;
    use crate::store::{ExternalDataArrayPart, InMemoryStore, NoExternalStore, RawBuffer};

    #[test]
    fn constant_true_materializes() {
        let array = BooleanArray::Constant {
            value: true,
            count: 5,
        };
        assert_eq!(array.materialize(&NoExternalStore).unwrap(), vec![true; 5]);
        for i in 0..5 {
            assert!(array.get(i, &NoExternalStore).unwrap());
        }
    }

    #[test]
    fn all_encodings_agree() {
        let expected = vec![false, true, false, true];

        let mut store = InMemoryStore::new();
        store.insert(proxy().uuid, "/mask", RawBuffer::Boolean(expected.clone()));

        let from_indices = BooleanArrayFromIndexArray::try_new(
            4,
            &IntegerArray::inline(vec![3, 1]),
            true,
            &NoExternalStore,
        )
        .unwrap();
        let from_property = BooleanArrayFromDiscretePropertyArray::try_new(
            4,
            &IntegerArray::inline(vec![0, 7, 0, 7]),
            7,
            &NoExternalStore,
        )
        .unwrap();

        let arrays = [
            BooleanArray::Inline(expected.clone()),
            BooleanArray::External(ExternalDataArray::single(ExternalDataArrayPart::new(
                proxy(),
                "/mask",
                4,
            ))),
            BooleanArray::FromIndexArray(from_indices),
            BooleanArray::FromDiscreteProperty(from_property),
        ];
        for array in &arrays {
            assert_eq!(array.len(), 4);
            assert_eq!(array.materialize(&store).unwrap(), expected);
            for (i, &v) in expected.iter().enumerate() {
                assert_eq!(array.get(i, &store).unwrap(), v);
            }
        }
    }
}
