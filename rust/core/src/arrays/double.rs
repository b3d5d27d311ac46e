// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::lattice::DoubleLatticeArray;
use super::ArrayAccess;
use crate::error::{out_of_range, Error, Result};
use crate::store::{ExternalDataArray, ExternalStore};
use crate::value::ValueKind;

/// Floating point array (`AbstractFloatingPointArray`). Missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DoubleArray {
    Constant { value: f64, count: usize },
    Lattice(DoubleLatticeArray),
    Inline(Vec<f64>),
    External(ExternalDataArray),
}

impl DoubleArray {
    pub fn expect_len(&self, expected: usize, context: &'static str) -> Result<()> {
        if self.len() != expected {
            return Err(Error::structural(
                context,
                format!("expected {expected} doubles, found {}", self.len()),
            ));
        }
        Ok(())
    }
}

impl ArrayAccess for DoubleArray {
    type Item = f64;

    fn len(&self) -> usize {
        match self {
            DoubleArray::Constant { count, .. } => *count,
            DoubleArray::Lattice(l) => l.len(),
            DoubleArray::Inline(values) => values.len(),
            DoubleArray::External(data) => data.len(),
        }
    }

    fn get(&self, index: usize, store: &dyn ExternalStore) -> Result<f64> {
        let len = self.len();
        if index >= len {
            out_of_range(index, len);
        }
        match self {
            DoubleArray::Constant { value, .. } => Ok(*value),
            DoubleArray::Lattice(l) => l.get(index),
            DoubleArray::Inline(values) => Ok(values[index]),
            DoubleArray::External(data) => data
                .read(index, ValueKind::Double, store)?
                .as_double()
                .ok_or_else(|| Error::structural("double array", "non-numeric element")),
        }
    }

    fn materialize(&self, store: &dyn ExternalStore) -> Result<Vec<f64>> {
        match self {
            DoubleArray::Constant { value, count } => Ok(vec![*value; *count]),
            DoubleArray::Lattice(l) => l.materialize(),
            DoubleArray::Inline(values) => Ok(values.clone()),
            DoubleArray::External(data) => data.read_doubles(store),
        }
    }
}

impl From<Vec<f64>> for DoubleArray {
    fn from(values: Vec<f64>) -> Self {
        DoubleArray::Inline(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::proxy;
    use crate::store::{ExternalDataArrayPart, InMemoryStore, NoExternalStore, RawBuffer};

    #[test]
    fn variants_agree() {
        let mut store = InMemoryStore::new();
        store.insert(proxy().uuid, "/z", RawBuffer::Double(vec![1.0, 1.5, 2.0]));

        let arrays = [
            DoubleArray::Lattice(DoubleLatticeArray::new(1.0, [(0.5, 3)])),
            DoubleArray::Inline(vec![1.0, 1.5, 2.0]),
            DoubleArray::External(ExternalDataArray::single(ExternalDataArrayPart::new(
                proxy(),
                "/z",
                3,
            ))),
        ];
        for array in &arrays {
            assert_eq!(array.materialize(&store).unwrap(), vec![1.0, 1.5, 2.0]);
            for i in 0..3 {
                assert_eq!(array.get(i, &store).unwrap(), 1.0 + 0.5 * i as f64);
            }
        }
    }

    #[test]
    fn nan_is_preserved() {
        let array = DoubleArray::Inline(vec![f64::NAN, 2.0]);
        assert!(array.get(0, &NoExternalStore).unwrap().is_nan());
    }
}
