// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value array storage variants.
//!
//! Every array family is a closed enum over its storage encodings
//! (constant, lattice, inline, external, derived). All encodings of a family
//! are interchangeable: they only differ in storage cost, never in the values
//! they produce. Reads that may need an external dataset take the
//! [`ExternalStore`] that resolves it.

mod boolean;
mod derived;
mod double;
mod integer;
pub mod lattice;
mod string;

pub use boolean::BooleanArray;
pub use derived::{
    BooleanArrayFromDiscretePropertyArray, BooleanArrayFromIndexArray, BooleanMaskParts,
    IndexArrayParts, IntegerArrayFromBooleanMaskArray,
};
pub use double::DoubleArray;
pub use integer::IntegerArray;
pub use lattice::{DoubleLatticeArray, IntegerLatticeArray, LatticeArray, LatticeDimension};
pub use string::StringArray;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::ExternalStore;
use crate::value::{Value, ValueKind};

/// Common read contract of all array families.
pub trait ArrayAccess {
    type Item;

    /// Number of logical elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`.
    ///
    /// Panics with `OutOfRangeAccess` if `index >= len()`. Fails with
    /// `UnresolvedReference` if backing external data cannot be resolved.
    fn get(&self, index: usize, store: &dyn ExternalStore) -> Result<Self::Item>;

    /// All elements in order.
    fn materialize(&self, store: &dyn ExternalStore) -> Result<Vec<Self::Item>> {
        (0..self.len()).map(|i| self.get(i, store)).collect()
    }
}

/// Array of any element kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueArray {
    Boolean(BooleanArray),
    Integer(IntegerArray),
    Double(DoubleArray),
    String(StringArray),
}

impl ValueArray {
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueArray::Boolean(_) => ValueKind::Boolean,
            ValueArray::Integer(_) => ValueKind::Integer,
            ValueArray::Double(_) => ValueKind::Double,
            ValueArray::String(_) => ValueKind::String,
        }
    }
}

impl ArrayAccess for ValueArray {
    type Item = Value;

    fn len(&self) -> usize {
        match self {
            ValueArray::Boolean(a) => a.len(),
            ValueArray::Integer(a) => a.len(),
            ValueArray::Double(a) => a.len(),
            ValueArray::String(a) => a.len(),
        }
    }

    fn get(&self, index: usize, store: &dyn ExternalStore) -> Result<Value> {
        Ok(match self {
            ValueArray::Boolean(a) => Value::Boolean(a.get(index, store)?),
            ValueArray::Integer(a) => Value::Integer(a.get(index, store)?),
            ValueArray::Double(a) => Value::Double(a.get(index, store)?),
            ValueArray::String(a) => Value::String(a.get(index, store)?),
        })
    }

    fn materialize(&self, store: &dyn ExternalStore) -> Result<Vec<Value>> {
        Ok(match self {
            ValueArray::Boolean(a) => a.materialize(store)?.into_iter().map(Value::Boolean).collect(),
            ValueArray::Integer(a) => a.materialize(store)?.into_iter().map(Value::Integer).collect(),
            ValueArray::Double(a) => a.materialize(store)?.into_iter().map(Value::Double).collect(),
            ValueArray::String(a) => a.materialize(store)?.into_iter().map(Value::String).collect(),
        })
    }
}

impl From<BooleanArray> for ValueArray {
    fn from(a: BooleanArray) -> Self {
        ValueArray::Boolean(a)
    }
}

impl From<IntegerArray> for ValueArray {
    fn from(a: IntegerArray) -> Self {
        ValueArray::Integer(a)
    }
}

impl From<DoubleArray> for ValueArray {
    fn from(a: DoubleArray) -> Self {
        ValueArray::Double(a)
    }
}

impl From<StringArray> for ValueArray {
    fn from(a: StringArray) -> Self {
        ValueArray::String(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NoExternalStore;

    #[test]
    fn constant_true_scenario() {
        let array = ValueArray::from(BooleanArray::Constant {
            value: true,
            count: 5,
        });
        assert_eq!(array.kind(), ValueKind::Boolean);
        assert_eq!(array.len(), 5);
        assert_eq!(
            array.materialize(&NoExternalStore).unwrap(),
            vec![Value::Boolean(true); 5]
        );
    }

    #[test]
    fn dispatches_by_kind() {
        let array = ValueArray::from(IntegerArray::Range { start: 4, count: 3 });
        assert_eq!(array.get(2, &NoExternalStore).unwrap(), Value::Integer(6));

        let array = ValueArray::from(StringArray::Inline(vec!["a".into(), "b".into()]));
        assert_eq!(
            array.get(1, &NoExternalStore).unwrap(),
            Value::String("b".into())
        );
    }

    #[test]
    #[should_panic(expected = "OutOfRangeAccess")]
    fn out_of_range_get_panics() {
        let array = ValueArray::from(DoubleArray::Constant {
            value: 1.0,
            count: 2,
        });
        let _ = array.get(2, &NoExternalStore);
    }
}
