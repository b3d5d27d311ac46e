// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ArrayAccess;
use crate::error::{out_of_range, Error, Result};
use crate::store::{ExternalDataArray, ExternalStore};
use crate::value::{Value, ValueKind};

/// String array (`AbstractStringArray`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StringArray {
    Constant { value: String, count: usize },
    Inline(Vec<String>),
    External(ExternalDataArray),
}

impl ArrayAccess for StringArray {
    type Item = String;

    fn len(&self) -> usize {
        match self {
            StringArray::Constant { count, .. } => *count,
            StringArray::Inline(values) => values.len(),
            StringArray::External(data) => data.len(),
        }
    }

    fn get(&self, index: usize, store: &dyn ExternalStore) -> Result<String> {
        let len = self.len();
        if index >= len {
            out_of_range(index, len);
        }
        match self {
            StringArray::Constant { value, .. } => Ok(value.clone()),
            StringArray::Inline(values) => Ok(values[index].clone()),
            StringArray::External(data) => match data.read(index, ValueKind::String, store)? {
                Value::String(s) => Ok(s),
                _ => Err(Error::structural("string array", "non-string element")),
            },
        }
    }

    fn materialize(&self, store: &dyn ExternalStore) -> Result<Vec<String>> {
        match self {
            StringArray::Constant { value, count } => Ok(vec![value.clone(); *count]),
            StringArray::Inline(values) => Ok(values.clone()),
            StringArray::External(data) => data
                .read_all(ValueKind::String, store)?
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    _ => Err(Error::structural("string array", "non-string element")),
                })
                .collect(),
        }
    }
}
