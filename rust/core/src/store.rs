// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! External dataset locators and the store contract that resolves them.
//!
//! Bulk values of explicit arrays live outside the XML part, usually in an
//! HDF5 file. A record only carries an [`ExternalDataArray`]: one or more
//! parts, each naming a proxy object (`EpcExternalPartReference`), a path
//! inside that file and the slice of the dataset it covers. Bytes are fetched
//! through an [`ExternalStore`] supplied by the caller, on first access.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reference::DataObjectReference;
use crate::value::{Value, ValueKind};

/// A typed dataset as returned by an external store.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBuffer {
    Boolean(Vec<bool>),
    Integer(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl RawBuffer {
    pub fn kind(&self) -> ValueKind {
        match self {
            RawBuffer::Boolean(_) => ValueKind::Boolean,
            RawBuffer::Integer(_) => ValueKind::Integer,
            RawBuffer::Double(_) => ValueKind::Double,
            RawBuffer::String(_) => ValueKind::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawBuffer::Boolean(v) => v.len(),
            RawBuffer::Integer(v) => v.len(),
            RawBuffer::Double(v) => v.len(),
            RawBuffer::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `index` as a [`Value`], if present.
    pub fn value(&self, index: usize) -> Option<Value> {
        match self {
            RawBuffer::Boolean(v) => v.get(index).copied().map(Value::Boolean),
            RawBuffer::Integer(v) => v.get(index).copied().map(Value::Integer),
            RawBuffer::Double(v) => v.get(index).copied().map(Value::Double),
            RawBuffer::String(v) => v.get(index).cloned().map(Value::String),
        }
    }
}

/// One contiguous slice of an external dataset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExternalDataArrayPart {
    /// Proxy object standing for the external file.
    pub proxy: DataObjectReference,
    /// Dataset path inside the external file.
    pub path_in_file: String,
    /// First dataset element covered by this part.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_index: usize,
    /// Number of elements covered by this part.
    pub count: usize,
}

impl ExternalDataArrayPart {
    pub fn new(proxy: DataObjectReference, path_in_file: impl Into<String>, count: usize) -> Self {
        Self {
            proxy,
            path_in_file: path_in_file.into(),
            start_index: 0,
            count,
        }
    }

    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.proxy.uuid, self.path_in_file)
    }
}

/// Ordered list of external parts forming one logical array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<ExternalDataArrayPart>", into = "Vec<ExternalDataArrayPart>"))]
pub struct ExternalDataArray {
    parts: SmallVec<[ExternalDataArrayPart; 1]>,
    /// Running element count at the end of each part.
    ends: SmallVec<[usize; 1]>,
}

impl ExternalDataArray {
    /// Creates a single-part array.
    pub fn single(part: ExternalDataArrayPart) -> Self {
        let end = part.count;
        Self {
            parts: smallvec::smallvec![part],
            ends: smallvec::smallvec![end],
        }
    }

    /// Creates a multi-part array. At least one part is required.
    pub fn try_new(parts: Vec<ExternalDataArrayPart>) -> Result<Self> {
        if parts.is_empty() {
            return Err(Error::structural(
                "external data array",
                "at least one part is required",
            ));
        }
        let mut total = 0usize;
        let ends = parts
            .iter()
            .map(|p| {
                total += p.count;
                total
            })
            .collect();
        Ok(Self {
            parts: parts.into_iter().collect(),
            ends,
        })
    }

    /// Total number of logical elements.
    pub fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parts(&self) -> &[ExternalDataArrayPart] {
        &self.parts
    }

    /// Maps a logical index to (part, dataset index).
    fn locate(&self, index: usize) -> (&ExternalDataArrayPart, usize) {
        let part = self.ends.partition_point(|&end| end <= index);
        let before = if part == 0 { 0 } else { self.ends[part - 1] };
        let p = &self.parts[part];
        (p, p.start_index + (index - before))
    }

    /// Resolves the dataset behind one part and checks kind and extent.
    fn resolve_part(
        part: &ExternalDataArrayPart,
        kind: ValueKind,
        store: &dyn ExternalStore,
    ) -> Result<Arc<RawBuffer>> {
        let buffer = store.resolve_external(&part.proxy, &part.path_in_file)?;
        if buffer.kind() != kind {
            return Err(Error::structural(
                "external data array",
                format!(
                    "{} holds {} values, expected {}",
                    part.describe(),
                    buffer.kind(),
                    kind
                ),
            ));
        }
        if part.start_index + part.count > buffer.len() {
            return Err(Error::structural(
                "external data array",
                format!(
                    "{} has {} elements, part needs [{}, {})",
                    part.describe(),
                    buffer.len(),
                    part.start_index,
                    part.start_index + part.count
                ),
            ));
        }
        Ok(buffer)
    }

    /// Reads one logical element.
    ///
    /// Panics if `index >= len()`.
    pub fn read(&self, index: usize, kind: ValueKind, store: &dyn ExternalStore) -> Result<Value> {
        if index >= self.len() {
            crate::error::out_of_range(index, self.len());
        }
        let (part, dataset_index) = self.locate(index);
        let buffer = Self::resolve_part(part, kind, store)?;
        buffer
            .value(dataset_index)
            .ok_or_else(|| Error::structural("external data array", "dataset shorter than declared"))
    }

    /// Reads every logical element, resolving each part once.
    pub fn read_all(&self, kind: ValueKind, store: &dyn ExternalStore) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(self.len());
        for part in &self.parts {
            let buffer = Self::resolve_part(part, kind, store)?;
            for i in part.start_index..part.start_index + part.count {
                if let Some(v) = buffer.value(i) {
                    out.push(v);
                }
            }
        }
        Ok(out)
    }

    /// Reads every element of an integer array without boxing into [`Value`].
    pub fn read_integers(&self, store: &dyn ExternalStore) -> Result<Vec<i64>> {
        let mut out = Vec::with_capacity(self.len());
        for part in &self.parts {
            let buffer = Self::resolve_part(part, ValueKind::Integer, store)?;
            if let RawBuffer::Integer(values) = &*buffer {
                out.extend_from_slice(&values[part.start_index..part.start_index + part.count]);
            }
        }
        Ok(out)
    }

    /// Reads every element of a double array without boxing into [`Value`].
    pub fn read_doubles(&self, store: &dyn ExternalStore) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.len());
        for part in &self.parts {
            let buffer = Self::resolve_part(part, ValueKind::Double, store)?;
            if let RawBuffer::Double(values) = &*buffer {
                out.extend_from_slice(&values[part.start_index..part.start_index + part.count]);
            }
        }
        Ok(out)
    }
}

impl TryFrom<Vec<ExternalDataArrayPart>> for ExternalDataArray {
    type Error = Error;

    fn try_from(parts: Vec<ExternalDataArrayPart>) -> Result<Self> {
        Self::try_new(parts)
    }
}

impl From<ExternalDataArray> for Vec<ExternalDataArrayPart> {
    fn from(array: ExternalDataArray) -> Self {
        array.parts.into_vec()
    }
}

/// Resolves external datasets.
///
/// Implementations must be safe to share between threads; caching, file
/// handles and timeouts are their business. Errors should be reported as
/// [`Error::UnresolvedReference`].
pub trait ExternalStore: Send + Sync {
    fn resolve_external(
        &self,
        proxy: &DataObjectReference,
        path_in_file: &str,
    ) -> Result<Arc<RawBuffer>>;
}

/// Store that resolves nothing. Useful for records that are known to carry
/// no external arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalStore;

impl ExternalStore for NoExternalStore {
    fn resolve_external(
        &self,
        proxy: &DataObjectReference,
        path_in_file: &str,
    ) -> Result<Arc<RawBuffer>> {
        Err(Error::unresolved(
            format!("{}:{}", proxy.uuid, path_in_file),
            "no external store configured",
        ))
    }
}

/// Store backed by in-memory datasets keyed by (proxy uuid, path).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    datasets: FxHashMap<(Uuid, String), Arc<RawBuffer>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset, replacing any previous one at the same location.
    pub fn insert(&mut self, proxy: Uuid, path_in_file: impl Into<String>, buffer: RawBuffer) {
        self.datasets
            .insert((proxy, path_in_file.into()), Arc::new(buffer));
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }
}

impl ExternalStore for InMemoryStore {
    fn resolve_external(
        &self,
        proxy: &DataObjectReference,
        path_in_file: &str,
    ) -> Result<Arc<RawBuffer>> {
        let buffer = self
            .datasets
            .get(&(proxy.uuid, path_in_file.to_string()))
            .ok_or_else(|| {
                Error::unresolved(
                    format!("{}:{}", proxy.uuid, path_in_file),
                    "dataset not found",
                )
            })?;
        tracing::debug!(
            proxy = %proxy.uuid,
            path = path_in_file,
            len = buffer.len(),
            "resolved external dataset"
        );
        Ok(Arc::clone(buffer))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reference::ContentType;

    pub(crate) fn proxy() -> DataObjectReference {
        DataObjectReference::new(
            Uuid::from_u128(0x0b1d_4c55_7a0e_4f21_9e33_5b8a_2d6f_1c40),
            ContentType::parse("eml20.EpcExternalPartReference").unwrap(),
        )
    }

    #[test]
    fn single_part_read() {
        let mut store = InMemoryStore::new();
        store.insert(proxy().uuid, "/RESQML/grid/values", RawBuffer::Integer(vec![5, 6, 7]));

        let array = ExternalDataArray::single(ExternalDataArrayPart::new(
            proxy(),
            "/RESQML/grid/values",
            3,
        ));
        assert_eq!(array.len(), 3);
        assert_eq!(
            array.read(1, ValueKind::Integer, &store).unwrap(),
            Value::Integer(6)
        );
        assert_eq!(array.read_integers(&store).unwrap(), vec![5, 6, 7]);
    }

    #[test]
    fn multi_part_with_start_index() {
        let mut store = InMemoryStore::new();
        store.insert(proxy().uuid, "a", RawBuffer::Double(vec![0.0, 1.0, 2.0, 3.0]));
        store.insert(proxy().uuid, "b", RawBuffer::Double(vec![10.0, 11.0]));

        let array = ExternalDataArray::try_new(vec![
            ExternalDataArrayPart::new(proxy(), "a", 2).with_start_index(2),
            ExternalDataArrayPart::new(proxy(), "b", 2),
        ])
        .unwrap();
        assert_eq!(array.read_doubles(&store).unwrap(), vec![2.0, 3.0, 10.0, 11.0]);
        assert_eq!(
            array.read(2, ValueKind::Double, &store).unwrap(),
            Value::Double(10.0)
        );
    }

    #[test]
    fn missing_dataset_is_recoverable() {
        let array = ExternalDataArray::single(ExternalDataArrayPart::new(proxy(), "x", 1));
        let err = array.read(0, ValueKind::Integer, &NoExternalStore).unwrap_err();
        assert!(err.is_recoverable());

        let err = array.read_all(ValueKind::Integer, &InMemoryStore::new()).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn wrong_kind_or_short_dataset_is_structural() {
        let mut store = InMemoryStore::new();
        store.insert(proxy().uuid, "x", RawBuffer::Double(vec![1.0]));

        let array = ExternalDataArray::single(ExternalDataArrayPart::new(proxy(), "x", 1));
        assert!(matches!(
            array.read(0, ValueKind::Integer, &store),
            Err(Error::StructuralInconsistency { .. })
        ));

        let array = ExternalDataArray::single(ExternalDataArrayPart::new(proxy(), "x", 2));
        assert!(matches!(
            array.read_doubles(&store),
            Err(Error::StructuralInconsistency { .. })
        ));
    }

    #[test]
    fn empty_part_list_rejected() {
        assert!(ExternalDataArray::try_new(Vec::new()).is_err());
    }
}
