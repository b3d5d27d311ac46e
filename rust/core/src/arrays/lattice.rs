// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arithmetic lattices: `start + Σ coord_d * offset_d`.
//!
//! A lattice of N dimensions stores one (offset, count) pair per dimension,
//! fastest dimension first, which is also the storage order of the HDF5
//! datasets it stands in for. A linear index is decomposed into coordinates
//! by successive division by the counts.

use std::fmt;

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{out_of_range, Error, Result};

/// Scalar types a lattice can be built over.
pub trait LatticeScalar: Copy + PartialEq + fmt::Debug + Send + Sync {
    /// Returns `self + offset * coord`, or `None` when it is not
    /// representable.
    fn step(self, offset: Self, coord: usize) -> Option<Self>;
}

impl LatticeScalar for i64 {
    #[inline]
    fn step(self, offset: Self, coord: usize) -> Option<Self> {
        offset
            .checked_mul(i64::try_from(coord).ok()?)
            .and_then(|delta| self.checked_add(delta))
    }
}

impl LatticeScalar for f64 {
    #[inline]
    fn step(self, offset: Self, coord: usize) -> Option<Self> {
        Some(self + offset * coord as f64)
    }
}

/// One lattice dimension: `count` values spaced by `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatticeDimension<T> {
    pub offset: T,
    pub count: usize,
}

/// N-dimensional arithmetic lattice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatticeArray<T> {
    start: T,
    dimensions: SmallVec<[LatticeDimension<T>; 3]>,
}

/// Integer lattice (`IntegerLatticeArray`).
pub type IntegerLatticeArray = LatticeArray<i64>;

/// Floating point lattice (`FloatingPointLatticeArray`).
pub type DoubleLatticeArray = LatticeArray<f64>;

impl<T: LatticeScalar> LatticeArray<T> {
    /// Creates a lattice from (offset, count) pairs, fastest dimension
    /// first. `count` is the number of values along the dimension.
    pub fn new(start: T, dimensions: impl IntoIterator<Item = (T, usize)>) -> Self {
        Self {
            start,
            dimensions: dimensions
                .into_iter()
                .map(|(offset, count)| LatticeDimension { offset, count })
                .collect(),
        }
    }

    /// Creates a lattice from the schema encoding, where each offset carries
    /// the number of steps taken along its dimension (values = steps + 1).
    pub fn from_offset_steps(start: T, offsets: &[(T, usize)]) -> Result<Self> {
        if offsets.is_empty() {
            return Err(Error::structural(
                "lattice array",
                "at least one offset is required",
            ));
        }
        Ok(Self::new(
            start,
            offsets.iter().map(|&(offset, steps)| (offset, steps + 1)),
        ))
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn dimensions(&self) -> &[LatticeDimension<T>] {
        &self.dimensions
    }

    /// Number of values: product of the dimension counts.
    pub fn len(&self) -> usize {
        self.dimensions.iter().map(|d| d.count).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits a linear index into per-dimension coordinates.
    pub fn coordinates(&self, index: usize) -> SmallVec<[usize; 3]> {
        let len = self.len();
        if index >= len {
            out_of_range(index, len);
        }
        let mut rest = index;
        self.dimensions
            .iter()
            .map(|d| {
                let coord = rest % d.count;
                rest /= d.count;
                coord
            })
            .collect()
    }

    /// Value at a linear index. Fails when the value overflows the scalar
    /// type.
    pub fn get(&self, index: usize) -> Result<T> {
        let coords = self.coordinates(index);
        self.value_at(&coords)
    }

    /// Value at a multi-index, fastest dimension first.
    pub fn get_at(&self, coords: &[usize]) -> Result<T> {
        if coords.len() != self.dimensions.len() {
            panic!(
                "OutOfRangeAccess: {} coordinates given for a {}-dimensional lattice",
                coords.len(),
                self.dimensions.len()
            );
        }
        for (&c, d) in coords.iter().zip(&self.dimensions) {
            if c >= d.count {
                out_of_range(c, d.count);
            }
        }
        self.value_at(coords)
    }

    #[inline]
    fn value_at(&self, coords: &[usize]) -> Result<T> {
        coords
            .iter()
            .zip(&self.dimensions)
            .try_fold(self.start, |acc, (&c, d)| acc.step(d.offset, c))
            .ok_or_else(|| {
                Error::structural(
                    "lattice array",
                    format!("value at {coords:?} overflows the value type"),
                )
            })
    }

    /// Enumerates every value in storage order.
    pub fn materialize(&self) -> Result<Vec<T>> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn two_dimensional_scenario() {
        let lattice = IntegerLatticeArray::new(0, [(1, 10), (10, 3)]);
        assert_eq!(lattice.len(), 30);
        assert_eq!(lattice.get_at(&[3, 2]).unwrap(), 23);
        assert_eq!(lattice.get(23).unwrap(), 23);
        assert_eq!(lattice.coordinates(23).as_slice(), &[3, 2]);
    }

    #[test]
    fn matches_enumerated_reference() {
        let lattice = DoubleLatticeArray::new(100.0, [(0.5, 4), (-2.0, 3), (10.0, 2)]);
        let mut reference = Vec::new();
        for k in 0..2 {
            for j in 0..3 {
                for i in 0..4 {
                    reference.push(100.0 + i as f64 * 0.5 - j as f64 * 2.0 + k as f64 * 10.0);
                }
            }
        }
        assert_eq!(lattice.materialize().unwrap(), reference);
    }

    #[test]
    fn schema_offsets_count_steps() {
        let lattice = IntegerLatticeArray::from_offset_steps(5, &[(2, 3)]).unwrap();
        assert_eq!(lattice.materialize().unwrap(), vec![5, 7, 9, 11]);
        assert!(IntegerLatticeArray::from_offset_steps(0, &[]).is_err());
    }

    #[test]
    #[should_panic(expected = "OutOfRangeAccess")]
    fn out_of_range_linear_index() {
        let _ = IntegerLatticeArray::new(0, [(1, 3)]).get(3);
    }

    #[test]
    #[should_panic(expected = "OutOfRangeAccess")]
    fn out_of_range_coordinate() {
        let _ = IntegerLatticeArray::new(0, [(1, 3), (3, 2)]).get_at(&[0, 2]);
    }

    #[test]
    fn overflowing_value_is_rejected() {
        let lattice = IntegerLatticeArray::new(i64::MAX - 1, [(1, 3)]);
        assert_eq!(lattice.get(1).unwrap(), i64::MAX);
        assert!(matches!(lattice.get(2), Err(Error::StructuralInconsistency { .. })));
        assert!(lattice.materialize().is_err());

        let wide = IntegerLatticeArray::new(0, [(i64::MAX / 2 + 1, 3)]);
        assert!(wide.get(2).is_err());
    }

    proptest! {
        #[test]
        fn integer_lattice_matches_nested_loops(
            start in -1000i64..1000,
            di in -50i64..50,
            dj in -50i64..50,
            ni in 1usize..8,
            nj in 1usize..8,
        ) {
            let lattice = IntegerLatticeArray::new(start, [(di, ni), (dj, nj)]);
            let reference: Vec<i64> = (0..nj)
                .flat_map(|j| (0..ni).map(move |i| start + di * i as i64 + dj * j as i64))
                .collect();
            prop_assert_eq!(lattice.materialize().unwrap(), reference);
        }
    }
}
