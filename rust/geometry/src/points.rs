// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point3d arrays (`AbstractPoint3dArray`) and their resolved form.
//!
//! A [`Point3dArray`] is the stored encoding. [`Point3dArray::resolve`] pulls
//! everything the encoding needs (external datasets, spacing prefix sums,
//! supporting lines) once, after which [`ResolvedPoints::point`] answers
//! without touching any collaborator.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use resqml_lite_core::{
    out_of_range, ArrayAccess, DoubleArray, Error, ExternalDataArray, IntegerArray, Result,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::EvaluationConfig;
use crate::context::ResolveContext;
use crate::line_array::{ParametricLineArray, ResolvedLineArray};

const PARAMETRIC_CONTEXT: &str = "point3d parametric array";

/// One lattice axis: a direction and the spacings between successive
/// positions along it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3dOffset {
    pub direction: Vector3<f64>,
    /// `count - 1` spacings.
    pub spacing: DoubleArray,
}

impl Point3dOffset {
    pub fn new(direction: Vector3<f64>, spacing: DoubleArray) -> Self {
        Self { direction, spacing }
    }

    /// Number of positions along this axis.
    pub fn count(&self) -> usize {
        self.spacing.len() + 1
    }
}

/// Regular or irregularly spaced lattice of points.
///
/// The first offset varies fastest, matching the value lattice arrays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3dLatticeArray {
    pub origin: Point3<f64>,
    pub offsets: SmallVec<[Point3dOffset; 3]>,
}

impl Point3dLatticeArray {
    pub fn new(origin: Point3<f64>, offsets: impl IntoIterator<Item = Point3dOffset>) -> Self {
        Self {
            origin,
            offsets: offsets.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.iter().map(Point3dOffset::count).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Points whose x and y come from a supporting array and z from a double
/// array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3dZValueArray {
    pub supporting_geometry: Point3dArray,
    pub z_values: DoubleArray,
}

/// Points located on parametric lines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "ParametricPointsParts", into = "ParametricPointsParts")
)]
pub struct Point3dParametricArray {
    pub parametric_lines: ParametricLineArray,
    pub parameters: DoubleArray,
    /// Line carrying each point. Without it point `p` lies on line
    /// `p % line_count`.
    pub line_indices: Option<IntegerArray>,
}

/// Unvalidated wire form of a [`Point3dParametricArray`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParametricPointsParts {
    pub parametric_lines: ParametricLineArray,
    pub parameters: DoubleArray,
    pub line_indices: Option<IntegerArray>,
}

impl TryFrom<ParametricPointsParts> for Point3dParametricArray {
    type Error = Error;

    fn try_from(parts: ParametricPointsParts) -> Result<Self> {
        if let Some(indices) = &parts.line_indices {
            indices.expect_len(parts.parameters.len(), PARAMETRIC_CONTEXT)?;
        }
        Ok(Self {
            parametric_lines: parts.parametric_lines,
            parameters: parts.parameters,
            line_indices: parts.line_indices,
        })
    }
}

impl From<Point3dParametricArray> for ParametricPointsParts {
    fn from(array: Point3dParametricArray) -> Self {
        ParametricPointsParts {
            parametric_lines: array.parametric_lines,
            parameters: array.parameters,
            line_indices: array.line_indices,
        }
    }
}

/// Point3d array storage variants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Point3dArray {
    Inline(Vec<Point3<f64>>),
    /// Flat xyz triples in an external dataset.
    External(ExternalDataArray),
    Lattice(Point3dLatticeArray),
    ZValue(Box<Point3dZValueArray>),
    Parametric(Box<Point3dParametricArray>),
}

impl Point3dArray {
    /// Builds a z-value array; both inputs must have the same length.
    pub fn z_value(supporting_geometry: Point3dArray, z_values: DoubleArray) -> Result<Self> {
        if supporting_geometry.len() != z_values.len() {
            return Err(Error::structural(
                "point3d z-value array",
                format!(
                    "{} supporting points for {} z values",
                    supporting_geometry.len(),
                    z_values.len()
                ),
            ));
        }
        Ok(Point3dArray::ZValue(Box::new(Point3dZValueArray {
            supporting_geometry,
            z_values,
        })))
    }

    /// Builds a parametric point array; `line_indices`, when given, has one
    /// entry per parameter.
    pub fn parametric(
        parametric_lines: ParametricLineArray,
        parameters: DoubleArray,
        line_indices: Option<IntegerArray>,
    ) -> Result<Self> {
        let array = Point3dParametricArray::try_from(ParametricPointsParts {
            parametric_lines,
            parameters,
            line_indices,
        })?;
        Ok(Point3dArray::Parametric(Box::new(array)))
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        match self {
            Point3dArray::Inline(points) => points.len(),
            Point3dArray::External(data) => data.len() / 3,
            Point3dArray::Lattice(lattice) => lattice.len(),
            Point3dArray::ZValue(z) => z.z_values.len(),
            Point3dArray::Parametric(p) => p.parameters.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parametric lines backing this array, if it is parametric.
    pub fn parametric_lines(&self) -> Option<&ParametricLineArray> {
        match self {
            Point3dArray::Parametric(p) => Some(&p.parametric_lines),
            _ => None,
        }
    }

    /// Loads everything needed to evaluate points without further I/O.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<ResolvedPoints> {
        let resolved = match self {
            Point3dArray::Inline(points) => ResolvedPoints::Explicit(points.clone()),
            Point3dArray::External(data) => {
                let xyz = data.read_doubles(ctx.store)?;
                if xyz.len() % 3 != 0 {
                    return Err(Error::structural(
                        "point3d external array",
                        format!("{} doubles do not form xyz triples", xyz.len()),
                    ));
                }
                ResolvedPoints::Explicit(
                    xyz.chunks_exact(3)
                        .map(|c| Point3::new(c[0], c[1], c[2]))
                        .collect(),
                )
            }
            Point3dArray::Lattice(lattice) => {
                let axes = lattice
                    .offsets
                    .iter()
                    .map(|offset| -> Result<(Vector3<f64>, Vec<f64>)> {
                        let mut positions = Vec::with_capacity(offset.count());
                        let mut acc = 0.0;
                        positions.push(acc);
                        for step in offset.spacing.materialize(ctx.store)? {
                            acc += step;
                            positions.push(acc);
                        }
                        Ok((offset.direction, positions))
                    })
                    .collect::<Result<_>>()?;
                ResolvedPoints::Lattice {
                    origin: lattice.origin,
                    axes,
                }
            }
            Point3dArray::ZValue(z) => {
                let xy = z.supporting_geometry.resolve(ctx)?;
                let values = z.z_values.materialize(ctx.store)?;
                if xy.len() != values.len() {
                    return Err(Error::structural(
                        "point3d z-value array",
                        format!("{} supporting points for {} z values", xy.len(), values.len()),
                    ));
                }
                ResolvedPoints::ZValue {
                    xy: Box::new(xy),
                    z: values,
                }
            }
            Point3dArray::Parametric(p) => {
                let lines = p.parametric_lines.resolve(ctx)?;
                let parameters = p.parameters.materialize(ctx.store)?;
                let line_indices = match &p.line_indices {
                    Some(indices) => {
                        let indices = indices.materialize_optional_indices(ctx.store)?;
                        if indices.len() != parameters.len() {
                            return Err(Error::structural(
                                PARAMETRIC_CONTEXT,
                                format!(
                                    "{} line indices for {} parameters",
                                    indices.len(),
                                    parameters.len()
                                ),
                            ));
                        }
                        if let Some(bad) = indices.iter().flatten().find(|&&l| l >= lines.len()) {
                            return Err(Error::structural(
                                PARAMETRIC_CONTEXT,
                                format!("line index {bad} outside 0..{}", lines.len()),
                            ));
                        }
                        Some(indices)
                    }
                    None => None,
                };
                ResolvedPoints::Parametric {
                    lines,
                    parameters,
                    line_indices,
                }
            }
        };
        tracing::debug!(points = resolved.len(), "resolved point3d array");
        Ok(resolved)
    }

    /// Resolves and evaluates every point.
    pub fn materialize(&self, ctx: &ResolveContext<'_>) -> Result<Vec<Point3<f64>>> {
        Ok(self.resolve(ctx)?.materialize(ctx.config))
    }
}

impl From<Vec<Point3<f64>>> for Point3dArray {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Point3dArray::Inline(points)
    }
}

/// Point array whose inputs are all in memory.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPoints {
    Explicit(Vec<Point3<f64>>),
    Lattice {
        origin: Point3<f64>,
        /// Direction and cumulative position along each axis.
        axes: SmallVec<[(Vector3<f64>, Vec<f64>); 3]>,
    },
    ZValue {
        xy: Box<ResolvedPoints>,
        z: Vec<f64>,
    },
    Parametric {
        lines: ResolvedLineArray,
        parameters: Vec<f64>,
        line_indices: Option<Vec<Option<usize>>>,
    },
}

impl ResolvedPoints {
    pub fn len(&self) -> usize {
        match self {
            ResolvedPoints::Explicit(points) => points.len(),
            ResolvedPoints::Lattice { axes, .. } => axes.iter().map(|(_, p)| p.len()).product(),
            ResolvedPoints::ZValue { z, .. } => z.len(),
            ResolvedPoints::Parametric { parameters, .. } => parameters.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point `index`. Panics with `OutOfRangeAccess` past the end.
    pub fn point(&self, index: usize) -> Point3<f64> {
        let len = self.len();
        if index >= len {
            out_of_range(index, len);
        }
        match self {
            ResolvedPoints::Explicit(points) => points[index],
            ResolvedPoints::Lattice { origin, axes } => {
                let mut rest = index;
                let mut point = *origin;
                for (direction, positions) in axes {
                    let count = positions.len();
                    point += direction * positions[rest % count];
                    rest /= count;
                }
                point
            }
            ResolvedPoints::ZValue { xy, z } => {
                let base = xy.point(index);
                Point3::new(base.x, base.y, z[index])
            }
            ResolvedPoints::Parametric {
                lines,
                parameters,
                line_indices,
            } => {
                let line = match line_indices {
                    Some(indices) => indices[index],
                    None if lines.is_empty() => None,
                    None => Some(index % lines.len()),
                };
                match line {
                    Some(line) => lines.evaluate(line, parameters[index]),
                    None => nan_point(),
                }
            }
        }
    }

    /// Evaluates every point, in parallel when the array is large.
    pub fn materialize(&self, config: &EvaluationConfig) -> Vec<Point3<f64>> {
        let len = self.len();
        if let ResolvedPoints::Explicit(points) = self {
            return points.clone();
        }
        if len >= config.parallel_threshold {
            (0..len).into_par_iter().map(|i| self.point(i)).collect()
        } else {
            (0..len).map(|i| self.point(i)).collect()
        }
    }
}

#[inline]
pub(crate) fn nan_point() -> Point3<f64> {
    Point3::new(f64::NAN, f64::NAN, f64::NAN)
}
