// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parametric line arrays (`AbstractParametricLineArray`).
//!
//! An explicit array stores its knots directly. The other two variants borrow
//! the lines of another representation through a [`DataObjectReference`] and
//! only become concrete once resolved against a catalog, which is where an
//! unresolvable reference surfaces as `UnresolvedReference`.

use nalgebra::{Point3, Vector3};
use resqml_lite_core::{
    out_of_range, ArrayAccess, DataObjectReference, DoubleArray, Error, ExternalStore,
    IntegerArray, Result,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::ResolveContext;
use crate::line::{LineKind, ParametricLine};
use crate::points::{nan_point, Point3dArray};

const CONTEXT: &str = "parametric line array";

/// A representation that can supply parametric lines (its pillars or
/// coordinate lines) to other representations.
pub trait SupportingRepresentation: Send + Sync {
    fn parametric_lines(&self, ctx: &ResolveContext<'_>) -> Result<ResolvedLineArray>;
}

/// Lines stored knot by knot (`ParametricLineArray`).
///
/// All lines share `knot_count` slots; control points, parameters and tangents
/// are laid out line after line. A line shorter than `knot_count` pads its
/// trailing control points with NaN.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "ExplicitLineParts", into = "ExplicitLineParts")
)]
pub struct ExplicitLineArray {
    knot_count: usize,
    kinds: Vec<Option<LineKind>>,
    control_points: Point3dArray,
    parameters: Option<DoubleArray>,
    tangents: Option<Point3dArray>,
}

/// Unvalidated wire form of an [`ExplicitLineArray`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExplicitLineParts {
    pub knot_count: usize,
    pub kinds: Vec<Option<LineKind>>,
    pub control_points: Point3dArray,
    pub parameters: Option<DoubleArray>,
    pub tangents: Option<Point3dArray>,
}

impl ExplicitLineArray {
    /// Builds the array, decoding every line kind and checking that the knot
    /// arrays match `knot_count × line count`.
    pub fn try_new(
        knot_count: usize,
        line_kind_indices: &IntegerArray,
        control_points: Point3dArray,
        parameters: Option<DoubleArray>,
        tangents: Option<Point3dArray>,
        store: &dyn ExternalStore,
    ) -> Result<Self> {
        let kinds = line_kind_indices
            .materialize(store)?
            .into_iter()
            .map(LineKind::from_code)
            .collect::<Result<Vec<_>>>()?;
        Self::from_kinds(knot_count, kinds, control_points, parameters, tangents)
    }

    /// Builds the array from already decoded line kinds.
    pub fn from_kinds(
        knot_count: usize,
        kinds: Vec<Option<LineKind>>,
        control_points: Point3dArray,
        parameters: Option<DoubleArray>,
        tangents: Option<Point3dArray>,
    ) -> Result<Self> {
        if knot_count == 0 {
            return Err(Error::structural(CONTEXT, "knot count is zero"));
        }

        let expected = kinds.len() * knot_count;
        if control_points.len() != expected {
            return Err(Error::structural(
                CONTEXT,
                format!(
                    "{} control points for {} lines of {knot_count} knots",
                    control_points.len(),
                    kinds.len()
                ),
            ));
        }
        if let Some(parameters) = &parameters {
            parameters.expect_len(expected, CONTEXT)?;
            if kinds.contains(&Some(LineKind::ZLinearCubic)) {
                return Err(Error::structural(
                    CONTEXT,
                    "zLinearCubic lines take implicit integer parameters",
                ));
            }
        }
        if let Some(tangents) = &tangents {
            if tangents.len() != expected {
                return Err(Error::structural(
                    CONTEXT,
                    format!("{} tangents for {expected} knots", tangents.len()),
                ));
            }
        }

        Ok(Self {
            knot_count,
            kinds,
            control_points,
            parameters,
            tangents,
        })
    }

    pub fn knot_count(&self) -> usize {
        self.knot_count
    }

    pub fn line_count(&self) -> usize {
        self.kinds.len()
    }

    /// Kind of each line; `None` marks a null line.
    pub fn kinds(&self) -> &[Option<LineKind>] {
        &self.kinds
    }

    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<ResolvedLineArray> {
        let points = self.control_points.materialize(ctx)?;
        let parameters = self
            .parameters
            .as_ref()
            .map(|p| p.materialize(ctx.store))
            .transpose()?;
        let tangents: Option<Vec<Vector3<f64>>> = self
            .tangents
            .as_ref()
            .map(|t| t.materialize(ctx))
            .transpose()?
            .map(|t| t.into_iter().map(|p| p.coords).collect());

        let k = self.knot_count;
        let expected = self.kinds.len() * k;
        let resolved_lengths = [
            ("control points", Some(points.len())),
            ("parameters", parameters.as_ref().map(Vec::len)),
            ("tangents", tangents.as_ref().map(Vec::len)),
        ];
        for (name, len) in resolved_lengths {
            if let Some(len) = len.filter(|&len| len != expected) {
                return Err(Error::structural(
                    CONTEXT,
                    format!("{len} resolved {name} for {expected} knot slots"),
                ));
            }
        }
        let mut lines = Vec::with_capacity(self.kinds.len());
        for (l, kind) in self.kinds.iter().enumerate() {
            let Some(kind) = kind else {
                lines.push(None);
                continue;
            };
            let slots = l * k..(l + 1) * k;
            let knots = &points[slots.clone()];
            let used = knots
                .iter()
                .rposition(|p| p.iter().all(|c| c.is_finite()))
                .map_or(0, |last| last + 1);
            if used == 0 {
                lines.push(None);
                continue;
            }
            let used_slots = slots.start..slots.start + used;

            let line = ParametricLine::try_new(
                *kind,
                knots[..used].to_vec(),
                parameters.as_ref().map(|p| p[used_slots.clone()].to_vec()),
                tangents.as_ref().map(|t| t[used_slots].to_vec()),
            )
            .map_err(|e| match e {
                Error::StructuralInconsistency { detail, .. } => {
                    Error::structural(CONTEXT, format!("line {l}: {detail}"))
                }
                other => other,
            })?;
            lines.push(Some(line.configured(ctx.config)));
        }

        Ok(ResolvedLineArray::new(lines))
    }
}

impl TryFrom<ExplicitLineParts> for ExplicitLineArray {
    type Error = Error;

    fn try_from(parts: ExplicitLineParts) -> Result<Self> {
        Self::from_kinds(
            parts.knot_count,
            parts.kinds,
            parts.control_points,
            parts.parameters,
            parts.tangents,
        )
    }
}

impl From<ExplicitLineArray> for ExplicitLineParts {
    fn from(array: ExplicitLineArray) -> Self {
        ExplicitLineParts {
            knot_count: array.knot_count,
            kinds: array.kinds,
            control_points: array.control_points,
            parameters: array.parameters,
            tangents: array.tangents,
        }
    }
}

/// Parametric line array storage variants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParametricLineArray {
    Explicit(ExplicitLineArray),
    /// Lines of another representation selected by index
    /// (`ParametricLineFromRepresentationLatticeArray`). A null index is a
    /// null line.
    FromRepresentationLattice {
        line_indices: IntegerArray,
        supporting_representation: DataObjectReference,
    },
    /// All lines of another representation
    /// (`ParametricLineFromRepresentationGeometry`).
    FromRepresentationGeometry {
        supporting_representation: DataObjectReference,
    },
}

impl ParametricLineArray {
    /// Number of lines, when known without resolution.
    pub fn line_count(&self) -> Option<usize> {
        match self {
            ParametricLineArray::Explicit(explicit) => Some(explicit.line_count()),
            ParametricLineArray::FromRepresentationLattice { line_indices, .. } => {
                Some(line_indices.len())
            }
            ParametricLineArray::FromRepresentationGeometry { .. } => None,
        }
    }

    /// Turns the array into concrete lines.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<ResolvedLineArray> {
        let resolved = match self {
            ParametricLineArray::Explicit(explicit) => explicit.resolve(ctx)?,
            ParametricLineArray::FromRepresentationLattice {
                line_indices,
                supporting_representation,
            } => {
                let supporting = supporting_lines(supporting_representation, ctx)?;
                let indices = line_indices.materialize_optional_indices(ctx.store)?;
                let lines = indices
                    .into_iter()
                    .map(|index| match index {
                        None => Ok(None),
                        Some(i) if i < supporting.len() => Ok(supporting.lines[i].clone()),
                        Some(i) => Err(Error::structural(
                            CONTEXT,
                            format!(
                                "line index {i} outside the {} lines of {supporting_representation}",
                                supporting.len()
                            ),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                ResolvedLineArray::new(lines)
            }
            ParametricLineArray::FromRepresentationGeometry {
                supporting_representation,
            } => supporting_lines(supporting_representation, ctx)?,
        };
        tracing::debug!(
            lines = resolved.len(),
            null_lines = resolved.null_count(),
            "resolved parametric line array"
        );
        Ok(resolved)
    }
}

fn supporting_lines(
    reference: &DataObjectReference,
    ctx: &ResolveContext<'_>,
) -> Result<ResolvedLineArray> {
    let representation = reference.resolve::<dyn SupportingRepresentation, _>(ctx.catalog)?;
    representation.parametric_lines(&ctx.nested()?)
}

impl SupportingRepresentation for ParametricLineArray {
    fn parametric_lines(&self, ctx: &ResolveContext<'_>) -> Result<ResolvedLineArray> {
        self.resolve(ctx)
    }
}

/// Concrete lines, `None` for null lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedLineArray {
    lines: Vec<Option<ParametricLine>>,
}

impl ResolvedLineArray {
    pub fn new(lines: Vec<Option<ParametricLine>>) -> Self {
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_none()).count()
    }

    /// Line `index`, or `None` for a null line.
    pub fn line(&self, index: usize) -> Option<&ParametricLine> {
        match self.lines.get(index) {
            Some(line) => line.as_ref(),
            None => out_of_range(index, self.lines.len()),
        }
    }

    /// Point on line `index` at `parameter`; NaN on a null line.
    pub fn evaluate(&self, index: usize, parameter: f64) -> Point3<f64> {
        self.line(index)
            .map_or_else(nan_point, |line| line.evaluate(parameter))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<&ParametricLine>> + '_ {
        self.lines.iter().map(Option::as_ref)
    }

    pub fn into_lines(self) -> Vec<Option<ParametricLine>> {
        self.lines
    }
}

impl SupportingRepresentation for ResolvedLineArray {
    fn parametric_lines(&self, _ctx: &ResolveContext<'_>) -> Result<ResolvedLineArray> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::context::RepresentationCatalog;
    use approx::assert_relative_eq;
    use resqml_lite_core::{ContentType, InMemoryCatalog, NoExternalStore, Uuid};
    use std::sync::Arc;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    /// Two lines of three knot slots: a vertical-ish linear line and a null
    /// line, plus a linear line that only uses two knots.
    fn explicit() -> ExplicitLineArray {
        let nan = p(f64::NAN, f64::NAN, f64::NAN);
        ExplicitLineArray::try_new(
            3,
            &IntegerArray::inline(vec![1, -1, 1]),
            Point3dArray::Inline(vec![
                p(0.0, 0.0, 0.0),
                p(0.0, 0.0, 10.0),
                p(0.0, 0.0, 20.0),
                nan,
                nan,
                nan,
                p(5.0, 0.0, 0.0),
                p(5.0, 0.0, 30.0),
                nan,
            ]),
            None,
            None,
            &NoExternalStore,
        )
        .unwrap()
    }

    fn grid_reference() -> DataObjectReference {
        DataObjectReference::new(
            Uuid::from_u128(42),
            ContentType::parse("resqml20.obj_IjkGridRepresentation").unwrap(),
        )
    }

    #[test]
    fn test_explicit_resolution() {
        let resolved = explicit().resolve(&ResolveContext::detached()).unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.null_count(), 1);
        assert!(resolved.line(1).is_none());
        assert_eq!(resolved.line(2).unwrap().knot_count(), 2);
        assert_relative_eq!(resolved.evaluate(0, 1.5), p(0.0, 0.0, 15.0));
        assert!(resolved.evaluate(1, 0.5).z.is_nan());
    }

    #[test]
    fn test_configured_boundedness() {
        let config = EvaluationConfig::default().with_bounded_lines(true);
        let ctx = ResolveContext::detached().with_config(&config);
        let resolved = explicit().resolve(&ctx).unwrap();
        assert_relative_eq!(resolved.evaluate(2, 5.0), p(5.0, 0.0, 30.0));
    }

    #[test]
    fn test_rejects_mismatched_layout() {
        let err = ExplicitLineArray::try_new(
            2,
            &IntegerArray::inline(vec![1, 1]),
            Point3dArray::Inline(vec![p(0.0, 0.0, 0.0); 3]),
            None,
            None,
            &NoExternalStore,
        )
        .unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency { .. }));

        let err = ExplicitLineArray::try_new(
            1,
            &IntegerArray::inline(vec![9]),
            Point3dArray::Inline(vec![p(0.0, 0.0, 0.0)]),
            None,
            None,
            &NoExternalStore,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVariant { .. }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_decoding_rejects_mismatched_layout() {
        let two_lines = ExplicitLineArray::try_new(
            2,
            &IntegerArray::inline(vec![1, 1]),
            Point3dArray::Inline(vec![
                p(0.0, 0.0, 0.0),
                p(0.0, 0.0, 10.0),
                p(5.0, 0.0, 0.0),
                p(5.0, 0.0, 10.0),
            ]),
            None,
            None,
            &NoExternalStore,
        )
        .unwrap();
        let json = serde_json::to_value(&two_lines).unwrap();
        let restored: ExplicitLineArray = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored, two_lines);

        let mut wrong_knots = json.clone();
        wrong_knots["knot_count"] = serde_json::json!(3);
        assert!(serde_json::from_value::<ExplicitLineArray>(wrong_knots).is_err());

        let mut short_points = json;
        short_points["control_points"] =
            serde_json::to_value(Point3dArray::Inline(vec![p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0)]))
                .unwrap();
        assert!(serde_json::from_value::<ParametricLineArray>(serde_json::json!({
            "Explicit": short_points
        }))
        .is_err());
    }

    #[test]
    fn test_from_representation_lattice() {
        let mut catalog: InMemoryCatalog<dyn SupportingRepresentation> = InMemoryCatalog::new();
        let reference = grid_reference();
        catalog.insert(
            reference.uuid,
            reference.content_type.clone(),
            Arc::new(ParametricLineArray::Explicit(explicit())),
        );
        let catalog: &RepresentationCatalog = &catalog;
        let ctx = ResolveContext::detached().with_catalog(catalog);

        let selected = ParametricLineArray::FromRepresentationLattice {
            line_indices: IntegerArray::Inline {
                values: vec![2, 0, -9],
                null_value: Some(-9),
            },
            supporting_representation: reference.clone(),
        };
        let resolved = selected.resolve(&ctx).unwrap();
        assert_eq!(resolved.len(), 3);
        assert_relative_eq!(resolved.evaluate(0, 1.0), p(5.0, 0.0, 30.0));
        assert!(resolved.line(2).is_none());

        let all = ParametricLineArray::FromRepresentationGeometry {
            supporting_representation: reference.clone(),
        };
        assert_eq!(all.resolve(&ctx).unwrap().len(), 3);

        let out_of_range = ParametricLineArray::FromRepresentationLattice {
            line_indices: IntegerArray::inline(vec![3]),
            supporting_representation: reference,
        };
        assert!(out_of_range.resolve(&ctx).is_err());
    }

    #[test]
    fn test_unresolvable_supporting_representation() {
        let array = ParametricLineArray::FromRepresentationGeometry {
            supporting_representation: grid_reference(),
        };
        let err = array.resolve(&ResolveContext::detached()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }

    #[test]
    fn test_self_reference_is_cut_off() {
        let reference = grid_reference();
        let mut catalog: InMemoryCatalog<dyn SupportingRepresentation> = InMemoryCatalog::new();
        catalog.insert(
            reference.uuid,
            reference.content_type.clone(),
            Arc::new(ParametricLineArray::FromRepresentationGeometry {
                supporting_representation: reference.clone(),
            }),
        );
        let ctx = ResolveContext::detached().with_catalog(&catalog);
        let array = ParametricLineArray::FromRepresentationGeometry {
            supporting_representation: reference,
        };
        assert!(matches!(
            array.resolve(&ctx),
            Err(Error::StructuralInconsistency { .. })
        ));
    }
}
