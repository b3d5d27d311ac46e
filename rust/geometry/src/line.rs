// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parametric lines: control-point curves with a fixed interpolation kind.

use std::fmt;

use nalgebra::{Point3, Vector3};
use resqml_lite_core::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::EvaluationConfig;
use crate::interpolation::{complete_tangents, hermite, hermite_scalar, infer_tangents, minimum_curvature};

const CONTEXT: &str = "parametric line";

/// Interpolation kind of a parametric line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum LineKind {
    Vertical,
    Linear,
    NaturalCubic,
    Cubic,
    ZLinearCubic,
    MinimumCurvature,
}

impl LineKind {
    /// Decodes a line kind index. `-1` is the null line and maps to `None`.
    pub fn from_code(code: i64) -> Result<Option<Self>> {
        Ok(Some(match code {
            -1 => return Ok(None),
            0 => LineKind::Vertical,
            1 => LineKind::Linear,
            2 => LineKind::NaturalCubic,
            3 => LineKind::Cubic,
            4 => LineKind::ZLinearCubic,
            5 => LineKind::MinimumCurvature,
            other => return Err(Error::unsupported("line kind", other)),
        }))
    }

    pub fn code(self) -> i64 {
        match self {
            LineKind::Vertical => 0,
            LineKind::Linear => 1,
            LineKind::NaturalCubic => 2,
            LineKind::Cubic => 3,
            LineKind::ZLinearCubic => 4,
            LineKind::MinimumCurvature => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineKind::Vertical => "vertical",
            LineKind::Linear => "linear",
            LineKind::NaturalCubic => "naturalCubic",
            LineKind::Cubic => "cubic",
            LineKind::ZLinearCubic => "zLinearCubic",
            LineKind::MinimumCurvature => "minimumCurvature",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parametric line, validated and ready for evaluation.
///
/// Parameters default to the knot indices `0..N`. Tangents are resolved when
/// the line is built: explicit where supplied for cubic and
/// minimum-curvature lines, inferred everywhere else.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParametricLine {
    kind: LineKind,
    control_points: Vec<Point3<f64>>,
    parameters: Vec<f64>,
    explicit_parameters: bool,
    tangents: Vec<Vector3<f64>>,
    bounded: bool,
    tolerance: f64,
}

impl ParametricLine {
    /// Builds a line, checking knot counts, parameter monotonicity and the
    /// parameter requirements of the kind.
    pub fn try_new(
        kind: LineKind,
        control_points: Vec<Point3<f64>>,
        parameters: Option<Vec<f64>>,
        tangents: Option<Vec<Vector3<f64>>>,
    ) -> Result<Self> {
        let n = control_points.len();
        if n == 0 {
            return Err(Error::structural(CONTEXT, "line has no control points"));
        }
        if control_points.iter().any(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(Error::structural(CONTEXT, "control point is not finite"));
        }

        let explicit_parameters = parameters.is_some();
        match (kind, explicit_parameters) {
            (LineKind::ZLinearCubic, true) => {
                return Err(Error::structural(
                    CONTEXT,
                    "zLinearCubic lines take implicit integer parameters",
                ));
            }
            (LineKind::MinimumCurvature, false) => {
                return Err(Error::structural(
                    CONTEXT,
                    "minimumCurvature lines need arc-length parameters",
                ));
            }
            _ => {}
        }

        let parameters = match parameters {
            Some(p) => {
                if p.len() != n {
                    return Err(Error::structural(
                        CONTEXT,
                        format!("{} parameters for {n} control points", p.len()),
                    ));
                }
                if p.iter().any(|t| !t.is_finite()) {
                    return Err(Error::structural(CONTEXT, "parameter is not finite"));
                }
                if let Some(i) = p.windows(2).position(|w| w[1] <= w[0]) {
                    return Err(Error::structural(
                        CONTEXT,
                        format!("parameters not strictly increasing at knot {}", i + 1),
                    ));
                }
                p
            }
            None => (0..n).map(|i| i as f64).collect(),
        };

        if let Some(t) = &tangents {
            if t.len() != n {
                return Err(Error::structural(
                    CONTEXT,
                    format!("{} tangents for {n} control points", t.len()),
                ));
            }
        }

        let tolerance = EvaluationConfig::default().parameter_tolerance;
        let tangents = match kind {
            LineKind::Vertical | LineKind::Linear => Vec::new(),
            LineKind::NaturalCubic | LineKind::ZLinearCubic => {
                infer_tangents(&control_points, &parameters)
            }
            LineKind::Cubic => complete_tangents(&control_points, &parameters, tangents.as_deref()),
            LineKind::MinimumCurvature => {
                let raw = complete_tangents(&control_points, &parameters, tangents.as_deref());
                unit_tangents(&control_points, raw, tolerance)
            }
        };

        Ok(Self {
            kind,
            control_points,
            parameters,
            explicit_parameters,
            tangents,
            bounded: false,
            tolerance,
        })
    }

    /// Straight line through the given points.
    pub fn linear(control_points: Vec<Point3<f64>>, parameters: Option<Vec<f64>>) -> Result<Self> {
        Self::try_new(LineKind::Linear, control_points, parameters, None)
    }

    /// Clamp out-of-range parameters to the end knots instead of
    /// extrapolating.
    pub fn with_bounded(mut self, bounded: bool) -> Self {
        self.bounded = bounded;
        self
    }

    /// Applies the boundedness and tolerance of a configuration.
    pub fn configured(mut self, config: &EvaluationConfig) -> Self {
        self.bounded = config.bounded_lines;
        if self.tolerance != config.parameter_tolerance {
            self.tolerance = config.parameter_tolerance;
            if self.kind == LineKind::MinimumCurvature {
                let tangents = std::mem::take(&mut self.tangents);
                self.tangents = unit_tangents(&self.control_points, tangents, self.tolerance);
            }
        }
        self
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    pub fn control_points(&self) -> &[Point3<f64>] {
        &self.control_points
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn has_explicit_parameters(&self) -> bool {
        self.explicit_parameters
    }

    /// Resolved knot tangents; empty for vertical and linear lines.
    pub fn tangents(&self) -> &[Vector3<f64>] {
        &self.tangents
    }

    pub fn knot_count(&self) -> usize {
        self.control_points.len()
    }

    /// Parameter range spanned by the knots.
    pub fn parameter_range(&self) -> (f64, f64) {
        (self.parameters[0], self.parameters[self.parameters.len() - 1])
    }

    /// Point at `parameter`. A NaN parameter gives a NaN point.
    pub fn evaluate(&self, parameter: f64) -> Point3<f64> {
        if parameter.is_nan() {
            return Point3::new(f64::NAN, f64::NAN, f64::NAN);
        }

        if self.kind == LineKind::Vertical {
            return self.evaluate_vertical(parameter);
        }

        let (first, last) = self.parameter_range();
        let t = if self.bounded {
            parameter.clamp(first, last)
        } else {
            parameter
        };

        let n = self.control_points.len();
        if n == 1 {
            return self.control_points[0];
        }

        let seg = self.segment(t);
        let (t0, t1) = (self.parameters[seg], self.parameters[seg + 1]);
        if (t - t0).abs() <= self.tolerance {
            return self.control_points[seg];
        }
        if (t - t1).abs() <= self.tolerance {
            return self.control_points[seg + 1];
        }

        let h = t1 - t0;
        let s = (t - t0) / h;
        let (p0, p1) = (&self.control_points[seg], &self.control_points[seg + 1]);

        match self.kind {
            LineKind::Vertical => self.evaluate_vertical(parameter),
            LineKind::Linear => p0 + (p1 - p0) * s,
            LineKind::NaturalCubic | LineKind::Cubic => {
                hermite(p0, p1, &self.tangents[seg], &self.tangents[seg + 1], h, s)
            }
            LineKind::ZLinearCubic => {
                let (m0, m1) = (&self.tangents[seg], &self.tangents[seg + 1]);
                Point3::new(
                    hermite_scalar(p0.x, p1.x, m0.x, m1.x, h, s),
                    hermite_scalar(p0.y, p1.y, m0.y, m1.y, h, s),
                    p0.z + (p1.z - p0.z) * s,
                )
            }
            LineKind::MinimumCurvature => self.evaluate_minimum_curvature(seg, t),
        }
    }

    /// Index of the interval used for `t`: the bracketing one inside the
    /// range, the end interval outside it.
    fn segment(&self, t: f64) -> usize {
        let after = self.parameters.partition_point(|&p| p <= t);
        after.saturating_sub(1).min(self.parameters.len() - 2)
    }

    fn evaluate_vertical(&self, z: f64) -> Point3<f64> {
        let anchor = &self.control_points[0];
        let z = if self.bounded {
            let (lo, hi) = self
                .control_points
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p.z), hi.max(p.z))
                });
            z.clamp(lo, hi)
        } else {
            z
        };
        Point3::new(anchor.x, anchor.y, z)
    }

    fn evaluate_minimum_curvature(&self, seg: usize, t: f64) -> Point3<f64> {
        let (first, last) = self.parameter_range();
        let n = self.control_points.len();
        // Extrapolation continues straight along the end tangent.
        if t < first {
            return self.control_points[0] + self.tangents[0] * (t - first);
        }
        if t > last {
            return self.control_points[n - 1] + self.tangents[n - 1] * (t - last);
        }
        let (t0, t1) = (self.parameters[seg], self.parameters[seg + 1]);
        let length = t1 - t0;
        minimum_curvature(
            &self.control_points[seg],
            &self.control_points[seg + 1],
            &self.tangents[seg],
            &self.tangents[seg + 1],
            length,
            (t - t0) / length,
            self.tolerance,
        )
    }
}

/// Normalizes tangents, replacing degenerate ones with the adjacent chord
/// direction.
fn unit_tangents(
    points: &[Point3<f64>],
    tangents: Vec<Vector3<f64>>,
    tolerance: f64,
) -> Vec<Vector3<f64>> {
    let n = points.len();
    tangents
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            t.try_normalize(tolerance).unwrap_or_else(|| {
                let chord = if i + 1 < n {
                    points[i + 1] - points[i]
                } else if i > 0 {
                    points[i] - points[i - 1]
                } else {
                    Vector3::z()
                };
                chord.try_normalize(tolerance).unwrap_or_else(Vector3::z)
            })
        })
        .collect()
}
