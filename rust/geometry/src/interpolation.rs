// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interpolation kernels shared by the parametric line kinds.
//!
//! - Cubic Hermite segments with tangents inferred from neighbouring knots
//! - Circular arcs constrained by unit tangents (minimum curvature)

use nalgebra::{Point3, Vector3};

/// Infers a tangent at every knot of a cubic spline.
///
/// Internal knots take the derivative of the quadratic through the knot and
/// its two neighbours. Edge knots take the tangent that makes the second
/// derivative vanish there. With two knots both tangents equal the secant, so
/// the spline degenerates to the straight segment.
pub fn infer_tangents(points: &[Point3<f64>], parameters: &[f64]) -> Vec<Vector3<f64>> {
    let n = points.len();
    debug_assert_eq!(n, parameters.len());
    if n < 2 {
        return vec![Vector3::zeros(); n];
    }

    let secants: Vec<Vector3<f64>> = (0..n - 1)
        .map(|i| (points[i + 1] - points[i]) / (parameters[i + 1] - parameters[i]))
        .collect();

    if n == 2 {
        return vec![secants[0]; 2];
    }

    let mut tangents = vec![Vector3::zeros(); n];
    for i in 1..n - 1 {
        let h0 = parameters[i] - parameters[i - 1];
        let h1 = parameters[i + 1] - parameters[i];
        tangents[i] = (secants[i - 1] * h1 + secants[i] * h0) / (h0 + h1);
    }
    tangents[0] = (secants[0] * 3.0 - tangents[1]) / 2.0;
    tangents[n - 1] = (secants[n - 2] * 3.0 - tangents[n - 2]) / 2.0;
    tangents
}

/// Fills the tangents a caller did not supply (absent or containing NaN)
/// with inferred ones.
pub fn complete_tangents(
    points: &[Point3<f64>],
    parameters: &[f64],
    supplied: Option<&[Vector3<f64>]>,
) -> Vec<Vector3<f64>> {
    let mut inferred = infer_tangents(points, parameters);
    if let Some(supplied) = supplied {
        for (slot, given) in inferred.iter_mut().zip(supplied) {
            if given.iter().all(|c| c.is_finite()) {
                *slot = *given;
            }
        }
    }
    inferred
}

/// Cubic Hermite basis weights `(h00, h10, h01, h11)` at local coordinate `s`.
#[inline]
fn hermite_basis(s: f64) -> (f64, f64, f64, f64) {
    let s2 = s * s;
    let s3 = s2 * s;
    (
        2.0 * s3 - 3.0 * s2 + 1.0,
        s3 - 2.0 * s2 + s,
        -2.0 * s3 + 3.0 * s2,
        s3 - s2,
    )
}

/// Evaluates a Hermite segment spanning a parameter interval of length `h`.
///
/// `s` is the local coordinate, 0 at `p0` and 1 at `p1`. Values outside
/// `[0, 1]` extrapolate with the same cubic.
#[inline]
pub fn hermite(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    m0: &Vector3<f64>,
    m1: &Vector3<f64>,
    h: f64,
    s: f64,
) -> Point3<f64> {
    let (h00, h10, h01, h11) = hermite_basis(s);
    Point3::from(p0.coords * h00 + m0 * (h10 * h) + p1.coords * h01 + m1 * (h11 * h))
}

/// Scalar variant of [`hermite`], used for single coordinates.
#[inline]
pub fn hermite_scalar(v0: f64, v1: f64, m0: f64, m1: f64, h: f64, s: f64) -> f64 {
    let (h00, h10, h01, h11) = hermite_basis(s);
    v0 * h00 + m0 * h10 * h + v1 * h01 + m1 * h11 * h
}

/// Angle between two unit vectors.
#[inline]
fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Spherical interpolation between unit vectors separated by `theta`.
fn slerp(a: &Vector3<f64>, b: &Vector3<f64>, theta: f64, s: f64, tolerance: f64) -> Vector3<f64> {
    let sin_theta = theta.sin();
    if theta <= tolerance || sin_theta.abs() <= tolerance {
        let lerp = a * (1.0 - s) + b * s;
        return lerp.try_normalize(tolerance).unwrap_or(*a);
    }
    (a * ((1.0 - s) * theta).sin() + b * (s * theta).sin()) / sin_theta
}

/// Ratio factor `2/φ · tan(φ/2)` of the minimum-curvature method.
#[inline]
fn ratio_factor(phi: f64, tolerance: f64) -> f64 {
    if phi <= tolerance {
        1.0
    } else {
        2.0 / phi * (phi / 2.0).tan()
    }
}

/// Displacement along the circular arc leaving with unit tangent `t0` and
/// arriving with unit tangent `t1` after arc length `length`, evaluated at
/// fraction `s` of that length.
pub fn arc_displacement(
    t0: &Vector3<f64>,
    t1: &Vector3<f64>,
    length: f64,
    s: f64,
    tolerance: f64,
) -> Vector3<f64> {
    let theta = angle_between(t0, t1);
    if theta <= tolerance {
        return t0 * (length * s);
    }
    let ts = slerp(t0, t1, theta, s, tolerance);
    (t0 + ts) * (length * s / 2.0 * ratio_factor(theta * s, tolerance))
}

/// Point on a minimum-curvature segment between two knots at fraction `s`.
///
/// Knot data is rarely exactly consistent with a circular arc, so the arc
/// from `p0` is corrected linearly to land on `p1`.
pub fn minimum_curvature(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    t0: &Vector3<f64>,
    t1: &Vector3<f64>,
    length: f64,
    s: f64,
    tolerance: f64,
) -> Point3<f64> {
    let full = arc_displacement(t0, t1, length, 1.0, tolerance);
    let closure = (p1 - p0) - full;
    p0 + arc_displacement(t0, t1, length, s, tolerance) + closure * s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_two_knot_tangents_are_secant() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)];
        let tangents = infer_tangents(&points, &[0.0, 2.0]);
        assert_relative_eq!(tangents[0], Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(tangents[1], Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_quadratic_is_reproduced_at_internal_knot() {
        // y = x^2 sampled at x = 0, 1, 3
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(3.0, 9.0, 0.0),
        ];
        let tangents = infer_tangents(&points, &[0.0, 1.0, 3.0]);
        assert_relative_eq!(tangents[1], Vector3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_edge_knot_has_no_curvature() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let params = [0.0, 1.0, 2.0];
        let m = infer_tangents(&points, &params);
        // Second derivative of a Hermite segment at s = 0.
        let d0 = points[1] - points[0];
        let second = d0 * 6.0 - m[0] * 4.0 - m[1] * 2.0;
        assert_relative_eq!(second.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_supplied_tangents_override_inferred() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let supplied = [Vector3::new(0.0, 1.0, 0.0), Vector3::new(f64::NAN, 0.0, 0.0)];
        let tangents = complete_tangents(&points, &[0.0, 1.0], Some(&supplied));
        assert_relative_eq!(tangents[0], Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(tangents[1], Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_quarter_circle_arc() {
        let t0 = Vector3::new(1.0, 0.0, 0.0);
        let t1 = Vector3::new(0.0, 1.0, 0.0);
        let length = FRAC_PI_2;
        let end = arc_displacement(&t0, &t1, length, 1.0, 1e-12);
        assert_relative_eq!(end, Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);

        let mid = arc_displacement(&t0, &t1, length, 0.5, 1e-12);
        let (s, c) = (std::f64::consts::FRAC_PI_4).sin_cos();
        assert_relative_eq!(mid, Vector3::new(s, 1.0 - c, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_straight_arc_is_linear() {
        let t = Vector3::new(0.0, 0.0, 1.0);
        let p0 = Point3::new(1.0, 1.0, 0.0);
        let p1 = Point3::new(1.0, 1.0, 10.0);
        let p = minimum_curvature(&p0, &p1, &t, &t, 10.0, 0.25, 1e-12);
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 2.5), epsilon = 1e-12);
    }
}
