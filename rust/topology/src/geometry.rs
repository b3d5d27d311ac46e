// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon and polyhedron measures used by cell geometry queries.
//!
//! Faces of corner-point cells are generally not planar, so areas, normals
//! and volumes fan each face around its vertex average instead of around its
//! first vertex.

use nalgebra::{Point3, Vector3};

/// Average of a set of points.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f64>, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Polygon normal using Newell's method, following the right-hand rule
/// relative to the vertex winding. `None` for degenerate polygons.
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }

    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    let n = points.len();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }

    let len = normal.norm();
    if len < 1e-15 {
        return None; // degenerate face
    }
    Some(normal / len)
}

/// Area of a possibly non-planar polygon.
pub fn polygon_area(points: &[Point3<f64>]) -> f64 {
    let Some(center) = centroid(points) else {
        return 0.0;
    };
    let n = points.len();
    let total = (0..n).fold(Vector3::zeros(), |acc: Vector3<f64>, i| {
        acc + (points[i] - center).cross(&(points[(i + 1) % n] - center))
    });
    total.norm() / 2.0
}

/// Signed volume enclosed by a set of faces.
///
/// Each face is given with a flag telling whether its winding is outward
/// right-handed; faces that are not get reversed. The result is positive for
/// a consistently oriented closed surface.
pub fn polyhedron_volume<'a>(faces: impl IntoIterator<Item = (&'a [Point3<f64>], bool)>) -> f64 {
    let faces: Vec<_> = faces.into_iter().collect();
    let all: Vec<Point3<f64>> = faces.iter().flat_map(|(f, _)| f.iter().copied()).collect();
    let Some(reference) = centroid(&all) else {
        return 0.0;
    };

    let mut volume = 0.0;
    for (points, outward) in faces {
        let Some(center) = centroid(points) else {
            continue;
        };
        let n = points.len();
        let mut face_volume = 0.0;
        for i in 0..n {
            let a = points[i] - reference;
            let b = points[(i + 1) % n] - reference;
            let c = center - reference;
            // Tetrahedron (reference, a, b, c) of the fan triangle (c, a, b).
            face_volume += c.dot(&a.cross(&b));
        }
        volume += if outward { face_volume } else { -face_volume };
    }
    volume / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube_faces() -> Vec<Vec<Point3<f64>>> {
        let c = |i: usize| {
            Point3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64)
        };
        [
            [0, 2, 3, 1],
            [4, 5, 7, 6],
            [0, 1, 5, 4],
            [1, 3, 7, 5],
            [2, 6, 7, 3],
            [0, 4, 6, 2],
        ]
        .iter()
        .map(|face| face.iter().map(|&i| c(i)).collect())
        .collect()
    }

    #[test]
    fn test_newell_normal() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_relative_eq!(polygon_normal(&square).unwrap(), Vector3::z());
        assert_relative_eq!(polygon_area(&square), 1.0);
        assert!(polygon_normal(&square[..2]).is_none());
    }

    #[test]
    fn test_cube_volume_and_outward_faces() {
        let faces = unit_cube_faces();
        let center = Point3::new(0.5, 0.5, 0.5);
        for face in &faces {
            let normal = polygon_normal(face).unwrap();
            let outward = centroid(face).unwrap() - center;
            assert!(normal.dot(&outward) > 0.0);
        }
        let volume = polyhedron_volume(faces.iter().map(|f| (f.as_slice(), true)));
        assert_relative_eq!(volume, 1.0, epsilon = 1e-12);

        let inverted = polyhedron_volume(faces.iter().map(|f| (f.as_slice(), false)));
        assert_relative_eq!(inverted, -1.0, epsilon = 1e-12);
    }
}
