//! Primitive solids.

use std::f64::consts::PI;

use vcad_kernel_api::Point3;

use crate::polygon::Polygon;
use crate::solid::MeshSolid;

/// Box from the origin to `(sx, sy, sz)`. Non-positive sizes give an empty solid.
pub fn cube(sx: f64, sy: f64, sz: f64) -> MeshSolid {
    if sx <= 0.0 || sy <= 0.0 || sz <= 0.0 {
        return MeshSolid::empty();
    }
    let p = |x: f64, y: f64, z: f64| Point3::new(x * sx, y * sy, z * sz);
    let faces = [
        // -X, +X
        [p(0., 0., 0.), p(0., 0., 1.), p(0., 1., 1.), p(0., 1., 0.)],
        [p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.)],
        // -Y, +Y
        [p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.)],
        [p(0., 1., 0.), p(0., 1., 1.), p(1., 1., 1.), p(1., 1., 0.)],
        // -Z, +Z
        [p(0., 0., 0.), p(0., 1., 0.), p(1., 1., 0.), p(1., 0., 0.)],
        [p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.)],
    ];
    MeshSolid::from_polygons(
        faces
            .into_iter()
            .filter_map(|f| Polygon::new(f.to_vec()))
            .collect(),
    )
}

/// Cone or frustum along +Z from `z = 0` to `z = height`.
pub fn cone(radius_bottom: f64, radius_top: f64, height: f64, segments: u32) -> MeshSolid {
    if height <= 0.0 || radius_bottom < 0.0 || radius_top < 0.0 {
        return MeshSolid::empty();
    }
    if radius_bottom <= 0.0 && radius_top <= 0.0 {
        return MeshSolid::empty();
    }
    let n = segments.max(3) as usize;
    let ring = |r: f64, z: f64| -> Vec<Point3> {
        (0..n)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / n as f64;
                Point3::new(r * a.cos(), r * a.sin(), z)
            })
            .collect()
    };
    let bottom = ring(radius_bottom, 0.0);
    let top = ring(radius_top, height);

    let mut polygons = Vec::with_capacity(n + 2);
    polygons.extend(Polygon::new(bottom.iter().rev().copied().collect()));
    polygons.extend(Polygon::new(top.clone()));
    for i in 0..n {
        let j = (i + 1) % n;
        polygons.extend(Polygon::new(vec![bottom[i], bottom[j], top[j], top[i]]));
    }
    MeshSolid::from_polygons(polygons)
}

/// UV sphere centered at the origin.
pub fn sphere(radius: f64, segments: u32) -> MeshSolid {
    if radius <= 0.0 {
        return MeshSolid::empty();
    }
    let slices = segments.max(3) as usize;
    let stacks = (segments / 2).max(2) as usize;
    let vertex = |i: usize, j: usize| {
        let theta = 2.0 * PI * i as f64 / slices as f64;
        let phi = PI * j as f64 / stacks as f64;
        Point3::new(
            radius * theta.cos() * phi.sin(),
            radius * theta.sin() * phi.sin(),
            radius * phi.cos(),
        )
    };

    let mut polygons = Vec::with_capacity(slices * stacks);
    for i in 0..slices {
        for j in 0..stacks {
            polygons.extend(Polygon::new(vec![
                vertex(i, j),
                vertex(i, j + 1),
                vertex(i + 1, j + 1),
                vertex(i + 1, j),
            ]));
        }
    }
    MeshSolid::from_polygons(polygons)
}
