//! Polygon-soup solid representation.

use nalgebra::Matrix3;
use vcad_kernel_api::{Point3, TriangleMesh, Vec3};

use crate::bsp;
use crate::polygon::Polygon;

/// A closed solid stored as outward-facing convex polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSolid {
    polygons: Vec<Polygon>,
}

impl MeshSolid {
    /// Solid with no polygons.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap polygons, flipping them all if they enclose negative volume.
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        let mut solid = Self { polygons };
        if solid.volume() < 0.0 {
            for p in &mut solid.polygons {
                p.flip();
            }
        }
        solid
    }

    /// The polygons of this solid.
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// True if the solid has no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Signed enclosed volume (positive for outward winding).
    pub fn volume(&self) -> f64 {
        let mut six_v = 0.0;
        for p in &self.polygons {
            for [a, b, c] in p.fan() {
                let (a, b, c) = (p.vertices[a], p.vertices[b], p.vertices[c]);
                six_v += a.coords.dot(&b.coords.cross(&c.coords));
            }
        }
        six_v / 6.0
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let mut it = self.polygons.iter().flat_map(|p| p.vertices.iter());
        let first = *it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| {
            (
                Point3::from(lo.coords.inf(&v.coords)),
                Point3::from(hi.coords.sup(&v.coords)),
            )
        }))
    }

    /// Apply an affine map `p -> m * p + t`.
    ///
    /// A mirroring map (negative determinant) reverses winding so faces keep
    /// pointing outward. Polygons collapsed by a singular map are dropped.
    pub fn transformed(&self, m: &Matrix3<f64>, t: &Vec3) -> Self {
        let mirror = m.determinant() < 0.0;
        let polygons = self
            .polygons
            .iter()
            .filter_map(|p| {
                let mut verts: Vec<Point3> = p
                    .vertices
                    .iter()
                    .map(|v| Point3::from(m * v.coords + t))
                    .collect();
                if mirror {
                    verts.reverse();
                }
                Polygon::new(verts)
            })
            .collect();
        Self { polygons }
    }

    fn overlaps(&self, other: &Self) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => (0..3).all(|k| {
                a_lo[k] <= b_hi[k] + crate::polygon::PLANE_EPSILON
                    && b_lo[k] <= a_hi[k] + crate::polygon::PLANE_EPSILON
            }),
            _ => false,
        }
    }

    /// Boolean union.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        if !self.overlaps(other) {
            let mut polygons = self.polygons.clone();
            polygons.extend(other.polygons.iter().cloned());
            return Self { polygons };
        }
        Self {
            polygons: bsp::union(self.polygons.clone(), other.polygons.clone()),
        }
    }

    /// Boolean difference `self - other`.
    pub fn difference(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() || !self.overlaps(other) {
            return self.clone();
        }
        Self {
            polygons: bsp::difference(self.polygons.clone(), other.polygons.clone()),
        }
    }

    /// Boolean intersection.
    pub fn intersection(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() || !self.overlaps(other) {
            return Self::empty();
        }
        let solid = Self {
            polygons: bsp::intersection(self.polygons.clone(), other.polygons.clone()),
        };
        // Touching faces survive the clip as a zero-volume sliver.
        if solid.volume().abs() < 1e-9 {
            return Self::empty();
        }
        solid
    }

    /// Flat-shaded triangle mesh: each polygon gets its own vertices carrying
    /// the polygon normal.
    pub fn to_mesh(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        let mut normals = Vec::new();
        for p in &self.polygons {
            let base = mesh.num_vertices() as u32;
            let n = p.plane.normal;
            for v in &p.vertices {
                mesh.positions
                    .extend_from_slice(&[v.x as f32, v.y as f32, v.z as f32]);
                normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
            }
            for [a, b, c] in p.fan() {
                mesh.indices
                    .extend_from_slice(&[base + a as u32, base + b as u32, base + c as u32]);
            }
        }
        mesh.normals = Some(normals);
        mesh
    }
}
