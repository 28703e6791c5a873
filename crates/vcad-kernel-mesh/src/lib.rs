#![warn(missing_docs)]

//! Reference polygon-mesh geometry kernel for vcad.
//!
//! Solids are polygon soups combined with a BSP tree. This kernel has no
//! B-rep, so fillets and chamfers leave the solid unchanged, shells are
//! approximated and STEP export is unavailable. It exists so the engine can
//! be run and tested end to end without a native CAD kernel.
//!
//! # Example
//!
//! ```
//! use vcad_kernel_api::GeometryKernel;
//! use vcad_kernel_mesh::MeshKernel;
//!
//! let k = MeshKernel::new();
//! let cube = k.cube(10.0, 10.0, 10.0);
//! let mesh = k.mesh(&cube);
//! assert_eq!(mesh.indices.len(), 36);
//! ```

mod bsp;
mod polygon;
mod primitives;
mod solid;
mod sweep;
mod triangulate;

pub use polygon::{Plane, Polygon};
pub use solid::MeshSolid;

use nalgebra::{Matrix3, Rotation3, Unit};
use vcad_kernel_api::{
    resolve_segments, GeometryKernel, Helix, KernelError, Point3, Result, SketchProfile,
    SweepOptions, TriangleMesh, Vec3,
};

/// Rotation matrix for Euler angles in degrees: `Rx * Ry * Rz`.
///
/// Applied to a point, Z acts first, then Y, then X.
pub fn euler_xyz_matrix(x_deg: f64, y_deg: f64, z_deg: f64) -> Matrix3<f64> {
    let rx = Rotation3::from_axis_angle(&Vec3::x_axis(), x_deg.to_radians());
    let ry = Rotation3::from_axis_angle(&Vec3::y_axis(), y_deg.to_radians());
    let rz = Rotation3::from_axis_angle(&Vec3::z_axis(), z_deg.to_radians());
    (rx * ry * rz).into_inner()
}

/// Polygon-mesh kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshKernel;

impl MeshKernel {
    /// Create a kernel.
    pub fn new() -> Self {
        Self
    }

    fn rotate_about_axis(
        s: &MeshSolid,
        axis_origin: Point3,
        axis: &Unit<Vec3>,
        angle_rad: f64,
    ) -> MeshSolid {
        let rot = Rotation3::from_axis_angle(axis, angle_rad).into_inner();
        // p' = R (p - o) + o
        let t = axis_origin.coords - rot * axis_origin.coords;
        s.transformed(&rot, &t)
    }
}

impl GeometryKernel for MeshKernel {
    type Solid = MeshSolid;

    fn empty(&self) -> MeshSolid {
        MeshSolid::empty()
    }

    fn cube(&self, sx: f64, sy: f64, sz: f64) -> MeshSolid {
        primitives::cube(sx, sy, sz)
    }

    fn cylinder(&self, radius: f64, height: f64, segments: Option<u32>) -> MeshSolid {
        primitives::cone(radius, radius, height, resolve_segments(segments))
    }

    fn sphere(&self, radius: f64, segments: Option<u32>) -> MeshSolid {
        primitives::sphere(radius, resolve_segments(segments))
    }

    fn cone(
        &self,
        radius_bottom: f64,
        radius_top: f64,
        height: f64,
        segments: Option<u32>,
    ) -> MeshSolid {
        primitives::cone(radius_bottom, radius_top, height, resolve_segments(segments))
    }

    fn union(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        a.union(b)
    }

    fn difference(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        a.difference(b)
    }

    fn intersection(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        a.intersection(b)
    }

    fn translate(&self, s: &MeshSolid, x: f64, y: f64, z: f64) -> MeshSolid {
        s.transformed(&Matrix3::identity(), &Vec3::new(x, y, z))
    }

    fn rotate(&self, s: &MeshSolid, x_deg: f64, y_deg: f64, z_deg: f64) -> MeshSolid {
        s.transformed(&euler_xyz_matrix(x_deg, y_deg, z_deg), &Vec3::zeros())
    }

    fn scale(&self, s: &MeshSolid, x: f64, y: f64, z: f64) -> MeshSolid {
        s.transformed(&Matrix3::from_diagonal(&Vec3::new(x, y, z)), &Vec3::zeros())
    }

    fn extrude(
        &self,
        profile: &SketchProfile,
        direction: Vec3,
        options: &SweepOptions,
    ) -> Result<MeshSolid> {
        sweep::extrude(profile, direction, options)
    }

    fn revolve(
        &self,
        profile: &SketchProfile,
        axis_origin: Point3,
        axis_dir: Vec3,
        angle_deg: f64,
    ) -> Result<MeshSolid> {
        sweep::revolve(profile, axis_origin, axis_dir, angle_deg)
    }

    fn sweep_line(
        &self,
        profile: &SketchProfile,
        start: Point3,
        end: Point3,
        options: &SweepOptions,
    ) -> Result<MeshSolid> {
        sweep::sweep_line(profile, start, end, options)
    }

    fn sweep_helix(
        &self,
        profile: &SketchProfile,
        helix: &Helix,
        options: &SweepOptions,
    ) -> Result<MeshSolid> {
        sweep::sweep_helix(profile, helix, options)
    }

    fn loft(&self, profiles: &[SketchProfile], closed: bool) -> Result<MeshSolid> {
        sweep::loft(profiles, closed)
    }

    /// Subtracts a copy shrunk by `2 * thickness` per axis about the
    /// bounding-box center. Exact for boxes, approximate otherwise.
    fn shell(&self, s: &MeshSolid, thickness: f64) -> MeshSolid {
        let Some((lo, hi)) = s.bounds() else {
            return MeshSolid::empty();
        };
        if thickness <= 0.0 {
            return s.clone();
        }
        let size = hi - lo;
        let factors = size.map(|d| if d > 0.0 { (d - 2.0 * thickness) / d } else { 0.0 });
        if factors.iter().any(|f| *f <= 0.0) {
            return s.clone();
        }
        let center = lo.coords + size / 2.0;
        let m = Matrix3::from_diagonal(&factors);
        let inner = s.transformed(&m, &(center - m * center));
        s.difference(&inner)
    }

    fn fillet(&self, s: &MeshSolid, _radius: f64) -> MeshSolid {
        s.clone()
    }

    fn chamfer(&self, s: &MeshSolid, _distance: f64) -> MeshSolid {
        s.clone()
    }

    fn linear_pattern(&self, s: &MeshSolid, direction: Vec3, count: u32, spacing: f64) -> MeshSolid {
        if count < 2 {
            return s.clone();
        }
        let dir_norm = direction.norm();
        if dir_norm < 1e-12 {
            return s.clone();
        }
        let dir = direction / dir_norm;

        let mut result = s.clone();
        for i in 1..count {
            let offset = dir * (spacing * f64::from(i));
            result = result.union(&s.transformed(&Matrix3::identity(), &offset));
        }
        result
    }

    fn circular_pattern(
        &self,
        s: &MeshSolid,
        axis_origin: Point3,
        axis_dir: Vec3,
        count: u32,
        angle_deg: f64,
    ) -> MeshSolid {
        if count < 2 || axis_dir.norm() < 1e-12 {
            return s.clone();
        }
        let axis = Unit::new_normalize(axis_dir);
        let angle_step = angle_deg.to_radians() / f64::from(count);

        let mut result = s.clone();
        for i in 1..count {
            let copy = Self::rotate_about_axis(s, axis_origin, &axis, angle_step * f64::from(i));
            result = result.union(&copy);
        }
        result
    }

    fn mesh(&self, s: &MeshSolid) -> TriangleMesh {
        s.to_mesh()
    }

    fn is_empty(&self, s: &MeshSolid) -> bool {
        s.is_empty()
    }

    fn can_export_step(&self, _s: &MeshSolid) -> bool {
        false
    }

    fn to_step_buffer(&self, _s: &MeshSolid) -> Result<Vec<u8>> {
        Err(KernelError::StepUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn k() -> MeshKernel {
        MeshKernel::new()
    }

    #[test]
    fn cube_mesh_counts() {
        let mesh = k().mesh(&k().cube(10.0, 20.0, 30.0));
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.num_vertices(), 24);
        assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(72));
    }

    #[test]
    fn difference_cube_cylinder_adds_faces() {
        let kernel = k();
        let cube = kernel.cube(20.0, 20.0, 20.0);
        let cyl = kernel.cylinder(3.0, 30.0, None);
        let d = kernel.difference(&cube, &cyl);
        assert!(kernel.mesh(&d).indices.len() > 36);
        assert!(d.volume() < 8000.0);
        assert!(d.volume() > 7800.0);
    }

    #[test]
    fn union_of_disjoint_keeps_both() {
        let kernel = k();
        let a = kernel.cube(1.0, 1.0, 1.0);
        let b = kernel.translate(&a, 5.0, 0.0, 0.0);
        let u = kernel.union(&a, &b);
        assert_relative_eq!(u.volume(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_union_and_intersection_volumes() {
        let kernel = k();
        let a = kernel.cube(10.0, 10.0, 10.0);
        let b = kernel.translate(&a, 5.0, 0.0, 0.0);
        assert_relative_eq!(kernel.union(&a, &b).volume(), 1500.0, epsilon = 1e-6);
        assert_relative_eq!(kernel.intersection(&a, &b).volume(), 500.0, epsilon = 1e-6);
        assert_relative_eq!(kernel.difference(&a, &b).volume(), 500.0, epsilon = 1e-6);
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let kernel = k();
        let a = kernel.cube(10.0, 10.0, 10.0);
        let b = kernel.translate(&a, 20.0, 0.0, 0.0);
        assert!(kernel.is_empty(&kernel.intersection(&a, &b)));
    }

    #[test]
    fn empty_is_identity_for_union() {
        let kernel = k();
        let a = kernel.cube(1.0, 2.0, 3.0);
        let u = kernel.union(&kernel.empty(), &a);
        assert_eq!(u, a);
        assert!(kernel.is_empty(&kernel.difference(&kernel.empty(), &a)));
    }

    #[test]
    fn translate_moves_vertices() {
        let kernel = k();
        let t = kernel.translate(&kernel.cube(1.0, 1.0, 1.0), 100.0, 0.0, 0.0);
        let mesh = kernel.mesh(&t);
        assert!(mesh.positions.chunks(3).all(|p| p[0] >= 99.9));
    }

    #[test]
    fn rotate_z_then_y_then_x() {
        let m = euler_xyz_matrix(90.0, 0.0, 90.0);
        // Z first maps +X to +Y, then X maps +Y to +Z.
        let v = m * Vec3::x();
        assert_relative_eq!(v, Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn mirror_scale_keeps_positive_volume() {
        let kernel = k();
        let s = kernel.scale(&kernel.cube(1.0, 2.0, 3.0), -1.0, 1.0, 1.0);
        assert_relative_eq!(s.volume(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_scale_collapses() {
        let kernel = k();
        let s = kernel.scale(&kernel.cube(1.0, 1.0, 1.0), 0.0, 1.0, 1.0);
        assert!(kernel.is_empty(&s));
    }

    #[test]
    fn shell_of_box() {
        let kernel = k();
        let s = kernel.shell(&kernel.cube(10.0, 10.0, 10.0), 1.0);
        assert_relative_eq!(s.volume(), 1000.0 - 512.0, epsilon = 1e-6);
    }

    #[test]
    fn patterns() {
        let kernel = k();
        let c = kernel.cube(1.0, 1.0, 1.0);
        let lin = kernel.linear_pattern(&c, Vec3::x(), 3, 2.0);
        assert_relative_eq!(lin.volume(), 3.0, epsilon = 1e-9);
        assert_eq!(kernel.linear_pattern(&c, Vec3::zeros(), 3, 2.0), c);

        let moved = kernel.translate(&c, 5.0, 0.0, 0.0);
        let circ = kernel.circular_pattern(&moved, Point3::origin(), Vec3::z(), 4, 360.0);
        assert_relative_eq!(circ.volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn fillet_and_chamfer_are_identity() {
        let kernel = k();
        let c = kernel.cube(1.0, 1.0, 1.0);
        assert_eq!(kernel.fillet(&c, 0.2), c);
        assert_eq!(kernel.chamfer(&c, 0.2), c);
    }

    #[test]
    fn step_export_unsupported() {
        let kernel = k();
        let c = kernel.cube(1.0, 1.0, 1.0);
        assert!(!kernel.can_export_step(&c));
        assert_eq!(kernel.to_step_buffer(&c), Err(KernelError::StepUnsupported));
    }
}
