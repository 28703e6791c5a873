//! Conversions between IR transforms and nalgebra types.
//!
//! Euler angles follow the kernel's rotate convention: `R = Rx * Ry * Rz`,
//! so applied to a point Z acts first, then Y, then X.

use nalgebra::{Isometry3, Rotation3, Translation3, UnitQuaternion};
use vcad_ir::{Transform3D, Vec2, Vec3 as IrVec3};
use vcad_kernel_api::{Point2, Point3, Vec3};

pub(crate) fn point2(v: &Vec2) -> Point2 {
    Point2::new(v.x, v.y)
}

pub(crate) fn point3(v: &IrVec3) -> Point3 {
    Point3::new(v.x, v.y, v.z)
}

pub(crate) fn vec3(v: &IrVec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn ir_vec3(v: &Vec3) -> IrVec3 {
    IrVec3::new(v.x, v.y, v.z)
}

/// Rotation for Euler angles in degrees.
pub fn euler_xyz_rotation(deg: &IrVec3) -> Rotation3<f64> {
    let rx = Rotation3::from_axis_angle(&Vec3::x_axis(), deg.x.to_radians());
    let ry = Rotation3::from_axis_angle(&Vec3::y_axis(), deg.y.to_radians());
    let rz = Rotation3::from_axis_angle(&Vec3::z_axis(), deg.z.to_radians());
    rx * ry * rz
}

/// Euler angles in degrees such that `euler_xyz_rotation(angles) == r`.
pub fn euler_xyz_degrees(r: &Rotation3<f64>) -> IrVec3 {
    let m = r.matrix();
    let sb = m[(0, 2)].clamp(-1.0, 1.0);
    let b = sb.asin();
    let (a, c) = if sb.abs() < 1.0 - 1e-9 {
        (
            (-m[(1, 2)]).atan2(m[(2, 2)]),
            (-m[(0, 1)]).atan2(m[(0, 0)]),
        )
    } else {
        // Gimbal lock: only a + c (or a - c) is determined.
        (m[(2, 1)].atan2(m[(1, 1)]), 0.0)
    };
    IrVec3::new(a.to_degrees(), b.to_degrees(), c.to_degrees())
}

/// Rigid placement plus per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Rotation and translation.
    pub isometry: Isometry3<f64>,
    /// Scale, applied before the isometry.
    pub scale: Vec3,
}

impl Pose {
    /// The world frame.
    pub fn identity() -> Self {
        Self {
            isometry: Isometry3::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Pose of an authored transform.
    pub fn from_transform(t: &Transform3D) -> Self {
        let rotation = UnitQuaternion::from_rotation_matrix(&euler_xyz_rotation(&t.rotation));
        Self {
            isometry: Isometry3::from_parts(Translation3::from(vec3(&t.translation)), rotation),
            scale: vec3(&t.scale),
        }
    }

    /// Back to translation, Euler degrees and scale.
    pub fn to_transform(&self) -> Transform3D {
        Transform3D {
            translation: ir_vec3(&self.isometry.translation.vector),
            rotation: euler_xyz_degrees(&self.isometry.rotation.to_rotation_matrix()),
            scale: ir_vec3(&self.scale),
        }
    }

    /// Map a local point to world space.
    pub fn apply(&self, p: &Point3) -> Point3 {
        self.isometry * Point3::from(p.coords.component_mul(&self.scale))
    }
}
