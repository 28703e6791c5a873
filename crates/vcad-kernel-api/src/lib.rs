#![warn(missing_docs)]

//! Geometry kernel capability interface.
//!
//! The vcad engine never builds solids itself. It drives an implementation of
//! [`GeometryKernel`], which owns primitive construction, booleans, sketch
//! based constructors, features and meshing. Solids are opaque to the engine:
//! it only holds them, hands them back to the kernel, and asks for meshes.
//!
//! # Example
//!
//! ```ignore
//! use vcad_kernel_api::GeometryKernel;
//!
//! fn plate_with_hole<K: GeometryKernel>(k: &K) -> K::Solid {
//!     let plate = k.cube(20.0, 20.0, 5.0);
//!     let hole = k.translate(&k.cylinder(3.0, 10.0, None), 10.0, 10.0, -1.0);
//!     k.difference(&plate, &hole)
//! }
//! ```

mod error;
mod mesh;
mod profile;

pub use error::{KernelError, Result};
pub use mesh::TriangleMesh;
pub use profile::{Helix, SketchProfile, SketchSegment, SweepOptions, LINEAR_TOLERANCE};

/// 2D point type (sketch coordinates).
pub type Point2 = nalgebra::Point2<f64>;
/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;
/// 3D vector type.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Number of circular segments used when a caller passes `None` or `0`.
pub const DEFAULT_SEGMENTS: u32 = 32;

/// Resolve an optional segment count to a concrete one.
pub fn resolve_segments(segments: Option<u32>) -> u32 {
    match segments {
        Some(0) | None => DEFAULT_SEGMENTS,
        Some(n) => n,
    }
}

/// A solid modeling backend.
///
/// All operations are pure: they take solids by reference and return new
/// solids. Operations that can reject their input (sketch based
/// constructors and STEP export) return [`Result`]; everything else always
/// produces a solid, possibly an empty one.
pub trait GeometryKernel {
    /// Opaque solid handle.
    type Solid: Clone;

    // --- factories ---

    /// The canonical empty solid.
    fn empty(&self) -> Self::Solid;

    /// Axis-aligned box from the origin to `(sx, sy, sz)`.
    fn cube(&self, sx: f64, sy: f64, sz: f64) -> Self::Solid;

    /// Cylinder along +Z from `z = 0` to `z = height`.
    fn cylinder(&self, radius: f64, height: f64, segments: Option<u32>) -> Self::Solid;

    /// Sphere centered at the origin.
    fn sphere(&self, radius: f64, segments: Option<u32>) -> Self::Solid;

    /// Cone (or frustum) along +Z from `z = 0` to `z = height`.
    fn cone(
        &self,
        radius_bottom: f64,
        radius_top: f64,
        height: f64,
        segments: Option<u32>,
    ) -> Self::Solid;

    // --- combinators ---

    /// Boolean union.
    fn union(&self, a: &Self::Solid, b: &Self::Solid) -> Self::Solid;

    /// Boolean difference `a - b`.
    fn difference(&self, a: &Self::Solid, b: &Self::Solid) -> Self::Solid;

    /// Boolean intersection.
    fn intersection(&self, a: &Self::Solid, b: &Self::Solid) -> Self::Solid;

    // --- transforms ---

    /// Translate by `(x, y, z)`.
    fn translate(&self, s: &Self::Solid, x: f64, y: f64, z: f64) -> Self::Solid;

    /// Rotate by Euler angles in degrees, about X, then Y, then Z.
    fn rotate(&self, s: &Self::Solid, x_deg: f64, y_deg: f64, z_deg: f64) -> Self::Solid;

    /// Non-uniform scale about the origin.
    fn scale(&self, s: &Self::Solid, x: f64, y: f64, z: f64) -> Self::Solid;

    // --- profile based constructors ---

    /// Extrude a closed profile along `direction`.
    ///
    /// Only `twist_angle`, `scale_end` and `path_segments` of `options`
    /// apply; the profile turns and scales about its local origin.
    fn extrude(
        &self,
        profile: &SketchProfile,
        direction: Vec3,
        options: &SweepOptions,
    ) -> Result<Self::Solid>;

    /// Revolve a closed profile around an axis by `angle_deg`.
    fn revolve(
        &self,
        profile: &SketchProfile,
        axis_origin: Point3,
        axis_dir: Vec3,
        angle_deg: f64,
    ) -> Result<Self::Solid>;

    /// Sweep a closed profile along a straight line.
    fn sweep_line(
        &self,
        profile: &SketchProfile,
        start: Point3,
        end: Point3,
        options: &SweepOptions,
    ) -> Result<Self::Solid>;

    /// Sweep a closed profile along a helix.
    fn sweep_helix(
        &self,
        profile: &SketchProfile,
        helix: &Helix,
        options: &SweepOptions,
    ) -> Result<Self::Solid>;

    /// Loft through two or more profiles.
    fn loft(&self, profiles: &[SketchProfile], closed: bool) -> Result<Self::Solid>;

    // --- features ---

    /// Hollow out a solid, leaving walls of `thickness`.
    fn shell(&self, s: &Self::Solid, thickness: f64) -> Self::Solid;

    /// Round all edges.
    fn fillet(&self, s: &Self::Solid, radius: f64) -> Self::Solid;

    /// Bevel all edges.
    fn chamfer(&self, s: &Self::Solid, distance: f64) -> Self::Solid;

    /// Union of `count` copies spaced along `direction`.
    fn linear_pattern(
        &self,
        s: &Self::Solid,
        direction: Vec3,
        count: u32,
        spacing: f64,
    ) -> Self::Solid;

    /// Union of `count` copies rotated around an axis, spanning `angle_deg`.
    fn circular_pattern(
        &self,
        s: &Self::Solid,
        axis_origin: Point3,
        axis_dir: Vec3,
        count: u32,
        angle_deg: f64,
    ) -> Self::Solid;

    // --- introspection ---

    /// Triangulate the solid.
    fn mesh(&self, s: &Self::Solid) -> TriangleMesh;

    /// True if the solid encloses no volume.
    fn is_empty(&self, s: &Self::Solid) -> bool;

    /// Whether [`GeometryKernel::to_step_buffer`] can succeed for this solid.
    fn can_export_step(&self, s: &Self::Solid) -> bool;

    /// Serialize the solid as a STEP file.
    fn to_step_buffer(&self, s: &Self::Solid) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_resolution() {
        assert_eq!(resolve_segments(None), DEFAULT_SEGMENTS);
        assert_eq!(resolve_segments(Some(0)), DEFAULT_SEGMENTS);
        assert_eq!(resolve_segments(Some(6)), 6);
    }
}
