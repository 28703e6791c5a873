//! CountingKernel: test double that records kernel calls.
//!
//! Delegates geometry to [`MeshKernel`] so results are real, and counts every
//! call by method name so tests can assert how often the engine reached the
//! kernel. STEP support is switchable.

use std::cell::RefCell;
use std::collections::BTreeMap;

use vcad_kernel_api::{
    GeometryKernel, Helix, KernelError, Point3, Result, SketchProfile, SweepOptions, TriangleMesh,
    Vec3,
};
use vcad_kernel_mesh::{MeshKernel, MeshSolid};

pub struct CountingKernel {
    inner: MeshKernel,
    calls: RefCell<BTreeMap<&'static str, usize>>,
    step: bool,
}

impl CountingKernel {
    pub fn new() -> Self {
        Self {
            inner: MeshKernel::new(),
            calls: RefCell::new(BTreeMap::new()),
            step: false,
        }
    }

    /// A kernel that claims STEP support and writes a stub header.
    pub fn with_step() -> Self {
        Self {
            step: true,
            ..Self::new()
        }
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.borrow().get(method).copied().unwrap_or(0)
    }

    /// Calls that produce geometry, excluding mesh/is_empty queries.
    pub fn geometry_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, _)| !matches!(**m, "mesh" | "is_empty" | "can_export_step"))
            .map(|(_, n)| n)
            .sum()
    }

    fn hit(&self, method: &'static str) {
        *self.calls.borrow_mut().entry(method).or_default() += 1;
    }
}

impl GeometryKernel for CountingKernel {
    type Solid = MeshSolid;

    fn empty(&self) -> MeshSolid {
        self.hit("empty");
        self.inner.empty()
    }

    fn cube(&self, sx: f64, sy: f64, sz: f64) -> MeshSolid {
        self.hit("cube");
        self.inner.cube(sx, sy, sz)
    }

    fn cylinder(&self, radius: f64, height: f64, segments: Option<u32>) -> MeshSolid {
        self.hit("cylinder");
        self.inner.cylinder(radius, height, segments)
    }

    fn sphere(&self, radius: f64, segments: Option<u32>) -> MeshSolid {
        self.hit("sphere");
        self.inner.sphere(radius, segments)
    }

    fn cone(
        &self,
        radius_bottom: f64,
        radius_top: f64,
        height: f64,
        segments: Option<u32>,
    ) -> MeshSolid {
        self.hit("cone");
        self.inner.cone(radius_bottom, radius_top, height, segments)
    }

    fn union(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        self.hit("union");
        self.inner.union(a, b)
    }

    fn difference(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        self.hit("difference");
        self.inner.difference(a, b)
    }

    fn intersection(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        self.hit("intersection");
        self.inner.intersection(a, b)
    }

    fn translate(&self, s: &MeshSolid, x: f64, y: f64, z: f64) -> MeshSolid {
        self.hit("translate");
        self.inner.translate(s, x, y, z)
    }

    fn rotate(&self, s: &MeshSolid, x_deg: f64, y_deg: f64, z_deg: f64) -> MeshSolid {
        self.hit("rotate");
        self.inner.rotate(s, x_deg, y_deg, z_deg)
    }

    fn scale(&self, s: &MeshSolid, x: f64, y: f64, z: f64) -> MeshSolid {
        self.hit("scale");
        self.inner.scale(s, x, y, z)
    }

    fn extrude(
        &self,
        profile: &SketchProfile,
        direction: Vec3,
        options: &SweepOptions,
    ) -> Result<MeshSolid> {
        self.hit("extrude");
        self.inner.extrude(profile, direction, options)
    }

    fn revolve(
        &self,
        profile: &SketchProfile,
        axis_origin: Point3,
        axis_dir: Vec3,
        angle_deg: f64,
    ) -> Result<MeshSolid> {
        self.hit("revolve");
        self.inner.revolve(profile, axis_origin, axis_dir, angle_deg)
    }

    fn sweep_line(
        &self,
        profile: &SketchProfile,
        start: Point3,
        end: Point3,
        options: &SweepOptions,
    ) -> Result<MeshSolid> {
        self.hit("sweep_line");
        self.inner.sweep_line(profile, start, end, options)
    }

    fn sweep_helix(
        &self,
        profile: &SketchProfile,
        helix: &Helix,
        options: &SweepOptions,
    ) -> Result<MeshSolid> {
        self.hit("sweep_helix");
        self.inner.sweep_helix(profile, helix, options)
    }

    fn loft(&self, profiles: &[SketchProfile], closed: bool) -> Result<MeshSolid> {
        self.hit("loft");
        self.inner.loft(profiles, closed)
    }

    fn shell(&self, s: &MeshSolid, thickness: f64) -> MeshSolid {
        self.hit("shell");
        self.inner.shell(s, thickness)
    }

    fn fillet(&self, s: &MeshSolid, radius: f64) -> MeshSolid {
        self.hit("fillet");
        self.inner.fillet(s, radius)
    }

    fn chamfer(&self, s: &MeshSolid, distance: f64) -> MeshSolid {
        self.hit("chamfer");
        self.inner.chamfer(s, distance)
    }

    fn linear_pattern(&self, s: &MeshSolid, direction: Vec3, count: u32, spacing: f64) -> MeshSolid {
        self.hit("linear_pattern");
        self.inner.linear_pattern(s, direction, count, spacing)
    }

    fn circular_pattern(
        &self,
        s: &MeshSolid,
        axis_origin: Point3,
        axis_dir: Vec3,
        count: u32,
        angle_deg: f64,
    ) -> MeshSolid {
        self.hit("circular_pattern");
        self.inner
            .circular_pattern(s, axis_origin, axis_dir, count, angle_deg)
    }

    fn mesh(&self, s: &MeshSolid) -> TriangleMesh {
        self.hit("mesh");
        self.inner.mesh(s)
    }

    fn is_empty(&self, s: &MeshSolid) -> bool {
        self.hit("is_empty");
        self.inner.is_empty(s)
    }

    fn can_export_step(&self, _s: &MeshSolid) -> bool {
        self.hit("can_export_step");
        self.step
    }

    fn to_step_buffer(&self, s: &MeshSolid) -> Result<Vec<u8>> {
        self.hit("to_step_buffer");
        if !self.step {
            return Err(KernelError::StepUnsupported);
        }
        Ok(format!("ISO-10303-21;\n/* {} faces */\n", s.polygons().len()).into_bytes())
    }
}
