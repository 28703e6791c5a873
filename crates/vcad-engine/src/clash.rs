//! Pairwise interference detection.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use vcad_ir::Transform3D;
use vcad_kernel_api::{GeometryKernel, TriangleMesh};

/// Identifies one side of a clash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClashBody {
    /// Index into the scene's flat `parts`.
    Part(usize),
    /// Assembly instance id.
    Instance(String),
}

/// Non-empty intersection between two bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clash {
    /// First body.
    pub a: ClashBody,
    /// Second body.
    pub b: ClashBody,
    /// Mesh of the overlapping volume.
    pub mesh: TriangleMesh,
}

/// Place a part-definition solid in world space: scale, then rotate, then translate.
pub fn place<K: GeometryKernel>(kernel: &K, solid: &K::Solid, t: &Transform3D) -> K::Solid {
    let scaled = kernel.scale(solid, t.scale.x, t.scale.y, t.scale.z);
    let rotated = kernel.rotate(&scaled, t.rotation.x, t.rotation.y, t.rotation.z);
    kernel.translate(&rotated, t.translation.x, t.translation.y, t.translation.z)
}

/// Intersect every unordered pair of `bodies`, in order.
pub fn detect<K: GeometryKernel>(kernel: &K, bodies: &[(ClashBody, Arc<K::Solid>)]) -> Vec<Clash> {
    let mut clashes = Vec::new();
    for (i, (a, sa)) in bodies.iter().enumerate() {
        for (b, sb) in &bodies[i + 1..] {
            let overlap = kernel.intersection(sa, sb);
            if kernel.is_empty(&overlap) {
                continue;
            }
            let mesh = kernel.mesh(&overlap);
            if mesh.is_empty() {
                continue;
            }
            debug!(?a, ?b, triangles = mesh.num_triangles(), "clash");
            clashes.push(Clash {
                a: a.clone(),
                b: b.clone(),
                mesh,
            });
        }
    }
    clashes
}
