//! Triangle mesh exchanged between the kernel and the engine.

use serde::{Deserialize, Serialize};

/// Indexed triangle mesh with flat `f32` buffers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Flat vertex positions `[x0, y0, z0, x1, ...]`.
    pub positions: Vec<f32>,
    /// Triangle indices, three per triangle.
    pub indices: Vec<u32>,
    /// Optional per-vertex normals, same layout as `positions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
}

impl TriangleMesh {
    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append another mesh, re-basing its indices.
    ///
    /// Normals survive only when both meshes carry them.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let base = self.num_vertices() as u32;
        let had_vertices = !self.positions.is_empty();
        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|i| i + base));
        self.normals = match (self.normals.take(), &other.normals) {
            (Some(mut a), Some(b)) => {
                a.extend_from_slice(b);
                Some(a)
            }
            (None, Some(b)) if !had_vertices => Some(b.clone()),
            _ => None,
        };
    }

    /// Drop triangles that reference vertices past the end of `positions`.
    ///
    /// A trailing partial triangle is dropped as well. A normal buffer whose
    /// length disagrees with `positions` is discarded. Returns the number of
    /// triangles removed.
    pub fn retain_valid_triangles(&mut self) -> usize {
        let n = self.num_vertices() as u32;
        let before = self.indices.len() / 3 + usize::from(self.indices.len() % 3 != 0);

        let mut kept = Vec::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            if tri.iter().all(|&i| i < n) {
                kept.extend_from_slice(tri);
            }
        }
        self.indices = kept;

        if self
            .normals
            .as_ref()
            .is_some_and(|normals| normals.len() != self.positions.len())
        {
            self.normals = None;
        }

        before - self.num_triangles()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut it = self.positions.chunks_exact(3);
        let first = it.next()?;
        let mut min = [first[0], first[1], first[2]];
        let mut max = min;
        for p in it {
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TriangleMesh {
        TriangleMesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            normals: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
        }
    }

    #[test]
    fn counts() {
        let m = triangle();
        assert_eq!(m.num_vertices(), 3);
        assert_eq!(m.num_triangles(), 1);
        assert!(!m.is_empty());
        assert!(TriangleMesh::default().is_empty());
    }

    #[test]
    fn merge_rebases_indices() {
        let mut a = triangle();
        a.merge(&triangle());
        assert_eq!(a.num_vertices(), 6);
        assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(a.normals.as_ref().map(Vec::len), Some(18));
    }

    #[test]
    fn merge_into_empty_keeps_normals() {
        let mut a = TriangleMesh::default();
        a.merge(&triangle());
        assert!(a.normals.is_some());
    }

    #[test]
    fn repair_drops_out_of_range_triangles() {
        let mut m = triangle();
        m.indices.extend_from_slice(&[0, 1, 7, 2, 1, 0]);
        let dropped = m.retain_valid_triangles();
        assert_eq!(dropped, 1);
        assert_eq!(m.indices, vec![0, 1, 2, 2, 1, 0]);
    }

    #[test]
    fn repair_drops_partial_triangle_and_bad_normals() {
        let mut m = triangle();
        m.indices.push(0);
        m.normals = Some(vec![0.0, 0.0, 1.0]);
        assert_eq!(m.retain_valid_triangles(), 1);
        assert_eq!(m.num_triangles(), 1);
        assert!(m.normals.is_none());
    }

    #[test]
    fn bounds_of_triangle() {
        let (min, max) = triangle().bounds().unwrap();
        assert_eq!(min, [0.0, 0.0, 0.0]);
        assert_eq!(max, [1.0, 1.0, 0.0]);
        assert!(TriangleMesh::default().bounds().is_none());
    }

    #[test]
    fn normals_omitted_from_json_when_absent() {
        let mut m = triangle();
        m.normals = None;
        let json = serde_json::to_string(&m).unwrap();
        assert!(!json.contains("normals"));
    }
}
