//! Imported meshes bypass the kernel.
//!
//! A root whose node chain is a (possibly empty) run of Translate / Rotate /
//! Scale ops ending at an ImportedMesh is resolved here: the raw mesh is
//! copied and the chain applied directly to its vertices, innermost op first,
//! so the result matches what the kernel would produce for the same chain.
//!
//! The usual `Translate(Rotate(Scale(mesh)))` chain thus applies scale,
//! then rotate, then translate. Other nestings are not reordered into that
//! sequence: `Scale(Translate(mesh))` scales the offset too, as the kernel
//! would.

use std::collections::{HashMap, HashSet};

use vcad_ir::{CsgOp, Node, NodeId};
use vcad_kernel_api::{Point3, TriangleMesh, Vec3};

use crate::error::{EvalError, Result};
use crate::transform::{euler_xyz_rotation, vec3};

/// Resolve `root` to a transformed imported mesh, or `None` if the chain
/// ends at anything else.
pub fn resolve_imported(nodes: &HashMap<NodeId, Node>, root: NodeId) -> Result<Option<TriangleMesh>> {
    let mut chain: Vec<&CsgOp> = Vec::new();
    let mut seen = HashSet::new();
    let mut id = root;

    let mut mesh = loop {
        if !seen.insert(id) {
            return Err(EvalError::CycleDetected(id));
        }
        let node = nodes.get(&id).ok_or(EvalError::MissingNode(id))?;
        match &node.op {
            CsgOp::Translate { child, .. }
            | CsgOp::Rotate { child, .. }
            | CsgOp::Scale { child, .. } => {
                chain.push(&node.op);
                id = *child;
            }
            CsgOp::ImportedMesh {
                positions,
                indices,
                normals,
                ..
            } => {
                break TriangleMesh {
                    positions: positions.clone(),
                    indices: indices.clone(),
                    normals: normals.clone(),
                };
            }
            _ => return Ok(None),
        }
    };

    for op in chain.iter().rev() {
        apply_op(&mut mesh, op);
    }
    Ok(Some(mesh))
}

fn map_vec3(buf: &mut [f32], f: impl Fn(Vec3) -> Vec3) {
    for p in buf.chunks_exact_mut(3) {
        let v = f(Vec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])));
        p[0] = v.x as f32;
        p[1] = v.y as f32;
        p[2] = v.z as f32;
    }
}

fn apply_op(mesh: &mut TriangleMesh, op: &CsgOp) {
    match op {
        CsgOp::Translate { offset, .. } => {
            let t = vec3(offset);
            map_vec3(&mut mesh.positions, |p| p + t);
        }
        CsgOp::Rotate { angles, .. } => {
            let r = euler_xyz_rotation(angles);
            map_vec3(&mut mesh.positions, |p| r * p);
            if let Some(normals) = &mut mesh.normals {
                map_vec3(normals, |n| r * n);
            }
        }
        CsgOp::Scale { factor, .. } => {
            let s = vec3(factor);
            map_vec3(&mut mesh.positions, |p| p.component_mul(&s));
            if let Some(normals) = &mut mesh.normals {
                // Inverse transpose of a diagonal matrix.
                let inv = s.map(|k| if k.abs() > 1e-12 { 1.0 / k } else { 0.0 });
                map_vec3(normals, |n| {
                    let m = n.component_mul(&inv);
                    let len = m.norm();
                    if len > 1e-12 {
                        m / len
                    } else {
                        m
                    }
                });
            }
            if s.x * s.y * s.z < 0.0 {
                for tri in mesh.indices.chunks_exact_mut(3) {
                    tri.swap(1, 2);
                }
            }
        }
        _ => {}
    }
}

/// Axis-aligned bounds of an imported mesh's positions, for logging.
pub fn describe(mesh: &TriangleMesh) -> String {
    match mesh.bounds() {
        Some((lo, hi)) => format!(
            "{} tris, bounds {:?}..{:?}",
            mesh.num_triangles(),
            Point3::new(f64::from(lo[0]), f64::from(lo[1]), f64::from(lo[2])),
            Point3::new(f64::from(hi[0]), f64::from(hi[1]), f64::from(hi[2]))
        ),
        None => "empty".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_ir::{Document, Vec3 as IrVec3};

    fn triangle() -> CsgOp {
        CsgOp::ImportedMesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            normals: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            source: Some("tri.stl".to_string()),
        }
    }

    #[test]
    fn bare_import_is_verbatim() {
        let mut doc = Document::new();
        let id = doc.add_node(1, None, triangle());
        let mesh = resolve_imported(&doc.nodes, id).unwrap().unwrap();
        assert_eq!(mesh.positions, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn chain_applies_innermost_first() {
        let mut doc = Document::new();
        let m = doc.add_node(1, None, triangle());
        let s = doc.add_node(
            2,
            None,
            CsgOp::Scale {
                child: m,
                factor: IrVec3::new(2.0, 2.0, 2.0),
            },
        );
        let r = doc.add_node(
            3,
            None,
            CsgOp::Rotate {
                child: s,
                angles: IrVec3::new(0.0, 0.0, 90.0),
            },
        );
        let t = doc.add_node(
            4,
            None,
            CsgOp::Translate {
                child: r,
                offset: IrVec3::new(10.0, 0.0, 0.0),
            },
        );
        let mesh = resolve_imported(&doc.nodes, t).unwrap().unwrap();
        // Vertex (1,0,0): scale -> (2,0,0), rotate -> (0,2,0), translate -> (10,2,0).
        assert!((mesh.positions[3] - 10.0).abs() < 1e-5);
        assert!((mesh.positions[4] - 2.0).abs() < 1e-5);
        // Normals stay unit and unrotated about Z.
        let n = mesh.normals.unwrap();
        assert!((n[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scale_over_translate_scales_the_offset() {
        let mut doc = Document::new();
        let m = doc.add_node(1, None, triangle());
        let t = doc.add_node(
            2,
            None,
            CsgOp::Translate {
                child: m,
                offset: IrVec3::new(1.0, 0.0, 0.0),
            },
        );
        let s = doc.add_node(
            3,
            None,
            CsgOp::Scale {
                child: t,
                factor: IrVec3::new(2.0, 2.0, 2.0),
            },
        );
        let mesh = resolve_imported(&doc.nodes, s).unwrap().unwrap();
        // Origin vertex: translate -> (1,0,0), scale -> (2,0,0).
        assert_eq!(&mesh.positions[0..3], &[2.0, 0.0, 0.0]);
        // Vertex (1,0,0): translate -> (2,0,0), scale -> (4,0,0).
        assert_eq!(&mesh.positions[3..6], &[4.0, 0.0, 0.0]);
    }

    #[test]
    fn mirror_flips_winding() {
        let mut doc = Document::new();
        let m = doc.add_node(1, None, triangle());
        let s = doc.add_node(
            2,
            None,
            CsgOp::Scale {
                child: m,
                factor: IrVec3::new(-1.0, 1.0, 1.0),
            },
        );
        let mesh = resolve_imported(&doc.nodes, s).unwrap().unwrap();
        assert_eq!(mesh.indices, vec![0, 2, 1]);
    }

    #[test]
    fn non_imported_chain_is_none() {
        let mut doc = Document::new();
        let c = doc.add_node(
            1,
            None,
            CsgOp::Cube {
                size: IrVec3::one(),
            },
        );
        let t = doc.add_node(
            2,
            None,
            CsgOp::Translate {
                child: c,
                offset: IrVec3::zero(),
            },
        );
        assert!(resolve_imported(&doc.nodes, t).unwrap().is_none());
    }

    #[test]
    fn missing_link_and_cycle() {
        let mut doc = Document::new();
        doc.add_node(
            1,
            None,
            CsgOp::Translate {
                child: NodeId(9),
                offset: IrVec3::zero(),
            },
        );
        assert!(matches!(
            resolve_imported(&doc.nodes, NodeId(1)),
            Err(EvalError::MissingNode(NodeId(9)))
        ));

        doc.add_node(
            9,
            None,
            CsgOp::Translate {
                child: NodeId(1),
                offset: IrVec3::zero(),
            },
        );
        assert!(matches!(
            resolve_imported(&doc.nodes, NodeId(1)),
            Err(EvalError::CycleDetected(NodeId(1)))
        ));
    }
}
