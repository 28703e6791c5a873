//! Sketch2D node → kernel profile conversion.

use std::collections::HashMap;

use vcad_ir::{CsgOp, Node, NodeId, SketchSegment2D};
use vcad_kernel_api::{SketchProfile, SketchSegment};

use crate::error::{EvalError, Result};
use crate::transform::{point2, point3, vec3};

fn to_kernel_segment(seg: &SketchSegment2D) -> SketchSegment {
    match seg {
        SketchSegment2D::Line { start, end } => SketchSegment::Line {
            start: point2(start),
            end: point2(end),
        },
        SketchSegment2D::Arc {
            start,
            end,
            center,
            ccw,
        } => SketchSegment::Arc {
            start: point2(start),
            end: point2(end),
            center: point2(center),
            ccw: *ccw,
        },
    }
}

/// Resolve `sketch` to a kernel profile.
///
/// Fails with [`EvalError::MissingNode`] if the node is absent,
/// [`EvalError::InvalidSketchReference`] if it is not a Sketch2D, and
/// [`EvalError::Kernel`] if its segments do not form closed loops.
pub fn sketch_profile(nodes: &HashMap<NodeId, Node>, sketch: NodeId) -> Result<SketchProfile> {
    let node = nodes.get(&sketch).ok_or(EvalError::MissingNode(sketch))?;
    let CsgOp::Sketch2D {
        origin,
        x_dir,
        y_dir,
        segments,
    } = &node.op
    else {
        return Err(EvalError::InvalidSketchReference(sketch));
    };

    SketchProfile::new(
        point3(origin),
        vec3(x_dir),
        vec3(y_dir),
        segments.iter().map(to_kernel_segment).collect(),
    )
    .map_err(|source| EvalError::Kernel {
        node: sketch,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_ir::{Document, Vec2, Vec3};
    use vcad_kernel_api::KernelError;

    fn square_sketch(doc: &mut Document, id: u64) -> NodeId {
        let p = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        let segments = (0..4)
            .map(|i| SketchSegment2D::Line {
                start: p[i],
                end: p[(i + 1) % 4],
            })
            .collect();
        doc.add_node(
            id,
            None,
            CsgOp::Sketch2D {
                origin: Vec3::new(0.0, 0.0, 2.0),
                x_dir: Vec3::new(1.0, 0.0, 0.0),
                y_dir: Vec3::new(0.0, 1.0, 0.0),
                segments,
            },
        )
    }

    #[test]
    fn converts_sketch() {
        let mut doc = Document::new();
        let id = square_sketch(&mut doc, 1);
        let profile = sketch_profile(&doc.nodes, id).unwrap();
        assert_eq!(profile.segments.len(), 4);
        assert_eq!(profile.origin.z, 2.0);
    }

    #[test]
    fn non_sketch_is_rejected() {
        let mut doc = Document::new();
        doc.add_node(1, None, CsgOp::Empty);
        assert!(matches!(
            sketch_profile(&doc.nodes, NodeId(1)),
            Err(EvalError::InvalidSketchReference(NodeId(1)))
        ));
        assert!(matches!(
            sketch_profile(&doc.nodes, NodeId(2)),
            Err(EvalError::MissingNode(NodeId(2)))
        ));
    }

    #[test]
    fn open_sketch_is_kernel_error() {
        let mut doc = Document::new();
        doc.add_node(
            3,
            None,
            CsgOp::Sketch2D {
                origin: Vec3::zero(),
                x_dir: Vec3::new(1.0, 0.0, 0.0),
                y_dir: Vec3::new(0.0, 1.0, 0.0),
                segments: vec![SketchSegment2D::Line {
                    start: Vec2::new(0.0, 0.0),
                    end: Vec2::new(1.0, 0.0),
                }],
            },
        );
        assert!(matches!(
            sketch_profile(&doc.nodes, NodeId(3)),
            Err(EvalError::Kernel {
                node: NodeId(3),
                source: KernelError::NotClosed(_)
            })
        ));
    }
}
