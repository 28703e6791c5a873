//! Node evaluator: resolves a node id to a kernel solid.
//!
//! One [`NodeEvaluator`] serves one evaluation pass. Its memo guarantees each
//! node reaches the kernel at most once per pass no matter how many parents
//! share it. An optional [`GeometryCache`] carries solids across passes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use vcad_ir::{CsgOp, Node, NodeId, SweepPath};
use vcad_kernel_api::{GeometryKernel, Helix, KernelError, SketchProfile, SweepOptions};

use crate::cache::{op_hash, GeometryCache};
use crate::error::{EvalError, Result};
use crate::profile::sketch_profile;
use crate::transform::{point3, vec3};

/// Counters collected during one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvalStats {
    /// Number of times each node was computed through the kernel.
    pub kernel_evaluations: BTreeMap<NodeId, usize>,
    /// Lookups answered by the per-pass memo.
    pub memo_hits: usize,
    /// Lookups answered by the cross-pass geometry cache.
    pub cache_hits: usize,
}

impl EvalStats {
    /// Kernel evaluations recorded for `id`.
    pub fn evaluations_of(&self, id: NodeId) -> usize {
        self.kernel_evaluations.get(&id).copied().unwrap_or(0)
    }

    /// Kernel evaluations over all nodes.
    pub fn total_kernel_evaluations(&self) -> usize {
        self.kernel_evaluations.values().sum()
    }
}

fn segments(n: u32) -> Option<u32> {
    (n > 0).then_some(n)
}

/// Evaluates nodes of one document against one kernel.
pub struct NodeEvaluator<'a, K: GeometryKernel> {
    kernel: &'a K,
    nodes: &'a HashMap<NodeId, Node>,
    cache: Option<&'a mut GeometryCache<K::Solid>>,
    memo: HashMap<NodeId, Arc<K::Solid>>,
    visiting: HashSet<NodeId>,
    stats: EvalStats,
}

impl<'a, K: GeometryKernel> NodeEvaluator<'a, K> {
    /// Evaluator with an empty memo and no cross-pass cache.
    pub fn new(kernel: &'a K, nodes: &'a HashMap<NodeId, Node>) -> Self {
        Self {
            kernel,
            nodes,
            cache: None,
            memo: HashMap::new(),
            visiting: HashSet::new(),
            stats: EvalStats::default(),
        }
    }

    /// Consult and fill `cache` on memo misses.
    pub fn with_cache(mut self, cache: &'a mut GeometryCache<K::Solid>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Counters so far.
    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    /// Consume the evaluator, returning its counters.
    pub fn into_stats(self) -> EvalStats {
        self.stats
    }

    /// Resolve `id` to a solid.
    ///
    /// # Errors
    ///
    /// - [`EvalError::MissingNode`] if `id` or anything it references is absent
    /// - [`EvalError::CycleDetected`] if `id` is reachable from itself
    /// - [`EvalError::InvalidSketchReference`] for a profile op pointing at a non-sketch
    /// - [`EvalError::Kernel`] if the kernel rejects a profile operation
    pub fn evaluate(&mut self, id: NodeId) -> Result<Arc<K::Solid>> {
        if let Some(solid) = self.memo.get(&id) {
            self.stats.memo_hits += 1;
            return Ok(Arc::clone(solid));
        }
        let nodes = self.nodes;
        let node = nodes.get(&id).ok_or(EvalError::MissingNode(id))?;
        if !self.visiting.insert(id) {
            return Err(EvalError::CycleDetected(id));
        }
        let result = self.evaluate_uncached(node);
        self.visiting.remove(&id);

        let solid = result?;
        self.memo.insert(id, Arc::clone(&solid));
        Ok(solid)
    }

    fn evaluate_uncached(&mut self, node: &Node) -> Result<Arc<K::Solid>> {
        let hash = self.cache.as_ref().map(|_| op_hash(&node.op));
        if let (Some(cache), Some(hash)) = (self.cache.as_deref_mut(), hash) {
            if let Some(solid) = cache.get(node.id, hash) {
                debug!(node = %node.id, "geometry cache hit");
                self.stats.cache_hits += 1;
                return Ok(solid);
            }
        }

        let solid = Arc::new(self.dispatch(node)?);
        *self.stats.kernel_evaluations.entry(node.id).or_default() += 1;

        if let (Some(cache), Some(hash)) = (self.cache.as_deref_mut(), hash) {
            cache.set(node.id, hash, Arc::clone(&solid));
        }
        Ok(solid)
    }

    /// Evaluate a child of a boolean or feature op.
    fn operand(&mut self, id: NodeId) -> Result<Arc<K::Solid>> {
        if let Some(Node {
            op: CsgOp::ImportedMesh { .. },
            ..
        }) = self.nodes.get(&id)
        {
            warn!(node = %id, "imported mesh used in a solid operation; treated as empty");
        }
        self.evaluate(id)
    }

    fn profile(&self, sketch: NodeId) -> Result<SketchProfile> {
        sketch_profile(self.nodes, sketch)
    }

    fn dispatch(&mut self, node: &Node) -> Result<K::Solid> {
        let k = self.kernel;
        let kernel_err = |source: KernelError| EvalError::Kernel {
            node: node.id,
            source,
        };
        debug!(node = %node.id, op = node.op.type_name(), "evaluating");

        let solid = match &node.op {
            CsgOp::Cube { size } => k.cube(size.x, size.y, size.z),
            CsgOp::Cylinder {
                radius,
                height,
                segments: n,
            } => k.cylinder(*radius, *height, segments(*n)),
            CsgOp::Sphere { radius, segments: n } => k.sphere(*radius, segments(*n)),
            CsgOp::Cone {
                radius_bottom,
                radius_top,
                height,
                segments: n,
            } => k.cone(*radius_bottom, *radius_top, *height, segments(*n)),
            CsgOp::Empty | CsgOp::Sketch2D { .. } | CsgOp::ImportedMesh { .. } => k.empty(),

            CsgOp::Union { left, right } => {
                let (a, b) = (self.operand(*left)?, self.operand(*right)?);
                k.union(&a, &b)
            }
            CsgOp::Difference { left, right } => {
                let (a, b) = (self.operand(*left)?, self.operand(*right)?);
                k.difference(&a, &b)
            }
            CsgOp::Intersection { left, right } => {
                let (a, b) = (self.operand(*left)?, self.operand(*right)?);
                k.intersection(&a, &b)
            }

            CsgOp::Translate { child, offset } => {
                k.translate(&*self.evaluate(*child)?, offset.x, offset.y, offset.z)
            }
            CsgOp::Rotate { child, angles } => {
                k.rotate(&*self.evaluate(*child)?, angles.x, angles.y, angles.z)
            }
            CsgOp::Scale { child, factor } => {
                k.scale(&*self.evaluate(*child)?, factor.x, factor.y, factor.z)
            }

            CsgOp::Extrude {
                sketch,
                direction,
                twist_angle,
                scale_end,
            } => {
                let options = SweepOptions {
                    twist_angle: twist_angle.unwrap_or(0.0).to_radians(),
                    scale_end: scale_end.unwrap_or(1.0),
                    ..SweepOptions::default()
                };
                k.extrude(&self.profile(*sketch)?, vec3(direction), &options)
                    .map_err(kernel_err)?
            }
            CsgOp::Revolve {
                sketch,
                axis_origin,
                axis_dir,
                angle_deg,
            } => k
                .revolve(
                    &self.profile(*sketch)?,
                    point3(axis_origin),
                    vec3(axis_dir),
                    *angle_deg,
                )
                .map_err(kernel_err)?,
            CsgOp::Sweep {
                sketch,
                path,
                twist_angle,
                scale_start,
                scale_end,
            } => {
                let profile = self.profile(*sketch)?;
                let options = SweepOptions {
                    twist_angle: twist_angle.to_radians(),
                    scale_start: *scale_start,
                    scale_end: *scale_end,
                    ..SweepOptions::default()
                };
                let swept = match path {
                    SweepPath::Line { start, end } => {
                        k.sweep_line(&profile, point3(start), point3(end), &options)
                    }
                    SweepPath::Helix {
                        radius,
                        pitch,
                        height,
                        turns,
                    } => k.sweep_helix(
                        &profile,
                        &Helix::new(*radius, *pitch, *height, *turns),
                        &options,
                    ),
                };
                swept.map_err(kernel_err)?
            }
            CsgOp::Loft { sketches, closed } => {
                let profiles = sketches
                    .iter()
                    .map(|id| self.profile(*id))
                    .collect::<Result<Vec<_>>>()?;
                k.loft(&profiles, *closed).map_err(kernel_err)?
            }

            CsgOp::Shell { child, thickness } => k.shell(&*self.operand(*child)?, *thickness),
            CsgOp::Fillet { child, radius } => k.fillet(&*self.operand(*child)?, *radius),
            CsgOp::Chamfer { child, distance } => k.chamfer(&*self.operand(*child)?, *distance),
            CsgOp::LinearPattern {
                child,
                direction,
                count,
                spacing,
            } => k.linear_pattern(&*self.operand(*child)?, vec3(direction), *count, *spacing),
            CsgOp::CircularPattern {
                child,
                axis_origin,
                axis_dir,
                count,
                angle_deg,
            } => k.circular_pattern(
                &*self.operand(*child)?,
                point3(axis_origin),
                vec3(axis_dir),
                *count,
                *angle_deg,
            ),
        };
        Ok(solid)
    }
}
