//! Scene assembly: the top-level evaluation entry point.
//!
//! A document is evaluated in up to two modes that share one evaluation pass:
//!
//! - **Flat**: every visible root entry becomes an [`EvaluatedPart`].
//! - **Assembly**: when the document has part definitions and instances, each
//!   part definition is evaluated once and every instance is placed by the
//!   kinematics solver.
//!
//! Clash detection runs last over both.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use vcad_ir::{Document, NodeId, Transform3D};
use vcad_kernel_api::{GeometryKernel, TriangleMesh};

use crate::cache::GeometryCache;
use crate::clash::{self, Clash, ClashBody};
use crate::config::EngineConfig;
use crate::error::{EvalError, Result};
use crate::evaluator::{EvalStats, NodeEvaluator};
use crate::imported::{describe, resolve_imported};
use crate::kinematics;

/// One flat-mode root.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct EvaluatedPart<S> {
    /// Root node this part came from.
    pub root: NodeId,
    /// Triangle mesh.
    pub mesh: TriangleMesh,
    /// Material key.
    pub material: String,
    /// Kernel solid; `None` for imported meshes.
    #[serde(skip)]
    pub solid: Option<Arc<S>>,
}

/// A part definition evaluated once for all its instances.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""), rename_all = "camelCase")]
pub struct EvaluatedPartDef<S> {
    /// Part definition id.
    pub id: String,
    /// Root node.
    pub root: NodeId,
    /// Mesh shared with every instance.
    pub mesh: Arc<TriangleMesh>,
    /// Default material, if the definition names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_material: Option<String>,
    /// Kernel solid; `None` for imported meshes.
    #[serde(skip)]
    pub solid: Option<Arc<S>>,
}

/// A placed instance of a part definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedInstance {
    /// Instance id.
    pub instance_id: String,
    /// Part definition id.
    pub part_def_id: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Local-space mesh of the part definition.
    pub mesh: Arc<TriangleMesh>,
    /// Resolved material.
    pub material: String,
    /// Resolved world transform.
    pub transform: Transform3D,
}

/// Result of evaluating a document.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""), rename_all = "camelCase")]
pub struct EvaluatedScene<S> {
    /// Flat-mode parts, in root order.
    pub parts: Vec<EvaluatedPart<S>>,
    /// Part definitions, in id order. `None` without an assembly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_defs: Option<Vec<EvaluatedPartDef<S>>>,
    /// Placed instances, in document order. `None` without an assembly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<Vec<EvaluatedInstance>>,
    /// Interference between bodies.
    pub clashes: Vec<Clash>,
    /// Counters from the evaluation pass.
    pub stats: EvalStats,
}

/// Per-call evaluation options.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateOptions {
    /// Skip the pairwise clash pass.
    pub skip_clash_detection: bool,
    /// Material for instances whose part definition has none.
    pub default_material: String,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EvaluateOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            skip_clash_detection: config.skip_clash_detection,
            default_material: config.default_material.clone(),
        }
    }
}

/// Evaluate a document without a cross-call cache.
///
/// # Errors
///
/// Any fatal [`EvalError`] aborts the whole evaluation. Instances that name
/// an unknown part definition are skipped with a warning instead.
pub fn evaluate<K: GeometryKernel>(
    doc: &Document,
    kernel: &K,
    options: &EvaluateOptions,
) -> Result<EvaluatedScene<K::Solid>> {
    assemble(doc, kernel, options, None)
}

fn repair(mesh: &mut TriangleMesh, root: NodeId) {
    let dropped = mesh.retain_valid_triangles();
    if dropped > 0 {
        warn!(root = %root, dropped, "dropped triangles with out-of-range indices");
    }
}

/// Mesh for a root: imported chains bypass the kernel.
fn evaluate_root<K: GeometryKernel>(
    evaluator: &mut NodeEvaluator<'_, K>,
    kernel: &K,
    doc: &Document,
    root: NodeId,
) -> Result<(TriangleMesh, Option<Arc<K::Solid>>)> {
    if let Some(mut mesh) = resolve_imported(&doc.nodes, root)? {
        debug!(root = %root, mesh = %describe(&mesh), "imported mesh root");
        repair(&mut mesh, root);
        return Ok((mesh, None));
    }
    let solid = evaluator.evaluate(root)?;
    let mut mesh = kernel.mesh(&solid);
    repair(&mut mesh, root);
    Ok((mesh, Some(solid)))
}

fn assemble<K: GeometryKernel>(
    doc: &Document,
    kernel: &K,
    options: &EvaluateOptions,
    cache: Option<&mut GeometryCache<K::Solid>>,
) -> Result<EvaluatedScene<K::Solid>> {
    let mut evaluator = NodeEvaluator::new(kernel, &doc.nodes);
    if let Some(cache) = cache {
        evaluator = evaluator.with_cache(cache);
    }

    let mut parts = Vec::new();
    for entry in doc.roots.iter().filter(|e| e.visible) {
        let (mesh, solid) = evaluate_root(&mut evaluator, kernel, doc, entry.root)?;
        parts.push(EvaluatedPart {
            root: entry.root,
            mesh,
            material: entry.material.clone(),
            solid,
        });
    }

    let (part_defs, instances) = match (&doc.part_defs, &doc.instances) {
        (Some(defs), Some(instances)) if doc.has_assembly() => {
            let mut evaluated = Vec::with_capacity(defs.len());
            for (id, def) in defs {
                let (mesh, solid) = evaluate_root(&mut evaluator, kernel, doc, def.root)?;
                evaluated.push(EvaluatedPartDef {
                    id: id.clone(),
                    root: def.root,
                    mesh: Arc::new(mesh),
                    default_material: def.default_material.clone(),
                    solid,
                });
            }

            let joints = doc.joints.as_deref().unwrap_or_default();
            let world = kinematics::solve(instances, joints, doc.ground_instance_id.as_deref());

            let mut placed = Vec::with_capacity(instances.len());
            for inst in instances {
                let Some(def) = evaluated.iter().find(|d| d.id == inst.part_def_id) else {
                    let err = EvalError::UnknownPartDef {
                        instance_id: inst.id.clone(),
                        part_def_id: inst.part_def_id.clone(),
                    };
                    warn!("{err}; instance skipped");
                    continue;
                };
                let material = inst
                    .material
                    .clone()
                    .or_else(|| def.default_material.clone())
                    .unwrap_or_else(|| options.default_material.clone());
                placed.push(EvaluatedInstance {
                    instance_id: inst.id.clone(),
                    part_def_id: def.id.clone(),
                    name: inst.name.clone(),
                    mesh: Arc::clone(&def.mesh),
                    material,
                    transform: world.get(&inst.id).copied().unwrap_or_default(),
                });
            }
            (Some(evaluated), Some(placed))
        }
        _ => (None, None),
    };

    let clashes = if options.skip_clash_detection {
        Vec::new()
    } else {
        let bodies = clash_bodies(kernel, &parts, part_defs.as_deref(), instances.as_deref());
        clash::detect(kernel, &bodies)
    };

    let stats = evaluator.into_stats();
    debug!(
        parts = parts.len(),
        kernel_evaluations = stats.total_kernel_evaluations(),
        memo_hits = stats.memo_hits,
        cache_hits = stats.cache_hits,
        clashes = clashes.len(),
        "document evaluated"
    );

    Ok(EvaluatedScene {
        parts,
        part_defs,
        instances,
        clashes,
        stats,
    })
}

/// Flat parts with a kernel solid, then instances placed in world space.
fn clash_bodies<K: GeometryKernel>(
    kernel: &K,
    parts: &[EvaluatedPart<K::Solid>],
    part_defs: Option<&[EvaluatedPartDef<K::Solid>]>,
    instances: Option<&[EvaluatedInstance]>,
) -> Vec<(ClashBody, Arc<K::Solid>)> {
    let mut bodies: Vec<(ClashBody, Arc<K::Solid>)> = parts
        .iter()
        .enumerate()
        .filter_map(|(i, p)| Some((ClashBody::Part(i), Arc::clone(p.solid.as_ref()?))))
        .collect();

    if let (Some(defs), Some(instances)) = (part_defs, instances) {
        for inst in instances {
            let solid = defs
                .iter()
                .find(|d| d.id == inst.part_def_id)
                .and_then(|d| d.solid.as_ref());
            if let Some(solid) = solid {
                let placed = clash::place(kernel, solid, &inst.transform);
                bodies.push((ClashBody::Instance(inst.instance_id.clone()), Arc::new(placed)));
            }
        }
    }
    bodies
}

/// Evaluation engine that keeps a geometry cache between calls.
///
/// Use one engine per editing session: after editing nodes, call
/// [`Engine::invalidate`] with their ids and evaluate again. Only the edited
/// nodes and their dependents reach the kernel.
pub struct Engine<K: GeometryKernel> {
    kernel: K,
    config: EngineConfig,
    cache: GeometryCache<K::Solid>,
}

impl<K: GeometryKernel> Engine<K> {
    /// Engine with the default configuration.
    pub fn new(kernel: K) -> Self {
        Self::with_config(kernel, EngineConfig::default())
    }

    /// Engine with an explicit configuration.
    pub fn with_config(kernel: K, config: EngineConfig) -> Self {
        let cache = GeometryCache::new(config.cache_capacity);
        Self {
            kernel,
            config,
            cache,
        }
    }

    /// The kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The cross-call cache.
    pub fn cache(&self) -> &GeometryCache<K::Solid> {
        &self.cache
    }

    /// Evaluate with options derived from the configuration.
    pub fn evaluate(&mut self, doc: &Document) -> Result<EvaluatedScene<K::Solid>> {
        let options = EvaluateOptions::from(&self.config);
        self.evaluate_with(doc, &options)
    }

    /// Evaluate with explicit options.
    pub fn evaluate_with(
        &mut self,
        doc: &Document,
        options: &EvaluateOptions,
    ) -> Result<EvaluatedScene<K::Solid>> {
        assemble(doc, &self.kernel, options, Some(&mut self.cache))
    }

    /// Drop cached solids for `ids` and everything in `doc` built on them.
    pub fn invalidate(&mut self, doc: &Document, ids: &[NodeId]) {
        let dependents = doc.dependents_of(ids);
        debug!(edited = ids.len(), dependents = dependents.len(), "invalidating");
        self.cache
            .invalidate(ids.iter().copied().chain(dependents));
    }

    /// Drop every cached solid.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
