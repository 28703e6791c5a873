//! Intermediate representation for the vcad CAD ecosystem.
//!
//! This crate defines the DAG-based IR that represents parametric CAD models
//! and assemblies, together with its JSON document format.
//!
//! The IR is purely declarative: no kernel state, just a graph of operations
//! plus the assembly data (part definitions, instances, joints) that places
//! evaluated parts in the world. Evaluation is handled by `vcad-engine`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

// ============================================================================
// Core IR types
// ============================================================================

/// Unique identifier for a node in the IR graph.
///
/// Ids are small integers, unique within a [`Document`] and never reused.
/// Serialized as a bare integer (and as a decimal string when used as a map
/// key).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D vector with f64 components (for sketch coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// Create a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 3D vector with f64 components (conventionally millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Component-wise `(1, 1, 1)`.
    pub fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// A segment of a 2D sketch profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SketchSegment2D {
    /// A line segment from start to end.
    Line {
        /// Start point in 2D sketch coordinates.
        start: Vec2,
        /// End point in 2D sketch coordinates.
        end: Vec2,
    },
    /// A circular arc from start to end around a center.
    Arc {
        /// Start point in 2D sketch coordinates.
        start: Vec2,
        /// End point in 2D sketch coordinates.
        end: Vec2,
        /// Center of the arc in 2D sketch coordinates.
        center: Vec2,
        /// If true, arc goes counter-clockwise from start to end.
        ccw: bool,
    },
}

/// Path followed by a [`CsgOp::Sweep`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SweepPath {
    /// Straight line from `start` to `end`.
    Line {
        /// Path start point.
        start: Vec3,
        /// Path end point.
        end: Vec3,
    },
    /// Helix around the Z axis, starting on the +X axis.
    Helix {
        /// Helix radius.
        radius: f64,
        /// Rise per full turn.
        pitch: f64,
        /// Total height.
        height: f64,
        /// Number of turns.
        turns: f64,
    },
}

fn default_scale_factor() -> f64 {
    1.0
}

/// CSG operation: the core building block of the IR DAG.
///
/// Each variant is either a leaf primitive or a combining/transform operation
/// that references child nodes by [`NodeId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CsgOp {
    /// Axis-aligned box with one corner at the origin.
    Cube {
        /// Size along each axis.
        size: Vec3,
    },
    /// Cylinder along the Z axis, standing on the XY plane.
    Cylinder {
        /// Radius of the cylinder.
        radius: f64,
        /// Height of the cylinder.
        height: f64,
        /// Number of circular segments (0 = auto).
        #[serde(default)]
        segments: u32,
    },
    /// Sphere centered at origin.
    Sphere {
        /// Radius of the sphere.
        radius: f64,
        /// Number of circular segments (0 = auto).
        #[serde(default)]
        segments: u32,
    },
    /// Cone along the Z axis, standing on the XY plane.
    Cone {
        /// Bottom radius.
        radius_bottom: f64,
        /// Top radius (0 for a point).
        radius_top: f64,
        /// Height of the cone.
        height: f64,
        /// Number of circular segments (0 = auto).
        #[serde(default)]
        segments: u32,
    },
    /// Empty geometry (identity for union).
    Empty,
    /// Boolean union of two geometries.
    Union {
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// Boolean difference (left minus right).
    Difference {
        /// Left operand (base).
        left: NodeId,
        /// Right operand (subtracted).
        right: NodeId,
    },
    /// Boolean intersection of two geometries.
    Intersection {
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// Translation by an offset vector.
    Translate {
        /// Child node to translate.
        child: NodeId,
        /// Translation offset.
        offset: Vec3,
    },
    /// Rotation by Euler angles in degrees (applied as X, then Y, then Z).
    Rotate {
        /// Child node to rotate.
        child: NodeId,
        /// Rotation angles in degrees.
        angles: Vec3,
    },
    /// Non-uniform scale.
    Scale {
        /// Child node to scale.
        child: NodeId,
        /// Scale factors per axis.
        factor: Vec3,
    },
    /// A 2D sketch profile on a plane.
    ///
    /// The sketch defines one or more closed profiles in a local 2D coordinate
    /// system. It is not renderable on its own; use it with
    /// [`CsgOp::Extrude`], [`CsgOp::Revolve`], [`CsgOp::Sweep`] or
    /// [`CsgOp::Loft`].
    Sketch2D {
        /// Origin point of the sketch plane in 3D.
        origin: Vec3,
        /// Unit vector along the local X axis.
        x_dir: Vec3,
        /// Unit vector along the local Y axis.
        y_dir: Vec3,
        /// The segments forming the closed profile(s).
        segments: Vec<SketchSegment2D>,
    },
    /// Extrude a sketch profile along a direction vector.
    Extrude {
        /// The sketch node to extrude.
        sketch: NodeId,
        /// Extrusion direction and distance (length of vector = extrusion depth).
        direction: Vec3,
        /// Twist of the far end relative to the sketch, in degrees.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        twist_angle: Option<f64>,
        /// Profile scale at the far end; the sketch end stays at 1.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale_end: Option<f64>,
    },
    /// Revolve a sketch profile around an axis.
    Revolve {
        /// The sketch node to revolve.
        sketch: NodeId,
        /// A point on the revolution axis.
        axis_origin: Vec3,
        /// Direction of the revolution axis.
        axis_dir: Vec3,
        /// Revolution angle in degrees (360 for full revolution).
        angle_deg: f64,
    },
    /// Sweep a sketch profile along a path.
    Sweep {
        /// The sketch node to sweep.
        sketch: NodeId,
        /// The path to follow.
        path: SweepPath,
        /// Total twist along the path, in degrees.
        #[serde(default)]
        twist_angle: f64,
        /// Profile scale at the start of the path.
        #[serde(default = "default_scale_factor")]
        scale_start: f64,
        /// Profile scale at the end of the path.
        #[serde(default = "default_scale_factor")]
        scale_end: f64,
    },
    /// Loft through an ordered list of sketch profiles.
    Loft {
        /// The sketch nodes to loft through (at least two).
        sketches: Vec<NodeId>,
        /// Connect the last profile back to the first.
        #[serde(default)]
        closed: bool,
    },
    /// Linear pattern: repeat geometry along a direction.
    LinearPattern {
        /// Child node to pattern.
        child: NodeId,
        /// Direction vector (will be normalized).
        direction: Vec3,
        /// Number of copies (including original).
        count: u32,
        /// Spacing between copies along direction.
        spacing: f64,
    },
    /// Circular pattern: repeat geometry around an axis.
    CircularPattern {
        /// Child node to pattern.
        child: NodeId,
        /// A point on the rotation axis.
        axis_origin: Vec3,
        /// Direction of the rotation axis.
        axis_dir: Vec3,
        /// Number of copies (including original).
        count: u32,
        /// Total angle span in degrees.
        angle_deg: f64,
    },
    /// Shell: hollow out a solid by offsetting faces.
    Shell {
        /// Child node to shell.
        child: NodeId,
        /// Wall thickness (inward offset).
        thickness: f64,
    },
    /// Round all edges of a solid.
    Fillet {
        /// Child node to fillet.
        child: NodeId,
        /// Fillet radius.
        radius: f64,
    },
    /// Bevel all edges of a solid.
    Chamfer {
        /// Child node to chamfer.
        child: NodeId,
        /// Chamfer distance.
        distance: f64,
    },
    /// A triangle mesh brought in from outside the kernel.
    ///
    /// Imported meshes never take part in CSG. They may only sit below a
    /// chain of [`CsgOp::Translate`] / [`CsgOp::Rotate`] / [`CsgOp::Scale`].
    ImportedMesh {
        /// Flat vertex positions `[x0, y0, z0, x1, ...]`.
        positions: Vec<f32>,
        /// Flat triangle indices.
        indices: Vec<u32>,
        /// Optional per-vertex normals, same layout as `positions`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        normals: Option<Vec<f32>>,
        /// Where the mesh came from (file name), informational only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
}

impl CsgOp {
    /// Every node referenced by this op, in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            CsgOp::Cube { .. }
            | CsgOp::Cylinder { .. }
            | CsgOp::Sphere { .. }
            | CsgOp::Cone { .. }
            | CsgOp::Empty
            | CsgOp::Sketch2D { .. }
            | CsgOp::ImportedMesh { .. } => Vec::new(),
            CsgOp::Union { left, right }
            | CsgOp::Difference { left, right }
            | CsgOp::Intersection { left, right } => vec![*left, *right],
            CsgOp::Translate { child, .. }
            | CsgOp::Rotate { child, .. }
            | CsgOp::Scale { child, .. }
            | CsgOp::LinearPattern { child, .. }
            | CsgOp::CircularPattern { child, .. }
            | CsgOp::Shell { child, .. }
            | CsgOp::Fillet { child, .. }
            | CsgOp::Chamfer { child, .. } => vec![*child],
            CsgOp::Extrude { sketch, .. }
            | CsgOp::Revolve { sketch, .. }
            | CsgOp::Sweep { sketch, .. } => vec![*sketch],
            CsgOp::Loft { sketches, .. } => sketches.clone(),
        }
    }

    /// True for Translate, Rotate and Scale.
    pub fn is_pure_transform(&self) -> bool {
        matches!(
            self,
            CsgOp::Translate { .. } | CsgOp::Rotate { .. } | CsgOp::Scale { .. }
        )
    }

    /// The `type` tag used in the JSON encoding.
    pub fn type_name(&self) -> &'static str {
        match self {
            CsgOp::Cube { .. } => "Cube",
            CsgOp::Cylinder { .. } => "Cylinder",
            CsgOp::Sphere { .. } => "Sphere",
            CsgOp::Cone { .. } => "Cone",
            CsgOp::Empty => "Empty",
            CsgOp::Union { .. } => "Union",
            CsgOp::Difference { .. } => "Difference",
            CsgOp::Intersection { .. } => "Intersection",
            CsgOp::Translate { .. } => "Translate",
            CsgOp::Rotate { .. } => "Rotate",
            CsgOp::Scale { .. } => "Scale",
            CsgOp::Sketch2D { .. } => "Sketch2D",
            CsgOp::Extrude { .. } => "Extrude",
            CsgOp::Revolve { .. } => "Revolve",
            CsgOp::Sweep { .. } => "Sweep",
            CsgOp::Loft { .. } => "Loft",
            CsgOp::LinearPattern { .. } => "LinearPattern",
            CsgOp::CircularPattern { .. } => "CircularPattern",
            CsgOp::Shell { .. } => "Shell",
            CsgOp::Fillet { .. } => "Fillet",
            CsgOp::Chamfer { .. } => "Chamfer",
            CsgOp::ImportedMesh { .. } => "ImportedMesh",
        }
    }
}

/// A node in the IR graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// The operation this node represents.
    pub op: CsgOp,
}

/// PBR material definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Material name (e.g. "aluminum", "abs_white").
    pub name: String,
    /// Base color as `[r, g, b]` in 0.0..1.0.
    pub color: [f64; 3],
    /// Metallic factor (0.0 = dielectric, 1.0 = metal).
    pub metallic: f64,
    /// Roughness factor (0.0 = mirror, 1.0 = diffuse).
    pub roughness: f64,
    /// Density in kg/m^3 (for physics simulation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    /// Static friction coefficient (for physics simulation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction: Option<f64>,
}

fn default_visible() -> bool {
    true
}

/// An entry in the scene: a root node with an assigned material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    /// Root node of this scene part.
    pub root: NodeId,
    /// Material key referencing a [`MaterialDef::name`].
    pub material: String,
    /// Hidden entries are skipped by evaluation.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl SceneEntry {
    /// A visible entry.
    pub fn new(root: NodeId, material: impl Into<String>) -> Self {
        Self {
            root,
            material: material.into(),
            visible: true,
        }
    }
}

// ============================================================================
// Assembly types (for kinematics)
// ============================================================================

/// 3D transform (translation, rotation in degrees, scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    /// Translation offset.
    pub translation: Vec3,
    /// Rotation angles in degrees (Euler XYZ).
    pub rotation: Vec3,
    /// Scale factors per axis.
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self {
            translation: Vec3::zero(),
            rotation: Vec3::zero(),
            scale: Vec3::one(),
        }
    }
}

impl Transform3D {
    /// Create an identity transform (no translation, rotation, or scaling).
    pub fn identity() -> Self {
        Self::default()
    }

    /// Pure translation.
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::default()
        }
    }
}

/// Joint limits as `[min, max]` tuple for constrained joints.
pub type JointLimits = (f64, f64);

/// Joint kind variants for assembly joints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JointKind {
    /// Fixed joint: no degrees of freedom.
    Fixed,
    /// Revolute joint: rotation around an axis.
    Revolute {
        /// Rotation axis.
        axis: Vec3,
        /// Optional angle limits in degrees.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limits: Option<JointLimits>,
    },
    /// Slider joint: translation along an axis.
    Slider {
        /// Translation axis.
        axis: Vec3,
        /// Optional position limits in mm.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limits: Option<JointLimits>,
    },
    /// Cylindrical joint: rotation and translation along an axis.
    Cylindrical {
        /// Axis of rotation/translation.
        axis: Vec3,
    },
    /// Ball joint: rotation around all axes.
    Ball,
}

/// A joint connecting two instances in an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Unique identifier.
    pub id: String,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parent instance ID (null for world-grounded joints).
    #[serde(rename = "parentInstanceId")]
    pub parent_instance_id: Option<String>,
    /// Child instance ID.
    #[serde(rename = "childInstanceId")]
    pub child_instance_id: String,
    /// Anchor point on parent (or world origin if parent is null).
    #[serde(rename = "parentAnchor")]
    pub parent_anchor: Vec3,
    /// Anchor point on child.
    #[serde(rename = "childAnchor")]
    pub child_anchor: Vec3,
    /// Joint type and parameters.
    pub kind: JointKind,
    /// Current joint state (angle in degrees or position in mm).
    pub state: f64,
}

/// An instance of a part definition in an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique identifier.
    pub id: String,
    /// Reference to the part definition.
    #[serde(rename = "partDefId")]
    pub part_def_id: String,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Authored placement; used as-is unless a joint chain reaches the ground.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform3D>,
    /// Optional material override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

/// A reusable part definition in an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDef {
    /// Unique identifier.
    pub id: String,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root node of the geometry DAG.
    pub root: NodeId,
    /// Default material key.
    #[serde(rename = "defaultMaterial", default, skip_serializing_if = "Option::is_none")]
    pub default_material: Option<String>,
}

// ============================================================================
// Document
// ============================================================================

/// A vcad document: the `.vcad` file format.
///
/// Contains the full IR DAG, material definitions, flat scene roots and the
/// optional assembly (part definitions, instances, joints).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version string (e.g. "0.1").
    pub version: String,
    /// All nodes in the graph, keyed by [`NodeId`].
    pub nodes: HashMap<NodeId, Node>,
    /// Material definitions, keyed by name.
    #[serde(default)]
    pub materials: HashMap<String, MaterialDef>,
    /// Scene entries (independent parts with materials).
    #[serde(default)]
    pub roots: Vec<SceneEntry>,

    /// Part definitions for assembly mode.
    #[serde(rename = "partDefs", default, skip_serializing_if = "Option::is_none")]
    pub part_defs: Option<BTreeMap<String, PartDef>>,
    /// Instances of part definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<Vec<Instance>>,
    /// Joints connecting instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joints: Option<Vec<Joint>>,
    /// The instance that is fixed in world space (ground).
    #[serde(rename = "groundInstanceId", default, skip_serializing_if = "Option::is_none")]
    pub ground_instance_id: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            nodes: HashMap::new(),
            materials: HashMap::new(),
            roots: Vec::new(),
            part_defs: None,
            instances: None,
            joints: None,
            ground_instance_id: None,
        }
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Insert a node, returning its id.
    pub fn add_node(&mut self, id: impl Into<NodeId>, name: Option<&str>, op: CsgOp) -> NodeId {
        let id = id.into();
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.map(str::to_string),
                op,
            },
        );
        id
    }

    /// True when the document has both part definitions and instances.
    pub fn has_assembly(&self) -> bool {
        let has_defs = self.part_defs.as_ref().is_some_and(|d| !d.is_empty());
        let has_instances = self.instances.as_ref().is_some_and(|i| !i.is_empty());
        has_defs && has_instances
    }

    /// All nodes whose subtree contains any of `ids`, excluding `ids` themselves.
    ///
    /// Used to widen a cache invalidation from edited nodes to everything
    /// built on top of them.
    pub fn dependents_of(&self, ids: &[NodeId]) -> BTreeSet<NodeId> {
        let mut parents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in self.nodes.values() {
            for child in node.op.children() {
                parents.entry(child).or_default().push(node.id);
            }
        }

        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut stack: Vec<NodeId> = ids.to_vec();
        while let Some(id) = stack.pop() {
            if let Some(ps) = parents.get(&id) {
                for &p in ps {
                    if seen.insert(p) {
                        stack.push(p);
                    }
                }
            }
        }
        for id in ids {
            seen.remove(id);
        }
        seen
    }
}
