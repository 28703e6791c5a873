//! Forward kinematics for assembly instances.
//!
//! Joints are directed edges from a parent instance (or the world frame when
//! the parent is null) to a child instance. Starting from the ground instance
//! and from every world-grounded joint, the solver walks the joint graph
//! breadth-first and places each child relative to its parent:
//!
//! ```text
//! child = parent * T(parent_anchor * parent_scale) * motion(kind, state) * T(-child_anchor * child_scale)
//! ```
//!
//! Instances that no path reaches keep their authored transform.

use std::collections::{BTreeMap, HashMap, VecDeque};

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion};
use tracing::{debug, warn};
use vcad_ir::{Instance, Joint, JointKind, Transform3D};
use vcad_kernel_api::Vec3;

use crate::transform::{vec3, Pose};

/// Motion contributed by a joint at its current state.
///
/// Revolute and cylindrical joints rotate by `state` degrees about their
/// axis; sliders translate by `state` along theirs. Fixed and ball joints
/// carry no state-driven motion. A zero axis contributes nothing.
pub fn joint_motion(kind: &JointKind, state: f64) -> Isometry3<f64> {
    match kind {
        JointKind::Revolute { axis, .. } | JointKind::Cylindrical { axis } => {
            match Unit::try_new(vec3(axis), 1e-12) {
                Some(axis) => Isometry3::from_parts(
                    Translation3::identity(),
                    UnitQuaternion::from_axis_angle(&axis, state.to_radians()),
                ),
                None => Isometry3::identity(),
            }
        }
        JointKind::Slider { axis, .. } => match Unit::try_new(vec3(axis), 1e-12) {
            Some(axis) => Isometry3::translation(
                axis.x * state,
                axis.y * state,
                axis.z * state,
            ),
            None => Isometry3::identity(),
        },
        JointKind::Fixed | JointKind::Ball => Isometry3::identity(),
    }
}

fn place_child(parent: &Pose, joint: &Joint, child_scale: Vec3) -> Pose {
    let pa = vec3(&joint.parent_anchor).component_mul(&parent.scale);
    let ca = vec3(&joint.child_anchor).component_mul(&child_scale);
    let isometry = parent.isometry
        * Translation3::from(pa)
        * joint_motion(&joint.kind, joint.state)
        * Translation3::from(-ca);
    Pose {
        isometry,
        scale: child_scale,
    }
}

struct Walk<'a> {
    authored: HashMap<&'a str, Transform3D>,
    resolved: HashMap<&'a str, Pose>,
    queue: VecDeque<&'a str>,
}

impl<'a> Walk<'a> {
    /// Place the child of `joint` unless some earlier path already did.
    fn follow(&mut self, joint: &Joint, parent: &Pose) {
        let child = joint.child_instance_id.as_str();
        let Some((&child_key, &authored)) = self.authored.get_key_value(child) else {
            warn!(joint = %joint.id, child, "joint references unknown instance");
            return;
        };
        if self.resolved.contains_key(child_key) {
            debug!(joint = %joint.id, "loop-closing joint ignored");
            return;
        }
        let pose = place_child(parent, joint, vec3(&authored.scale));
        self.resolved.insert(child_key, pose);
        self.queue.push_back(child_key);
    }
}

/// Resolve a world transform for every instance.
///
/// The result has one entry per instance id. The ground instance sits at
/// its authored transform (identity if none).
pub fn solve(
    instances: &[Instance],
    joints: &[Joint],
    ground_instance_id: Option<&str>,
) -> BTreeMap<String, Transform3D> {
    let mut children_of: HashMap<&str, Vec<&Joint>> = HashMap::new();
    let mut world_joints = Vec::new();
    for joint in joints {
        match joint.parent_instance_id.as_deref() {
            Some(parent) => children_of.entry(parent).or_default().push(joint),
            None => world_joints.push(joint),
        }
    }

    let mut walk = Walk {
        authored: instances
            .iter()
            .map(|i| (i.id.as_str(), i.transform.unwrap_or_default()))
            .collect(),
        resolved: HashMap::new(),
        queue: VecDeque::new(),
    };

    if let Some(ground) = ground_instance_id {
        match walk.authored.get_key_value(ground) {
            Some((&key, t)) => {
                let pose = Pose::from_transform(t);
                walk.resolved.insert(key, pose);
                walk.queue.push_back(key);
            }
            None => warn!(ground, "ground instance not found"),
        }
    }

    let world = Pose::identity();
    for joint in world_joints {
        walk.follow(joint, &world);
    }
    while let Some(id) = walk.queue.pop_front() {
        let Some(joints) = children_of.get(id) else {
            continue;
        };
        let parent = walk.resolved[id];
        for joint in joints {
            walk.follow(joint, &parent);
        }
    }

    instances
        .iter()
        .map(|inst| {
            let id = inst.id.as_str();
            let t = match walk.resolved.get(id) {
                Some(pose) => pose.to_transform(),
                None => inst.transform.unwrap_or_default(),
            };
            (inst.id.clone(), t)
        })
        .collect()
}
