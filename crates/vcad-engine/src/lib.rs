#![warn(missing_docs)]

//! Document evaluation engine for vcad.
//!
//! Turns a [`vcad_ir::Document`] into meshes and world placements using any
//! [`vcad_kernel_api::GeometryKernel`]:
//!
//! - [`NodeEvaluator`] resolves node ids to solids with a per-pass memo
//! - [`GeometryCache`] keeps solids between passes for incremental editing
//! - [`kinematics::solve`] places assembly instances through their joints
//! - [`evaluate`] / [`Engine`] assemble the scene and run clash detection
//!
//! ```ignore
//! use vcad_engine::{evaluate, EvaluateOptions};
//!
//! let scene = evaluate(&doc, &kernel, &EvaluateOptions::default())?;
//! for part in &scene.parts {
//!     println!("{} triangles", part.mesh.num_triangles());
//! }
//! ```

pub mod cache;
pub mod clash;
pub mod config;
mod error;
pub mod evaluator;
mod export;
mod imported;
pub mod kinematics;
mod profile;
pub mod scene;
pub mod transform;

#[cfg(test)]
mod test_kernel;

pub use cache::{op_hash, GeometryCache};
pub use clash::{Clash, ClashBody};
pub use config::{ConfigError, EngineConfig};
pub use error::{EvalError, Result};
pub use evaluator::{EvalStats, NodeEvaluator};
pub use export::export_step;
pub use imported::resolve_imported;
pub use scene::{
    evaluate, Engine, EvaluateOptions, EvaluatedInstance, EvaluatedPart, EvaluatedPartDef,
    EvaluatedScene,
};
