//! Error types for document evaluation.

use thiserror::Error;
use vcad_ir::NodeId;
use vcad_kernel_api::KernelError;

/// Errors that can occur while evaluating a document.
#[derive(Error, Debug)]
pub enum EvalError {
    /// A referenced node is absent from the document.
    #[error("missing node: {0}")]
    MissingNode(NodeId),

    /// An Extrude/Revolve/Sweep/Loft references a node that is not a Sketch2D.
    #[error("node {0} is not a Sketch2D")]
    InvalidSketchReference(NodeId),

    /// The node graph contains a cycle through this node.
    #[error("cycle detected at node {0}")]
    CycleDetected(NodeId),

    /// An instance references a part definition that does not exist.
    ///
    /// Recovered during evaluation: the instance is skipped.
    #[error("instance {instance_id} references unknown part definition {part_def_id}")]
    UnknownPartDef {
        /// The offending instance.
        instance_id: String,
        /// The missing part definition.
        part_def_id: String,
    },

    /// The kernel rejected an operation.
    #[error("kernel error at node {node}: {source}")]
    Kernel {
        /// Node whose evaluation failed.
        node: NodeId,
        /// Underlying kernel error.
        #[source]
        source: KernelError,
    },

    /// The kernel cannot export this solid as STEP.
    #[error("STEP export is not supported for this solid")]
    StepExportUnsupported,

    /// STEP serialization failed inside the kernel.
    #[error("STEP export failed: {0}")]
    StepExport(#[source] KernelError),
}

/// Result type for evaluation.
pub type Result<T> = std::result::Result<T, EvalError>;
