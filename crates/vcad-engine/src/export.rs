//! STEP export call site.

use vcad_kernel_api::{GeometryKernel, KernelError};

use crate::error::{EvalError, Result};

/// Serialize `solid` as STEP through the kernel.
///
/// Fails with [`EvalError::StepExportUnsupported`] when the kernel reports it
/// cannot export this solid, and with [`EvalError::StepExport`] when
/// serialization itself fails.
pub fn export_step<K: GeometryKernel>(kernel: &K, solid: &K::Solid) -> Result<Vec<u8>> {
    if !kernel.can_export_step(solid) {
        return Err(EvalError::StepExportUnsupported);
    }
    kernel.to_step_buffer(solid).map_err(|e| match e {
        KernelError::StepUnsupported => EvalError::StepExportUnsupported,
        other => EvalError::StepExport(other),
    })
}
