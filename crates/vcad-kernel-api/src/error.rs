//! Error types for kernel operations.

use thiserror::Error;

/// Errors reported by a geometry kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Profile has no segments.
    #[error("profile has no segments")]
    EmptyProfile,

    /// A segment is degenerate (zero length).
    #[error("degenerate segment at index {0}")]
    DegenerateSegment(usize),

    /// A profile loop is not closed.
    #[error("profile is not closed: gap of {0:.6} mm")]
    NotClosed(f64),

    /// The sketch plane basis is degenerate.
    #[error("sketch plane axes are parallel or zero")]
    DegeneratePlane,

    /// Extrusion direction has zero length.
    #[error("extrusion direction is zero")]
    ZeroExtrusion,

    /// Revolution axis has zero length.
    #[error("revolution axis is zero")]
    ZeroAxis,

    /// Revolution angle outside `(0, 360]` degrees.
    #[error("invalid revolution angle: {0} degrees")]
    InvalidAngle(f64),

    /// Sweep path has zero length.
    #[error("sweep path has zero length")]
    ZeroLengthPath,

    /// Loft was given fewer than two profiles.
    #[error("loft requires at least 2 profiles, got {0}")]
    TooFewProfiles(usize),

    /// Loft profiles do not have matching vertex counts.
    #[error("loft profile {index} has {found} vertices, expected {expected}")]
    ProfileMismatch {
        /// Index of the offending profile.
        index: usize,
        /// Vertex count of the first profile.
        expected: usize,
        /// Vertex count of the offending profile.
        found: usize,
    },

    /// The kernel cannot produce STEP output.
    #[error("STEP export is not supported by this kernel")]
    StepUnsupported,
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
