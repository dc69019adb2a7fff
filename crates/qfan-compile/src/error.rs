//! Error types for the compile crate.

use qfan_ir::{IrError, QubitId};
use thiserror::Error;

/// Errors that can occur during fan-out packing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// The same (control, target) pair was offered two different angles.
    #[error(
        "Angle conflict on control {control}, target {target}: existing {existing}, incoming {incoming}"
    )]
    AngleConflict {
        /// Shared control qubit.
        control: QubitId,
        /// Repeated target qubit.
        target: QubitId,
        /// Angle already recorded in the fan-out.
        existing: f64,
        /// Angle of the operation being merged.
        incoming: f64,
    },

    /// A merge slot was offered an operation of another family or control.
    #[error("Cannot merge '{incoming}' into '{slot}'")]
    IncompatibleMerge {
        /// The fan-out being extended.
        slot: String,
        /// The operation offered to it.
        incoming: String,
    },

    /// Invalid pipeline configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The packed output failed validity or conservation checks.
    #[error("Packing verification failed: {0}")]
    VerificationFailed(String),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
