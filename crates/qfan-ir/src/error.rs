//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building or validating operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operation does not reference the qubits its kind requires.
    #[error("Malformed operation '{gate}': {reason}")]
    MalformedOperation {
        /// Name of the offending gate.
        gate: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Target already present in a fan-out.
    #[error("Target {target} already present in {gate} on control {control}")]
    DuplicateTarget {
        /// Name of the fan-out gate.
        gate: String,
        /// Control qubit of the fan-out.
        control: QubitId,
        /// The repeated target.
        target: QubitId,
    },

    /// Target equals the control qubit of a fan-out.
    #[error("Target {qubit} of {gate} is its own control")]
    TargetIsControl {
        /// Name of the fan-out gate.
        gate: String,
        /// The qubit used as both control and target.
        qubit: QubitId,
    },
}

impl IrError {
    pub(crate) fn malformed(gate: impl Into<String>, reason: impl Into<String>) -> Self {
        IrError::MalformedOperation {
            gate: gate.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
