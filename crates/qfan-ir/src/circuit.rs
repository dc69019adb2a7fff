//! High-level circuit builder API.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{IrError, IrResult};
use crate::gate::SingleQubitKind;
use crate::operation::{FanoutGate, Operation, PhaseFanoutGate};
use crate::qubit::QubitId;

/// An ordered sequence of operations.
///
/// Program order is authoritative: the packer only reorders operations that
/// commute. Every operation pushed through the builder is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits (one past the largest qubit index seen).
    #[serde(default)]
    num_qubits: u32,
    /// Operations in program order.
    operations: Vec<Operation>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: 0,
            operations: vec![],
        }
    }

    /// Create an empty circuit declaring `num_qubits` qubits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            num_qubits,
            ..Self::new(name)
        }
    }

    /// Build a circuit from raw operations, validating each one.
    pub fn from_operations(
        name: impl Into<String>,
        operations: impl IntoIterator<Item = Operation>,
    ) -> IrResult<Self> {
        let mut circuit = Self::new(name);
        for op in operations {
            circuit.push(op)?;
        }
        Ok(circuit)
    }

    /// Append an operation after validating it.
    pub fn push(&mut self, op: Operation) -> IrResult<&mut Self> {
        op.validate()?;
        let width = op
            .max_qubit()
            .0
            .checked_add(1)
            .ok_or_else(|| IrError::malformed(op.name(), "qubit index out of range"))?;
        self.num_qubits = self.num_qubits.max(width);
        self.operations.push(op);
        Ok(self)
    }

    /// Re-validate every operation, e.g. after deserialization.
    pub fn validate(&self) -> IrResult<()> {
        self.operations.iter().try_for_each(Operation::validate)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply a single-qubit gate.
    pub fn single(&mut self, kind: SingleQubitKind, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Operation::single(kind, qubit))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::X, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::S, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::T, qubit)
    }

    /// Apply RX gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::Rx(theta), qubit)
    }

    /// Apply RZ gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::Rz(theta), qubit)
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(SingleQubitKind::P(theta), qubit)
    }

    // =========================================================================
    // Controlled gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Operation::Controlled { control, target })
    }

    /// Apply controlled-phase gate.
    pub fn cp(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(Operation::ControlledPhase {
            control,
            target,
            angle: theta,
        })
    }

    /// Apply a CX fan-out.
    pub fn fanout(
        &mut self,
        control: QubitId,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(FanoutGate::new(control, targets)?.into())
    }

    /// Apply a controlled-phase fan-out.
    pub fn cp_fanout(
        &mut self,
        control: QubitId,
        targets: impl IntoIterator<Item = (QubitId, f64)>,
    ) -> IrResult<&mut Self> {
        self.push(PhaseFanoutGate::new(control, targets)?.into())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Operations in program order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Consume the circuit and return its operations.
    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a GHZ preparation in star form: H on qubit 0, then CX from 0 to every other qubit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        if n == 0 {
            return Ok(Self::new("ghz_0"));
        }

        let mut circuit = Self::with_size("ghz", n);
        circuit.h(QubitId(0))?;
        for i in 1..n {
            circuit.cx(QubitId(0), QubitId(i))?;
        }
        Ok(circuit)
    }

    /// Create a QFT circuit in controlled-phase form, without the final swaps.
    ///
    /// Qubit `i` controls a `CP(π/2^(j-i))` on every later qubit `j`.
    pub fn qft(n: u32) -> IrResult<Self> {
        if n == 0 {
            return Ok(Self::new("qft_0"));
        }

        let mut circuit = Self::with_size("qft", n);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(j - i).exp2();
                circuit.cp(angle, QubitId(i), QubitId(j))?;
            }
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_fluent_api_tracks_width() {
        let mut circuit = Circuit::new("test");
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(4))
            .unwrap()
            .rz(0.3, QubitId(2))
            .unwrap();

        assert_eq!(circuit.len(), 3);
        assert_eq!(circuit.num_qubits(), 5);
    }

    #[test]
    fn test_malformed_rejected_at_ingestion() {
        let mut circuit = Circuit::new("test");
        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::MalformedOperation { .. }));
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_largest_qubit_index_rejected() {
        let mut circuit = Circuit::new("test");
        let err = circuit.h(QubitId(u32::MAX)).unwrap_err();
        assert!(matches!(err, IrError::MalformedOperation { .. }));
        assert!(circuit.is_empty());
        assert_eq!(circuit.num_qubits(), 0);

        circuit.h(QubitId(u32::MAX - 1)).unwrap();
        assert_eq!(circuit.num_qubits(), u32::MAX);
    }

    #[test]
    fn test_declared_width_is_kept() {
        let mut circuit = Circuit::with_size("test", 8);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        assert_eq!(circuit.num_qubits(), 8);
    }

    #[test]
    fn test_qft4_shape() {
        let circuit = Circuit::qft(4).unwrap();
        assert_eq!(circuit.len(), 10);
        let rendered: Vec<String> = circuit.operations().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "H(0)",
                "CP(1.57)(0→1)",
                "CP(0.785)(0→2)",
                "CP(0.393)(0→3)",
                "H(1)",
                "CP(1.57)(1→2)",
                "CP(0.785)(1→3)",
                "H(2)",
                "CP(1.57)(2→3)",
                "H(3)",
            ]
        );
    }

    #[test]
    fn test_ghz_star() {
        let circuit = Circuit::ghz(4).unwrap();
        assert_eq!(circuit.len(), 4);
        assert!(Circuit::ghz(0).unwrap().is_empty());
    }

    #[test]
    fn test_json_roundtrip_keeps_validation_available() {
        let circuit = Circuit::qft(3).unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
        back.validate().unwrap();
    }
}
