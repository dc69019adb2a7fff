//! qfan operation model
//!
//! This crate provides the value types the fan-out packer works on: qubit
//! identifiers, single-qubit gate kinds, the [`Operation`] variant with its
//! qubit footprint, and a small [`Circuit`] builder that validates every
//! operation at ingestion.
//!
//! # Example
//!
//! ```rust
//! use qfan_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new("star");
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.cx(QubitId(0), QubitId(2)).unwrap();
//!
//! assert_eq!(circuit.len(), 3);
//! assert_eq!(circuit.operations()[1].to_string(), "CX(0→1)");
//!
//! // A CX whose control equals its target is malformed.
//! assert!(circuit.cx(QubitId(3), QubitId(3)).is_err());
//! ```
//!
//! # Operations
//!
//! | Variant | Footprint | Display |
//! |---------|-----------|---------|
//! | `Single` | `{qubit}` | `H(0)`, `RZ(2; 0.3)` |
//! | `Controlled` | `{control, target}` | `CX(0→1)` |
//! | `ControlledPhase` | `{control, target}` | `CP(1.57)(1→0)` |
//! | `Fanout` | `{control} ∪ targets` | `FANOUT(0→{1,2})` |
//! | `PhaseFanout` | `{control} ∪ keys` | `CP_FANOUT(0→{1:1.57})` |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod operation;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{SingleQubitKind, format_angle};
pub use operation::{FanoutGate, GateFamily, Operation, PhaseFanoutGate};
pub use qubit::QubitId;
