//! Single-qubit gate kinds.

use serde::{Deserialize, Serialize};

/// Single-qubit gates that pass through the packer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleQubitKind {
    // Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Rotations
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
}

impl SingleQubitKind {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            SingleQubitKind::I => "id",
            SingleQubitKind::X => "x",
            SingleQubitKind::Y => "y",
            SingleQubitKind::Z => "z",
            SingleQubitKind::H => "h",
            SingleQubitKind::S => "s",
            SingleQubitKind::Sdg => "sdg",
            SingleQubitKind::T => "t",
            SingleQubitKind::Tdg => "tdg",
            SingleQubitKind::SX => "sx",
            SingleQubitKind::SXdg => "sxdg",
            SingleQubitKind::Rx(_) => "rx",
            SingleQubitKind::Ry(_) => "ry",
            SingleQubitKind::Rz(_) => "rz",
            SingleQubitKind::P(_) => "p",
        }
    }

    /// Rotation angle, if this kind carries one.
    pub fn angle(&self) -> Option<f64> {
        match self {
            SingleQubitKind::Rx(a)
            | SingleQubitKind::Ry(a)
            | SingleQubitKind::Rz(a)
            | SingleQubitKind::P(a) => Some(*a),
            _ => None,
        }
    }

    /// Check if this gate is diagonal in the computational basis.
    pub fn is_z_diagonal(&self) -> bool {
        matches!(
            self,
            SingleQubitKind::I
                | SingleQubitKind::Z
                | SingleQubitKind::S
                | SingleQubitKind::Sdg
                | SingleQubitKind::T
                | SingleQubitKind::Tdg
                | SingleQubitKind::Rz(_)
                | SingleQubitKind::P(_)
        )
    }
}

/// Format an angle with three significant digits, trailing zeros trimmed.
pub fn format_angle(angle: f64) -> String {
    if angle == 0.0 || !angle.is_finite() {
        return format!("{angle}");
    }
    #[allow(clippy::cast_possible_truncation)]
    let magnitude = angle.abs().log10().floor() as i32;
    let decimals = usize::try_from(2 - magnitude).unwrap_or(0);
    let text = format!("{angle:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
