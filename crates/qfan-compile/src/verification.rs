//! Checks that a packing is valid and loses nothing.
//!
//! These checks back the pipeline's `verify` option and the property tests.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use qfan_ir::{Operation, QubitId};

use crate::layer::Layer;

/// Tolerance for summed phase angles.
pub const ANGLE_TOLERANCE: f64 = 1e-10;

/// Result of packing verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationResult {
    /// Whether every check passed.
    pub passed: bool,
    /// Number of layers checked for footprint disjointness.
    pub layers_checked: usize,
    /// Number of distinct logical effects compared.
    pub effects_checked: usize,
    /// Human-readable description of every violation found.
    pub violations: Vec<String>,
}

/// Logical content of a sequence: what each gate does, ignoring grouping.
#[derive(Debug, Default)]
struct Effects {
    singles: FxHashMap<(&'static str, QubitId, Option<u64>), usize>,
    cx: FxHashMap<(QubitId, QubitId), usize>,
    cp: FxHashMap<(QubitId, QubitId), f64>,
}

impl Effects {
    fn record(&mut self, op: &Operation) {
        match op {
            Operation::Single { kind, qubit } => {
                *self
                    .singles
                    .entry((kind.name(), *qubit, kind.angle().map(f64::to_bits)))
                    .or_default() += 1;
            }
            Operation::Controlled { control, target } => {
                *self.cx.entry((*control, *target)).or_default() += 1;
            }
            Operation::Fanout(g) => {
                for &t in g.targets() {
                    *self.cx.entry((g.control(), t)).or_default() += 1;
                }
            }
            Operation::ControlledPhase {
                control,
                target,
                angle,
            } => {
                *self.cp.entry((*control, *target)).or_default() += angle;
            }
            Operation::PhaseFanout(g) => {
                for &(t, angle) in g.targets() {
                    *self.cp.entry((g.control(), t)).or_default() += angle;
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.singles.len() + self.cx.len() + self.cp.len()
    }

    fn diff(&self, other: &Effects, violations: &mut Vec<String>) {
        for (key, count) in &self.singles {
            let got = other.singles.get(key).copied().unwrap_or(0);
            if got != *count {
                violations.push(format!(
                    "{} on qubit {} appears {got} times, expected {count}",
                    key.0, key.1
                ));
            }
        }
        for (&(c, t), count) in &self.cx {
            let got = other.cx.get(&(c, t)).copied().unwrap_or(0);
            if got != *count {
                violations.push(format!(
                    "CX({c}→{t}) appears {got} times, expected {count}"
                ));
            }
        }
        for (&(c, t), angle) in &self.cp {
            let got = other.cp.get(&(c, t)).copied().unwrap_or(0.0);
            if (got - angle).abs() > ANGLE_TOLERANCE {
                violations.push(format!("CP({c}→{t}) total angle {got}, expected {angle}"));
            }
        }
    }
}

/// Verify that `layers` is a valid packing of `input`.
///
/// Checks that every layer is footprint-disjoint, that every input position
/// is absorbed exactly once, and that the logical effects match: single-qubit
/// gates and CX pairs by count, controlled-phase pairs by total angle.
pub fn verify_packing(input: &[Operation], layers: &[Layer]) -> VerificationResult {
    let mut violations = Vec::new();

    for (i, layer) in layers.iter().enumerate() {
        if !layer.is_valid() {
            violations.push(format!("layer {i} has overlapping operations"));
        }
    }

    let mut seen = vec![0usize; input.len()];
    for packed in layers.iter().flat_map(Layer::packed) {
        for &source in packed.sources() {
            match seen.get_mut(source) {
                Some(count) => *count += 1,
                None => violations.push(format!("source position {source} out of range")),
            }
        }
    }
    for (position, count) in seen.iter().enumerate() {
        if *count != 1 {
            violations.push(format!(
                "input position {position} absorbed {count} times"
            ));
        }
    }

    let mut expected = Effects::default();
    input.iter().for_each(|op| expected.record(op));
    let mut actual = Effects::default();
    layers
        .iter()
        .flat_map(Layer::operations)
        .for_each(|op| actual.record(op));

    expected.diff(&actual, &mut violations);
    actual.diff(&expected, &mut violations);
    violations.sort();
    violations.dedup();

    let result = VerificationResult {
        passed: violations.is_empty(),
        layers_checked: layers.len(),
        effects_checked: expected.len(),
        violations,
    };
    debug!(
        "Verification {}: {} layers, {} effects",
        if result.passed { "passed" } else { "failed" },
        result.layers_checked,
        result.effects_checked
    );
    result
}
