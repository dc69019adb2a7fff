//! The conflict-aware greedy fan-out packer.

use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use qfan_ir::Operation;

use crate::commutation::CommutationChecker;
use crate::config::AnglePolicy;
use crate::error::{CompileError, CompileResult};
use crate::layer::{Layer, LayerBuilder, LayerFit};
use crate::merge::AngleConflict;
use crate::placement::{FirstFit, LayerPlacementPolicy};

/// Result of a packing pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Packing {
    layers: Vec<Layer>,
    conflicts: Vec<AngleConflict>,
}

impl Packing {
    /// The packed layers, in execution order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Consume the packing and return its layers.
    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Angle conflicts that were resolved by leaving operations unmerged.
    pub fn conflicts(&self) -> &[AngleConflict] {
        &self.conflicts
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Total number of packed operations across all layers.
    pub fn num_ops(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Number of input operations absorbed into another one.
    pub fn merged_count(&self) -> usize {
        self.layers
            .iter()
            .flat_map(Layer::packed)
            .map(|p| p.sources().len() - 1)
            .sum()
    }
}

/// Greedy first-fit packer.
///
/// Operations are placed one at a time, in order. An operation may only join
/// a layer after the last layer holding something it does not commute with;
/// among those, the placement policy picks one (by default the earliest
/// layer it fits in). Inside the chosen layer it either merges into a
/// fan-out with the same control or opens a new slot.
pub struct FanoutPacker {
    checker: CommutationChecker,
    policy: Box<dyn LayerPlacementPolicy>,
    angle_policy: AnglePolicy,
}

impl FanoutPacker {
    /// Create a packer with the standard commutation table and first-fit placement.
    pub fn new() -> Self {
        Self {
            checker: CommutationChecker::new(),
            policy: Box::new(FirstFit),
            angle_policy: AnglePolicy::default(),
        }
    }

    /// Use a different commutation table.
    #[must_use]
    pub fn with_checker(mut self, checker: CommutationChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Use a different placement policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl LayerPlacementPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Use an already boxed placement policy.
    #[must_use]
    pub fn with_boxed_policy(mut self, policy: Box<dyn LayerPlacementPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Set how repeated phase targets are handled.
    #[must_use]
    pub fn with_angle_policy(mut self, angle_policy: AnglePolicy) -> Self {
        self.angle_policy = angle_policy;
        self
    }

    /// The commutation table in use.
    pub fn checker(&self) -> &CommutationChecker {
        &self.checker
    }

    /// Pack `ops` into layers.
    #[instrument(skip_all, fields(ops = ops.len(), policy = self.policy.name()))]
    pub fn pack(&self, ops: &[Operation]) -> CompileResult<Packing> {
        let mut layers: Vec<LayerBuilder> = Vec::new();
        let mut conflicts = Vec::new();
        let accumulate = self.angle_policy == AnglePolicy::Accumulate;

        for (position, op) in ops.iter().enumerate() {
            op.validate()?;

            let start = self.earliest_layer(&layers, op);
            let mut fits = Vec::with_capacity(layers.len() - start);
            let mut conflict = None;
            for layer in &layers[start..] {
                let (fit, found) = layer.fit(op, position, self.angle_policy);
                fits.push(fit);
                conflict = conflict.or(found);
            }

            if let Some(c) = conflict {
                if self.angle_policy == AnglePolicy::Strict {
                    return Err(c.into());
                }
                warn!(
                    "Angle conflict on control {}, target {}: keeping {} unmerged ({} vs {})",
                    c.control, c.target, op, c.existing, c.incoming
                );
                conflicts.push(c);
            }

            match self.policy.select(&fits) {
                Some(i) => {
                    let fit = fits.get(i).copied().unwrap_or(LayerFit::Conflict);
                    if !fit.is_eligible() {
                        return Err(CompileError::InvalidConfiguration(format!(
                            "placement policy '{}' selected an ineligible layer for {op}",
                            self.policy.name()
                        )));
                    }
                    trace!("{} -> layer {} ({:?})", op, start + i, fit);
                    layers[start + i].insert(op, position, fit, accumulate)?;
                }
                None => {
                    trace!("{} -> new layer {}", op, layers.len());
                    let mut layer = LayerBuilder::new();
                    layer.insert(op, position, LayerFit::Disjoint, accumulate)?;
                    layers.push(layer);
                }
            }
        }

        let packing = Packing {
            layers: layers.into_iter().map(LayerBuilder::freeze).collect(),
            conflicts,
        };

        info!(
            "Packed {} operations into {} layers ({} merged, {} angle conflicts)",
            ops.len(),
            packing.num_layers(),
            packing.merged_count(),
            packing.conflicts.len()
        );

        Ok(packing)
    }

    /// First layer `op` may join without passing a non-commuting operation.
    fn earliest_layer(&self, layers: &[LayerBuilder], op: &Operation) -> usize {
        match layers.iter().rposition(|layer| {
            layer
                .overlapping(op)
                .any(|placed| !self.checker.commutes(placed, op))
        }) {
            Some(barrier) => {
                debug!("{} blocked behind layer {}", op, barrier);
                barrier + 1
            }
            None => 0,
        }
    }
}

impl Default for FanoutPacker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::MergeFirst;
    use qfan_ir::{QubitId, SingleQubitKind};

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    fn cx(c: u32, t: u32) -> Operation {
        Operation::cx(q(c), q(t)).unwrap()
    }

    fn cp(angle: f64, c: u32, t: u32) -> Operation {
        Operation::cp(angle, q(c), q(t)).unwrap()
    }

    fn layer_strings(packing: &Packing) -> Vec<Vec<String>> {
        packing
            .layers()
            .iter()
            .map(|l| l.operations().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let packing = FanoutPacker::new().pack(&[]).unwrap();
        assert_eq!(packing.num_layers(), 0);
        assert_eq!(packing.num_ops(), 0);
    }

    #[test]
    fn test_counterexample_layers() {
        let ops = [cx(0, 1), cx(2, 3), cx(0, 2), cx(0, 3)];
        let packing = FanoutPacker::new().pack(&ops).unwrap();
        assert_eq!(
            layer_strings(&packing),
            vec![
                vec!["FANOUT(0→{1})", "FANOUT(2→{3})"],
                vec!["FANOUT(0→{2,3})"],
            ]
        );
        assert_eq!(packing.merged_count(), 1);
    }

    #[test]
    fn test_repeated_target_goes_to_next_layer() {
        let ops = [cx(0, 1), cx(0, 2), cx(0, 3), cx(0, 1), cx(2, 3)];
        let packing = FanoutPacker::new().pack(&ops).unwrap();
        assert_eq!(
            layer_strings(&packing),
            vec![
                vec!["FANOUT(0→{1,2,3})"],
                vec!["FANOUT(0→{1})", "FANOUT(2→{3})"],
            ]
        );
    }

    #[test]
    fn test_program_order_respected() {
        // CX(2→3) must stay after CX(1→2) even though layer 0 has room for it.
        let ops = [cx(0, 1), cx(1, 2), cx(2, 3)];
        let packing = FanoutPacker::new().pack(&ops).unwrap();
        assert_eq!(packing.num_layers(), 3);
    }

    #[test]
    fn test_disjoint_ops_share_one_layer() {
        let ops = [
            cx(0, 1),
            cx(2, 3),
            Operation::single(SingleQubitKind::H, q(4)),
            cp(0.5, 5, 6),
        ];
        let packing = FanoutPacker::new().pack(&ops).unwrap();
        assert_eq!(packing.num_layers(), 1);
        assert_eq!(packing.num_ops(), 4);
    }

    #[test]
    fn test_malformed_input_fails_fast() {
        let bad = Operation::Controlled {
            control: q(1),
            target: q(1),
        };
        let err = FanoutPacker::new().pack(&[cx(0, 1), bad]).unwrap_err();
        assert!(matches!(err, CompileError::Ir(_)));
    }

    #[test]
    fn test_angle_conflict_lenient() {
        let ops = [cp(0.5, 0, 1), cp(0.25, 0, 1)];
        let packing = FanoutPacker::new().pack(&ops).unwrap();
        assert_eq!(packing.num_layers(), 2);
        assert_eq!(packing.conflicts().len(), 1);
        assert_eq!(packing.conflicts()[0].position, 1);
    }

    #[test]
    fn test_angle_conflict_strict() {
        let ops = [cp(0.5, 0, 1), cp(0.25, 0, 1)];
        let err = FanoutPacker::new()
            .with_angle_policy(AnglePolicy::Strict)
            .pack(&ops)
            .unwrap_err();
        assert!(matches!(err, CompileError::AngleConflict { .. }));
    }

    #[test]
    fn test_angle_accumulate() {
        let ops = [cp(0.5, 0, 1), cp(0.25, 0, 2), cp(0.25, 0, 1)];
        let packing = FanoutPacker::new()
            .with_angle_policy(AnglePolicy::Accumulate)
            .pack(&ops)
            .unwrap();
        assert_eq!(
            layer_strings(&packing),
            vec![vec!["CP_FANOUT(0→{1:0.75,2:0.25})"]]
        );
        assert!(packing.conflicts().is_empty());
    }

    #[test]
    fn test_equal_angle_repeat_is_kept() {
        let ops = [cp(0.5, 0, 1), cp(0.5, 0, 1)];
        let packing = FanoutPacker::new()
            .with_angle_policy(AnglePolicy::Strict)
            .pack(&ops)
            .unwrap();
        assert_eq!(packing.num_layers(), 2);
        assert!(packing.conflicts().is_empty());
    }

    #[test]
    fn test_merge_first_prefers_merge() {
        let ops = [
            Operation::single(SingleQubitKind::H, q(1)),
            cx(0, 1),
            cx(0, 2),
        ];
        let first = FanoutPacker::new().pack(&ops).unwrap();
        assert_eq!(
            layer_strings(&first),
            vec![vec!["H(1)", "FANOUT(0→{2})"], vec!["FANOUT(0→{1})"]]
        );

        let merge = FanoutPacker::new().with_policy(MergeFirst).pack(&ops).unwrap();
        assert_eq!(
            layer_strings(&merge),
            vec![vec!["H(1)"], vec!["FANOUT(0→{1,2})"]]
        );
    }

    struct AlwaysFirst;

    impl LayerPlacementPolicy for AlwaysFirst {
        fn name(&self) -> &'static str {
            "always_first"
        }

        fn select(&self, fits: &[LayerFit]) -> Option<usize> {
            (!fits.is_empty()).then_some(0)
        }
    }

    #[test]
    fn test_misbehaving_policy_is_rejected() {
        // Diagonal gates commute, so layer 0 is legal but occupied on qubit 1.
        let ops = [cp(0.5, 0, 1), cp(0.5, 2, 1)];
        let err = FanoutPacker::new()
            .with_policy(AlwaysFirst)
            .pack(&ops)
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidConfiguration(_)));
    }
}
