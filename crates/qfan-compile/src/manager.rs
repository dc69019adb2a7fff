//! Pipeline for orchestrating a full packing run.

use serde::Serialize;
use tracing::{debug, info, instrument};

use qfan_ir::{Circuit, Operation};

use crate::commutation::CommutationChecker;
use crate::config::PackConfig;
use crate::emit::Emitter;
use crate::error::{CompileError, CompileResult};
use crate::layer::Layer;
use crate::merge::AngleConflict;
use crate::packer::FanoutPacker;
use crate::placement::LayerPlacementPolicy;
use crate::reorder::Reorderer;
use crate::verification::verify_packing;

/// Summary counters for a packing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackStats {
    /// Operations in the input circuit.
    pub input_ops: usize,
    /// Operations in the emitted sequence.
    pub output_ops: usize,
    /// Number of layers.
    pub layers: usize,
    /// Input operations absorbed into another operation's fan-out.
    pub merged: usize,
    /// Angle conflicts left unmerged.
    pub angle_conflicts: usize,
}

/// Output of [`Pipeline::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledCircuit {
    /// Packed layers, in execution order.
    pub layers: Vec<Layer>,
    /// Flat emitted sequence.
    pub operations: Vec<Operation>,
    /// Angle conflicts recorded under the lenient policy.
    pub conflicts: Vec<AngleConflict>,
    /// Summary counters.
    pub stats: PackStats,
}

impl CompiledCircuit {
    /// Rebuild a [`Circuit`] from the emitted sequence.
    pub fn to_circuit(&self, name: impl Into<String>) -> CompileResult<Circuit> {
        Ok(Circuit::from_operations(name, self.operations.clone())?)
    }
}

/// Runs validate, reorder, pack, verify and emit in sequence.
pub struct Pipeline {
    config: PackConfig,
    reorderer: Reorderer,
    packer: FanoutPacker,
    emitter: Emitter,
}

impl Pipeline {
    /// Create a pipeline with the default configuration.
    pub fn new() -> Self {
        PipelineBuilder::new().build()
    }

    /// Create a pipeline from a configuration.
    pub fn from_config(config: PackConfig) -> Self {
        PipelineBuilder::new().with_config(config).build()
    }

    /// The active configuration.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Pack a circuit.
    #[instrument(skip_all, fields(circuit = circuit.name()))]
    pub fn run(&self, circuit: &Circuit) -> CompileResult<CompiledCircuit> {
        info!(
            "Packing circuit '{}' with {} operations on {} qubits",
            circuit.name(),
            circuit.len(),
            circuit.num_qubits()
        );
        self.run_operations(circuit.operations())
    }

    /// Pack a bare operation sequence.
    pub fn run_operations(&self, ops: &[Operation]) -> CompileResult<CompiledCircuit> {
        for op in ops {
            op.validate()?;
        }

        let ops = if self.config.reorder {
            let reordered = self.reorderer.reorder(ops);
            debug!("Reorder pass completed, ops: {}", reordered.len());
            reordered
        } else {
            debug!("Skipping reorder pass");
            ops.to_vec()
        };

        let packing = self.packer.pack(&ops)?;

        if self.config.verify {
            let result = verify_packing(&ops, packing.layers());
            if !result.passed {
                return Err(CompileError::VerificationFailed(result.violations.join("; ")));
            }
            debug!("Verification passed, {} effects", result.effects_checked);
        } else {
            debug!("Skipping verification");
        }

        let operations = self.emitter.emit(packing.layers());
        let stats = PackStats {
            input_ops: ops.len(),
            output_ops: operations.len(),
            layers: packing.num_layers(),
            merged: packing.merged_count(),
            angle_conflicts: packing.conflicts().len(),
        };
        info!(
            "Pipeline completed: {} ops -> {} ops in {} layers",
            stats.input_ops, stats.output_ops, stats.layers
        );

        let conflicts = packing.conflicts().to_vec();
        Ok(CompiledCircuit {
            layers: packing.into_layers(),
            operations,
            conflicts,
            stats,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    config: PackConfig,
    checker: CommutationChecker,
    policy: Option<Box<dyn LayerPlacementPolicy>>,
}

impl PipelineBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: PackConfig::default(),
            checker: CommutationChecker::new(),
            policy: None,
        }
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: PackConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the commutation table used by every stage.
    #[must_use]
    pub fn with_checker(mut self, checker: CommutationChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Use a custom placement policy, overriding `config.placement`.
    #[must_use]
    pub fn with_policy(mut self, policy: impl LayerPlacementPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Pipeline {
        let policy = self
            .policy
            .unwrap_or_else(|| self.config.placement.policy());
        let packer = FanoutPacker::new()
            .with_checker(self.checker.clone())
            .with_boxed_policy(policy)
            .with_angle_policy(self.config.angle_policy);

        Pipeline {
            reorderer: Reorderer::new(self.checker.clone())
                .with_angle_policy(self.config.angle_policy),
            emitter: Emitter::new(self.config.emit_order),
            packer,
            config: self.config,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnglePolicy, EmitOrder, PlacementStrategy};
    use crate::placement::MergeFirst;
    use qfan_ir::QubitId;

    fn names(ops: &[Operation]) -> Vec<String> {
        ops.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_circuit() {
        let compiled = Pipeline::new().run(&Circuit::new("empty")).unwrap();
        assert!(compiled.layers.is_empty());
        assert!(compiled.operations.is_empty());
        assert_eq!(compiled.stats, PackStats::default());
    }

    #[test]
    fn test_ghz_collapses_to_one_fanout() {
        let circuit = Circuit::ghz(4).unwrap();
        let compiled = Pipeline::new().run(&circuit).unwrap();

        assert_eq!(names(&compiled.operations), ["H(0)", "FANOUT(0→{1,2,3})"]);
        assert_eq!(compiled.stats.input_ops, 4);
        assert_eq!(compiled.stats.output_ops, 2);
        assert_eq!(compiled.stats.layers, 2);
        assert_eq!(compiled.stats.merged, 2);
    }

    #[test]
    fn test_reorder_disabled_still_merges_across_disjoint_gates() {
        let mut circuit = Circuit::new("cgr");
        circuit
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .h(QubitId(1))
            .unwrap()
            .cx(QubitId(0), QubitId(2))
            .unwrap();

        let with = Pipeline::new().run(&circuit).unwrap();
        let config = PackConfig {
            reorder: false,
            ..PackConfig::default()
        };
        let without = Pipeline::from_config(config).run(&circuit).unwrap();

        assert_eq!(names(&with.operations), ["FANOUT(0→{1,2})", "H(1)"]);
        assert_eq!(with.stats.output_ops, 2);
        assert_eq!(names(&without.operations), names(&with.operations));
        assert_eq!(without.stats.layers, 2);
    }

    #[test]
    fn test_strict_angle_policy_surfaces_error() {
        let mut circuit = Circuit::new("conflict");
        circuit
            .cp(0.5, QubitId(0), QubitId(1))
            .unwrap()
            .cp(0.25, QubitId(0), QubitId(1))
            .unwrap();

        let lenient = Pipeline::new().run(&circuit).unwrap();
        assert_eq!(lenient.stats.angle_conflicts, 1);
        assert_eq!(lenient.conflicts.len(), 1);

        let strict = Pipeline::from_config(PackConfig {
            angle_policy: AnglePolicy::Strict,
            ..PackConfig::default()
        });
        assert!(matches!(
            strict.run(&circuit),
            Err(CompileError::AngleConflict { .. })
        ));
    }

    #[test]
    fn test_builder_policy_overrides_config() {
        let pipeline = PipelineBuilder::new()
            .with_config(PackConfig {
                placement: PlacementStrategy::FirstFit,
                emit_order: EmitOrder::Layer,
                ..PackConfig::default()
            })
            .with_policy(MergeFirst)
            .build();

        let mut circuit = Circuit::new("merge-first");
        circuit
            .h(QubitId(1))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(0), QubitId(2))
            .unwrap();

        let compiled = pipeline.run(&circuit).unwrap();
        assert_eq!(pipeline.config().emit_order, EmitOrder::Layer);
        assert_eq!(names(&compiled.operations), ["H(1)", "FANOUT(0→{1,2})"]);
    }

    #[test]
    fn test_round_trip_to_circuit() {
        let compiled = Pipeline::new().run(&Circuit::qft(3).unwrap()).unwrap();
        let circuit = compiled.to_circuit("packed").unwrap();
        assert_eq!(circuit.len(), compiled.operations.len());
        assert_eq!(circuit.num_qubits(), 3);
    }
}
