//! Property-based tests for the fan-out packer.
//!
//! Random streams of CX, CP, H and RZ gates over a handful of qubits are
//! packed and checked for layer validity, conservation, determinism and
//! program-order preservation.

use proptest::prelude::*;

use qfan_compile::{
    AnglePolicy, CommutationChecker, EmitOrder, FanoutPacker, MergeFirst, PackConfig, Pipeline,
    PlacementStrategy, verify_packing,
};
use qfan_ir::{Operation, QubitId, SingleQubitKind};

/// Gates drawn by the strategies below.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    Rz(u32, f64),
    Cx(u32, u32),
    Cp(u32, u32, f64),
}

impl GateOp {
    fn build(self) -> Operation {
        match self {
            GateOp::H(q) => Operation::single(SingleQubitKind::H, QubitId(q)),
            GateOp::Rz(q, theta) => Operation::single(SingleQubitKind::Rz(theta), QubitId(q)),
            GateOp::Cx(c, t) => Operation::cx(QubitId(c), QubitId(t)).unwrap(),
            GateOp::Cp(c, t, theta) => Operation::cp(theta, QubitId(c), QubitId(t)).unwrap(),
        }
    }
}

/// A (control, target) pair with distinct qubits.
fn arb_pair(num_qubits: u32) -> impl Strategy<Value = (u32, u32)> {
    (0..num_qubits, 1..num_qubits).prop_map(move |(c, offset)| (c, (c + offset) % num_qubits))
}

/// A small angle set, so repeated phase targets collide often.
fn arb_angle() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![0.25, 0.5, 1.0])
}

fn arb_gate(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    prop_oneof![
        1 => (0..num_qubits).prop_map(GateOp::H),
        1 => (0..num_qubits, arb_angle()).prop_map(|(q, a)| GateOp::Rz(q, a)),
        3 => arb_pair(num_qubits).prop_map(|(c, t)| GateOp::Cx(c, t)),
        3 => (arb_pair(num_qubits), arb_angle()).prop_map(|((c, t), a)| GateOp::Cp(c, t, a)),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Operation>> {
    (2_u32..=6).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate(num_qubits), 0..=24)
            .prop_map(|gates| gates.into_iter().map(GateOp::build).collect())
    })
}

fn arb_angle_policy() -> impl Strategy<Value = AnglePolicy> {
    prop_oneof![Just(AnglePolicy::Lenient), Just(AnglePolicy::Accumulate)]
}

fn arb_pack_config() -> impl Strategy<Value = PackConfig> {
    (
        arb_angle_policy(),
        prop_oneof![Just(PlacementStrategy::FirstFit), Just(PlacementStrategy::MergeFirst)],
        prop_oneof![Just(EmitOrder::Program), Just(EmitOrder::Layer)],
    )
        .prop_map(|(angle_policy, placement, emit_order)| PackConfig {
            angle_policy,
            placement,
            emit_order,
            ..PackConfig::default()
        })
}

/// Index of the layer holding input position `position`.
fn layer_of(layers: &[qfan_compile::Layer], position: usize) -> Option<usize> {
    layers.iter().position(|layer| {
        layer
            .packed()
            .iter()
            .any(|p| p.sources().contains(&position))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn packing_is_valid_and_conserving(ops in arb_ops(), policy in arb_angle_policy()) {
        let packing = FanoutPacker::new().with_angle_policy(policy).pack(&ops).unwrap();

        prop_assert!(packing.layers().iter().all(|layer| layer.is_valid()));
        prop_assert!(packing.num_layers() <= ops.len());
        prop_assert!(packing.num_ops() <= ops.len());

        let result = verify_packing(&ops, packing.layers());
        prop_assert!(result.passed, "{:?}", result.violations);
    }

    #[test]
    fn merge_first_is_valid_and_conserving(ops in arb_ops()) {
        let packing = FanoutPacker::new().with_policy(MergeFirst).pack(&ops).unwrap();
        let result = verify_packing(&ops, packing.layers());
        prop_assert!(result.passed, "{:?}", result.violations);
    }

    #[test]
    fn packing_is_deterministic(ops in arb_ops()) {
        let packer = FanoutPacker::new();
        prop_assert_eq!(packer.pack(&ops).unwrap(), packer.pack(&ops).unwrap());
    }

    #[test]
    fn non_commuting_order_is_preserved(ops in arb_ops()) {
        let checker = CommutationChecker::new();
        let packing = FanoutPacker::new().pack(&ops).unwrap();
        let layers = packing.layers();

        for (i, a) in ops.iter().enumerate() {
            for (j, b) in ops.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) && !checker.commutes(a, b) {
                    prop_assert!(layer_of(layers, i) < layer_of(layers, j), "{} vs {}", a, b);
                }
            }
        }
    }

    #[test]
    fn pipeline_emits_every_packed_operation(ops in arb_ops()) {
        let compiled = Pipeline::from_config(PackConfig {
            angle_policy: AnglePolicy::Accumulate,
            ..PackConfig::default()
        })
        .run_operations(&ops)
        .unwrap();

        let packed: usize = compiled.layers.iter().map(|layer| layer.len()).sum();
        prop_assert_eq!(compiled.operations.len(), packed);
        prop_assert_eq!(compiled.stats.input_ops, ops.len());
        prop_assert_eq!(compiled.stats.input_ops, compiled.stats.output_ops + compiled.stats.merged);
        prop_assert!(compiled.conflicts.is_empty());
    }

    #[test]
    fn repacking_keeps_layers(ops in arb_ops()) {
        let pipeline = Pipeline::new();
        let once = pipeline.run_operations(&ops).unwrap();
        let twice = pipeline.run_operations(&once.operations).unwrap();
        prop_assert_eq!(twice.stats.layers, once.stats.layers);
        prop_assert_eq!(twice.stats.merged, 0);
    }

    #[test]
    fn repacking_keeps_layers_under_any_config(ops in arb_ops(), config in arb_pack_config()) {
        let pipeline = Pipeline::from_config(config);
        let once = pipeline.run_operations(&ops).unwrap();
        let twice = pipeline.run_operations(&once.operations).unwrap();
        prop_assert_eq!(twice.stats.layers, once.stats.layers);
        prop_assert_eq!(twice.stats.merged, 0);
        prop_assert_eq!(twice.stats.output_ops, once.stats.output_ops);
    }

    #[test]
    fn disjoint_footprints_pack_into_one_layer(pairs in 1_usize..=8, phase in any::<bool>()) {
        let ops: Vec<Operation> = (0..pairs)
            .map(|i| {
                let (c, t) = (QubitId(2 * i as u32), QubitId(2 * i as u32 + 1));
                if phase {
                    Operation::cp(0.5, c, t).unwrap()
                } else {
                    Operation::cx(c, t).unwrap()
                }
            })
            .collect();

        let packing = FanoutPacker::new().pack(&ops).unwrap();
        prop_assert_eq!(packing.num_layers(), 1);
        prop_assert_eq!(packing.num_ops(), pairs);
    }
}
