//! Fan-out packing for distributed quantum circuits
//!
//! This crate groups two-qubit gates that share a control qubit into
//! fan-out gates and arranges the result into parallel layers. In a
//! distributed setting each fan-out costs one shared entangled resource
//! instead of one per target, so fewer, wider fan-outs mean fewer
//! inter-node links.
//!
//! # Overview
//!
//! A packing run takes a flat operation sequence through these stages:
//! 1. **Reorder**: Slide each mergeable gate back next to an earlier gate
//!    with the same control, when it commutes with everything it passes
//! 2. **Pack**: Place each operation into the earliest layer it can legally
//!    join, merging it into a fan-out with the same control where possible
//! 3. **Verify**: Check layer validity and that no gate was lost
//! 4. **Emit**: Flatten the layers into a dependency-respecting sequence
//!
//! # Architecture
//!
//! ```text
//! Circuit / &[Operation]
//!       │
//!       ▼
//! ┌──────────┐
//! │ Pipeline │ ◄── PackConfig (angle policy, placement, emit order)
//! └──────────┘
//!       │
//!       ├── Reorderer          (CommutationChecker)
//!       ├── FanoutPacker       (LayerPlacementPolicy: FirstFit / MergeFirst)
//!       ├── verify_packing
//!       └── Emitter            (program order / layer order)
//!       │
//!       ▼
//! CompiledCircuit { layers, operations, conflicts, stats }
//! ```
//!
//! # Example
//!
//! ```rust
//! use qfan_compile::Pipeline;
//! use qfan_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new("fanout");
//! circuit
//!     .cx(QubitId(0), QubitId(1)).unwrap()
//!     .cx(QubitId(2), QubitId(3)).unwrap()
//!     .cx(QubitId(0), QubitId(2)).unwrap()
//!     .cx(QubitId(0), QubitId(3)).unwrap();
//!
//! let compiled = Pipeline::new().run(&circuit).unwrap();
//! let emitted: Vec<String> = compiled.operations.iter().map(ToString::to_string).collect();
//! assert_eq!(emitted, ["FANOUT(0→{1})", "FANOUT(2→{3})", "FANOUT(0→{2,3})"]);
//! ```
//!
//! # Angle Policies
//!
//! | Policy | Repeated CP target with a different angle |
//! |--------|-------------------------------------------|
//! | `Lenient` | Left unmerged, recorded as a conflict (default) |
//! | `Strict` | [`CompileError::AngleConflict`] |
//! | `Accumulate` | Angles are summed into the existing entry |
//!
//! # Custom Placement
//!
//! Implement [`LayerPlacementPolicy`] to choose among eligible layers:
//!
//! ```rust
//! use qfan_compile::{FanoutPacker, LayerFit, LayerPlacementPolicy};
//!
//! struct LastFit;
//!
//! impl LayerPlacementPolicy for LastFit {
//!     fn name(&self) -> &str { "last_fit" }
//!
//!     fn select(&self, fits: &[LayerFit]) -> Option<usize> {
//!         fits.iter().rposition(|fit| fit.is_eligible())
//!     }
//! }
//!
//! let packer = FanoutPacker::new().with_policy(LastFit);
//! ```

pub mod commutation;
pub mod config;
pub mod emit;
pub mod error;
pub mod layer;
pub mod manager;
pub mod merge;
pub mod packer;
pub mod placement;
pub mod reorder;
pub mod verification;

pub use commutation::{CommutationChecker, PairRule};
pub use config::{AnglePolicy, EmitOrder, PackConfig, PlacementStrategy};
pub use emit::Emitter;
pub use error::{CompileError, CompileResult};
pub use layer::{Layer, LayerFit};
pub use manager::{CompiledCircuit, PackStats, Pipeline, PipelineBuilder};
pub use merge::{AngleConflict, PackedOperation};
pub use packer::{FanoutPacker, Packing};
pub use placement::{FirstFit, LayerPlacementPolicy, MergeFirst};
pub use reorder::Reorderer;
pub use verification::{VerificationResult, verify_packing};
