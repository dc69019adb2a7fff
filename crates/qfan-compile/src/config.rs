//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// What to do when a phase fan-out is offered a target it already holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnglePolicy {
    /// Leave the operation unmerged and report differing angles as a warning.
    #[default]
    Lenient,
    /// Fail the pack with [`CompileError::AngleConflict`] on differing angles.
    Strict,
    /// Add the incoming angle to the existing entry.
    Accumulate,
}

/// Built-in layer placement heuristics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementStrategy {
    /// Earliest eligible layer.
    #[default]
    FirstFit,
    /// Earliest layer offering a merge, else earliest eligible layer.
    MergeFirst,
}

/// Order in which packed layers are flattened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmitOrder {
    /// Dependency order, ties broken by original position.
    #[default]
    Program,
    /// Layer by layer.
    Layer,
}

/// Configuration for a packing [`Pipeline`](crate::Pipeline).
///
/// Every field has a default, so partial YAML/JSON documents are accepted.
///
/// ```
/// use qfan_compile::{AnglePolicy, PackConfig};
///
/// let config = PackConfig::from_json(r#"{ "angle_policy": "strict" }"#).unwrap();
/// assert_eq!(config.angle_policy, AnglePolicy::Strict);
/// assert!(config.reorder);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackConfig {
    /// Run the reorderer before packing.
    pub reorder: bool,
    /// Handling of repeated phase targets.
    pub angle_policy: AnglePolicy,
    /// Layer placement heuristic.
    pub placement: PlacementStrategy,
    /// Flattening order for the emitted sequence.
    pub emit_order: EmitOrder,
    /// Check validity and conservation after packing.
    pub verify: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            reorder: true,
            angle_policy: AnglePolicy::default(),
            placement: PlacementStrategy::default(),
            emit_order: EmitOrder::default(),
            verify: true,
        }
    }
}

impl PackConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(source: &str) -> CompileResult<Self> {
        serde_json::from_str(source).map_err(|e| CompileError::InvalidConfiguration(e.to_string()))
    }
}
