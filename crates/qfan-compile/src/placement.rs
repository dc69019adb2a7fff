//! Layer placement heuristics.
//!
//! The packer computes, for every layer an operation may legally join, a
//! [`LayerFit`]. A [`LayerPlacementPolicy`] then picks one of them. Swapping
//! the policy changes the heuristic without touching the merge logic.

use crate::config::PlacementStrategy;
use crate::layer::LayerFit;

/// Chooses a layer among the legal candidates.
pub trait LayerPlacementPolicy: Send + Sync {
    /// Get the name of this policy.
    fn name(&self) -> &str;

    /// Pick an index into `fits`, or `None` to open a new layer.
    ///
    /// `fits[i]` describes the `i`-th legal layer, in layer order.
    fn select(&self, fits: &[LayerFit]) -> Option<usize>;
}

/// Earliest eligible layer wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl LayerPlacementPolicy for FirstFit {
    fn name(&self) -> &'static str {
        "first_fit"
    }

    fn select(&self, fits: &[LayerFit]) -> Option<usize> {
        fits.iter().position(|fit| fit.is_eligible())
    }
}

/// Earliest layer offering a merge, falling back to first fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeFirst;

impl LayerPlacementPolicy for MergeFirst {
    fn name(&self) -> &'static str {
        "merge_first"
    }

    fn select(&self, fits: &[LayerFit]) -> Option<usize> {
        fits.iter()
            .position(|fit| matches!(fit, LayerFit::Merge { .. }))
            .or_else(|| FirstFit.select(fits))
    }
}

impl PlacementStrategy {
    /// Instantiate the built-in policy for this strategy.
    pub fn policy(self) -> Box<dyn LayerPlacementPolicy> {
        match self {
            PlacementStrategy::FirstFit => Box::new(FirstFit),
            PlacementStrategy::MergeFirst => Box::new(MergeFirst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit() {
        let fits = [
            LayerFit::Conflict,
            LayerFit::Disjoint,
            LayerFit::Merge { slot: 0 },
        ];
        assert_eq!(FirstFit.select(&fits), Some(1));
        assert_eq!(FirstFit.select(&[LayerFit::Conflict]), None);
        assert_eq!(FirstFit.select(&[]), None);
    }

    #[test]
    fn test_merge_first() {
        let fits = [
            LayerFit::Conflict,
            LayerFit::Disjoint,
            LayerFit::Merge { slot: 2 },
        ];
        assert_eq!(MergeFirst.select(&fits), Some(2));
        assert_eq!(
            MergeFirst.select(&[LayerFit::Conflict, LayerFit::Disjoint]),
            Some(1)
        );
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(PlacementStrategy::FirstFit.policy().name(), "first_fit");
        assert_eq!(PlacementStrategy::MergeFirst.policy().name(), "merge_first");
    }
}
