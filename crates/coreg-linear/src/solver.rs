//! Common collect-then-compute interface over both solvers.

use crate::{
    AbsoluteOrientation, HandEyeCalibration, HandEyeEstimate, Observation, PointCorrelation,
    PoseCorrelation, Result, SimilarityEstimate, HANDEYE_MIN_SAMPLES,
};

/// A collect-then-compute co-registration solver.
///
/// Implementors own their correlation buffer. `compute` filters outliers and
/// solves once; until it succeeds `is_registered` stays `false` and
/// `estimate` returns `None`.
pub trait Coregistration {
    type Observation: Observation;
    type Estimate: Clone;

    /// Fewest buffered correlations `compute` will attempt to solve with.
    const MIN_SAMPLES: usize;

    fn add(&mut self, observation: Self::Observation);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_registered(&self) -> bool;

    fn compute(&mut self) -> Result<Self::Estimate>;

    fn estimate(&self) -> Option<Self::Estimate>;
}

impl Coregistration for AbsoluteOrientation {
    type Observation = PointCorrelation;
    type Estimate = SimilarityEstimate;

    const MIN_SAMPLES: usize = 1;

    fn add(&mut self, observation: PointCorrelation) {
        AbsoluteOrientation::add(self, observation);
    }

    fn len(&self) -> usize {
        AbsoluteOrientation::len(self)
    }

    fn is_registered(&self) -> bool {
        AbsoluteOrientation::is_registered(self)
    }

    fn compute(&mut self) -> Result<SimilarityEstimate> {
        AbsoluteOrientation::compute(self).cloned()
    }

    fn estimate(&self) -> Option<SimilarityEstimate> {
        AbsoluteOrientation::estimate(self).cloned()
    }
}

impl Coregistration for HandEyeCalibration {
    type Observation = PoseCorrelation;
    type Estimate = HandEyeEstimate;

    const MIN_SAMPLES: usize = HANDEYE_MIN_SAMPLES;

    fn add(&mut self, observation: PoseCorrelation) {
        HandEyeCalibration::add(self, observation);
    }

    fn len(&self) -> usize {
        HandEyeCalibration::len(self)
    }

    fn is_registered(&self) -> bool {
        HandEyeCalibration::is_registered(self)
    }

    fn compute(&mut self) -> Result<HandEyeEstimate> {
        HandEyeCalibration::compute(self)
    }

    fn estimate(&self) -> Option<HandEyeEstimate> {
        HandEyeCalibration::estimate(self)
    }
}
