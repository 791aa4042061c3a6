//! Median absolute deviation (MAD) outlier rejection on correlation distances.
//!
//! A correlation is an outlier when the distance between its two positions
//! deviates from the median distance by more than `threshold · MAD`, with
//! `MAD = mad_scale · median(|distance - median|)`. The default `mad_scale`
//! of 1.4826 makes the MAD a consistent estimate of the standard deviation
//! for Gaussian data.
//!
//! # References
//!
//! Leys et al., "Detecting outliers: Do not use standard deviation around the
//! mean, use absolute deviation around the median", JESP 2013.

use coreg_core::Real;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{CoregistrationError, CorrelationBuffer, Observation, Result};

/// Parameters of the MAD filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierOptions {
    /// Factor turning the raw median deviation into a standard deviation
    /// estimate.
    pub mad_scale: Real,
    /// Samples deviating by more than `threshold · MAD` are removed.
    pub threshold: Real,
}

impl Default for OutlierOptions {
    fn default() -> Self {
        Self {
            mad_scale: 1.4826,
            threshold: 3.0,
        }
    }
}

/// Statistics of one filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    /// Median correlation distance before removal.
    pub median: Real,
    /// Scaled median absolute deviation.
    pub mad: Real,
    pub kept: usize,
    pub removed: usize,
}

/// Median of an ascending slice using the rank rule
/// `avg = (n + 1) / 2`, `lo = floor(avg) - 1`, `hi = ceil(avg) - 1`.
///
/// For odd `n` both ranks hit the middle element; for even `n` the two
/// central elements are averaged. Returns `None` on an empty slice.
pub fn median_by_rank(sorted: &[Real]) -> Option<Real> {
    let (lo, hi) = median_ranks(sorted.len())?;
    Some((sorted[lo] + sorted[hi]) / 2.0)
}

fn median_ranks(n: usize) -> Option<(usize, usize)> {
    if n == 0 {
        return None;
    }
    let average_rank = (n as Real + 1.0) / 2.0;
    let lo = average_rank.floor() as usize - 1;
    let hi = average_rank.ceil() as usize - 1;
    Some((lo, hi))
}

impl<O: Observation> CorrelationBuffer<O> {
    /// Remove correlations whose distance is an outlier, in place.
    ///
    /// On return the buffer is ordered by ascending absolute deviation and
    /// every survivor carries a fresh [`absolute_distance`]. The pass is not
    /// idempotent in general: removing samples shrinks the MAD, so a second
    /// call can drop further samples. It only leaves the set unchanged when
    /// every survivor already lies within the new cut, and even then it may
    /// reorder ties.
    ///
    /// When all distances agree the MAD is zero and only samples with a
    /// nonzero deviation are dropped.
    ///
    /// [`absolute_distance`]: crate::Correlation::absolute_distance
    pub fn remove_outliers(&mut self, opts: &OutlierOptions) -> Result<OutlierReport> {
        let n = self.correlations.len();
        let (lo, hi) = median_ranks(n)
            .ok_or(CoregistrationError::InsufficientSamples { needed: 1, got: 0 })?;

        self.correlations
            .sort_by(|a, b| a.distance.total_cmp(&b.distance));
        let median = (self.correlations[lo].distance + self.correlations[hi].distance) / 2.0;

        for c in &mut self.correlations {
            c.absolute_distance = (c.distance - median).abs();
        }

        self.correlations
            .sort_by(|a, b| a.absolute_distance.total_cmp(&b.absolute_distance));
        let mad = opts.mad_scale
            * ((self.correlations[lo].absolute_distance + self.correlations[hi].absolute_distance)
                / 2.0);

        let limit = opts.threshold * mad;
        // NaN deviations never compare greater, so they are kept.
        let is_outlier = |deviation: Real| deviation > limit;
        self.correlations
            .retain(|c| !is_outlier(c.absolute_distance));
        self.is_clean = true;

        let kept = self.correlations.len();
        let removed = n - kept;
        debug!(
            "outlier pass: median {:.6}, mad {:.6}, kept {}, removed {}",
            median, mad, kept, removed
        );

        Ok(OutlierReport {
            median,
            mad,
            kept,
            removed,
        })
    }
}
