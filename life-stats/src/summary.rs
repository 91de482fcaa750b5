use crate::Merge;
use std::iter::FromIterator;

/// Count, mean, and variance of a stream of values, computed in one pass.
///
/// Single values are folded in with Welford's online algorithm.  Two
/// partial summaries are combined with the pairwise formula of Chan, Golub
/// and LeVeque, so summaries built on separate workers can be merged
/// without access to the underlying values.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SummaryStats {
    /// the number of samples seen so far
    count: u64,
    /// the mean of the entire dataset
    mean: f64,
    /// the summed squared distance from the mean
    m2: f64,
}

impl SummaryStats {
    pub fn update(&mut self, x: f64) {
        // Welford's online algorithm
        self.count += 1;
        let delta1 = x - self.mean; // diff from the old mean
        self.mean += delta1 / self.count as f64;
        let delta2 = x - self.mean; // diff from the new mean
        self.m2 += delta1 * delta2;
    }

    /// Combine with the summary of another sample, given as its size, mean,
    /// and summed squared deviations.
    pub fn update_subsample(&mut self, count: u64, mean: f64, m2: f64) {
        if count == 0 {
            return;
        }
        if self.count == 0 {
            *self = SummaryStats { count, mean, m2 };
            return;
        }
        let n1 = self.count as f64;
        let n2 = count as f64;
        let delta = mean - self.mean;
        self.mean = (self.mean * n1 + mean * n2) / (n1 + n2);
        self.m2 += m2 + delta * delta * n1 * n2 / (n1 + n2);
        self.count += count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Zero when nothing has been seen yet.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// The sample variance, or NaN if fewer than two values have been seen.
    pub fn variance(&self) -> f64 {
        if self.count <= 1 {
            f64::NAN
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// The sample standard deviation, or NaN if fewer than two values have
    /// been seen.
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// The standard error of `mean` as an estimate of the population mean.
    ///
    /// When estimating μ with a sample mean ̄x, the variance of the estimate
    /// is σ²/n.  We don't know σ² either, so we use s²/n instead.
    pub fn stderr(&self) -> f64 {
        (self.variance() / self.count as f64).sqrt()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Merge for SummaryStats {
    fn merge(&mut self, other: &SummaryStats) {
        self.update_subsample(other.count, other.mean, other.m2);
    }
}

impl Extend<f64> for SummaryStats {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for x in iter {
            self.update(x);
        }
    }
}

impl FromIterator<f64> for SummaryStats {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> SummaryStats {
        let mut stats = SummaryStats::default();
        stats.extend(iter);
        stats
    }
}
