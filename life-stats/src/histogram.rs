use crate::{Error, Merge};

pub const DEFAULT_CAPACITY: usize = 100;

/// A representative value standing in for `weight` observations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bin {
    pub value: f64,
    pub weight: u64,
}

/// A bounded-size approximation of a distribution, built in one pass.
///
/// This is the streaming parallel histogram of Ben-Haim and Yom-Tov ("A
/// Streaming Parallel Decision Tree Algorithm", JMLR 11, 2010).  It keeps
/// at most `capacity` bins; whenever there are more, the two closest bins
/// are collapsed into one.  Quantiles are estimated by interpolating
/// between bins.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    capacity: usize,
    /// strictly increasing by value
    bins: Vec<Bin>,
}

impl Default for Histogram {
    fn default() -> Histogram {
        Histogram {
            capacity: DEFAULT_CAPACITY,
            bins: Vec::with_capacity(DEFAULT_CAPACITY + 1),
        }
    }
}

impl Histogram {
    pub fn new(capacity: usize) -> Result<Histogram, Error> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(Histogram {
            capacity,
            bins: Vec::with_capacity(capacity + 1),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// The number of observations summarised.
    pub fn count(&self) -> u64 {
        self.bins.iter().map(|b| b.weight).sum()
    }

    pub fn update(&mut self, x: f64) {
        let i = self.bins.partition_point(|b| b.value < x);
        match self.bins.get_mut(i) {
            Some(bin) if bin.value == x => bin.weight += 1,
            _ => self.bins.insert(i, Bin { value: x, weight: 1 }),
        }
        self.merge_down();
    }

    /// Take in bins produced by another histogram.
    ///
    /// A peer bin at exactly the value of an existing bin is folded into
    /// it straight away, even when there is room to keep both.  Quantiles
    /// of an under-capacity histogram therefore treat the two as one bin,
    /// not as two bins with a zero gap between them.
    pub fn absorb(&mut self, bins: &[Bin]) {
        self.bins.extend_from_slice(bins);
        self.bins.sort_by(|a, b| {
            a.value
                .total_cmp(&b.value)
                .then_with(|| a.weight.cmp(&b.weight))
        });
        // Bins at an identical value are one bin
        self.bins.dedup_by(|next, prev| {
            if next.value == prev.value {
                prev.weight += next.weight;
                true
            } else {
                false
            }
        });
        self.merge_down();
    }

    /// Collapse the closest pair of neighbouring bins until we're within
    /// capacity.  Of several equally close pairs, the lowest one goes first.
    fn merge_down(&mut self) {
        while self.bins.len() > self.capacity {
            let mut closest = 0;
            let mut min_gap = f64::INFINITY;
            for (i, pair) in self.bins.windows(2).enumerate() {
                let gap = pair[1].value - pair[0].value;
                if gap < min_gap {
                    min_gap = gap;
                    closest = i;
                }
            }
            let lo = self.bins[closest];
            let hi = self.bins.remove(closest + 1);
            let weight = lo.weight + hi.weight;
            self.bins[closest] = Bin {
                value: (lo.value * lo.weight as f64 + hi.value * hi.weight as f64)
                    / weight as f64,
                weight,
            };
        }
    }

    /// Estimate the `q`th quantile.  `q` must be between 0 and 1 inclusive.
    ///
    /// Each bin is treated as the centre of a bucket holding its weight,
    /// half on either side of it.  We find the point where the running
    /// total of weight crosses `q` of the whole, and interpolate linearly
    /// between the bins on either side.
    pub fn quantile(&self, q: f64) -> Result<f64, Error> {
        if !(0. ..=1.).contains(&q) {
            return Err(Error::QuantileOutOfRange(q));
        }
        let (first, last) = match (self.bins.first(), self.bins.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::EmptyHistogram),
        };

        // cumsums[i] is the weight to the left of bin i-1's centre, with
        // phantom empty bins at either end
        let mut cumsums = Vec::with_capacity(self.bins.len() + 2);
        cumsums.push(0.);
        let mut prev = 0.;
        let mut total = 0.;
        for w in self
            .bins
            .iter()
            .map(|b| b.weight as f64)
            .chain(std::iter::once(0.))
        {
            total += (w + prev) / 2.;
            cumsums.push(total);
            prev = w;
        }

        let target = q * total;
        let i = cumsums.partition_point(|c| *c <= target);
        if i <= 1 {
            // At or before the first bin
            Ok(first.value)
        } else if i > self.bins.len() {
            // At or after the last bin
            Ok(last.value)
        } else {
            let i = i - 1;
            let frac = (target - cumsums[i]) / (cumsums[i + 1] - cumsums[i]);
            let (lo, hi) = (self.bins[i - 1].value, self.bins[i].value);
            Ok(lo + frac * (hi - lo))
        }
    }
}

impl Merge for Histogram {
    fn merge(&mut self, other: &Histogram) {
        self.absorb(&other.bins);
    }
}

impl Extend<f64> for Histogram {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for x in iter {
            self.update(x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::prelude::*;

    fn hist(capacity: usize, xs: &[f64]) -> Histogram {
        let mut h = Histogram::new(capacity).unwrap();
        h.extend(xs.iter().copied());
        h
    }

    #[test]
    fn capacity_two() {
        let h = hist(2, &[1., 2., 3.]);
        assert_eq!(
            h.bins(),
            &[
                Bin {
                    value: 1.5,
                    weight: 2
                },
                Bin {
                    value: 3.,
                    weight: 1
                },
            ]
        );
        let median = h.quantile(0.5).unwrap();
        assert!((1. ..=3.).contains(&median));
        assert_abs_diff_eq!(median, 2., epsilon = 1e-12);
    }

    #[test]
    fn repeated_values_share_a_bin() {
        let h = hist(10, &[5., 5., 5., 2.]);
        assert_eq!(
            h.bins(),
            &[
                Bin {
                    value: 2.,
                    weight: 1
                },
                Bin {
                    value: 5.,
                    weight: 3
                },
            ]
        );
        assert_eq!(h.count(), 4);
    }

    #[test]
    fn ties_collapse_the_lowest_pair() {
        let h = hist(3, &[0., 1., 2., 3.]);
        assert_eq!(
            h.bins().iter().map(|b| b.value).collect::<Vec<_>>(),
            vec![0.5, 2., 3.]
        );
    }

    #[test]
    fn never_over_capacity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut h = Histogram::new(17).unwrap();
        for _ in 0..2000 {
            h.update(rng.gen_range(0.0..100.0));
            assert!(h.bins().len() <= 17);
        }
        let other = hist(
            40,
            &(0..300).map(|_| rng.gen_range(-50.0..50.0)).collect::<Vec<_>>(),
        );
        h.merge(&other);
        assert!(h.bins().len() <= 17);
        assert_eq!(h.count(), 2300);
        assert!(h.bins().windows(2).all(|w| w[0].value < w[1].value));
    }

    #[test]
    fn empty() {
        let h = Histogram::default();
        assert_eq!(h.capacity(), DEFAULT_CAPACITY);
        assert_eq!(h.quantile(0.5), Err(Error::EmptyHistogram));
        assert_eq!(Histogram::new(0), Err(Error::ZeroCapacity));
    }

    #[test]
    fn out_of_range() {
        let h = hist(5, &[1., 2.]);
        assert_eq!(h.quantile(-0.1), Err(Error::QuantileOutOfRange(-0.1)));
        assert_eq!(h.quantile(1.5), Err(Error::QuantileOutOfRange(1.5)));
        assert!(h.quantile(f64::NAN).is_err());
    }

    #[test]
    fn single_bin() {
        let h = hist(5, &[7., 7., 7.]);
        for q in [0., 0.1, 0.5, 0.9, 1.] {
            assert_eq!(h.quantile(q).unwrap(), 7.);
        }
    }

    #[test]
    fn boundaries_and_monotonicity() {
        let mut rng = StdRng::seed_from_u64(2);
        let h = hist(
            50,
            &(0..5000)
                .map(|_| rng.gen_range(0.0f64..1.0).powi(3))
                .collect::<Vec<_>>(),
        );
        assert_eq!(h.quantile(0.).unwrap(), h.bins()[0].value);
        assert_eq!(h.quantile(1.).unwrap(), h.bins()[h.bins().len() - 1].value);
        let mut last = f64::NEG_INFINITY;
        for i in 0..=1000 {
            let x = h.quantile(f64::from(i) / 1000.).unwrap();
            assert!(x >= last, "quantile decreased at {}", i);
            last = x;
        }
    }

    #[test]
    fn interpolation() {
        // cumsums = [0, 0.5, 1.5, 3, 4]
        let h = hist(10, &[10., 20., 30., 30.]);
        assert_eq!(h.quantile(0.1).unwrap(), 10.);
        // target = 1, halfway from the first bin to the second
        assert_relative_eq!(h.quantile(0.25).unwrap(), 15.);
        // target = 1.5, exactly at the second bin
        assert_relative_eq!(h.quantile(0.375).unwrap(), 20.);
        // target = 2.25, halfway from the second bin to the third
        assert_relative_eq!(h.quantile(0.5625).unwrap(), 25.);
        assert_eq!(h.quantile(0.9).unwrap(), 30.);
    }

    #[test]
    fn absorb_is_symmetric() {
        let xs = [1., 4., 4., 9., 16., 25.];
        let ys = [4., 2., 30., 31., 0.5];
        let mut a = hist(4, &xs);
        a.merge(&hist(4, &ys));
        let mut b = hist(4, &ys);
        b.merge(&hist(4, &xs));
        assert_eq!(a, b);
    }

    #[test]
    fn absorbed_duplicates_share_a_bin() {
        let mut a = hist(10, &[1., 3.]);
        a.merge(&hist(10, &[1., 5.]));
        assert_eq!(
            a.bins(),
            &[
                Bin { value: 1., weight: 2 },
                Bin { value: 3., weight: 1 },
                Bin { value: 5., weight: 1 },
            ]
        );
        // Same as feeding all four values to one histogram
        assert_eq!(a, hist(10, &[1., 3., 1., 5.]));
    }

    #[test]
    fn merge_with_room_to_spare_is_exact() {
        let mut rng = StdRng::seed_from_u64(3);
        let values = (0..200)
            .map(|_| f64::from(rng.gen_range(0..60)))
            .collect::<Vec<_>>();
        let direct = hist(100, &values);

        for k in [2, 5, 13] {
            let mut parts = vec![Histogram::default(); k];
            for &x in &values {
                parts[rng.gen_range(0..k)].update(x);
            }
            parts.shuffle(&mut rng);
            let mut merged = Histogram::default();
            for part in &parts {
                merged.merge(part);
            }
            assert_eq!(merged, direct);
            for q in [0., 0.1, 0.25, 0.5, 0.9, 1.] {
                assert_eq!(merged.quantile(q).unwrap(), direct.quantile(q).unwrap());
            }
        }
    }

    #[test]
    fn merged_quantiles_stay_close() {
        let mut rng = StdRng::seed_from_u64(4);
        let values = (0..20_000)
            .map(|_| rng.gen_range(0.0..1000.0))
            .collect::<Vec<f64>>();
        let direct = hist(100, &values);
        let mut merged = Histogram::default();
        for chunk in values.chunks(3000) {
            merged.merge(&hist(100, chunk));
        }
        assert_eq!(merged.count(), direct.count());
        for q in [0.1, 0.25, 0.5, 0.75, 0.9] {
            let (m, d) = (merged.quantile(q).unwrap(), direct.quantile(q).unwrap());
            assert!((m - d).abs() < 30., "q={}: {} vs {}", q, m, d);
            assert!((m - q * 1000.).abs() < 40., "q={}: {}", q, m);
        }
    }

    #[test]
    fn merging_an_empty_histogram() {
        let h = hist(5, &[1., 2., 3.]);
        let mut x = h.clone();
        x.merge(&Histogram::default());
        assert_eq!(x, h);
        let mut empty = Histogram::default();
        empty.merge(&Histogram::default());
        assert!(empty.is_empty());
    }
}
