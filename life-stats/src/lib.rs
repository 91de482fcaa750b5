/*! Streaming summaries which can be computed in pieces and merged.

Every accumulator in this crate can be fed one observation at a time, and
two accumulators built independently (eg. on different threads) can be
merged into one.  The merged result is the same, up to floating-point
rounding, as if all the observations had been fed to a single accumulator.

## Example

```
# use life_stats::*;
let mut x = SummaryStats::default();
x.extend(vec![10., 20.]);
let mut y = SummaryStats::default();
y.update(30.);

x.merge(&y);
assert_eq!(x.count(), 3);
assert_eq!(x.mean(), 20.);
assert_eq!(x.variance(), 100.);

let mut hist = Histogram::new(2).unwrap();
hist.extend(vec![1., 2., 3.]);
assert_eq!(hist.bins().len(), 2);
let median = hist.quantile(0.5).unwrap();
assert!(1. <= median && median <= 3.);
```

*/

mod categorized;
mod histogram;
mod summary;

pub use categorized::*;
pub use histogram::*;
pub use summary::*;

/// Folding one partial result into another.
///
/// `a.merge(&b)` must leave `a` in the state it would have reached had it
/// also seen every observation `b` saw.  `b` is not modified.
pub trait Merge {
    fn merge(&mut self, other: &Self);
}

impl Merge for u64 {
    fn merge(&mut self, other: &u64) {
        *self += *other;
    }
}

impl Merge for f64 {
    fn merge(&mut self, other: &f64) {
        *self += *other;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    QuantileOutOfRange(f64),
    EmptyHistogram,
    ZeroCapacity,
}

use std::fmt;
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::QuantileOutOfRange(q) => write!(
                f,
                "quantile should be a number between 0 and 1, inclusive (got {})",
                q
            ),
            Error::EmptyHistogram => f.write_str("Can't compute a quantile of an empty histogram"),
            Error::ZeroCapacity => f.write_str("A histogram needs room for at least one bin"),
        }
    }
}
impl std::error::Error for Error {}
