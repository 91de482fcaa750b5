use crate::{Merge, SummaryStats};
use std::collections::BTreeMap;

/// A `SummaryStats` per category, plus one across all categories.
///
/// Summaries for a subset of categories are built on demand by merging the
/// per-category summaries, so any subset can be asked for after the fact.
#[derive(Clone, Debug, PartialEq)]
pub struct Categorized<K: Ord> {
    by_tag: BTreeMap<K, SummaryStats>,
    all: SummaryStats,
}

impl<K: Ord> Default for Categorized<K> {
    fn default() -> Categorized<K> {
        Categorized {
            by_tag: BTreeMap::new(),
            all: SummaryStats::default(),
        }
    }
}

impl<K: Ord + Copy> Categorized<K> {
    pub fn update(&mut self, tag: K, value: f64) {
        self.by_tag.entry(tag).or_default().update(value);
        self.all.update(value);
    }

    /// Record that `tag` occurred, for breakdowns where only the count
    /// matters.
    pub fn tally(&mut self, tag: K) {
        self.update(tag, 1.);
    }

    /// A summary of the values recorded under any of `tags`.
    pub fn query(&self, tags: &[K]) -> SummaryStats {
        let mut ret = SummaryStats::default();
        for tag in tags {
            if let Some(stats) = self.by_tag.get(tag) {
                ret.merge(stats);
            }
        }
        ret
    }

    pub fn get(&self, tag: K) -> SummaryStats {
        self.by_tag.get(&tag).copied().unwrap_or_default()
    }

    /// A summary of every value recorded, whatever its category.
    pub fn all(&self) -> &SummaryStats {
        &self.all
    }

    pub fn tags(&self) -> impl Iterator<Item = K> + '_ {
        self.by_tag.keys().copied()
    }
}

impl<K: Ord + Copy> Merge for Categorized<K> {
    fn merge(&mut self, other: &Categorized<K>) {
        for (tag, stats) in &other.by_tag {
            self.by_tag.entry(*tag).or_default().merge(stats);
        }
        self.all.merge(&other.all);
    }
}
