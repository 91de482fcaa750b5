use crate::bundle::AccumulatorBundle;
use crate::life::LifeRecord;
use crate::world::World;
use anyhow::{Context, Result};
use life_stats::Merge;
use log::*;
use rand::prelude::*;
use rayon::prelude::*;
use std::time::Instant;

/// Something which can simulate one life at a time.
///
/// Implementations must be shareable between workers; all per-life state
/// lives on the stack of `live`, and all randomness comes from `rng`.
pub trait LifeModel: Sync {
    fn live(&self, rng: &mut StdRng) -> Result<LifeRecord>;
}

/// Split `n` lives between `units` workers: `n / units` each, with the
/// remainder going to the last one.
pub fn partition(n: usize, units: usize) -> Vec<usize> {
    let units = units.max(1);
    let share = n / units;
    let mut sizes = vec![share; units];
    sizes[units - 1] += n - share * units;
    sizes
}

/// The random stream for one life, chosen by its position in the whole
/// population so that the partitioning doesn't change who gets simulated.
fn life_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Simulate lives `first..first + n` one after another and accumulate them.
pub fn run_worker<M: LifeModel>(
    model: &M,
    world: &World,
    seed: u64,
    first: usize,
    n: usize,
) -> Result<AccumulatorBundle> {
    let mut accumulators = AccumulatorBundle::default();
    for index in first..first + n {
        let mut rng = life_rng(seed, index);
        let life = model
            .live(&mut rng)
            .with_context(|| format!("Simulating life #{}", index))?;
        let mut person = AccumulatorBundle::default();
        person.record_life(&life, world);
        accumulators.merge(&person);
    }
    Ok(accumulators)
}

/// Simulate `n` lives spread over `units` parallel workers, and combine
/// their results.  Any worker failing fails the whole run.
pub fn run_population<M: LifeModel>(
    model: &M,
    world: &World,
    seed: u64,
    n: usize,
    units: usize,
) -> Result<AccumulatorBundle> {
    let sizes = partition(n, units);
    let starts = sizes
        .iter()
        .scan(0, |next, size| {
            let start = *next;
            *next += size;
            Some(start)
        })
        .collect::<Vec<_>>();
    info!("Simulating {} lives across {} workers", n, sizes.len());

    let start_time = Instant::now();
    let sub_accumulators = starts
        .into_par_iter()
        .zip(sizes)
        .enumerate()
        .map(|(worker, (first, size))| {
            let ret = run_worker(model, world, seed, first, size);
            debug!("Worker {} finished {} lives", worker, size);
            ret
        })
        .collect::<Result<Vec<_>>>()?;

    let mut accumulators = AccumulatorBundle::default();
    for sub_accumulator in &sub_accumulators {
        accumulators.merge(sub_accumulator);
    }
    info!(
        "Simulated {} lives in {:.2}s",
        accumulators.persons,
        start_time.elapsed().as_secs_f64()
    );
    Ok(accumulators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::life::{Estate, YearRecord};
    use crate::period::Period;
    use anyhow::bail;
    use approx::assert_relative_eq;

    /// Lives of random length with random consumption
    struct Toy;
    impl LifeModel for Toy {
        fn live(&self, rng: &mut StdRng) -> Result<LifeRecord> {
            let world = World::default();
            let n = rng.gen_range(1..60u32);
            let years = (0..n)
                .map(|i| YearRecord {
                    year: world.base_year + i as i32,
                    age: world.start_age + i,
                    period: if i > 40 {
                        Period::Retired
                    } else {
                        Period::Employed
                    },
                    consumption: rng.gen_range(10_000.0..60_000.0),
                    earnings: rng.gen_range(0.0..80_000.0),
                    ..YearRecord::default()
                })
                .collect::<Vec<_>>();
            Ok(LifeRecord {
                age_at_death: years.last().map_or(world.start_age, |y| y.age),
                years,
                estate: Estate {
                    gross: rng.gen_range(0.0..100_000.0),
                    ..Estate::default()
                },
            })
        }
    }

    struct Failing;
    impl LifeModel for Failing {
        fn live(&self, rng: &mut StdRng) -> Result<LifeRecord> {
            if rng.gen_bool(0.1) {
                bail!("boom");
            }
            Toy.live(rng)
        }
    }

    #[test]
    fn partitions() {
        assert_eq!(partition(10, 3), vec![3, 3, 4]);
        assert_eq!(partition(9, 3), vec![3, 3, 3]);
        assert_eq!(partition(2, 4), vec![0, 0, 0, 2]);
        assert_eq!(partition(5, 0), vec![5]);
        assert_eq!(partition(1000, 7).iter().sum::<usize>(), 1000);
    }

    #[test]
    fn worker_count_doesnt_matter() {
        let world = World::default();
        let one = run_population(&Toy, &world, 5, 500, 1).unwrap();
        for units in [2, 3, 8] {
            let many = run_population(&Toy, &world, 5, 500, units).unwrap();
            assert_eq!(many.persons, one.persons);
            let (a, b) = (
                &many.lifetime_consumption_summary,
                &one.lifetime_consumption_summary,
            );
            assert_eq!(a.count(), b.count());
            assert_relative_eq!(a.mean(), b.mean(), max_relative = 1e-9);
            assert_relative_eq!(a.variance(), b.variance(), max_relative = 1e-9);
            assert_relative_eq!(
                many.distributable_estate.mean(),
                one.distributable_estate.mean(),
                max_relative = 1e-9
            );
            assert_eq!(
                many.lifetime_consumption_hist.count(),
                one.lifetime_consumption_hist.count()
            );
        }
    }

    #[test]
    fn failures_are_fatal() {
        let world = World::default();
        assert!(run_population(&Failing, &world, 1, 200, 4).is_err());
    }

    #[test]
    fn empty_population() {
        let world = World::default();
        let acc = run_population(&Toy, &world, 1, 0, 4).unwrap();
        assert_eq!(acc.persons, 0);
        assert!(acc.lifetime_consumption_summary.is_empty());
    }
}
