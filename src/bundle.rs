use crate::life::LifeRecord;
use crate::period::Period;
use crate::world::World;
use life_stats::{Categorized, Histogram, Merge, SummaryStats};

/// Declares the bundle struct and derives its `Merge` impl from the field
/// list, so that a field can't be added without also being merged.
macro_rules! accumulators {
    (
        $(#[$attr:meta])*
        pub struct $name:ident {
            $($(#[$fattr:meta])* pub $field:ident: $ty:ty,)*
        }
    ) => {
        $(#[$attr])*
        pub struct $name {
            $($(#[$fattr])* pub $field: $ty,)*
        }

        impl Merge for $name {
            fn merge(&mut self, other: &$name) {
                $(self.$field.merge(&other.$field);)*
            }
        }

        #[cfg(test)]
        impl $name {
            /// How much has gone into each field, by name.
            fn tallies(&self) -> Vec<(&'static str, f64)> {
                vec![$((stringify!($field), tests::Tally::tally(&self.$field)),)*]
            }
        }
    };
}

accumulators! {
    /// Everything we want to know about a population, in mergeable form.
    ///
    /// One of these is filled per simulated life, per worker, and finally
    /// for the whole population.
    #[derive(Clone, Debug, Default)]
    pub struct AccumulatorBundle {
        // Consumption, per person-year
        pub lifetime_consumption_summary: SummaryStats,
        pub lifetime_consumption_hist: Histogram,
        pub working_consumption_summary: SummaryStats,
        pub working_consumption_hist: Histogram,
        pub retired_consumption_summary: SummaryStats,
        pub retired_consumption_hist: Histogram,
        pub pre_disability_retired_consumption_summary: SummaryStats,
        /// Discounted to the base year
        pub discounted_lifetime_consumption_summary: SummaryStats,
        pub earnings_late_working_summary: SummaryStats,

        // Other fitness function inputs.  "fraction_persons_*" and
        // "fraction_retirees_*" get one 0/1 value per person,
        // "fraction_*_years_*" one 0/1 value per year.
        pub fraction_persons_ruined: SummaryStats,
        pub fraction_retirement_years_ruined: SummaryStats,
        pub fraction_retirement_years_below_ympe: SummaryStats,
        pub fraction_retirement_years_below_twice_ympe: SummaryStats,
        pub fraction_retirees_receiving_gis: SummaryStats,
        pub fraction_retirement_years_receiving_gis: SummaryStats,
        pub benefits_gis: SummaryStats,
        pub fraction_retirees_ever_below_lico: SummaryStats,
        pub fraction_retirement_years_below_lico: SummaryStats,
        pub lico_gap_working: SummaryStats,
        pub lico_gap_retired: SummaryStats,
        pub fraction_persons_with_withdrawals_below_retirement_assets: SummaryStats,
        pub fraction_retirees_with_withdrawals_below_retirement_assets: SummaryStats,
        pub lifetime_withdrawals_less_savings: SummaryStats,
        pub retirement_consumption_less_working_consumption: SummaryStats,
        pub distributable_estate: SummaryStats,

        // Summary report
        pub age_at_death: SummaryStats,
        pub years_worked_with_earnings: SummaryStats,
        pub earnings_working: SummaryStats,
        pub fraction_persons_involuntarily_retired: SummaryStats,
        pub fraction_persons_dying_before_retiring: SummaryStats,
        pub working_annual_ei_cpp_deductions: SummaryStats,
        pub working_taxes: SummaryStats,
        pub retirement_taxes: SummaryStats,
        pub positive_savings_years: SummaryStats,
        pub fraction_earnings_saved: SummaryStats,
        pub years_receiving_ei: SummaryStats,
        pub positive_ei_benefits: SummaryStats,
        pub years_receiving_gis: SummaryStats,
        pub positive_gis_benefits: SummaryStats,
        pub positive_cpp_benefits: SummaryStats,
        pub years_income_below_lico: SummaryStats,
        pub years_with_no_assets: SummaryStats,

        // Per-period report
        /// Years spent in each period, per person
        pub period_years: Categorized<Period>,
        pub period_earnings: Categorized<Period>,
        pub period_cpp_benefits: Categorized<Period>,
        pub period_oas_benefits: Categorized<Period>,
        pub period_taxable_gains: Categorized<Period>,
        pub period_gis_benefits: Categorized<Period>,
        pub period_social_benefits_repaid: Categorized<Period>,
        pub period_rrsp_withdrawals: Categorized<Period>,
        pub period_tfsa_withdrawals: Categorized<Period>,
        pub period_nonreg_withdrawals: Categorized<Period>,
        pub period_cpp_contributions: Categorized<Period>,
        pub period_ei_premiums: Categorized<Period>,
        pub period_taxable_income: Categorized<Period>,
        pub period_income_tax: Categorized<Period>,
        pub period_sales_tax: Categorized<Period>,
        pub period_consumption: Categorized<Period>,
        pub period_rrsp_savings: Categorized<Period>,
        pub period_tfsa_savings: Categorized<Period>,
        pub period_nonreg_savings: Categorized<Period>,
        pub period_fund_growth: Categorized<Period>,
        /// Estates are filed under the period the person died in
        pub period_gross_estate: Categorized<Period>,
        pub period_estate_taxes: Categorized<Period>,
        pub period_executor_funeral_costs: Categorized<Period>,
        pub period_distributable_estate: Categorized<Period>,

        // Per-age report
        pub persons_alive_by_age: Categorized<u32>,
        pub gross_earnings_by_age: Categorized<u32>,
        pub income_tax_by_age: Categorized<u32>,
        pub ei_premium_by_age: Categorized<u32>,
        pub cpp_contributions_by_age: Categorized<u32>,
        pub sales_tax_by_age: Categorized<u32>,
        pub ei_benefits_by_age: Categorized<u32>,
        pub cpp_benefits_by_age: Categorized<u32>,
        pub oas_benefits_by_age: Categorized<u32>,
        pub gis_benefits_by_age: Categorized<u32>,
        pub savings_by_age: Categorized<u32>,
        pub rrsp_withdrawals_by_age: Categorized<u32>,
        pub tfsa_withdrawals_by_age: Categorized<u32>,
        pub nonreg_withdrawals_by_age: Categorized<u32>,
        pub consumption_by_age: Categorized<u32>,

        // Running totals
        pub persons: u64,
        pub working_years: u64,
        pub retirement_years: u64,
        pub retired_persons: u64,
        pub seniors: u64,
        pub ruined_persons: u64,
        pub gis_received: f64,
        pub distributable_estate_total: f64,
    }
}

fn indicator(x: bool) -> f64 {
    if x {
        1.
    } else {
        0.
    }
}

impl AccumulatorBundle {
    /// Record one year's consumption.  `year` is a calendar year.
    pub fn update_consumption(&mut self, world: &World, consumption: f64, year: i32, is_retired: bool) {
        let discounted_consumption = world.discounted(consumption, year);
        let age = world.age_in(year);

        self.lifetime_consumption_summary.update(consumption);
        self.lifetime_consumption_hist.update(consumption);
        self.discounted_lifetime_consumption_summary
            .update(discounted_consumption);
        if is_retired {
            self.retired_consumption_summary.update(consumption);
            self.retired_consumption_hist.update(consumption);
            if age <= world.pre_disability_age as i32 {
                self.pre_disability_retired_consumption_summary
                    .update(consumption);
            }
        } else {
            self.working_consumption_summary.update(consumption);
            self.working_consumption_hist.update(consumption);
        }
    }

    /// Record everything about one life.
    pub fn record_life(&mut self, life: &LifeRecord, world: &World) {
        let mut years_with_earnings = 0u32;
        let mut savings_years = 0u32;
        let mut ei_years = 0u32;
        let mut gis_years = 0u32;
        let mut below_lico_years = 0u32;
        let mut no_asset_years = 0u32;
        let mut years_in = [0u32; 4];
        let mut total_earnings = 0.;
        let mut total_savings = 0.;
        let mut total_withdrawals = 0.;
        let mut retirement_withdrawals = 0.;
        let mut assets_at_retirement = None;
        let mut ruined = false;
        let mut involuntarily_retired = false;
        let mut retired_with_gis = false;
        let mut retired_below_lico = false;
        let mut working_consumption = SummaryStats::default();
        let mut retired_consumption = SummaryStats::default();

        for rec in &life.years {
            let (age, period) = (rec.age, rec.period);
            let retired = period.is_retired();
            let ympe = world.wage_indexed(world.ympe, rec.year);
            let lico = world.wage_indexed(world.lico, rec.year);
            let income = rec.gross_income();
            let lico_gap = (lico - income).max(0.);

            self.update_consumption(world, rec.consumption, rec.year, retired);

            self.period_earnings.update(period, rec.earnings);
            self.period_cpp_benefits.update(period, rec.cpp_benefits);
            self.period_oas_benefits.update(period, rec.oas_benefits);
            self.period_taxable_gains
                .update(period, rec.taxable_capital_gains);
            self.period_gis_benefits.update(period, rec.gis_benefits);
            self.period_social_benefits_repaid
                .update(period, rec.social_benefits_repaid);
            self.period_rrsp_withdrawals
                .update(period, rec.rrsp_withdrawals);
            self.period_tfsa_withdrawals
                .update(period, rec.tfsa_withdrawals);
            self.period_nonreg_withdrawals
                .update(period, rec.nonreg_withdrawals);
            self.period_cpp_contributions
                .update(period, rec.cpp_contributions);
            self.period_ei_premiums.update(period, rec.ei_premiums);
            self.period_taxable_income.update(period, rec.taxable_income);
            self.period_income_tax.update(period, rec.income_tax);
            self.period_sales_tax.update(period, rec.sales_tax);
            self.period_consumption.update(period, rec.consumption);
            self.period_rrsp_savings.update(period, rec.rrsp_savings);
            self.period_tfsa_savings.update(period, rec.tfsa_savings);
            self.period_nonreg_savings.update(period, rec.nonreg_savings);
            self.period_fund_growth.update(period, rec.fund_growth);

            self.persons_alive_by_age.tally(age);
            self.gross_earnings_by_age.update(age, rec.earnings);
            self.income_tax_by_age.update(age, rec.income_tax);
            self.ei_premium_by_age.update(age, rec.ei_premiums);
            self.cpp_contributions_by_age
                .update(age, rec.cpp_contributions);
            self.sales_tax_by_age.update(age, rec.sales_tax);
            self.ei_benefits_by_age.update(age, rec.ei_benefits);
            self.cpp_benefits_by_age.update(age, rec.cpp_benefits);
            self.oas_benefits_by_age.update(age, rec.oas_benefits);
            self.gis_benefits_by_age.update(age, rec.gis_benefits);
            self.savings_by_age.update(age, rec.savings());
            self.rrsp_withdrawals_by_age
                .update(age, rec.rrsp_withdrawals);
            self.tfsa_withdrawals_by_age
                .update(age, rec.tfsa_withdrawals);
            self.nonreg_withdrawals_by_age
                .update(age, rec.nonreg_withdrawals);
            self.consumption_by_age.update(age, rec.consumption);

            if retired {
                self.retirement_years += 1;
                let year_ruined = rec.assets <= 0.;
                ruined |= year_ruined;
                involuntarily_retired |= period == Period::InvoluntarilyRetired;
                retired_with_gis |= rec.gis_benefits > 0.;
                retired_below_lico |= income < lico;
                assets_at_retirement.get_or_insert(rec.assets);
                retirement_withdrawals += rec.withdrawals();
                retired_consumption.update(rec.consumption);

                self.fraction_retirement_years_ruined
                    .update(indicator(year_ruined));
                self.fraction_retirement_years_below_ympe
                    .update(indicator(rec.assets < ympe));
                self.fraction_retirement_years_below_twice_ympe
                    .update(indicator(rec.assets < 2. * ympe));
                self.fraction_retirement_years_receiving_gis
                    .update(indicator(rec.gis_benefits > 0.));
                self.benefits_gis.update(rec.gis_benefits);
                self.fraction_retirement_years_below_lico
                    .update(indicator(income < lico));
                self.lico_gap_retired.update(lico_gap);
                self.retirement_taxes
                    .update(rec.income_tax + rec.sales_tax);
            } else {
                self.working_years += 1;
                working_consumption.update(rec.consumption);
                self.lico_gap_working.update(lico_gap);
                self.working_annual_ei_cpp_deductions
                    .update(rec.ei_premiums + rec.cpp_contributions);
                self.working_taxes.update(rec.income_tax + rec.sales_tax);
                if rec.earnings > 0. {
                    self.earnings_working.update(rec.earnings);
                }
                if age >= world.late_working_age {
                    self.earnings_late_working_summary.update(rec.earnings);
                }
            }

            if rec.earnings > 0. {
                years_with_earnings += 1;
            }
            if rec.savings() > 0. {
                savings_years += 1;
            }
            if rec.ei_benefits > 0. {
                ei_years += 1;
                self.positive_ei_benefits.update(rec.ei_benefits);
            }
            if rec.gis_benefits > 0. {
                gis_years += 1;
                self.positive_gis_benefits.update(rec.gis_benefits);
            }
            if rec.cpp_benefits > 0. {
                self.positive_cpp_benefits.update(rec.cpp_benefits);
            }
            if income < lico {
                below_lico_years += 1;
            }
            if rec.assets <= 0. {
                no_asset_years += 1;
            }
            years_in[period as usize] += 1;
            total_earnings += rec.earnings;
            total_savings += rec.savings();
            total_withdrawals += rec.withdrawals();
            self.gis_received += rec.gis_benefits;
        }

        self.persons += 1;
        let ever_retired = assets_at_retirement.is_some();
        self.age_at_death.update(f64::from(life.age_at_death));
        self.years_worked_with_earnings
            .update(f64::from(years_with_earnings));
        self.positive_savings_years.update(f64::from(savings_years));
        self.years_receiving_ei.update(f64::from(ei_years));
        self.years_receiving_gis.update(f64::from(gis_years));
        self.years_income_below_lico
            .update(f64::from(below_lico_years));
        self.years_with_no_assets.update(f64::from(no_asset_years));
        if total_earnings > 0. {
            self.fraction_earnings_saved
                .update(total_savings / total_earnings);
        }
        for period in Period::ALL {
            self.period_years
                .update(period, f64::from(years_in[period as usize]));
        }

        self.fraction_persons_ruined.update(indicator(ruined));
        self.fraction_persons_involuntarily_retired
            .update(indicator(involuntarily_retired));
        self.fraction_persons_dying_before_retiring
            .update(indicator(!ever_retired));
        self.lifetime_withdrawals_less_savings
            .update(total_withdrawals - total_savings);
        let underwithdrew =
            assets_at_retirement.map_or(false, |assets| retirement_withdrawals < assets);
        self.fraction_persons_with_withdrawals_below_retirement_assets
            .update(indicator(underwithdrew));
        if ever_retired {
            self.retired_persons += 1;
            self.fraction_retirees_with_withdrawals_below_retirement_assets
                .update(indicator(underwithdrew));
            self.fraction_retirees_receiving_gis
                .update(indicator(retired_with_gis));
            self.fraction_retirees_ever_below_lico
                .update(indicator(retired_below_lico));
        }
        if ruined {
            self.ruined_persons += 1;
        }
        if !working_consumption.is_empty() && !retired_consumption.is_empty() {
            let target = world.replacement_target * working_consumption.mean();
            self.retirement_consumption_less_working_consumption
                .update((target - retired_consumption.mean()).max(0.));
        }
        if life.age_at_death >= world.senior_age {
            self.seniors += 1;
        }

        let estate = &life.estate;
        let distributable = estate.distributable();
        self.distributable_estate.update(distributable);
        self.distributable_estate_total += distributable;
        if let Some(last) = life.years.last() {
            self.period_gross_estate.update(last.period, estate.gross);
            self.period_estate_taxes.update(last.period, estate.taxes);
            self.period_executor_funeral_costs
                .update(last.period, estate.executor_funeral_costs);
            self.period_distributable_estate
                .update(last.period, distributable);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::life::{Estate, YearRecord};
    use approx::assert_relative_eq;

    /// How many observations (or how much, for totals) went into a field
    pub(crate) trait Tally {
        fn tally(&self) -> f64;
    }
    impl Tally for SummaryStats {
        fn tally(&self) -> f64 {
            self.count() as f64
        }
    }
    impl Tally for Histogram {
        fn tally(&self) -> f64 {
            self.count() as f64
        }
    }
    impl<K: Ord + Copy> Tally for Categorized<K> {
        fn tally(&self) -> f64 {
            self.all().count() as f64
        }
    }
    impl Tally for u64 {
        fn tally(&self) -> f64 {
            *self as f64
        }
    }
    impl Tally for f64 {
        fn tally(&self) -> f64 {
            *self
        }
    }

    fn year(world: &World, age: u32, period: Period, consumption: f64) -> YearRecord {
        YearRecord {
            year: world.year_at(age),
            age,
            period,
            consumption,
            ..YearRecord::default()
        }
    }

    /// A life which touches every field: work, spells of unemployment, then
    /// a planned retirement in which the money runs out at 69.
    fn life(world: &World, seed: u32) -> LifeRecord {
        let s = f64::from(seed);
        let mut years = vec![];
        for age in world.start_age..world.start_age + 50 + seed % 7 {
            let period = if age >= 65 {
                Period::Retired
            } else if age % 9 == seed % 9 {
                Period::Unemployed
            } else {
                Period::Employed
            };
            let mut rec = year(world, age, period, 20_000. + s * 1000. + f64::from(age));
            rec.assets = if period.is_retired() {
                (100_000. - f64::from(age - 65) * 30_000.).max(0.)
            } else {
                f64::from(age) * 1000.
            };
            match period {
                Period::Employed => {
                    rec.earnings = 40_000. + s * 500.;
                    rec.rrsp_savings = 2_000.;
                    rec.tfsa_savings = 1_000.;
                    rec.nonreg_savings = 500.;
                    rec.cpp_contributions = 1_800.;
                    rec.ei_premiums = 600.;
                }
                Period::Unemployed => rec.ei_benefits = 15_000.,
                _ => {
                    rec.cpp_benefits = 8_000.;
                    rec.oas_benefits = 7_000.;
                    rec.gis_benefits = if age > 68 { 3_000. } else { 0. };
                    rec.rrsp_withdrawals = 10_000.;
                    rec.tfsa_withdrawals = 2_000.;
                    rec.nonreg_withdrawals = 1_000.;
                    rec.social_benefits_repaid = 100.;
                }
            }
            rec.taxable_income = rec.earnings + rec.rrsp_withdrawals;
            rec.income_tax = 0.2 * rec.taxable_income;
            rec.sales_tax = 0.05 * rec.consumption;
            rec.taxable_capital_gains = 50.;
            rec.fund_growth = 0.03 * rec.assets;
            years.push(rec);
        }
        LifeRecord {
            age_at_death: years.last().map_or(world.start_age, |y| y.age),
            years,
            estate: Estate {
                gross: 50_000. + s,
                taxes: 10_000.,
                executor_funeral_costs: 5_000.,
            },
        }
    }

    #[test]
    fn consumption_routing() {
        let world = World::default();
        let mut acc = AccumulatorBundle::default();
        let working = world.year_at(40);
        let early_retired = world.year_at(world.pre_disability_age);
        let late_retired = world.year_at(world.pre_disability_age + 1);
        acc.update_consumption(&world, 100., working, false);
        acc.update_consumption(&world, 200., early_retired, true);
        acc.update_consumption(&world, 300., late_retired, true);

        assert_eq!(acc.lifetime_consumption_summary.count(), 3);
        assert_eq!(acc.lifetime_consumption_hist.count(), 3);
        assert_eq!(acc.lifetime_consumption_summary.mean(), 200.);
        assert_eq!(acc.working_consumption_summary.count(), 1);
        assert_eq!(acc.working_consumption_hist.count(), 1);
        assert_eq!(acc.retired_consumption_summary.count(), 2);
        assert_eq!(acc.retired_consumption_hist.count(), 2);
        assert_eq!(acc.pre_disability_retired_consumption_summary.count(), 1);
        assert_eq!(acc.pre_disability_retired_consumption_summary.mean(), 200.);
        assert_eq!(acc.discounted_lifetime_consumption_summary.count(), 3);
        let expected = [(100., working), (200., early_retired), (300., late_retired)]
            .iter()
            .map(|&(x, y)| world.discounted(x, y))
            .collect::<SummaryStats>();
        assert_relative_eq!(
            acc.discounted_lifetime_consumption_summary.mean(),
            expected.mean()
        );
        assert!(acc.discounted_lifetime_consumption_summary.mean() < 200.);
    }

    #[test]
    fn consumption_before_the_base_year() {
        let world = World::default();
        let mut acc = AccumulatorBundle::default();
        acc.update_consumption(&world, 100., world.base_year - 1, true);
        acc.update_consumption(&world, 100., world.base_year - 40, false);

        assert_eq!(acc.lifetime_consumption_summary.count(), 2);
        assert_eq!(acc.retired_consumption_summary.count(), 1);
        assert_eq!(acc.working_consumption_summary.count(), 1);
        // Age 21 is well before the pre-disability cut-off
        assert_eq!(acc.pre_disability_retired_consumption_summary.count(), 1);
        assert_relative_eq!(
            acc.discounted_lifetime_consumption_summary.mean(),
            (100. / 0.98 + 100. / 0.98f64.powi(40)) / 2.,
            max_relative = 1e-12
        );
    }

    #[test]
    fn every_field_is_filled() {
        let world = World::default();
        let mut acc = AccumulatorBundle::default();
        for seed in 0..3 {
            acc.record_life(&life(&world, seed), &world);
        }
        for (name, tally) in acc.tallies() {
            assert!(tally > 0., "{} was never updated", name);
        }
    }

    #[test]
    fn merge_equals_direct() {
        let world = World::default();
        let lives = (0..12).map(|s| life(&world, s)).collect::<Vec<_>>();

        let mut direct = AccumulatorBundle::default();
        for l in &lives {
            direct.record_life(l, &world);
        }

        // Three workers, merged in a funny order, each life via its own
        // fresh bundle
        let mut workers = vec![AccumulatorBundle::default(); 3];
        for (i, l) in lives.iter().enumerate() {
            let mut person = AccumulatorBundle::default();
            person.record_life(l, &world);
            workers[i % 3].merge(&person);
        }
        let mut merged = AccumulatorBundle::default();
        for i in [2, 0, 1] {
            merged.merge(&workers[i]);
        }

        for ((name, x), (_, y)) in merged.tallies().into_iter().zip(direct.tallies()) {
            assert_relative_eq!(x, y, max_relative = 1e-12);
            assert!(x > 0., "{} is empty", name);
        }
        let pairs = [
            (&merged.lifetime_consumption_summary, &direct.lifetime_consumption_summary),
            (&merged.retired_consumption_summary, &direct.retired_consumption_summary),
            (&merged.distributable_estate, &direct.distributable_estate),
            (&merged.lico_gap_retired, &direct.lico_gap_retired),
        ];
        for (x, y) in pairs {
            assert_relative_eq!(x.mean(), y.mean(), max_relative = 1e-9);
            assert_relative_eq!(x.variance(), y.variance(), max_relative = 1e-9);
        }
        let (x, y) = (
            merged.period_consumption.query(&Period::RETIRED),
            direct.period_consumption.query(&Period::RETIRED),
        );
        assert_eq!(x.count(), y.count());
        assert_relative_eq!(x.mean(), y.mean(), max_relative = 1e-9);
        assert_eq!(
            merged.persons_alive_by_age.get(70).count(),
            direct.persons_alive_by_age.get(70).count()
        );
        // More distinct values than bins, so the histograms only agree
        // approximately
        for q in [0.1, 0.5, 0.9] {
            assert_relative_eq!(
                merged.lifetime_consumption_hist.quantile(q).unwrap(),
                direct.lifetime_consumption_hist.quantile(q).unwrap(),
                max_relative = 0.05
            );
        }
    }

    #[test]
    fn life_level_metrics() {
        let world = World::default();
        let l = life(&world, 0);
        let mut acc = AccumulatorBundle::default();
        acc.record_life(&l, &world);

        assert_eq!(acc.persons, 1);
        assert_eq!(acc.retired_persons, 1);
        assert_eq!(acc.seniors, 1);
        assert_eq!(acc.age_at_death.mean(), f64::from(l.age_at_death));
        assert_eq!(acc.working_years + acc.retirement_years, l.years.len() as u64);
        // Assets run out at 69
        assert_eq!(acc.fraction_persons_ruined.mean(), 1.);
        assert_eq!(acc.ruined_persons, 1);
        assert_eq!(acc.fraction_persons_dying_before_retiring.mean(), 0.);
        assert_eq!(acc.fraction_retirees_receiving_gis.mean(), 1.);
        assert_eq!(acc.distributable_estate.mean(), 35_000.);
        assert_eq!(acc.distributable_estate_total, 35_000.);
        assert_eq!(
            acc.period_distributable_estate.get(Period::Retired).mean(),
            35_000.
        );
        let years: f64 = Period::ALL
            .iter()
            .map(|&p| acc.period_years.get(p).mean())
            .sum();
        assert_eq!(years, l.years.len() as f64);
        assert_eq!(acc.persons_alive_by_age.get(world.start_age).count(), 1);
    }

    #[test]
    fn merging_empty_bundles() {
        let world = World::default();
        let mut acc = AccumulatorBundle::default();
        acc.record_life(&life(&world, 4), &world);
        let before = acc.tallies();
        acc.merge(&AccumulatorBundle::default());
        assert_eq!(acc.tallies(), before);

        let mut empty = AccumulatorBundle::default();
        empty.merge(&AccumulatorBundle::default());
        assert!(empty.tallies().iter().all(|(_, x)| *x == 0.));
    }
}
