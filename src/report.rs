//! The tables printed at the end of a run.
//!
//! Every table is CSV.  In pretty mode the same records are written
//! tab-separated through a `TabWriter`, so the columns line up.

use crate::bundle::AccumulatorBundle;
use crate::fitness::CompositionRow;
use crate::life::{Gender, Strategy};
use crate::period::Period;
use crate::world::World;
use anyhow::Result;
use life_stats::Categorized;
use std::fmt::Display;
use std::io::Write;
use tabwriter::TabWriter;

type Table<'a> = csv::Writer<&'a mut dyn Write>;

pub struct Reporter<W> {
    out: W,
    pretty: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, pretty: bool) -> Reporter<W> {
        Reporter { out, pretty }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn table(&mut self, f: impl FnOnce(&mut Table) -> csv::Result<()>) -> Result<()> {
        if self.pretty {
            let mut tw = TabWriter::new(&mut self.out);
            {
                let mut wtr = csv::WriterBuilder::new()
                    .delimiter(b'\t')
                    .from_writer(&mut tw as &mut dyn Write);
                f(&mut wtr)?;
                wtr.flush()?;
            }
            tw.flush()?;
        } else {
            let mut wtr = csv::Writer::from_writer(&mut self.out as &mut dyn Write);
            f(&mut wtr)?;
            wtr.flush()?;
        }
        Ok(())
    }

    /// The blank line between two tables
    pub fn gap(&mut self) -> Result<()> {
        writeln!(self.out)?;
        Ok(())
    }

    pub fn summary(
        &mut self,
        gender: Gender,
        group_size: usize,
        world: &World,
        acc: &AccumulatorBundle,
        fitness: f64,
    ) -> Result<()> {
        let replacement_rate = acc.period_consumption.query(&Period::RETIRED).mean()
            / acc.period_consumption.query(&Period::WORKING).mean();
        let mean_rows = [
            ("Age at Death", &acc.age_at_death),
            ("Average Years Worked", &acc.years_worked_with_earnings),
            ("Average Earnings Per Year Worked", &acc.earnings_working),
            (
                "Fraction of Persons Retiring Involuntarily",
                &acc.fraction_persons_involuntarily_retired,
            ),
            (
                "Fraction of Persons Dying Before Retiring",
                &acc.fraction_persons_dying_before_retiring,
            ),
            ("Average Annual Consumption", &acc.lifetime_consumption_summary),
            (
                "Average Annual EI/CPP Deductions in Working Period",
                &acc.working_annual_ei_cpp_deductions,
            ),
            ("Average Annual Taxes in Working Period", &acc.working_taxes),
            ("Average Annual Taxes in Retirement Period", &acc.retirement_taxes),
            ("Average Years with Positive Savings", &acc.positive_savings_years),
            ("Average Fraction of Earnings Saved", &acc.fraction_earnings_saved),
            ("Average Years Receiving EI Benefits", &acc.years_receiving_ei),
            ("Average Positive EI Benefits Received", &acc.positive_ei_benefits),
            ("Average Years Receiving GIS Benefits", &acc.years_receiving_gis),
            ("Average Positive GIS Benefits Level", &acc.positive_gis_benefits),
            ("Average Positive CPP Benefits Level", &acc.positive_cpp_benefits),
            ("Average Years Gross Income Below LICO", &acc.years_income_below_lico),
            (
                "Average Years with No Financial Assets at BoY",
                &acc.years_with_no_assets,
            ),
        ];
        self.table(|wtr| {
            let mut row = |name: &str, value: &dyn Display| {
                wtr.write_record([name, value.to_string().as_str()])
            };
            row("name", &"value")?;
            row("Gender", &gender)?;
            row("Start Age", &world.start_age)?;
            row("Group Size", &group_size)?;
            row("Real Return on Investments", &world.mean_investment_return)?;
            row("Fitness Function Value", &fitness)?;
            for (name, stats) in mean_rows {
                row(name, &stats.mean())?;
            }
            row("Replacement Rate (Consumption Basis)", &replacement_rate)
        })
    }

    pub fn strategy(&mut self, strategy: &Strategy) -> Result<()> {
        self.table(|wtr| {
            let mut row = |name: &str, value: &dyn Display| {
                wtr.write_record([name, value.to_string().as_str()])
            };
            row("parameter", &"value")?;
            row("Planned Retirement Age", &strategy.planned_retirement_age)?;
            row("Savings Threshold", &strategy.savings_threshold)?;
            row("Savings Rate", &strategy.savings_rate)?;
            row("Savings RRSP Fraction", &strategy.savings_rrsp_fraction)?;
            row("Savings TFSA Fraction", &strategy.savings_tfsa_fraction)?;
            row("Initial CD Fraction", &strategy.initial_cd_fraction)?;
            row(
                "Drawdown Preferred RRSP Fraction",
                &strategy.drawdown_preferred_rrsp_fraction,
            )
        })
    }

    pub fn composition(&mut self, rows: &[CompositionRow]) -> Result<()> {
        self.table(|wtr| {
            for row in rows {
                wtr.serialize(row)?;
            }
            Ok(())
        })
    }

    /// Per-period averages: over the whole life, then for each period.
    pub fn periods(&mut self, acc: &AccumulatorBundle) -> Result<()> {
        let rows = [
            ("Earnings", &acc.period_earnings),
            ("CPP benefits", &acc.period_cpp_benefits),
            ("OAS benefits", &acc.period_oas_benefits),
            ("Taxable capital gains", &acc.period_taxable_gains),
            ("GIS benefits", &acc.period_gis_benefits),
            ("Social benefits repaid", &acc.period_social_benefits_repaid),
            ("RRSP withdrawals", &acc.period_rrsp_withdrawals),
            ("TFSA withdrawals", &acc.period_tfsa_withdrawals),
            ("Nonregistered withdrawals", &acc.period_nonreg_withdrawals),
            ("CPP contributions", &acc.period_cpp_contributions),
            ("EI premiums", &acc.period_ei_premiums),
            ("Taxable income", &acc.period_taxable_income),
            ("Income tax", &acc.period_income_tax),
            ("Sales tax", &acc.period_sales_tax),
            ("Consumption", &acc.period_consumption),
            ("RRSP savings", &acc.period_rrsp_savings),
            ("TFSA savings", &acc.period_tfsa_savings),
            ("Nonregistered savings", &acc.period_nonreg_savings),
            ("Fund Growth", &acc.period_fund_growth),
            ("Gross Estate", &acc.period_gross_estate),
            ("Estate Taxes", &acc.period_estate_taxes),
            ("Executor and Funeral Cost", &acc.period_executor_funeral_costs),
            ("Distributable Estate", &acc.period_distributable_estate),
        ];
        fn record(name: &str, lifetime: Option<f64>, by_period: &Categorized<Period>) -> Vec<String> {
            let mut record = vec![name.to_string(), lifetime.map_or(String::new(), |x| x.to_string())];
            record.extend(Period::ALL.iter().map(|&p| by_period.get(p).mean().to_string()));
            record
        }
        self.table(|wtr| {
            let mut header = vec!["name".to_string(), "lifetime".to_string()];
            header.extend(Period::ALL.iter().map(|p| p.to_string()));
            wtr.write_record(&header)?;
            // Years per person don't add up to anything meaningful when
            // averaged over the lifetime
            wtr.write_record(&record("Simulated years", None, &acc.period_years))?;
            for (name, by_period) in rows {
                let lifetime = by_period.query(&Period::ALL).mean();
                wtr.write_record(&record(name, Some(lifetime), by_period))?;
            }
            Ok(())
        })
    }

    /// Per-age averages over the people alive at that age.
    pub fn ages(&mut self, world: &World, acc: &AccumulatorBundle) -> Result<()> {
        let columns: [(&str, &Categorized<u32>); 14] = [
            ("Gross Earnings", &acc.gross_earnings_by_age),
            ("Income Tax", &acc.income_tax_by_age),
            ("EI Premiums", &acc.ei_premium_by_age),
            ("CPP Contrib", &acc.cpp_contributions_by_age),
            ("Sales Tax", &acc.sales_tax_by_age),
            ("EI Benefits", &acc.ei_benefits_by_age),
            ("CPP Benefits", &acc.cpp_benefits_by_age),
            ("OAS Benefits", &acc.oas_benefits_by_age),
            ("GIS Benefits", &acc.gis_benefits_by_age),
            ("Total Savings", &acc.savings_by_age),
            ("RRSP Withdrawals", &acc.rrsp_withdrawals_by_age),
            ("TFSA Withdrawals", &acc.tfsa_withdrawals_by_age),
            ("Non Registered Withdrawals", &acc.nonreg_withdrawals_by_age),
            ("Consumption", &acc.consumption_by_age),
        ];
        self.table(|wtr| {
            let header = ["age", "Persons"]
                .into_iter()
                .chain(columns.iter().map(|(name, _)| *name));
            wtr.write_record(header)?;
            for age in world.start_age..=world.max_age {
                let persons = acc.persons_alive_by_age.get(age).count();
                let mut record = vec![age.to_string(), persons.to_string()];
                record.extend(
                    columns
                        .iter()
                        .map(|(_, by_age)| by_age.get(age).mean().to_string()),
                );
                wtr.write_record(&record)?;
            }
            Ok(())
        })
    }
}
