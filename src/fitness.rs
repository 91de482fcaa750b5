//! Scoring a population with a weighted sum of named components.

use crate::bundle::AccumulatorBundle;
use anyhow::{anyhow, Context, Result};
use life_stats::{Histogram, SummaryStats};
use log::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    ConsumptionAvgLifetime,
    ConsumptionAvgWorking,
    ConsumptionAvgRetired,
    ConsumptionAvgRetiredPreDisability,
    ConsumptionDiscountedLifetime,
    Consumption10PctLifetime,
    Consumption20PctLifetime,
    ConsumptionMedianLifetime,
    Consumption10PctRetired,
    Consumption20PctRetired,
    ConsumptionMedianRetired,
    StdConsumptionLifetime,
    StdConsumptionWorking,
    StdConsumptionRetired,
    EarningsAvgLateWorking,
    FractionPersonsRuined,
    FractionRetirementYearsRuined,
    FractionRetirementYearsBelowYMPE,
    FractionRetirementYearsBelowTwiceYMPE,
    FractionRetireesReceivingGIS,
    FractionRetirementYearsReceivingGIS,
    AverageBenefitsGIS,
    FractionRetireesEverBelowLICO,
    FractionRetirementYearsBelowLICO,
    AverageLICOGapWorking,
    AverageLICOGapRetired,
    FractionPersonsWithWithdrawalsBelowRetirementAssets,
    FractionRetireesWithWithdrawalsBelowRetirementAssets,
    AverageLifetimeWithdrawalsLessSavings,
    ConsumptionAvgRetirementBelowFractionAvgWorking,
    AverageDistributableEstate,
}

use Component::*;

/// Where a component's value comes from
enum Source<'a> {
    Mean(&'a SummaryStats),
    StdDev(&'a SummaryStats),
    Quantile(&'a Histogram, f64),
}

impl Component {
    /// Every component, in report order
    pub const ALL: [Component; 31] = [
        ConsumptionAvgLifetime,
        ConsumptionAvgWorking,
        ConsumptionAvgRetired,
        ConsumptionAvgRetiredPreDisability,
        ConsumptionDiscountedLifetime,
        Consumption10PctLifetime,
        Consumption20PctLifetime,
        ConsumptionMedianLifetime,
        Consumption10PctRetired,
        Consumption20PctRetired,
        ConsumptionMedianRetired,
        StdConsumptionLifetime,
        StdConsumptionWorking,
        StdConsumptionRetired,
        EarningsAvgLateWorking,
        FractionPersonsRuined,
        FractionRetirementYearsRuined,
        FractionRetirementYearsBelowYMPE,
        FractionRetirementYearsBelowTwiceYMPE,
        FractionRetireesReceivingGIS,
        FractionRetirementYearsReceivingGIS,
        AverageBenefitsGIS,
        FractionRetireesEverBelowLICO,
        FractionRetirementYearsBelowLICO,
        AverageLICOGapWorking,
        AverageLICOGapRetired,
        FractionPersonsWithWithdrawalsBelowRetirementAssets,
        FractionRetireesWithWithdrawalsBelowRetirementAssets,
        AverageLifetimeWithdrawalsLessSavings,
        ConsumptionAvgRetirementBelowFractionAvgWorking,
        AverageDistributableEstate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConsumptionAvgLifetime => "ConsumptionAvgLifetime",
            ConsumptionAvgWorking => "ConsumptionAvgWorking",
            ConsumptionAvgRetired => "ConsumptionAvgRetired",
            ConsumptionAvgRetiredPreDisability => "ConsumptionAvgRetiredPreDisability",
            ConsumptionDiscountedLifetime => "ConsumptionDiscountedLifetime",
            Consumption10PctLifetime => "Consumption10PctLifetime",
            Consumption20PctLifetime => "Consumption20PctLifetime",
            ConsumptionMedianLifetime => "ConsumptionMedianLifetime",
            Consumption10PctRetired => "Consumption10PctRetired",
            Consumption20PctRetired => "Consumption20PctRetired",
            ConsumptionMedianRetired => "ConsumptionMedianRetired",
            StdConsumptionLifetime => "StdConsumptionLifetime",
            StdConsumptionWorking => "StdConsumptionWorking",
            StdConsumptionRetired => "StdConsumptionRetired",
            EarningsAvgLateWorking => "EarningsAvgLateWorking",
            FractionPersonsRuined => "FractionPersonsRuined",
            FractionRetirementYearsRuined => "FractionRetirementYearsRuined",
            FractionRetirementYearsBelowYMPE => "FractionRetirementYearsBelowYMPE",
            FractionRetirementYearsBelowTwiceYMPE => "FractionRetirementYearsBelowTwiceYMPE",
            FractionRetireesReceivingGIS => "FractionRetireesReceivingGIS",
            FractionRetirementYearsReceivingGIS => "FractionRetirementYearsReceivingGIS",
            AverageBenefitsGIS => "AverageBenefitsGIS",
            FractionRetireesEverBelowLICO => "FractionRetireesEverBelowLICO",
            FractionRetirementYearsBelowLICO => "FractionRetirementYearsBelowLICO",
            AverageLICOGapWorking => "AverageLICOGapWorking",
            AverageLICOGapRetired => "AverageLICOGapRetired",
            FractionPersonsWithWithdrawalsBelowRetirementAssets => {
                "FractionPersonsWithWithdrawalsBelowRetirementAssets"
            }
            FractionRetireesWithWithdrawalsBelowRetirementAssets => {
                "FractionRetireesWithWithdrawalsBelowRetirementAssets"
            }
            AverageLifetimeWithdrawalsLessSavings => "AverageLifetimeWithdrawalsLessSavings",
            ConsumptionAvgRetirementBelowFractionAvgWorking => {
                "ConsumptionAvgRetirementBelowFractionAvgWorking"
            }
            AverageDistributableEstate => "AverageDistributableEstate",
        }
    }

    fn source(self, acc: &AccumulatorBundle) -> Source<'_> {
        use Source::*;
        match self {
            ConsumptionAvgLifetime => Mean(&acc.lifetime_consumption_summary),
            ConsumptionAvgWorking => Mean(&acc.working_consumption_summary),
            ConsumptionAvgRetired => Mean(&acc.retired_consumption_summary),
            ConsumptionAvgRetiredPreDisability => {
                Mean(&acc.pre_disability_retired_consumption_summary)
            }
            ConsumptionDiscountedLifetime => Mean(&acc.discounted_lifetime_consumption_summary),
            Consumption10PctLifetime => Quantile(&acc.lifetime_consumption_hist, 0.1),
            Consumption20PctLifetime => Quantile(&acc.lifetime_consumption_hist, 0.2),
            ConsumptionMedianLifetime => Quantile(&acc.lifetime_consumption_hist, 0.5),
            Consumption10PctRetired => Quantile(&acc.retired_consumption_hist, 0.1),
            Consumption20PctRetired => Quantile(&acc.retired_consumption_hist, 0.2),
            ConsumptionMedianRetired => Quantile(&acc.retired_consumption_hist, 0.5),
            StdConsumptionLifetime => StdDev(&acc.lifetime_consumption_summary),
            StdConsumptionWorking => StdDev(&acc.working_consumption_summary),
            StdConsumptionRetired => StdDev(&acc.retired_consumption_summary),
            EarningsAvgLateWorking => Mean(&acc.earnings_late_working_summary),
            FractionPersonsRuined => Mean(&acc.fraction_persons_ruined),
            FractionRetirementYearsRuined => Mean(&acc.fraction_retirement_years_ruined),
            FractionRetirementYearsBelowYMPE => Mean(&acc.fraction_retirement_years_below_ympe),
            FractionRetirementYearsBelowTwiceYMPE => {
                Mean(&acc.fraction_retirement_years_below_twice_ympe)
            }
            FractionRetireesReceivingGIS => Mean(&acc.fraction_retirees_receiving_gis),
            FractionRetirementYearsReceivingGIS => {
                Mean(&acc.fraction_retirement_years_receiving_gis)
            }
            AverageBenefitsGIS => Mean(&acc.benefits_gis),
            FractionRetireesEverBelowLICO => Mean(&acc.fraction_retirees_ever_below_lico),
            FractionRetirementYearsBelowLICO => Mean(&acc.fraction_retirement_years_below_lico),
            AverageLICOGapWorking => Mean(&acc.lico_gap_working),
            AverageLICOGapRetired => Mean(&acc.lico_gap_retired),
            FractionPersonsWithWithdrawalsBelowRetirementAssets => {
                Mean(&acc.fraction_persons_with_withdrawals_below_retirement_assets)
            }
            FractionRetireesWithWithdrawalsBelowRetirementAssets => {
                Mean(&acc.fraction_retirees_with_withdrawals_below_retirement_assets)
            }
            AverageLifetimeWithdrawalsLessSavings => Mean(&acc.lifetime_withdrawals_less_savings),
            ConsumptionAvgRetirementBelowFractionAvgWorking => {
                Mean(&acc.retirement_consumption_less_working_consumption)
            }
            AverageDistributableEstate => Mean(&acc.distributable_estate),
        }
    }

    /// This component's value for a population, and its standard error
    /// where that makes sense.
    ///
    /// A quantile of an empty histogram has no value; it comes out as NaN.
    pub fn value(self, acc: &AccumulatorBundle) -> (f64, Option<f64>) {
        match self.source(acc) {
            Source::Mean(x) => (x.mean(), Some(x.stderr())),
            Source::StdDev(x) => (x.stddev(), None),
            Source::Quantile(hist, q) => match hist.quantile(q) {
                Ok(x) => (x, None),
                Err(e) => {
                    warn!("{}: {}", self, e);
                    (f64::NAN, None)
                }
            },
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case, underscores and dashes are ignored, so "fraction_persons_ruined"
/// and "FractionPersonsRuined" name the same component.
impl FromStr for Component {
    type Err = String;
    fn from_str(s: &str) -> Result<Component, String> {
        fn normalize(s: &str) -> String {
            s.chars()
                .filter(|c| *c != '_' && *c != '-')
                .map(|c| c.to_ascii_lowercase())
                .collect()
        }
        let wanted = normalize(s);
        Component::ALL
            .iter()
            .copied()
            .find(|c| normalize(c.name()) == wanted)
            .ok_or_else(|| format!("Unknown fitness component {:?}", s))
    }
}

/// `NAME=WEIGHT`, as given on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSetting(pub Component, pub f64);

impl FromStr for WeightSetting {
    type Err = String;
    fn from_str(s: &str) -> Result<WeightSetting, String> {
        let (name, weight) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected NAME=WEIGHT, got {:?}", s))?;
        let weight = weight
            .trim()
            .parse()
            .map_err(|e| format!("Bad weight for {}: {}", name, e))?;
        Ok(WeightSetting(name.trim().parse()?, weight))
    }
}

/// A weight for every component.  Unset weights are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights([f64; Component::ALL.len()]);

impl Default for Weights {
    fn default() -> Weights {
        Weights([0.; Component::ALL.len()])
    }
}

impl Weights {
    pub fn get(&self, component: Component) -> f64 {
        self.0[component as usize]
    }

    pub fn set(&mut self, component: Component, weight: f64) {
        self.0[component as usize] = weight;
    }

    /// Read weights from a JSON object mapping component names to numbers.
    pub fn from_json(rdr: impl Read) -> Result<Weights> {
        let raw: BTreeMap<String, f64> =
            serde_json::from_reader(rdr).context("Weights should be a JSON object of numbers")?;
        let mut weights = Weights::default();
        for (name, weight) in raw {
            let component = name.parse::<Component>().map_err(|e| anyhow!(e))?;
            weights.set(component, weight);
        }
        Ok(weights)
    }
}

/// One line of the fitness function composition table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionRow {
    pub name: &'static str,
    pub value: f64,
    pub stderr: Option<f64>,
    pub weight: f64,
    pub contribution: f64,
}

pub fn composition(acc: &AccumulatorBundle, weights: &Weights) -> Vec<CompositionRow> {
    Component::ALL
        .iter()
        .map(|&component| {
            let (value, stderr) = component.value(acc);
            let weight = weights.get(component);
            // An unweighted component doesn't count, even if it's undefined
            let contribution = if weight == 0. { 0. } else { weight * value };
            CompositionRow {
                name: component.name(),
                value,
                stderr,
                weight,
                contribution,
            }
        })
        .collect()
}

pub fn fitness(rows: &[CompositionRow]) -> f64 {
    rows.iter().map(|row| row.contribution).sum()
}
