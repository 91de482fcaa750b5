//! A deliberately simple stochastic model of one person's financial life.
//!
//! Tax and benefit rules are flat-rate caricatures of the Canadian system;
//! what matters is that every quantity the accumulators look at gets a
//! plausible value.

use crate::period::Period;
use crate::population::LifeModel;
use crate::world::World;
use anyhow::{bail, Context, Result};
use bpaf::Bpaf;
use rand::prelude::*;
use rand_distr::Normal;
use std::fmt;
use std::str::FromStr;

// Base-year dollars unless noted
const BASE_EARNINGS: f64 = 45_000.;
const EARNINGS_SHOCK_STDDEV: f64 = 0.15;
const UNEMPLOYMENT_RATE: f64 = 0.06;
const DISABILITY_RATE: f64 = 0.01;
const DISABILITY_MIN_AGE: u32 = 50;
const EI_REPLACEMENT: f64 = 0.55;
const EI_PREMIUM_RATE: f64 = 0.0163;
const CPP_CONTRIBUTION_RATE: f64 = 0.0495;
const CPP_EXEMPTION: f64 = 3_500.;
const CPP_REPLACEMENT: f64 = 0.25;
const OAS_AMOUNT: f64 = 7_000.;
const OAS_CLAWBACK_THRESHOLD: f64 = 75_000.;
const OAS_CLAWBACK_RATE: f64 = 0.15;
const GIS_MAX: f64 = 10_000.;
const GIS_REDUCTION_RATE: f64 = 0.5;
const BASIC_PERSONAL_AMOUNT: f64 = 11_500.;
const INCOME_TAX_RATE: f64 = 0.25;
const SALES_TAX_RATE: f64 = 0.05;
const CAPITAL_GAINS_INCLUSION: f64 = 0.5;
const ESTATE_RRSP_TAX_RATE: f64 = 0.3;
const EXECUTOR_FUNERAL_BASE: f64 = 5_000.;
const EXECUTOR_FUNERAL_RATE: f64 = 0.03;

/// The savings and drawdown behaviour being scored.
#[derive(Debug, Clone, Copy, PartialEq, Bpaf)]
pub struct Strategy {
    /// Age at which to stop working
    #[bpaf(long("planned-retirement-age"), argument("AGE"), fallback(65))]
    pub planned_retirement_age: u32,
    /// Disposable income below this is never saved
    #[bpaf(long("savings-threshold"), argument("DOLLARS"), fallback(0.))]
    pub savings_threshold: f64,
    /// Fraction of disposable income above the threshold which is saved
    #[bpaf(long("savings-rate"), argument("FRACTION"), fallback(0.1))]
    pub savings_rate: f64,
    /// Fraction of savings deposited into an RRSP
    #[bpaf(long("savings-rrsp-fraction"), argument("FRACTION"), fallback(0.1))]
    pub savings_rrsp_fraction: f64,
    /// Fraction of savings deposited into a TFSA
    #[bpaf(long("savings-tfsa-fraction"), argument("FRACTION"), fallback(0.2))]
    pub savings_tfsa_fraction: f64,
    /// Fraction of assets at retirement withdrawn every retired year
    #[bpaf(long("initial-cd-fraction"), argument("FRACTION"), fallback(0.04))]
    pub initial_cd_fraction: f64,
    /// Fraction of each withdrawal taken from the RRSP first
    #[bpaf(
        long("drawdown-preferred-rrsp-fraction"),
        argument("FRACTION"),
        fallback(0.35)
    )]
    pub drawdown_preferred_rrsp_fraction: f64,
}

impl Default for Strategy {
    fn default() -> Strategy {
        Strategy {
            planned_retirement_age: 65,
            savings_threshold: 0.,
            savings_rate: 0.1,
            savings_rrsp_fraction: 0.1,
            savings_tfsa_fraction: 0.2,
            initial_cd_fraction: 0.04,
            drawdown_preferred_rrsp_fraction: 0.35,
        }
    }
}

impl Strategy {
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("savings rate", self.savings_rate),
            ("savings RRSP fraction", self.savings_rrsp_fraction),
            ("savings TFSA fraction", self.savings_tfsa_fraction),
            ("initial CD fraction", self.initial_cd_fraction),
            ("drawdown preferred RRSP fraction", self.drawdown_preferred_rrsp_fraction),
        ];
        for (name, x) in fractions {
            if !(0. ..=1.).contains(&x) {
                bail!("The {} must be between 0 and 1 (got {})", name, x);
            }
        }
        if self.savings_rrsp_fraction + self.savings_tfsa_fraction > 1. {
            bail!("The RRSP and TFSA savings fractions add up to more than 1");
        }
        if self.savings_threshold < 0. {
            bail!("The savings threshold can't be negative");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl FromStr for Gender {
    type Err = String;
    fn from_str(x: &str) -> Result<Gender, String> {
        match x.to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(Gender::Female),
            "male" | "m" => Ok(Gender::Male),
            _ => Err(format!("Unknown gender {:?} (expected female or male)", x)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Gender::Female => "female",
            Gender::Male => "male",
        })
    }
}

impl Gender {
    /// Gompertz approximation of the probability of dying within the year.
    fn mortality(self, age: u32) -> f64 {
        let a = match self {
            Gender::Female => 0.000_02,
            Gender::Male => 0.000_03,
        };
        (a * (0.095 * f64::from(age)).exp()).min(1.)
    }
}

/// Everything that happened to one person in one simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YearRecord {
    pub year: i32,
    pub age: u32,
    pub period: Period,
    /// Financial assets at the beginning of the year
    pub assets: f64,
    pub earnings: f64,
    pub ei_benefits: f64,
    pub cpp_benefits: f64,
    pub oas_benefits: f64,
    pub gis_benefits: f64,
    pub social_benefits_repaid: f64,
    pub taxable_capital_gains: f64,
    pub rrsp_withdrawals: f64,
    pub tfsa_withdrawals: f64,
    pub nonreg_withdrawals: f64,
    pub rrsp_savings: f64,
    pub tfsa_savings: f64,
    pub nonreg_savings: f64,
    pub cpp_contributions: f64,
    pub ei_premiums: f64,
    pub taxable_income: f64,
    pub income_tax: f64,
    pub sales_tax: f64,
    pub consumption: f64,
    pub fund_growth: f64,
}

impl YearRecord {
    pub fn withdrawals(&self) -> f64 {
        self.rrsp_withdrawals + self.tfsa_withdrawals + self.nonreg_withdrawals
    }

    pub fn savings(&self) -> f64 {
        self.rrsp_savings + self.tfsa_savings + self.nonreg_savings
    }

    /// Income from all sources before tax, net of repaid benefits.
    pub fn gross_income(&self) -> f64 {
        self.earnings
            + self.ei_benefits
            + self.cpp_benefits
            + self.oas_benefits
            + self.gis_benefits
            - self.social_benefits_repaid
            + self.withdrawals()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estate {
    pub gross: f64,
    pub taxes: f64,
    pub executor_funeral_costs: f64,
}

impl Estate {
    pub fn distributable(&self) -> f64 {
        self.gross - self.taxes - self.executor_funeral_costs
    }
}

/// A complete life: every year lived, and what was left at the end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LifeRecord {
    pub years: Vec<YearRecord>,
    pub age_at_death: u32,
    pub estate: Estate,
}

/// The stylised life model: one person following `strategy` in `world`.
pub struct StylisedLife {
    strategy: Strategy,
    gender: Gender,
    world: World,
    returns: Normal<f64>,
    earnings_shock: Normal<f64>,
}

impl StylisedLife {
    pub fn new(strategy: Strategy, gender: Gender, world: World) -> Result<StylisedLife> {
        strategy.validate()?;
        if world.max_age < world.start_age {
            bail!(
                "The maximum age ({}) is below the starting age ({})",
                world.max_age,
                world.start_age
            );
        }
        let returns = Normal::new(world.mean_investment_return, world.investment_return_stddev)
            .context("Bad investment return distribution")?;
        let earnings_shock = Normal::new(0., EARNINGS_SHOCK_STDDEV)
            .context("Bad earnings distribution")?;
        Ok(StylisedLife {
            strategy,
            gender,
            world,
            returns,
            earnings_shock,
        })
    }
}

#[derive(Default)]
struct Accounts {
    rrsp: f64,
    tfsa: f64,
    nonreg: f64,
}

impl Accounts {
    fn total(&self) -> f64 {
        self.rrsp + self.tfsa + self.nonreg
    }

    /// Withdraw up to `amount`, taking `rrsp_first` of it from the RRSP and
    /// the rest from the TFSA, then non-registered, then whatever RRSP is
    /// left.  Returns the amounts taken from each.
    fn withdraw(&mut self, amount: f64, rrsp_first: f64) -> (f64, f64, f64) {
        let mut want = amount.min(self.total());
        let mut take = |balance: &mut f64, x: f64| {
            let x = x.min(*balance).min(want).max(0.);
            *balance -= x;
            want -= x;
            x
        };
        let mut rrsp = take(&mut self.rrsp, amount * rrsp_first);
        let tfsa = take(&mut self.tfsa, f64::INFINITY);
        let nonreg = take(&mut self.nonreg, f64::INFINITY);
        rrsp += take(&mut self.rrsp, f64::INFINITY);
        (rrsp, tfsa, nonreg)
    }
}

impl LifeModel for StylisedLife {
    fn live(&self, rng: &mut StdRng) -> Result<LifeRecord> {
        let world = &self.world;
        let strategy = &self.strategy;
        let mut life = LifeRecord::default();
        let mut accounts = Accounts::default();
        let mut retired: Option<Period> = None;
        let mut drawdown = 0.;
        let mut last_earnings = 0.;
        let mut pensionable_total = 0.;
        let mut pensionable_years = 0u32;

        for age in world.start_age..=world.max_age {
            let year = world.year_at(age);
            let ympe = world.wage_indexed(world.ympe, year);
            let mut rec = YearRecord {
                year,
                age,
                assets: accounts.total(),
                ..YearRecord::default()
            };

            rec.period = match retired {
                Some(period) => period,
                None if age >= strategy.planned_retirement_age => Period::Retired,
                None if age >= DISABILITY_MIN_AGE && rng.gen_bool(DISABILITY_RATE) => {
                    Period::InvoluntarilyRetired
                }
                None if rng.gen_bool(UNEMPLOYMENT_RATE) => Period::Unemployed,
                None => Period::Employed,
            };
            if rec.period.is_retired() && retired.is_none() {
                retired = Some(rec.period);
                drawdown = strategy.initial_cd_fraction * rec.assets;
            }

            match rec.period {
                Period::Employed => {
                    let shock = self.earnings_shock.sample(rng).exp();
                    rec.earnings = world.wage_indexed(BASE_EARNINGS, year) * shock;
                    last_earnings = rec.earnings;
                }
                Period::Unemployed => {
                    rec.ei_benefits = EI_REPLACEMENT * last_earnings.min(ympe);
                }
                Period::Retired | Period::InvoluntarilyRetired => {
                    let (rrsp, tfsa, nonreg) =
                        accounts.withdraw(drawdown, strategy.drawdown_preferred_rrsp_fraction);
                    rec.rrsp_withdrawals = rrsp;
                    rec.tfsa_withdrawals = tfsa;
                    rec.nonreg_withdrawals = nonreg;
                }
            }

            if !rec.period.is_retired() {
                let pensionable = rec.earnings.min(ympe);
                pensionable_total += pensionable / world.wage_indexed(1., year);
                pensionable_years += 1;
                rec.cpp_contributions = CPP_CONTRIBUTION_RATE * (pensionable - CPP_EXEMPTION).max(0.);
                rec.ei_premiums = EI_PREMIUM_RATE * pensionable;
            }
            if age >= world.senior_age {
                let average_pensionable = pensionable_total / f64::from(pensionable_years.max(1));
                rec.cpp_benefits =
                    CPP_REPLACEMENT * world.wage_indexed(average_pensionable, year);
                rec.oas_benefits = OAS_AMOUNT;
            }

            // Markets move before this year's deposits land
            let r = self.returns.sample(rng);
            rec.fund_growth = accounts.total() * r;
            rec.taxable_capital_gains = CAPITAL_GAINS_INCLUSION * (accounts.nonreg * r).max(0.);
            accounts.rrsp *= 1. + r;
            accounts.tfsa *= 1. + r;
            accounts.nonreg *= 1. + r;

            let income = rec.earnings
                + rec.ei_benefits
                + rec.cpp_benefits
                + rec.oas_benefits
                + rec.rrsp_withdrawals
                + rec.taxable_capital_gains;
            if age >= world.senior_age {
                rec.gis_benefits =
                    (GIS_MAX - GIS_REDUCTION_RATE * (income - rec.oas_benefits)).max(0.);
            }
            rec.social_benefits_repaid = (OAS_CLAWBACK_RATE
                * (income - OAS_CLAWBACK_THRESHOLD).max(0.))
            .min(rec.oas_benefits);
            rec.taxable_income = income;
            rec.income_tax = INCOME_TAX_RATE * (income - BASIC_PERSONAL_AMOUNT).max(0.);

            let cash = rec.gross_income()
                - rec.income_tax
                - rec.cpp_contributions
                - rec.ei_premiums;
            if !rec.period.is_retired() && cash > strategy.savings_threshold {
                let savings = strategy.savings_rate * (cash - strategy.savings_threshold);
                rec.rrsp_savings = savings * strategy.savings_rrsp_fraction;
                rec.tfsa_savings = savings * strategy.savings_tfsa_fraction;
                rec.nonreg_savings = savings - rec.rrsp_savings - rec.tfsa_savings;
                accounts.rrsp += rec.rrsp_savings;
                accounts.tfsa += rec.tfsa_savings;
                accounts.nonreg += rec.nonreg_savings;
            }
            let spending = cash - rec.savings();
            rec.consumption = spending / (1. + SALES_TAX_RATE);
            rec.sales_tax = spending - rec.consumption;
            if !rec.consumption.is_finite() {
                bail!("Consumption at age {} came out as {}", age, rec.consumption);
            }

            life.years.push(rec);
            life.age_at_death = age;
            if age == world.max_age || rng.gen_bool(self.gender.mortality(age)) {
                break;
            }
        }

        let gross = accounts.total().max(0.);
        let taxes = (ESTATE_RRSP_TAX_RATE * accounts.rrsp.max(0.)).min(gross);
        let costs = (EXECUTOR_FUNERAL_BASE + EXECUTOR_FUNERAL_RATE * gross).min(gross - taxes);
        life.estate = Estate {
            gross,
            taxes,
            executor_funeral_costs: costs,
        };
        Ok(life)
    }
}
