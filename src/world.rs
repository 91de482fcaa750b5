use bpaf::Bpaf;

/// Economic and demographic constants shared by every simulated life.
#[derive(Debug, Clone, Copy, PartialEq, Bpaf)]
pub struct World {
    /// Calendar year in which every simulated life starts
    #[bpaf(long("base-year"), argument("YEAR"), fallback(2017))]
    pub base_year: i32,
    /// Age at which every simulated life starts
    #[bpaf(long("start-age"), argument("AGE"), fallback(22))]
    pub start_age: u32,
    /// Annual rate at which future consumption is discounted
    #[bpaf(long("discount-rate"), argument("RATE"), fallback(0.02))]
    pub discount_rate: f64,
    /// Retirement consumption up to this age also counts as pre-disability
    #[bpaf(long("pre-disability-age"), argument("AGE"), fallback(75))]
    pub pre_disability_age: u32,
    /// Age from which a person counts as a senior
    #[bpaf(long("senior-age"), argument("AGE"), fallback(65))]
    pub senior_age: u32,
    /// Working years from this age on count towards late-career earnings
    #[bpaf(long("late-working-age"), argument("AGE"), fallback(55))]
    pub late_working_age: u32,
    /// Nobody lives beyond this age
    #[bpaf(long("max-age"), argument("AGE"), fallback(110))]
    pub max_age: u32,
    /// Year's maximum pensionable earnings, in base-year dollars
    #[bpaf(long("ympe"), argument("DOLLARS"), fallback(55_300.))]
    pub ympe: f64,
    /// Low-income cut-off, in base-year dollars
    #[bpaf(long("lico"), argument("DOLLARS"), fallback(20_000.))]
    pub lico: f64,
    /// Mean real return on investments
    #[bpaf(long("mean-investment-return"), argument("RATE"), fallback(0.035))]
    pub mean_investment_return: f64,
    /// Standard deviation of the annual real return on investments
    #[bpaf(long("investment-return-stddev"), argument("RATE"), fallback(0.1))]
    pub investment_return_stddev: f64,
    /// Real growth of average wages per year
    #[bpaf(long("wage-growth"), argument("RATE"), fallback(0.01))]
    pub wage_growth: f64,
    /// Retirement consumption below this fraction of working consumption
    /// counts as a shortfall
    #[bpaf(long("replacement-target"), argument("FRACTION"), fallback(0.7))]
    pub replacement_target: f64,
}

impl Default for World {
    fn default() -> World {
        World {
            base_year: 2017,
            start_age: 22,
            discount_rate: 0.02,
            pre_disability_age: 75,
            senior_age: 65,
            late_working_age: 55,
            max_age: 110,
            ympe: 55_300.,
            lico: 20_000.,
            mean_investment_return: 0.035,
            investment_return_stddev: 0.1,
            wage_growth: 0.01,
            replacement_target: 0.7,
        }
    }
}

impl World {
    /// `base` compounded at `rate` for every year since the base year.
    pub fn indexed(&self, base: f64, year: i32, rate: f64) -> f64 {
        base * rate.powi(year - self.base_year)
    }

    /// The value of `amount` spent in `year`, discounted to the base year.
    pub fn discounted(&self, amount: f64, year: i32) -> f64 {
        self.indexed(amount, year, 1. - self.discount_rate)
    }

    /// A wage-indexed threshold, such as the YMPE, in `year`.
    pub fn wage_indexed(&self, base: f64, year: i32) -> f64 {
        self.indexed(base, year, 1. + self.wage_growth)
    }

    /// Signed, so years before the base year give ages below the start age.
    pub fn age_in(&self, year: i32) -> i32 {
        year - self.base_year + self.start_age as i32
    }

    pub fn year_at(&self, age: u32) -> i32 {
        self.base_year + age as i32 - self.start_age as i32
    }
}
