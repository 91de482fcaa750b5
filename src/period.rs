use std::fmt;

/// The phase of life a simulated year falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Period {
    #[default]
    Employed,
    Unemployed,
    /// Retired at or after the planned age
    Retired,
    /// Forced out of work early, eg. by disability
    InvoluntarilyRetired,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Employed,
        Period::Unemployed,
        Period::Retired,
        Period::InvoluntarilyRetired,
    ];
    pub const WORKING: [Period; 2] = [Period::Employed, Period::Unemployed];
    pub const RETIRED: [Period; 2] = [Period::Retired, Period::InvoluntarilyRetired];

    pub fn is_retired(self) -> bool {
        matches!(self, Period::Retired | Period::InvoluntarilyRetired)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Period::Employed => "employed",
            Period::Unemployed => "unemployed",
            Period::Retired => "planned retirement",
            Period::InvoluntarilyRetired => "unplanned retirement",
        })
    }
}
