//! Journal Scenarios
//!
//! Each scenario shapes a baseline routine (two meals, three drinks and three
//! litter visits a day) over the last `2 * window_days` days:
//! - **steady**: baseline throughout
//! - **appetite-loss**: food falls to 40% in the current half-window
//! - **polydipsia**: water rises to 2.5x in the current half-window
//! - **litter-spike**: litter visits double in the current half-window
//! - **water-outlier**: a single 700 ml day today
//! - **stopped-logging**: nothing logged in the current half-window

/// Expected totals for one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayProfile {
    pub food: f64,
    pub water: f64,
    pub litter: f64,
    /// Whether the owner logged anything at all that day
    pub logged: bool,
}

pub const BASELINE: DayProfile = DayProfile {
    food: 60.0,
    water: 200.0,
    litter: 3.0,
    logged: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Steady,
    AppetiteLoss,
    Polydipsia,
    LitterSpike,
    WaterOutlier,
    StoppedLogging,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::Steady,
        Scenario::AppetiteLoss,
        Scenario::Polydipsia,
        Scenario::LitterSpike,
        Scenario::WaterOutlier,
        Scenario::StoppedLogging,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('_', "-").as_str() {
            "steady" | "normal" => Some(Self::Steady),
            "appetite-loss" | "anorexia" => Some(Self::AppetiteLoss),
            "polydipsia" => Some(Self::Polydipsia),
            "litter-spike" => Some(Self::LitterSpike),
            "water-outlier" => Some(Self::WaterOutlier),
            "stopped-logging" => Some(Self::StoppedLogging),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::AppetiteLoss => "appetite-loss",
            Self::Polydipsia => "polydipsia",
            Self::LitterSpike => "litter-spike",
            Self::WaterOutlier => "water-outlier",
            Self::StoppedLogging => "stopped-logging",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Steady => "Unchanged routine for two weeks",
            Self::AppetiteLoss => "Food intake falls to 40% this week",
            Self::Polydipsia => "Water intake rises to 2.5x this week",
            Self::LitterSpike => "Litter box visits double this week",
            Self::WaterOutlier => "One 700 ml day today, otherwise normal",
            Self::StoppedLogging => "Owner stops logging this week",
        }
    }

    /// Target totals for the day `days_ago` days before today
    pub fn day_profile(&self, days_ago: u64, window_days: u64) -> DayProfile {
        let current_half = days_ago < window_days;
        let mut day = BASELINE;

        match self {
            Self::Steady => {}
            Self::AppetiteLoss if current_half => day.food *= 0.4,
            Self::Polydipsia if current_half => day.water *= 2.5,
            Self::LitterSpike if current_half => day.litter *= 2.0,
            Self::WaterOutlier if days_ago == 0 => day.water = 700.0,
            Self::StoppedLogging if current_half => day.logged = false,
            _ => {}
        }

        day
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    Scenario::ALL
        .iter()
        .map(|s| (s.name(), s.description()))
        .collect()
}
