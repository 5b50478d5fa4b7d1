// Threshold bands for temperature and humidity readings
use serde::Serialize;
use std::fmt;

pub const HIGH_HEAT_CELSIUS: f64 = 30.0;
pub const COLD_CELSIUS: f64 = 15.0;
pub const HIGH_HUMIDITY_PERCENT: f64 = 60.0;
pub const DRY_PERCENT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemperatureBand {
    HighHeat,
    Cold,
    Optimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HumidityBand {
    HighHumidity,
    Dry,
    Optimal,
}

impl TemperatureBand {
    /// Boundaries are inclusive: 30.0 is "High Heat", 15.0 is "Cold".
    pub fn classify(celsius: f64) -> Self {
        if celsius >= HIGH_HEAT_CELSIUS {
            Self::HighHeat
        } else if celsius <= COLD_CELSIUS {
            Self::Cold
        } else {
            Self::Optimal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HighHeat => "High Heat",
            Self::Cold => "Cold",
            Self::Optimal => "Optimal",
        }
    }
}

impl HumidityBand {
    /// Boundaries are inclusive: 60.0 is "High Humidity", 30.0 is "Dry".
    pub fn classify(percent: f64) -> Self {
        if percent >= HIGH_HUMIDITY_PERCENT {
            Self::HighHumidity
        } else if percent <= DRY_PERCENT {
            Self::Dry
        } else {
            Self::Optimal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HighHumidity => "High Humidity",
            Self::Dry => "Dry",
            Self::Optimal => "Optimal",
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for HumidityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
