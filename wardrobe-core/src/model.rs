use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic position used for weather lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Weather-suitability bucket shared by snapshots and clothing items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Hot,
    Warm,
    Cold,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Hot => "hot",
            Classification::Warm => "warm",
            Classification::Cold => "cold",
        }
    }

    pub const fn all() -> &'static [Classification] {
        &[Classification::Hot, Classification::Warm, Classification::Cold]
    }

    /// Bucket a (rounded) Fahrenheit reading.
    pub fn from_fahrenheit(fahrenheit: f64) -> Self {
        if fahrenheit >= 86.0 {
            Classification::Hot
        } else if fahrenheit >= 66.0 {
            Classification::Warm
        } else {
            Classification::Cold
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Classification {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "hot" => Ok(Classification::Hot),
            "warm" => Ok(Classification::Warm),
            "cold" => Ok(Classification::Cold),
            _ => Err(anyhow::anyhow!(
                "Unknown weather type '{value}'. Supported types: hot, warm, cold."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub fahrenheit: f64,
    pub celsius: f64,
}

impl Temperature {
    pub fn from_fahrenheit(fahrenheit: f64) -> Self {
        let fahrenheit = fahrenheit.round();
        Self {
            fahrenheit,
            celsius: ((fahrenheit - 32.0) * 5.0 / 9.0).round(),
        }
    }

    pub fn in_unit(&self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Fahrenheit => self.fahrenheit,
            TemperatureUnit::Celsius => self.celsius,
        }
    }
}

/// Display unit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    Celsius,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Celsius => "°C",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
        }
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "F" | "f" => Ok(TemperatureUnit::Fahrenheit),
            "C" | "c" => Ok(TemperatureUnit::Celsius),
            _ => Err(anyhow::anyhow!("Unknown temperature unit '{value}'. Use F or C.")),
        }
    }
}

/// Latest weather shown to the user. Replaced wholesale on every successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "type")]
    pub classification: Classification,
    pub temperature: Temperature,
    pub city: String,
    pub condition: String,
    pub is_daytime: bool,
}
