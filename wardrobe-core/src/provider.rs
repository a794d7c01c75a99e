use crate::{
    Config,
    model::{Classification, Coordinates, Temperature, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Raw current-weather payload as returned by the lookup service (imperial units).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWeather {
    pub name: String,
    pub dt: i64,
    pub main: RawMain,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub sys: RawSun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMain {
    pub temp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCondition {
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSun {
    pub sunrise: i64,
    pub sunset: i64,
}

impl RawWeather {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.dt)
    }

    fn is_daytime(&self) -> bool {
        match (
            self.observed_at(),
            unix_to_utc(self.sys.sunrise),
            unix_to_utc(self.sys.sunset),
        ) {
            (Some(now), Some(sunrise), Some(sunset)) => sunrise < now && now < sunset,
            _ => false,
        }
    }
}

/// Transform a raw lookup payload into the snapshot the app displays.
pub fn snapshot_from_raw(raw: &RawWeather) -> WeatherSnapshot {
    let temperature = Temperature::from_fahrenheit(raw.main.temp);

    let condition = raw
        .weather
        .first()
        .map(|w| w.main.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());

    WeatherSnapshot {
        classification: Classification::from_fahrenheit(temperature.fahrenheit),
        temperature,
        city: raw.name.clone(),
        condition,
        is_daytime: raw.is_daytime(),
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, coordinates: Coordinates) -> anyhow::Result<RawWeather>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No weather API key configured.\n\
                 Hint: run `wardrobe configure` and enter your API key."
        )
    })?;

    Ok(Arc::new(OpenWeatherProvider::new(api_key.to_owned())))
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
