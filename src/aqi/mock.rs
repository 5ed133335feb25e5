use super::client::AqiFeed;
use super::types::*;
use super::AqiError;
use async_trait::async_trait;
use chrono::{Duration, Utc};

/// Offline stand-in for the upstream API with a small table of well-known
/// stations. Useful for development without a token and for exercising the
/// resolution pipeline in tests.
pub struct MockAqiClient;

struct MockStation {
    name: &'static str,
    idx: i64,
    aqi: i32,
    geo: [f64; 2],
    tz: &'static str,
    dominentpol: Option<&'static str>,
    with_forecast: bool,
}

const MOCK_STATIONS: &[MockStation] = &[
    MockStation {
        name: "Beijing",
        idx: 1451,
        aqi: 152,
        geo: [39.954592, 116.468117],
        tz: "+08:00",
        dominentpol: Some("pm25"),
        with_forecast: true,
    },
    MockStation {
        name: "Tokyo",
        idx: 2155,
        aqi: 42,
        geo: [35.6895, 139.69171],
        tz: "+09:00",
        dominentpol: Some("pm25"),
        with_forecast: true,
    },
    MockStation {
        name: "目黒",
        idx: 2160,
        aqi: 45,
        geo: [35.6415, 139.6983],
        tz: "+09:00",
        dominentpol: Some("pm25"),
        with_forecast: true,
    },
    MockStation {
        name: "London",
        idx: 5724,
        aqi: 38,
        geo: [51.50853, -0.12574],
        tz: "+00:00",
        dominentpol: Some("no2"),
        with_forecast: true,
    },
    MockStation {
        name: "Delhi",
        idx: 2556,
        aqi: 210,
        geo: [28.63576, 77.22445],
        tz: "+05:30",
        dominentpol: Some("pm25"),
        with_forecast: true,
    },
    MockStation {
        name: "Reykjavik",
        idx: 9032,
        aqi: 21,
        geo: [64.1265, -21.8174],
        tz: "+00:00",
        dominentpol: None,
        with_forecast: false,
    },
];

impl MockAqiClient {
    pub fn new() -> Self {
        Self
    }

    fn build_reading(station: &MockStation) -> AirQualityReading {
        let now = Utc::now();
        let forecast = station.with_forecast.then(|| ForecastBlock {
            daily: DailyForecast {
                pm25: Some(mock_forecast_days(station.aqi)),
                pm10: Some(mock_forecast_days(station.aqi / 2)),
                o3: None,
            },
        });

        AirQualityReading {
            idx: station.idx,
            aqi: station.aqi,
            city: StationCity {
                name: station.name.to_string(),
                geo: station.geo,
                url: None,
            },
            dominentpol: station.dominentpol.map(str::to_string),
            iaqi: PollutantReadings {
                pm25: Some(Measurement {
                    v: station.aqi as f64 * 0.6,
                }),
                pm10: Some(Measurement {
                    v: station.aqi as f64 * 0.4,
                }),
                no2: Some(Measurement {
                    v: 8.0 + 20.0 * fastrand::f64(),
                }),
                ..Default::default()
            },
            time: ObservationTime {
                s: now.format("%Y-%m-%d %H:%M:%S").to_string(),
                tz: station.tz.to_string(),
                v: now.timestamp(),
            },
            forecast,
        }
    }
}

impl Default for MockAqiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_forecast_days(base: i32) -> Vec<ForecastDay> {
    let now = Utc::now();
    (0..7)
        .map(|day| {
            let avg = (base + fastrand::i32(-15..15)).max(5);
            ForecastDay {
                avg,
                day: (now + Duration::days(day)).format("%Y-%m-%d").to_string(),
                max: avg + 20,
                min: (avg - 20).max(0),
            }
        })
        .collect()
}

#[async_trait]
impl AqiFeed for MockAqiClient {
    async fn feed(&self, station: &str) -> Result<AirQualityReading, AqiError> {
        MOCK_STATIONS
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(station))
            .map(Self::build_reading)
            .ok_or_else(|| AqiError::Upstream("Unknown station".to_string()))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<StationMatch>, AqiError> {
        let keyword = keyword.to_lowercase();
        Ok(MOCK_STATIONS
            .iter()
            .filter(|station| station.name.to_lowercase().contains(&keyword))
            .map(|station| StationMatch {
                station: StationSummary {
                    name: station.name.to_string(),
                    geo: station.geo,
                    url: None,
                },
            })
            .collect())
    }

    async fn probe(&self) -> Result<(), AqiError> {
        Ok(())
    }
}
