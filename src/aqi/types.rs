use serde::{Deserialize, Serialize};

/// One monitoring station's current snapshot, mirroring the upstream
/// `/feed/{station}` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityReading {
    pub idx: i64,
    pub aqi: i32,
    pub city: StationCity,
    #[serde(default)]
    pub dominentpol: Option<String>,
    #[serde(default)]
    pub iaqi: PollutantReadings,
    pub time: ObservationTime,
    #[serde(default)]
    pub forecast: Option<ForecastBlock>,
}

impl AirQualityReading {
    /// Upstream payloads occasionally carry sentinel values; a reading is
    /// usable only when the composite AQI and every present concentration
    /// are non-negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.aqi < 0 {
            return Err(format!("negative AQI value: {}", self.aqi));
        }
        for (pollutant, value) in self.iaqi.present() {
            if value < 0.0 {
                return Err(format!(
                    "negative concentration for {}: {}",
                    pollutant.as_str(),
                    value
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationCity {
    pub name: String,
    pub geo: [f64; 2],
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationTime {
    pub s: String,
    pub tz: String,
    pub v: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Measurement {
    pub v: f64,
}

/// Per-pollutant concentrations from the upstream `iaqi` block. The key set
/// is fixed; every pollutant is optional per station.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollutantReadings {
    #[serde(default)]
    pub pm25: Option<Measurement>,
    #[serde(default)]
    pub pm10: Option<Measurement>,
    #[serde(default)]
    pub o3: Option<Measurement>,
    #[serde(default)]
    pub no2: Option<Measurement>,
    #[serde(default)]
    pub so2: Option<Measurement>,
    #[serde(default)]
    pub co: Option<Measurement>,
}

impl PollutantReadings {
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        let measurement = match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::O3 => self.o3,
            Pollutant::No2 => self.no2,
            Pollutant::So2 => self.so2,
            Pollutant::Co => self.co,
        };
        measurement.map(|m| m.v)
    }

    /// Pollutants with a measured value, in the fixed enumeration order.
    pub fn present(&self) -> Vec<(Pollutant, f64)> {
        Pollutant::ALL
            .iter()
            .filter_map(|&pollutant| self.get(pollutant).map(|value| (pollutant, value)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Pm25,
    Pm10,
    O3,
    No2,
    So2,
    Co,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::O3,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastBlock {
    pub daily: DailyForecast,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(default)]
    pub pm25: Option<Vec<ForecastDay>>,
    #[serde(default)]
    pub pm10: Option<Vec<ForecastDay>>,
    #[serde(default)]
    pub o3: Option<Vec<ForecastDay>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub avg: i32,
    pub day: String,
    pub max: i32,
    pub min: i32,
}

/// One entry of the upstream `/search/` result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationMatch {
    pub station: StationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSummary {
    pub name: String,
    pub geo: [f64; 2],
    #[serde(default)]
    pub url: Option<String>,
}
