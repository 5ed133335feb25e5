//! Core data layer for a city air-quality dashboard: city-name resolution
//! with candidate fallback, TTL-cached upstream fetches, partial-failure
//! aggregation, and chart series derivation, backed by a WAQI-style REST API.

pub mod aqi;
pub mod cache;
pub mod config;
pub mod levels;
pub mod storage;

pub use aqi::client::{AqiFeed, WaqiClient};
pub use aqi::fetch::{AqiService, CachedPayload};
pub use aqi::history::{HistoricalPoint, HistoricalSeries, SeriesSource};
pub use aqi::mock::MockAqiClient;
pub use aqi::types::{AirQualityReading, Pollutant, StationMatch};
pub use aqi::{AqiError, AttemptSource, CandidateAttempt};
pub use cache::{Clock, ResultCache, SystemClock};
pub use config::Config;
pub use levels::{color_for, level_for, AqiLevel};
pub use storage::{PreferencesStore, SubscriptionStore};

/// Default city list for the dashboard's featured panel, resolved through
/// [`AqiService::resolve_many`].
pub const FEATURED_CITIES: [&str; 18] = [
    "Beijing",
    "New York",
    "London",
    "Tokyo",
    "Mumbai",
    "Paris",
    "Los Angeles",
    "Delhi",
    "Shanghai",
    "Dubai",
    "Singapore",
    "Sydney",
    "Berlin",
    "Moscow",
    "Cairo",
    "Rio de Janeiro",
    "Toronto",
    "Seoul",
];
