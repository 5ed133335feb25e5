use super::client::{AqiFeed, WaqiClient};
use super::names;
use super::types::{AirQualityReading, StationMatch};
use super::{AqiError, AttemptSource, CandidateAttempt};
use crate::cache::{signature, ResultCache};
use crate::config::Config;
use futures_util::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Payload stored in the result cache; both upstream endpoints share one
/// cache keyed by request signature.
#[derive(Clone)]
pub enum CachedPayload {
    Reading(AirQualityReading),
    Stations(Vec<StationMatch>),
}

/// City resolution and data fetch layer: candidate expansion, sequential
/// fallback, memoization, and concurrent aggregation over the upstream feed.
pub struct AqiService {
    feed: Arc<dyn AqiFeed>,
    cache: ResultCache<CachedPayload>,
    generation: AtomicU64,
}

impl AqiService {
    pub fn new(feed: Arc<dyn AqiFeed>, cache: ResultCache<CachedPayload>) -> Self {
        Self {
            feed,
            cache,
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: Config) -> Self {
        let cache = ResultCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self::new(Arc::new(WaqiClient::new(config)), cache)
    }

    /// Resolves one city name to one reading. Candidates are tried strictly
    /// in order, each awaited fully before the next, so cache population
    /// stays deterministic and hopeless names don't fan out extra requests.
    /// Individual candidate failures are swallowed; only total exhaustion
    /// surfaces, carrying the attempt ledger.
    pub async fn resolve_city(&self, raw_name: &str) -> Result<AirQualityReading, AqiError> {
        let candidates = names::expand(raw_name);
        tracing::debug!(city = %raw_name, ?candidates, "resolving city");

        let mut attempts = Vec::new();
        for candidate in &candidates {
            match self.feed_cached(candidate).await {
                Ok(reading) => {
                    tracing::debug!(candidate = %candidate, "candidate matched");
                    return Ok(reading);
                }
                Err(error) => {
                    tracing::warn!(candidate = %candidate, error = %error, "candidate lookup failed");
                    attempts.push(CandidateAttempt {
                        query: candidate.clone(),
                        via: AttemptSource::Station,
                        error: error.to_string(),
                    });
                }
            }
        }

        // Direct lookups exhausted; let the upstream's own search pick a
        // station name and retry with that.
        match self.search_cached(raw_name).await {
            Ok(matches) if !matches.is_empty() => {
                let station = matches[0].station.name.clone();
                tracing::debug!(station = %station, "retrying with top search result");
                match self.feed_cached(&station).await {
                    Ok(reading) => return Ok(reading),
                    Err(error) => attempts.push(CandidateAttempt {
                        query: station,
                        via: AttemptSource::SearchFallback,
                        error: error.to_string(),
                    }),
                }
            }
            Ok(_) => attempts.push(CandidateAttempt {
                query: raw_name.to_string(),
                via: AttemptSource::SearchFallback,
                error: "search returned no stations".to_string(),
            }),
            Err(error) => attempts.push(CandidateAttempt {
                query: raw_name.to_string(),
                via: AttemptSource::SearchFallback,
                error: error.to_string(),
            }),
        }

        Err(AqiError::NotFound {
            city: raw_name.to_string(),
            attempts,
        })
    }

    /// Resolves every name concurrently and returns the successful subset.
    /// Waits for all resolutions to settle; never fails on partial failure,
    /// so a dashboard panel renders whatever data arrived.
    pub async fn resolve_many(&self, names: &[String]) -> Vec<AirQualityReading> {
        let tasks = names.iter().map(|name| async move {
            match self.resolve_city(name).await {
                Ok(reading) => Some(reading),
                Err(error) => {
                    tracing::warn!(city = %name, error = %error, "skipping city");
                    None
                }
            }
        });

        let readings: Vec<AirQualityReading> =
            join_all(tasks).await.into_iter().flatten().collect();
        tracing::debug!(
            requested = names.len(),
            loaded = readings.len(),
            "aggregated city readings"
        );
        readings
    }

    pub async fn search_cities(&self, query: &str) -> Result<Vec<StationMatch>, AqiError> {
        self.search_cached(query).await
    }

    /// Pre-flight probe used by detail views; any failure maps to
    /// [`AqiError::ConnectivityCheckFailed`], fatal for that fetch only.
    pub async fn check_connectivity(&self) -> Result<(), AqiError> {
        self.feed.probe().await.map_err(|error| match error {
            AqiError::ConnectivityCheckFailed(_) => error,
            other => AqiError::ConnectivityCheckFailed(other.to_string()),
        })
    }

    /// Stamps a new resolution generation. In-flight fetches are never
    /// aborted; the UI compares its stored token with `is_current` and drops
    /// results that were superseded while pending.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn feed_cached(&self, station: &str) -> Result<AirQualityReading, AqiError> {
        let sig = signature("/feed", &[("station", station)]);
        if let Some(CachedPayload::Reading(reading)) = self.cache.get(&sig) {
            tracing::debug!(station = %station, "feed cache hit");
            return Ok(reading);
        }

        let reading = self.feed.feed(station).await?;
        self.cache.put(sig, CachedPayload::Reading(reading.clone()));
        Ok(reading)
    }

    async fn search_cached(&self, keyword: &str) -> Result<Vec<StationMatch>, AqiError> {
        let sig = signature("/search/", &[("keyword", keyword)]);
        if let Some(CachedPayload::Stations(matches)) = self.cache.get(&sig) {
            tracing::debug!(keyword = %keyword, "search cache hit");
            return Ok(matches);
        }

        let matches = self.feed.search(keyword).await?;
        self.cache
            .put(sig, CachedPayload::Stations(matches.clone()));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::types::{
        Measurement, ObservationTime, PollutantReadings, StationCity, StationSummary,
    };
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn reading(name: &str, aqi: i32) -> AirQualityReading {
        AirQualityReading {
            idx: 1451,
            aqi,
            city: StationCity {
                name: name.to_string(),
                geo: [39.954592, 116.468117],
                url: None,
            },
            dominentpol: Some("pm25".to_string()),
            iaqi: PollutantReadings {
                pm25: Some(Measurement { v: aqi as f64 }),
                ..Default::default()
            },
            time: ObservationTime {
                s: "2024-06-01 12:00:00".to_string(),
                tz: "+08:00".to_string(),
                v: 1717243200,
            },
            forecast: None,
        }
    }

    /// Scripted upstream: serves readings for the configured stations, a
    /// fixed search result list, and records every call in order.
    struct ScriptedFeed {
        stations: HashMap<String, AirQualityReading>,
        search_results: Vec<StationMatch>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFeed {
        fn new(
            stations: Vec<(&str, AirQualityReading)>,
            search_results: Vec<StationMatch>,
        ) -> Self {
            Self {
                stations: stations
                    .into_iter()
                    .map(|(name, reading)| (name.to_string(), reading))
                    .collect(),
                search_results,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn feed_calls(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| call.strip_prefix("feed:").map(str::to_string))
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl AqiFeed for ScriptedFeed {
        async fn feed(&self, station: &str) -> Result<AirQualityReading, AqiError> {
            self.calls.lock().unwrap().push(format!("feed:{}", station));
            self.stations
                .get(station)
                .cloned()
                .ok_or_else(|| AqiError::Upstream("Unknown station".to_string()))
        }

        async fn search(&self, keyword: &str) -> Result<Vec<StationMatch>, AqiError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("search:{}", keyword));
            Ok(self.search_results.clone())
        }

        async fn probe(&self) -> Result<(), AqiError> {
            Ok(())
        }
    }

    fn service(feed: Arc<ScriptedFeed>) -> AqiService {
        AqiService::new(feed, ResultCache::new(Duration::from_secs(300)))
    }

    fn station_match(name: &str) -> StationMatch {
        StationMatch {
            station: StationSummary {
                name: name.to_string(),
                geo: [35.0, 139.0],
                url: None,
            },
        }
    }

    #[tokio::test]
    async fn test_first_candidate_success_short_circuits() {
        let feed = Arc::new(ScriptedFeed::new(
            vec![("Beijing", reading("Beijing", 152))],
            vec![],
        ));
        let service = service(feed.clone());

        let resolved = service.resolve_city("Beijing").await.unwrap();

        assert_eq!(resolved.aqi, 152);
        assert_eq!(feed.calls(), vec!["feed:Beijing"]);
    }

    #[tokio::test]
    async fn test_candidates_tried_in_expand_order() {
        // Only the extracted parenthetical content is a known station, so the
        // raw name and the stripped name must both be attempted first.
        let feed = Arc::new(ScriptedFeed::new(vec![("目黒", reading("目黒", 45))], vec![]));
        let service = service(feed.clone());

        let resolved = service.resolve_city("Meguro (目黒)").await.unwrap();

        assert_eq!(resolved.city.name, "目黒");
        assert_eq!(
            feed.feed_calls(),
            vec!["Meguro (目黒)", "Meguro", "目黒"]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_yields_not_found_with_attempts() {
        let feed = Arc::new(ScriptedFeed::new(vec![], vec![]));
        let service = service(feed.clone());

        let error = service.resolve_city("Nowhereville").await.unwrap_err();

        match error {
            AqiError::NotFound { city, attempts } => {
                assert_eq!(city, "Nowhereville");
                // four station candidates plus the empty-search outcome
                assert_eq!(attempts.len(), 5);
                assert!(attempts[..4]
                    .iter()
                    .all(|attempt| attempt.via == AttemptSource::Station));
                assert_eq!(attempts[4].via, AttemptSource::SearchFallback);
                assert_eq!(attempts[4].error, "search returned no stations");
            }
            other => panic!("expected NotFound, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_search_fallback_recovers_unknown_name() {
        let feed = Arc::new(ScriptedFeed::new(
            vec![("Shinagawa Station", reading("Shinagawa Station", 61))],
            vec![station_match("Shinagawa Station")],
        ));
        let service = service(feed.clone());

        let resolved = service.resolve_city("Shinagawa Ward").await.unwrap();

        assert_eq!(resolved.city.name, "Shinagawa Station");
        let calls = feed.calls();
        assert_eq!(calls[calls.len() - 2], "search:Shinagawa Ward");
        assert_eq!(calls[calls.len() - 1], "feed:Shinagawa Station");
    }

    #[tokio::test]
    async fn test_repeat_resolution_within_ttl_hits_cache() {
        let feed = Arc::new(ScriptedFeed::new(
            vec![("Beijing", reading("Beijing", 152))],
            vec![],
        ));
        let service = service(feed.clone());

        let first = service.resolve_city("Beijing").await.unwrap();
        let second = service.resolve_city("Beijing").await.unwrap();

        assert_eq!(first.aqi, second.aqi);
        assert_eq!(feed.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_many_keeps_successes_only() {
        let feed = Arc::new(ScriptedFeed::new(
            vec![
                ("Tokyo", reading("Tokyo", 42)),
                ("London", reading("London", 38)),
            ],
            vec![],
        ));
        let service = service(feed.clone());

        let names: Vec<String> = ["Tokyo", "Nowhereville", "London"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let readings = service.resolve_many(&names).await;

        assert_eq!(readings.len(), 2);
        let mut cities: Vec<String> = readings.iter().map(|r| r.city.name.clone()).collect();
        cities.sort();
        assert_eq!(cities, vec!["London".to_string(), "Tokyo".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_many_all_failures_is_empty() {
        let feed = Arc::new(ScriptedFeed::new(vec![], vec![]));
        let service = service(feed);

        let names = vec!["Atlantis".to_string(), "El Dorado".to_string()];
        assert!(service.resolve_many(&names).await.is_empty());
    }

    #[tokio::test]
    async fn test_search_cities_passes_through() {
        let feed = Arc::new(ScriptedFeed::new(
            vec![],
            vec![station_match("Berlin Mitte"), station_match("Berlin Wedding")],
        ));
        let service = service(feed.clone());

        let matches = service.search_cities("Berlin").await.unwrap();
        assert_eq!(matches.len(), 2);

        // second query within the TTL is served from the cache
        service.search_cities("Berlin").await.unwrap();
        assert_eq!(feed.calls(), vec!["search:Berlin"]);
    }

    #[tokio::test]
    async fn test_generation_tokens_invalidate_superseded_requests() {
        let feed = Arc::new(ScriptedFeed::new(vec![], vec![]));
        let service = service(feed);

        let first = service.next_generation();
        assert!(service.is_current(first));

        let second = service.next_generation();
        assert!(!service.is_current(first));
        assert!(service.is_current(second));
    }
}
