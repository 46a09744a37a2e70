/*!
Fetcher simulé pour développement sans accès réseau

Remplace `RobloxFetcher` dans les tests: infos et relevés scriptés par
univers, échecs injectés, latence simulée par un timer tokio.
Enregistre chaque appel pour les assertions.
*/

use async_trait::async_trait;
use ccu_monitor::fetcher::{EntityInfo, FetchError, Fetcher, SampleReading};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCall {
    Info(String),
    Sample(String),
}

#[derive(Debug, Default)]
struct Script {
    infos: HashMap<String, EntityInfo>,
    /// `None` entries fail the corresponding fetch
    readings: HashMap<String, VecDeque<Option<SampleReading>>>,
    /// Reading once the script of a universe is exhausted
    steady: HashMap<String, SampleReading>,
}

/// Mock fetcher partageable entre tâches (clone = même script)
#[derive(Clone, Default)]
pub struct MockFetcher {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<FetchCall>>>,
    latency: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre les infos d'un univers
    pub fn with_info(self, entity_id: &str, info: EntityInfo) -> Self {
        self.script.lock().infos.insert(entity_id.to_string(), info);
        self
    }

    /// Univers valide (passe le contrôle de validation) avec un nom donné
    pub fn with_game(self, entity_id: &str, name: &str) -> Self {
        let info = EntityInfo {
            name: name.to_string(),
            description: format!("{} description", name),
            created: "2021-03-14T09:26:53.589Z".to_string(),
            creator_name: "DevKit Studio".to_string(),
            creator_type: "Group".to_string(),
        };
        self.with_info(entity_id, info)
    }

    /// Relevés successifs d'un univers; `None` = échec du fetch
    pub fn with_readings(self, entity_id: &str, readings: Vec<Option<SampleReading>>) -> Self {
        self.script
            .lock()
            .readings
            .entry(entity_id.to_string())
            .or_default()
            .extend(readings);
        self
    }

    /// Relevé constant une fois le script épuisé
    pub fn with_steady(self, entity_id: &str, ccu: u64, rating: f64) -> Self {
        self.script
            .lock()
            .steady
            .insert(entity_id.to_string(), SampleReading { ccu, rating });
        self
    }

    /// Chaque fetch de relevé dort `delay` sur le timer de sa tâche
    pub fn with_latency(mut self, delay: Duration) -> Self {
        self.latency = Some(delay);
        self
    }

    /// Fait échouer le prochain relevé de cet univers
    pub fn fail_next(&self, entity_id: &str) {
        self.script
            .lock()
            .readings
            .entry(entity_id.to_string())
            .or_default()
            .push_front(None);
    }

    /// Récupère tous les appels (pour assertions de tests)
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    pub fn sample_calls(&self, entity_id: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, FetchCall::Sample(id) if id == entity_id))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn next_reading(&self, entity_id: &str) -> Result<SampleReading, FetchError> {
        let mut script = self.script.lock();
        let scripted = script.readings.get_mut(entity_id).and_then(|queue| queue.pop_front());

        match scripted {
            Some(Some(reading)) => Ok(reading),
            Some(None) => Err(FetchError::Status {
                status: 503,
                url: format!("mock://games/{}", entity_id),
            }),
            None => script
                .steady
                .get(entity_id)
                .copied()
                .ok_or_else(|| FetchError::NotFound(entity_id.to_string())),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_info(&self, entity_id: &str) -> EntityInfo {
        self.calls.lock().push(FetchCall::Info(entity_id.to_string()));
        let info = self.script.lock().infos.get(entity_id).cloned();
        log::debug!("🔎 [MOCK] Info for {}: {}", entity_id, info.is_some());
        info.unwrap_or_default()
    }

    async fn fetch_sample(&self, entity_id: &str) -> Result<SampleReading, FetchError> {
        self.calls.lock().push(FetchCall::Sample(entity_id.to_string()));
        if let Some(delay) = self.latency {
            tokio::time::sleep(delay).await;
        }

        let reading = self.next_reading(entity_id);
        log::debug!("📥 [MOCK] Sample for {}: {:?}", entity_id, reading);
        reading
    }
}

/// Construit des réponses JSON au format de l'API games
pub struct ApiPayloadBuilder;

impl ApiPayloadBuilder {
    /// Réponse de `/v1/games?universeIds=`
    pub fn game(entity_id: u64, name: &str, creator: &str, playing: u64) -> Value {
        serde_json::json!({
            "data": [{
                "id": entity_id,
                "rootPlaceId": entity_id * 10,
                "name": name,
                "description": format!("Welcome to {}", name),
                "creator": {
                    "id": 1,
                    "name": creator,
                    "type": "Group",
                    "isRNVAccount": false
                },
                "price": null,
                "playing": playing,
                "visits": 1_000_000,
                "maxPlayers": 30,
                "created": "2019-08-01T16:05:12.343Z",
                "updated": chrono::Utc::now().to_rfc3339()
            }]
        })
    }

    /// Réponse de `/v1/games/votes?universeIds=`
    pub fn votes(entity_id: u64, up_votes: u64, down_votes: u64) -> Value {
        serde_json::json!({
            "data": [{
                "id": entity_id,
                "upVotes": up_votes,
                "downVotes": down_votes
            }]
        })
    }

    /// Réponse d'un univers inconnu
    pub fn empty() -> Value {
        serde_json::json!({ "data": [] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccu_monitor::fetcher::{parse_info, parse_playing, parse_votes, NOT_AVAILABLE};

    #[tokio::test]
    async fn test_mock_fetcher_script_then_steady() {
        let fetcher = MockFetcher::new()
            .with_game("7", "Tower")
            .with_readings("7", vec![Some(SampleReading { ccu: 5, rating: 90.0 }), None])
            .with_steady("7", 8, 91.0);

        assert_eq!(fetcher.fetch_info("7").await.name, "Tower");
        assert_eq!(fetcher.fetch_info("8").await.name, NOT_AVAILABLE);

        assert_eq!(fetcher.fetch_sample("7").await.unwrap().ccu, 5);
        assert!(fetcher.fetch_sample("7").await.is_err());
        assert_eq!(fetcher.fetch_sample("7").await.unwrap().ccu, 8);
        assert!(matches!(fetcher.fetch_sample("8").await, Err(FetchError::NotFound(_))));

        assert_eq!(fetcher.sample_calls("7"), 3);
        assert_eq!(fetcher.calls()[0], FetchCall::Info("7".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_next_and_latency() {
        let fetcher = MockFetcher::new()
            .with_steady("1", 10, 50.0)
            .with_latency(Duration::from_secs(3));

        let started = tokio::time::Instant::now();
        fetcher.fail_next("1");
        assert!(fetcher.fetch_sample("1").await.is_err());
        assert!(fetcher.fetch_sample("1").await.is_ok());
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[test]
    fn test_payloads_match_parsers() {
        let game = ApiPayloadBuilder::game(42, "Obby", "Builders", 1234).to_string();
        let info = parse_info(&game, "42").unwrap();
        assert_eq!(info.name, "Obby");
        assert_eq!(info.creator_name, "Builders");
        assert!(info.is_valid());
        assert_eq!(parse_playing(&game, "42").unwrap(), 1234);

        let votes = ApiPayloadBuilder::votes(42, 30, 10).to_string();
        assert_eq!(parse_votes(&votes, "42").unwrap(), (30, 10));

        let empty = ApiPayloadBuilder::empty().to_string();
        assert!(parse_info(&empty, "42").is_err());
    }
}
