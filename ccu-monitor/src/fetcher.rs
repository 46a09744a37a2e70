//! Remote metrics collaborator
//!
//! Provides the per-tick sample and the one-off universe description:
//! - [`Fetcher`] trait consumed by the sampler and the wizard
//! - [`RobloxFetcher`] HTTP implementation against the public games API
//! - Wire decoding helpers, kept pure so they can be tested without a network

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;

/// Placeholder for any field the API did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Descriptive universe information, fetched once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub name: String,
    pub description: String,
    pub created: String,
    pub creator_name: String,
    pub creator_type: String,
}

impl Default for EntityInfo {
    fn default() -> Self {
        Self {
            name: NOT_AVAILABLE.to_string(),
            description: NOT_AVAILABLE.to_string(),
            created: NOT_AVAILABLE.to_string(),
            creator_name: NOT_AVAILABLE.to_string(),
            creator_type: NOT_AVAILABLE.to_string(),
        }
    }
}

impl EntityInfo {
    /// Validation gate: the universe exists if name, creation date and
    /// creator were all resolved.
    pub fn is_valid(&self) -> bool {
        self.name != NOT_AVAILABLE && self.created != NOT_AVAILABLE && self.creator_name != NOT_AVAILABLE
    }
}

/// One tick's raw metrics, before the sampler stamps it with a time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleReading {
    pub ccu: u64,
    pub rating: f64,
}

impl SampleReading {
    pub fn zero() -> Self {
        Self { ccu: 0, rating: 0.0 }
    }

    /// Rating is the upvote share in percent, 0 when nobody voted
    pub fn from_votes(ccu: u64, up_votes: u64, down_votes: u64) -> Self {
        let total = up_votes as f64 + down_votes as f64;
        let rating = if total > 0.0 {
            up_votes as f64 / total * 100.0
        } else {
            0.0
        };
        Self { ccu, rating }
    }
}

/// Soft failures while talking to the metrics API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Response decoding failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("No data returned for universe {0}")]
    NotFound(String),
}

/// Metrics source for one universe id
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Descriptive info; unavailable fields come back as `"N/A"`, never an error.
    async fn fetch_info(&self, entity_id: &str) -> EntityInfo;

    async fn fetch_sample(&self, entity_id: &str) -> Result<SampleReading, FetchError>;
}

// Wire format of the games API

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct GameRecord {
    name: Option<String>,
    description: Option<String>,
    created: Option<String>,
    creator: Option<CreatorRecord>,
    playing: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreatorRecord {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRecord {
    up_votes: u64,
    down_votes: u64,
}

fn first_record<T>(body: &str, entity_id: &str) -> Result<T, FetchError>
where
    T: for<'de> Deserialize<'de>,
{
    let envelope: DataEnvelope<T> = serde_json::from_str(body)?;
    envelope
        .data
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NotFound(entity_id.to_string()))
}

/// Decode `/v1/games?universeIds=` into [`EntityInfo`]
pub fn parse_info(body: &str, entity_id: &str) -> Result<EntityInfo, FetchError> {
    let game: GameRecord = first_record(body, entity_id)?;
    let or_na = |field: Option<String>| field.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let (creator_name, creator_type) = match game.creator {
        Some(creator) => (or_na(creator.name), or_na(creator.kind)),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    Ok(EntityInfo {
        name: or_na(game.name),
        description: or_na(game.description),
        created: or_na(game.created),
        creator_name,
        creator_type,
    })
}

/// Current player count from `/v1/games?universeIds=`
pub fn parse_playing(body: &str, entity_id: &str) -> Result<u64, FetchError> {
    let game: GameRecord = first_record(body, entity_id)?;
    Ok(game.playing.unwrap_or(0))
}

/// `(up, down)` vote counts from `/v1/games/votes?universeIds=`
pub fn parse_votes(body: &str, entity_id: &str) -> Result<(u64, u64), FetchError> {
    let votes: VoteRecord = first_record(body, entity_id)?;
    Ok((votes.up_votes, votes.down_votes))
}

/// HTTP fetcher for the public Roblox games API
#[derive(Debug, Clone)]
pub struct RobloxFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl RobloxFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.games_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn games_url(&self, entity_id: &str) -> String {
        format!("{}/v1/games?universeIds={}", self.base_url, entity_id)
    }

    fn votes_url(&self, entity_id: &str) -> String {
        format!("{}/v1/games/votes?universeIds={}", self.base_url, entity_id)
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    async fn try_fetch_info(&self, entity_id: &str) -> Result<EntityInfo, FetchError> {
        let body = self.get_body(&self.games_url(entity_id)).await?;
        parse_info(&body, entity_id)
    }
}

#[async_trait]
impl Fetcher for RobloxFetcher {
    async fn fetch_info(&self, entity_id: &str) -> EntityInfo {
        match self.try_fetch_info(entity_id).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Info lookup for {} failed: {}", entity_id, e);
                EntityInfo::default()
            }
        }
    }

    async fn fetch_sample(&self, entity_id: &str) -> Result<SampleReading, FetchError> {
        let games = self.get_body(&self.games_url(entity_id)).await?;
        let ccu = parse_playing(&games, entity_id)?;

        let votes = self.get_body(&self.votes_url(entity_id)).await?;
        let (up, down) = parse_votes(&votes, entity_id)?;

        Ok(SampleReading::from_votes(ccu, up, down))
    }
}
