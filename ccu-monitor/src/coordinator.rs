//! Dual-universe collection and comparison
//!
//! Both sessions run on their own tokio task with their own minute alignment;
//! their ticks may skew slightly and nothing corrects that. The coordinator
//! joins both tasks, replays their logs side by side and derives the
//! comparison from the two finished sessions.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::analyzer::{Extremum, SessionSummary};
use crate::events::{Channel, EventSink, MonitorEvent};
use crate::sampler::Sampler;
use crate::session::MonitoringSession;

/// Per-universe figures of the comparison summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityStats {
    pub name: String,
    pub average_ccu: f64,
    pub peak: Option<Extremum>,
    pub trough: Option<Extremum>,
}

impl EntityStats {
    pub fn from_session(session: &MonitoringSession) -> Self {
        let summary = SessionSummary::from_samples(session.samples());
        Self {
            name: session.entity().info.name.clone(),
            average_ccu: summary.average_ccu,
            peak: summary.peak,
            trough: summary.trough,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub first: MonitoringSession,
    pub second: MonitoringSession,
    pub first_stats: EntityStats,
    pub second_stats: EntityStats,
    /// First minus second
    pub average_delta: f64,
    /// First peak minus second peak; `None` if either side is empty
    pub peak_delta: Option<i64>,
}

/// Merge two finished sessions into a comparison
pub fn compare(first: MonitoringSession, second: MonitoringSession) -> ComparisonResult {
    let first_stats = EntityStats::from_session(&first);
    let second_stats = EntityStats::from_session(&second);

    let average_delta = first_stats.average_ccu - second_stats.average_ccu;
    let peak_delta = match (&first_stats.peak, &second_stats.peak) {
        (Some(a), Some(b)) => Some(a.sample.ccu as i64 - b.sample.ccu as i64),
        _ => None,
    };

    ComparisonResult {
        first,
        second,
        first_stats,
        second_stats,
        average_delta,
        peak_delta,
    }
}

/// Presentation order of two log feeds: `a[i]` then `b[i]` for every `i`,
/// skipping whichever side ran out.
pub fn interleave(first: &[String], second: &[String]) -> Vec<MonitorEvent> {
    let rows = first.len().max(second.len());
    let mut merged = Vec::with_capacity(first.len() + second.len());

    for i in 0..rows {
        if let Some(line) = first.get(i) {
            merged.push(MonitorEvent::new(Channel::First, line.clone()));
        }
        if let Some(line) = second.get(i) {
            merged.push(MonitorEvent::new(Channel::Second, line.clone()));
        }
    }
    merged
}

pub struct Coordinator {
    sampler: Sampler,
    sink: Arc<dyn EventSink>,
    pacing: Duration,
}

impl Coordinator {
    pub fn new(sampler: Sampler, sink: Arc<dyn EventSink>, pacing: Duration) -> Self {
        Self { sampler, sink, pacing }
    }

    /// Run both sessions concurrently, wait for both, replay, compare
    pub async fn run(&self, first: MonitoringSession, second: MonitoringSession) -> Result<ComparisonResult> {
        info!("Starting paired monitoring of {} and {}", first.entity().id, second.entity().id);

        let first_task = {
            let sampler = self.sampler.clone();
            tokio::spawn(async move { sampler.run(first).await })
        };
        let second_task = {
            let sampler = self.sampler.clone();
            tokio::spawn(async move { sampler.run(second).await })
        };

        // Join barrier: either may finish first
        let (first, second) = tokio::join!(first_task, second_task);
        let first = first.context("First monitoring task failed")?;
        let second = second.context("Second monitoring task failed")?;
        debug!("Both sessions finished: {:?} / {:?}", first.state(), second.state());

        self.replay(&first, &second).await;
        Ok(compare(first, second))
    }

    /// Re-emit both logs in interleaved order, pausing after each first-universe line
    pub async fn replay(&self, first: &MonitoringSession, second: &MonitoringSession) {
        let merged = interleave(&first.logs().snapshot(), &second.logs().snapshot());

        for event in merged {
            let paced = event.channel == Channel::First;
            self.sink.emit(event);
            if paced && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::MemorySink;
    use crate::fetcher::{EntityInfo, FetchError, Fetcher, SampleReading};
    use crate::session::{MonitorDuration, SessionState, TrackedEntity};
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};

    struct FixedFetcher;

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch_info(&self, entity_id: &str) -> EntityInfo {
            EntityInfo {
                name: format!("Game {entity_id}"),
                ..EntityInfo::default()
            }
        }

        async fn fetch_sample(&self, entity_id: &str) -> Result<SampleReading, FetchError> {
            // Universe "1" is busier than "2"
            let ccu = if entity_id == "1" { 300 } else { 120 };
            Ok(SampleReading { ccu, rating: 75.0 })
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn empty_session(name: &str) -> MonitoringSession {
        let info = EntityInfo {
            name: name.into(),
            ..EntityInfo::default()
        };
        MonitoringSession::new(
            TrackedEntity::new(name, info),
            MonitorDuration::from_minutes(1).unwrap(),
            Channel::First,
            "",
        )
    }

    #[test]
    fn test_interleave_skips_missing_side() {
        let merged = interleave(&lines(&["a0", "a1"]), &lines(&["b0"]));
        let order: Vec<(Channel, &str)> = merged.iter().map(|e| (e.channel, e.text.as_str())).collect();
        assert_eq!(
            order,
            vec![(Channel::First, "a0"), (Channel::Second, "b0"), (Channel::First, "a1")]
        );
    }

    #[test]
    fn test_interleave_longer_second_feed() {
        let merged = interleave(&lines(&["a0"]), &lines(&["b0", "b1", "b2"]));
        let texts: Vec<&str> = merged.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["a0", "b0", "b1", "b2"]);
        assert!(interleave(&[], &[]).is_empty());
    }

    #[test]
    fn test_compare_empty_sessions_has_no_peaks() {
        let result = compare(empty_session("A"), empty_session("B"));
        assert_eq!(result.first_stats.name, "A");
        assert!(result.first_stats.peak.is_none());
        assert!(result.second_stats.trough.is_none());
        assert_eq!(result.average_delta, 0.0);
        assert_eq!(result.peak_delta, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_paces_after_first_lines() {
        let sink = MemorySink::new();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap());
        let sampler = Sampler::new(Arc::new(FixedFetcher), Arc::new(clock), Arc::new(sink.clone()));
        let coordinator = Coordinator::new(sampler.clone(), Arc::new(sink.clone()), Duration::from_secs(1));

        let first = sampler
            .monitor("1", MonitorDuration::from_minutes(2).unwrap(), Channel::First, "[GAME 1]")
            .await;
        let second = sampler
            .monitor("2", MonitorDuration::from_minutes(1).unwrap(), Channel::Second, "[GAME 2]")
            .await;
        sink.clear();

        let started = tokio::time::Instant::now();
        coordinator.replay(&first, &second).await;

        // One pause per first-universe line
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        let channels: Vec<Channel> = sink.events().iter().map(|e| e.channel).collect();
        assert_eq!(channels, vec![Channel::First, Channel::Second, Channel::First]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_joins_both_sessions_and_compares() {
        let sink = MemorySink::new();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 5, 17, 12, 0, 10).unwrap());
        let sampler = Sampler::new(Arc::new(FixedFetcher), Arc::new(clock), Arc::new(sink.clone()));
        let coordinator = Coordinator::new(sampler.clone(), Arc::new(sink.clone()), Duration::ZERO);

        let duration = MonitorDuration::from_minutes(3).unwrap();
        let first = sampler.open_session("1", duration, Channel::First, "[GAME 1]").await;
        let second = sampler.open_session("2", duration, Channel::Second, "[GAME 2]").await;

        let result = coordinator.run(first, second).await.unwrap();

        assert_eq!(result.first.state(), SessionState::Completed);
        assert_eq!(result.second.state(), SessionState::Completed);
        assert_eq!(result.first.samples().len(), 3);
        assert_eq!(result.second.samples().len(), 3);
        assert_eq!(result.first_stats.name, "Game 1");
        assert_eq!(result.average_delta, 180.0);
        assert_eq!(result.peak_delta, Some(180));

        // Both tasks wake on every boundary, none is skipped
        let minutes = vec!["2024-05-17 12:01:00", "2024-05-17 12:02:00", "2024-05-17 12:03:00"];
        for session in [&result.first, &result.second] {
            let stamps: Vec<&str> = session.samples().iter().map(|s| s.timestamp.as_str()).collect();
            assert_eq!(stamps, minutes);
        }

        // Live lines plus the replayed copy of each
        assert_eq!(sink.texts_on(Channel::First).len(), 6);
        assert_eq!(sink.texts_on(Channel::Second).len(), 6);
    }
}
