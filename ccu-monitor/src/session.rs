//! Session data model
//!
//! A [`MonitoringSession`] is the ordered run of samples for one universe.
//! Only the crate's sampler can append to it; everyone else reads.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::format_timestamp;
use crate::events::Channel;
use crate::fetcher::{EntityInfo, SampleReading};

/// One collected data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ccu: u64,
    pub rating: f64,
    pub timestamp: String,
}

impl Sample {
    pub fn from_reading(reading: SampleReading, at: DateTime<Local>) -> Self {
        Self {
            ccu: reading.ccu,
            rating: reading.rating,
            timestamp: format_timestamp(at),
        }
    }

    /// Stand-in for a tick whose fetch failed
    pub fn zero(at: DateTime<Local>) -> Self {
        Self::from_reading(SampleReading::zero(), at)
    }
}

/// Universe being monitored, with its info snapshot from session start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntity {
    pub id: String,
    pub info: EntityInfo,
}

impl TrackedEntity {
    pub fn new(id: impl Into<String>, info: EntityInfo) -> Self {
        Self { id: id.into(), info }
    }
}

/// Monitoring length in minutes, always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorDuration(NonZeroU32);

impl MonitorDuration {
    /// `None` for zero, negative or out-of-range values
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        u32::try_from(minutes).ok().and_then(NonZeroU32::new).map(Self)
    }

    pub fn minutes(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for MonitorDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.0)
    }
}

/// Append-only log lines, readable while the owner keeps appending
#[derive(Debug, Clone, Default)]
pub struct LogBook {
    lines: Arc<RwLock<Vec<String>>>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, line: String) {
        self.lines.write().push(line);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.read().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }
}

/// Lifecycle of a session. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    WaitingForBoundary,
    /// Collecting minute `k` (1-based)
    Sampling(u32),
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

#[derive(Debug, Clone)]
pub struct MonitoringSession {
    id: Uuid,
    entity: TrackedEntity,
    duration: MonitorDuration,
    channel: Channel,
    prefix: String,
    samples: Vec<Sample>,
    logs: LogBook,
    state: SessionState,
}

impl MonitoringSession {
    pub fn new(entity: TrackedEntity, duration: MonitorDuration, channel: Channel, prefix: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity,
            duration,
            channel,
            prefix: prefix.into(),
            samples: Vec::with_capacity(duration.minutes() as usize),
            logs: LogBook::new(),
            state: SessionState::Created,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entity(&self) -> &TrackedEntity {
        &self.entity
    }

    pub fn duration(&self) -> MonitorDuration {
        self.duration
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Shared handle on the log lines; stays valid after the session moves
    pub fn logs(&self) -> &LogBook {
        &self.logs
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.duration.minutes() as usize
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        debug_assert!(!self.state.is_terminal(), "terminal session is immutable");
        self.state = state;
    }

    /// Append one tick's sample with its formatted log line.
    ///
    /// Returns `false` (and records nothing) once the session holds its full
    /// duration or has ended.
    pub(crate) fn record(&mut self, sample: Sample, line: String) -> bool {
        if self.is_full() || self.state.is_terminal() {
            return false;
        }
        self.samples.push(sample);
        self.logs.append(line);
        true
    }

    /// Close the session: `Completed` when every minute was collected,
    /// `Cancelled` otherwise.
    pub(crate) fn finish(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = if self.is_full() {
            SessionState::Completed
        } else {
            SessionState::Cancelled
        };
    }
}

/// `"<prefix> Minute k/N - CCU: <ccu>, Rating: <r.r>% [<timestamp>]"`
pub fn format_tick_line(prefix: &str, minute: u32, total: u32, sample: &Sample) -> String {
    format!(
        "{} Minute {}/{} - CCU: {}, Rating: {:.1}% [{}]",
        prefix, minute, total, sample.ccu, sample.rating, sample.timestamp
    )
}
