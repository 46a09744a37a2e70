//! Minute-aligned sampling loop
//!
//! One [`Sampler`] run owns one [`MonitoringSession`] and fills it with
//! exactly `N` samples, one per wall-clock minute boundary:
//! - wait for the next boundary (recomputed from the current time each tick)
//! - fetch, stamp, append, emit the tick line
//! - a failed fetch becomes a zero sample, the run never aborts
//!
//! The two suspension points (boundary wait and fetch) also watch an optional
//! cancellation token. Without cancellation the run always lasts `N` ticks.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::clock::{format_timestamp, next_minute_boundary, Clock};
use crate::events::{Channel, EventSink, MonitorEvent};
use crate::fetcher::Fetcher;
use crate::session::{format_tick_line, MonitorDuration, MonitoringSession, Sample, SessionState, TrackedEntity};

#[derive(Clone)]
pub struct Sampler {
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl Sampler {
    pub fn new(fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            fetcher,
            clock,
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop runs early at their next suspension point when `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Create a session, fetching the universe info once
    pub async fn open_session(
        &self,
        entity_id: &str,
        duration: MonitorDuration,
        channel: Channel,
        prefix: &str,
    ) -> MonitoringSession {
        let info = self.fetcher.fetch_info(entity_id).await;
        debug!("Opened session for {} ({})", entity_id, info.name);
        MonitoringSession::new(TrackedEntity::new(entity_id, info), duration, channel, prefix)
    }

    /// Drive `session` to a terminal state and hand it back
    pub async fn run(&self, session: MonitoringSession) -> MonitoringSession {
        let span = info_span!("session", id = %session.id(), entity = %session.entity().id);
        self.collect(session).instrument(span).await
    }

    /// Convenience: [`open_session`](Self::open_session) then [`run`](Self::run)
    pub async fn monitor(
        &self,
        entity_id: &str,
        duration: MonitorDuration,
        channel: Channel,
        prefix: &str,
    ) -> MonitoringSession {
        let session = self.open_session(entity_id, duration, channel, prefix).await;
        self.run(session).await
    }

    async fn collect(&self, mut session: MonitoringSession) -> MonitoringSession {
        if session.state().is_terminal() {
            warn!("Session {} already ended as {:?}, not sampling again", session.id(), session.state());
            return session;
        }

        let total = session.duration().minutes();
        info!("Monitoring {} for {} minute(s)", session.entity().id, total);

        session.set_state(SessionState::WaitingForBoundary);
        if !self.wait_for_next_boundary().await {
            return self.stop_early(session);
        }

        for minute in 1..=total {
            session.set_state(SessionState::Sampling(minute));

            let Some(sample) = self.take_sample(&session.entity().id).await else {
                return self.stop_early(session);
            };

            let line = format_tick_line(session.prefix(), minute, total, &sample);
            self.sink.emit(MonitorEvent::new(session.channel(), line.clone()));
            session.record(sample, line);

            session.set_state(SessionState::WaitingForBoundary);
            if !self.wait_for_next_boundary().await {
                return self.stop_early(session);
            }
        }

        session.finish();
        info!("Session complete with {} samples", session.samples().len());
        session
    }

    /// Fetch one tick. `None` only when cancelled mid-fetch.
    async fn take_sample(&self, entity_id: &str) -> Option<Sample> {
        let at = self.clock.now();

        let reading = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            reading = self.fetcher.fetch_sample(entity_id) => reading,
        };

        let sample = match reading {
            Ok(reading) => Sample::from_reading(reading, at),
            Err(e) => {
                warn!("Fetch for {} at {} failed, recording zero sample: {}", entity_id, format_timestamp(at), e);
                Sample::zero(at)
            }
        };
        Some(sample)
    }

    /// `false` when cancelled before the boundary arrived
    async fn wait_for_next_boundary(&self) -> bool {
        let boundary = next_minute_boundary(self.clock.now());
        debug!("Waiting for boundary {}", format_timestamp(boundary));

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = self.clock.sleep_until(boundary) => true,
        }
    }

    fn stop_early(&self, mut session: MonitoringSession) -> MonitoringSession {
        session.finish();
        warn!(
            "Monitoring of {} stopped after {}/{} samples",
            session.entity().id,
            session.samples().len(),
            session.duration().minutes()
        );
        session
    }
}
