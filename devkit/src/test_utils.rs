/*!
Test Harness pour le moniteur CCU

Facilite l'écriture de scénarios de bout en bout avec:
- Setup automatique du fetcher simulé, de l'horloge manuelle et du sink mémoire
- Exécution de sessions simples ou comparées sans attente réelle
- Assertions sur l'ordre des échantillons
*/

use anyhow::{Context, Result};
use ccu_monitor::{
    Channel, ComparisonResult, Coordinator, ManualClock, MemorySink, MonitorConfig, MonitorDuration, MonitorWizard,
    MonitoringSession, Sampler,
};
use chrono::{DateTime, Local, TimeZone};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::fetcher_stub::MockFetcher;

/// Harness de test complet: un fetcher, une horloge, un sink
pub struct TestHarness {
    pub fetcher: MockFetcher,
    pub clock: ManualClock,
    pub sink: MemorySink,
    cancel: CancellationToken,
}

impl TestHarness {
    /// Crée un nouveau harness démarrant à 10:00:30, heure locale
    pub fn new() -> Self {
        let start = Local
            .with_ymd_and_hms(2024, 1, 15, 10, 0, 30)
            .earliest()
            .unwrap_or_else(Local::now);
        Self::starting_at(start)
    }

    pub fn starting_at(start: DateTime<Local>) -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        Self {
            fetcher: MockFetcher::new(),
            clock: ManualClock::new(start),
            sink: MemorySink::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Remplace le fetcher (construit avec les helpers de `MockFetcher`)
    pub fn with_fetcher(mut self, fetcher: MockFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Token partagé par tous les samplers du harness
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn sampler(&self) -> Sampler {
        Sampler::new(
            Arc::new(self.fetcher.clone()),
            Arc::new(self.clock.clone()),
            Arc::new(self.sink.clone()),
        )
        .with_cancellation(self.cancel.clone())
    }

    /// Coordinateur sans pause entre les lignes rejouées
    pub fn coordinator(&self) -> Coordinator {
        Coordinator::new(self.sampler(), Arc::new(self.sink.clone()), Duration::ZERO)
    }

    /// Wizard branché sur les collaborateurs du harness
    pub fn wizard(&self) -> MonitorWizard {
        let mut config = MonitorConfig::default();
        config.presentation.pacing_delay_ms = 0;
        MonitorWizard::new(
            config,
            Arc::new(self.fetcher.clone()),
            Arc::new(self.clock.clone()),
            Arc::new(self.sink.clone()),
        )
        .with_cancellation(self.cancel.clone())
    }

    fn duration(minutes: i64) -> Result<MonitorDuration> {
        MonitorDuration::from_minutes(minutes).with_context(|| format!("Invalid test duration: {}", minutes))
    }

    /// Exécute une session simple jusqu'à son état terminal
    pub async fn run_single(&self, entity_id: &str, minutes: i64) -> Result<MonitoringSession> {
        let session = self
            .sampler()
            .monitor(entity_id, Self::duration(minutes)?, Channel::Plain, "")
            .await;
        log::info!("🏁 Single run of {} ended in {:?}", entity_id, session.state());
        Ok(session)
    }

    /// Exécute deux sessions en parallèle puis la comparaison
    pub async fn run_pair(&self, first: &str, second: &str, minutes: i64) -> Result<ComparisonResult> {
        let duration = Self::duration(minutes)?;
        let sampler = self.sampler();
        let first = sampler.open_session(first, duration, Channel::First, "[GAME 1]").await;
        let second = sampler.open_session(second, duration, Channel::Second, "[GAME 2]").await;

        let result = self.coordinator().run(first, second).await?;
        log::info!("🏁 Paired run ended, average delta {:.2}", result.average_delta);
        Ok(result)
    }

    /// Vérifie N échantillons au plus, horodatés dans l'ordre strict
    pub fn assert_ordered(&self, session: &MonitoringSession) -> Result<()> {
        let samples = session.samples();
        let limit = session.duration().minutes() as usize;
        if samples.len() > limit {
            anyhow::bail!("Session holds {} samples, limit is {}", samples.len(), limit);
        }

        for pair in samples.windows(2) {
            if pair[0].timestamp >= pair[1].timestamp {
                anyhow::bail!("Samples out of order: {} then {}", pair[0].timestamp, pair[1].timestamp);
            }
        }
        log::info!("✅ {} samples in order", samples.len());
        Ok(())
    }

    /// Stats sur les événements collectés
    pub fn get_stats(&self) -> HarnessStats {
        let mut channel_counts = HashMap::new();
        for event in self.sink.events() {
            *channel_counts.entry(event.channel).or_insert(0) += 1;
        }

        HarnessStats {
            total_events: self.sink.events().len(),
            channel_counts,
            report_lines: self.sink.report().len(),
            fetch_calls: self.fetcher.calls().len(),
        }
    }

    /// Reset le sink et le journal d'appels pour un nouveau scénario
    pub fn reset(&mut self) {
        self.sink.clear();
        self.fetcher.clear_calls();
        log::info!("🧹 Test harness reset");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct HarnessStats {
    pub total_events: usize,
    pub channel_counts: HashMap<Channel, usize>,
    pub report_lines: usize,
    pub fetch_calls: usize,
}
