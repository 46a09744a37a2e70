//! CCU Monitor - minute-aligned metrics sampling for Roblox universes
//!
//! The crate samples a universe's concurrent users (CCU) and approval rating
//! once per wall-clock minute and summarises the run when it ends:
//! - Sampler: bounded, minute-aligned collection loop for one universe
//! - Analyzer: averages, extrema and net change over collected samples
//! - Coordinator: two samplers on independent tasks, joined then compared
//! - Wizard: interactive prompts, validation gate and exit codes
//!
//! Collaborators sit behind traits ([`Fetcher`], [`Clock`], [`EventSink`]) so
//! the core never touches the network, the real clock or the terminal directly.

pub mod analyzer;
pub mod clock;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod events;
pub mod fetcher;
pub mod report;
pub mod sampler;
pub mod session;
pub mod wizard;

pub use analyzer::{Extremum, SessionSummary};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MonitorConfig;
pub use coordinator::{ComparisonResult, Coordinator, EntityStats};
pub use events::{Channel, EventSink, MemorySink, MonitorEvent, ReportLine, Tone};
pub use fetcher::{EntityInfo, FetchError, Fetcher, RobloxFetcher, SampleReading};
pub use sampler::Sampler;
pub use session::{LogBook, MonitorDuration, MonitoringSession, Sample, SessionState, TrackedEntity};
pub use wizard::{InputError, MonitorWizard, Outcome, Prompter};
