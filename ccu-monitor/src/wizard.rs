//! Interactive entry point
//!
//! Prompts for the mode, the universe id(s) and the duration, applies the
//! validation gate and then drives either a single session or a paired
//! comparison through to the final report.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::coordinator::Coordinator;
use crate::events::{Channel, EventSink, MonitorEvent, ReportLine, Tone};
use crate::fetcher::{EntityInfo, Fetcher};
use crate::report::{banner, comparison_block, info_block, session_results, Report};
use crate::sampler::Sampler;
use crate::session::{MonitorDuration, MonitoringSession, TrackedEntity};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Universe ID cannot be empty")]
    EmptyId,

    #[error("Invalid input. Please enter a number.")]
    NotANumber(String),

    #[error("Invalid duration. Please enter a positive number.")]
    NonPositive(i64),

    #[error("Input ended before all questions were answered")]
    EndOfInput,

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Parse a duration answer; the whole trimmed answer must be an integer
pub fn parse_duration(answer: &str) -> Result<MonitorDuration, InputError> {
    let answer = answer.trim();
    let minutes: i64 = answer
        .parse()
        .map_err(|_| InputError::NotANumber(answer.to_string()))?;
    MonitorDuration::from_minutes(minutes).ok_or(InputError::NonPositive(minutes))
}

pub fn parse_entity_id(answer: &str) -> Result<String, InputError> {
    match answer.trim() {
        "" => Err(InputError::EmptyId),
        id => Ok(id.to_string()),
    }
}

/// Line-oriented question/answer over any reader and writer
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Print `question` without a newline and read one answer line
    pub fn prompt(&mut self, question: &str) -> Result<String, InputError> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Yes when the answer starts with `y` or `Y`
    pub fn confirm(&mut self, question: &str) -> Result<bool, InputError> {
        let answer = self.prompt(question)?;
        Ok(matches!(answer.chars().next(), Some('y' | 'Y')))
    }

    fn read_line(&mut self) -> Result<String, InputError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputError::EndOfInput);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

/// How the interactive run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Bad duration or input closed early
    InvalidInput,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Completed => ExitCode::SUCCESS,
            Outcome::InvalidInput => ExitCode::from(1),
        }
    }
}

enum Request {
    Single(TrackedEntity),
    Compare(TrackedEntity, TrackedEntity),
}

pub struct MonitorWizard {
    config: MonitorConfig,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
    watch_interrupts: bool,
}

impl MonitorWizard {
    pub fn new(
        config: MonitorConfig,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            clock,
            sink,
            cancel: CancellationToken::new(),
            watch_interrupts: false,
        }
    }

    /// Cancel monitoring on Ctrl-C once sampling has started
    pub fn with_interrupts(mut self) -> Self {
        self.watch_interrupts = true;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub async fn run<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<Outcome> {
        let mut title = Report::new();
        title
            .push(Tone::Frame(Channel::Plain), "Roblox Game Monitoring Tool")
            .push(Tone::Frame(Channel::Plain), "=".repeat(40));
        self.sink.present(title.lines());

        let (request, duration) = match self.ask(prompter).await {
            Ok(answers) => answers,
            Err(e @ (InputError::NotANumber(_) | InputError::NonPositive(_))) => {
                self.sink.present(&[ReportLine::new(Tone::Error, e.to_string())]);
                return Ok(Outcome::InvalidInput);
            }
            Err(InputError::EndOfInput) => {
                warn!("Input closed before monitoring could start");
                return Ok(Outcome::InvalidInput);
            }
            Err(e) => return Err(e).context("Failed to read answers"),
        };

        match request {
            Request::Single(entity) => self.run_single(entity, duration).await,
            Request::Compare(first, second) => self.run_compare(first, second, duration).await?,
        }
        Ok(Outcome::Completed)
    }

    async fn ask<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
    ) -> Result<(Request, MonitorDuration), InputError> {
        let request = if prompter.confirm("Initiate compare mode? (y/n): ")? {
            let first = self.ask_entity(prompter, "Enter first Roblox Universe ID: ").await?;
            let second = self.ask_entity(prompter, "Enter second Roblox Universe ID: ").await?;
            Request::Compare(first, second)
        } else {
            Request::Single(self.ask_entity(prompter, "Enter Roblox Universe ID: ").await?)
        };

        let duration = parse_duration(&prompter.prompt("Enter monitoring duration (minutes): ")?)?;
        Ok((request, duration))
    }

    /// Re-prompt until the id is non-empty and its info passes the gate
    async fn ask_entity<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
        question: &str,
    ) -> Result<TrackedEntity, InputError> {
        loop {
            let id = match parse_entity_id(&prompter.prompt(question)?) {
                Ok(id) => id,
                Err(InputError::EmptyId) => continue,
                Err(e) => return Err(e),
            };

            let info: EntityInfo = self.fetcher.fetch_info(&id).await;
            if info.is_valid() {
                debug!("Universe {} accepted as {}", id, info.name);
                return Ok(TrackedEntity::new(id, info));
            }
            self.sink.present(&[ReportLine::new(
                Tone::Error,
                "Invalid Universe ID (N/A returned). Please try again.",
            )]);
        }
    }

    fn sampler(&self) -> Sampler {
        Sampler::new(self.fetcher.clone(), self.clock.clone(), self.sink.clone())
            .with_cancellation(self.cancel.clone())
    }

    fn watch_for_interrupt(&self) {
        if !self.watch_interrupts {
            return;
        }
        let token = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping monitoring");
                token.cancel();
            }
        });
    }

    async fn run_single(&self, entity: TrackedEntity, duration: MonitorDuration) {
        let session = MonitoringSession::new(entity, duration, Channel::Plain, "");

        let mut intro = Report::new();
        intro.blank().extend(info_block(&session.entity().info, Channel::Plain));
        self.sink.present(intro.lines());

        self.watch_for_interrupt();
        let session = self.sampler().run(session).await;

        for line in session.logs().snapshot() {
            self.sink.emit(MonitorEvent::new(Channel::Plain, line));
        }

        let mut outro = session_results(&session);
        outro.blank().push(Tone::Success, "Monitoring completed successfully!");
        self.sink.present(outro.lines());
        info!("Single monitoring finished in state {:?}", session.state());
    }

    async fn run_compare(&self, first: TrackedEntity, second: TrackedEntity, duration: MonitorDuration) -> Result<()> {
        let first = MonitoringSession::new(first, duration, Channel::First, "[GAME 1]");
        let second = MonitoringSession::new(second, duration, Channel::Second, "[GAME 2]");

        let mut intro = Report::new();
        intro
            .blank()
            .extend(banner("GAME 1 INFO", Tone::Frame(Channel::First)))
            .extend(info_block(&first.entity().info, Channel::First))
            .extend(banner("GAME 2 INFO", Tone::Frame(Channel::Second)))
            .extend(info_block(&second.entity().info, Channel::Second));
        self.sink.present(intro.lines());

        self.watch_for_interrupt();
        let coordinator = Coordinator::new(self.sampler(), self.sink.clone(), self.config.presentation.pacing_delay());
        let result = coordinator.run(first, second).await?;

        let mut outro = Report::new();
        outro
            .blank()
            .blank()
            .extend(banner("GAME 1 RESULTS", Tone::Frame(Channel::Plain)))
            .extend(session_results(&result.first))
            .blank()
            .blank()
            .extend(banner("GAME 2 RESULTS", Tone::Frame(Channel::Plain)))
            .extend(session_results(&result.second))
            .extend(comparison_block(&result));
        self.sink.present(outro.lines());
        Ok(())
    }
}
