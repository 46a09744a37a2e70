//! Structured output records
//!
//! The core never colours or prints anything itself. Samplers emit
//! [`MonitorEvent`]s tagged with the universe's [`Channel`], the report
//! builder produces [`ReportLine`]s tagged with a [`Tone`], and an
//! [`EventSink`] decides how to render them.

use parking_lot::Mutex;
use std::sync::Arc;

/// Which tracked universe a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    First,
    Second,
    /// Single-universe mode or text not tied to a universe
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub channel: Channel,
    pub text: String,
}

impl MonitorEvent {
    pub fn new(channel: Channel, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
        }
    }
}

/// Visual role of a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Framing rules and titles of a universe's info block
    Frame(Channel),
    Success,
    Heading,
    Points,
    Error,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub tone: Tone,
    pub text: String,
}

impl ReportLine {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

/// Destination for live events and finished report sections
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MonitorEvent);

    fn present(&self, lines: &[ReportLine]);
}

/// Sink that records everything in memory, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<MonitorEvent>>>,
    report: Arc<Mutex<Vec<ReportLine>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().clone()
    }

    /// Event texts on one channel, in emission order
    pub fn texts_on(&self, channel: Channel) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.channel == channel)
            .map(|e| e.text.clone())
            .collect()
    }

    pub fn report(&self) -> Vec<ReportLine> {
        self.report.lock().clone()
    }

    /// Whole report as plain text, one line per entry
    pub fn report_text(&self) -> String {
        self.report
            .lock()
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.report.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: MonitorEvent) {
        self.events.lock().push(event);
    }

    fn present(&self, lines: &[ReportLine]) {
        self.report.lock().extend_from_slice(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order_per_channel() {
        let sink = MemorySink::new();
        sink.emit(MonitorEvent::new(Channel::First, "a0"));
        sink.emit(MonitorEvent::new(Channel::Second, "b0"));
        sink.emit(MonitorEvent::new(Channel::First, "a1"));

        assert_eq!(sink.texts_on(Channel::First), vec!["a0", "a1"]);
        assert_eq!(sink.texts_on(Channel::Second), vec!["b0"]);
        assert_eq!(sink.events().len(), 3);
    }

    #[test]
    fn test_memory_sink_report_text() {
        let sink = MemorySink::new();
        sink.present(&[
            ReportLine::new(Tone::Heading, "TITLE"),
            ReportLine::new(Tone::Body, "body"),
        ]);
        assert_eq!(sink.report_text(), "TITLE\nbody");

        sink.clear();
        assert!(sink.report().is_empty());
    }
}
