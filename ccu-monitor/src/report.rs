//! Final report rendering
//!
//! Builds the text sections shown once monitoring is over, as tone-tagged
//! [`ReportLine`]s. Colours are the console's business.

use std::fmt;

use crate::analyzer::{Extremum, SessionSummary};
use crate::coordinator::{ComparisonResult, EntityStats};
use crate::events::{Channel, ReportLine, Tone};
use crate::fetcher::{EntityInfo, NOT_AVAILABLE};
use crate::session::MonitoringSession;

const RULE_WIDTH: usize = 60;

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

/// Ordered collection of report lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tone: Tone, text: impl Into<String>) -> &mut Self {
        self.lines.push(ReportLine::new(tone, text));
        self
    }

    pub fn body(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Tone::Body, text)
    }

    pub fn blank(&mut self) -> &mut Self {
        self.body("")
    }

    pub fn extend(&mut self, other: Report) -> &mut Self {
        self.lines.extend(other.lines);
        self
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

/// `=== <title> ===` banner preceding a per-universe section
pub fn banner(title: &str, tone: Tone) -> Report {
    let mut report = Report::new();
    report.push(tone, format!("=== {} ===", title));
    report
}

pub fn info_block(info: &EntityInfo, channel: Channel) -> Report {
    let frame = Tone::Frame(channel);
    let mut report = Report::new();
    report
        .push(frame, rule('='))
        .push(frame, "GAME INFO")
        .push(frame, rule('='))
        .body(format!("Name:        {}", info.name))
        .body(format!("Created:     {}", info.created))
        .body(format!("Creator:     {} ({})", info.creator_name, info.creator_type))
        .body(format!("Description: {}", info.description))
        .push(frame, rule('='))
        .blank();
    report
}

fn signed_int(value: i64) -> String {
    format!("{:+}", value)
}

fn signed_float(value: f64, decimals: usize) -> String {
    // Avoid "-0.00" for a change that rounds to nothing
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:+.*}", decimals, value)
}

fn ccu_change_line(summary: &SessionSummary) -> String {
    let percent = match summary.net_ccu_change_percent {
        Some(percent) => format!("({:.1}%)", percent),
        None => format!("({}%)", NOT_AVAILABLE),
    };
    format!("Net CCU Change: {} {}", signed_int(summary.net_ccu_change), percent)
}

fn ccu_extremum_line(label: &str, extremum: &Option<Extremum>) -> String {
    match extremum {
        Some(e) => format!(
            "{}: {} [{}] (Minute {})",
            label,
            e.sample.ccu,
            e.sample.timestamp,
            e.minute()
        ),
        None => format!("{}: {}", label, NOT_AVAILABLE),
    }
}

fn rating_extremum_line(label: &str, extremum: &Option<Extremum>) -> String {
    match extremum {
        Some(e) => format!("{}: {:.1}% [{}]", label, e.sample.rating, e.sample.timestamp),
        None => format!("{}: {}", label, NOT_AVAILABLE),
    }
}

/// Results summary, CCU and rating analysis, then every data point
pub fn session_results(session: &MonitoringSession) -> Report {
    let samples = session.samples();
    let summary = SessionSummary::from_samples(samples);
    let mut report = Report::new();

    report
        .blank()
        .push(Tone::Success, rule('='))
        .push(Tone::Success, "MONITORING COMPLETE - RESULTS SUMMARY")
        .push(Tone::Success, rule('='));

    if summary.is_empty() {
        report.body("No data collected!");
        return report;
    }

    let info = &session.entity().info;
    if !info.name.is_empty() {
        report.body(format!("Game: {}", info.name));
    }
    report
        .body(format!("Game ID: {}", session.entity().id))
        .body(format!("Monitoring Duration: {}", session.duration()))
        .body(format!("Total Data Points: {}", summary.points));

    report.blank().push(Tone::Heading, "CONCURRENT USERS (CCU) ANALYSIS:");
    if let (Some(start), Some(end)) = (&summary.start, &summary.end) {
        report
            .body(format!("Starting CCU: {} [{}]", start.ccu, start.timestamp))
            .body(format!("Ending CCU: {} [{}]", end.ccu, end.timestamp));
    }
    report
        .body(ccu_extremum_line("Lowest CCU", &summary.trough))
        .body(ccu_extremum_line("Highest CCU", &summary.peak))
        .body(format!("CCU Average: {:.2}", summary.average_ccu))
        .body(ccu_change_line(&summary));

    report.blank().push(Tone::Heading, "RATING ANALYSIS:");
    if let (Some(start), Some(end)) = (&summary.start, &summary.end) {
        report
            .body(format!("Starting Rating: {:.1}% [{}]", start.rating, start.timestamp))
            .body(format!("Ending Rating: {:.1}% [{}]", end.rating, end.timestamp));
    }
    report
        .body(rating_extremum_line("Lowest Rating", &summary.rating_low))
        .body(rating_extremum_line("Highest Rating", &summary.rating_high))
        .body(format!("Net Rating Change: {}%", signed_float(summary.net_rating_change, 2)));

    report
        .blank()
        .push(Tone::Points, "DETAILED DATA POINTS:")
        .push(Tone::Points, rule('-'));
    for (i, sample) in samples.iter().enumerate() {
        let point = format!(
            "Point {}: CCU={}, Rating={:.1}% [{}]",
            i + 1,
            sample.ccu,
            sample.rating,
            sample.timestamp
        );
        report.push(Tone::Points, point);
    }
    report.push(Tone::Success, rule('='));

    report
}

fn comparison_extremum_line(stats: &EntityStats, extremum: &Option<Extremum>) -> String {
    match extremum {
        Some(e) => format!(
            "{}: {} (Minute {}, {})",
            stats.name,
            e.sample.ccu,
            e.minute(),
            e.sample.timestamp
        ),
        None => format!("{}: {}", stats.name, NOT_AVAILABLE),
    }
}

/// Side-by-side summary for compare mode
pub fn comparison_block(result: &ComparisonResult) -> Report {
    let (a, b) = (&result.first_stats, &result.second_stats);
    let mut report = Report::new();

    report
        .blank()
        .blank()
        .push(Tone::Success, "=== COMPARISON SUMMARY ===")
        .push(Tone::Success, rule('='))
        .body(format!("Game 1: {}", a.name))
        .body(format!("Game 2: {}", b.name))
        .body(format!("Monitoring Duration: {}", result.first.duration()));

    report
        .blank()
        .body("CCU Averages:")
        .body(format!("{}: {:.2}", a.name, a.average_ccu))
        .body(format!("{}: {:.2}", b.name, b.average_ccu));

    report
        .blank()
        .body("Peak CCU:")
        .body(comparison_extremum_line(a, &a.peak))
        .body(comparison_extremum_line(b, &b.peak));

    report
        .blank()
        .body("Lowest CCU:")
        .body(comparison_extremum_line(a, &a.trough))
        .body(comparison_extremum_line(b, &b.trough));

    let peak_delta = result
        .peak_delta
        .map(signed_int)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    report
        .blank()
        .body("Difference (Game 1 - Game 2):")
        .body(format!("Average CCU: {}", signed_float(result.average_delta, 2)))
        .body(format!("Peak CCU: {}", peak_delta))
        .push(Tone::Success, rule('='));

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::compare;
    use crate::session::{MonitorDuration, Sample, TrackedEntity};

    fn info(name: &str) -> EntityInfo {
        EntityInfo {
            name: name.into(),
            description: "Climb".into(),
            created: "2023-06-01T10:00:00Z".into(),
            creator_name: "BuilderCo".into(),
            creator_type: "Group".into(),
        }
    }

    /// Session filled through the crate-internal recorder, as the sampler would
    fn session(name: &str, points: &[(u64, f64)]) -> MonitoringSession {
        let mut session = MonitoringSession::new(
            TrackedEntity::new("4922741943", info(name)),
            MonitorDuration::from_minutes(points.len().max(1) as i64).unwrap(),
            Channel::Plain,
            "",
        );
        for (i, &(ccu, rating)) in points.iter().enumerate() {
            let sample = Sample {
                ccu,
                rating,
                timestamp: format!("2024-05-17 12:{:02}:00", i + 1),
            };
            session.record(sample, String::new());
        }
        session.finish();
        session
    }

    #[test]
    fn test_info_block_layout() {
        let text = info_block(&info("Obby Tower"), Channel::First).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(60));
        assert_eq!(lines[1], "GAME INFO");
        assert_eq!(lines[3], "Name:        Obby Tower");
        assert_eq!(lines[5], "Creator:     BuilderCo (Group)");
        assert_eq!(lines[6], "Description: Climb");
    }

    #[test]
    fn test_info_block_frame_uses_channel() {
        let report = info_block(&info("X"), Channel::Second);
        assert_eq!(report.lines()[0].tone, Tone::Frame(Channel::Second));
        assert_eq!(report.lines()[3].tone, Tone::Body);
    }

    #[test]
    fn test_results_for_constant_run() {
        let text = session_results(&session("Obby Tower", &[(100, 50.0); 5])).to_string();

        assert!(text.contains("Game: Obby Tower"));
        assert!(text.contains("Monitoring Duration: 5 minutes"));
        assert!(text.contains("Total Data Points: 5"));
        assert!(text.contains("Lowest CCU: 100 [2024-05-17 12:01:00] (Minute 1)"));
        assert!(text.contains("Highest CCU: 100 [2024-05-17 12:01:00] (Minute 1)"));
        assert!(text.contains("CCU Average: 100.00"));
        assert!(text.contains("Net CCU Change: +0 (0.0%)"));
        assert!(text.contains("Net Rating Change: +0.00%"));
        assert!(text.contains("Point 5: CCU=100, Rating=50.0% [2024-05-17 12:05:00]"));
    }

    #[test]
    fn test_results_percent_na_from_zero_start() {
        let text = session_results(&session("G", &[(0, 80.0), (25, 78.5)])).to_string();
        assert!(text.contains("Net CCU Change: +25 (N/A%)"));
        assert!(text.contains("Net Rating Change: -1.50%"));
        assert!(text.contains("Starting Rating: 80.0% [2024-05-17 12:01:00]"));
        assert!(text.contains("Highest Rating: 80.0% [2024-05-17 12:01:00]"));
    }

    #[test]
    fn test_results_without_samples() {
        let text = session_results(&session("G", &[])).to_string();
        assert!(text.contains("No data collected!"));
        assert!(!text.contains("CCU ANALYSIS"));
    }

    #[test]
    fn test_comparison_block_with_na_side() {
        let result = compare(session("Busy", &[(300, 70.0), (320, 71.0)]), session("Empty", &[]));
        let text = comparison_block(&result).to_string();

        assert!(text.contains("Game 1: Busy"));
        assert!(text.contains("Game 2: Empty"));
        assert!(text.contains("Busy: 310.00"));
        assert!(text.contains("Empty: 0.00"));
        assert!(text.contains("Busy: 320 (Minute 2, 2024-05-17 12:02:00)"));
        assert!(text.contains("Empty: N/A"));
        assert!(text.contains("Average CCU: +310.00"));
        assert!(text.contains("Peak CCU: N/A"));
    }

    #[test]
    fn test_signed_float_never_prints_negative_zero() {
        assert_eq!(signed_float(-0.0, 2), "+0.00");
        assert_eq!(signed_float(1.234, 2), "+1.23");
        assert_eq!(signed_float(-2.5, 1), "-2.5");
    }
}
