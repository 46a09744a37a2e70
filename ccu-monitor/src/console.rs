//! Terminal presentation of events and reports
//!
//! Maps channels and tones to colours; the only place in the crate that
//! writes monitoring output to stdout.

use crossterm::style::{Color, Stylize};
use std::io::{self, Write};

use crate::events::{Channel, EventSink, MonitorEvent, ReportLine, Tone};

/// Colour scheme for console output
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub first: Color,
    pub second: Color,
    pub plain: Color,
    pub success: Color,
    pub heading: Color,
    pub points: Color,
    pub error: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            first: Color::Blue,
            second: Color::Red,
            plain: Color::Cyan,
            success: Color::Green,
            heading: Color::Yellow,
            points: Color::Magenta,
            error: Color::Red,
        }
    }
}

impl Palette {
    pub fn channel(&self, channel: Channel) -> Color {
        match channel {
            Channel::First => self.first,
            Channel::Second => self.second,
            Channel::Plain => self.plain,
        }
    }

    /// `None` keeps the terminal's default colour
    pub fn tone(&self, tone: Tone) -> Option<Color> {
        match tone {
            // Info blocks frame the first universe in cyan, not tick blue
            Tone::Frame(Channel::First) | Tone::Frame(Channel::Plain) => Some(self.plain),
            Tone::Frame(Channel::Second) => Some(self.second),
            Tone::Success => Some(self.success),
            Tone::Heading => Some(self.heading),
            Tone::Points => Some(self.points),
            Tone::Error => Some(self.error),
            Tone::Body => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    palette: Palette,
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self {
            palette: Palette::default(),
            color,
        }
    }

    fn write_line(&self, text: &str, color: Option<Color>) {
        let mut out = io::stdout().lock();
        // A closed stdout leaves nothing useful to do with the error
        let _ = match color {
            Some(color) if self.color => writeln!(out, "{}", text.with(color)),
            _ => writeln!(out, "{}", text),
        };
        let _ = out.flush();
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: MonitorEvent) {
        self.write_line(&event.text, Some(self.palette.channel(event.channel)));
    }

    fn present(&self, lines: &[ReportLine]) {
        for line in lines {
            self.write_line(&line.text, self.palette.tone(line.tone));
        }
    }
}
