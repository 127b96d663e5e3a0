use std::fmt::Write;

use chrono::{Datelike, Timelike};

use crate::event::LogEvent;

/// How a line-oriented target turns an event into text.
///
/// Each enabled prefix is followed by `field_separator`, in the order
/// date, time, level, category, then the message:
///
/// ```text
/// 10/19/2026 14:03:07.042 [WARN] app.net.Socket connection reset
/// ```
///
/// By default only the level and the category are included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    pub field_separator: String,
    pub include_category: bool,
    pub include_date: bool,
    pub include_level: bool,
    pub include_time: bool,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            field_separator: " ".to_string(),
            include_category: true,
            include_date: false,
            include_level: true,
            include_time: false,
        }
    }
}

impl LineFormat {
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.field_separator = separator.into();
        self
    }

    pub fn category(mut self, include: bool) -> Self {
        self.include_category = include;
        self
    }

    pub fn date(mut self, include: bool) -> Self {
        self.include_date = include;
        self
    }

    pub fn level(mut self, include: bool) -> Self {
        self.include_level = include;
        self
    }

    pub fn time(mut self, include: bool) -> Self {
        self.include_time = include;
        self
    }

    pub fn render(&self, event: &LogEvent) -> String {
        let sep = self.field_separator.as_str();
        let ts = &event.timestamp;
        let mut line = String::with_capacity(event.message.len() + event.category.len() + 32);

        // Writing to a String cannot fail.
        if self.include_date {
            let _ = write!(line, "{}/{}/{}{}", ts.month(), ts.day(), ts.year(), sep);
        }

        if self.include_time {
            let _ = write!(
                line,
                "{:02}:{:02}:{:02}.{:03}{}",
                ts.hour(),
                ts.minute(),
                ts.second(),
                ts.timestamp_subsec_millis().min(999),
                sep
            );
        }

        if self.include_level {
            let _ = write!(line, "[{}]{}", event.level.label(), sep);
        }

        if self.include_category {
            line.push_str(&event.category);
            line.push_str(sep);
        }

        line.push_str(&event.message);
        line
    }
}
