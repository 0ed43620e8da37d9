//! Health classification for log windows and alarm sets
//!
//! Log windows are scored by keyword: a message containing any error keyword counts as an
//! error, otherwise one containing a warning keyword counts as a warning. The verdict is
//! critical when any error was seen, elevated when warnings exceed 10% of events, and healthy
//! otherwise. Keyword matching is on the lower-cased message.

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app::data_plane::cloudwatch::MetricAlarm;

pub const ERROR_KEYWORDS: [&str; 4] = ["error", "fail", "exception", "critical"];
pub const WARNING_KEYWORDS: [&str; 2] = ["warning", "warn"];

/// Categorical health judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Healthy,
    Elevated,
    Critical,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Healthy => write!(f, "healthy"),
            Verdict::Elevated => write!(f, "elevated"),
            Verdict::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Error,
    Warning,
    Uncategorized,
}

/// Classify one log message; error keywords take precedence
pub fn classify_message(message: &str) -> MessageSeverity {
    let lower = message.to_lowercase();
    if ERROR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        MessageSeverity::Error
    } else if WARNING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        MessageSeverity::Warning
    } else {
        MessageSeverity::Uncategorized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogClassification {
    pub total_events: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub verdict: Verdict,
}

impl LogClassification {
    /// Classify a window of messages
    pub fn from_messages<'a, I>(messages: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut total_events = 0;
        let mut error_count = 0;
        let mut warning_count = 0;

        for message in messages {
            total_events += 1;
            match classify_message(message) {
                MessageSeverity::Error => error_count += 1,
                MessageSeverity::Warning => warning_count += 1,
                MessageSeverity::Uncategorized => {}
            }
        }

        Self {
            total_events,
            error_count,
            warning_count,
            verdict: verdict_for(total_events, error_count, warning_count),
        }
    }

    /// Percentage of events classified as errors
    pub fn error_rate(&self) -> f64 {
        percentage(self.error_count, self.total_events)
    }

    /// Percentage of events classified as warnings
    pub fn warning_rate(&self) -> f64 {
        percentage(self.warning_count, self.total_events)
    }
}

/// Verdict thresholds: any error is critical; warnings above 10% of events are elevated
pub fn verdict_for(total_events: usize, error_count: usize, warning_count: usize) -> Verdict {
    if error_count > 0 {
        Verdict::Critical
    } else if warning_count * 10 > total_events {
        Verdict::Elevated
    } else {
        Verdict::Healthy
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// An alarm currently firing, with the reason CloudWatch recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiringAlarm {
    pub name: String,
    pub reason: String,
}

/// Alarm states for one service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSummary {
    pub service_name: String,
    /// Matching alarms in listing order
    pub alarms: Vec<MetricAlarm>,
    pub ok: usize,
    pub alarm: usize,
    pub insufficient_data: usize,
    /// States other than OK, ALARM and INSUFFICIENT_DATA
    pub other: usize,
    pub firing: Vec<FiringAlarm>,
}

impl AlarmSummary {
    pub fn total(&self) -> usize {
        self.alarms.len()
    }

    /// Critical while anything fires, elevated when some alarms lack data
    pub fn verdict(&self) -> Verdict {
        if self.alarm > 0 {
            Verdict::Critical
        } else if self.insufficient_data > 0 || self.other > 0 {
            Verdict::Elevated
        } else {
            Verdict::Healthy
        }
    }
}

/// Whether an alarm belongs to a service (name or namespace contains it, case-insensitively)
pub fn alarm_matches_service(alarm: &MetricAlarm, service_name: &str) -> bool {
    let service = service_name.to_lowercase();
    alarm.name.to_lowercase().contains(&service)
        || alarm
            .namespace
            .as_deref()
            .is_some_and(|ns| ns.to_lowercase().contains(&service))
}

/// Filter alarms to a service and count them by state
pub fn summarize_alarms(service_name: &str, alarms: &[MetricAlarm]) -> AlarmSummary {
    let mut summary = AlarmSummary {
        service_name: service_name.to_string(),
        ..AlarmSummary::default()
    };

    for alarm in alarms.iter().filter(|a| alarm_matches_service(a, service_name)) {
        match alarm.state.as_str() {
            "OK" => summary.ok += 1,
            "ALARM" => {
                summary.alarm += 1;
                summary.firing.push(FiringAlarm {
                    name: alarm.name.clone(),
                    reason: alarm.reason.clone().unwrap_or_else(|| "N/A".to_string()),
                });
            }
            "INSUFFICIENT_DATA" => summary.insufficient_data += 1,
            _ => summary.other += 1,
        }
        summary.alarms.push(alarm.clone());
    }

    summary
}
