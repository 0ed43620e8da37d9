//! Slack Block Kit payloads for the scheduled report

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Characters of agent output placed in one section block (Slack caps blocks at 3000)
pub const SECTION_CHAR_LIMIT: usize = 2900;

pub const REPORT_TITLE: &str = "AWS Monitoring Report";
pub const ERROR_TITLE: &str = "Monitoring Agent Error";

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Report message for a successful check
pub fn report_message(agent_response: &str, now: DateTime<Utc>) -> Value {
    let timestamp = now.format("%b %d, %Y at %I:%M %p UTC").to_string();

    json!({
        "text": format!("{} - {}", REPORT_TITLE, timestamp),
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!(":bar_chart: {}", REPORT_TITLE),
                    "emoji": true
                }
            },
            {
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("*{}*", timestamp)}
            },
            {"type": "divider"},
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": truncate_chars(agent_response, SECTION_CHAR_LIMIT)
                }
            },
            {
                "type": "context",
                "elements": [{"type": "mrkdwn", "text": "_Next check in 15 minutes_"}]
            }
        ]
    })
}

/// Error notification posted when a check fails
pub fn error_message(error: &str, now: DateTime<Utc>) -> Value {
    let detail = truncate_chars(error, SECTION_CHAR_LIMIT);

    json!({
        "text": format!(":rotating_light: *{}*\n```{}```", ERROR_TITLE, detail),
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!(":rotating_light: {}", ERROR_TITLE),
                    "emoji": true
                }
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!(
                        "*Time:* {}\n*Error:*\n```{}```",
                        now.format("%Y-%m-%d %H:%M:%S UTC"),
                        detail
                    )
                }
            }
        ]
    })
}
