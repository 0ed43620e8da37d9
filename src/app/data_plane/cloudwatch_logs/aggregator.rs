//! Log aggregation across log groups
//!
//! Resolves a [`LogTarget`] into log groups, pages through their events inside the query
//! window and stops as soon as `max_events` entries are collected. Groups and prefixes are
//! visited in discovery order, so when the cap is hit early the result favours groups listed
//! first. A failing group or prefix is logged and skipped; whatever was collected is returned,
//! including the pages a group yielded before it failed.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::app::sdk_errors::categorize_error;

use super::client::LogsApi;
use super::resource_mapping::log_group_prefixes;
use super::types::{AggregatedLogEntry, LogEvent, LogQuery, LogTarget};

/// Largest `limit` FilterLogEvents accepts
const MAX_FILTER_PAGE: usize = 10_000;

/// Events read from one log group
///
/// `error` is set when a page request failed; `events` still holds every page read before it.
#[derive(Debug, Default)]
pub struct GroupRead {
    pub events: Vec<LogEvent>,
    pub error: Option<anyhow::Error>,
}

/// Aggregates log events across groups through one [`LogsApi`]
pub struct LogAggregator<'a> {
    api: &'a dyn LogsApi,
}

impl<'a> LogAggregator<'a> {
    pub fn new(api: &'a dyn LogsApi) -> Self {
        Self { api }
    }

    /// Fetch at most `query.max_events` entries ending now
    pub async fn fetch(&self, query: &LogQuery) -> Vec<AggregatedLogEntry> {
        self.fetch_at(query, Utc::now()).await
    }

    /// Fetch at most `query.max_events` entries for a window ending at `now`
    pub async fn fetch_at(&self, query: &LogQuery, now: DateTime<Utc>) -> Vec<AggregatedLogEntry> {
        let start_time = query.start_time_millis(now);
        let cap = query.max_events;
        let mut entries = Vec::new();

        match &query.target {
            LogTarget::LogGroup(log_group_name) => {
                if let Err(e) = self
                    .collect_group(log_group_name, start_time, cap, &mut entries)
                    .await
                {
                    let category = categorize_error(&e, "CloudWatch Logs", "FilterLogEvents");
                    warn!(
                        "Error fetching logs from {} ({}): {:#}",
                        log_group_name,
                        category.short_label(),
                        e
                    );
                }
            }
            LogTarget::Service(service_name) => {
                'prefixes: for prefix in log_group_prefixes(service_name) {
                    let mut next_token = None;
                    loop {
                        let page = match self
                            .api
                            .describe_log_groups(Some(&prefix), next_token.take())
                            .await
                        {
                            Ok(page) => page,
                            Err(e) => {
                                let category =
                                    categorize_error(&e, "CloudWatch Logs", "DescribeLogGroups");
                                warn!(
                                    "Error listing log groups with prefix {} ({}): {:#}",
                                    prefix,
                                    category.short_label(),
                                    e
                                );
                                continue 'prefixes;
                            }
                        };

                        for log_group_name in &page.log_group_names {
                            trace!("Reading log group {}", log_group_name);
                            if let Err(e) = self
                                .collect_group(log_group_name, start_time, cap, &mut entries)
                                .await
                            {
                                let category =
                                    categorize_error(&e, "CloudWatch Logs", "FilterLogEvents");
                                warn!(
                                    "Error fetching logs from {} ({}): {:#}",
                                    log_group_name,
                                    category.short_label(),
                                    e
                                );
                            }
                            if entries.len() >= cap {
                                debug!(
                                    "Reached {} events at {}; skipping remaining groups",
                                    cap, log_group_name
                                );
                                break 'prefixes;
                            }
                        }

                        match page.next_token {
                            Some(token) => next_token = Some(token),
                            None => break,
                        }
                    }
                }
            }
        }

        entries
    }

    async fn collect_group(
        &self,
        log_group_name: &str,
        start_time: i64,
        cap: usize,
        entries: &mut Vec<AggregatedLogEntry>,
    ) -> Result<()> {
        let remaining = cap.saturating_sub(entries.len());
        let read = self.read_group(log_group_name, start_time, remaining).await;
        entries.extend(
            read.events
                .into_iter()
                .map(|event| AggregatedLogEntry::from_event(log_group_name, event)),
        );
        match read.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Read up to `cap` events from a single group
    ///
    /// A failed page ends the read; the events from earlier pages are kept alongside the error.
    pub async fn read_group(&self, log_group_name: &str, start_time: i64, cap: usize) -> GroupRead {
        let mut read = GroupRead::default();
        let mut next_token: Option<String> = None;
        while read.events.len() < cap {
            let limit = (cap - read.events.len()).min(MAX_FILTER_PAGE) as i32;
            let previous_token = next_token.clone();
            let page = match self
                .api
                .filter_log_events(log_group_name, start_time, limit, next_token.take())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    read.error = Some(e);
                    break;
                }
            };

            let room = cap - read.events.len();
            read.events.extend(page.events.into_iter().take(room));

            match page.next_token {
                Some(token) if Some(&token) != previous_token.as_ref() => next_token = Some(token),
                _ => break,
            }
        }
        read
    }

    /// List up to `limit` log group names across pages
    pub async fn list_groups(&self, limit: usize) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut next_token = None;
        while names.len() < limit {
            let page = self.api.describe_log_groups(None, next_token.take()).await?;
            let room = limit - names.len();
            names.extend(page.log_group_names.into_iter().take(room));
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(names)
    }
}
