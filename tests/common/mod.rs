//! Shared fixtures for the integration suites
//!
//! - [`FakeBackend`]: an in-memory CloudWatch / CloudWatch Logs / STS account with paging,
//!   failing log groups and a set of assumable roles
//! - [`ScriptedPolicy`]: a reasoning policy that replays queued decisions and records what it
//!   was shown

#![allow(dead_code)]

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ambient_monitor::app::agent_framework::{
    InMemoryConversationStore, MonitoringAgent, PolicyDecision, PolicyError, PolicyRequest,
    ReasoningPolicy, ToolCatalog, ToolInvocation, Turn,
};
use ambient_monitor::app::config::SessionSettings;
use ambient_monitor::app::credentials::CrossAccountContext;
use ambient_monitor::app::data_plane::cloudwatch_logs::{EventPage, LogEvent, LogGroupPage};
use ambient_monitor::app::data_plane::{
    CallerIdentity, CloudWatchApi, DashboardDetail, DashboardEntry, IdentityApi, LogsApi,
    MetricAlarm, MonitoringBackend,
};

/// Account id the fake reports for ambient credentials
pub const HOME_ACCOUNT: &str = "111111111111";

/// Timestamp well inside any query window ending now
pub fn recent_millis() -> i64 {
    chrono::Utc::now().timestamp_millis() - 60_000
}

/// `count` events, the first `errors` of them error lines, the rest informational
pub fn events_with_errors(count: usize, errors: usize) -> Vec<LogEvent> {
    let ts = recent_millis();
    (0..count)
        .map(|i| {
            if i < errors {
                LogEvent::new(ts + i as i64, format!("ERROR request {} failed", i))
            } else {
                LogEvent::new(ts + i as i64, format!("INFO request {} completed", i))
            }
        })
        .collect()
}

#[derive(Default)]
struct FakeAccount {
    log_groups: Vec<(String, Vec<LogEvent>)>,
    failing_groups: HashSet<String>,
    dashboards: Vec<DashboardDetail>,
    alarms: Vec<MetricAlarm>,
}

/// In-memory AWS account(s) behind [`MonitoringBackend`]
#[derive(Default)]
pub struct FakeBackend {
    account: FakeAccount,
    /// (account_id, role_name) pairs that may be assumed
    assumable: HashSet<(String, String)>,
    group_page_size: usize,
    event_page_size: usize,
    /// 1-based FilterLogEvents call that fails with throttling
    failing_event_call: Option<usize>,
    /// Contexts clients were requested for, in order
    pub requested_contexts: Mutex<Vec<CrossAccountContext>>,
    /// (log group, limit) for every FilterLogEvents call
    pub filter_calls: Mutex<Vec<(String, i32)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            group_page_size: 50,
            event_page_size: 10_000,
            ..Self::default()
        }
    }

    pub fn with_log_group(mut self, name: &str, events: Vec<LogEvent>) -> Self {
        self.account.log_groups.push((name.to_string(), events));
        self
    }

    pub fn with_failing_group(mut self, name: &str) -> Self {
        self.account.log_groups.push((name.to_string(), Vec::new()));
        self.account.failing_groups.insert(name.to_string());
        self
    }

    pub fn with_dashboard(mut self, name: &str, body: Option<&str>) -> Self {
        self.account.dashboards.push(DashboardDetail {
            name: name.to_string(),
            arn: Some(format!(
                "arn:aws:cloudwatch::{}:dashboard/{}",
                HOME_ACCOUNT, name
            )),
            body: body.map(str::to_string),
        });
        self
    }

    pub fn with_alarm(mut self, name: &str, namespace: &str, state: &str, reason: Option<&str>) -> Self {
        self.account.alarms.push(MetricAlarm {
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
            state: state.to_string(),
            reason: reason.map(str::to_string),
        });
        self
    }

    pub fn with_assumable_role(mut self, account_id: &str, role_name: &str) -> Self {
        self.assumable
            .insert((account_id.to_string(), role_name.to_string()));
        self
    }

    pub fn with_page_sizes(mut self, groups: usize, events: usize) -> Self {
        self.group_page_size = groups;
        self.event_page_size = events;
        self
    }

    /// Fail the `n`th FilterLogEvents call (counting from 1) across all groups
    pub fn with_failing_event_call(mut self, n: usize) -> Self {
        self.failing_event_call = Some(n);
        self
    }

    pub fn client_requests(&self) -> usize {
        self.requested_contexts.lock().unwrap().len()
    }

    pub fn filter_calls(&self) -> Vec<(String, i32)> {
        self.filter_calls.lock().unwrap().clone()
    }

    fn authorize(&self, ctx: &CrossAccountContext) -> Result<String> {
        self.requested_contexts.lock().unwrap().push(ctx.clone());
        match ctx {
            CrossAccountContext::Ambient => Ok(HOME_ACCOUNT.to_string()),
            CrossAccountContext::AssumeRole {
                account_id,
                role_name,
            } => {
                if self
                    .assumable
                    .contains(&(account_id.clone(), role_name.clone()))
                {
                    Ok(account_id.clone())
                } else {
                    Err(anyhow!(
                        "AccessDenied: User: arn:aws:sts::{}:assumed-role/monitor/x is not authorized to perform: sts:AssumeRole on resource: arn:aws:iam::{}:role/{}",
                        HOME_ACCOUNT,
                        account_id,
                        role_name
                    ))
                    .context(format!(
                        "Failed to assume role {} in account {}",
                        role_name, account_id
                    ))
                }
            }
        }
    }
}

struct FakeView {
    backend: Arc<FakeBackend>,
    account_id: String,
    ctx: CrossAccountContext,
}

fn paginate<T: Clone>(items: &[T], page_size: usize, token: Option<String>) -> (Vec<T>, Option<String>) {
    let start: usize = token.and_then(|t| t.parse().ok()).unwrap_or(0);
    let end = (start + page_size).min(items.len());
    let page = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
    let next = (end < items.len()).then(|| end.to_string());
    (page, next)
}

#[async_trait]
impl LogsApi for FakeView {
    async fn describe_log_groups(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<LogGroupPage> {
        let names: Vec<String> = self
            .backend
            .account
            .log_groups
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| prefix.map_or(true, |p| name.starts_with(p)))
            .collect();
        let (log_group_names, next_token) =
            paginate(&names, self.backend.group_page_size, next_token);
        Ok(LogGroupPage {
            log_group_names,
            next_token,
        })
    }

    async fn filter_log_events(
        &self,
        log_group_name: &str,
        start_time: i64,
        limit: i32,
        next_token: Option<String>,
    ) -> Result<EventPage> {
        let call_number = {
            let mut calls = self.backend.filter_calls.lock().unwrap();
            calls.push((log_group_name.to_string(), limit));
            calls.len()
        };

        if self.backend.failing_event_call == Some(call_number) {
            return Err(anyhow!("ThrottlingException: Rate exceeded").context(format!(
                "Failed to query log events from log group: {}",
                log_group_name
            )));
        }

        if self.backend.account.failing_groups.contains(log_group_name) {
            return Err(anyhow!(
                "AccessDeniedException: not authorized to perform logs:FilterLogEvents"
            )
            .context(format!(
                "Failed to query log events from log group: {}",
                log_group_name
            )));
        }
        let events: Vec<LogEvent> = self
            .backend
            .account
            .log_groups
            .iter()
            .find(|(name, _)| name == log_group_name)
            .map(|(_, events)| events.clone())
            .ok_or_else(|| anyhow!("ResourceNotFoundException: The specified log group does not exist."))?
            .into_iter()
            .filter(|e| e.timestamp >= start_time)
            .collect();

        let page_size = (limit as usize).min(self.backend.event_page_size);
        let (events, next_token) = paginate(&events, page_size, next_token);
        Ok(EventPage { events, next_token })
    }
}

#[async_trait]
impl CloudWatchApi for FakeView {
    async fn list_dashboards(&self) -> Result<Vec<DashboardEntry>> {
        Ok(self
            .backend
            .account
            .dashboards
            .iter()
            .map(|d| DashboardEntry {
                name: d.name.clone(),
                size: d.body.as_ref().map(|b| b.len() as i64),
            })
            .collect())
    }

    async fn get_dashboard(&self, dashboard_name: &str) -> Result<DashboardDetail> {
        self.backend
            .account
            .dashboards
            .iter()
            .find(|d| d.name == dashboard_name)
            .cloned()
            .ok_or_else(|| anyhow!("ResourceNotFound: Dashboard {} does not exist", dashboard_name))
    }

    async fn describe_alarms(&self) -> Result<Vec<MetricAlarm>> {
        Ok(self.backend.account.alarms.clone())
    }
}

#[async_trait]
impl IdentityApi for FakeView {
    async fn get_caller_identity(&self) -> Result<CallerIdentity> {
        let arn = match &self.ctx {
            CrossAccountContext::Ambient => {
                format!("arn:aws:sts::{}:assumed-role/monitor/agent", self.account_id)
            }
            CrossAccountContext::AssumeRole { role_name, .. } => format!(
                "arn:aws:sts::{}:assumed-role/{}/MonitoringAgentSession",
                self.account_id, role_name
            ),
        };
        Ok(CallerIdentity {
            account: self.account_id.clone(),
            arn,
            user_id: Some("AROAEXAMPLE:MonitoringAgentSession".to_string()),
        })
    }
}

/// Shared handle so tests can inspect the fake after handing it to the catalog
#[derive(Clone)]
pub struct SharedFake(pub Arc<FakeBackend>);

impl SharedFake {
    pub fn new(backend: FakeBackend) -> Self {
        Self(Arc::new(backend))
    }

    fn view(&self, ctx: &CrossAccountContext) -> Result<Arc<FakeView>> {
        let account_id = self.0.authorize(ctx)?;
        Ok(Arc::new(FakeView {
            backend: self.0.clone(),
            account_id,
            ctx: ctx.clone(),
        }))
    }

    pub fn catalog(&self, analysis_event_cap: usize) -> ToolCatalog {
        ToolCatalog::monitoring(Arc::new(self.clone()), analysis_event_cap).unwrap()
    }
}

#[async_trait]
impl MonitoringBackend for SharedFake {
    async fn logs(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn LogsApi>> {
        let view: Arc<dyn LogsApi> = self.view(ctx)?;
        Ok(view)
    }

    async fn cloudwatch(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn CloudWatchApi>> {
        let view: Arc<dyn CloudWatchApi> = self.view(ctx)?;
        Ok(view)
    }

    async fn identity(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn IdentityApi>> {
        let view: Arc<dyn IdentityApi> = self.view(ctx)?;
        Ok(view)
    }
}

/// Replays queued decisions; an empty queue is a policy failure
#[derive(Default)]
pub struct ScriptedPolicy {
    script: Mutex<VecDeque<Result<PolicyDecision, PolicyError>>>,
    /// Turns shown to the policy on each call
    pub seen: Mutex<Vec<Vec<Turn>>>,
    delay: Option<Duration>,
}

impl ScriptedPolicy {
    pub fn new(script: Vec<Result<PolicyDecision, PolicyError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_turns(&self) -> Vec<Turn> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningPolicy for ScriptedPolicy {
    async fn decide(&self, request: PolicyRequest<'_>) -> Result<PolicyDecision, PolicyError> {
        self.seen.lock().unwrap().push(request.turns.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PolicyError::Unavailable("script exhausted".to_string())))
    }
}

/// Policy that echoes the latest user message after an optional delay
pub struct EchoPolicy {
    pub delay: Duration,
}

#[async_trait]
impl ReasoningPolicy for EchoPolicy {
    async fn decide(&self, request: PolicyRequest<'_>) -> Result<PolicyDecision, PolicyError> {
        tokio::time::sleep(self.delay).await;
        let last_user = request
            .turns
            .iter()
            .rev()
            .find(|t| t.role == ambient_monitor::app::agent_framework::TurnRole::User)
            .map(|t| t.content.clone())
            .unwrap_or_default();
        Ok(PolicyDecision::answer(format!("echo: {}", last_user)))
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolInvocation {
    ToolInvocation::new(id, name, arguments)
}

pub fn agent_with(
    policy: Arc<dyn ReasoningPolicy>,
    catalog: ToolCatalog,
    settings: SessionSettings,
) -> MonitoringAgent {
    MonitoringAgent::new(
        policy,
        Arc::new(catalog),
        Arc::new(InMemoryConversationStore::new()),
        "You are a monitoring assistant.",
        settings,
    )
}

/// Tool turns recorded for a thread, as (tool name, rendered content, is_error)
pub fn tool_turns(turns: &[Turn]) -> Vec<(String, String, bool)> {
    turns
        .iter()
        .filter(|t| t.role == ambient_monitor::app::agent_framework::TurnRole::Tool)
        .map(|t| {
            (
                t.tool_name.clone().unwrap_or_default(),
                t.content.clone(),
                t.is_error,
            )
        })
        .collect()
}

/// Lookup table for environment-style configuration
pub fn env_lookup(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    move |name| map.get(name).cloned()
}
