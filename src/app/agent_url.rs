//! Invocation URL for an agent hosted on Bedrock AgentCore

use aws_config::BehaviorVersion;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Region used when neither the flag nor the AWS default chain provides one
pub const DEFAULT_AGENT_REGION: &str = "us-west-2";

/// Everything except RFC 3986 unreserved characters is escaped, including `/` and `:`
const ARN_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn build_agent_url(agent_arn: &str, region: &str) -> String {
    let escaped = utf8_percent_encode(agent_arn, ARN_ESCAPE);
    format!(
        "https://bedrock-agentcore.{}.amazonaws.com/runtimes/{}/invocations?qualifier=DEFAULT",
        region, escaped
    )
}

/// Region from the flag, then the AWS default provider chain, then [`DEFAULT_AGENT_REGION`]
pub async fn resolve_agent_region(explicit: Option<&str>) -> String {
    if let Some(region) = explicit.filter(|r| !r.trim().is_empty()) {
        return region.to_string();
    }
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| DEFAULT_AGENT_REGION.to_string())
}
