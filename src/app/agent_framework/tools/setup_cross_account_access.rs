//! Verify that a cross-account role can be assumed

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{aws_failure, ArgSpec, MonitoringTool, ToolArgs, ToolResult, ToolSchema};
use crate::app::credentials::CrossAccountContext;
use crate::app::data_plane::{CallerIdentity, MonitoringBackend};

pub struct SetupCrossAccountAccessTool {
    backend: Arc<dyn MonitoringBackend>,
}

impl SetupCrossAccountAccessTool {
    pub fn new(backend: Arc<dyn MonitoringBackend>) -> Self {
        Self { backend }
    }
}

/// Whether the identity returned under the assumed session is the requested role
///
/// Assumed-role ARNs carry only the role's final name, so an IAM path in `role_name` is
/// dropped before comparing.
fn identity_matches(identity: &CallerIdentity, account_id: &str, role_name: &str) -> bool {
    let bare_name = role_name.rsplit('/').next().unwrap_or(role_name);
    identity.account == account_id
        && identity
            .arn
            .contains(&format!(":assumed-role/{}/", bare_name))
}

#[async_trait]
impl MonitoringTool for SetupCrossAccountAccessTool {
    fn name(&self) -> &'static str {
        "setup_cross_account_access"
    }

    fn description(&self) -> &'static str {
        "Setup and verify cross-account access to CloudWatch and logs. Use this tool to test \
         cross-account IAM role configuration before performing monitoring operations."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(vec![
            ArgSpec::required_string("account_id", "Target AWS account ID"),
            ArgSpec::required_string("role_name", "IAM role name to assume in target account"),
        ])
    }

    async fn execute(&self, args: ToolArgs) -> ToolResult {
        let ctx = match args.cross_account_context() {
            Ok(ctx) => ctx,
            Err(result) => return result,
        };
        let (account_id, role_name) = match &ctx {
            CrossAccountContext::AssumeRole {
                account_id,
                role_name,
            } => (account_id.clone(), role_name.clone()),
            CrossAccountContext::Ambient => {
                return ToolResult::error("account_id and role_name must not be empty")
            }
        };

        let identity = match self.backend.identity(&ctx).await {
            Ok(sts) => sts.get_caller_identity().await,
            Err(e) => Err(e),
        };

        let identity = match identity {
            Ok(identity) => identity,
            Err(e) => {
                return aws_failure(
                    "Failed to setup cross-account access",
                    &e,
                    "STS",
                    "AssumeRole",
                )
            }
        };

        if !identity_matches(&identity, &account_id, &role_name) {
            warn!(
                "Assumed identity {} does not match role {} in account {}",
                identity.arn, role_name, account_id
            );
            return ToolResult::error_with_detail(
                "Failed to setup cross-account access: assumed identity does not match the requested role",
                format!(
                    "expected role {} in account {}, got {} in account {}",
                    role_name, account_id, identity.arn, identity.account
                ),
            );
        }

        info!(
            "Successfully verified cross-account access for account {}",
            account_id
        );
        ToolResult::text(
            [
                "Cross-account access verified successfully!".to_string(),
                format!("\nTarget Account: {}", account_id),
                format!("Role Name: {}", role_name),
                format!("Assumed Account: {}", identity.account),
                format!("Assumed Role ARN: {}", identity.arn),
                "\nYou can now use this account configuration with other monitoring tools."
                    .to_string(),
            ]
            .join("\n"),
        )
    }
}
