//! Service to CloudWatch Log Group Mapping
//!
//! Maps short AWS service names to the log group prefixes their logs are written under.

#![warn(clippy::all, rust_2018_idioms)]

/// Known services and their log group prefixes, in search order
const SERVICE_LOG_GROUPS: &[(&str, &[&str])] = &[
    ("lambda", &["/aws/lambda/"]),
    ("ec2", &["/aws/ec2/", "/var/log/"]),
    ("rds", &["/aws/rds/"]),
    ("eks", &["/aws/eks/"]),
    ("apigateway", &["/aws/apigateway/"]),
    ("bedrock", &["/aws/bedrock/"]),
    ("vpc", &["/aws/vpc/"]),
    ("iam", &["/aws/iam/"]),
    ("s3", &["/aws/s3/"]),
    ("cloudtrail", &["/aws/cloudtrail/"]),
    ("waf", &["/aws/waf/"]),
];

/// Log group prefixes to search for a service
///
/// Lookup is case-insensitive. Unknown services map to `/aws/{service_name}/` with the
/// name as given.
pub fn log_group_prefixes(service_name: &str) -> Vec<String> {
    let service = service_name.to_lowercase();
    SERVICE_LOG_GROUPS
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, prefixes)| prefixes.iter().map(|p| p.to_string()).collect())
        .unwrap_or_else(|| vec![format!("/aws/{}/", service_name)])
}
