//! Job configuration
//!
//! Settings come from the environment, matching how the job runs under a
//! scheduler: bucket and prefix for the stored report, the Slack endpoints,
//! and the Cost Explorer region pin.

use serde::{Deserialize, Serialize};

/// Configuration settings for the billing report job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Bucket for the generated report; unset skips the upload step
    pub report_bucket: Option<String>,

    /// Key prefix and filename stem for stored reports
    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,

    /// Slack incoming webhook; unset skips the notification step
    pub slack_webhook_url: Option<String>,

    /// Slack API token for direct file uploads; unset falls back to a
    /// text-only message with a link
    pub slack_api_token: Option<String>,

    /// Slack channel for file uploads
    #[serde(default = "default_slack_channel")]
    pub slack_channel_id: String,

    /// Region the Cost Explorer client is pinned to
    #[serde(default = "default_cost_explorer_region")]
    pub cost_explorer_region: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_bucket: None,
            report_prefix: default_report_prefix(),
            slack_webhook_url: None,
            slack_api_token: None,
            slack_channel_id: default_slack_channel(),
            cost_explorer_region: default_cost_explorer_region(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            report_bucket: env_var("REPORT_BUCKET"),
            report_prefix: env_var("REPORT_PREFIX").unwrap_or(defaults.report_prefix),
            slack_webhook_url: env_var("SLACK_WEBHOOK_URL"),
            slack_api_token: env_var("SLACK_API_TOKEN"),
            slack_channel_id: env_var("SLACK_CHANNEL_ID").unwrap_or(defaults.slack_channel_id),
            cost_explorer_region: env_var("COST_EXPLORER_REGION")
                .unwrap_or(defaults.cost_explorer_region),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn default_report_prefix() -> String {
    "aws_billing_report".to_string()
}

fn default_slack_channel() -> String {
    "general".to_string()
}

fn default_cost_explorer_region() -> String {
    "us-east-1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert!(config.report_bucket.is_none());
        assert_eq!(config.report_prefix, "aws_billing_report");
        assert!(config.slack_webhook_url.is_none());
        assert_eq!(config.slack_channel_id, "general");
        assert_eq!(config.cost_explorer_region, "us-east-1");
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"report_bucket": "billing-bucket"}"#).unwrap();
        assert_eq!(config.report_bucket.as_deref(), Some("billing-bucket"));
        assert_eq!(config.report_prefix, "aws_billing_report");
        assert_eq!(config.cost_explorer_region, "us-east-1");
    }
}
