//! Run orchestration
//!
//! Sequences one report run end to end: identity and directory lookups,
//! period derivation, aggregation, rendering, artifact storage and the chat
//! notification. Every collaborator arrives through its interface, so the
//! whole run is drivable with fakes.

use crate::{
    billing::{aggregator, AccountDirectory},
    config::ReportConfig,
    digest,
    period::{current_month_to_date, last_full_month},
    providers::{ArtifactStore, CostApi, DirectoryApi, IdentityApi, NotificationTransport, OrgIdentity},
    report::{pdf, renderer},
    Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    NoBillingData,
}

/// Structured result summary returned by every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub organization_id: String,
    pub organization_name: String,
    pub total_cost: f64,
    pub currency: String,
    pub billing_period: String,
    pub artifact_url: Option<String>,
    pub notification_sent: bool,
}

/// The assembled batch job
pub struct ReportJob {
    config: ReportConfig,
    cost_api: Arc<dyn CostApi>,
    identity_api: Arc<dyn IdentityApi>,
    directory_api: Arc<dyn DirectoryApi>,
    artifact_store: Option<Arc<dyn ArtifactStore>>,
    transport: Option<Arc<dyn NotificationTransport>>,
}

impl ReportJob {
    pub fn new(
        config: ReportConfig,
        cost_api: Arc<dyn CostApi>,
        identity_api: Arc<dyn IdentityApi>,
        directory_api: Arc<dyn DirectoryApi>,
    ) -> Self {
        Self {
            config,
            cost_api,
            identity_api,
            directory_api,
            artifact_store: None,
            transport: None,
        }
    }

    pub fn with_artifact_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.artifact_store = Some(store);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn NotificationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Run the report job once for the opaque trigger payload.
    pub async fn execute(&self, trigger: &serde_json::Value) -> Result<RunOutcome> {
        info!("Starting billing report generation");
        inspect_trigger(trigger);

        let org = match self.identity_api.organization().await {
            Ok(org) => org,
            Err(e) => {
                warn!(operation = "organization", error = %e, "Could not retrieve organization details");
                OrgIdentity::unknown()
            }
        };
        info!("Generating report for organization {} ({})", org.id, org.name);

        let directory = match self.directory_api.account_names().await {
            Ok(directory) => directory,
            Err(e) => {
                warn!(operation = "account_names", error = %e, "Could not retrieve account names");
                AccountDirectory::new()
            }
        };

        let today = Utc::now().date_naive();
        let billing_period = last_full_month(today);
        let forecast_period = current_month_to_date(today);

        let snapshot = match aggregator::aggregate(
            self.cost_api.as_ref(),
            billing_period,
            forecast_period,
        )
        .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Aborting: no billing data for this period");
                return Ok(no_billing_data_outcome(&org, billing_period));
            }
        };

        if snapshot.is_empty() {
            warn!("No billing data available for this period");
            return Ok(no_billing_data_outcome(&org, billing_period));
        }

        let generated_at = Utc::now();
        let document = renderer::render(&snapshot, &org, &directory, generated_at);
        let pdf_bytes = pdf::write(&document)?;

        let filename = report_filename(&self.config.report_prefix, generated_at);
        let key = artifact_key(&self.config.report_prefix, &filename, generated_at);
        let artifact_url = self.store_artifact(&pdf_bytes, &key).await;

        let message = digest::format_digest(&snapshot, &directory);
        let notification_sent = self
            .send_notification(&message, &pdf_bytes, &filename, artifact_url.as_deref())
            .await;

        Ok(RunOutcome {
            status: RunStatus::Completed,
            organization_id: org.id,
            organization_name: org.name,
            total_cost: snapshot.total_cost,
            currency: snapshot.currency.clone(),
            billing_period: snapshot.billing_period.to_string(),
            artifact_url,
            notification_sent,
        })
    }

    /// Upload the document; a failure costs the shareable link, nothing else
    async fn store_artifact(&self, bytes: &[u8], key: &str) -> Option<String> {
        let store = match &self.artifact_store {
            Some(store) => store,
            None => {
                warn!("No artifact store configured; skipping upload");
                return None;
            }
        };

        match store.put(bytes, key).await {
            Ok(url) => {
                info!("Report stored at {}", url);
                Some(url)
            }
            Err(e) => {
                error!(operation = "artifact_put", error = %e, "Failed to store report");
                None
            }
        }
    }

    /// Post the digest, attaching the document when the transport allows it
    /// and falling back to a text message with the link otherwise
    async fn send_notification(
        &self,
        message: &str,
        pdf_bytes: &[u8],
        filename: &str,
        artifact_url: Option<&str>,
    ) -> bool {
        let transport = match &self.transport {
            Some(transport) => transport,
            None => {
                warn!("No notification transport configured; skipping notification");
                return false;
            }
        };

        match transport.post_file(message, pdf_bytes, filename).await {
            Ok(()) => return true,
            Err(e) => {
                warn!(operation = "post_file", error = %e, "Attachment upload unavailable, falling back to text");
            }
        }

        let mut fallback = message.to_string();
        if let Some(url) = artifact_url {
            fallback.push_str(&format!(
                "\n\n*<{}|Click here to download the PDF Report>*",
                url
            ));
        }

        match transport.post_message(&fallback).await {
            Ok(()) => true,
            Err(e) => {
                error!(operation = "post_message", error = %e, "Failed to send notification");
                false
            }
        }
    }
}

/// Report filename: `<prefix>_<YYYYMMDD_HHMMSS>.pdf`
fn report_filename(prefix: &str, generated_at: DateTime<Utc>) -> String {
    format!("{}_{}.pdf", prefix, generated_at.format("%Y%m%d_%H%M%S"))
}

/// Date-partitioned storage key: `<prefix>/<YYYY-MM>/<filename>`
fn artifact_key(prefix: &str, filename: &str, generated_at: DateTime<Utc>) -> String {
    format!("{}/{}/{}", prefix, generated_at.format("%Y-%m"), filename)
}

fn no_billing_data_outcome(org: &OrgIdentity, period: crate::period::BillingPeriod) -> RunOutcome {
    RunOutcome {
        status: RunStatus::NoBillingData,
        organization_id: org.id.clone(),
        organization_name: org.name.clone(),
        total_cost: 0.0,
        currency: "USD".to_string(),
        billing_period: period.to_string(),
        artifact_url: None,
        notification_sent: false,
    }
}

/// Log the SNS message when the trigger carries one; the payload is
/// otherwise opaque
fn inspect_trigger(trigger: &serde_json::Value) {
    if let Some(message) = trigger
        .get("Records")
        .and_then(|records| records.get(0))
        .and_then(|record| record.get("Sns"))
        .and_then(|sns| sns.get("Message"))
        .and_then(|message| message.as_str())
    {
        info!("Received SNS message: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{CostAmount, Dimension};
    use crate::period::BillingPeriod;
    use crate::ReportError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeCostApi {
        fail_total: bool,
    }

    #[async_trait]
    impl CostApi for FakeCostApi {
        async fn total_cost(&self, _period: &BillingPeriod) -> Result<CostAmount> {
            if self.fail_total {
                return Err(ReportError::cost_data("throttled"));
            }
            Ok(CostAmount {
                amount: 1000.0,
                currency: "USD".to_string(),
            })
        }

        async fn cost_by_dimension(
            &self,
            _period: &BillingPeriod,
            dimension: Dimension,
        ) -> Result<Vec<(String, f64)>> {
            Ok(match dimension {
                Dimension::Account => vec![
                    ("111".to_string(), 600.0),
                    ("222".to_string(), 400.0),
                ],
                Dimension::Service => vec![
                    ("Amazon EC2".to_string(), 700.0),
                    ("Amazon S3".to_string(), 300.0),
                ],
            })
        }

        async fn forecast(&self, _period: &BillingPeriod) -> Result<CostAmount> {
            Ok(CostAmount {
                amount: 1100.0,
                currency: "USD".to_string(),
            })
        }
    }

    struct FakeIdentity {
        fail: bool,
    }

    #[async_trait]
    impl IdentityApi for FakeIdentity {
        async fn organization(&self) -> Result<OrgIdentity> {
            if self.fail {
                return Err(ReportError::identity("access denied"));
            }
            Ok(OrgIdentity {
                id: "o-abc123".to_string(),
                name: "Example Org".to_string(),
            })
        }
    }

    struct FakeDirectory;

    #[async_trait]
    impl DirectoryApi for FakeDirectory {
        async fn account_names(&self) -> Result<AccountDirectory> {
            let mut directory = AccountDirectory::new();
            directory.insert("111", "Prod");
            directory.insert("222", "Dev");
            Ok(directory)
        }
    }

    #[derive(Default)]
    struct FakeStore {
        fail: bool,
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArtifactStore for FakeStore {
        async fn put(&self, _bytes: &[u8], key: &str) -> Result<String> {
            if self.fail {
                return Err(ReportError::storage("bucket unavailable"));
            }
            self.keys.lock().unwrap().push(key.to_string());
            Ok(format!("https://bucket.s3.amazonaws.com/{}", key))
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        fail_file: bool,
        fail_message: bool,
        messages: Mutex<Vec<String>>,
        files: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationTransport for FakeTransport {
        async fn post_message(&self, text: &str) -> Result<()> {
            if self.fail_message {
                return Err(ReportError::notification("webhook down"));
            }
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn post_file(&self, text: &str, _bytes: &[u8], filename: &str) -> Result<()> {
            if self.fail_file {
                return Err(ReportError::notification("no token"));
            }
            self.files
                .lock()
                .unwrap()
                .push(format!("{}: {}", filename, text.len()));
            Ok(())
        }
    }

    fn job(
        cost: FakeCostApi,
        identity: FakeIdentity,
        store: Arc<FakeStore>,
        transport: Arc<FakeTransport>,
    ) -> ReportJob {
        ReportJob::new(
            ReportConfig::default(),
            Arc::new(cost),
            Arc::new(identity),
            Arc::new(FakeDirectory),
        )
        .with_artifact_store(store)
        .with_transport(transport)
    }

    #[tokio::test]
    async fn test_completed_run_outcome() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport::default());
        let job = job(
            FakeCostApi { fail_total: false },
            FakeIdentity { fail: false },
            store.clone(),
            transport.clone(),
        );

        let outcome = job.execute(&serde_json::json!({})).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.organization_id, "o-abc123");
        assert_eq!(outcome.organization_name, "Example Org");
        assert_eq!(outcome.total_cost, 1000.0);
        assert_eq!(outcome.currency, "USD");
        assert!(outcome.artifact_url.is_some());
        assert!(outcome.notification_sent);

        // Key is date partitioned under the prefix
        let keys = store.keys.lock().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("aws_billing_report/"));
        assert!(keys[0].ends_with(".pdf"));

        // Attachment path was used, so no plain message was posted
        assert_eq!(transport.files.lock().unwrap().len(), 1);
        assert!(transport.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fatal_cost_error_yields_no_billing_data() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport::default());
        let job = job(
            FakeCostApi { fail_total: true },
            FakeIdentity { fail: false },
            store.clone(),
            transport.clone(),
        );

        let outcome = job.execute(&serde_json::json!({})).await.unwrap();

        assert_eq!(outcome.status, RunStatus::NoBillingData);
        assert!(outcome.artifact_url.is_none());
        assert!(!outcome.notification_sent);
        assert!(store.keys.lock().unwrap().is_empty());
        assert!(transport.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identity_failure_degrades_to_placeholder() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport::default());
        let job = job(
            FakeCostApi { fail_total: false },
            FakeIdentity { fail: true },
            store,
            transport,
        );

        let outcome = job.execute(&serde_json::json!({})).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.organization_id, "Unknown");
        assert_eq!(outcome.organization_name, "AWS Organization");
    }

    #[tokio::test]
    async fn test_upload_failure_continues_without_link() {
        let store = Arc::new(FakeStore {
            fail: true,
            ..Default::default()
        });
        let transport = Arc::new(FakeTransport::default());
        let job = job(
            FakeCostApi { fail_total: false },
            FakeIdentity { fail: false },
            store,
            transport.clone(),
        );

        let outcome = job.execute(&serde_json::json!({})).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert!(outcome.artifact_url.is_none());
        assert!(outcome.notification_sent);
    }

    #[tokio::test]
    async fn test_attachment_failure_falls_back_to_link_message() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport {
            fail_file: true,
            ..Default::default()
        });
        let job = job(
            FakeCostApi { fail_total: false },
            FakeIdentity { fail: false },
            store,
            transport.clone(),
        );

        let outcome = job.execute(&serde_json::json!({})).await.unwrap();

        assert!(outcome.notification_sent);
        let messages = transport.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Click here to download the PDF Report"));
        assert!(messages[0].contains("https://bucket.s3.amazonaws.com/"));
    }

    #[tokio::test]
    async fn test_all_notification_paths_failing_reports_unsent() {
        let store = Arc::new(FakeStore::default());
        let transport = Arc::new(FakeTransport {
            fail_file: true,
            fail_message: true,
            ..Default::default()
        });
        let job = job(
            FakeCostApi { fail_total: false },
            FakeIdentity { fail: false },
            store,
            transport,
        );

        let outcome = job.execute(&serde_json::json!({})).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert!(!outcome.notification_sent);
    }

    #[tokio::test]
    async fn test_unconfigured_transport_short_circuits() {
        let job = ReportJob::new(
            ReportConfig::default(),
            Arc::new(FakeCostApi { fail_total: false }),
            Arc::new(FakeIdentity { fail: false }),
            Arc::new(FakeDirectory),
        );

        let outcome = job.execute(&serde_json::json!({})).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert!(outcome.artifact_url.is_none());
        assert!(!outcome.notification_sent);
    }

    #[test]
    fn test_filename_and_key_patterns() {
        let generated_at = DateTime::parse_from_rfc3339("2024-03-15T10:30:45Z")
            .unwrap()
            .with_timezone(&Utc);

        let filename = report_filename("aws_billing_report", generated_at);
        assert_eq!(filename, "aws_billing_report_20240315_103045.pdf");

        let key = artifact_key("aws_billing_report", &filename, generated_at);
        assert_eq!(
            key,
            "aws_billing_report/2024-03/aws_billing_report_20240315_103045.pdf"
        );
    }
}
