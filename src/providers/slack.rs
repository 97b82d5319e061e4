//! Slack notification transport
//!
//! Text messages go through an incoming webhook; attachments go through the
//! files.upload API when a token is configured. Each call is attempted at
//! most once, and the caller decides what a failure falls back to.

use crate::{providers::NotificationTransport, ReportError, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

const FILES_UPLOAD_URL: &str = "https://slack.com/api/files.upload";

pub struct SlackTransport {
    http: reqwest::Client,
    webhook_url: String,
    api_token: Option<String>,
    channel_id: String,
    upload_url: String,
}

impl SlackTransport {
    pub fn new(webhook_url: String, api_token: Option<String>, channel_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
            api_token,
            channel_id,
            upload_url: FILES_UPLOAD_URL.to_string(),
        }
    }

    /// Point the upload endpoint somewhere else; used by the HTTP tests
    #[doc(hidden)]
    pub fn with_upload_url(mut self, url: String) -> Self {
        self.upload_url = url;
        self
    }
}

#[async_trait]
impl NotificationTransport for SlackTransport {
    async fn post_message(&self, text: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReportError::notification(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        info!("Message posted to Slack");
        Ok(())
    }

    async fn post_file(&self, text: &str, bytes: &[u8], filename: &str) -> Result<()> {
        let token = self.api_token.as_ref().ok_or_else(|| {
            ReportError::notification("no Slack API token configured for file upload")
        })?;

        info!("Uploading {} to Slack channel {}", filename, self.channel_id);

        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("channels", self.channel_id.clone())
            .text("initial_comment", text.to_string())
            .text("title", filename.to_string())
            .text("filename", filename.to_string())
            .part("file", part);

        let response = self
            .http
            .post(&self.upload_url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReportError::notification(format!(
                "file upload returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
            Ok(())
        } else {
            let reason = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            Err(ReportError::notification(format!(
                "Slack API error: {}",
                reason
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_post_message_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .and(body_json(json!({ "text": "digest body" })))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport =
            SlackTransport::new(format!("{}/webhook", server.uri()), None, "general".to_string());
        transport.post_message("digest body").await.unwrap();
    }

    #[tokio::test]
    async fn test_post_message_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport =
            SlackTransport::new(format!("{}/webhook", server.uri()), None, "general".to_string());
        let err = transport.post_message("digest body").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_post_file_requires_token() {
        let transport =
            SlackTransport::new("http://localhost/webhook".to_string(), None, "general".to_string());
        let err = transport.post_file("text", b"pdf", "report.pdf").await.unwrap_err();
        assert!(err.to_string().contains("no Slack API token"));
    }

    #[tokio::test]
    async fn test_post_file_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = SlackTransport::new(
            "http://localhost/webhook".to_string(),
            Some("xoxb-token".to_string()),
            "C012345".to_string(),
        )
        .with_upload_url(format!("{}/upload", server.uri()));

        transport
            .post_file("digest body", b"%PDF-fake", "report.pdf")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_file_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "invalid_auth" })),
            )
            .mount(&server)
            .await;

        let transport = SlackTransport::new(
            "http://localhost/webhook".to_string(),
            Some("xoxb-token".to_string()),
            "C012345".to_string(),
        )
        .with_upload_url(format!("{}/upload", server.uri()));

        let err = transport
            .post_file("digest body", b"%PDF-fake", "report.pdf")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid_auth"));
    }
}
