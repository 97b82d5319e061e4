use thiserror::Error;

/// Comprehensive error type for the billing report job
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No billing data: {0}")]
    NoBillingData(String),

    #[error("Cost data error: {0}")]
    CostData(String),

    #[error("Identity lookup error: {0}")]
    Identity(String),

    #[error("Account directory error: {0}")]
    Directory(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Artifact storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReportError {
    /// Create a no-billing-data error (fatal for the run)
    pub fn no_billing_data<S: Into<String>>(msg: S) -> Self {
        Self::NoBillingData(msg.into())
    }

    /// Create a cost data error
    pub fn cost_data<S: Into<String>>(msg: S) -> Self {
        Self::CostData(msg.into())
    }

    /// Create an identity lookup error
    pub fn identity<S: Into<String>>(msg: S) -> Self {
        Self::Identity(msg.into())
    }

    /// Create an account directory error
    pub fn directory<S: Into<String>>(msg: S) -> Self {
        Self::Directory(msg.into())
    }

    /// Create a document rendering error
    pub fn document<S: Into<String>>(msg: S) -> Self {
        Self::Document(msg.into())
    }

    /// Create an artifact storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a notification error
    pub fn notification<S: Into<String>>(msg: S) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// True when the run cannot produce a meaningful report
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoBillingData(_))
    }
}

/// Convenient result type for the billing report job
pub type Result<T> = std::result::Result<T, ReportError>;
