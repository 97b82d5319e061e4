//! AWS service client implementations of the provider contracts
//!
//! Cost Explorer for cost queries, STS + Organizations for identity and the
//! account directory, S3 for artifact storage. Each wrapper stays thin:
//! build the request, send it once, normalize the response.

use crate::{
    billing::{AccountDirectory, CostAmount, Dimension},
    period::BillingPeriod,
    providers::{ArtifactStore, CostApi, DirectoryApi, IdentityApi, OrgIdentity},
    ReportError, Result,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_costexplorer::types::{
    DateInterval, Granularity, GroupDefinition, GroupDefinitionType, Metric,
};
use aws_sdk_s3::primitives::ByteStream;
use tracing::{info, warn};

/// Cost Explorer client wrapper
pub struct CostExplorerApi {
    client: aws_sdk_costexplorer::Client,
}

impl CostExplorerApi {
    /// Create a client pinned to the given region (Cost Explorer is only
    /// served from us-east-1 on most partitions)
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: aws_sdk_costexplorer::Client::new(&config),
        }
    }

    fn interval(period: &BillingPeriod) -> Result<DateInterval> {
        DateInterval::builder()
            .start(period.start.format("%Y-%m-%d").to_string())
            .end(period.end.format("%Y-%m-%d").to_string())
            .build()
            .map_err(|e| ReportError::cost_data(format!("invalid date interval: {}", e)))
    }
}

#[async_trait]
impl CostApi for CostExplorerApi {
    async fn total_cost(&self, period: &BillingPeriod) -> Result<CostAmount> {
        info!("Fetching total cost for {}", period);

        let response = self
            .client
            .get_cost_and_usage()
            .time_period(Self::interval(period)?)
            .granularity(Granularity::Monthly)
            .metrics("UnblendedCost")
            .send()
            .await
            .map_err(|e| {
                ReportError::cost_data(format!(
                    "GetCostAndUsage failed: {}",
                    aws_sdk_costexplorer::error::DisplayErrorContext(&e)
                ))
            })?;

        let metric = response
            .results_by_time()
            .first()
            .and_then(|result| result.total())
            .and_then(|total| total.get("UnblendedCost"))
            .ok_or_else(|| ReportError::cost_data("UnblendedCost missing from response"))?;

        Ok(CostAmount {
            amount: parse_amount(metric.amount()),
            currency: metric.unit().unwrap_or("USD").to_string(),
        })
    }

    async fn cost_by_dimension(
        &self,
        period: &BillingPeriod,
        dimension: Dimension,
    ) -> Result<Vec<(String, f64)>> {
        let response = self
            .client
            .get_cost_and_usage()
            .time_period(Self::interval(period)?)
            .granularity(Granularity::Monthly)
            .metrics("UnblendedCost")
            .group_by(
                GroupDefinition::builder()
                    .r#type(GroupDefinitionType::Dimension)
                    .key(dimension.as_str())
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                ReportError::cost_data(format!(
                    "GetCostAndUsage ({}) failed: {}",
                    dimension.as_str(),
                    aws_sdk_costexplorer::error::DisplayErrorContext(&e)
                ))
            })?;

        let mut rows = Vec::new();
        for result in response.results_by_time() {
            for group in result.groups() {
                let key = group
                    .keys()
                    .first()
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                let cost = group
                    .metrics()
                    .and_then(|metrics| metrics.get("UnblendedCost"))
                    .map(|metric| parse_amount(metric.amount()))
                    .unwrap_or(0.0);
                rows.push((key, cost));
            }
        }
        Ok(rows)
    }

    async fn forecast(&self, period: &BillingPeriod) -> Result<CostAmount> {
        let response = self
            .client
            .get_cost_forecast()
            .time_period(Self::interval(period)?)
            .metric(Metric::AmortizedCost)
            .granularity(Granularity::Monthly)
            .send()
            .await
            .map_err(|e| {
                ReportError::cost_data(format!(
                    "GetCostForecast failed: {}",
                    aws_sdk_costexplorer::error::DisplayErrorContext(&e)
                ))
            })?;

        let total = response
            .total()
            .ok_or_else(|| ReportError::cost_data("forecast total missing from response"))?;

        Ok(CostAmount {
            amount: parse_amount(total.amount()),
            currency: total.unit().unwrap_or("USD").to_string(),
        })
    }
}

/// Organization identity via STS and Organizations
pub struct OrganizationsIdentity {
    sts: aws_sdk_sts::Client,
    organizations: aws_sdk_organizations::Client,
}

impl OrganizationsIdentity {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            sts: aws_sdk_sts::Client::new(config),
            organizations: aws_sdk_organizations::Client::new(config),
        }
    }
}

#[async_trait]
impl IdentityApi for OrganizationsIdentity {
    async fn organization(&self) -> Result<OrgIdentity> {
        let caller = self.sts.get_caller_identity().send().await.map_err(|e| {
            ReportError::identity(format!(
                "GetCallerIdentity failed: {}",
                aws_sdk_sts::error::DisplayErrorContext(&e)
            ))
        })?;
        let account_id = caller.account().unwrap_or("Unknown").to_string();

        // Organizations access is optional; fall back to the bare account.
        match self.organizations.describe_organization().send().await {
            Ok(described) => {
                let organization = described.organization();
                let org_id = organization
                    .and_then(|o| o.id())
                    .unwrap_or("Unknown")
                    .to_string();
                let management_account = organization
                    .and_then(|o| o.master_account_id())
                    .unwrap_or(&account_id)
                    .to_string();

                let name = match self
                    .organizations
                    .describe_account()
                    .account_id(management_account)
                    .send()
                    .await
                {
                    Ok(response) => response
                        .account()
                        .and_then(|a| a.name())
                        .unwrap_or("AWS Organization")
                        .to_string(),
                    Err(_) => "AWS Organization".to_string(),
                };

                Ok(OrgIdentity { id: org_id, name })
            }
            Err(e) => {
                warn!(operation = "describe_organization", error = %aws_sdk_organizations::error::DisplayErrorContext(&e), "Organization details unavailable");
                Ok(OrgIdentity {
                    id: account_id,
                    name: "AWS Organization".to_string(),
                })
            }
        }
    }
}

/// Account directory via paginated Organizations ListAccounts
pub struct OrganizationsDirectory {
    client: aws_sdk_organizations::Client,
}

impl OrganizationsDirectory {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_organizations::Client::new(config),
        }
    }
}

#[async_trait]
impl DirectoryApi for OrganizationsDirectory {
    async fn account_names(&self) -> Result<AccountDirectory> {
        let mut directory = AccountDirectory::new();
        let mut pages = self.client.list_accounts().into_paginator().send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                ReportError::directory(format!(
                    "ListAccounts failed: {}",
                    aws_sdk_organizations::error::DisplayErrorContext(&e)
                ))
            })?;
            for account in page.accounts() {
                if let (Some(id), Some(name)) = (account.id(), account.name()) {
                    directory.insert(id, name);
                }
            }
        }

        info!("Retrieved names for {} accounts", directory.len());
        Ok(directory)
    }
}

/// S3-backed artifact store with date-partitioned keys
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(config: &SdkConfig, bucket: String) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket,
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, bytes: &[u8], key: &str) -> Result<String> {
        info!("Uploading report to s3://{}/{}", self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| {
                ReportError::storage(format!(
                    "PutObject failed: {}",
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        Ok(object_url(&self.bucket, key))
    }
}

fn object_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

fn parse_amount(amount: Option<&str>) -> f64 {
    amount.and_then(|a| a.parse().ok()).unwrap_or(0.0)
}
