//! Billing data model and aggregation
//!
//! This module handles:
//! - The normalized billing snapshot assembled once per run
//! - Cost breakdown ordering and share-of-total math
//! - Account display-name resolution
//! - The top-services merge used by the report and the digest

pub mod aggregator;

use crate::period::BillingPeriod;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display name substituted for accounts missing from the directory
pub const UNKNOWN_ACCOUNT: &str = "Unknown";

/// Label of the synthetic entry that absorbs services beyond the top five
pub const OTHER_SERVICES: &str = "Other Services";

/// Number of services shown individually before the remainder is merged
pub const TOP_SERVICES: usize = 5;

/// Grouping dimension for cost breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    Account,
    Service,
}

impl Dimension {
    /// Cost Explorer dimension key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "LINKED_ACCOUNT",
            Self::Service => "SERVICE",
        }
    }
}

/// A cost amount with its currency unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAmount {
    pub amount: f64,
    pub currency: String,
}

/// One row of a cost breakdown: an account id or service name and its cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub key: String,
    pub cost: f64,
    pub currency: String,
}

impl CostEntry {
    pub fn new<S: Into<String>>(key: S, cost: f64, currency: S) -> Self {
        Self {
            key: key.into(),
            cost,
            currency: currency.into(),
        }
    }
}

/// Sort a breakdown descending by cost. Ties keep their original API order.
pub fn sort_by_cost_descending(entries: &mut [CostEntry]) {
    entries.sort_by(|a, b| b.cost.partial_cmp(&a.cost).unwrap_or(std::cmp::Ordering::Equal));
}

/// The normalized billing result for one run
///
/// Constructed once by the aggregator and read-only afterward; both the
/// report renderer and the notification formatter consume it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSnapshot {
    pub total_cost: f64,
    pub currency: String,
    /// Sorted descending by cost
    pub account_breakdown: Vec<CostEntry>,
    /// Sorted descending by cost
    pub service_breakdown: Vec<CostEntry>,
    pub forecast_cost: f64,
    pub forecast_currency: String,
    pub month_over_month_pct: f64,
    pub billing_period: BillingPeriod,
    pub forecast_period: BillingPeriod,
}

impl BillingSnapshot {
    /// Share of the total cost, as a percentage. Zero when the total is zero
    /// so empty months never divide by zero.
    pub fn share_of_total(&self, cost: f64) -> f64 {
        if self.total_cost == 0.0 {
            0.0
        } else {
            cost / self.total_cost * 100.0
        }
    }

    /// Highest-cost account, if any
    pub fn top_account(&self) -> Option<&CostEntry> {
        self.account_breakdown.first()
    }

    /// Lowest-cost account; only meaningful alongside `top_account` when at
    /// least two accounts exist
    pub fn bottom_account(&self) -> Option<&CostEntry> {
        self.account_breakdown.last()
    }

    /// Services as displayed: the top five, plus a synthetic "Other Services"
    /// entry holding the summed cost of everything beyond rank five. The
    /// merged entry is never truncated further.
    pub fn display_services(&self) -> Vec<CostEntry> {
        let mut displayed: Vec<CostEntry> =
            self.service_breakdown.iter().take(TOP_SERVICES).cloned().collect();

        if self.service_breakdown.len() > TOP_SERVICES {
            let other_cost: f64 = self.service_breakdown[TOP_SERVICES..]
                .iter()
                .map(|entry| entry.cost)
                .sum();
            displayed.push(CostEntry::new(
                OTHER_SERVICES.to_string(),
                other_cost,
                self.currency.clone(),
            ));
        }

        displayed
    }

    /// True when there is nothing to report on
    pub fn is_empty(&self) -> bool {
        self.total_cost == 0.0 && self.account_breakdown.is_empty()
    }
}

/// Best-effort mapping from account id to display name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountDirectory {
    names: HashMap<String, String>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, id: S, name: S) {
        self.names.insert(id.into(), name.into());
    }

    /// Resolve an account id to its display name, substituting the literal
    /// `Unknown` placeholder for absent entries
    pub fn resolve(&self, id: &str) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or(UNKNOWN_ACCOUNT)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for AccountDirectory {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::last_full_month;
    use chrono::NaiveDate;

    fn snapshot_with(accounts: Vec<CostEntry>, services: Vec<CostEntry>, total: f64) -> BillingSnapshot {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        BillingSnapshot {
            total_cost: total,
            currency: "USD".to_string(),
            account_breakdown: accounts,
            service_breakdown: services,
            forecast_cost: 0.0,
            forecast_currency: "USD".to_string(),
            month_over_month_pct: 0.0,
            billing_period: last_full_month(today),
            forecast_period: crate::period::current_month_to_date(today),
        }
    }

    #[test]
    fn test_sort_descending_with_stable_ties() {
        let mut entries = vec![
            CostEntry::new("a", 10.0, "USD"),
            CostEntry::new("b", 50.0, "USD"),
            CostEntry::new("c", 10.0, "USD"),
            CostEntry::new("d", 30.0, "USD"),
        ];
        sort_by_cost_descending(&mut entries);

        let costs: Vec<f64> = entries.iter().map(|e| e.cost).collect();
        assert!(costs.windows(2).all(|w| w[0] >= w[1]));
        // Tied entries keep original order
        assert_eq!(entries[2].key, "a");
        assert_eq!(entries[3].key, "c");
    }

    #[test]
    fn test_share_of_total_guards_zero() {
        let snapshot = snapshot_with(vec![], vec![], 0.0);
        assert_eq!(snapshot.share_of_total(100.0), 0.0);

        let snapshot = snapshot_with(vec![], vec![], 1000.0);
        assert!((snapshot.share_of_total(600.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_services_merges_remainder() {
        let services: Vec<CostEntry> = [50.0, 40.0, 30.0, 20.0, 10.0, 5.0, 3.0]
            .iter()
            .enumerate()
            .map(|(i, cost)| CostEntry::new(format!("svc-{}", i), *cost, "USD".to_string()))
            .collect();
        let snapshot = snapshot_with(vec![], services, 158.0);

        let displayed = snapshot.display_services();
        assert_eq!(displayed.len(), 6);
        assert_eq!(displayed[5].key, OTHER_SERVICES);
        assert!((displayed[5].cost - 8.0).abs() < 1e-9);

        let top5_sum: f64 = displayed[..5].iter().map(|e| e.cost).sum();
        assert!((top5_sum - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_services_without_remainder() {
        let services: Vec<CostEntry> = (0..4)
            .map(|i| CostEntry::new(format!("svc-{}", i), 10.0 * (4 - i) as f64, "USD".to_string()))
            .collect();
        let snapshot = snapshot_with(vec![], services, 100.0);

        let displayed = snapshot.display_services();
        assert_eq!(displayed.len(), 4);
        assert!(displayed.iter().all(|e| e.key != OTHER_SERVICES));
    }

    #[test]
    fn test_directory_resolves_unknown() {
        let mut directory = AccountDirectory::new();
        directory.insert("111", "Prod");

        assert_eq!(directory.resolve("111"), "Prod");
        assert_eq!(directory.resolve("999"), UNKNOWN_ACCOUNT);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_top_and_bottom_account() {
        let accounts = vec![
            CostEntry::new("111", 600.0, "USD"),
            CostEntry::new("222", 400.0, "USD"),
        ];
        let snapshot = snapshot_with(accounts, vec![], 1000.0);

        assert_eq!(snapshot.top_account().unwrap().key, "111");
        assert_eq!(snapshot.bottom_account().unwrap().key, "222");
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_empty_snapshot_detection() {
        let snapshot = snapshot_with(vec![], vec![], 0.0);
        assert!(snapshot.is_empty());
        assert!(snapshot.top_account().is_none());
    }
}
