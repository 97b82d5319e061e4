//! Chat notification digest
//!
//! Formats the billing snapshot into the fixed-width text message posted to
//! the chat channel. Pure function of the snapshot and directory; the
//! transport is someone else's problem.

use crate::{
    billing::{AccountDirectory, BillingSnapshot},
    output::{truncate_label, TrendDirection, ACCOUNT_NAME_BUDGET},
};
use std::fmt::Write;

const RULE: &str = "----------------------------------------------------------------";

/// Accounts shown in the digest table
const TOP_ACCOUNTS: usize = 5;

/// Format the fixed-width digest: banner, summary, top accounts and key
/// insights. Currency fields use 2 decimals, percentages 1 decimal.
pub fn format_digest(snapshot: &BillingSnapshot, directory: &AccountDirectory) -> String {
    let trend = TrendDirection::from_pct(snapshot.month_over_month_pct);
    let mut message = String::new();

    message.push_str("==================================================\n");
    message.push_str("||          $$$$ AWS COST OPTIMIZATION REPORT $$$$         ||\n");
    message.push_str("==================================================\n\n");

    // Summary
    message.push_str("```\nSUMMARY\n");
    message.push_str(RULE);
    message.push('\n');
    let _ = writeln!(message, "Billing Period       | {}", snapshot.billing_period);
    let _ = writeln!(message, "Total AWS Cost       | ${:.2}", snapshot.total_cost);
    let _ = writeln!(
        message,
        "Forecast (Current)   | ${:.2} {} {}",
        snapshot.forecast_cost,
        trend.emoji(),
        trend.signed_pct(snapshot.month_over_month_pct)
    );
    message.push_str(RULE);
    message.push_str("\n```\n\n");

    // Top accounts
    message.push_str("*Top AWS Accounts:*\n```\n");
    message.push_str("  Account ID    |  Account Name  |  Cost (USD)  |  % of Total  \n");
    message.push_str(RULE);
    message.push('\n');
    for entry in snapshot.account_breakdown.iter().take(TOP_ACCOUNTS) {
        let id: String = entry.key.chars().take(12).collect();
        let name = truncate_label(directory.resolve(&entry.key), ACCOUNT_NAME_BUDGET);
        let _ = writeln!(
            message,
            " {}  | {:<12} | ${:10.2} | {:10.1}%",
            id,
            name,
            entry.cost,
            snapshot.share_of_total(entry.cost)
        );
    }
    message.push_str(RULE);
    message.push_str("\n```\n\n");

    // Key insights
    message.push_str("*Key Insights:*\n```\n");
    message.push_str("METRIC                        | VALUE\n");
    message.push_str(RULE);
    message.push('\n');

    if let Some(highest) = snapshot.top_account() {
        let _ = writeln!(
            message,
            "Highest Spending Account    | {} - {}",
            highest.key,
            directory.resolve(&highest.key)
        );
        let _ = writeln!(message, "                            | ${:.2}", highest.cost);

        if snapshot.account_breakdown.len() > 1 {
            let lowest = snapshot
                .bottom_account()
                .expect("non-empty breakdown has a last entry");
            let _ = writeln!(
                message,
                "Lowest Spending Account     | {} - {}",
                lowest.key,
                directory.resolve(&lowest.key)
            );
            let _ = writeln!(message, "                            | ${:.2}", lowest.cost);
        }
    }

    if let Some(top_service) = snapshot.service_breakdown.first() {
        let _ = writeln!(message, "Highest Cost Service        | {}", top_service.key);
        let _ = writeln!(
            message,
            "                            | ${:.2} ({:.1}% of total)",
            top_service.cost,
            snapshot.share_of_total(top_service.cost)
        );
    }

    if snapshot.month_over_month_pct != 0.0 {
        let direction = if snapshot.month_over_month_pct > 0.0 {
            "increase"
        } else {
            "decrease"
        };
        let _ = writeln!(
            message,
            "Month-over-Month Trend      | {:.1}% {}",
            snapshot.month_over_month_pct.abs(),
            direction
        );
    }

    message.push_str(RULE);
    message.push_str("\n```");

    message
}
