//! Snapshot to document rendering
//!
//! Pure layout logic: turns the billing snapshot into the ordered block
//! list described in the module docs. No I/O and no drawing here.

use crate::{
    billing::{AccountDirectory, BillingSnapshot},
    output::{format_amount, truncate_label, TrendDirection, SERVICE_NAME_BUDGET},
    providers::OrgIdentity,
    report::{
        BarSegment, Block, Callout, CalloutTone, Document, LegendEntry, Table, SERVICE_PALETTE,
    },
};
use chrono::{DateTime, Utc};

/// Fixed title of every generated report
const REPORT_TITLE: &str = "AWS Billing Report";

/// Placeholder rendered when the account breakdown is empty
const NO_DATA_PLACEHOLDER: &str = "No billing data available for this period.";

/// Static cost optimization guidance; content is constant, not computed
const RECOMMENDATIONS: [(&str, &str); 3] = [
    (
        "1. Identify Idle Resources",
        "Look for idle EC2 instances, unattached EBS volumes, and unused Elastic IPs \
         which may be generating unnecessary costs across all your accounts.",
    ),
    (
        "2. Consider Reserved Instances",
        "For consistently running workloads, Reserved Instances can offer significant \
         discounts compared to On-Demand pricing. Review your highest-cost accounts \
         for RI opportunities.",
    ),
    (
        "3. Use AWS Budgets and Cost Explorer",
        "Set up budget alerts for each account and regularly review cost trends in \
         AWS Cost Explorer to identify optimization opportunities.",
    ),
];

/// Render the billing snapshot into the report document.
///
/// Section order follows the report layout: summary and forecast, account
/// table with highlights, then on a new page the service table, the cost
/// distribution visualization and the recommendations.
pub fn render(
    snapshot: &BillingSnapshot,
    org: &OrgIdentity,
    directory: &AccountDirectory,
    generated_at: DateTime<Utc>,
) -> Document {
    let mut blocks = Vec::new();

    summary_section(&mut blocks, snapshot);
    account_section(&mut blocks, snapshot, directory);
    blocks.push(Block::PageBreak);
    service_section(&mut blocks, snapshot);
    recommendation_section(&mut blocks);

    Document {
        title: REPORT_TITLE.to_string(),
        org: org.clone(),
        generated_at,
        blocks,
    }
}

fn summary_section(blocks: &mut Vec<Block>, snapshot: &BillingSnapshot) {
    blocks.push(Block::Banner("Monthly Billing Summary".to_string()));
    blocks.push(Block::CenteredLine(format!(
        "Billing Period: {}",
        snapshot.billing_period
    )));
    blocks.push(Block::Badge(format!(
        "Total Cost: {}",
        format_amount(&snapshot.currency, snapshot.total_cost)
    )));

    blocks.push(Block::Heading("Cost Forecast".to_string()));
    blocks.push(Block::TextLine(format!(
        "Current Month Forecast: {}",
        format_amount(&snapshot.forecast_currency, snapshot.forecast_cost)
    )));
    blocks.push(Block::TrendLine {
        label: "Month-over-Month Change".to_string(),
        pct: snapshot.month_over_month_pct,
        direction: TrendDirection::from_pct(snapshot.month_over_month_pct),
    });
    blocks.push(Block::TextLine(format!(
        "Forecast Period: {}",
        snapshot.forecast_period
    )));
}

fn account_section(
    blocks: &mut Vec<Block>,
    snapshot: &BillingSnapshot,
    directory: &AccountDirectory,
) {
    blocks.push(Block::Heading("Cost by AWS Account".to_string()));

    if snapshot.account_breakdown.is_empty() {
        blocks.push(Block::Placeholder(NO_DATA_PLACEHOLDER.to_string()));
        return;
    }

    let rows = snapshot
        .account_breakdown
        .iter()
        .map(|entry| {
            vec![
                entry.key.clone(),
                directory.resolve(&entry.key).to_string(),
                format_amount(&snapshot.currency, entry.cost),
                format!("{:.1}%", snapshot.share_of_total(entry.cost)),
            ]
        })
        .collect();

    blocks.push(Block::Table(Table {
        headers: vec![
            "Account ID".to_string(),
            "Account Name".to_string(),
            "Cost".to_string(),
            "% of Total".to_string(),
        ],
        rows,
        col_widths: vec![50.0, 70.0, 35.0, 35.0],
        highlight_top: true,
    }));

    blocks.push(Block::Heading("Account Highlights".to_string()));

    // The breakdown is sorted, so the extremes are the first and last rows.
    let highest = &snapshot.account_breakdown[0];
    blocks.push(Block::Callout(Callout {
        title: "Highest Spending Account".to_string(),
        lines: vec![
            format!("Account ID: {}", highest.key),
            format!("Name: {}", directory.resolve(&highest.key)),
            format!("Cost: {}", format_amount(&snapshot.currency, highest.cost)),
        ],
        tone: CalloutTone::Highlight,
    }));

    if snapshot.account_breakdown.len() > 1 {
        let lowest = snapshot
            .account_breakdown
            .last()
            .expect("non-empty breakdown has a last entry");
        blocks.push(Block::Callout(Callout {
            title: "Lowest Spending Account".to_string(),
            lines: vec![
                format!("Account ID: {}", lowest.key),
                format!("Name: {}", directory.resolve(&lowest.key)),
                format!("Cost: {}", format_amount(&snapshot.currency, lowest.cost)),
            ],
            tone: CalloutTone::Positive,
        }));
    }
}

fn service_section(blocks: &mut Vec<Block>, snapshot: &BillingSnapshot) {
    blocks.push(Block::Heading("Cost by AWS Service".to_string()));

    if snapshot.service_breakdown.is_empty() {
        return;
    }

    let displayed = snapshot.display_services();

    let rows = displayed
        .iter()
        .map(|entry| {
            vec![
                truncate_label(&entry.key, SERVICE_NAME_BUDGET),
                format_amount(&snapshot.currency, entry.cost),
                format!("{:.1}%", snapshot.share_of_total(entry.cost)),
            ]
        })
        .collect();

    blocks.push(Block::Table(Table {
        headers: vec![
            "Service".to_string(),
            "Cost".to_string(),
            "% of Total".to_string(),
        ],
        rows,
        col_widths: vec![100.0, 45.0, 45.0],
        highlight_top: false,
    }));

    blocks.push(Block::SubHeading("Service Cost Distribution".to_string()));

    let segments = displayed
        .iter()
        .enumerate()
        .map(|(i, entry)| BarSegment {
            label: truncate_label(&entry.key, SERVICE_NAME_BUDGET),
            fraction: snapshot.share_of_total(entry.cost) / 100.0,
            color: palette_color(i),
        })
        .collect();
    blocks.push(Block::StackedBar(segments));

    let legend = displayed
        .iter()
        .enumerate()
        .map(|(i, entry)| LegendEntry {
            label: truncate_label(&entry.key, SERVICE_NAME_BUDGET),
            pct: snapshot.share_of_total(entry.cost),
            color: palette_color(i),
        })
        .collect();
    blocks.push(Block::Legend(legend));
}

fn recommendation_section(blocks: &mut Vec<Block>) {
    blocks.push(Block::Heading("Cost Optimization Recommendations".to_string()));
    for (title, body) in RECOMMENDATIONS {
        blocks.push(Block::Recommendation {
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}

fn palette_color(index: usize) -> crate::report::Rgb8 {
    SERVICE_PALETTE[index.min(SERVICE_PALETTE.len() - 1)]
}
