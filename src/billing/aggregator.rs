//! Billing data aggregation
//!
//! Calls the cost API for the period total, both breakdowns and the
//! forecast, and assembles the normalized snapshot. Only the total-cost
//! fetch is fatal; every other fetch degrades to a documented fallback
//! decided here, in one place.

use crate::{
    billing::{sort_by_cost_descending, BillingSnapshot, CostEntry, Dimension},
    period::BillingPeriod,
    providers::CostApi,
    ReportError, Result,
};
use tracing::{info, warn};

/// Fetch and assemble the billing snapshot for one run.
///
/// A failed total-cost fetch aborts with [`ReportError::NoBillingData`];
/// breakdown failures yield empty breakdowns and a forecast failure yields a
/// zero forecast with a zero month-over-month change.
pub async fn aggregate(
    api: &dyn CostApi,
    billing_period: BillingPeriod,
    forecast_period: BillingPeriod,
) -> Result<BillingSnapshot> {
    info!("Fetching billing data for {}", billing_period);

    let total = api.total_cost(&billing_period).await.map_err(|e| {
        ReportError::no_billing_data(format!("total cost fetch failed: {}", e))
    })?;

    let account_breakdown = fetch_breakdown(api, &billing_period, Dimension::Account, &total.currency).await;
    let service_breakdown = fetch_breakdown(api, &billing_period, Dimension::Service, &total.currency).await;

    let (forecast_cost, forecast_currency, month_over_month_pct) =
        match api.forecast(&forecast_period).await {
            Ok(forecast) => {
                let pct = if total.amount == 0.0 {
                    0.0
                } else {
                    (forecast.amount - total.amount) / total.amount * 100.0
                };
                (forecast.amount, forecast.currency, pct)
            }
            Err(e) => {
                warn!(operation = "forecast", error = %e, "Could not get forecast data");
                (0.0, total.currency.clone(), 0.0)
            }
        };

    Ok(BillingSnapshot {
        total_cost: total.amount,
        currency: total.currency,
        account_breakdown,
        service_breakdown,
        forecast_cost,
        forecast_currency,
        month_over_month_pct,
        billing_period,
        forecast_period,
    })
}

async fn fetch_breakdown(
    api: &dyn CostApi,
    period: &BillingPeriod,
    dimension: Dimension,
    currency: &str,
) -> Vec<CostEntry> {
    match api.cost_by_dimension(period, dimension).await {
        Ok(rows) => {
            let mut entries: Vec<CostEntry> = rows
                .into_iter()
                .map(|(key, cost)| CostEntry::new(key, cost, currency.to_string()))
                .collect();
            sort_by_cost_descending(&mut entries);
            entries
        }
        Err(e) => {
            warn!(
                operation = "cost_by_dimension",
                dimension = dimension.as_str(),
                error = %e,
                "Breakdown fetch failed, continuing without it"
            );
            Vec::new()
        }
    }
}
