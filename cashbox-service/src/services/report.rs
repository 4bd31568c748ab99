//! Printable movement report.
//!
//! [`ReportService::build_report`] gathers the data and [`render_html`] turns it
//! into a standalone HTML document. Printing or sharing the document is left to
//! the caller.

use crate::dtos::ReportRequest;
use crate::models::{MovementFilter, ReportData, ReportRow};
use crate::services::aggregation::{summarize, AggregationService};
use crate::services::metrics::REPORTS_GENERATED;
use crate::services::store::SharedStore;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_REPORT_TITLE: &str = "Cash movements report";
pub const ALL_UNITS_LABEL: &str = "All business units";

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn money(symbol: &str, amount: Decimal) -> String {
    format!("{}{:.2}", escape_html(symbol), amount)
}

fn series_rows(data: &ReportData) -> String {
    let max = data
        .series
        .iter()
        .map(|p| p.total)
        .max()
        .unwrap_or_default();

    let mut rows = String::new();
    for point in &data.series {
        let width = if max > Decimal::ZERO {
            (point.total * Decimal::ONE_HUNDRED / max)
                .round_dp(1)
                .normalize()
        } else {
            Decimal::ZERO
        };
        rows.push_str(&format!(
            r#"<tr><td class="label">{}</td><td class="bar-cell"><div class="bar" style="width: {}%"></div></td><td class="num">{}</td></tr>
"#,
            escape_html(&point.label),
            width,
            money(&data.currency_symbol, point.total)
        ));
    }
    rows
}

fn movement_rows(data: &ReportData) -> String {
    if data.rows.is_empty() {
        return r#"<tr><td colspan="6" class="empty">No movements in this period</td></tr>
"#
        .to_string();
    }

    let mut rows = String::new();
    for row in &data.rows {
        rows.push_str(&format!(
            r#"<tr class="{}"><td>{}</td><td class="num">{}</td><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td></tr>
"#,
            row.movement_type.as_str().to_lowercase(),
            row.transaction_date.format("%d/%m/%Y"),
            row.sequence_number,
            row.movement_type.label(),
            escape_html(&row.category_name),
            escape_html(row.description.as_deref().unwrap_or("")),
            money(&data.currency_symbol, row.amount)
        ));
    }
    rows
}

/// Render the report as a standalone HTML document.
pub fn render_html(data: &ReportData) -> String {
    let title = escape_html(&data.title);
    format!(
        r###"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: Arial, sans-serif; color: #222; margin: 24px; }}
h1 {{ margin-bottom: 4px; }}
.meta {{ color: #666; font-size: 12px; margin: 2px 0; }}
table {{ border-collapse: collapse; width: 100%; margin-top: 16px; }}
th, td {{ border-bottom: 1px solid #ddd; padding: 6px 8px; text-align: left; font-size: 13px; }}
.num {{ text-align: right; }}
.bar-cell {{ width: 60%; }}
.bar {{ background-color: #4CAF50; height: 12px; }}
tr.db td:last-child {{ color: #c62828; }}
.empty {{ text-align: center; color: #666; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p class="meta">{unit}</p>
<p class="meta">From {from} to {to}</p>
<p class="meta">Generated {generated_at}</p>

<table class="totals">
<tr><th>Total credits</th><td class="num">{credits}</td></tr>
<tr><th>Total debits</th><td class="num">{debits}</td></tr>
<tr><th>Tickets</th><td class="num">{tickets}</td></tr>
<tr><th>Balance</th><td class="num">{balance}</td></tr>
</table>

<h2>Sales ({granularity})</h2>
<table class="chart">
{series}</table>

<h2>Movements</h2>
<table class="movements">
<tr><th>Date</th><th class="num">#</th><th>Type</th><th>Category</th><th>Description</th><th class="num">Amount</th></tr>
{rows}</table>
</body>
</html>
"###,
        title = title,
        unit = escape_html(&data.business_unit_label),
        from = data.from.format("%d/%m/%Y"),
        to = data.to.format("%d/%m/%Y"),
        generated_at = escape_html(&data.generated_at),
        credits = money(&data.currency_symbol, data.summary.total_credits),
        debits = money(&data.currency_symbol, data.summary.total_debits),
        tickets = data.summary.ticket_count,
        balance = money(&data.currency_symbol, data.summary.balance),
        granularity = data.granularity.as_str(),
        series = series_rows(data),
        rows = movement_rows(data),
    )
}

#[derive(Clone)]
pub struct ReportService {
    store: SharedStore,
    aggregation: AggregationService,
    currency_symbol: String,
}

impl ReportService {
    pub fn new(store: SharedStore, currency_symbol: impl Into<String>) -> Self {
        Self {
            aggregation: AggregationService::new(store.clone()),
            store,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Collect everything the report shows. Opening-balance entries are left
    /// out; movements of closed periods inside the range are included.
    #[instrument(skip(self, request), fields(from = %request.from, to = %request.to))]
    pub async fn build_report(
        &self,
        request: ReportRequest,
        today: NaiveDate,
    ) -> Result<ReportData, AppError> {
        request.validate()?;
        if request.from > request.to {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Report start date must not be after its end date"
            )));
        }

        let business_unit_label = match request.business_unit_id {
            Some(id) => {
                self.store
                    .get_business_unit(id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(anyhow::anyhow!("Business unit {} not found", id))
                    })?
                    .name
            }
            None => ALL_UNITS_LABEL.to_string(),
        };

        let filter = MovementFilter {
            include_closed: true,
            ..MovementFilter::default()
        }
        .between(Some(request.from), Some(request.to));
        let mut movements = self
            .aggregation
            .scoped_movements(request.business_unit_id, filter)
            .await?;
        movements.retain(|m| !m.is_opening_balance);

        let categories: HashMap<Uuid, String> = self
            .store
            .list_categories(None, true)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let anchor = request.to.min(today);
        let series = self
            .aggregation
            .sales_series(request.business_unit_id, request.granularity, anchor)
            .await?;

        let rows = movements
            .iter()
            .map(|m| {
                let category = categories.get(&m.category_id).cloned().unwrap_or_default();
                ReportRow::from_movement(m, category)
            })
            .collect();

        Ok(ReportData {
            title: request
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string()),
            business_unit_label,
            from: request.from,
            to: request.to,
            generated_at: Utc::now().format("%d/%m/%Y %H:%M UTC").to_string(),
            currency_symbol: self.currency_symbol.clone(),
            granularity: request.granularity,
            summary: summarize(&movements),
            series,
            rows,
        })
    }

    /// Build and render in one step.
    pub async fn generate_html(
        &self,
        request: ReportRequest,
        today: NaiveDate,
    ) -> Result<String, AppError> {
        let data = self.build_report(request, today).await?;
        let html = render_html(&data);

        REPORTS_GENERATED
            .with_label_values(&[data.granularity.as_str()])
            .inc();
        info!(rows = data.rows.len(), "Report generated");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BalanceSummary, Granularity, MovementType, SeriesPoint};

    fn sample() -> ReportData {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        ReportData {
            title: "March <draft>".to_string(),
            business_unit_label: "Kiosk & Café".to_string(),
            from: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            generated_at: "10/03/2026 12:00 UTC".to_string(),
            currency_symbol: "$".to_string(),
            granularity: Granularity::Weekly,
            summary: BalanceSummary {
                total_credits: Decimal::from(150),
                total_debits: Decimal::from(40),
                ticket_count: 2,
                balance: Decimal::from(110),
            },
            series: vec![
                SeriesPoint {
                    label: "Mon".to_string(),
                    start: day,
                    end: day,
                    total: Decimal::from(150),
                },
                SeriesPoint {
                    label: "Tue".to_string(),
                    start: day,
                    end: day,
                    total: Decimal::from(75),
                },
            ],
            rows: vec![
                ReportRow {
                    transaction_date: day,
                    sequence_number: 2,
                    movement_type: MovementType::Debit,
                    category_name: "Supplies".to_string(),
                    description: Some("<script>alert(1)</script>".to_string()),
                    amount: Decimal::from(40),
                },
                ReportRow {
                    transaction_date: day,
                    sequence_number: 1,
                    movement_type: MovementType::Credit,
                    category_name: "Sales".to_string(),
                    description: None,
                    amount: Decimal::from(150),
                },
            ],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_escapes_user_text() {
        let html = render_html(&sample());
        assert!(html.contains("March &lt;draft&gt;"));
        assert!(html.contains("Kiosk &amp; Café"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_contains_totals_and_rows() {
        let html = render_html(&sample());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("$150.00"));
        assert!(html.contains("$110.00"));
        assert!(html.contains("<td>Debit</td>"));
        assert!(html.contains("<td>Credit</td>"));
        assert!(html.contains("From 01/03/2026 to 31/03/2026"));
    }

    #[test]
    fn test_chart_bars_scale_to_largest_bucket() {
        let html = render_html(&sample());
        assert!(html.contains("width: 100%"));
        assert!(html.contains("width: 50%"));
    }

    #[test]
    fn test_empty_report_has_placeholder_row() {
        let mut data = sample();
        data.rows.clear();
        assert!(render_html(&data).contains("No movements in this period"));
    }
}
