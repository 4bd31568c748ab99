//! Financial aggregation: balances, sales series, activity feed, dashboard.
//!
//! The bucketing functions are pure and take the reference day explicitly;
//! [`AggregationService`] loads movements through the gateway and feeds them in.

use crate::models::{
    ActivityItem, BalanceSummary, BusinessUnit, CashMovement, DailySales, DashboardSummary,
    Granularity, MovementFilter, MovementType, SeriesPoint, UnitBalance,
};
use crate::services::store::SharedStore;
use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

pub const MAX_DAILY_SALES_DAYS: u32 = 366;
pub const MAX_ACTIVITY_ITEMS: i64 = 100;

/// Totals over `movements`. Inactive rows are ignored, and carried-forward
/// opening balances move money without counting as a ticket.
pub fn summarize<'a, I>(movements: I) -> BalanceSummary
where
    I: IntoIterator<Item = &'a CashMovement>,
{
    let mut summary = BalanceSummary::default();
    for movement in movements.into_iter().filter(|m| m.is_active) {
        match movement.movement_type {
            MovementType::Credit => {
                summary.total_credits += movement.amount;
                if !movement.is_opening_balance {
                    summary.ticket_count += 1;
                }
            }
            MovementType::Debit => summary.total_debits += movement.amount,
        }
    }
    summary.balance = summary.total_credits - summary.total_debits;
    summary
}

/// Sum of sales per day for the `days` days ending at `today`, oldest first.
/// Days without sales are present with a zero total.
pub fn daily_sales<'a, I>(movements: I, days: u32, today: NaiveDate) -> Vec<DailySales>
where
    I: IntoIterator<Item = &'a CashMovement>,
{
    let Some(start) = days
        .checked_sub(1)
        .and_then(|back| today.checked_sub_days(Days::new(u64::from(back))))
    else {
        return Vec::new();
    };
    let mut totals = vec![Decimal::ZERO; days as usize];

    for movement in movements.into_iter().filter(|m| m.is_sale()) {
        let date = movement.transaction_date;
        if date < start || date > today {
            continue;
        }
        totals[(date - start).num_days() as usize] += movement.amount;
    }

    totals
        .into_iter()
        .enumerate()
        .filter_map(|(offset, total)| {
            start
                .checked_add_days(Days::new(offset as u64))
                .map(|date| DailySales { date, total })
        })
        .collect()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Empty, labelled buckets for `granularity` ending at `anchor`.
/// Buckets that would fall before the first representable date are omitted.
pub fn series_buckets(granularity: Granularity, anchor: NaiveDate) -> Vec<SeriesPoint> {
    let daily = |days: u64, format: &str| {
        (0..days)
            .rev()
            .filter_map(|back| anchor.checked_sub_days(Days::new(back)))
            .map(|day| SeriesPoint {
                label: day.format(format).to_string(),
                start: day,
                end: day,
                total: Decimal::ZERO,
            })
            .collect::<Vec<_>>()
    };

    match granularity {
        Granularity::Weekly => daily(7, "%a"),
        Granularity::Monthly => daily(30, "%d/%m"),
        Granularity::Annual => {
            let current = first_of_month(anchor);
            (0..12u32)
                .rev()
                .filter_map(|back| current.checked_sub_months(Months::new(back)))
                .map(|start| SeriesPoint {
                    label: start.format("%b").to_string(),
                    start,
                    end: last_of_month(start),
                    total: Decimal::ZERO,
                })
                .collect()
        }
    }
}

/// Inclusive date range covered by the series for `granularity` at `anchor`,
/// or `None` when the range starts before the first representable date.
pub fn series_window(
    granularity: Granularity,
    anchor: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    match granularity {
        Granularity::Weekly => anchor.checked_sub_days(Days::new(6)).map(|s| (s, anchor)),
        Granularity::Monthly => anchor.checked_sub_days(Days::new(29)).map(|s| (s, anchor)),
        Granularity::Annual => first_of_month(anchor)
            .checked_sub_months(Months::new(11))
            .map(|s| (s, last_of_month(anchor))),
    }
}

fn date_out_of_range(anchor: NaiveDate) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Date {} is outside the supported calendar range",
        anchor
    ))
}

/// Sales bucketed per `granularity`, ending at `anchor`. Gaps are zero-filled.
pub fn sales_series<'a, I>(
    movements: I,
    granularity: Granularity,
    anchor: NaiveDate,
) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a CashMovement>,
{
    let mut buckets = series_buckets(granularity, anchor);
    for movement in movements.into_iter().filter(|m| m.is_sale()) {
        let date = movement.transaction_date;
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|b| b.start <= date && date <= b.end)
        {
            bucket.total += movement.amount;
        }
    }
    buckets
}

/// Read-side service over the gateway.
#[derive(Clone)]
pub struct AggregationService {
    store: SharedStore,
}

impl AggregationService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    async fn require_unit(&self, id: Uuid) -> Result<BusinessUnit, AppError> {
        self.store
            .get_business_unit(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Business unit {} not found", id)))
    }

    /// Movements for one unit, or for every active unit when `unit` is `None`.
    /// Pagination in `filter` is applied by the store.
    pub(crate) async fn scoped_movements(
        &self,
        unit: Option<Uuid>,
        mut filter: MovementFilter,
    ) -> Result<Vec<CashMovement>, AppError> {
        filter.business_unit_id = unit;
        match unit {
            Some(id) => {
                self.require_unit(id).await?;
            }
            None => filter.active_units_only = true,
        }
        self.store.list_movements(&filter).await
    }

    /// Sales (credits, closed periods included) for the inclusive range.
    async fn sales_movements(
        &self,
        unit: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CashMovement>, AppError> {
        let filter = MovementFilter {
            movement_type: Some(MovementType::Credit),
            include_closed: true,
            ..MovementFilter::default()
        }
        .between(Some(from), Some(to));
        self.scoped_movements(unit, filter).await
    }

    /// Balance of the open period of one unit.
    #[instrument(skip(self))]
    pub async fn get_balance(
        &self,
        business_unit_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<BalanceSummary, AppError> {
        let filter = MovementFilter::default().between(from, to);
        let movements = self.scoped_movements(Some(business_unit_id), filter).await?;
        Ok(summarize(&movements))
    }

    /// Balance of the open period over all active units.
    #[instrument(skip(self))]
    pub async fn get_global_balance(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<BalanceSummary, AppError> {
        let filter = MovementFilter::default().between(from, to);
        let movements = self.scoped_movements(None, filter).await?;
        Ok(summarize(&movements))
    }

    /// One balance per active unit, in display order.
    #[instrument(skip(self))]
    pub async fn unit_balances(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<UnitBalance>, AppError> {
        let units = self.store.list_business_units(false).await?;
        let filter = MovementFilter {
            active_units_only: true,
            ..MovementFilter::default()
        }
        .between(from, to);
        let movements = self.store.list_movements(&filter).await?;

        let mut by_unit: HashMap<Uuid, Vec<&CashMovement>> = HashMap::new();
        for movement in &movements {
            by_unit
                .entry(movement.business_unit_id)
                .or_default()
                .push(movement);
        }

        Ok(units
            .into_iter()
            .map(|unit| {
                let summary = by_unit
                    .get(&unit.id)
                    .map(|ms| summarize(ms.iter().copied()))
                    .unwrap_or_default();
                UnitBalance {
                    business_unit_id: unit.id,
                    name: unit.name,
                    color: unit.color,
                    summary,
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn daily_sales(
        &self,
        business_unit_id: Option<Uuid>,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<DailySales>, AppError> {
        if days == 0 || days > MAX_DAILY_SALES_DAYS {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "days must be between 1 and {}",
                MAX_DAILY_SALES_DAYS
            )));
        }
        let from = today
            .checked_sub_days(Days::new(u64::from(days) - 1))
            .ok_or_else(|| date_out_of_range(today))?;
        let movements = self.sales_movements(business_unit_id, from, today).await?;
        Ok(daily_sales(&movements, days, today))
    }

    #[instrument(skip(self))]
    pub async fn sales_series(
        &self,
        business_unit_id: Option<Uuid>,
        granularity: Granularity,
        today: NaiveDate,
    ) -> Result<Vec<SeriesPoint>, AppError> {
        let (from, to) =
            series_window(granularity, today).ok_or_else(|| date_out_of_range(today))?;
        let movements = self.sales_movements(business_unit_id, from, to).await?;
        Ok(sales_series(&movements, granularity, today))
    }

    /// Latest active movements with unit and category names, newest first.
    #[instrument(skip(self))]
    pub async fn activity_feed(
        &self,
        business_unit_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> Result<Vec<ActivityItem>, AppError> {
        let limit = limit.unwrap_or(20).clamp(1, MAX_ACTIVITY_ITEMS);
        let units: HashMap<Uuid, String> = self
            .store
            .list_business_units(true)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();
        let categories: HashMap<Uuid, String> = self
            .store
            .list_categories(None, true)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let filter = MovementFilter {
            include_closed: true,
            limit: Some(limit),
            ..MovementFilter::default()
        };
        let movements = self.scoped_movements(business_unit_id, filter).await?;

        Ok(movements
            .into_iter()
            .map(|m| ActivityItem {
                movement_id: m.id,
                business_unit_id: m.business_unit_id,
                business_unit_name: units.get(&m.business_unit_id).cloned().unwrap_or_default(),
                category_name: categories.get(&m.category_id).cloned().unwrap_or_default(),
                movement_type: m.movement_type,
                amount: m.amount,
                description: m.description,
                transaction_date: m.transaction_date,
                sequence_number: m.sequence_number,
                created_by: m.created_by,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary, AppError> {
        let global = self.get_global_balance(None, None).await?;
        let units = self.unit_balances(None, None).await?;
        let today_sales = self
            .daily_sales(None, 1, today)
            .await?
            .first()
            .map(|d| d.total)
            .unwrap_or_default();
        let weekly_sales = self.sales_series(None, Granularity::Weekly, today).await?;

        Ok(DashboardSummary {
            date: today,
            global,
            units,
            today_sales,
            weekly_sales,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn movement(movement_type: MovementType, amount: i64, date: NaiveDate) -> CashMovement {
        CashMovement {
            id: Uuid::new_v4(),
            business_unit_id: Uuid::nil(),
            movement_type,
            category_id: Uuid::nil(),
            amount: Decimal::from(amount),
            description: None,
            transaction_date: date,
            sequence_number: 1,
            partner_account_id: None,
            point_of_sale_id: None,
            created_by: None,
            is_opening_balance: false,
            is_active: true,
            closed_period: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_balance_is_credits_minus_debits() {
        let today = day(2026, 3, 15);
        let mut inactive = movement(MovementType::Credit, 1000, today);
        inactive.is_active = false;
        let movements = vec![
            movement(MovementType::Credit, 100, today),
            movement(MovementType::Credit, 50, today),
            movement(MovementType::Debit, 30, today),
            inactive,
        ];

        let summary = summarize(&movements);
        assert_eq!(summary.total_credits, Decimal::from(150));
        assert_eq!(summary.total_debits, Decimal::from(30));
        assert_eq!(summary.ticket_count, 2);
        assert_eq!(summary.balance, summary.total_credits - summary.total_debits);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(
            summarize(std::iter::empty::<&CashMovement>()),
            BalanceSummary::default()
        );
    }

    #[test]
    fn test_daily_sales_zero_fills_and_orders_oldest_first() {
        let today = day(2026, 3, 15);
        let movements = vec![
            movement(MovementType::Credit, 10, today),
            movement(MovementType::Credit, 5, today),
            movement(MovementType::Credit, 7, day(2026, 3, 13)),
            movement(MovementType::Debit, 99, day(2026, 3, 13)),
            movement(MovementType::Credit, 1, day(2026, 3, 1)),
        ];

        let series = daily_sales(&movements, 5, today);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].date, day(2026, 3, 11));
        assert_eq!(series[4].date, today);
        assert_eq!(series[2].total, Decimal::from(7));
        assert_eq!(series[3].total, Decimal::ZERO);
        assert_eq!(series[4].total, Decimal::from(15));
    }

    #[test]
    fn test_daily_sales_ignores_opening_balance() {
        let today = day(2026, 3, 15);
        let mut opening = movement(MovementType::Credit, 500, today);
        opening.is_opening_balance = true;
        let series = daily_sales(&[opening], 1, today);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].total, Decimal::ZERO);
    }

    #[test]
    fn test_weekly_series_labels_weekdays() {
        // 2026-03-15 is a Sunday.
        let buckets = series_buckets(Granularity::Weekly, day(2026, 3, 15));
        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
    }

    #[test]
    fn test_monthly_series_has_thirty_days() {
        let buckets = series_buckets(Granularity::Monthly, day(2026, 3, 15));
        assert_eq!(buckets.len(), 30);
        assert_eq!(buckets[0].label, "14/02");
        assert_eq!(buckets[29].label, "15/03");
    }

    #[test]
    fn test_annual_series_ends_with_current_month() {
        let today = day(2026, 3, 15);
        let movements = vec![
            movement(MovementType::Credit, 20, day(2026, 3, 1)),
            movement(MovementType::Credit, 30, day(2026, 3, 31)),
            movement(MovementType::Credit, 40, day(2025, 4, 2)),
            movement(MovementType::Credit, 99, day(2025, 3, 31)),
        ];

        let series = sales_series(&movements, Granularity::Annual, today);
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].label, "Apr");
        assert_eq!(series[0].start, day(2025, 4, 1));
        assert_eq!(series[0].total, Decimal::from(40));
        assert_eq!(series[11].label, "Mar");
        assert_eq!(series[11].end, day(2026, 3, 31));
        assert_eq!(series[11].total, Decimal::from(50));
    }

    #[test]
    fn test_series_window_matches_buckets() {
        let today = day(2026, 2, 10);
        for granularity in [Granularity::Weekly, Granularity::Monthly, Granularity::Annual] {
            let buckets = series_buckets(granularity, today);
            let (from, to) = series_window(granularity, today).unwrap();
            assert_eq!(buckets.first().unwrap().start, from);
            assert_eq!(buckets.last().unwrap().end, to);
        }
    }

    #[test]
    fn test_summarize_does_not_count_opening_balance_as_ticket() {
        let today = day(2026, 4, 1);
        let mut opening = movement(MovementType::Credit, 100, today);
        opening.is_opening_balance = true;
        let movements = vec![opening, movement(MovementType::Credit, 25, today)];

        let summary = summarize(&movements);
        assert_eq!(summary.total_credits, Decimal::from(125));
        assert_eq!(summary.ticket_count, 1);
    }

    #[test]
    fn test_calendar_start_does_not_underflow() {
        assert!(daily_sales(std::iter::empty::<&CashMovement>(), 7, NaiveDate::MIN).is_empty());
        assert_eq!(
            daily_sales(std::iter::empty::<&CashMovement>(), 1, NaiveDate::MIN).len(),
            1
        );
        assert!(series_window(Granularity::Weekly, NaiveDate::MIN).is_none());
        assert!(series_window(Granularity::Annual, NaiveDate::MIN).is_none());
        assert_eq!(series_buckets(Granularity::Monthly, NaiveDate::MIN).len(), 1);
    }

    mod service {
        use super::*;
        use crate::models::{BusinessUnitUpdate, NewBusinessUnit, NewCategory, NewMovement};
        use crate::services::memory::InMemoryStore;
        use crate::services::store::CashboxStore;
        use std::sync::Arc;

        async fn unit(store: &InMemoryStore, name: &str) -> Uuid {
            store
                .insert_business_unit(&NewBusinessUnit {
                    name: name.to_string(),
                    color: "#336699".to_string(),
                    display_order: 0,
                })
                .await
                .unwrap()
                .id
        }

        async fn sale(store: &InMemoryStore, unit: Uuid, category: Uuid, amount: i64) {
            store
                .insert_movement(&NewMovement {
                    business_unit_id: unit,
                    movement_type: MovementType::Credit,
                    category_id: category,
                    amount: Decimal::from(amount),
                    description: None,
                    transaction_date: day(2026, 5, 4),
                    partner_account_id: None,
                    point_of_sale_id: None,
                    created_by: None,
                    is_opening_balance: false,
                })
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_out_of_range_dates_are_rejected() {
            let service = AggregationService::new(Arc::new(InMemoryStore::new()));

            let daily = service.daily_sales(None, 7, NaiveDate::MIN).await;
            assert!(matches!(daily, Err(AppError::BadRequest(_))));

            let series = service
                .sales_series(None, Granularity::Weekly, NaiveDate::MIN)
                .await;
            assert!(matches!(series, Err(AppError::BadRequest(_))));

            let dashboard = service.dashboard(NaiveDate::MIN).await;
            assert!(matches!(dashboard, Err(AppError::BadRequest(_))));
        }

        #[tokio::test]
        async fn test_activity_feed_is_limited_and_skips_inactive_units() {
            let store = InMemoryStore::new();
            let open = unit(&store, "Open").await;
            let closed = unit(&store, "Closed").await;
            let category = store
                .insert_category(&NewCategory {
                    name: "Sales".to_string(),
                    movement_type: MovementType::Credit,
                })
                .await
                .unwrap()
                .id;
            for amount in [1, 2, 3] {
                sale(&store, open, category, amount).await;
            }
            sale(&store, closed, category, 99).await;
            store
                .update_business_unit(
                    closed,
                    &BusinessUnitUpdate {
                        is_active: Some(false),
                        ..BusinessUnitUpdate::default()
                    },
                )
                .await
                .unwrap();

            let service = AggregationService::new(Arc::new(store));
            let feed = service.activity_feed(None, Some(2)).await.unwrap();
            let amounts: Vec<Decimal> = feed.iter().map(|item| item.amount).collect();
            assert_eq!(amounts, vec![Decimal::from(3), Decimal::from(2)]);

            let global = service.get_global_balance(None, None).await.unwrap();
            assert_eq!(global.total_credits, Decimal::from(6));
        }
    }
}
