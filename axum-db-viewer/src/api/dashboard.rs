//! Dashboard endpoint

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{Datelike, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ViewerState};
use crate::database::traits::DatabaseProvider;
use crate::schema::DashboardStats;

/// Query parameters for the dashboard
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    /// First day, `YYYY-MM-DD`
    pub start_date: Option<String>,

    /// Last day (inclusive), `YYYY-MM-DD`
    pub end_date: Option<String>,
}

/// Dashboard statistics plus the date range they cover
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,
}

/// Handler for GET /api/dashboard
///
/// Missing or unparsable dates default to the first and last day of the
/// current month.
pub async fn dashboard_handler<DB: DatabaseProvider>(
    State(state): State<Arc<ViewerState<DB>>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let (month_start, month_end) = current_month(Local::now().date_naive());
    let start_date = parse_day(query.start_date.as_deref()).unwrap_or(month_start);
    let end_date = parse_day(query.end_date.as_deref()).unwrap_or(month_end);

    let stats = state
        .introspector
        .dashboard_stats(Some(start_date), Some(end_date))
        .await?;

    Ok(Json(DashboardResponse {
        stats,
        start_date,
        end_date,
    }))
}

fn parse_day(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?.trim(), "%Y-%m-%d").ok()
}

/// First and last day of the month containing `today`
fn current_month(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    (start, end)
}
