//! Report routes.

use axum::{Json, Router, extract::State, routing::get};
use khata_core::reports::{ReportPeriod, ReportTotals};
use serde::Deserialize;
use tracing::info;

use crate::{
    AppState,
    error::{ApiQuery, ApiResult},
    middleware::AuthUser,
};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports", get(get_report))
}

/// Query parameters for a report.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// `daily`, `monthly` or `yearly`.
    pub period: String,
    /// Calendar year.
    pub year: i32,
    /// Month, for daily and monthly reports.
    pub month: Option<u32>,
    /// Day, for daily reports.
    pub day: Option<u32>,
}

/// GET `/reports?period=&year=&month=&day=`
async fn get_report(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<Json<ReportTotals>> {
    let period = ReportPeriod::from_query(&query.period, query.year, query.month, query.day)?;
    let totals = state.repository.report(period).await?;
    info!(user_id = %auth.user_id(), period = ?totals.period, "report generated");
    Ok(Json(totals))
}
