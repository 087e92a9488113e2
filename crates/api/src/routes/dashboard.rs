//! Panel home counters.

use axum::{Json, extract::State};

use dulce_arte_core::DashboardStats;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    Ok(Json(state.store().dashboard_stats().await?))
}
