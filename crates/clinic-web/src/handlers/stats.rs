//! 统计接口

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use clinic_stats::entity_stats::default_consultation_range;
use clinic_stats::{compute_dashboard, compute_entity_stats, DashboardSummary, EntityKind, EntityStatsSummary};

use super::DateRangeParams;
use super::consultations::resolve_range;
use crate::error::ApiResult;
use crate::server::AppState;

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardSummary>> {
    let summary = compute_dashboard(state.store.as_ref(), Utc::now(), &state.dashboard).await?;
    Ok(Json(summary))
}

async fn entity(state: &AppState, kind: EntityKind) -> ApiResult<Json<EntityStatsSummary>> {
    let summary = compute_entity_stats(state.store.as_ref(), kind, Utc::now(), None).await?;
    Ok(Json(summary))
}

pub async fn patients(State(state): State<AppState>) -> ApiResult<Json<EntityStatsSummary>> {
    entity(&state, EntityKind::Patients).await
}

pub async fn medecins(State(state): State<AppState>) -> ApiResult<Json<EntityStatsSummary>> {
    entity(&state, EntityKind::Medecins).await
}

pub async fn rendez_vous(State(state): State<AppState>) -> ApiResult<Json<EntityStatsSummary>> {
    entity(&state, EntityKind::RendezVous).await
}

pub async fn consultations(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> ApiResult<Json<EntityStatsSummary>> {
    let now = Utc::now();
    let range = resolve_range(&params, default_consultation_range(now))?;
    let summary =
        compute_entity_stats(state.store.as_ref(), EntityKind::Consultations, now, Some(range)).await?;
    Ok(Json(summary))
}
