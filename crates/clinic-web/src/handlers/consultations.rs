//! 诊疗记录接口

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use clinic_core::store::{resolve_consultation_names, ConsultationFilter, DateRange};
use clinic_core::utils::{end_of_day, new_id};
use clinic_core::{
    merge_patch, ClinicError, Consultation, ConsultationInput, ConsultationStatut, ConsultationWithNames, Result,
    Validate,
};
use clinic_stats::entity_stats::{consultation_stats, default_consultation_range, ConsultationStats};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{deleted, parse_date, DateRangeParams};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct StatutUpdate {
    pub statut: ConsultationStatut,
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<Consultation> {
    let consultation = state
        .store
        .get_consultation(id)
        .await?
        .ok_or_else(|| ClinicError::NotFound("Consultation non trouvée".to_string()))?;
    Ok(consultation)
}

/// 解析区间参数；结束日期包含当天全部时间，缺省值取自 `fallback`
pub(crate) fn resolve_range(params: &DateRangeParams, fallback: DateRange) -> Result<DateRange> {
    let start = match params.start_date.as_deref() {
        Some(raw) => parse_date("startDate", raw)?,
        None => fallback.start,
    };
    let end = match params.end_date.as_deref() {
        Some(raw) => end_of_day(parse_date("endDate", raw)?),
        None => fallback.end,
    };
    if start > end {
        return Err(ClinicError::Validation("startDate 不能晚于 endDate".to_string()));
    }
    Ok(DateRange::new(start, end))
}

/// 引用的患者与医生必须存在
async fn ensure_references(state: &AppState, consultation: &Consultation) -> ApiResult<()> {
    let (patient, medecin) = tokio::try_join!(
        state.store.get_patient(consultation.patient_id),
        state.store.get_medecin(consultation.medecin_id),
    )?;
    let mut missing = Vec::new();
    if patient.is_none() {
        missing.push(format!("患者不存在: {}", consultation.patient_id));
    }
    if medecin.is_none() {
        missing.push(format!("医生不存在: {}", consultation.medecin_id));
    }
    if !missing.is_empty() {
        return Err(ClinicError::Validation(missing.join("; ")).into());
    }
    Ok(())
}

async fn find_with_names(
    state: &AppState,
    filter: &ConsultationFilter,
) -> ApiResult<Json<Vec<ConsultationWithNames>>> {
    let consultations = state.store.find_consultations(filter).await?;
    Ok(Json(resolve_consultation_names(state.store.as_ref(), consultations).await?))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ConsultationWithNames>>> {
    find_with_names(&state, &ConsultationFilter::default()).await
}

pub async fn by_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ConsultationWithNames>>> {
    let filter = ConsultationFilter {
        patient_id: Some(id),
        ..Default::default()
    };
    find_with_names(&state, &filter).await
}

pub async fn by_medecin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ConsultationWithNames>>> {
    let filter = ConsultationFilter {
        medecin_id: Some(id),
        ..Default::default()
    };
    find_with_names(&state, &filter).await
}

/// 两个参数都必填
pub async fn by_date_range(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> ApiResult<Json<Vec<ConsultationWithNames>>> {
    if params.start_date.is_none() || params.end_date.is_none() {
        return Err(ClinicError::Validation("startDate 与 endDate 为必填参数".to_string()).into());
    }
    let range = resolve_range(&params, default_consultation_range(Utc::now()))?;
    find_with_names(&state, &ConsultationFilter::between(range)).await
}

pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> ApiResult<Json<ConsultationStats>> {
    let now = Utc::now();
    let range = resolve_range(&params, default_consultation_range(now))?;
    Ok(Json(consultation_stats(state.store.as_ref(), now, Some(range)).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Consultation>> {
    Ok(Json(load(&state, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ConsultationInput>,
) -> ApiResult<(StatusCode, Json<Consultation>)> {
    input.check()?;
    let consultation = input.into_consultation(new_id(), Utc::now());
    ensure_references(&state, &consultation).await?;
    state.store.insert_consultation(&consultation).await?;

    info!("Created consultation {} for patient {}", consultation.id, consultation.patient_id);
    Ok((StatusCode::CREATED, Json(consultation)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<Value>,
) -> ApiResult<Json<Consultation>> {
    let existing = load(&state, id).await?;
    let input = merge_patch(&ConsultationInput::from(&existing), patch)?;
    input.check()?;
    let consultation = input.apply_to(&existing, Utc::now());
    ensure_references(&state, &consultation).await?;
    state.store.update_consultation(&consultation).await?;

    info!("Updated consultation {}", id);
    Ok(Json(consultation))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !state.store.delete_consultation(id).await? {
        return Err(ClinicError::NotFound("Consultation non trouvée".to_string()).into());
    }
    info!("Deleted consultation {}", id);
    Ok(deleted("Consultation supprimée avec succès"))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<StatutUpdate>,
) -> ApiResult<Json<Consultation>> {
    let mut consultation = load(&state, id).await?;
    consultation.statut = body.statut;
    consultation.updated_at = Utc::now();
    state.store.update_consultation(&consultation).await?;

    info!("Consultation {} statut -> {}", id, body.statut);
    Ok(Json(consultation))
}
