//! 预约接口

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use clinic_core::store::{resolve_person_names, DateRange, RendezVousFilter};
use clinic_core::utils::{end_of_day, new_id, start_of_day};
use clinic_core::{merge_patch, ClinicError, RendezVous, RendezVousInput, RendezVousStatut, Validate};
use clinic_stats::entity_stats::{rendez_vous_stats, RendezVousStats};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{deleted, parse_date};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::server::AppState;

/// 即将到来的预约最多返回的条数
pub const UPCOMING_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct StatutUpdate {
    pub statut: RendezVousStatut,
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<RendezVous> {
    let rdv = state
        .store
        .get_rendez_vous(id)
        .await?
        .ok_or_else(|| ClinicError::NotFound("Rendez-vous non trouvé".to_string()))?;
    Ok(rdv)
}

/// 查询并补全患者、医生显示名
async fn find_resolved(state: &AppState, filter: &RendezVousFilter) -> ApiResult<Json<Vec<RendezVous>>> {
    let mut rendez_vous = state.store.find_rendez_vous(filter).await?;
    resolve_person_names(state.store.as_ref(), &mut rendez_vous).await?;
    Ok(Json(rendez_vous))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<RendezVous>>> {
    find_resolved(&state, &RendezVousFilter::default()).await
}

pub async fn by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Json<Vec<RendezVous>>> {
    let day = parse_date("date", &date)?;
    let filter = RendezVousFilter::between(DateRange::new(start_of_day(day), end_of_day(day)));
    let Json(mut rendez_vous) = find_resolved(&state, &filter).await?;
    // 当天内只按时刻排序
    rendez_vous.sort_by(|a, b| a.heure.cmp(&b.heure));
    Ok(Json(rendez_vous))
}

pub async fn by_medecin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<RendezVous>>> {
    let filter = RendezVousFilter {
        medecin_id: Some(id),
        ..Default::default()
    };
    find_resolved(&state, &filter).await
}

pub async fn by_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<RendezVous>>> {
    let filter = RendezVousFilter {
        patient_id: Some(id),
        ..Default::default()
    };
    find_resolved(&state, &filter).await
}

/// 今天零点起、已确认或待确认的预约
pub async fn upcoming(State(state): State<AppState>) -> ApiResult<Json<Vec<RendezVous>>> {
    let filter = RendezVousFilter {
        date_from: Some(start_of_day(Utc::now())),
        ..Default::default()
    }
    .with_statuts(&RendezVousStatut::OPEN)
    .with_limit(UPCOMING_LIMIT);
    find_resolved(&state, &filter).await
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<RendezVousStats>> {
    Ok(Json(rendez_vous_stats(state.store.as_ref(), Utc::now()).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RendezVous>> {
    let mut rdv = load(&state, id).await?;
    resolve_person_names(state.store.as_ref(), std::slice::from_mut(&mut rdv)).await?;
    Ok(Json(rdv))
}

/// 同一医生同一天同一时刻只允许一个预约
async fn ensure_slot_free(state: &AppState, rdv: &RendezVous) -> ApiResult<()> {
    let filter = RendezVousFilter {
        heure: Some(rdv.heure.clone()),
        ..RendezVousFilter::between(DateRange::new(start_of_day(rdv.date), end_of_day(rdv.date)))
    };
    let same_slot = state.store.find_rendez_vous(&filter).await?;
    if same_slot
        .iter()
        .any(|other| other.id != rdv.id && other.occupies_slot(&rdv.medecin, rdv.date, &rdv.heure))
    {
        warn!(
            "Slot conflict for medecin {:?} on {} at {}",
            rdv.medecin,
            rdv.date.date_naive(),
            rdv.heure
        );
        return Err(ClinicError::Conflict(
            "Conflit d'horaire: ce médecin a déjà un rendez-vous prévu à cette date et heure".to_string(),
        )
        .into());
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RendezVousInput>,
) -> ApiResult<(StatusCode, Json<RendezVous>)> {
    input.check()?;
    let rdv = input.into_rendez_vous(new_id(), Utc::now());
    ensure_slot_free(&state, &rdv).await?;
    state.store.insert_rendez_vous(&rdv).await?;

    info!("Created rendez-vous {}", rdv.id);
    Ok((StatusCode::CREATED, Json(rdv)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<Value>,
) -> ApiResult<Json<RendezVous>> {
    let existing = load(&state, id).await?;
    let input = merge_patch(&RendezVousInput::from(&existing), patch)?;
    input.check()?;
    let rdv = input.apply_to(&existing, Utc::now());
    state.store.update_rendez_vous(&rdv).await?;

    info!("Updated rendez-vous {}", id);
    Ok(Json(rdv))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !state.store.delete_rendez_vous(id).await? {
        return Err(ClinicError::NotFound("Rendez-vous non trouvé".to_string()).into());
    }
    info!("Deleted rendez-vous {}", id);
    Ok(deleted("Rendez-vous supprimé avec succès"))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<StatutUpdate>,
) -> ApiResult<Json<RendezVous>> {
    let mut rdv = load(&state, id).await?;
    rdv.statut = body.statut;
    rdv.updated_at = Utc::now();
    state.store.update_rendez_vous(&rdv).await?;

    info!("Rendez-vous {} statut -> {}", id, body.statut);
    Ok(Json(rdv))
}
