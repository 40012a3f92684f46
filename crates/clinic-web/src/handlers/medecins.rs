//! 医生接口

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use clinic_core::store::MedecinFilter;
use clinic_core::utils::new_id;
use clinic_core::{merge_patch, ClinicError, Medecin, MedecinInput, MedecinStatus, Specialite, Validate};
use clinic_stats::entity_stats::{medecin_stats, MedecinStats};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{deleted, parse_label, required_search, SearchParams};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: MedecinStatus,
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<Medecin> {
    let medecin = state
        .store
        .get_medecin(id)
        .await?
        .ok_or_else(|| ClinicError::NotFound("Médecin non trouvé".to_string()))?;
    Ok(medecin)
}

/// 邮箱已被其他医生占用时返回冲突
async fn ensure_email_free(state: &AppState, email: &str, own_id: Option<Uuid>) -> ApiResult<()> {
    let holders = state
        .store
        .find_medecins(&MedecinFilter::with_email(email))
        .await?;
    if holders.iter().any(|holder| Some(holder.id) != own_id) {
        warn!("Rejected duplicate medecin email {}", email);
        return Err(ClinicError::Conflict(format!("邮箱已被使用: {}", email.trim())).into());
    }
    Ok(())
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Medecin>>> {
    Ok(Json(state.store.find_medecins(&MedecinFilter::default()).await?))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Medecin>>> {
    let filter = MedecinFilter {
        search: Some(required_search(params)?),
        ..Default::default()
    };
    Ok(Json(state.store.find_medecins(&filter).await?))
}

pub async fn by_speciality(
    State(state): State<AppState>,
    Path(specialite): Path<String>,
) -> ApiResult<Json<Vec<Medecin>>> {
    let filter = MedecinFilter {
        specialite: Some(parse_label::<Specialite>(&specialite)?),
        ..Default::default()
    };
    Ok(Json(state.store.find_medecins(&filter).await?))
}

pub async fn by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> ApiResult<Json<Vec<Medecin>>> {
    let filter = MedecinFilter::with_status(parse_label(&status)?);
    Ok(Json(state.store.find_medecins(&filter).await?))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<MedecinStats>> {
    Ok(Json(medecin_stats(state.store.as_ref()).await?))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Medecin>> {
    Ok(Json(load(&state, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MedecinInput>,
) -> ApiResult<(StatusCode, Json<Medecin>)> {
    input.check()?;
    ensure_email_free(&state, &input.email, None).await?;

    let medecin = input.into_medecin(new_id(), Utc::now());
    state.store.insert_medecin(&medecin).await?;

    info!("Created medecin {} ({})", medecin.id, medecin.specialite);
    Ok((StatusCode::CREATED, Json(medecin)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<Value>,
) -> ApiResult<Json<Medecin>> {
    let existing = load(&state, id).await?;
    let input = merge_patch(&MedecinInput::from(&existing), patch)?;
    input.check()?;
    ensure_email_free(&state, &input.email, Some(id)).await?;

    let medecin = input.apply_to(&existing, Utc::now());
    state.store.update_medecin(&medecin).await?;

    info!("Updated medecin {}", id);
    Ok(Json(medecin))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !state.store.delete_medecin(id).await? {
        return Err(ClinicError::NotFound("Médecin non trouvé".to_string()).into());
    }
    info!("Deleted medecin {}", id);
    Ok(deleted("Médecin supprimé avec succès"))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> ApiResult<Json<Medecin>> {
    let mut medecin = load(&state, id).await?;
    medecin.change_status(body.status, Utc::now());
    state.store.update_medecin(&medecin).await?;

    info!("Medecin {} status -> {}", id, body.status);
    Ok(Json(medecin))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use clinic_core::MemoryStore;
    use serde_json::json;

    use crate::handlers::testing::{app, send};

    fn medecin_body(nom: &str, email: &str) -> serde_json::Value {
        json!({
            "nom": nom,
            "prenom": "Karim",
            "specialite": "Diabétologue",
            "email": email,
            "telephone": "0550 12 34 56"
        })
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let app = app(Arc::new(MemoryStore::new()));

        let (status, _) = send(&app, "POST", "/api/medecins", Some(medecin_body("Benali", "k.benali@clinique.dz"))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "POST", "/api/medecins", Some(medecin_body("Other", "K.Benali@clinique.dz"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], 409);
    }

    #[tokio::test]
    async fn test_status_patch_and_filters() {
        let app = app(Arc::new(MemoryStore::new()));

        let (_, created) = send(&app, "POST", "/api/medecins", Some(medecin_body("Benali", "benali@clinique.dz"))).await;
        send(&app, "POST", "/api/medecins", Some(medecin_body("Haddad", "haddad@clinique.dz"))).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, patched) = send(
            &app,
            "PATCH",
            &format!("/api/medecins/{}/status", id),
            Some(json!({ "status": "En congé" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["statusHistory"].as_array().unwrap().len(), 1);

        let (_, on_duty) = send(&app, "GET", "/api/medecins/status/En%20service", None).await;
        assert_eq!(on_duty.as_array().unwrap().len(), 1);

        let (_, diabetologues) = send(&app, "GET", "/api/medecins/speciality/Diab%C3%A9tologue", None).await;
        assert_eq!(diabetologues.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, "GET", "/api/medecins/status/Absent", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, stats) = send(&app, "GET", "/api/medecins/stats", None).await;
        assert_eq!(stats["totalMedecins"], 2);
        assert_eq!(stats["availableMedecins"], 1);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_status() {
        let app = app(Arc::new(MemoryStore::new()));

        let (_, created) = send(&app, "POST", "/api/medecins", Some(medecin_body("Benali", "benali@clinique.dz"))).await;
        send(&app, "POST", "/api/medecins", Some(medecin_body("Haddad", "haddad@clinique.dz"))).await;
        let uri = format!("/api/medecins/{}", created["id"].as_str().unwrap());
        send(&app, "PATCH", &format!("{}/status", uri), Some(json!({ "status": "En formation" }))).await;

        let (status, updated) = send(&app, "PUT", &uri, Some(json!({ "telephone": "0661 00 00 00" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["telephone"], "0661 00 00 00");
        assert_eq!(updated["status"], "En formation");
        assert_eq!(updated["specialite"], "Diabétologue");
        assert_eq!(updated["email"], "benali@clinique.dz");

        let (status, _) = send(&app, "PUT", &uri, Some(json!({ "email": "haddad@clinique.dz" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
