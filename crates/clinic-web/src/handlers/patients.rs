//! 患者接口

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use clinic_core::store::PatientFilter;
use clinic_core::utils::new_id;
use clinic_core::{merge_patch, ClinicError, DiabetesType, Patient, PatientInput, PatientStatut, Validate};
use clinic_stats::entity_stats::{patient_stats, PatientStats};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{deleted, parse_label, required_search, SearchParams};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct StatutUpdate {
    pub statut: PatientStatut,
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<Patient> {
    let patient = state
        .store
        .get_patient(id)
        .await?
        .ok_or_else(|| ClinicError::NotFound("Patient non trouvé".to_string()))?;
    Ok(patient)
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Patient>>> {
    let patients = state.store.find_patients(&PatientFilter::default()).await?;
    Ok(Json(patients))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Patient>>> {
    let filter = PatientFilter {
        search: Some(required_search(params)?),
        ..Default::default()
    };
    Ok(Json(state.store.find_patients(&filter).await?))
}

pub async fn by_diabetes_type(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Vec<Patient>>> {
    let filter = PatientFilter {
        diabete: Some(parse_label::<DiabetesType>(&kind)?),
        ..Default::default()
    };
    Ok(Json(state.store.find_patients(&filter).await?))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<PatientStats>> {
    let stats = patient_stats(state.store.as_ref(), Utc::now()).await?;
    Ok(Json(stats))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Patient>> {
    Ok(Json(load(&state, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PatientInput>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    input.check()?;
    let patient = input.into_patient(new_id(), Utc::now());
    state.store.insert_patient(&patient).await?;

    info!("Created patient {} ({})", patient.id, patient.nom_complet());
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<Value>,
) -> ApiResult<Json<Patient>> {
    let existing = load(&state, id).await?;
    let input = merge_patch(&PatientInput::from(&existing), patch)?;
    input.check()?;
    let patient = input.apply_to(&existing, Utc::now());
    state.store.update_patient(&patient).await?;

    info!("Updated patient {}", id);
    Ok(Json(patient))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !state.store.delete_patient(id).await? {
        return Err(ClinicError::NotFound("Patient non trouvé".to_string()).into());
    }
    info!("Deleted patient {}", id);
    Ok(deleted("Patient supprimé avec succès"))
}

/// 修改状态并追加一条当前时间的历史记录
pub async fn update_statut(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<StatutUpdate>,
) -> ApiResult<Json<Patient>> {
    let mut patient = load(&state, id).await?;
    patient.change_statut(body.statut, Utc::now());
    state.store.update_patient(&patient).await?;

    info!("Patient {} statut -> {}", id, body.statut);
    Ok(Json(patient))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use clinic_core::MemoryStore;
    use serde_json::json;

    use crate::handlers::testing::{app, send};

    fn patient_body(nom: &str) -> serde_json::Value {
        json!({
            "nom": nom,
            "prenom": "Yacine",
            "age": 58,
            "sexe": "Homme",
            "diabete": "Type 2",
            "email": format!("{}@mail.dz", nom.to_lowercase())
        })
    }

    #[tokio::test]
    async fn test_patient_crud_and_statut_history() {
        let app = app(Arc::new(MemoryStore::new()));

        let (status, created) = send(&app, "POST", "/api/patients", Some(patient_body("Saidi"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["statut"], "nouveau");

        let (status, patched) = send(
            &app,
            "PATCH",
            &format!("/api/patients/{}/statut", id),
            Some(json!({ "statut": "sous_trt" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["statut"], "sous_trt");
        assert_eq!(patched["statutHistory"].as_array().unwrap().len(), 1);

        let (status, listed) = send(&app, "GET", "/api/patients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "DELETE", &format!("/api/patients/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "GET", &format!("/api/patients/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_patient_validation_and_search() {
        let app = app(Arc::new(MemoryStore::new()));

        let mut invalid = patient_body("Saidi");
        invalid["age"] = json!(0);
        let (status, body) = send(&app, "POST", "/api/patients", Some(invalid)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"].as_array().is_some());

        send(&app, "POST", "/api/patients", Some(patient_body("Saidi"))).await;
        send(&app, "POST", "/api/patients", Some(patient_body("Mansouri"))).await;

        let (status, found) = send(&app, "GET", "/api/patients/search?query=SAID", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", "/api/patients/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, typed) = send(&app, "GET", "/api/patients/diabetes/Type%202", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(typed.as_array().unwrap().len(), 2);

        let (status, stats) = send(&app, "GET", "/api/patients/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalPatients"], 2);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_unsent_fields() {
        let app = app(Arc::new(MemoryStore::new()));

        let mut body = patient_body("Saidi");
        body["diagnostic"] = json!({ "typeOperation": "Chopart" });
        let (_, created) = send(&app, "POST", "/api/patients", Some(body)).await;
        let uri = format!("/api/patients/{}", created["id"].as_str().unwrap());

        send(
            &app,
            "PATCH",
            &format!("{}/statut", uri),
            Some(json!({ "statut": "apres_trt" })),
        )
        .await;

        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({ "nom": "Saidi", "prenom": "Yacine", "age": 59, "sexe": "Homme" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["age"], 59);
        assert_eq!(updated["statut"], "apres_trt");
        assert_eq!(updated["diabete"], "Type 2");
        assert_eq!(updated["diagnostic"]["typeOperation"], "Chopart");
        assert_eq!(updated["statutHistory"].as_array().unwrap().len(), 1);
        assert_eq!(updated["createdAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_validation_errors() {
        let app = app(Arc::new(MemoryStore::new()));

        let mut bad_label = patient_body("Saidi");
        bad_label["sexe"] = json!("X");
        let (status, body) = send(&app, "POST", "/api/patients", Some(bad_label)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["status"], 400);
        assert!(!body["errors"].as_array().unwrap().is_empty());

        let (_, created) = send(&app, "POST", "/api/patients", Some(patient_body("Saidi"))).await;
        let uri = format!("/api/patients/{}", created["id"].as_str().unwrap());

        let (status, body) = send(&app, "PUT", &uri, Some(json!({ "diabete": "Type 3" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);

        let (status, _) = send(&app, "PUT", &uri, Some(json!(["age", 40]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("{}/statut", uri),
            Some(json!({ "statut": "gueri" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }
}
