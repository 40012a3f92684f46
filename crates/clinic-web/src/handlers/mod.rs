//! HTTP处理器

pub mod consultations;
pub mod medecins;
pub mod patients;
pub mod rendez_vous;
pub mod stats;

use std::str::FromStr;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use clinic_core::utils::parse_flexible_datetime;
use clinic_core::{ClinicError, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::server::AppState;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Clinic API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/api/health",
            "patients": "/api/patients",
            "medecins": "/api/medecins",
            "rendezVous": "/api/rendez-vous",
            "consultations": "/api/consultations",
            "stats": "/api/stats/dashboard"
        }
    }))
}

/// 健康检查处理器（含存储连通性）
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.store.ping().await?;
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// `?query=` 搜索参数
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// `?startDate=&endDate=` 日期区间参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// 路径中的法语标签，例如 `/medecins/status/En%20service`
pub(crate) fn parse_label<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = ClinicError>,
{
    raw.trim().parse()
}

pub(crate) fn parse_date(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    parse_flexible_datetime(raw)
        .ok_or_else(|| ClinicError::Validation(format!("{} 日期格式无效: '{}'", field, raw)))
}

pub(crate) fn required_search(params: SearchParams) -> Result<String> {
    clinic_core::store::normalize_search(params.query.as_deref())
        .ok_or_else(|| ClinicError::Validation("Query parameter is required".to_string()))
}

pub(crate) fn deleted(message: &str) -> Json<Value> {
    Json(json!({ "message": message }))
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use clinic_core::MemoryStore;

    use super::testing::{app, send};
    use super::*;

    #[tokio::test]
    async fn test_root_and_health() {
        let app = app(Arc::new(MemoryStore::new()));

        let (status, body) = send(&app, "GET", "/api", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");

        let (status, body) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_date("date", "2024-05-15").is_ok());
        assert!(matches!(
            parse_date("date", "demain"),
            Err(ClinicError::Validation(_))
        ));
        assert!(matches!(
            required_search(SearchParams { query: Some("   ".into()) }),
            Err(ClinicError::Validation(_))
        ));
    }
}
