//! Web服务器

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};
use clinic_core::{RecordStore, Result};
use clinic_stats::DashboardOptions;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{consultations, medecins, patients, rendez_vous, stats, api_root, health};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub dashboard: DashboardOptions,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, dashboard: DashboardOptions) -> Self {
        Self { store, dashboard }
    }
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            app: create_app(state),
        }
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}

/// 组装完整路由
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .with_state(state)
        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .route("/health", get(health))
        .nest("/patients", patient_routes())
        .nest("/medecins", medecin_routes())
        .nest("/rendez-vous", rendez_vous_routes())
        .nest("/consultations", consultation_routes())
        .nest("/stats", stats_routes())
}

fn patient_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(patients::list).post(patients::create))
        .route("/search", get(patients::search))
        .route("/diabetes/:type", get(patients::by_diabetes_type))
        .route("/stats", get(patients::stats))
        .route(
            "/:id",
            get(patients::get_one).put(patients::update).delete(patients::remove),
        )
        .route("/:id/statut", patch(patients::update_statut))
}

fn medecin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(medecins::list).post(medecins::create))
        .route("/search", get(medecins::search))
        .route("/speciality/:specialite", get(medecins::by_speciality))
        .route("/status/:status", get(medecins::by_status))
        .route("/stats", get(medecins::stats))
        .route(
            "/:id",
            get(medecins::get_one).put(medecins::update).delete(medecins::remove),
        )
        .route("/:id/status", patch(medecins::update_status))
}

fn rendez_vous_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(rendez_vous::list).post(rendez_vous::create))
        .route("/date/:date", get(rendez_vous::by_date))
        .route("/medecin/:id", get(rendez_vous::by_medecin))
        .route("/patient/:id", get(rendez_vous::by_patient))
        .route("/upcoming", get(rendez_vous::upcoming))
        .route("/stats", get(rendez_vous::stats))
        .route(
            "/:id",
            get(rendez_vous::get_one)
                .put(rendez_vous::update)
                .delete(rendez_vous::remove),
        )
        .route("/:id/status", patch(rendez_vous::update_status))
}

fn consultation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(consultations::list).post(consultations::create))
        .route("/patient/:id", get(consultations::by_patient))
        .route("/medecin/:id", get(consultations::by_medecin))
        .route("/date-range", get(consultations::by_date_range))
        .route("/stats", get(consultations::stats))
        .route(
            "/:id",
            get(consultations::get_one)
                .put(consultations::update)
                .delete(consultations::remove),
        )
        .route("/:id/status", patch(consultations::update_status))
}

fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(stats::dashboard))
        .route("/patients", get(stats::patients))
        .route("/medecins", get(stats::medecins))
        .route("/rendez-vous", get(stats::rendez_vous))
        .route("/consultations", get(stats::consultations))
}
