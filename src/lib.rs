pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::dicom_service::{DicomService, UPLOADS_ROUTE};
use crate::services::enhancer::Enhancer;
use crate::services::record_store::{InMemoryRecordStore, RecordStore};
use crate::services::storage::StorageService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::upload::upload_file,
        api::handlers::files::info::get_file_info,
        api::handlers::files::info::list_files,
        api::handlers::files::process::process_file,
        api::handlers::files::download::download_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::files::UploadForm,
            api::handlers::files::UploadResponse,
            api::handlers::files::FileInfoResponse,
            api::handlers::files::FileListResponse,
            api::handlers::files::ProcessResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "files", description = "DICOM upload, processing and download endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub storage: Arc<dyn StorageService>,
    pub dicom_service: Arc<DicomService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordStore>,
        storage: Arc<dyn StorageService>,
        enhancer: Arc<dyn Enhancer>,
        config: AppConfig,
    ) -> Self {
        let dicom_service = Arc::new(DicomService::new(
            records.clone(),
            storage.clone(),
            enhancer,
            config.clone(),
        ));

        Self {
            records,
            storage,
            dicom_service,
            config,
        }
    }

    /// Wires the default stack: uploads directory, in-memory records, simulated enhancer.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let storage = infrastructure::storage::setup_storage(&config).await?;
        let enhancer = infrastructure::enhancer::setup_enhancer(&config);
        let records: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());

        Ok(Self::new(records, storage, enhancer, config))
    }
}

pub fn create_app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.storage.root());

    // Sits inside the request-id layer so every span carries the final id
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get(&api::middleware::request_id::REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            tracing::info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                tracing::info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(api::handlers::health::health_check))
        .route("/api/upload", post(api::handlers::files::upload_file))
        .route("/api/files", get(api::handlers::files::list_files))
        .route("/api/file/:id", get(api::handlers::files::get_file_info))
        .route(
            "/api/process/:file_id",
            post(api::handlers::files::process_file),
        )
        .route(
            "/api/download/:id",
            get(api::handlers::files::download_file),
        )
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(api::middleware::cors::cors_layer())
        .layer(trace_layer)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
