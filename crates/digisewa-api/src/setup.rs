//! Application wiring: database, storage, ledger, custody service, router.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use digisewa_core::Config;
use digisewa_custody::{AccessGate, CustodyService};
use digisewa_db::{PgAuditLog, PgDocumentRepository};
use digisewa_ledger::{HttpLedgerClient, LedgerAnchor};
use digisewa_storage::create_content_store;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// Room for multipart framing on top of the configured document size cap.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let pool = digisewa_db::connect_and_migrate(&config).await?;
    tracing::info!("Database connected and migrated");

    let records = Arc::new(PgDocumentRepository::new(pool.clone()));
    let audit = Arc::new(PgAuditLog::new(pool));

    let store = create_content_store(&config).await?;
    tracing::info!(backend = %config.storage_backend(), "Content store ready");

    let ledger: Option<Arc<dyn LedgerAnchor>> = match config.ledger_settings() {
        Some(settings) => {
            let client = HttpLedgerClient::new(settings)
                .map_err(|e| anyhow::anyhow!("Failed to build ledger client: {}", e))?;
            tracing::info!("Ledger anchoring enabled");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("Ledger anchoring not configured; documents will not be anchored");
            None
        }
    };

    let custody = Arc::new(CustodyService::new(
        records,
        store,
        ledger,
        AccessGate::new(audit),
        config.departments().to_vec(),
        config.max_document_size_bytes(),
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        custody,
    });

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let router = Router::new()
        .route(
            "/api/v0/documents",
            post(handlers::document_upload::upload_document),
        )
        .route(
            "/api/v0/documents/shared",
            get(handlers::document_download::download_shared_document),
        )
        .route(
            "/api/v0/documents/{id}",
            get(handlers::document_get::get_document),
        )
        .route(
            "/api/v0/documents/{id}/content",
            get(handlers::document_download::download_document),
        )
        .route(
            "/api/v0/documents/{id}/status",
            patch(handlers::document_status::set_document_status),
        )
        .route(
            "/api/v0/documents/{id}/grants",
            post(handlers::document_grants::grant_department_access),
        )
        .route(
            "/api/v0/documents/{id}/application",
            post(handlers::document_grants::attach_application),
        )
        .route(
            "/api/v0/documents/{id}/anchor",
            get(handlers::document_anchor::get_document_anchor),
        )
        .route("/api/v0/openapi.json", get(openapi_json))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(
            config.max_document_size_bytes() + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state.clone());

    Ok((state, router))
}

async fn health() -> &'static str {
    "ok"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub async fn start_server(config: &Config, router: Router) -> Result<(), anyhow::Error> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "DigiSewa custody API listening");
    axum::serve(listener, router).await?;
    Ok(())
}
