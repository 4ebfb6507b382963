use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod document;
pub mod storage;

pub use crate::config::AppConfig;
pub use crate::db::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::document::handlers::generate_document,
        crate::document::handlers::preview_document,
        crate::document::handlers::list_placeholders
    ),
    components(
        schemas(
            document::GenerateDocumentRequest,
            document::GeneratedDocument,
            document::PreviewRequest,
            document::PreviewResponse,
            document::ContextRequest,
            document::DocumentType,
            document::LetterheadOption,
            document::RenderedBlock,
            document::BlockKind,
            document::Alignment,
            document::catalog::PlaceholderInfo,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Documents", description = "Template rendering and PDF generation.")
    )
)]
pub struct ApiDoc;

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let app_state = match AppState::new_with_config(&config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise application state. Check DATABASE_URL and that the database is running. Error: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let files_dir = app_state.local_files_dir.clone();
    if let Some(dir) = &files_dir {
        std::fs::create_dir_all(dir)?;
    }

    let prometheus = PrometheusMetricsBuilder::new("estate_docs_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let files_dir = files_dir.clone();
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(web::scope("/api").configure(document::handlers::config))
            .configure(move |cfg| {
                if let Some(dir) = files_dir {
                    cfg.service(actix_files::Files::new("/files", dir));
                }
            })
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
