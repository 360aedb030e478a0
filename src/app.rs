use axum::{
    Json, Router,
    extract::{Multipart, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::downloader::{self, XLSX_CONTENT_TYPE};
use crate::graph::{self, GraphOptions};
use crate::hierarchy::{self, Figure};
use crate::ingest::{DatasetOrigin, IngestError, Ingested, Pipeline, Source};
use crate::loader::DataUrl;
use crate::saving::{FileStore, NoStore, UploadStore};
use crate::DEFAULT_DATASET;

pub struct AppState {
    pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// State for a configured deployment: file-backed slot when uploads persist, bundled
    /// default dataset always.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn UploadStore> = if config.persist_uploads {
            Arc::new(FileStore::new(&config.upload_path))
        } else {
            Arc::new(NoStore)
        };
        Self::new(Pipeline::new(store, Some(DEFAULT_DATASET.to_vec())))
    }
}

#[derive(Deserialize)]
struct FigureRequest {
    #[serde(default)]
    contents: Option<String>,
}

#[derive(Serialize)]
struct FigureResponse {
    status: String,
    message: Option<String>,
    prompt: Option<String>,
    origin: Option<DatasetOrigin>,
    figure: Option<Figure>,
    download_href: String,
}

impl FigureResponse {
    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
            prompt: None,
            origin: None,
            figure: None,
            download_href: String::new(),
        }
    }
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    config.bootstrap()?;

    let app_state = Arc::new(AppState::from_config(&config));
    let app = router(app_state);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_landing))
        .route("/api/figure", post(make_figure))
        .route("/api/upload", post(upload_file))
        .route("/api/default.xlsx", get(download_default))
        .route("/api/sunburst.png", get(sunburst_png))
        .nest_service("/assets", ServeDir::new("assets"))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    log::info!("{} {} -> {}", method, path, response.status().as_u16());
    response
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn make_figure(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FigureRequest>,
) -> Response {
    let source = match payload.contents.filter(|c| !c.trim().is_empty()) {
        Some(contents) => match DataUrl::parse(&contents) {
            Ok(upload) => Source::Upload(upload),
            Err(e) => return ingest_error(e),
        },
        None => Source::Stored,
    };

    respond(&state.pipeline, source)
}

async fn upload_file(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(FigureResponse::error(format!("Invalid upload: {}", e))),
                )
                    .into_response();
            }
        };

        if field.name() == Some("file") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            match field.bytes().await {
                Ok(bytes) => {
                    upload = Some(DataUrl {
                        content_type,
                        bytes: bytes.to_vec(),
                    })
                }
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(FigureResponse::error(format!("Invalid upload: {}", e))),
                    )
                        .into_response();
                }
            }
        }
    }

    match upload {
        Some(upload) if !upload.bytes.is_empty() => respond(&state.pipeline, Source::Upload(upload)),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(FigureResponse::error("No file data received".to_string())),
        )
            .into_response(),
    }
}

async fn download_default(State(state): State<Arc<AppState>>) -> Response {
    let rows = match state.pipeline.ingest(Source::Default) {
        Ok(ingested) => ingested.rows,
        Err(e) => return ingest_error(e),
    };

    match downloader::to_xlsx(&rows) {
        Ok(buffer) => (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"default_data.xlsx\"",
                ),
            ],
            buffer,
        )
            .into_response(),
        Err(e) => internal_error(e.to_string()),
    }
}

async fn sunburst_png(State(state): State<Arc<AppState>>) -> Response {
    let rows = match state.pipeline.ingest(Source::Stored) {
        Ok(ingested) => ingested.rows,
        Err(e) => return ingest_error(e),
    };

    match graph::render_sunburst_png(&rows, &GraphOptions::default()) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => internal_error(e.to_string()),
    }
}

fn respond(pipeline: &Pipeline, source: Source) -> Response {
    match pipeline.ingest(source) {
        Ok(ingested) => figure_response(ingested),
        Err(e) => ingest_error(e),
    }
}

fn figure_response(ingested: Ingested) -> Response {
    let nodes = hierarchy::build(&ingested.rows);

    // The download link only accompanies the default chart
    let download_href = if ingested.origin == DatasetOrigin::Default {
        match downloader::to_xlsx(&ingested.rows) {
            Ok(xlsx) => downloader::to_data_url(XLSX_CONTENT_TYPE, &xlsx),
            Err(e) => {
                log::warn!("failed to build default data download: {}", e);
                String::new()
            }
        }
    } else {
        String::new()
    };

    Json(FigureResponse {
        status: "ok".to_string(),
        message: None,
        prompt: ingested.prompt().map(str::to_string),
        origin: Some(ingested.origin),
        figure: Some(Figure::sunburst(&nodes)),
        download_href,
    })
    .into_response()
}

fn ingest_error(e: IngestError) -> Response {
    log::warn!("rejected spreadsheet: {}", e);
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(FigureResponse::error(e.to_string())),
    )
        .into_response()
}

fn internal_error(message: String) -> Response {
    log::error!("{}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FigureResponse::error(message)),
    )
        .into_response()
}
