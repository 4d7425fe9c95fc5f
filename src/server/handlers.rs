//! HTTP request handlers for the web server.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::batch::{BatchError, BatchExecutor, BatchRequest};
use crate::context::{InputFormat, OutputFormat};
use crate::pipeline::{JobError, ProcessorKind};

/// Body shared by the annotate and export endpoints.
#[derive(Debug, Deserialize)]
pub struct DocumentBody {
    pub text: String,
    #[serde(default)]
    pub groups: Option<HashMap<String, bool>>,
    #[serde(default)]
    pub input_format: InputFormat,
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default)]
    pub processor: ProcessorKind,
}

impl DocumentBody {
    fn into_request(self, output_format: Option<OutputFormat>) -> BatchRequest {
        BatchRequest {
            text: self.text,
            groups: self.groups,
            input_format: self.input_format,
            output_format,
            extra_parameters: self.params,
        }
    }
}

/// Service status.
pub async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    let dictionaries = state.context.dictionaries();
    Json(serde_json::json!({
        "status": "ok",
        "dictionaries": dictionaries.exact.len(),
        "regex_dictionaries": dictionaries.regex.len(),
        "output_formats": state.context.configuration().output_formats(),
    }))
}

/// Annotate a document and return its corpus.
pub async fn api_annotate(
    State(state): State<AppState>,
    Json(body): Json<DocumentBody>,
) -> Response {
    let kind = body.processor;
    let mut executor = BatchExecutor::new(
        state.service.clone(),
        state.pool.clone(),
        body.into_request(None),
    );

    if let Err(e) = executor.run(kind, &state.context).await {
        return error_response(e);
    }

    match executor.processed_corpora().into_iter().next() {
        Some(corpus) => Json(corpus).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "No corpus produced").into_response(),
    }
}

/// Annotate a document and return it in `format`.
pub async fn api_export(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Json(body): Json<DocumentBody>,
) -> Response {
    let format: OutputFormat = match format.parse() {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let kind = body.processor;
    let mut executor = BatchExecutor::new(
        state.service.clone(),
        state.pool.clone(),
        body.into_request(Some(format)),
    );

    if let Err(e) = executor.run(kind, &state.context).await {
        return error_response(e);
    }

    let text = executor.annotated_text().unwrap_or_default().to_string();
    ([(header::CONTENT_TYPE, format.content_type())], text).into_response()
}

fn error_response(error: BatchError) -> Response {
    let status = match &error {
        BatchError::Configuration(_)
        | BatchError::MissingSink(_)
        | BatchError::Construction(JobError::XmlTagsWithoutXml(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    } else {
        tracing::debug!("Rejected request: {}", error);
    }

    (
        status,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}
