//! HTTP request handlers for API endpoints

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{error, info, warn};

use crate::{ApiState, ErrorResponse, HealthResponse};
use adlens_orchestrator::MediaUpload;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Analyze an uploaded media file
///
/// Accepts a multipart form carrying a single media file; the field's
/// declared content type selects the video or image pipeline. The
/// browser-era client posts the field under the name `video` for both
/// kinds, so any field carrying a file is accepted.
pub async fn analyze_media(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let upload = read_media_field(&mut multipart).await?;

    info!(
        file = %upload.file_name,
        content_type = %upload.content_type,
        size = upload.bytes.len(),
        "Analysis request"
    );

    match state.pipeline.run(upload).await {
        Ok(output) => {
            if let Some(diagnostic) = &output.enrichment_error {
                warn!("Returning result without ad copy enrichment: {diagnostic}");
            }
            Ok(Json(output.analysis))
        }
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error!("Analysis request failed: {e}");
            Err((
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Pull the first file-carrying field out of the multipart payload
async fn read_media_field(
    multipart: &mut Multipart,
) -> Result<MediaUpload, (StatusCode, Json<ErrorResponse>)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(reject("No media file provided")),
            Err(e) => return Err(reject(&format!("Malformed multipart payload: {e}"))),
        };

        // Skip plain form values; the media arrives as a file part
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .map(ToString::to_string)
            .unwrap_or_default();

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(reject(&format!("Failed to read upload: {e}"))),
        };

        return Ok(MediaUpload {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        });
    }
}

fn reject(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}
