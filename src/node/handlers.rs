use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use super::protocol::{
    AcquireRequest, AcquireResponse, DownloadResponse, ReleaseRequest, ReleaseResponse,
    UploadRequest, UploadResponse,
};
use super::service::NodeService;
use super::types::{GrantDecision, UploadVerdict};

pub async fn handle_acquire_mutex(
    Extension(service): Extension<Arc<NodeService>>,
    Json(req): Json<AcquireRequest>,
) -> (StatusCode, Json<AcquireResponse>) {
    match service.acquire_for(req.requester_id).await {
        GrantDecision::Granted => (
            StatusCode::OK,
            Json(AcquireResponse {
                granted: true,
                error: None,
            }),
        ),
        GrantDecision::Denied(reason) => (
            StatusCode::OK,
            Json(AcquireResponse {
                granted: false,
                error: Some(reason.to_string()),
            }),
        ),
    }
}

pub async fn handle_release_mutex(
    Extension(service): Extension<Arc<NodeService>>,
    Json(req): Json<ReleaseRequest>,
) -> (StatusCode, Json<ReleaseResponse>) {
    let ack = service.release_for(req.requester_id).await;
    (StatusCode::OK, Json(ReleaseResponse { ack }))
}

pub async fn handle_upload(
    Extension(service): Extension<Arc<NodeService>>,
    Json(req): Json<UploadRequest>,
) -> (StatusCode, Json<UploadResponse>) {
    match service.upload(&req.filename, &req.payload) {
        UploadVerdict::Stored { .. } => (
            StatusCode::OK,
            Json(UploadResponse {
                success: true,
                error: None,
            }),
        ),
        UploadVerdict::Rejected(reason) => (
            StatusCode::OK,
            Json(UploadResponse {
                success: false,
                error: Some(reason.to_string()),
            }),
        ),
        UploadVerdict::NotHolding => (
            StatusCode::CONFLICT,
            Json(UploadResponse {
                success: false,
                error: Some("critical section not held".to_string()),
            }),
        ),
        UploadVerdict::StorageFailed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UploadResponse {
                success: false,
                error: Some("storage failure".to_string()),
            }),
        ),
    }
}

pub async fn handle_download(
    Path(filename): Path<String>,
    Extension(service): Extension<Arc<NodeService>>,
) -> (StatusCode, Json<DownloadResponse>) {
    match service.download(&filename) {
        Ok(Some(payload)) => (
            StatusCode::OK,
            Json(DownloadResponse {
                found: true,
                payload,
            }),
        ),
        Ok(None) => (
            StatusCode::OK,
            Json(DownloadResponse {
                found: false,
                payload: Vec::new(),
            }),
        ),
        Err(err) => {
            tracing::error!("Failed to read {}: {:#}", filename, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DownloadResponse {
                    found: false,
                    payload: Vec::new(),
                }),
            )
        }
    }
}
