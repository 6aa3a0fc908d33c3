use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;

use super::coordinator::DistributedMutex;
use super::protocol::MessageAck;
use super::types::{LockReply, LockRequest};

pub async fn handle_mutex_request(
    Extension(mutex): Extension<Arc<DistributedMutex>>,
    Json(req): Json<LockRequest>,
) -> (StatusCode, Json<MessageAck>) {
    mutex.handle_request(req).await;
    (StatusCode::OK, Json(MessageAck { ack_received: true }))
}

pub async fn handle_mutex_reply(
    Extension(mutex): Extension<Arc<DistributedMutex>>,
    Json(reply): Json<LockReply>,
) -> (StatusCode, Json<MessageAck>) {
    mutex.handle_reply(reply);
    (StatusCode::OK, Json(MessageAck { ack_received: true }))
}
