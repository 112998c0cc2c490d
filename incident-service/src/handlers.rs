//! Handler模块

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::IncidentNotification;
use common::response::ApiResponse;

use crate::service::{DeletionOutcome, IncidentService, IntakeOutcome};
use crate::state::AppState;
use crate::SERVICE_NAME;

/// 接收 Pub/Sub 推送的告警事件
#[utoipa::path(
    post,
    path = "/webhook-intake",
    tag = "incidents",
    request_body(content = String, description = "Pub/Sub 推送信封，message.data 为 base64 编码的事件 JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "事件已处理", body = ApiResponse<IntakeOutcome>),
        (status = 400, description = "信封或事件格式错误"),
        (status = 502, description = "实例查询失败")
    )
)]
pub async fn webhook_intake(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<IntakeOutcome>>, Response> {
    let started = Instant::now();
    let reject = |err: AppError| err.into_response_with(SERVICE_NAME, request_id.as_str());
    let notification = IncidentNotification::from_push_body(&body).map_err(reject)?;
    tracing::info!(
        state = %notification.incident.state,
        incident_id = ?notification.incident.incident_id,
        "收到告警事件"
    );

    let outcome = IncidentService::new(&state)
        .handle_notification(&notification)
        .await
        .map_err(reject)?;

    Ok(Json(
        ApiResponse::ok(outcome)
            .with_service(SERVICE_NAME)
            .with_request_id(request_id.as_str())
            .with_duration(started.elapsed().as_millis() as u64),
    ))
}

/// 删除实例并等待其下线
#[utoipa::path(
    post,
    path = "/delete/{instance}",
    tag = "incidents",
    params(
        ("instance" = String, Path, description = "实例名称")
    ),
    responses(
        (status = 200, description = "删除结果", body = ApiResponse<DeletionOutcome>)
    )
)]
pub async fn delete_instance(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(instance): Path<String>,
) -> Json<ApiResponse<DeletionOutcome>> {
    let started = Instant::now();
    let outcome = IncidentService::new(&state).delete_instance(&instance).await;
    Json(
        ApiResponse::ok(outcome)
            .with_service(SERVICE_NAME)
            .with_request_id(request_id.as_str())
            .with_duration(started.elapsed().as_millis() as u64),
    )
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        credentials: state.credentials.kind().to_string(),
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 使用的凭据来源
    pub credentials: String,
}
