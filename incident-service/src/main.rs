//! 告警事件驱动的实例删除服务
//!
//! 提供以下功能：
//! - 接收 Pub/Sub 推送的监控告警事件
//! - 查找匹配命名规则的 Cloud SQL 只读副本
//! - 删除前通知外部系统（Webhook）
//! - 通过带身份令牌的请求触发实例删除

mod config;
mod handlers;
mod notifier;
mod routes;
mod service;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;

use crate::config::IncidentConfig;

pub(crate) const SERVICE_NAME: &str = "incident-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "事件服务 API",
        version = "0.1.0",
        description = "告警事件驱动的 Cloud SQL 实例删除微服务"
    ),
    paths(
        handlers::webhook_intake,
        handlers::delete_instance,
        handlers::health_check,
    ),
    components(schemas(
        common::models::IncidentNotification,
        common::models::Incident,
        common::models::InstanceState,
        service::IntakeOutcome,
        service::DeletionOutcome,
        notifier::WebhookDelivery,
        notifier::TriggerResult,
        handlers::HealthResponse,
    )),
    tags(
        (name = "incidents", description = "告警事件与实例删除端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（包括 .env）
    let app_config =
        AppConfig::load_with_service(SERVICE_NAME).context("加载服务配置失败")?;

    // 初始化日志追踪
    init_tracing(app_config.log_json);

    let incident_config = IncidentConfig::from_env(&app_config).context("加载事件配置失败")?;
    info!(
        project = %incident_config.project,
        filter = %incident_config.instance_filter,
        webhooks = incident_config.webhooks.len(),
        delete_service = %incident_config.delete_service_url,
        "事件配置已加载"
    );

    // 创建应用状态（凭据只解析一次）
    let state = AppState::from_config(&app_config, incident_config)
        .context("初始化应用状态失败（检查凭据配置）")?;

    let app = create_router(state);

    // 启动服务
    let addr = app_config.bind_addr();
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务运行失败")?;

    info!("服务已停止");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// 等待退出信号（Ctrl+C 或 SIGTERM）
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "无法监听 Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到 Ctrl+C，开始优雅关闭"),
        _ = terminate => info!("收到 SIGTERM，开始优雅关闭"),
    }
}
