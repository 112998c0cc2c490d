//! 处理器与服务测试共用的测试夹具

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::credentials::StaticCredentials;
use serde_json::{json, Value};
use sqladmin::{PollPolicy, SqlAdmin};
use wiremock::MockServer;

use crate::config::IncidentConfig;
use crate::state::{build_http_client, AppState};

pub const ACCESS_TOKEN: &str = "test-access-token";
pub const IDENTITY_TOKEN: &str = "test-identity-token";

/// 测试项目的 Admin API 路径前缀
pub const ADMIN_ROOT: &str = "/sql/v1beta4/projects/proj";

/// Admin API、Webhook 与删除服务都指向 `server` 的应用状态；
/// 等待时间为零，就绪状态只检查一次
pub fn state_for(server: &MockServer, webhooks: Vec<String>) -> AppState {
    let http_client = build_http_client(Duration::from_secs(5)).unwrap();
    let credentials = Arc::new(StaticCredentials::new(
        Some(ACCESS_TOKEN.to_string()),
        Some(IDENTITY_TOKEN.to_string()),
    ));
    let admin = SqlAdmin::new(
        &format!("{}/sql/v1beta4", server.uri()),
        http_client.clone(),
        credentials.clone(),
    )
    .unwrap();
    let config = IncidentConfig {
        project: "proj".to_string(),
        instance_filter: "autorep".to_string(),
        webhooks,
        delete_service_url: server.uri(),
        webhook_timeout: Duration::from_secs(5),
        settle_delay: Duration::ZERO,
        trigger_timeout: Duration::from_millis(500),
        http_timeout: Duration::from_secs(5),
        readiness: PollPolicy::once(),
        deprovision: PollPolicy::new(Duration::from_millis(10), Duration::from_secs(5)),
    };
    AppState::new(config, admin, credentials, http_client)
}

pub fn instance_json(name: &str, state: &str, ip_address: Option<&str>) -> Value {
    let mut instance = json!({
        "kind": "sql#instance",
        "name": name,
        "project": "proj",
        "state": state,
        "databaseVersion": "MYSQL_5_7",
        "region": "us-east1",
    });
    if let Some(ip) = ip_address {
        instance["ipAddresses"] = json!([{"type": "PRIMARY", "ipAddress": ip}]);
    }
    instance
}

/// 按 Pub/Sub 推送格式包装告警负载
pub fn push_body(payload: &Value) -> Vec<u8> {
    let data = STANDARD.encode(payload.to_string());
    serde_json::to_vec(&json!({
        "message": {"data": data, "messageId": "1", "publishTime": "2024-01-01T00:00:00Z"},
        "subscription": "projects/proj/subscriptions/incidents",
    }))
    .unwrap()
}
