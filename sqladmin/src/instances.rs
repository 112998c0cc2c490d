//! `instances` resource group.

use reqwest::Method;
use validator::Validate;

use common::errors::AppResult;
use common::models::{DatabaseInstance, InstanceInsert, InstanceState};

use crate::client::SqlAdmin;
use crate::poll::{poll_until, PollPolicy};

/// Instance calls, borrowed from a [`SqlAdmin`].
pub struct Instances<'a> {
    admin: &'a SqlAdmin,
}

impl<'a> Instances<'a> {
    pub(crate) fn new(admin: &'a SqlAdmin) -> Self {
        Self { admin }
    }

    /// Metadata for one instance, or `None` if it could not be read.
    pub async fn get(&self, project: &str, instance: &str) -> Option<DatabaseInstance> {
        let url = self.admin.url(&["projects", project, "instances", instance]);
        self.admin.get_or_none(url, "instances.get").await
    }

    /// Every instance in the project, across all pages.
    pub async fn list(&self, project: &str) -> AppResult<Vec<DatabaseInstance>> {
        let url = self.admin.url(&["projects", project, "instances"]);
        self.admin.list_all(url).await
    }

    /// Creates an instance from prepared parameters.
    ///
    /// `Err` means the parameters were rejected locally and nothing was sent.
    pub async fn insert(&self, request: &InstanceInsert) -> AppResult<bool> {
        request.validate()?;
        let body = request.to_body()?;
        let url = self.admin.url(&["projects", &request.project, "instances"]);
        Ok(self
            .admin
            .mutate(Method::POST, url, Some(&body), "instances.insert")
            .await)
    }

    /// Creates an instance with the default configuration for
    /// `database_type` (`"MySQL"` or `"PostgreSQL"`).
    pub async fn create(
        &self,
        project: &str,
        instance: &str,
        root_password: &str,
        database_type: &str,
    ) -> AppResult<bool> {
        let request = InstanceInsert::new(project, instance, root_password, database_type)?;
        self.insert(&request).await
    }

    pub async fn delete(&self, project: &str, instance: &str) -> bool {
        let url = self.admin.url(&["projects", project, "instances", instance]);
        self.admin
            .mutate(Method::DELETE, url, None, "instances.delete")
            .await
    }

    /// Polls until the instance reports `target` or the policy runs out.
    /// Returns the last observed instance.
    pub async fn wait_for_state(
        &self,
        project: &str,
        instance: &str,
        target: InstanceState,
        policy: PollPolicy,
    ) -> Option<DatabaseInstance> {
        poll_until(
            policy,
            move || self.get(project, instance),
            |observed: &DatabaseInstance| observed.state == Some(target),
        )
        .await
    }

    /// Polls until the API answers 404 for the instance. Returns whether the
    /// instance is gone.
    pub async fn wait_until_deleted(
        &self,
        project: &str,
        instance: &str,
        policy: PollPolicy,
    ) -> bool {
        let url = self.admin.url(&["projects", project, "instances", instance]);
        let gone = poll_until(
            policy,
            move || {
                let url = url.clone();
                async move {
                    match self.admin.fetch::<DatabaseInstance>(url).await {
                        Ok(None) => Some(true),
                        Ok(Some(remaining)) => {
                            tracing::debug!(instance, state = ?remaining.state, "instance still present");
                            Some(false)
                        }
                        Err(err) => {
                            tracing::warn!(instance, error = %err, "deprovision check failed");
                            None
                        }
                    }
                }
            },
            |gone: &bool| *gone,
        )
        .await;
        gone.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_at, admin_for, NoPageToken, ACCESS_TOKEN, UNREACHABLE_ENDPOINT};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const INSTANCES: &str = "/sql/v1beta4/projects/proj/instances";

    fn instance_page(name: &str, next: Option<&str>) -> serde_json::Value {
        let mut page = json!({"kind": "sql#instancesList", "items": [{"name": name, "state": "RUNNABLE"}]});
        if let Some(token) = next {
            page["nextPageToken"] = json!(token);
        }
        page
    }

    #[tokio::test]
    async fn test_list_follows_every_page_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(INSTANCES))
            .and(NoPageToken)
            .respond_with(ResponseTemplate::new(200).set_body_json(instance_page("a", Some("t1"))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(INSTANCES))
            .and(query_param("pageToken", "t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(instance_page("b", Some("t2"))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(INSTANCES))
            .and(query_param("pageToken", "t2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(instance_page("c", None)))
            .expect(1)
            .mount(&server)
            .await;

        let admin = admin_for(&server);
        let names: Vec<String> = admin
            .instances()
            .list("proj")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_list_of_empty_project_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(INSTANCES))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "sql#instancesList"})))
            .mount(&server)
            .await;
        assert!(admin_for(&server).instances().list("proj").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(INSTANCES))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;
        assert!(admin_for(&server).instances().list("proj").await.is_err());
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTANCES}/autorep-1")))
            .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "autorep-1",
                "state": "RUNNABLE",
                "ipAddresses": [{"ipAddress": "10.0.0.5", "type": "PRIVATE"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let instance = admin_for(&server)
            .instances()
            .get("proj", "autorep-1")
            .await
            .unwrap();
        assert!(instance.is_runnable());
        assert_eq!(instance.first_ip_address(), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_get_failure_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        assert!(admin_for(&server).instances().get("proj", "x").await.is_none());
    }

    #[tokio::test]
    async fn test_create_mysql_posts_fixed_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(INSTANCES))
            .and(body_partial_json(json!({
                "name": "autorep-2",
                "databaseVersion": "MYSQL_5_7",
                "region": "us-east1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "op-1", "operationType": "CREATE", "status": "PENDING"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = admin_for(&server)
            .instances()
            .create("proj", "autorep-2", "pw", "MySQL")
            .await
            .unwrap();
        assert!(created);
    }

    #[tokio::test]
    async fn test_create_unknown_engine_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = admin_for(&server)
            .instances()
            .create("proj", "x", "pw", "Oracle")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid database_type=Oracle");
    }

    #[tokio::test]
    async fn test_insert_with_error_field_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(INSTANCES))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "op-2",
                "error": {"errors": [{"code": "INSTANCE_ALREADY_EXISTS"}]}
            })))
            .mount(&server)
            .await;
        let ok = admin_for(&server)
            .instances()
            .create("proj", "dup", "pw", "PostgreSQL")
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_delete_transport_error_is_false() {
        let admin = admin_at(UNREACHABLE_ENDPOINT);
        assert!(!admin.instances().delete("proj", "autorep-1").await);
    }

    #[tokio::test]
    async fn test_delete_http_error_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{INSTANCES}/autorep-1")))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": 409, "message": "operation in progress"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        assert!(!admin_for(&server).instances().delete("proj", "autorep-1").await);
    }

    #[tokio::test]
    async fn test_delete_accepted_is_true() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{INSTANCES}/autorep-1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "op-3", "operationType": "DELETE", "status": "PENDING"
            })))
            .expect(1)
            .mount(&server)
            .await;
        assert!(admin_for(&server).instances().delete("proj", "autorep-1").await);
    }

    #[tokio::test]
    async fn test_wait_for_state_returns_once_runnable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTANCES}/autorep-1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "autorep-1", "state": "PENDING_CREATE"
            })))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTANCES}/autorep-1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "autorep-1", "state": "RUNNABLE"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let policy = PollPolicy::new(Duration::from_millis(10), Duration::from_secs(5));
        let instance = admin_for(&server)
            .instances()
            .wait_for_state("proj", "autorep-1", InstanceState::Runnable, policy)
            .await
            .unwrap();
        assert!(instance.is_runnable());
    }

    #[tokio::test]
    async fn test_wait_for_state_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "autorep-1", "state": "MAINTENANCE"
            })))
            .mount(&server)
            .await;

        let policy = PollPolicy::new(Duration::from_millis(10), Duration::from_millis(50));
        let instance = admin_for(&server)
            .instances()
            .wait_for_state("proj", "autorep-1", InstanceState::Runnable, policy)
            .await
            .unwrap();
        assert_eq!(instance.state, Some(InstanceState::Maintenance));
    }

    #[tokio::test]
    async fn test_wait_until_deleted_sees_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTANCES}/autorep-1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "autorep-1", "state": "PENDING_DELETE"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{INSTANCES}/autorep-1")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let policy = PollPolicy::new(Duration::from_millis(10), Duration::from_secs(5));
        assert!(
            admin_for(&server)
                .instances()
                .wait_until_deleted("proj", "autorep-1", policy)
                .await
        );
    }
}
