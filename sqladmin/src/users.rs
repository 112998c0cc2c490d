//! `users` resource group.
//!
//! Users are keyed by name *and* host, so both travel as query parameters on
//! get and delete.

use reqwest::Method;
use validator::Validate;

use common::errors::AppResult;
use common::models::{User, UserInsert};

use crate::client::SqlAdmin;

/// User calls, borrowed from a [`SqlAdmin`].
pub struct Users<'a> {
    admin: &'a SqlAdmin,
}

impl<'a> Users<'a> {
    pub(crate) fn new(admin: &'a SqlAdmin) -> Self {
        Self { admin }
    }

    pub async fn get(&self, project: &str, instance: &str, host: &str, username: &str) -> Option<User> {
        let mut url = self.admin.url(&[
            "projects", project, "instances", instance, "users", username,
        ]);
        url.query_pairs_mut().append_pair("host", host);
        self.admin.get_or_none(url, "users.get").await
    }

    pub async fn list(&self, project: &str, instance: &str) -> AppResult<Vec<User>> {
        let url = self
            .admin
            .url(&["projects", project, "instances", instance, "users"]);
        self.admin.list_all(url).await
    }

    /// Creates a user. `Err` only when the parameters fail validation.
    pub async fn insert(&self, request: &UserInsert) -> AppResult<bool> {
        request.validate()?;
        let url = self.admin.url(&[
            "projects",
            &request.project,
            "instances",
            &request.instance,
            "users",
        ]);
        Ok(self
            .admin
            .mutate(Method::POST, url, Some(&request.to_body()), "users.insert")
            .await)
    }

    pub async fn delete(&self, project: &str, instance: &str, host: &str, username: &str) -> bool {
        let mut url = self
            .admin
            .url(&["projects", project, "instances", instance, "users"]);
        url.query_pairs_mut()
            .append_pair("host", host)
            .append_pair("name", username);
        self.admin
            .mutate(Method::DELETE, url, None, "users.delete")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_at, admin_for, UNREACHABLE_ENDPOINT};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USERS: &str = "/sql/v1beta4/projects/proj/instances/inst/users";

    #[tokio::test]
    async fn test_get_passes_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USERS}/app")))
            .and(query_param("host", "%"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "sql#user", "name": "app", "host": "%"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = admin_for(&server)
            .users()
            .get("proj", "inst", "%", "app")
            .await
            .unwrap();
        assert_eq!(user.host.as_deref(), Some("%"));
    }

    #[tokio::test]
    async fn test_list_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "sql#usersList",
                "items": [{"name": "root", "host": "%"}, {"name": "app", "host": "localhost"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let users = admin_for(&server).users().list("proj", "inst").await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].host.as_deref(), Some("localhost"));
    }

    #[tokio::test]
    async fn test_insert_sends_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(USERS))
            .and(body_partial_json(json!({
                "kind": "sql#user", "name": "app", "host": "%", "password": "s3cret"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "op-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let ok = admin_for(&server)
            .users()
            .insert(&UserInsert::new("proj", "inst", "%", "app", "s3cret"))
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_insert_rejected_by_api_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(USERS))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "invalid password"}
            })))
            .mount(&server)
            .await;
        let ok = admin_for(&server)
            .users()
            .insert(&UserInsert::new("proj", "inst", "%", "app", ""))
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_delete_passes_host_and_name() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(USERS))
            .and(query_param("host", "localhost"))
            .and(query_param("name", "app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "op-2"})))
            .expect(1)
            .mount(&server)
            .await;
        assert!(admin_for(&server)
            .users()
            .delete("proj", "inst", "localhost", "app")
            .await);
    }

    #[tokio::test]
    async fn test_delete_transport_error_is_false() {
        assert!(!admin_at(UNREACHABLE_ENDPOINT)
            .users()
            .delete("proj", "inst", "%", "app")
            .await);
    }
}
