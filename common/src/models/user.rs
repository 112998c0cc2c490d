//! Database user models.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::Validate;

/// A user as returned by `users.get` / `users.list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Write-only; never serialized back out.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameters for `users.insert`.
#[derive(Debug, Clone, Validate)]
pub struct UserInsert {
    #[validate(length(min = 1, message = "project is required"))]
    pub project: String,
    #[validate(length(min = 1, message = "instance is required"))]
    pub instance: String,
    /// `localhost` restricts the user to the database machine, `%` allows any address.
    pub host: String,
    #[validate(length(min = 1, max = 32, message = "username must be 1-32 characters"))]
    pub name: String,
    pub password: String,
}

impl UserInsert {
    pub fn new(
        project: impl Into<String>,
        instance: impl Into<String>,
        host: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            instance: instance.into(),
            host: host.into(),
            name: name.into(),
            password: password.into(),
        }
    }

    /// Request body for `POST .../instances/{instance}/users`.
    pub fn to_body(&self) -> Value {
        json!({
            "kind": "sql#user",
            "name": self.name,
            "project": self.project,
            "instance": self.instance,
            "host": self.host,
            "etag": "",
            "password": self.password,
        })
    }
}
