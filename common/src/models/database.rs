//! Database entity models.
//!
//! A database lives inside a Cloud SQL instance and is addressed by
//! project + instance + name.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::Validate;

/// Default character set, a good choice for MySQL.
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Default collation, a good choice for MySQL.
pub const DEFAULT_COLLATION: &str = "utf8mb4_unicode_520_ci";

/// A database as returned by `databases.get` / `databases.list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameters for `databases.insert`.
#[derive(Debug, Clone, Validate)]
pub struct DatabaseInsert {
    #[validate(length(min = 1, message = "project is required"))]
    pub project: String,
    #[validate(length(min = 1, message = "instance is required"))]
    pub instance: String,
    #[validate(length(min = 1, max = 64, message = "database name must be 1-64 characters"))]
    pub name: String,
    pub charset: String,
    pub collation: String,
    /// Addressable URI for the database.
    pub self_link: String,
}

impl DatabaseInsert {
    /// Creates insert parameters with the MySQL-friendly defaults.
    pub fn new(
        project: impl Into<String>,
        instance: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            instance: instance.into(),
            name: name.into(),
            charset: DEFAULT_CHARSET.to_string(),
            collation: DEFAULT_COLLATION.to_string(),
            self_link: String::new(),
        }
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = collation.into();
        self
    }

    pub fn self_link(mut self, self_link: impl Into<String>) -> Self {
        self.self_link = self_link.into();
        self
    }

    /// Request body for `POST .../instances/{instance}/databases`.
    pub fn to_body(&self) -> Value {
        json!({
            "kind": "sql#database",
            "name": self.name,
            "charset": self.charset,
            "project": self.project,
            "instance": self.instance,
            "etag": "",
            "collation": self.collation,
            "selfLink": self.self_link,
        })
    }
}
