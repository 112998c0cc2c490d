//! `databases` resource group.

use reqwest::Method;
use validator::Validate;

use common::errors::AppResult;
use common::models::{Database, DatabaseInsert};

use crate::client::SqlAdmin;

/// Database calls, borrowed from a [`SqlAdmin`].
pub struct Databases<'a> {
    admin: &'a SqlAdmin,
}

impl<'a> Databases<'a> {
    pub(crate) fn new(admin: &'a SqlAdmin) -> Self {
        Self { admin }
    }

    pub async fn get(&self, project: &str, instance: &str, database: &str) -> Option<Database> {
        let url = self.admin.url(&[
            "projects", project, "instances", instance, "databases", database,
        ]);
        self.admin.get_or_none(url, "databases.get").await
    }

    pub async fn list(&self, project: &str, instance: &str) -> AppResult<Vec<Database>> {
        let url = self
            .admin
            .url(&["projects", project, "instances", instance, "databases"]);
        self.admin.list_all(url).await
    }

    /// Creates a database. `Err` only when the parameters fail validation.
    pub async fn insert(&self, request: &DatabaseInsert) -> AppResult<bool> {
        request.validate()?;
        let url = self.admin.url(&[
            "projects",
            &request.project,
            "instances",
            &request.instance,
            "databases",
        ]);
        Ok(self
            .admin
            .mutate(Method::POST, url, Some(&request.to_body()), "databases.insert")
            .await)
    }

    pub async fn delete(&self, project: &str, instance: &str, database: &str) -> bool {
        let url = self.admin.url(&[
            "projects", project, "instances", instance, "databases", database,
        ]);
        self.admin
            .mutate(Method::DELETE, url, None, "databases.delete")
            .await
    }
}
