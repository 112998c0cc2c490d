//! Cloud SQL instance models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Lifecycle state reported by the Admin API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    SqlInstanceStateUnspecified,
    /// Instance is running and accepting connections.
    Runnable,
    Suspended,
    PendingDelete,
    /// Instance is still being provisioned.
    PendingCreate,
    Maintenance,
    Failed,
    OnlineMaintenance,
    Repairing,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceState::SqlInstanceStateUnspecified => "SQL_INSTANCE_STATE_UNSPECIFIED",
            InstanceState::Runnable => "RUNNABLE",
            InstanceState::Suspended => "SUSPENDED",
            InstanceState::PendingDelete => "PENDING_DELETE",
            InstanceState::PendingCreate => "PENDING_CREATE",
            InstanceState::Maintenance => "MAINTENANCE",
            InstanceState::Failed => "FAILED",
            InstanceState::OnlineMaintenance => "ONLINE_MAINTENANCE",
            InstanceState::Repairing => "REPAIRING",
            InstanceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// One IP address assigned to an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpMapping {
    pub ip_address: String,
    /// PRIMARY, OUTGOING or PRIVATE.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Cloud SQL instance as returned by `instances.get` / `instances.list`.
///
/// Only the fields this workspace reads are typed; everything else the API
/// returns is kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInstance {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<InstanceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<IpMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DatabaseInstance {
    pub fn is_runnable(&self) -> bool {
        self.state == Some(InstanceState::Runnable)
    }

    /// First address in the order the API lists them.
    pub fn first_ip_address(&self) -> Option<&str> {
        self.ip_addresses.first().map(|m| m.ip_address.as_str())
    }
}

/// Database engines supported by [`InstanceInsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    MySQL,
    PostgreSQL,
}

impl DatabaseEngine {
    /// `databaseVersion` sent on creation.
    pub fn database_version(&self) -> &'static str {
        match self {
            DatabaseEngine::MySQL => "MYSQL_5_7",
            DatabaseEngine::PostgreSQL => "POSTGRES_9_6",
        }
    }
}

impl FromStr for DatabaseEngine {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MySQL" => Ok(DatabaseEngine::MySQL),
            "PostgreSQL" => Ok(DatabaseEngine::PostgreSQL),
            other => Err(AppError::InvalidEngine(format!(
                "invalid database_type={other}"
            ))),
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseEngine::MySQL => write!(f, "MySQL"),
            DatabaseEngine::PostgreSQL => write!(f, "PostgreSQL"),
        }
    }
}

/// Parameters for `instances.insert`.
///
/// Only a simple default configuration per engine is offered. New MySQL
/// instances stay `PENDING_CREATE` for several minutes, PostgreSQL ones for
/// around three.
#[derive(Debug, Clone, Validate)]
pub struct InstanceInsert {
    #[validate(length(min = 1, message = "project is required"))]
    pub project: String,
    #[validate(length(min = 1, message = "instance name is required"))]
    pub name: String,
    pub root_password: String,
    pub engine: DatabaseEngine,
    /// Primary instance to replicate from (MySQL only).
    pub master_instance_name: Option<String>,
}

impl InstanceInsert {
    /// Builds an insert request, rejecting unknown engine names up front.
    pub fn new(
        project: impl Into<String>,
        name: impl Into<String>,
        root_password: impl Into<String>,
        database_type: &str,
    ) -> AppResult<Self> {
        Ok(Self {
            project: project.into(),
            name: name.into(),
            root_password: root_password.into(),
            engine: database_type.parse()?,
            master_instance_name: None,
        })
    }

    /// Creates the instance as a read replica of `primary`.
    pub fn replica_of(mut self, primary: impl Into<String>) -> Self {
        self.master_instance_name = Some(primary.into());
        self
    }

    /// Request body for `POST .../projects/{project}/instances`.
    pub fn to_body(&self) -> AppResult<Value> {
        let mut body = json!({
            "project": self.project,
            "name": self.name,
            "rootPassword": self.root_password,
            "databaseVersion": self.engine.database_version(),
        });
        match self.engine {
            DatabaseEngine::MySQL => {
                let mut labels = json!({ "owner": "sql" });
                if let Some(primary) = &self.master_instance_name {
                    body["masterInstanceName"] = json!(primary);
                    labels["read-replica"] = json!("true");
                }
                body["region"] = json!("us-east1");
                body["settings"] = json!({
                    "tier": "db-n1-standard-1",
                    "userLabels": labels,
                });
            }
            DatabaseEngine::PostgreSQL => {
                if self.master_instance_name.is_some() {
                    return Err(AppError::Validation(
                        "read replicas are only supported for MySQL".to_string(),
                    ));
                }
                body["settings"] = json!({
                    "tier": "db-custom-1-3840",
                    "availabilityType": "ZONAL",
                });
            }
        }
        Ok(body)
    }
}
