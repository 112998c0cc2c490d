//! Shared data models.

pub mod database;
pub mod incident;
pub mod instance;
pub mod operation;
pub mod user;

pub use database::{Database, DatabaseInsert};
pub use incident::{Incident, IncidentNotification};
pub use instance::{DatabaseEngine, DatabaseInstance, InstanceInsert, InstanceState, IpMapping};
pub use operation::Operation;
pub use user::{User, UserInsert};
