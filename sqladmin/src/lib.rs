//! Thin client for the Cloud SQL Admin API (`v1beta4`).
//!
//! Three resource groups hang off [`SqlAdmin`]:
//!
//! ```no_run
//! # async fn demo(admin: sqladmin::SqlAdmin) -> common::errors::AppResult<()> {
//! let instances = admin.instances().list("my-project").await?;
//! let deleted = admin.databases().delete("my-project", "replica-1", "orders").await;
//! # Ok(())
//! # }
//! ```
//!
//! Reads return typed resources; mutating calls return a plain success flag
//! and never propagate remote failures.

mod client;
mod databases;
mod instances;
mod poll;
mod users;

#[cfg(test)]
mod test_support;

pub use client::SqlAdmin;
pub use databases::Databases;
pub use instances::Instances;
pub use poll::{poll_until, PollPolicy};
pub use users::Users;
