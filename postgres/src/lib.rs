//! `PostgreSQL` document store for Volunteer Hub.
//!
//! This crate provides the production implementation of the `DocumentStore`
//! trait from `volunteer-hub-core`. It uses sqlx runtime queries and supports:
//!
//! - JSONB documents with indexed key columns
//! - `SERIALIZABLE` transactions with row locks for the registration flow
//! - Connection pooling
//! - Embedded migrations
//!
//! # Example
//!
//! ```ignore
//! use volunteer_hub_postgres::{PoolSettings, PostgresDocumentStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresDocumentStore::connect("postgres://localhost/mydb", &PoolSettings::default()).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod store;

pub use store::{PoolSettings, PostgresDocumentStore};
