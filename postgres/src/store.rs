//! `PostgreSQL` implementation of [`DocumentStore`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::JsonValue;
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;
use volunteer_hub_core::certificate::Certificate;
use volunteer_hub_core::event::Event;
use volunteer_hub_core::registration::{
    CustomFields, PendingRegistration, Registration, RegistrationStatus,
};
use volunteer_hub_core::store::{DocumentStore, StoreError, StoreFuture, StoreTransaction};
use volunteer_hub_core::types::{CertificateId, EventId, RegistrationId, UserId};
use volunteer_hub_core::user::{Role, User};

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// `PostgreSQL`-backed document store.
///
/// Users and events are stored as JSONB documents with their key columns
/// alongside. Transactions run at `SERIALIZABLE` and lock every row they read
/// with `FOR UPDATE`, so concurrent registrations for the same event queue up
/// behind each other instead of overrunning capacity.
///
/// # Example
///
/// ```no_run
/// use volunteer_hub_postgres::{PoolSettings, PostgresDocumentStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresDocumentStore::connect("postgres://localhost/volunteer_hub", &PoolSettings::default()).await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    #[tracing::instrument(skip(database_url))]
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(database_url)
            .await
            .map_err(map_sqlx)?;

        tracing::info!(
            max_connections = settings.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

/// Translate driver errors into the store taxonomy.
///
/// Serialization failures (`40001`) and deadlocks (`40P01`) are lost races;
/// unique violations (`23505`) are duplicates.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("40001" | "40P01") => return StoreError::Conflict,
            Some("23505") => return StoreError::Duplicate(db.message().to_string()),
            _ => {}
        }
    }
    StoreError::Database(err.to_string())
}

fn to_json<T: Serialize>(doc: &T) -> Result<JsonValue, StoreError> {
    Ok(serde_json::to_value(doc)?)
}

fn from_json<T: DeserializeOwned>(json: JsonValue) -> Result<T, StoreError> {
    Ok(serde_json::from_value(json)?)
}

fn from_rows<T: DeserializeOwned>(rows: Vec<(JsonValue,)>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(|(json,)| from_json(json)).collect()
}

type RegistrationRow = (Uuid, Uuid, Uuid, String, String, JsonValue, DateTime<Utc>);

fn registration_from_row(row: RegistrationRow) -> Result<Registration, StoreError> {
    let (id, user_id, event_id, status, user_name, custom_fields, created_at) = row;
    let status: RegistrationStatus = status
        .parse()
        .map_err(|e| StoreError::Serialization(format!("{e}")))?;
    let custom_fields: CustomFields = from_json(custom_fields)?;
    Ok(Registration {
        id: RegistrationId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        event_id: EventId::from_uuid(event_id),
        status,
        created_at,
        user_name,
        custom_fields,
    })
}

type CertificateRow = (Uuid, Uuid, Uuid, String, String, DateTime<Utc>);

fn certificate_from_row(row: CertificateRow) -> Certificate {
    let (id, user_id, event_id, event_name, file_url, date_issued) = row;
    Certificate {
        id: CertificateId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        event_id: EventId::from_uuid(event_id),
        event_name,
        file_url,
        date_issued,
    }
}

const REGISTRATION_COLUMNS: &str =
    "id, user_id, event_id, status, user_name, custom_fields, created_at";
const CERTIFICATE_COLUMNS: &str = "id, user_id, event_id, event_name, file_url, date_issued";

impl DocumentStore for PostgresDocumentStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
            Ok(Box::new(PostgresTransaction { tx }) as Box<dyn StoreTransaction>)
        })
    }

    fn insert_event(&self, event: Event) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let json = to_json(&event)?;
            sqlx::query(
                "INSERT INTO events (id, date, visibility, category, data, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(event.id.as_uuid())
            .bind(event.date)
            .bind(if event.is_public() { "public" } else { "private" })
            .bind(event.category.as_str())
            .bind(&json)
            .bind(event.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            let row: Option<(JsonValue,)> = sqlx::query_as("SELECT data FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
            row.map(|(json,)| from_json(json)).transpose()
        })
    }

    fn list_events(&self) -> StoreFuture<'_, Vec<Event>> {
        Box::pin(async move {
            let rows: Vec<(JsonValue,)> = sqlx::query_as("SELECT data FROM events ORDER BY date")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?;
            from_rows(rows)
        })
    }

    fn insert_user(&self, user: User) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let json = to_json(&user)?;
            sqlx::query("INSERT INTO users (id, name, data, created_at) VALUES ($1, $2, $3, $4)")
                .bind(user.id.as_uuid())
                .bind(&user.name)
                .bind(&json)
                .bind(user.created_at)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            let row: Option<(JsonValue,)> = sqlx::query_as("SELECT data FROM users WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
            row.map(|(json,)| from_json(json)).transpose()
        })
    }

    fn list_users(&self) -> StoreFuture<'_, Vec<User>> {
        Box::pin(async move {
            let rows: Vec<(JsonValue,)> = sqlx::query_as("SELECT data FROM users ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?;
            from_rows(rows)
        })
    }

    fn set_user_role(&self, id: UserId, role: Role) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let row: Option<(JsonValue,)> = sqlx::query_as(
                "UPDATE users
                 SET data = jsonb_set(data, '{role}', to_jsonb($2::text)), updated_at = now()
                 WHERE id = $1
                 RETURNING data",
            )
            .bind(id.as_uuid())
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

            match row {
                Some((json,)) => from_json(json),
                None => Err(StoreError::NotFound(format!("user {id}"))),
            }
        })
    }

    fn list_registrations_for_event(
        &self,
        event_id: EventId,
    ) -> StoreFuture<'_, Vec<Registration>> {
        Box::pin(async move {
            let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations
                 WHERE event_id = $1 ORDER BY created_at, id"
            ))
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            rows.into_iter().map(registration_from_row).collect()
        })
    }

    fn list_registrations_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Registration>> {
        Box::pin(async move {
            let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations
                 WHERE user_id = $1 ORDER BY created_at, id"
            ))
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            rows.into_iter().map(registration_from_row).collect()
        })
    }

    fn insert_certificate(&self, certificate: Certificate) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(&format!(
                "INSERT INTO certificates ({CERTIFICATE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
            ))
            .bind(certificate.id.as_uuid())
            .bind(certificate.user_id.as_uuid())
            .bind(certificate.event_id.as_uuid())
            .bind(&certificate.event_name)
            .bind(&certificate.file_url)
            .bind(certificate.date_issued)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn list_certificates_for_event(
        &self,
        event_id: EventId,
    ) -> StoreFuture<'_, Vec<Certificate>> {
        Box::pin(async move {
            let rows: Vec<CertificateRow> = sqlx::query_as(&format!(
                "SELECT {CERTIFICATE_COLUMNS} FROM certificates
                 WHERE event_id = $1 ORDER BY date_issued"
            ))
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(rows.into_iter().map(certificate_from_row).collect())
        })
    }

    fn list_certificates_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Certificate>> {
        Box::pin(async move {
            let rows: Vec<CertificateRow> = sqlx::query_as(&format!(
                "SELECT {CERTIFICATE_COLUMNS} FROM certificates
                 WHERE user_id = $1 ORDER BY date_issued"
            ))
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(rows.into_iter().map(certificate_from_row).collect())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }
}

/// One `SERIALIZABLE` transaction. Dropping it without committing rolls back.
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl StoreTransaction for PostgresTransaction {
    fn get_user(&mut self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            let row: Option<(JsonValue,)> =
                sqlx::query_as("SELECT data FROM users WHERE id = $1 FOR UPDATE")
                    .bind(id.as_uuid())
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx)?;
            row.map(|(json,)| from_json(json)).transpose()
        })
    }

    fn get_event(&mut self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(async move {
            let row: Option<(JsonValue,)> =
                sqlx::query_as("SELECT data FROM events WHERE id = $1 FOR UPDATE")
                    .bind(id.as_uuid())
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx)?;
            row.map(|(json,)| from_json(json)).transpose()
        })
    }

    fn insert_registration(
        &mut self,
        registration: PendingRegistration,
    ) -> StoreFuture<'_, Registration> {
        Box::pin(async move {
            let custom_fields = to_json(&registration.custom_fields)?;
            let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
                "INSERT INTO registrations (id, user_id, event_id, status, user_name, custom_fields)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING created_at",
            )
            .bind(registration.id.as_uuid())
            .bind(registration.user_id.as_uuid())
            .bind(registration.event_id.as_uuid())
            .bind(registration.status.as_str())
            .bind(&registration.user_name)
            .bind(&custom_fields)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

            Ok(registration.into_registration(created_at))
        })
    }

    fn update_user(&mut self, user: User) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let json = to_json(&user)?;
            let result =
                sqlx::query("UPDATE users SET name = $2, data = $3, updated_at = now() WHERE id = $1")
                    .bind(user.id.as_uuid())
                    .bind(&user.name)
                    .bind(&json)
                    .execute(&mut *self.tx)
                    .await
                    .map_err(map_sqlx)?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("user {}", user.id)));
            }
            Ok(())
        })
    }

    fn update_event(&mut self, event: Event) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let json = to_json(&event)?;
            let result = sqlx::query(
                "UPDATE events
                 SET date = $2, visibility = $3, category = $4, data = $5, updated_at = now()
                 WHERE id = $1",
            )
            .bind(event.id.as_uuid())
            .bind(event.date)
            .bind(if event.is_public() { "public" } else { "private" })
            .bind(event.category.as_str())
            .bind(&json)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("event {}", event.id)));
            }
            Ok(())
        })
    }

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move { self.tx.commit().await.map_err(map_sqlx) })
    }
}
