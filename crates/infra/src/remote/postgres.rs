//! Postgres-backed remote store.
//!
//! Every table keeps the full record as a JSONB `data` column next to the
//! columns used for filtering and ordering (`user_id`, timestamps, flags).
//! The JSON uses the same camelCase layout as the local store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RemoteStoreError |
//! |------------|----------------------|------------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | RowNotFound | N/A | `NotFound` |
//! | anything else | any | `Database` |

use std::sync::Arc;

use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use invoicer_core::{Entity, InvoiceId, PublicTemplateId, TemplateId, UserId};
use invoicer_invoicing::{InvoiceDraft, InvoiceTemplate, PublicTemplate};

use super::r#trait::{DraftUpdate, RemoteStore, RemoteStoreError};

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS templates (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL,
        name        TEXT NOT NULL,
        data        JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS templates_user_id_idx ON templates (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS drafts (
        id             TEXT PRIMARY KEY,
        user_id        TEXT NOT NULL,
        draft_name     TEXT NOT NULL,
        data           JSONB NOT NULL,
        last_modified  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS drafts_user_id_idx ON drafts (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS public_templates (
        id            TEXT PRIMARY KEY,
        name          TEXT NOT NULL,
        description   TEXT NULL,
        data          JSONB NOT NULL,
        is_active     BOOLEAN NOT NULL DEFAULT FALSE,
        created_by    TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        company_logo  TEXT NULL
    )
    "#,
];

/// Remote store on a shared Postgres database.
///
/// `Send + Sync`; the SQLx pool handles connection management.
#[derive(Debug, Clone)]
pub struct PostgresRemoteStore {
    pool: Arc<PgPool>,
}

impl PostgresRemoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the tables exist.
    pub async fn connect(database_url: &str) -> Result<Self, RemoteStoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), RemoteStoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RemoteStoreError {
    match &err {
        sqlx::Error::RowNotFound => RemoteStoreError::NotFound(operation.to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            RemoteStoreError::Conflict(format!("{operation}: {}", db.message()))
        }
        _ => RemoteStoreError::Database(format!("{operation}: {err}")),
    }
}

fn decode_rows<T>(rows: Vec<sqlx::postgres::PgRow>, operation: &str) -> Result<Vec<T>, RemoteStoreError>
where
    T: serde::de::DeserializeOwned,
{
    rows.into_iter()
        .map(|row| {
            let data: serde_json::Value = row
                .try_get("data")
                .map_err(|e| map_sqlx_error(operation, e))?;
            Ok(serde_json::from_value(data)?)
        })
        .collect()
}

#[async_trait::async_trait]
impl RemoteStore for PostgresRemoteStore {
    #[instrument(skip(self), fields(user_id = %user))]
    async fn list_templates(&self, user: &UserId) -> Result<Vec<InvoiceTemplate>, RemoteStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT data
            FROM templates
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_templates", e))?;

        decode_rows(rows, "list_templates")
    }

    #[instrument(skip(self, template), fields(user_id = %user, template_id = %template.id))]
    async fn insert_template(
        &self,
        user: &UserId,
        template: &InvoiceTemplate,
    ) -> Result<(), RemoteStoreError> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, user_id, name, data, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(template.id.as_str())
        .bind(user.as_str())
        .bind(&template.name)
        .bind(Json(template))
        .bind(template.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_template", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(template_id = %id))]
    async fn delete_template(&self, id: &TemplateId) -> Result<(), RemoteStoreError> {
        sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_template", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn list_drafts(&self, user: &UserId) -> Result<Vec<InvoiceDraft>, RemoteStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT data
            FROM drafts
            WHERE user_id = $1
            ORDER BY last_modified DESC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_drafts", e))?;

        decode_rows(rows, "list_drafts")
    }

    #[instrument(skip(self, draft), fields(user_id = %user, draft_id = %draft.id()))]
    async fn insert_draft(&self, user: &UserId, draft: &InvoiceDraft) -> Result<(), RemoteStoreError> {
        sqlx::query(
            r#"
            INSERT INTO drafts (id, user_id, draft_name, data, last_modified)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(draft.id().as_str())
        .bind(user.as_str())
        .bind(&draft.draft_name)
        .bind(Json(draft))
        .bind(draft.last_modified)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_draft", e))?;
        Ok(())
    }

    #[instrument(skip(self, update), fields(draft_id = %id))]
    async fn update_draft(&self, id: &InvoiceId, update: &DraftUpdate) -> Result<(), RemoteStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_draft", e))?;

        let row = sqlx::query("SELECT data FROM drafts WHERE id = $1 FOR UPDATE")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_draft", e))?
            .ok_or_else(|| RemoteStoreError::NotFound(format!("draft {id}")))?;

        let data: serde_json::Value = row
            .try_get("data")
            .map_err(|e| map_sqlx_error("update_draft", e))?;
        let mut draft: InvoiceDraft = serde_json::from_value(data)?;
        update.apply_to(&mut draft);

        sqlx::query(
            r#"
            UPDATE drafts
            SET draft_name = $2, data = $3, last_modified = $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(&draft.draft_name)
        .bind(Json(&draft))
        .bind(draft.last_modified)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_draft", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_draft", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(draft_id = %id))]
    async fn delete_draft(&self, id: &InvoiceId) -> Result<(), RemoteStoreError> {
        sqlx::query("DELETE FROM drafts WHERE id = $1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_draft", e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_public_templates(&self) -> Result<Vec<PublicTemplate>, RemoteStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, data, is_active
            FROM public_templates
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_public_templates", e))?;

        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row
                    .try_get("data")
                    .map_err(|e| map_sqlx_error("list_public_templates", e))?;
                let is_active: bool = row
                    .try_get("is_active")
                    .map_err(|e| map_sqlx_error("list_public_templates", e))?;
                let mut template: PublicTemplate = serde_json::from_value(data)?;
                // The column is authoritative; the payload is written once at publish time.
                template.is_active = is_active;
                Ok(template)
            })
            .collect()
    }

    #[instrument(skip(self, template), fields(public_template_id = %template.id))]
    async fn insert_public_template(&self, template: &PublicTemplate) -> Result<(), RemoteStoreError> {
        sqlx::query(
            r#"
            INSERT INTO public_templates (
                id,
                name,
                description,
                data,
                is_active,
                created_by,
                created_at,
                company_logo
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(template.id.as_str())
        .bind(&template.name)
        .bind(template.description.as_deref())
        .bind(Json(template))
        .bind(template.is_active)
        .bind(template.created_by.as_str())
        .bind(template.created_at)
        .bind(template.company_logo.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_public_template", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(public_template_id = %id))]
    async fn set_public_template_active(
        &self,
        id: &PublicTemplateId,
        active: bool,
    ) -> Result<(), RemoteStoreError> {
        let result = sqlx::query("UPDATE public_templates SET is_active = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(active)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_public_template_active", e))?;

        if result.rows_affected() == 0 {
            return Err(RemoteStoreError::NotFound(format!("public template {id}")));
        }
        Ok(())
    }
}
