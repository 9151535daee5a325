use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use invoicer_core::{InvoiceId, PublicTemplateId, TemplateId, UserId};
use invoicer_invoicing::{InvoiceData, InvoiceDraft, InvoiceTemplate, PublicTemplate};

/// Remote store failure.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("row payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("row already exists: {0}")]
    Conflict(String),
}

/// Partial draft update; `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftUpdate {
    pub draft_name: Option<String>,
    pub invoice: Option<InvoiceData>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl DraftUpdate {
    pub fn is_empty(&self) -> bool {
        self.draft_name.is_none() && self.invoice.is_none() && self.last_modified.is_none()
    }

    /// Apply to a stored draft.
    pub fn apply_to(&self, draft: &mut InvoiceDraft) {
        if let Some(name) = &self.draft_name {
            draft.draft_name = name.clone();
        }
        if let Some(invoice) = &self.invoice {
            // The row id is fixed; only the snapshot changes.
            let id = draft.invoice.id.clone();
            draft.invoice = invoice.clone();
            draft.invoice.id = id;
        }
        if let Some(ts) = self.last_modified {
            draft.last_modified = ts;
        }
    }
}

/// Per-user row storage for templates and drafts, plus public templates.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_templates(&self, user: &UserId) -> Result<Vec<InvoiceTemplate>, RemoteStoreError>;

    async fn insert_template(
        &self,
        user: &UserId,
        template: &InvoiceTemplate,
    ) -> Result<(), RemoteStoreError>;

    /// Deleting an absent id succeeds.
    async fn delete_template(&self, id: &TemplateId) -> Result<(), RemoteStoreError>;

    async fn list_drafts(&self, user: &UserId) -> Result<Vec<InvoiceDraft>, RemoteStoreError>;

    async fn insert_draft(&self, user: &UserId, draft: &InvoiceDraft) -> Result<(), RemoteStoreError>;

    async fn update_draft(&self, id: &InvoiceId, update: &DraftUpdate) -> Result<(), RemoteStoreError>;

    /// Deleting an absent id succeeds.
    async fn delete_draft(&self, id: &InvoiceId) -> Result<(), RemoteStoreError>;

    /// Newest first.
    async fn list_public_templates(&self) -> Result<Vec<PublicTemplate>, RemoteStoreError>;

    async fn insert_public_template(&self, template: &PublicTemplate) -> Result<(), RemoteStoreError>;

    async fn set_public_template_active(
        &self,
        id: &PublicTemplateId,
        active: bool,
    ) -> Result<(), RemoteStoreError>;
}

#[async_trait::async_trait]
impl<R> RemoteStore for Arc<R>
where
    R: RemoteStore + ?Sized,
{
    async fn list_templates(&self, user: &UserId) -> Result<Vec<InvoiceTemplate>, RemoteStoreError> {
        (**self).list_templates(user).await
    }

    async fn insert_template(
        &self,
        user: &UserId,
        template: &InvoiceTemplate,
    ) -> Result<(), RemoteStoreError> {
        (**self).insert_template(user, template).await
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<(), RemoteStoreError> {
        (**self).delete_template(id).await
    }

    async fn list_drafts(&self, user: &UserId) -> Result<Vec<InvoiceDraft>, RemoteStoreError> {
        (**self).list_drafts(user).await
    }

    async fn insert_draft(&self, user: &UserId, draft: &InvoiceDraft) -> Result<(), RemoteStoreError> {
        (**self).insert_draft(user, draft).await
    }

    async fn update_draft(&self, id: &InvoiceId, update: &DraftUpdate) -> Result<(), RemoteStoreError> {
        (**self).update_draft(id, update).await
    }

    async fn delete_draft(&self, id: &InvoiceId) -> Result<(), RemoteStoreError> {
        (**self).delete_draft(id).await
    }

    async fn list_public_templates(&self) -> Result<Vec<PublicTemplate>, RemoteStoreError> {
        (**self).list_public_templates().await
    }

    async fn insert_public_template(&self, template: &PublicTemplate) -> Result<(), RemoteStoreError> {
        (**self).insert_public_template(template).await
    }

    async fn set_public_template_active(
        &self,
        id: &PublicTemplateId,
        active: bool,
    ) -> Result<(), RemoteStoreError> {
        (**self).set_public_template_active(id, active).await
    }
}
